//! Integration test: raw manifest to feature table to predictions

use polars::prelude::*;
use starliner::inference::{InferenceConfig, InferenceEngine, LinearClassifier, REQUIRED_COLUMNS};
use starliner::preprocessing::{FeaturePipeline, PipelineConfig};
use starliner::utils::frame::{numeric_values, text_values};
use starliner::utils::{DataLoader, DataSaver};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

const MANIFEST: &str = "\
PassengerId,HomePlanet,CryoSleep,Cabin,Destination,Age,VIP,RoomService,FoodCourt,ShoppingMall,Spa,VRDeck,Name
0013_01,Earth,True,G/3/S,TRAPPIST-1e,27.0,False,0.0,0.0,0.0,0.0,0.0,Nelly Carsoning
0018_01,Earth,False,F/4/S,TRAPPIST-1e,19.0,False,0.0,9.0,0.0,2823.0,0.0,Lerome Peckers
0019_01,Europa,True,C/0/S,55 Cancri e,31.0,False,0.0,0.0,0.0,0.0,0.0,Sabih Unhearfus
0021_01,Europa,False,C/1/S,TRAPPIST-1e,38.0,False,0.0,6652.0,0.0,181.0,585.0,Meratz Caltilter
0021_02,Europa,False,,,40.0,False,100.0,0.0,0.0,0.0,0.0,Ankalik Caltilter
0023_01,Earth,False,F/5/S,TRAPPIST-1e,20.0,False,10.0,0.0,635.0,0.0,0.0,Brence Harperez
0027_01,,,F/6/,,,,0.0,,,,,Jon Harperez
";

fn write_manifest() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(MANIFEST.as_bytes()).unwrap();
    file
}

fn single_passenger() -> DataFrame {
    df!(
        "PassengerId" => &["0001_01"],
        "HomePlanet" => &["Earth"],
        "CryoSleep" => &["False"],
        "Cabin" => &["B/12/P"],
        "Destination" => &[None::<&str>],
        "Age" => &[10.0],
        "VIP" => &["False"],
        "RoomService" => &[0.0],
        "FoodCourt" => &[0.0],
        "ShoppingMall" => &[0.0],
        "Spa" => &[0.0],
        "VRDeck" => &[0.0],
        "Name" => &["Jane Doe"],
    )
    .unwrap()
}

#[test]
fn test_single_passenger_fully_populated() {
    let (df, report) = FeaturePipeline::new()
        .transform_with_report(single_passenger())
        .unwrap();

    assert!(report.is_complete(), "residual nulls: {:?}", report.residual_nulls);
    assert_eq!(df.height(), 1);
    for column in REQUIRED_COLUMNS {
        assert!(df.column(column).is_ok(), "missing {}", column);
    }

    assert_eq!(numeric_values(&df, "TravelingAlone").unwrap(), vec![Some(1.0)]);
    assert_eq!(numeric_values(&df, "SpentMoney").unwrap(), vec![Some(0.0)]);
    assert_eq!(text_values(&df, "AgeGroup").unwrap()[0].as_deref(), Some("0 - 13"));
    assert_eq!(
        text_values(&df, "Destination").unwrap()[0].as_deref(),
        Some("TRAPPIST-1e")
    );
    assert_eq!(text_values(&df, "Deck").unwrap()[0].as_deref(), Some("B"));
    assert_eq!(numeric_values(&df, "CabinNumber").unwrap()[0], Some(12.0));
}

#[test]
fn test_configured_destination_default() {
    let config = PipelineConfig::default().with_default_destination("55 Cancri e");
    let df = FeaturePipeline::with_config(config)
        .transform(single_passenger())
        .unwrap();
    assert_eq!(
        text_values(&df, "Destination").unwrap()[0].as_deref(),
        Some("55 Cancri e")
    );
}

#[test]
fn test_manifest_resolution() {
    let file = write_manifest();
    let raw = DataLoader::new().load_csv(file.path()).unwrap();
    let (df, report) = FeaturePipeline::new().transform_with_report(raw).unwrap();

    assert!(report.is_complete(), "residual nulls: {:?}", report.residual_nulls);
    assert_eq!(df.height(), 7);

    let planets = text_values(&df, "HomePlanet").unwrap();
    let sides = text_values(&df, "Side").unwrap();
    let decks = text_values(&df, "Deck").unwrap();
    let destinations = text_values(&df, "Destination").unwrap();
    let cryo = numeric_values(&df, "CryoSleep").unwrap();
    let ages = numeric_values(&df, "Age").unwrap();
    let cabins = numeric_values(&df, "CabinNumber").unwrap();

    // 0021_02 has no cabin: side from its group, deck from spending, number from the deck line
    assert_eq!(sides[4].as_deref(), Some("S"));
    assert_eq!(decks[4].as_deref(), Some("C"));
    assert_eq!(cabins[4], Some(1.0));
    assert_eq!(destinations[4].as_deref(), Some("TRAPPIST-1e"));

    // 0027_01 resolved through the Harperez family and the spending rules
    assert_eq!(planets[6].as_deref(), Some("Earth"));
    assert_eq!(sides[6].as_deref(), Some("S"));
    assert_eq!(destinations[6].as_deref(), Some("TRAPPIST-1e"));
    assert_eq!(cryo[6], Some(1.0));
    assert_eq!(ages[6], Some(27.0));
}

#[test]
fn test_manifest_scored_with_bundled_model() {
    let file = write_manifest();
    let raw = DataLoader::new().load_csv(file.path()).unwrap();
    let features = FeaturePipeline::new().transform(raw).unwrap();

    let model_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("models/linear_classifier.json");
    let model = LinearClassifier::load(&model_path).unwrap();
    let engine = InferenceEngine::new(InferenceConfig::default(), Arc::new(model));

    let records = engine.predict(&features).unwrap();
    let ids: Vec<&str> = records.iter().map(|r| r.passenger_id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["0013_01", "0018_01", "0019_01", "0021_01", "0021_02", "0023_01", "0027_01"]
    );
}

#[test]
fn test_feature_table_round_trip_through_csv() {
    let file = write_manifest();
    let raw = DataLoader::new().load_csv(file.path()).unwrap();
    let mut features = FeaturePipeline::new().transform(raw).unwrap();

    let out = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    DataSaver::save_auto(&mut features, out.path()).unwrap();

    let reloaded = DataLoader::new().load_auto(out.path()).unwrap();
    assert_eq!(reloaded.height(), 7);
    assert_eq!(reloaded.width(), features.width());
}

#[test]
fn test_missing_source_column_fails() {
    let raw = single_passenger().drop("Cabin").unwrap();
    let err = FeaturePipeline::new().transform(raw).unwrap_err();
    assert!(err.to_string().contains("Cabin"));
}
