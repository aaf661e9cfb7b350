//! Starliner CLI Module
//!
//! Command-line interface for preprocessing manifests, serving the classifier
//! and requesting predictions.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::client::PredictionClient;
use crate::inference::{records_to_frame, InferenceConfig, InferenceEngine, LinearClassifier, PredictionRecord};
use crate::preprocessing::{FeaturePipeline, PipelineConfig};
use crate::utils::{DataLoader, DataSaver};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn step_warn(msg: &str) {
    println!("  {} {}", "!".yellow(), msg.yellow());
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── Commands ──────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "starliner")]
#[command(author, version, about = "Passenger feature pipeline and transport prediction service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the prediction service
    Serve {
        /// Host to bind
        #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, env = "API_PORT", default_value = "5000")]
        port: u16,

        /// Serialized classifier (JSON)
        #[arg(short, long, env = "MODEL_PATH", default_value = "models/linear_classifier.json")]
        model: PathBuf,
    },

    /// Run the feature pipeline and save the feature table
    Preprocess {
        /// Raw passenger manifest (CSV or JSON)
        #[arg(short, long)]
        data: PathBuf,

        /// Output file (CSV or JSON, by extension)
        #[arg(short, long)]
        output: PathBuf,

        /// Pipeline configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Preprocess a manifest and request predictions from a running service
    Predict {
        /// Raw passenger manifest (CSV or JSON)
        #[arg(short, long)]
        data: PathBuf,

        /// Output predictions file
        #[arg(short, long, default_value = "data/api_predictions.csv")]
        output: PathBuf,

        /// Prediction service base URL
        #[arg(short, long, default_value = "http://localhost:5000")]
        url: String,

        /// Request timeout in seconds
        #[arg(long, default_value = "60")]
        timeout: u64,

        /// Pipeline configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Preprocess a manifest and score it with a local classifier
    Score {
        /// Raw passenger manifest (CSV or JSON)
        #[arg(short, long)]
        data: PathBuf,

        /// Serialized classifier (JSON)
        #[arg(short, long, default_value = "models/linear_classifier.json")]
        model: PathBuf,

        /// Output predictions file
        #[arg(short, long, default_value = "data/predictions.csv")]
        output: PathBuf,

        /// Pipeline configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn load_pipeline(config: Option<&Path>) -> anyhow::Result<FeaturePipeline> {
    let config = match config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    Ok(FeaturePipeline::with_config(config))
}

fn build_features(data_path: &Path, config: Option<&Path>) -> anyhow::Result<polars::prelude::DataFrame> {
    let pipeline = load_pipeline(config)?;

    step_run("Loading manifest");
    let df = DataLoader::new().load_auto(data_path)?;
    step_done(&format!("{} rows × {} cols", df.height(), df.width()));

    step_run("Engineering features");
    let start = Instant::now();
    let (features, report) = pipeline.transform_with_report(df)?;
    step_done(&format!("{:.1} ms", start.elapsed().as_secs_f64() * 1000.0));

    for (column, count) in &report.residual_nulls {
        step_warn(&format!("{} still has {} missing values", column, count));
    }
    Ok(features)
}

fn save_predictions(records: &[PredictionRecord], output_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    step_run(&format!("Saving → {}", output_path.display()));
    let mut frame = records_to_frame(records)?;
    DataSaver::save_csv(&mut frame, output_path)?;
    let transported = records.iter().filter(|r| r.transported).count();
    step_done(&format!("{} predictions, {} transported", records.len(), transported));
    Ok(())
}

pub fn cmd_preprocess(data_path: &Path, output_path: &Path, config: Option<&Path>) -> anyhow::Result<()> {
    section("Preprocess");

    let mut features = build_features(data_path, config)?;

    step_run(&format!("Saving → {}", output_path.display()));
    DataSaver::save_auto(&mut features, output_path)?;
    step_done(&format!("{} rows × {} cols", features.height(), features.width()));

    println!();
    Ok(())
}

pub async fn cmd_predict(
    data_path: &Path,
    output_path: &Path,
    url: &str,
    timeout_secs: u64,
    config: Option<&Path>,
) -> anyhow::Result<()> {
    section("Predict");

    let features = build_features(data_path, config)?;
    let client = PredictionClient::new(url, timeout_secs)?;

    step_run(&format!("Requesting {}", client.predict_url()));
    let records = client.predict(&features).await?;
    step_done(&format!("{} records", records.len()));

    save_predictions(&records, output_path)?;
    println!();
    Ok(())
}

pub fn cmd_score(
    data_path: &Path,
    model_path: &Path,
    output_path: &Path,
    config: Option<&Path>,
) -> anyhow::Result<()> {
    section("Score");

    step_run(&format!("Loading model {}", model_path.display()));
    let model = LinearClassifier::load(model_path)?;
    step_done(&format!("{} numeric, {} categorical features",
        model.numeric_weights.len(), model.categorical_weights.len()));

    let features = build_features(data_path, config)?;
    let engine = InferenceEngine::new(InferenceConfig::default(), Arc::new(model));

    step_run("Scoring");
    let records = engine.predict(&features)?;
    step_done(&format!("{} records", records.len()));

    save_predictions(&records, output_path)?;
    println!();
    Ok(())
}

pub async fn cmd_serve(host: &str, port: u16, model_path: &Path) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Starliner Prediction Service".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Home   ", &format!("http://{}:{}/", host, port)));
    line_box(&kv("Predict", &format!("http://{}:{}/predict", host, port)));
    line_box(&kv("Model  ", &model_path.display().to_string()));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    let config = ServerConfig {
        host: host.to_string(),
        port,
        model_path: model_path.to_path_buf(),
    };

    run_server(config).await
}
