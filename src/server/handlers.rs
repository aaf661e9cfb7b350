//! HTTP request handlers

use axum::{body::Bytes, extract::State, response::Html, Json};
use std::sync::Arc;
use tracing::info;

use crate::inference::PredictionRecord;
use crate::utils::records_from_json;

use super::error::Result;
use super::state::AppState;

/// Score a JSON array of feature rows.
///
/// The body is read as raw bytes so malformed JSON is reported like any other
/// validation failure.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Vec<PredictionRecord>>> {
    let table = records_from_json(&body)?;
    let records = state.engine.predict(&table)?;

    let transported = records.iter().filter(|r| r.transported).count();
    info!(rows = records.len(), transported, "Predictions served");
    Ok(Json(records))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let uptime = chrono::Utc::now().signed_duration_since(state.started_at);
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": uptime.num_seconds(),
        "model": state.config.model_path.display().to_string(),
        "classifier": state.engine.classifier_name(),
    }))
}

pub async fn serve_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Starliner Transport Prediction API</title>
</head>
<body>
    <h1>Starliner Transport Prediction API</h1>
    <p>POST a JSON array of preprocessed passenger rows to <code>/predict</code>.</p>
    <p>Use <b>starliner predict --input data/test.csv</b> to preprocess a manifest and get predictions.</p>
    <p>Predictions are saved as a <code>PassengerId,Transported</code> CSV.</p>
</body>
</html>
"#;
