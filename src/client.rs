//! Prediction service client
//!
//! Posts a feature table to a running service and decodes its reply.

use crate::error::{Result, StarlinerError};
use crate::inference::PredictionRecord;
use crate::utils::records_to_json;
use polars::prelude::*;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Body of a `/predict` reply: either records or an error message
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PredictResponse {
    Records(Vec<PredictionRecord>),
    Failure { error: String },
}

/// HTTP client for the prediction service
#[derive(Debug, Clone)]
pub struct PredictionClient {
    base_url: String,
    http: reqwest::Client,
}

impl PredictionClient {
    /// Build a client for `base_url` with a request timeout
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn predict_url(&self) -> String {
        format!("{}/predict", self.base_url)
    }

    /// Send every row of `table` and return one record per row.
    ///
    /// A non-200 status or an `{error}` reply is an error; nothing is retried.
    pub async fn predict(&self, table: &DataFrame) -> Result<Vec<PredictionRecord>> {
        let body = records_to_json(table)?;
        let url = self.predict_url();
        debug!(url = %url, rows = table.height(), bytes = body.len(), "Posting feature rows");

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        info!(status = status.as_u16(), "Prediction service replied");
        if status != reqwest::StatusCode::OK {
            return Err(StarlinerError::HttpError(format!(
                "Failed to get predictions: status {}",
                status
            )));
        }

        let bytes = response.bytes().await?;
        parse_reply(&bytes)
    }
}

/// Decode a `/predict` reply body
pub fn parse_reply(bytes: &[u8]) -> Result<Vec<PredictionRecord>> {
    match serde_json::from_slice::<PredictResponse>(bytes) {
        Ok(PredictResponse::Records(records)) => Ok(records),
        Ok(PredictResponse::Failure { error }) => Err(StarlinerError::ValidationError(error)),
        Err(_) => Err(StarlinerError::SerializationError(
            "Response data is not in the expected format.".to_string(),
        )),
    }
}
