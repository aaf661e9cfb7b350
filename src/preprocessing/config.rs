//! Feature pipeline configuration

use crate::error::{Result, StarlinerError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Candidate decks for passengers of one home planet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetDecks {
    pub planet: String,
    pub decks: Vec<String>,
}

impl PlanetDecks {
    pub fn new(planet: &str, decks: &[&str]) -> Self {
        Self {
            planet: planet.to_string(),
            decks: decks.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// Configuration for the passenger feature pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Raw spend columns, in output order
    pub spend_columns: Vec<String>,

    /// Quantile at which TotalSpending is capped
    pub spending_cap_quantile: f64,

    /// Passengers younger than this are treated as children
    pub child_age_limit: f64,

    /// GroupSize encoding of a passenger travelling alone
    pub single_occupant: String,

    /// Candidate decks per home planet, searched in order
    pub decks_by_planet: Vec<PlanetDecks>,

    /// Decks implying a Europa home planet
    pub europa_decks: Vec<String>,

    /// Deck implying an Earth home planet
    pub earth_deck: String,

    /// Lower edges of the age bins; the last bin is unbounded
    pub age_bin_edges: Vec<f64>,

    /// One label per age bin
    pub age_labels: Vec<String>,

    /// Destination used when no other rule resolves one
    pub default_destination: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            spend_columns: ["RoomService", "FoodCourt", "ShoppingMall", "Spa", "VRDeck"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            spending_cap_quantile: 0.95,
            child_age_limit: 13.0,
            single_occupant: "01".to_string(),
            decks_by_planet: vec![
                PlanetDecks::new("Earth", &["E", "F", "G"]),
                PlanetDecks::new("Mars", &["D", "E", "F"]),
                PlanetDecks::new("Europa", &["A", "B", "C", "D", "E"]),
            ],
            europa_decks: vec!["A".into(), "B".into(), "C".into()],
            earth_deck: "G".to_string(),
            age_bin_edges: vec![0.0, 13.0, 18.0, 25.0, 30.0, 40.0, 50.0],
            age_labels: ["0 - 13", "14 - 18", "19 - 25", "26 - 30", "31 - 40", "41 - 50", "51+"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            default_destination: "TRAPPIST-1e".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file; absent fields keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| StarlinerError::ConfigError(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| StarlinerError::ConfigError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Builder method to set the spending cap quantile
    pub fn with_spending_cap(mut self, quantile: f64) -> Self {
        self.spending_cap_quantile = quantile;
        self
    }

    /// Builder method to set the child age limit
    pub fn with_child_age_limit(mut self, age: f64) -> Self {
        self.child_age_limit = age;
        self
    }

    /// Builder method to set the fallback destination
    pub fn with_default_destination(mut self, destination: impl Into<String>) -> Self {
        self.default_destination = destination.into();
        self
    }

    /// Candidate decks for a home planet, if the planet is known
    pub fn decks_for(&self, planet: &str) -> Option<&[String]> {
        self.decks_by_planet
            .iter()
            .find(|p| p.planet == planet)
            .map(|p| p.decks.as_slice())
    }

    /// Label of the right-open age bin containing `age`
    pub fn age_label(&self, age: f64) -> Option<&str> {
        if age.is_nan() {
            return None;
        }
        self.age_bin_edges
            .iter()
            .rposition(|&edge| age >= edge)
            .and_then(|idx| self.age_labels.get(idx))
            .map(|s| s.as_str())
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.spend_columns.is_empty() {
            return Err(StarlinerError::ConfigError("spend_columns must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&self.spending_cap_quantile) {
            return Err(StarlinerError::ConfigError(format!(
                "spending_cap_quantile must lie in [0, 1], got {}",
                self.spending_cap_quantile
            )));
        }
        if self.age_bin_edges.len() != self.age_labels.len() {
            return Err(StarlinerError::ConfigError(format!(
                "{} age bin edges but {} labels",
                self.age_bin_edges.len(),
                self.age_labels.len()
            )));
        }
        if self.age_bin_edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(StarlinerError::ConfigError(
                "age_bin_edges must be strictly increasing".into(),
            ));
        }
        Ok(())
    }
}
