//! Inference configuration

use serde::{Deserialize, Serialize};

/// Feature columns the classifier requires, in the order they are checked
pub const REQUIRED_COLUMNS: [&str; 19] = [
    "GroupSize",
    "Age",
    "RoomService",
    "FoodCourt",
    "ShoppingMall",
    "Spa",
    "VRDeck",
    "TotalSpending",
    "HomePlanet",
    "CryoSleep",
    "CabinNumber",
    "Side",
    "Destination",
    "TravelingAlone",
    "SpentMoney",
    "GroupSpentMoney",
    "Deck",
    "AgeGroup",
    "GroupId",
];

/// Configuration for model inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Scores strictly above this are labelled transported
    pub classification_threshold: f64,

    /// Columns that must be present before predicting
    pub required_columns: Vec<String>,

    /// Zero-padded width of GroupId in the rebuilt PassengerId
    pub group_id_width: usize,

    /// Zero-padded width of GroupSize in the rebuilt PassengerId
    pub group_size_width: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            classification_threshold: 0.5,
            required_columns: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            group_id_width: 4,
            group_size_width: 2,
        }
    }
}

impl InferenceConfig {
    /// Create a new inference configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set classification threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.classification_threshold = threshold;
        self
    }
}
