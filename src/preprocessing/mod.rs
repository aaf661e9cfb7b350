//! Passenger feature engineering
//!
//! Turns raw, partially missing passenger records into the complete feature
//! table the transport classifier expects:
//! - Column splitting of composite identifiers
//! - Group-wise mode/median imputation with cascading fallback keys
//! - Derived spending and travel features
//! - Rule-based resolution of categorical values
//! - Per-deck extrapolation of cabin numbers

pub mod cabin;
pub mod config;
pub mod derived;
pub mod imputer;
pub mod pipeline;
pub mod resolver;
pub mod splitter;

pub use cabin::CabinExtrapolator;
pub use config::{PipelineConfig, PlanetDecks};
pub use derived::DerivedFeatureBuilder;
pub use imputer::{FillValue, GroupImputer, ImputeCascade, ImputeMethod, ImputeStep};
pub use pipeline::{FeaturePipeline, PipelineReport};
pub use resolver::{closest_deck, CategoricalResolver, DeckSpendTable};
pub use splitter::{split_and_insert, ColumnSplitter};
