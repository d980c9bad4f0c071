pub mod batch;
pub mod error;
pub mod feature_view;
pub mod persistence;
pub mod pipeline;
pub mod processor;
pub mod types;

pub use batch::build_batch;
pub use error::FeatureError;
pub use processor::{build_features_and_target, build_from_csv_reader};
pub use types::{
    Exclusion, ExclusionReason, FeatureRecord, FeatureRow, FeatureSet, FeatureTable, LOOKAHEAD,
    WINDOW_SIZE,
};
