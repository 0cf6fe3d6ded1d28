use thiserror::Error;

/// Recoverable failures of the weight configuration and score calculator.
///
/// None of these are fatal: callers report them and keep the last applied
/// score table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    /// Weights do not sum to 1.0 at apply time.
    #[error("weights sum to {sum:.2}, adjust them so that their total equals 1")]
    InvalidWeightSum { sum: f64 },
    /// A scored feature has no weight.
    #[error("no weight configured for feature '{feature}'")]
    MissingWeight { feature: String },
    /// A weight outside [0, 1] was supplied programmatically.
    #[error("weight for '{feature}' must be between 0 and 1, got {value}")]
    OutOfRangeWeight { feature: String, value: f64 },
    /// A weight names a feature the dataset does not score.
    #[error("unknown feature '{feature}'")]
    UnknownFeature { feature: String },
    /// The scaled table and the entity table disagree in length.
    #[error("scaled table has {scaled_rows} rows but there are {entities} entities")]
    ShapeMismatch { scaled_rows: usize, entities: usize },
}
