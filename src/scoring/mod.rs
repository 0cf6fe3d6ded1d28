pub mod engine;
pub mod error;
pub mod session;
pub mod validation;
pub mod weights;

pub use engine::{
    calculate_scores, FeatureContribution, ScoreBreakdown, ScoreResult, ScoreTable, ScoredEntity,
};
pub use error::ScoringError;
pub use session::ScoringSession;
pub use validation::{validate_weight_overrides, validate_weights};
pub use weights::{parse_weight_assignment, WeightConfig, WEIGHT_STEP, WEIGHT_SUM_EPSILON};
