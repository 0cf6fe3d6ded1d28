pub mod loader;
pub mod scale;
pub mod types;

pub use loader::{build_dataset, load_dataset, parse_dataset, validate_dataset, Dataset, DatasetFile};
pub use scale::min_max_scale;
pub use types::{Entity, FeatureSchema, ScaledTable};
