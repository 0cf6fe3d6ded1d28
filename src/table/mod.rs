pub mod aggregate;
pub mod filter;
pub mod heat;

pub use aggregate::{mean_by_level, top_n, Level, LevelScore, DEFAULT_TOP_N};
pub use filter::{provinces_in, regions, regions_of, RegionFilter, DEFAULT_REGION};
pub use heat::{centroid, heat_points, Bounds, HeatGradient, HeatGrid, HeatPoint};
