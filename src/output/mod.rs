pub mod export;
pub mod formatter;

pub use export::{export_scores, render_export, ExportFormat};
pub use formatter::{
    format_heat_tsv, format_json, format_ranking, format_score, format_scored_table, format_tsv,
    should_use_colors,
};
