use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::io::Write;
use std::path::Path;

use super::formatter::{format_json, format_tsv};
use crate::scoring::ScoredEntity;

/// File format for `export`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    #[default]
    Json,
    Tsv,
}

/// Render rows in the chosen format, newline-terminated
pub fn render_export(rows: &[&ScoredEntity], format: ExportFormat) -> Result<String> {
    let mut content = match format {
        ExportFormat::Json => format_json(rows).context("Failed to serialize scores")?,
        ExportFormat::Tsv => format_tsv(rows),
    };
    content.push('\n');
    Ok(content)
}

/// Write the scored table to `path` atomically
///
/// The previous file, if any, stays intact until the new content is committed.
pub fn export_scores(path: &Path, rows: &[&ScoredEntity], format: ExportFormat) -> Result<()> {
    let content = render_export(rows, format)?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write scores to {}", path.display()))?;
    file.commit()
        .with_context(|| format!("Failed to save scores to {}", path.display()))?;

    log::debug!("Exported {} rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Entity;
    use crate::scoring::ScoreTable;

    fn table() -> ScoreTable {
        let entities = vec![Entity::new("NCR", "Metro Manila", "Pasig", 14.57, 121.08)];
        ScoreTable::from_precomputed(&entities, &[0.5]).unwrap()
    }

    #[test]
    fn test_export_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        let t = table();
        let rows: Vec<&ScoredEntity> = t.rows().iter().collect();

        export_scores(&path, &rows, ExportFormat::Json).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed[0]["city_municipality"], "Pasig");
        assert_eq!(parsed[0]["opportunity_score"], 0.5);
    }

    #[test]
    fn test_export_tsv_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.tsv");
        std::fs::write(&path, "stale").unwrap();
        let t = table();
        let rows: Vec<&ScoredEntity> = t.rows().iter().collect();

        export_scores(&path, &rows, ExportFormat::Tsv).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("region\tprovince"));
        assert!(written.ends_with("0.5\n"));
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("scores.json");
        assert!(export_scores(&path, &[], ExportFormat::Json).is_err());
    }
}
