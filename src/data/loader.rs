use super::scale::min_max_scale;
use super::types::{Entity, FeatureSchema, ScaledTable};
use crate::scoring::{validate_weights, WeightConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// On-disk shape of the data-preparation output.
///
/// Example:
/// ```json
/// {
///   "features": ["affordability", "income_growth"],
///   "default_weights": { "affordability": 0.6, "income_growth": 0.4 },
///   "entities": [
///     { "region": "NCR", "province": "Metro Manila", "city_municipality": "Pasig",
///       "lat": 14.57, "long": 121.08 }
///   ],
///   "scaled": [ { "affordability": 0.2, "income_growth": 0.8 } ],
///   "scores": [ 0.44 ]
/// }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetFile {
    pub features: Vec<String>,
    pub default_weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// Pre-normalized rows, same order as `entities`. Derived by min-max
    /// scaling of the raw entity features when absent.
    #[serde(default)]
    pub scaled: Option<Vec<BTreeMap<String, f64>>>,
    /// Scores computed by the data-preparation step, same order as `entities`
    #[serde(default)]
    pub scores: Option<Vec<f64>>,
}

/// A validated dataset, ready to seed a scoring session.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub schema: FeatureSchema,
    pub entities: Vec<Entity>,
    pub scaled: ScaledTable,
    pub default_weights: WeightConfig,
    pub scores: Option<Vec<f64>>,
}

/// Validate a parsed dataset file.
/// Returns all validation errors at once (not just the first).
pub fn validate_dataset(file: &DatasetFile) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let schema = match FeatureSchema::new(file.features.clone()) {
        Ok(schema) => Some(schema),
        Err(e) => {
            errors.push(format!("features: {}", e));
            None
        }
    };

    if let Some(ref schema) = schema {
        if let Err(weight_errors) = validate_weights("default_weights", schema, &file.default_weights) {
            errors.extend(weight_errors);
        }
    }

    for (i, entity) in file.entities.iter().enumerate() {
        if !entity.lat.is_finite() || !entity.long.is_finite() {
            errors.push(format!("entities[{}]: coordinates must be finite", i));
        }
    }

    match (&file.scaled, &schema) {
        (Some(rows), Some(schema)) => {
            if rows.len() != file.entities.len() {
                errors.push(format!(
                    "scaled: has {} rows but there are {} entities",
                    rows.len(),
                    file.entities.len()
                ));
            }
            for (i, row) in rows.iter().enumerate() {
                for feature in schema.names() {
                    match row.get(feature) {
                        None => errors.push(format!("scaled[{}]: missing feature '{}'", i, feature)),
                        Some(v) if !v.is_finite() => {
                            errors.push(format!("scaled[{}].{}: value must be finite", i, feature))
                        }
                        Some(_) => {}
                    }
                }
                for key in row.keys().filter(|k| !schema.contains(k)) {
                    errors.push(format!("scaled[{}]: unknown feature '{}'", i, key));
                }
            }
        }
        (None, Some(schema)) => {
            // Scaling from raw values needs every raw value present
            for (i, entity) in file.entities.iter().enumerate() {
                for feature in schema.names() {
                    match entity.features.get(feature) {
                        None => errors.push(format!(
                            "entities[{}]: missing raw feature '{}' (no scaled table to fall back on)",
                            i, feature
                        )),
                        Some(v) if !v.is_finite() => errors.push(format!(
                            "entities[{}].features.{}: value must be finite",
                            i, feature
                        )),
                        Some(_) => {}
                    }
                }
            }
        }
        (_, None) => {}
    }

    if let Some(ref scores) = file.scores {
        if scores.len() != file.entities.len() {
            errors.push(format!(
                "scores: has {} values but there are {} entities",
                scores.len(),
                file.entities.len()
            ));
        }
        if let Some(i) = scores.iter().position(|s| !s.is_finite()) {
            errors.push(format!("scores[{}]: value must be finite", i));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Turn a parsed dataset file into typed tables.
pub fn build_dataset(file: DatasetFile) -> Result<Dataset> {
    if let Err(errors) = validate_dataset(&file) {
        anyhow::bail!("Dataset errors:\n  - {}", errors.join("\n  - "));
    }

    let schema = FeatureSchema::new(file.features)?;
    let default_weights = WeightConfig::from_map(&schema, &file.default_weights)?;

    let scaled = match file.scaled {
        Some(rows) => {
            let rows = rows
                .iter()
                .map(|row| schema.names().iter().map(|f| row[f]).collect())
                .collect();
            ScaledTable::new(schema.names().to_vec(), rows)?
        }
        None => {
            log::debug!("No scaled table in dataset, deriving it with min-max scaling");
            min_max_scale(&schema, &file.entities)?
        }
    };

    Ok(Dataset {
        schema,
        entities: file.entities,
        scaled,
        default_weights,
        scores: file.scores,
    })
}

/// Parse and validate a dataset from JSON text
pub fn parse_dataset(json: &str) -> Result<Dataset> {
    let file: DatasetFile = serde_json::from_str(json).context("Failed to parse dataset JSON")?;
    build_dataset(file)
}

/// Load a dataset from a JSON file
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist or cannot be read
/// - The JSON cannot be parsed
/// - The dataset fails schema validation
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    if !path.exists() {
        anyhow::bail!("Dataset file not found at {}", path.display());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset at {}", path.display()))?;

    let dataset = parse_dataset(&content)
        .with_context(|| format!("Invalid dataset in {}", path.display()))?;

    log::debug!(
        "Loaded {} entities with {} features from {}",
        dataset.entities.len(),
        dataset.schema.len(),
        path.display()
    );

    Ok(dataset)
}
