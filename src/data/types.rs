use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One city/municipality as delivered by the data-preparation step.
///
/// `features` carries the raw (unscaled) attribute values keyed by feature
/// name. They are only required when the dataset does not ship a scaled table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Entity {
    pub region: String,
    pub province: String,
    pub city_municipality: String,
    pub lat: f64,
    pub long: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<String, f64>,
}

impl Entity {
    pub fn new(region: &str, province: &str, city_municipality: &str, lat: f64, long: f64) -> Self {
        Self {
            region: region.to_string(),
            province: province.to_string(),
            city_municipality: city_municipality.to_string(),
            lat,
            long,
            features: BTreeMap::new(),
        }
    }

    /// "City, Province, Region" label used by the dashboard and breakdown popup
    pub fn label(&self) -> String {
        format!("{}, {}, {}", self.city_municipality, self.province, self.region)
    }
}

/// The ordered set of scoring features.
///
/// Every scaled table and weight mapping is checked against this list when a
/// dataset is loaded, so lookups downstream never hit an unknown name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            bail!("feature schema must name at least one feature");
        }
        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                bail!("feature name at position {} is empty", i);
            }
            if names[..i].contains(name) {
                bail!("duplicate feature name '{}'", name);
            }
        }
        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

/// Normalized feature values, one row per entity and one column per feature.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledTable {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl ScaledTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                bail!(
                    "scaled row {} has {} values, expected {}",
                    i,
                    row.len(),
                    columns.len()
                );
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All values of one column, in row order
    pub fn column_values(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row[idx]).collect())
    }

    /// Arithmetic mean of one column. `None` for unknown columns or an empty table.
    pub fn column_mean(&self, name: &str) -> Option<f64> {
        let values = self.column_values(name)?;
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_schema_rejects_duplicates() {
        let err = FeatureSchema::new(names(&["a", "b", "a"])).unwrap_err();
        assert!(err.to_string().contains("duplicate feature name 'a'"));
    }

    #[test]
    fn test_schema_rejects_empty() {
        assert!(FeatureSchema::new(vec![]).is_err());
        assert!(FeatureSchema::new(names(&["a", " "])).is_err());
    }

    #[test]
    fn test_schema_index_of() {
        let schema = FeatureSchema::new(names(&["a", "b"])).unwrap();
        assert_eq!(schema.index_of("b"), Some(1));
        assert_eq!(schema.index_of("c"), None);
        assert!(schema.contains("a"));
    }

    #[test]
    fn test_scaled_table_rejects_ragged_rows() {
        let result = ScaledTable::new(names(&["a", "b"]), vec![vec![0.1, 0.2], vec![0.3]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_scaled_table_column_mean() {
        let table = ScaledTable::new(names(&["a", "b"]), vec![vec![0.2, 0.6], vec![0.8, 0.4]]).unwrap();
        assert_eq!(table.column_values("b"), Some(vec![0.6, 0.4]));
        assert!((table.column_mean("a").unwrap() - 0.5).abs() < 1e-12);
        assert!(table.column_mean("missing").is_none());
    }

    #[test]
    fn test_entity_label() {
        let entity = Entity::new("NCR", "Metro Manila", "Pasig", 14.57, 121.08);
        assert_eq!(entity.label(), "Pasig, Metro Manila, NCR");
    }
}
