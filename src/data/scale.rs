use super::types::{Entity, FeatureSchema, ScaledTable};
use anyhow::{Context, Result};

/// Min-max scale the entities' raw feature values onto [0, 1].
///
/// A constant column scales to 0.0 for every row. Every entity must carry a
/// raw value for every schema feature.
pub fn min_max_scale(schema: &FeatureSchema, entities: &[Entity]) -> Result<ScaledTable> {
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(schema.len());

    for feature in schema.names() {
        let raw = entities
            .iter()
            .enumerate()
            .map(|(i, entity)| {
                entity.features.get(feature).copied().with_context(|| {
                    format!("entities[{}] has no raw value for feature '{}'", i, feature)
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        let min = raw.iter().copied().fold(f64::INFINITY, f64::min);
        let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = max - min;

        let scaled = raw
            .iter()
            .map(|v| if span > 0.0 { (v - min) / span } else { 0.0 })
            .collect();
        columns.push(scaled);
    }

    // Transpose column-major scaling into one row per entity
    let rows = (0..entities.len())
        .map(|row| columns.iter().map(|col| col[row]).collect())
        .collect();

    ScaledTable::new(schema.names().to_vec(), rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(city: &str, a: f64, b: f64) -> Entity {
        let mut e = Entity::new("NCR", "Metro Manila", city, 14.5, 121.0);
        e.features.insert("a".to_string(), a);
        e.features.insert("b".to_string(), b);
        e
    }

    fn schema() -> FeatureSchema {
        FeatureSchema::new(vec!["a".to_string(), "b".to_string()]).unwrap()
    }

    #[test]
    fn test_min_max_bounds() {
        let entities = vec![entity("x", 10.0, 5.0), entity("y", 20.0, 5.0), entity("z", 15.0, 5.0)];
        let table = min_max_scale(&schema(), &entities).unwrap();
        assert_eq!(table.column_values("a"), Some(vec![0.0, 1.0, 0.5]));
    }

    #[test]
    fn test_constant_column_scales_to_zero() {
        let entities = vec![entity("x", 1.0, 7.0), entity("y", 2.0, 7.0)];
        let table = min_max_scale(&schema(), &entities).unwrap();
        assert_eq!(table.column_values("b"), Some(vec![0.0, 0.0]));
    }

    #[test]
    fn test_missing_raw_value_is_error() {
        let mut incomplete = entity("y", 2.0, 1.0);
        incomplete.features.remove("b");
        let err = min_max_scale(&schema(), &[entity("x", 1.0, 1.0), incomplete]).unwrap_err();
        assert!(err.to_string().contains("entities[1]"));
    }

    #[test]
    fn test_empty_entities() {
        let table = min_max_scale(&schema(), &[]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 2);
    }
}
