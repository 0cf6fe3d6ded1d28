use super::weights::WEIGHT_SUM_EPSILON;
use crate::data::FeatureSchema;
use std::collections::BTreeMap;

/// Validate a complete weight mapping against the feature schema.
/// Returns all validation errors at once (not just the first).
///
/// `field` prefixes every message, e.g. `default_weights: ...`.
pub fn validate_weights(
    field: &str,
    schema: &FeatureSchema,
    weights: &BTreeMap<String, f64>,
) -> Result<(), Vec<String>> {
    let mut errors = match validate_weight_overrides(field, schema, weights) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    for feature in schema.names() {
        if !weights.contains_key(feature) {
            errors.push(format!("{}: missing weight for feature '{}'", field, feature));
        }
    }

    let sum: f64 = weights.values().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
        errors.push(format!("{}: weights sum to {:.4}, must sum to 1.0", field, sum));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a partial set of weight overrides: every key must be a known
/// feature and every value must lie in [0, 1]. The sum is checked when the
/// merged weights are applied.
pub fn validate_weight_overrides(
    field: &str,
    schema: &FeatureSchema,
    weights: &BTreeMap<String, f64>,
) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    for (feature, value) in weights {
        if !schema.contains(feature) {
            errors.push(format!("{}: unknown feature '{}'", field, feature));
        }
        if !value.is_finite() || !(0.0..=1.0).contains(value) {
            errors.push(format!(
                "{}.{}: must be between 0 and 1, got {}",
                field, feature, value
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
