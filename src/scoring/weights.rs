use super::error::ScoringError;
use crate::data::FeatureSchema;
use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;

/// Tolerance for the "weights sum to 1.0" check
pub const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Slider resolution of the dashboard's weight editor
pub const WEIGHT_STEP: f64 = 0.01;

/// Feature name → weight mapping.
///
/// Entries keep the order they were created in (schema order when built from a
/// dataset), which is also the order the dashboard lists them. Holding or
/// editing weights never touches scores; they only take effect through
/// [`ScoringSession::apply`](super::ScoringSession::apply).
#[derive(Debug, Clone, PartialEq)]
pub struct WeightConfig {
    entries: Vec<(String, f64)>,
}

impl WeightConfig {
    /// Build from raw pairs without range or sum checks.
    ///
    /// A repeated feature keeps its first position and its last value, so
    /// every feature is counted once by both `get` and `sum`.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut entries: Vec<(String, f64)> = Vec::new();
        for (key, value) in pairs {
            let key = key.into();
            match entries.iter_mut().find(|(name, _)| *name == key) {
                Some(slot) => slot.1 = value,
                None => entries.push((key, value)),
            }
        }
        Self { entries }
    }

    /// Build a mapping in schema order. Every schema feature needs a weight,
    /// every key must be a schema feature and every value must be in [0, 1].
    pub fn from_map(schema: &FeatureSchema, map: &BTreeMap<String, f64>) -> Result<Self, ScoringError> {
        if let Some(unknown) = map.keys().find(|k| !schema.contains(k)) {
            return Err(ScoringError::UnknownFeature {
                feature: unknown.clone(),
            });
        }

        let mut entries = Vec::with_capacity(schema.len());
        for feature in schema.names() {
            let value = *map.get(feature).ok_or_else(|| ScoringError::MissingWeight {
                feature: feature.clone(),
            })?;
            check_range(feature, value)?;
            entries.push((feature.clone(), value));
        }
        Ok(Self { entries })
    }

    /// Equal weight for every schema feature
    pub fn uniform(schema: &FeatureSchema) -> Self {
        let share = 1.0 / schema.len() as f64;
        Self::from_pairs(schema.names().iter().map(|n| (n.clone(), share)))
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(name, _)| name == feature)
            .map(|(_, w)| *w)
    }

    /// Set one feature's weight. Values outside [0, 1] are rejected, never clamped.
    pub fn set(&mut self, feature: &str, value: f64) -> Result<(), ScoringError> {
        check_range(feature, value)?;
        let slot = self
            .entries
            .iter_mut()
            .find(|(name, _)| name == feature)
            .ok_or_else(|| ScoringError::UnknownFeature {
                feature: feature.to_string(),
            })?;
        slot.1 = value;
        Ok(())
    }

    /// Move the weight at `index` by `delta`, the way a bounded slider would:
    /// the result is clamped to [0, 1] and snapped to the slider grid.
    /// Returns the new value, or `None` for an invalid index.
    pub fn nudge(&mut self, index: usize, delta: f64) -> Option<f64> {
        let (_, weight) = self.entries.get_mut(index)?;
        let moved = ((*weight + delta) / WEIGHT_STEP).round() * WEIGHT_STEP;
        *weight = moved.clamp(0.0, 1.0);
        Some(*weight)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(name, w)| (name.as_str(), *w))
    }

    pub fn entry(&self, index: usize) -> Option<(&str, f64)> {
        self.entries.get(index).map(|(name, w)| (name.as_str(), *w))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    pub fn is_valid(&self) -> bool {
        (self.sum() - 1.0).abs() <= WEIGHT_SUM_EPSILON
    }

    pub fn validate_sum(&self) -> Result<(), ScoringError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ScoringError::InvalidWeightSum { sum: self.sum() })
        }
    }

    /// Rescale every weight so the total is 1.0. No-op when all weights are zero.
    pub fn normalize(&mut self) {
        let sum = self.sum();
        if sum > 0.0 {
            for (_, w) in &mut self.entries {
                *w /= sum;
            }
        }
    }

    /// Apply partial overrides on top of these weights
    pub fn with_overrides(&self, overrides: &BTreeMap<String, f64>) -> Result<Self, ScoringError> {
        let mut merged = self.clone();
        for (feature, value) in overrides {
            merged.set(feature, *value)?;
        }
        Ok(merged)
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.entries.iter().cloned().collect()
    }
}

pub(crate) fn check_range(feature: &str, value: f64) -> Result<(), ScoringError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ScoringError::OutOfRangeWeight {
            feature: feature.to_string(),
            value,
        })
    }
}

/// Parse a `feature=value` assignment, as given on the command line
pub fn parse_weight_assignment(s: &str) -> Result<(String, f64)> {
    let Some((feature, value)) = s.split_once('=') else {
        bail!("expected FEATURE=VALUE, got '{}'", s);
    };
    let feature = feature.trim();
    if feature.is_empty() {
        bail!("missing feature name in '{}'", s);
    }
    let value: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("invalid weight value in '{}'", s))?;
    Ok((feature.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(vec!["a".to_string(), "b".to_string()]).unwrap()
    }

    fn weights(a: f64, b: f64) -> WeightConfig {
        WeightConfig::from_pairs([("a", a), ("b", b)])
    }

    #[test]
    fn test_sum_uses_tolerance() {
        // 0.1 + 0.2 + 0.7 is not exactly 1.0 in binary floating point
        let w = WeightConfig::from_pairs([("a", 0.1), ("b", 0.2), ("c", 0.7)]);
        assert!(w.is_valid());
        assert!(w.validate_sum().is_ok());
    }

    #[test]
    fn test_sum_off_by_two_percent_is_invalid() {
        assert!(!weights(0.5, 0.48).is_valid());
        assert!(!weights(0.5, 0.52).is_valid());
        match weights(0.5, 0.4).validate_sum() {
            Err(ScoringError::InvalidWeightSum { sum }) => assert!((sum - 0.9).abs() < 1e-12),
            other => panic!("expected InvalidWeightSum, got {:?}", other),
        }
    }

    #[test]
    fn test_set_rejects_out_of_range() {
        let mut w = weights(0.5, 0.5);
        assert_eq!(
            w.set("a", 1.5),
            Err(ScoringError::OutOfRangeWeight {
                feature: "a".to_string(),
                value: 1.5
            })
        );
        assert!(w.set("a", -0.1).is_err());
        assert!(w.set("a", f64::NAN).is_err());
        // Rejected values leave the weight untouched
        assert_eq!(w.get("a"), Some(0.5));
    }

    #[test]
    fn test_set_unknown_feature() {
        let mut w = weights(0.5, 0.5);
        assert_eq!(
            w.set("z", 0.1),
            Err(ScoringError::UnknownFeature {
                feature: "z".to_string()
            })
        );
    }

    #[test]
    fn test_set_does_not_validate_sum() {
        let mut w = weights(0.5, 0.5);
        w.set("a", 0.9).unwrap();
        assert_eq!(w.get("a"), Some(0.9));
        assert!(!w.is_valid());
    }

    #[test]
    fn test_nudge_clamps_and_snaps() {
        let mut w = weights(0.99, 0.0);
        assert_eq!(w.nudge(0, 0.05), Some(1.0));
        assert_eq!(w.nudge(1, -0.01), Some(0.0));
        let v = w.nudge(1, 0.1).unwrap();
        assert!((v - 0.1).abs() < 1e-12);
        assert_eq!(w.nudge(5, 0.1), None);
    }

    #[test]
    fn test_normalize() {
        let mut w = weights(0.3, 0.1);
        w.normalize();
        assert!(w.is_valid());
        assert!((w.get("a").unwrap() - 0.75).abs() < 1e-12);

        let mut zeros = weights(0.0, 0.0);
        zeros.normalize();
        assert_eq!(zeros.sum(), 0.0);
    }

    #[test]
    fn test_from_map_schema_order_and_checks() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), 0.25);
        map.insert("a".to_string(), 0.75);
        let w = WeightConfig::from_map(&schema(), &map).unwrap();
        assert_eq!(w.entry(0), Some(("a", 0.75)));

        map.remove("b");
        assert_eq!(
            WeightConfig::from_map(&schema(), &map),
            Err(ScoringError::MissingWeight {
                feature: "b".to_string()
            })
        );

        map.insert("b".to_string(), 0.25);
        map.insert("c".to_string(), 0.0);
        assert!(matches!(
            WeightConfig::from_map(&schema(), &map),
            Err(ScoringError::UnknownFeature { .. })
        ));
    }

    #[test]
    fn test_from_pairs_merges_repeated_features() {
        let w = WeightConfig::from_pairs([("a", 0.5), ("a", 0.5), ("b", 0.0)]);
        assert_eq!(w.len(), 2);
        assert_eq!(w.entry(0), Some(("a", 0.5)));
        assert_eq!(w.sum(), 0.5);
        assert!(!w.is_valid());

        let last_wins = WeightConfig::from_pairs([("a", 0.2), ("b", 0.5), ("a", 0.5)]);
        assert_eq!(last_wins.get("a"), Some(0.5));
        assert!(last_wins.is_valid());
    }

    #[test]
    fn test_uniform() {
        let w = WeightConfig::uniform(&schema());
        assert_eq!(w.get("a"), Some(0.5));
        assert!(w.is_valid());
    }

    #[test]
    fn test_with_overrides() {
        let mut overrides = BTreeMap::new();
        overrides.insert("a".to_string(), 1.0);
        overrides.insert("b".to_string(), 0.0);
        let w = weights(0.5, 0.5).with_overrides(&overrides).unwrap();
        assert_eq!(w.to_map(), overrides);
    }

    #[test]
    fn test_parse_weight_assignment() {
        assert_eq!(parse_weight_assignment("a=0.25").unwrap(), ("a".to_string(), 0.25));
        assert_eq!(parse_weight_assignment(" b = 1 ").unwrap(), ("b".to_string(), 1.0));
        assert!(parse_weight_assignment("a").is_err());
        assert!(parse_weight_assignment("=0.5").is_err());
        assert!(parse_weight_assignment("a=lots").is_err());
    }
}
