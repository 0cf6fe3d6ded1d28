use super::engine::{calculate_scores, ScoreTable};
use super::error::ScoringError;
use super::weights::WeightConfig;
use crate::data::{Dataset, Entity, FeatureSchema, ScaledTable};

/// Owns the loaded tables, the applied weights and the current score table.
///
/// The only way to change scores is [`ScoringSession::apply`], which either
/// replaces the whole table or leaves everything as it was.
#[derive(Debug, Clone)]
pub struct ScoringSession {
    schema: FeatureSchema,
    entities: Vec<Entity>,
    scaled: ScaledTable,
    default_weights: WeightConfig,
    applied: WeightConfig,
    scores: ScoreTable,
    apply_count: usize,
}

impl ScoringSession {
    /// Start a session from a loaded dataset. Scores shipped with the dataset
    /// are used as the initial table; otherwise they are computed from the
    /// default weights.
    pub fn new(dataset: Dataset) -> Result<Self, ScoringError> {
        let Dataset {
            schema,
            entities,
            scaled,
            default_weights,
            scores,
        } = dataset;

        let table = match scores {
            Some(ref precomputed) => ScoreTable::from_precomputed(&entities, precomputed)?,
            None => calculate_scores(&scaled, &entities, &default_weights)?,
        };

        Ok(Self {
            schema,
            entities,
            scaled,
            applied: default_weights.clone(),
            default_weights,
            scores: table,
            apply_count: 0,
        })
    }

    /// Validate `weights` and recompute every score.
    ///
    /// On success the new table replaces the old one and `weights` become the
    /// applied weights. On failure nothing changes and the error is returned
    /// for the caller to show.
    pub fn apply(&mut self, weights: &WeightConfig) -> Result<&ScoreTable, ScoringError> {
        match calculate_scores(&self.scaled, &self.entities, weights) {
            Ok(table) => {
                self.scores = table;
                self.applied = weights.clone();
                self.apply_count += 1;
                log::debug!(
                    "Applied weights (sum {:.4}) to {} entities",
                    weights.sum(),
                    self.scores.len()
                );
                Ok(&self.scores)
            }
            Err(e) => {
                log::debug!("Weights not applied, keeping previous scores: {}", e);
                Err(e)
            }
        }
    }

    /// Re-apply the dataset's default weights
    pub fn reset(&mut self) -> Result<&ScoreTable, ScoringError> {
        let defaults = self.default_weights.clone();
        self.apply(&defaults)
    }

    pub fn scores(&self) -> &ScoreTable {
        &self.scores
    }

    pub fn applied_weights(&self) -> &WeightConfig {
        &self.applied
    }

    pub fn default_weights(&self) -> &WeightConfig {
        &self.default_weights
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn scaled(&self) -> &ScaledTable {
        &self.scaled
    }

    /// Number of successful applies since the session started
    pub fn apply_count(&self) -> usize {
        self.apply_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn dataset(scores: Option<Vec<f64>>) -> Dataset {
        let schema = FeatureSchema::new(vec!["A".to_string(), "B".to_string()]).unwrap();
        Dataset {
            scaled: ScaledTable::new(
                schema.names().to_vec(),
                vec![vec![0.2, 0.6], vec![0.8, 0.4]],
            )
            .unwrap(),
            entities: vec![
                Entity::new("NCR", "Metro Manila", "Pasig", 14.57, 121.08),
                Entity::new("NCR", "Metro Manila", "Makati", 14.55, 121.02),
            ],
            default_weights: WeightConfig::uniform(&schema),
            schema,
            scores,
        }
    }

    fn assert_scores(session: &ScoringSession, expected: &[f64]) {
        for (got, want) in session.scores().scores().iter().zip(expected) {
            assert!((got - want).abs() < TOLERANCE, "got {}, want {}", got, want);
        }
    }

    #[test]
    fn test_initial_scores_from_default_weights() {
        let session = ScoringSession::new(dataset(None)).unwrap();
        assert_scores(&session, &[0.4, 0.6]);
        assert_eq!(session.apply_count(), 0);
    }

    #[test]
    fn test_initial_scores_from_dataset() {
        let session = ScoringSession::new(dataset(Some(vec![0.11, 0.22]))).unwrap();
        assert_eq!(session.scores().scores(), vec![0.11, 0.22]);
    }

    #[test]
    fn test_apply_then_reject_keeps_last_known_good() {
        let mut session = ScoringSession::new(dataset(None)).unwrap();

        let first = WeightConfig::from_pairs([("A", 0.5), ("B", 0.5)]);
        session.apply(&first).unwrap();
        assert_scores(&session, &[0.4, 0.6]);

        let only_a = WeightConfig::from_pairs([("A", 1.0), ("B", 0.0)]);
        session.apply(&only_a).unwrap();
        assert_scores(&session, &[0.2, 0.8]);

        session.apply(&first).unwrap();
        let before = session.scores().clone();

        let bad = WeightConfig::from_pairs([("A", 0.5), ("B", 0.4)]);
        let err = session.apply(&bad).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidWeightSum { .. }));
        assert_eq!(session.scores(), &before);
        assert_eq!(session.applied_weights(), &first);
        assert_scores(&session, &[0.4, 0.6]);
    }

    #[test]
    fn test_sums_near_one_are_rejected() {
        let mut session = ScoringSession::new(dataset(None)).unwrap();
        let before = session.scores().clone();

        for b in [0.48, 0.52] {
            let weights = WeightConfig::from_pairs([("A", 0.5), ("B", b)]);
            assert!(matches!(
                session.apply(&weights),
                Err(ScoringError::InvalidWeightSum { .. })
            ));
            assert_eq!(session.scores(), &before);
        }
        assert_eq!(session.apply_count(), 0);
    }

    #[test]
    fn test_missing_weight_keeps_previous_table() {
        let mut session = ScoringSession::new(dataset(None)).unwrap();
        let before = session.scores().clone();
        let err = session.apply(&WeightConfig::from_pairs([("A", 1.0)])).unwrap_err();
        assert_eq!(
            err,
            ScoringError::MissingWeight {
                feature: "B".to_string()
            }
        );
        assert_eq!(session.scores(), &before);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut session = ScoringSession::new(dataset(None)).unwrap();
        let weights = WeightConfig::from_pairs([("A", 0.3), ("B", 0.7)]);
        let first = session.apply(&weights).unwrap().clone();
        let second = session.apply(&weights).unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(session.apply_count(), 2);
    }

    #[test]
    fn test_raising_a_weight_favours_entities_above_its_mean() {
        let mut session = ScoringSession::new(dataset(None)).unwrap();
        let baseline = session.scores().scores();
        let mean_a = session.scaled().column_mean("A").unwrap();

        // Raise A, then renormalize
        let mut weights = WeightConfig::from_pairs([("A", 0.9), ("B", 0.5)]);
        weights.normalize();
        session.apply(&weights).unwrap();
        let shifted = session.scores().scores();

        for (i, values) in session.scaled().rows().iter().enumerate() {
            if values[0] > mean_a {
                assert!(shifted[i] > baseline[i]);
            } else if values[0] < mean_a {
                assert!(shifted[i] < baseline[i]);
            }
        }
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut session = ScoringSession::new(dataset(None)).unwrap();
        session
            .apply(&WeightConfig::from_pairs([("A", 1.0), ("B", 0.0)]))
            .unwrap();
        session.reset().unwrap();
        assert_eq!(session.applied_weights(), session.default_weights());
        assert_scores(&session, &[0.4, 0.6]);
    }
}
