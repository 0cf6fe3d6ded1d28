use super::error::ScoringError;
use super::weights::{check_range, WeightConfig, WEIGHT_SUM_EPSILON};
use crate::data::{Entity, ScaledTable};

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureContribution {
    pub feature: String,
    pub value: f64,        // Scaled feature value
    pub weight: f64,       // Applied weight
    pub contribution: f64, // value * weight
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreBreakdown {
    pub contributions: Vec<FeatureContribution>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// An entity with its identifying and geographic fields plus its score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntity {
    pub entity: Entity,
    pub result: ScoreResult,
}

impl ScoredEntity {
    pub fn opportunity_score(&self) -> f64 {
        self.result.score
    }
}

/// The scored entity table, in input order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreTable {
    rows: Vec<ScoredEntity>,
}

impl ScoreTable {
    /// Wrap scores computed by the data-preparation step. These carry no breakdown.
    pub fn from_precomputed(entities: &[Entity], scores: &[f64]) -> Result<Self, ScoringError> {
        if entities.len() != scores.len() {
            return Err(ScoringError::ShapeMismatch {
                scaled_rows: scores.len(),
                entities: entities.len(),
            });
        }
        let rows = entities
            .iter()
            .zip(scores)
            .map(|(entity, score)| ScoredEntity {
                entity: entity.clone(),
                result: ScoreResult {
                    score: *score,
                    breakdown: ScoreBreakdown::default(),
                },
            })
            .collect();
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[ScoredEntity] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&ScoredEntity> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn scores(&self) -> Vec<f64> {
        self.rows.iter().map(ScoredEntity::opportunity_score).collect()
    }

    pub fn max_score(&self) -> f64 {
        self.rows
            .iter()
            .map(ScoredEntity::opportunity_score)
            .fold(0.0_f64, f64::max)
    }
}

/// Compute `opportunity_score = Σ scaled[feature] × weight[feature]` for every entity.
///
/// The weights must sum to 1.0 and cover every scaled column. Extra weights
/// for features the table does not carry are allowed but must be in [0, 1],
/// and the weights of the scaled columns alone must also sum to 1.0. Inputs
/// are only read, and the returned table fully replaces any previous one.
pub fn calculate_scores(
    scaled: &ScaledTable,
    entities: &[Entity],
    weights: &WeightConfig,
) -> Result<ScoreTable, ScoringError> {
    weights.validate_sum()?;

    if scaled.len() != entities.len() {
        return Err(ScoringError::ShapeMismatch {
            scaled_rows: scaled.len(),
            entities: entities.len(),
        });
    }

    // Resolve one weight per column up front so no column is ever skipped
    let column_weights = scaled
        .columns()
        .iter()
        .map(|feature| {
            let weight = weights.get(feature).ok_or_else(|| ScoringError::MissingWeight {
                feature: feature.clone(),
            })?;
            check_range(feature, weight)?;
            Ok(weight)
        })
        .collect::<Result<Vec<f64>, ScoringError>>()?;

    for (feature, weight) in weights.iter() {
        check_range(feature, weight)?;
    }

    // Extra keys must not shift weight away from the scored columns
    let column_sum: f64 = column_weights.iter().sum();
    if (column_sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
        return Err(ScoringError::InvalidWeightSum { sum: column_sum });
    }

    let rows = scaled
        .rows()
        .iter()
        .zip(entities)
        .map(|(values, entity)| {
            let contributions: Vec<FeatureContribution> = scaled
                .columns()
                .iter()
                .zip(values.iter().zip(&column_weights))
                .map(|(feature, (value, weight))| FeatureContribution {
                    feature: feature.clone(),
                    value: *value,
                    weight: *weight,
                    contribution: value * weight,
                })
                .collect();
            let score = contributions.iter().map(|c| c.contribution).sum();

            ScoredEntity {
                entity: entity.clone(),
                result: ScoreResult {
                    score,
                    breakdown: ScoreBreakdown { contributions },
                },
            }
        })
        .collect();

    Ok(ScoreTable { rows })
}
