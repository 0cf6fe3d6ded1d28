use crate::scoring::{ScoreTable, ScoredEntity};
use std::collections::HashMap;
use std::fmt;

/// Default number of entries in a ranking
pub const DEFAULT_TOP_N: usize = 10;

/// Geographic granularity for grouping scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Level {
    Region,
    Province,
    CityMunicipality,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Region, Level::Province, Level::CityMunicipality];

    /// The grouping key of `row` at this level
    pub fn key<'a>(&self, row: &'a ScoredEntity) -> &'a str {
        match self {
            Level::Region => &row.entity.region,
            Level::Province => &row.entity.province,
            Level::CityMunicipality => &row.entity.city_municipality,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = match self {
            Level::Region => "Region",
            Level::Province => "Province",
            Level::CityMunicipality => "City/Municipality",
        };
        write!(f, "{}", title)
    }
}

/// Mean opportunity score of one group
#[derive(Debug, Clone, PartialEq)]
pub struct LevelScore {
    pub name: String,
    pub mean: f64,
    pub count: usize,
    /// Parent region (set for provinces and cities)
    pub region: Option<String>,
    /// Parent province (set for cities)
    pub province: Option<String>,
}

/// Mean `opportunity_score` grouped by `level`, groups in order of first appearance.
///
/// Groups are keyed by name alone, so two cities sharing a name are averaged
/// together. Parent labels come from the last row seen with that name.
pub fn mean_by_level(table: &ScoreTable, level: Level) -> Vec<LevelScore> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, (f64, usize, &ScoredEntity)> = HashMap::new();

    for row in table.rows() {
        let key = level.key(row);
        let entry = groups.entry(key).or_insert_with(|| {
            order.push(key);
            (0.0, 0, row)
        });
        entry.0 += row.opportunity_score();
        entry.1 += 1;
        entry.2 = row;
    }

    order
        .into_iter()
        .map(|key| {
            let (total, count, last) = groups[key];
            let (region, province) = match level {
                Level::Region => (None, None),
                Level::Province => (Some(last.entity.region.clone()), None),
                Level::CityMunicipality => (
                    Some(last.entity.region.clone()),
                    Some(last.entity.province.clone()),
                ),
            };
            LevelScore {
                name: key.to_string(),
                mean: total / count as f64,
                count,
                region,
                province,
            }
        })
        .collect()
}

/// The `n` groups with the highest mean score, best first.
/// Ties keep first-appearance order.
pub fn top_n(table: &ScoreTable, level: Level, n: usize) -> Vec<LevelScore> {
    let mut groups = mean_by_level(table, level);
    groups.sort_by(|a, b| b.mean.partial_cmp(&a.mean).unwrap_or(std::cmp::Ordering::Equal));
    groups.truncate(n);
    groups
}
