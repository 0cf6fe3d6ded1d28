use crate::data::Entity;
use crate::scoring::{ScoreTable, ScoredEntity};

/// Region picked by default when the dataset has it
pub const DEFAULT_REGION: &str = "NCR";

/// Unique regions in order of first appearance
pub fn regions(table: &ScoreTable) -> Vec<&str> {
    unique(table.rows().iter().map(|r| r.entity.region.as_str()))
}

/// Unique provinces of one region in order of first appearance
pub fn provinces_in<'a>(table: &'a ScoreTable, region: &str) -> Vec<&'a str> {
    unique(
        table
            .rows()
            .iter()
            .filter(|r| r.entity.region == region)
            .map(|r| r.entity.province.as_str()),
    )
}

/// Unique regions of a plain entity list in order of first appearance
pub fn regions_of(entities: &[Entity]) -> Vec<&str> {
    unique(entities.iter().map(|e| e.region.as_str()))
}

fn unique<'a>(items: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen: Vec<&str> = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}

/// Region, then province membership filter for the raw table view.
///
/// An empty province list selects every province of the region.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegionFilter {
    pub region: Option<String>,
    pub provinces: Vec<String>,
}

impl RegionFilter {
    /// Filter on the default region (`NCR` when present, else the first region)
    pub fn default_for(table: &ScoreTable, preferred: Option<&str>) -> Self {
        let available = regions(table);
        let wanted = preferred.unwrap_or(DEFAULT_REGION);
        let region = if available.contains(&wanted) {
            Some(wanted.to_string())
        } else {
            available.first().map(|r| r.to_string())
        };
        Self {
            region,
            provinces: Vec::new(),
        }
    }

    pub fn matches(&self, row: &ScoredEntity) -> bool {
        let region_ok = self
            .region
            .as_deref()
            .map_or(true, |region| row.entity.region == region);
        let province_ok =
            self.provinces.is_empty() || self.provinces.iter().any(|p| *p == row.entity.province);
        region_ok && province_ok
    }

    /// Rows passing the filter, in table order
    pub fn apply<'a>(&self, table: &'a ScoreTable) -> Vec<&'a ScoredEntity> {
        table.rows().iter().filter(|row| self.matches(row)).collect()
    }

    /// Add or remove a province from the selection
    pub fn toggle_province(&mut self, province: &str) {
        if let Some(pos) = self.provinces.iter().position(|p| p == province) {
            self.provinces.remove(pos);
        } else {
            self.provinces.push(province.to_string());
        }
    }
}
