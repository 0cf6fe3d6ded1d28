use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::table::DEFAULT_TOP_N;

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

/// User configuration loaded from `config.yaml`.
///
/// Example YAML:
/// ```yaml
/// dataset: ~/data/opportunity.json
/// default_region: "Region III"
/// top_n: 15
/// theme: dark
/// weights:
///   rent: 0.4
///   income: 0.6
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Dataset file used when `--dataset` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<PathBuf>,

    /// Region selected when the dashboard opens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_region: Option<String>,

    /// Number of entries in rankings (default: 10)
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Weight overrides applied on top of the dataset defaults at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<BTreeMap<String, f64>>,

    /// Dashboard color theme
    #[serde(default)]
    pub theme: ThemeMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: None,
            default_region: None,
            top_n: DEFAULT_TOP_N,
            weights: None,
            theme: ThemeMode::default(),
        }
    }
}

/// Dashboard palette selection. `Auto` asks the terminal for its background.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Auto,
    Dark,
    Light,
}
