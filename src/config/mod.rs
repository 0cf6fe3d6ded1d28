mod init;
mod schema;

pub use init::run_init_wizard;
pub use schema::{Config, ThemeMode};

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::data::FeatureSchema;
use crate::scoring::validate_weight_overrides;

/// Get the config directory path (~/.config/opportunity-score/)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("opportunity-score"))
}

/// Get the default config file path (~/.config/opportunity-score/config.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.yaml"))
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses the default path
///   (~/.config/opportunity-score/config.yaml)
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed or contains unknown fields
///
/// A missing default config file is not an error; defaults are returned.
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(explicit) => {
            if !explicit.exists() {
                anyhow::bail!("Config file not found at {}", explicit.display());
            }
            explicit
        }
        None => {
            let default_path = get_config_path()?;
            if !default_path.exists() {
                log::debug!("No config at {}, using defaults", default_path.display());
                return Ok(Config::default());
            }
            default_path
        }
    };

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    parse_config(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))
}

/// Parse configuration from a YAML string
pub fn parse_config(yaml: &str) -> Result<Config> {
    if yaml.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config = serde_saphyr::from_str(yaml).map_err(|e| anyhow::anyhow!("{}", e))?;
    Ok(config)
}

/// Save configuration as YAML, atomically
///
/// Creates parent directories as needed. The file is never left half-written.
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    let yaml = serde_saphyr::to_string(config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(yaml.as_bytes())
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    file.commit()
        .with_context(|| format!("Failed to save config to {}", path.display()))?;

    Ok(())
}

/// Check the config against the loaded dataset's features.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &Config, schema: &FeatureSchema) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.top_n == 0 {
        errors.push("top_n: must be at least 1".to_string());
    }

    if let Some(weights) = &config.weights {
        if let Err(weight_errors) = validate_weight_overrides("weights", schema, weights) {
            errors.extend(weight_errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(vec!["rent".to_string(), "income".to_string()]).unwrap()
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
dataset: /tmp/opportunity.json
default_region: "Region III"
top_n: 5
theme: light
weights:
  rent: 0.3
  income: 0.7
"#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.dataset, Some(PathBuf::from("/tmp/opportunity.json")));
        assert_eq!(config.default_region.as_deref(), Some("Region III"));
        assert_eq!(config.top_n, 5);
        assert_eq!(config.theme, ThemeMode::Light);
        assert_eq!(config.weights.unwrap().get("income"), Some(&0.7));
    }

    #[test]
    fn test_parse_defaults() {
        let config = parse_config("top_n: 3").unwrap();
        assert_eq!(config.top_n, 3);
        assert_eq!(config.theme, ThemeMode::Auto);
        assert!(config.weights.is_none());

        assert_eq!(parse_config("").unwrap(), Config::default());
        assert_eq!(Config::default().top_n, 10);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(parse_config("queries: []").is_err());
    }

    #[test]
    fn test_invalid_theme_rejected() {
        assert!(parse_config("theme: purple").is_err());
    }

    #[test]
    fn test_missing_explicit_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(dir.path().join("nope.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_region: NCR").unwrap();
        let config = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.default_region.as_deref(), Some("NCR"));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let config = Config {
            dataset: Some(PathBuf::from("/data/opportunity.json")),
            default_region: Some("Region III".to_string()),
            top_n: 7,
            weights: Some([("rent".to_string(), 0.25), ("income".to_string(), 0.75)].into()),
            theme: ThemeMode::Dark,
        };
        save_config(&path, &config).unwrap();
        assert_eq!(load_config(Some(path)).unwrap(), config);
    }

    #[test]
    fn test_validate_config_ok() {
        let config = parse_config("weights:\n  rent: 0.2\n").unwrap();
        assert!(validate_config(&config, &schema()).is_ok());
    }

    #[test]
    fn test_validate_config_collects_errors() {
        let config = Config {
            top_n: 0,
            weights: Some([("parking".to_string(), 0.5), ("rent".to_string(), 1.5)].into()),
            ..Config::default()
        };
        let errors = validate_config(&config, &schema()).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("top_n")));
        assert!(errors.iter().any(|e| e.contains("unknown feature 'parking'")));
        assert!(errors.iter().any(|e| e.contains("weights.rent")));
    }
}
