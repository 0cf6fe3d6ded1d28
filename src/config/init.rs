use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::config::{get_config_path, save_config, Config, ThemeMode};
use crate::data::load_dataset;
use crate::scoring::WeightConfig;
use crate::table::{regions_of, DEFAULT_REGION, DEFAULT_TOP_N};

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

/// Parse a weight typed at a prompt. Must be a number in [0, 1].
fn parse_weight_input(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && (0.0..=1.0).contains(&v) => Ok(v),
        Ok(_) => Err("must be between 0 and 1".to_string()),
        Err(_) => Err("must be a number between 0 and 1".to_string()),
    }
}

fn parse_theme_input(s: &str) -> Result<ThemeMode, String> {
    match s.to_lowercase().as_str() {
        "auto" => Ok(ThemeMode::Auto),
        "dark" => Ok(ThemeMode::Dark),
        "light" => Ok(ThemeMode::Light),
        other => Err(format!("unknown theme '{}', use auto, dark or light", other)),
    }
}

/// Ask for one weight per feature, starting from the dataset defaults.
/// Loops until the total is 1.0 or the user accepts normalization.
fn prompt_weights(defaults: &WeightConfig) -> Result<BTreeMap<String, f64>> {
    loop {
        let mut weights = defaults.clone();
        for (feature, default) in defaults.iter() {
            let value = loop {
                let input = prompt_with_default(&format!("  Weight for '{}'", feature), &format!("{}", default))?;
                match parse_weight_input(&input) {
                    Ok(v) => break v,
                    Err(e) => println!("  Invalid: {}. Try again.", e),
                }
            };
            weights
                .set(feature, value)
                .map_err(|e| anyhow::anyhow!("{}", e))?;
        }

        if weights.is_valid() {
            return Ok(weights.to_map());
        }

        println!("  Weights sum to {:.2}, but they must total 1.", weights.sum());
        if weights.sum() > 0.0 && prompt_yes_no("  Normalize them so they total 1?", true)? {
            weights.normalize();
            return Ok(weights.to_map());
        }
        println!("  Let's try again.");
    }
}

/// Run the interactive init wizard to create a config file.
///
/// If `default_path` is Some, uses that as the config file path.
/// Otherwise, prompts the user with the default config path.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    println!();
    println!("Opportunity Score Configuration Wizard");
    println!("======================================");
    println!();

    // 1. Dataset
    println!("The dataset is the JSON file produced by the data-preparation step.");
    let dataset_str = prompt_with_default("Dataset path", "opportunity.json")?;
    let dataset_path = PathBuf::from(&dataset_str);
    let dataset = match load_dataset(&dataset_path) {
        Ok(dataset) => {
            println!(
                "  Found {} entities with {} features.",
                dataset.entities.len(),
                dataset.schema.len()
            );
            Some(dataset)
        }
        Err(e) => {
            println!("  Could not load dataset: {:#}", e);
            println!("  Continuing without it; weights can be set later.");
            None
        }
    };

    // 2. Default region
    println!();
    if let Some(dataset) = &dataset {
        println!(
            "Regions in the dataset: {}",
            regions_of(&dataset.entities).join(", ")
        );
    }
    let region = prompt_with_default("Region to show first", DEFAULT_REGION)?;
    let default_region = if region == DEFAULT_REGION {
        None
    } else {
        Some(region)
    };

    // 3. Ranking size
    println!();
    let top_n: usize = loop {
        let input = prompt_with_default("Entries per ranking", &DEFAULT_TOP_N.to_string())?;
        match input.parse::<usize>() {
            Ok(v) if v > 0 => break v,
            _ => println!("  Invalid: must be a positive whole number. Try again."),
        }
    };

    // 4. Theme
    let theme = loop {
        let input = prompt_with_default("Dashboard theme (auto/dark/light)", "auto")?;
        match parse_theme_input(&input) {
            Ok(theme) => break theme,
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    };

    // 5. Weights
    let weights = match &dataset {
        Some(dataset) => {
            println!();
            println!("Weights set how much each feature contributes. They must total 1.");
            if prompt_yes_no("Customize the starting weights? (n keeps the dataset defaults)", false)? {
                Some(prompt_weights(&dataset.default_weights)?)
            } else {
                None
            }
        }
        None => None,
    };

    // 6. Config path
    let default_config_path = match default_path {
        Some(path) => path,
        None => get_config_path()?,
    };
    println!();
    let path_str = prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    // Check if file already exists
    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!(
                "Config already exists at {}. Overwrite?",
                config_path.display()
            ),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    // 7. Write config
    let config = Config {
        dataset: Some(absolute(&dataset_path)),
        default_region,
        top_n,
        weights,
        theme,
    };
    save_config(&config_path, &config)?;

    println!();
    println!("Config written to {}", config_path.display());
    println!("Run `opportunity-score dashboard` to get started.");

    Ok(())
}

/// Resolve a relative path against the current directory so the config works from anywhere
fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
