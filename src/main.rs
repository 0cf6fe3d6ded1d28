use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;

use opportunity_score::config::{self, Config};
use opportunity_score::data::{self, Dataset};
use opportunity_score::output::{self, ExportFormat};
use opportunity_score::scoring::{self, ScoringError, ScoringSession};
use opportunity_score::table::{self, Level, RegionFilter};
use opportunity_score::tui::{self, App};

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_DATASET: i32 = 2;
const EXIT_WEIGHTS: i32 = 3;
const EXIT_CONFIG: i32 = 4;

/// Dataset used when neither `--dataset` nor the config names one
const DEFAULT_DATASET: &str = "opportunity.json";

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the scored table (default if no subcommand)
    Table {
        /// Only show entities of this region
        #[arg(long)]
        region: Option<String>,

        /// Only show these provinces (repeatable)
        #[arg(long = "province")]
        provinces: Vec<String>,

        /// Tab-separated output with a header line
        #[arg(long, conflicts_with = "json")]
        tsv: bool,

        /// JSON array output
        #[arg(long)]
        json: bool,
    },
    /// Rank regions, provinces or cities by mean score
    Rank {
        /// Level to rank (all three when omitted)
        #[arg(long, value_enum)]
        level: Option<Level>,

        /// Number of entries (defaults to top_n from the config)
        #[arg(long)]
        top: Option<usize>,
    },
    /// Print lat/long/score triples for heat map rendering
    Heat,
    /// Launch the interactive dashboard
    Dashboard,
    /// Write the scored table to a file
    Export {
        /// Destination file
        #[arg(short, long)]
        output: PathBuf,

        /// File format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
    },
    /// Create a config file interactively
    Init,
}

#[derive(Parser, Debug)]
#[command(name = "opportunity-score")]
#[command(about = "Weighted housing opportunity scores by region, province and city", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/opportunity-score/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the dataset JSON (overrides the config)
    #[arg(short, long, global = true)]
    dataset: Option<PathBuf>,

    /// Override a weight, as feature=value (repeatable)
    #[arg(short, long = "weight", global = true, value_parser = scoring::parse_weight_assignment)]
    weights: Vec<(String, f64)>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    opportunity_score::stderr_buffer::init_logging(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Table {
        region: None,
        provinces: Vec::new(),
        tsv: false,
        json: false,
    });

    // The wizard runs before anything is loaded: it is how a config gets created
    if let Commands::Init = command {
        if let Err(e) = config::run_init_wizard(cli.config) {
            eprintln!("Init failed: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
        std::process::exit(EXIT_SUCCESS);
    }

    // Load config
    let config = match config::load_config(cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Load dataset
    let dataset_path = cli
        .dataset
        .or_else(|| config.dataset.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET));
    let dataset = match data::load_dataset(&dataset_path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Dataset error: {:#}", e);
            std::process::exit(EXIT_DATASET);
        }
    };

    // Validate config against the dataset's features
    if let Err(errors) = config::validate_config(&config, &dataset.schema) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let session = match start_session(dataset, &config, &cli.weights) {
        Ok(s) => s,
        Err(code) => std::process::exit(code),
    };

    let exit_code = match command {
        Commands::Table {
            region,
            provinces,
            tsv,
            json,
        } => {
            let filter = RegionFilter { region, provinces };
            let rows = filter.apply(session.scores());
            if json {
                match output::format_json(&rows) {
                    Ok(out) => {
                        println!("{}", out);
                        EXIT_SUCCESS
                    }
                    Err(e) => {
                        eprintln!("Failed to serialize scores: {}", e);
                        EXIT_FAILURE
                    }
                }
            } else if tsv {
                println!("{}", output::format_tsv(&rows));
                EXIT_SUCCESS
            } else {
                let use_colors = output::should_use_colors();
                println!("{}", output::format_scored_table(&rows, use_colors));
                EXIT_SUCCESS
            }
        }
        Commands::Rank { level, top } => {
            let n = top.unwrap_or(config.top_n);
            let levels = match level {
                Some(level) => vec![level],
                None => Level::ALL.to_vec(),
            };
            let use_colors = output::should_use_colors();
            let charts: Vec<String> = levels
                .iter()
                .map(|level| {
                    let ranking = table::top_n(session.scores(), *level, n);
                    output::format_ranking(*level, &ranking, use_colors)
                })
                .collect();
            println!("{}", charts.join("\n\n"));
            EXIT_SUCCESS
        }
        Commands::Heat => {
            let points = table::heat_points(session.scores());
            println!("{}", output::format_heat_tsv(&points));
            EXIT_SUCCESS
        }
        Commands::Dashboard => {
            let theme = tui::resolve_theme(config.theme);
            let app = App::new(session, &config).with_theme(theme);
            match tui::run_tui(app).await {
                Ok(()) => EXIT_SUCCESS,
                Err(e) => {
                    eprintln!("Dashboard error: {:#}", e);
                    EXIT_FAILURE
                }
            }
        }
        Commands::Export { output: path, format } => {
            let rows: Vec<_> = session.scores().rows().iter().collect();
            match output::export_scores(&path, &rows, format) {
                Ok(()) => {
                    println!("Wrote {} rows to {}", rows.len(), path.display());
                    EXIT_SUCCESS
                }
                Err(e) => {
                    eprintln!("Export failed: {:#}", e);
                    EXIT_FAILURE
                }
            }
        }
        Commands::Init => EXIT_SUCCESS,
    };

    std::process::exit(exit_code);
}

/// Build the scoring session and apply startup weight overrides (config
/// first, then `--weight`). An override set that doesn't total 1 is reported
/// and the dataset's scores are kept. Returns the exit code on failure.
fn start_session(
    dataset: Dataset,
    config: &Config,
    cli_weights: &[(String, f64)],
) -> Result<ScoringSession, i32> {
    let mut session = match ScoringSession::new(dataset) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Dataset error: {}", e);
            return Err(EXIT_DATASET);
        }
    };

    let cli_overrides: BTreeMap<String, f64> = cli_weights.iter().cloned().collect();
    let config_overrides = config.weights.clone().unwrap_or_default();
    if cli_overrides.is_empty() && config_overrides.is_empty() {
        return Ok(session);
    }

    let weights = match session
        .default_weights()
        .with_overrides(&config_overrides)
        .and_then(|w| w.with_overrides(&cli_overrides))
    {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Weight error: {}", e);
            return Err(EXIT_WEIGHTS);
        }
    };

    match session.apply(&weights) {
        Ok(_) => {}
        Err(ScoringError::InvalidWeightSum { sum }) => {
            eprintln!(
                "Weights sum to {:.2}. Please adjust the weights so that their total equals 1. Showing default scores.",
                sum
            );
        }
        Err(e) => {
            eprintln!("Weight error: {}", e);
            return Err(EXIT_WEIGHTS);
        }
    }

    Ok(session)
}
