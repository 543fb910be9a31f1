// streetlink CLI - reconcile two street catalogs from a TOML run config

mod exit_codes;
mod export;
mod recon;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use exit_codes::{recon_exit_code, recon_hint, EXIT_SUCCESS, EXIT_USAGE};
use streetlink_recon::{ReconError, Strategy};

#[derive(Parser)]
#[command(name = "streetlink")]
#[command(about = "Link street records across two catalogs by canonical name and coordinates")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Log progress (info level) to stderr; RUST_LOG overrides
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load both catalogs and run the configured strategies
    #[command(after_help = "\
Examples:
  streetlink run tbilisi.streets.toml
  streetlink run tbilisi.streets.toml --json > mapping.json
  streetlink run tbilisi.streets.toml --strategy coords --max-distance 50
  streetlink run tbilisi.streets.toml --output mapping.json --coords-csv by_coords.csv
  streetlink run tbilisi.streets.toml --strict   # exit 63 if anything is unmatched")]
    Run {
        /// Path to the .streets.toml config file
        config: PathBuf,

        /// Print the JSON result to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON result to this file (overrides [output].json)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write coordinate matches as CSV (overrides [output].coords_csv)
        #[arg(long)]
        coords_csv: Option<PathBuf>,

        /// Run only these strategies (repeatable; overrides `strategies`)
        #[arg(long = "strategy", value_enum)]
        strategies: Vec<StrategyArg>,

        /// Coordinate match threshold in meters (overrides [coords].max_distance_m)
        #[arg(long)]
        max_distance: Option<f64>,

        /// Exit with code 63 when any strategy leaves unmatched records
        #[arg(long)]
        strict: bool,
    },

    /// Parse and validate a config without loading catalogs
    #[command(after_help = "\
Examples:
  streetlink validate tbilisi.streets.toml")]
    Validate {
        /// Path to the .streets.toml config file
        config: PathBuf,
    },

    /// Print the canonical key for each name (name<TAB>key)
    #[command(after_help = "\
Examples:
  streetlink canon 'ფანასკერტელ-ციციშვილის ქ.' 'Chavchavadze Ave.'
  streetlink canon 'ასპინძის I ქ.' --config tbilisi.streets.toml")]
    Canon {
        /// Raw street names
        #[arg(required = true)]
        names: Vec<String>,

        /// Use the [canonical] rules of this config instead of the defaults
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Name,
    Coords,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Name => Strategy::Name,
            StrategyArg::Coords => Strategy::Coords,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\nengine:  streetlink-recon ",
        env!("CARGO_PKG_VERSION"),
    )
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        None => {
            // No subcommand = show usage
            eprintln!("Usage: streetlink <command> [options]");
            eprintln!("       streetlink --help for more information");
            Ok(())
        }
        Some(Commands::Run {
            config,
            json,
            output,
            coords_csv,
            strategies,
            max_distance,
            strict,
        }) => recon::cmd_run(recon::RunOptions {
            config,
            json,
            output,
            coords_csv,
            strategies: strategies.into_iter().map(Strategy::from).collect(),
            max_distance,
            strict,
        }),
        Some(Commands::Validate { config }) => recon::cmd_validate(config),
        Some(Commands::Canon { names, config }) => recon::cmd_canon(names, config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        Self {
            code: recon_exit_code(&err),
            hint: recon_hint(&err),
            message: err.to_string(),
        }
    }
}
