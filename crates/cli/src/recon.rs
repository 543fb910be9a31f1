//! `streetlink run | validate | canon` — config-driven street reconciliation.

use std::path::{Path, PathBuf};

use streetlink_recon::config::ReconConfig;
use streetlink_recon::load::load_input;
use streetlink_recon::model::{ReconResult, StrategySummary};
use streetlink_recon::{Canonicalizer, Strategy};

use crate::exit_codes::{EXIT_RECON_INVALID_CONFIG, EXIT_RECON_RUNTIME, EXIT_RECON_UNMATCHED};
use crate::export;
use crate::CliError;

pub struct RunOptions {
    pub config: PathBuf,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub coords_csv: Option<PathBuf>,
    pub strategies: Vec<Strategy>,
    pub max_distance: Option<f64>,
    pub strict: bool,
}

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError::new(code, msg)
}

/// Read and validate a config. Returns it with the directory that relative
/// catalog and output paths resolve against.
fn load_config(config_path: &Path) -> Result<(ReconConfig, PathBuf), CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        recon_err(
            EXIT_RECON_INVALID_CONFIG,
            format!("cannot read config {}: {e}", config_path.display()),
        )
    })?;
    let config = ReconConfig::from_toml(&config_str)?;
    let base_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((config, base_dir))
}

pub fn cmd_run(opts: RunOptions) -> Result<(), CliError> {
    let (mut config, base_dir) = load_config(&opts.config)?;

    // CLI overrides, then re-validate the merged config.
    if !opts.strategies.is_empty() {
        let mut strategies = Vec::new();
        for s in opts.strategies {
            if !strategies.contains(&s) {
                strategies.push(s);
            }
        }
        config.strategies = strategies;
    }
    if let Some(max) = opts.max_distance {
        config.coords.max_distance_m = max;
    }
    config.validate()?;

    // Flag paths are taken as given; config paths resolve next to the config.
    let json_path = opts
        .output
        .or_else(|| config.output.json.as_ref().map(|p| base_dir.join(p)));
    let csv_path = match (opts.coords_csv, &config.output.coords_csv) {
        (Some(path), _) if !config.uses(Strategy::Coords) => {
            return Err(CliError::args(format!(
                "--coords-csv {} needs the coords strategy",
                path.display()
            ))
            .with_hint("add --strategy coords or drop --coords-csv"));
        }
        (Some(path), _) => Some(path),
        (None, Some(p)) if config.uses(Strategy::Coords) => Some(base_dir.join(p)),
        (None, Some(p)) => {
            tracing::warn!(path = %p, "coords strategy not run, skipping [output].coords_csv");
            None
        }
        (None, None) => None,
    };

    let input = load_input(&config, &base_dir)?;
    let result = streetlink_recon::run(&config, &input)?;

    // Artifacts are written only once the run has succeeded, and together.
    let json_str = export::result_json(&result).map_err(|e| recon_err(EXIT_RECON_RUNTIME, e))?;

    let mut artifacts = Vec::new();
    if let Some(path) = json_path {
        artifacts.push((path, json_str.clone().into_bytes()));
    }
    if let (Some(path), Some(coords)) = (csv_path, &result.coords) {
        let data = export::coords_csv_bytes(coords).map_err(|e| recon_err(EXIT_RECON_RUNTIME, e))?;
        artifacts.push((path, data));
    }
    export::write_artifacts(&artifacts).map_err(|e| recon_err(EXIT_RECON_RUNTIME, e))?;
    for (path, _) in &artifacts {
        eprintln!("wrote {}", path.display());
    }

    if opts.json {
        println!("{json_str}");
    }

    print_summary(&result);

    let unmatched = result.unmatched_total();
    if opts.strict && unmatched > 0 {
        return Err(recon_err(
            EXIT_RECON_UNMATCHED,
            format!("{unmatched} unmatched record(s) (--strict)"),
        ));
    }

    Ok(())
}

fn print_summary(result: &ReconResult) {
    eprintln!("{}", result.meta.config_name);
    if let Some(ref name) = result.name {
        eprintln!("  name:   {}", summary_line(&name.summary));
    }
    if let Some(ref coords) = result.coords {
        eprintln!(
            "  coords: {} (max {} m)",
            summary_line(&coords.summary),
            coords.max_distance_m
        );
    }
}

fn summary_line(s: &StrategySummary) -> String {
    let mut line = format!(
        "{} of {} matched ({} rows",
        s.matched, s.total_a, s.match_rows
    );
    if s.ambiguous > 0 {
        line.push_str(&format!(", {} ambiguous", s.ambiguous));
    }
    line.push_str(&format!("), {} unmatched, {} excluded", s.unmatched, s.excluded));
    line
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let (config, _) = load_config(&config_path)?;
    let strategies: Vec<String> = config.strategies.iter().map(|s| s.to_string()).collect();
    eprintln!(
        "valid: '{}' ({} → {}), strategies: {}",
        config.name,
        config.catalogs.a.source,
        config.catalogs.b.source,
        strategies.join(", "),
    );
    Ok(())
}

pub fn cmd_canon(names: Vec<String>, config_path: Option<PathBuf>) -> Result<(), CliError> {
    let canonicalizer = match config_path {
        Some(path) => load_config(&path)?.0.canonicalizer()?,
        None => Canonicalizer::with_default_rules()?,
    };
    for name in &names {
        println!("{name}\t{}", canonicalizer.canonicalize(name));
    }
    Ok(())
}
