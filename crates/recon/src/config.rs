use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::canonical::{CanonicalRules, Canonicalizer};
use crate::error::ReconError;

/// Threshold used when `[coords]` does not set one.
pub const DEFAULT_MAX_DISTANCE_M: f64 = 100.0;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    #[serde(default = "default_strategies")]
    pub strategies: Vec<Strategy>,
    pub catalogs: Catalogs,
    #[serde(default)]
    pub coords: CoordsConfig,
    #[serde(default)]
    pub canonical: CanonicalRules,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Name,
    Coords,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Coords => write!(f, "coords"),
        }
    }
}

fn default_strategies() -> Vec<Strategy> {
    vec![Strategy::Name, Strategy::Coords]
}

// ---------------------------------------------------------------------------
// Catalogs
// ---------------------------------------------------------------------------

/// The two catalogs being reconciled. `a` is resolved against `b`.
#[derive(Debug, Clone, Deserialize)]
pub struct Catalogs {
    pub a: CatalogConfig,
    pub b: CatalogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Tag stamped on every record (`"myhome"`, `"ss"`).
    pub source: String,
    pub file: String,
    #[serde(default)]
    pub format: Option<CatalogFormat>,
    /// JSON pointer to the record array (`"/data"`). JSON only.
    #[serde(default)]
    pub records_path: Option<String>,
    pub columns: ColumnMapping,
    #[serde(default)]
    pub filter: Option<RowFilter>,
}

impl CatalogConfig {
    /// Explicit format, else inferred from the file extension (CSV by default).
    pub fn resolved_format(&self) -> CatalogFormat {
        if let Some(format) = self.format {
            return format;
        }
        match Path::new(&self.file).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => CatalogFormat::Json,
            _ => CatalogFormat::Csv,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogFormat {
    Csv,
    Json,
}

impl std::fmt::Display for CatalogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
        }
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// Source column (CSV header or JSON key) for each record attribute.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColumnMapping {
    pub street_id: String,
    pub display_name: String,
    #[serde(default)]
    pub city_id: Option<String>,
    #[serde(default)]
    pub city_name: Option<String>,
    #[serde(default)]
    pub district_id: Option<String>,
    #[serde(default)]
    pub district_name: Option<String>,
    #[serde(default)]
    pub subdivision_id: Option<String>,
    #[serde(default)]
    pub subdivision_name: Option<String>,
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
}

impl ColumnMapping {
    /// Every mapped source column, required ones first.
    pub fn mapped(&self) -> Vec<&str> {
        let mut cols = vec![self.street_id.as_str(), self.display_name.as_str()];
        for col in [
            &self.city_id,
            &self.city_name,
            &self.district_id,
            &self.district_name,
            &self.subdivision_id,
            &self.subdivision_name,
            &self.latitude,
            &self.longitude,
        ]
        .into_iter()
        .flatten()
        {
            cols.push(col.as_str());
        }
        cols
    }
}

/// Keep only rows whose `column` value is one of `values`.
#[derive(Debug, Clone, Deserialize)]
pub struct RowFilter {
    pub column: String,
    pub values: Vec<String>,
}

// ---------------------------------------------------------------------------
// Coords + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CoordsConfig {
    #[serde(default = "default_max_distance")]
    pub max_distance_m: f64,
}

fn default_max_distance() -> f64 {
    DEFAULT_MAX_DISTANCE_M
}

impl Default for CoordsConfig {
    fn default() -> Self {
        Self {
            max_distance_m: DEFAULT_MAX_DISTANCE_M,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: Option<String>,
    #[serde(default)]
    pub coords_csv: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.strategies.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one strategy is required".into(),
            ));
        }
        for (i, s) in self.strategies.iter().enumerate() {
            if self.strategies[..i].contains(s) {
                return Err(ReconError::ConfigValidation(format!(
                    "strategy '{s}' listed more than once"
                )));
            }
        }

        let max = self.coords.max_distance_m;
        if !max.is_finite() || max < 0.0 {
            return Err(ReconError::ConfigValidation(format!(
                "coords.max_distance_m must be a finite, non-negative number, got {max}"
            )));
        }

        for (label, catalog) in [("a", &self.catalogs.a), ("b", &self.catalogs.b)] {
            validate_catalog(label, catalog, self.uses(Strategy::Coords))?;
        }

        // Surface bad tokens now rather than at run time.
        Canonicalizer::new(&self.canonical)?;

        Ok(())
    }

    pub fn uses(&self, strategy: Strategy) -> bool {
        self.strategies.contains(&strategy)
    }

    pub fn canonicalizer(&self) -> Result<Canonicalizer, ReconError> {
        Canonicalizer::new(&self.canonical)
    }
}

fn validate_catalog(label: &str, catalog: &CatalogConfig, needs_coords: bool) -> Result<(), ReconError> {
    if catalog.source.trim().is_empty() {
        return Err(ReconError::ConfigValidation(format!(
            "catalogs.{label}: source must not be empty"
        )));
    }
    if catalog.file.trim().is_empty() {
        return Err(ReconError::ConfigValidation(format!(
            "catalogs.{label}: file must not be empty"
        )));
    }

    let cols = &catalog.columns;
    if cols.street_id.trim().is_empty() || cols.display_name.trim().is_empty() {
        return Err(ReconError::ConfigValidation(format!(
            "catalogs.{label}: columns.street_id and columns.display_name are required"
        )));
    }
    if cols.latitude.is_some() != cols.longitude.is_some() {
        return Err(ReconError::ConfigValidation(format!(
            "catalogs.{label}: columns.latitude and columns.longitude must be mapped together"
        )));
    }
    if needs_coords && cols.latitude.is_none() {
        return Err(ReconError::ConfigValidation(format!(
            "catalogs.{label}: coords strategy requires columns.latitude and columns.longitude"
        )));
    }

    if catalog.records_path.is_some() && catalog.resolved_format() != CatalogFormat::Json {
        return Err(ReconError::ConfigValidation(format!(
            "catalogs.{label}: records_path is only valid for json catalogs"
        )));
    }
    if let Some(ref path) = catalog.records_path {
        if !path.is_empty() && !path.starts_with('/') {
            return Err(ReconError::ConfigValidation(format!(
                "catalogs.{label}: records_path must be a JSON pointer starting with '/', got '{path}'"
            )));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
