use serde::{Serialize, Serializer};

use crate::config::Strategy;
use crate::geo::{round_2dp, GeoPoint};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single normalized row from either catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreetRecord {
    pub source: String,
    pub city_id: Option<String>,
    pub city_name: String,
    pub district_id: Option<String>,
    pub district_name: String,
    pub subdivision_id: Option<String>,
    pub subdivision_name: String,
    pub street_id: String,
    pub display_name: String,
    pub coordinates: Option<GeoPoint>,
}

impl StreetRecord {
    /// Minimal record with only identity and name set.
    pub fn new(source: impl Into<String>, street_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            city_id: None,
            city_name: String::new(),
            district_id: None,
            district_name: String::new(),
            subdivision_id: None,
            subdivision_name: String::new(),
            street_id: street_id.into(),
            display_name: display_name.into(),
            coordinates: None,
        }
    }

    pub fn has_name(&self) -> bool {
        !self.display_name.trim().is_empty()
    }
}

/// Pre-loaded catalogs. `a` is the side being resolved, `b` the reference.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub a: Vec<StreetRecord>,
    pub b: Vec<StreetRecord>,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMetric {
    /// Shared canonical key (name strategy).
    Canonical(String),
    /// Great-circle distance (coordinate strategy). Stored at full precision.
    #[serde(rename = "distance_m")]
    Distance(#[serde(serialize_with = "serialize_rounded")] f64),
}

fn serialize_rounded<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_2dp(*value))
}

/// One A↔B link produced by a matcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    pub a: StreetRecord,
    pub b: StreetRecord,
    #[serde(flatten)]
    pub metric: MatchMetric,
}

impl MatchRecord {
    pub fn canonical(&self) -> Option<&str> {
        match &self.metric {
            MatchMetric::Canonical(key) => Some(key),
            MatchMetric::Distance(_) => None,
        }
    }

    pub fn distance_m(&self) -> Option<f64> {
        match self.metric {
            MatchMetric::Distance(d) => Some(d),
            MatchMetric::Canonical(_) => None,
        }
    }
}

/// An A-record with no acceptable B-candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedRecord {
    pub record: StreetRecord,
    /// Key that failed lookup (name strategy only; may be empty).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    EmptyName,
    MissingCoordinates,
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "empty_name"),
            Self::MissingCoordinates => write!(f, "missing_coordinates"),
        }
    }
}

/// An A-record that could not take part in a strategy at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcludedRecord {
    pub record: StreetRecord,
    pub reason: ExclusionReason,
}

#[derive(Debug, Default)]
pub struct NameMatchOutput {
    pub matches: Vec<MatchRecord>,
    pub unmatched: Vec<UnmatchedRecord>,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StrategySummary {
    pub total_a: usize,
    pub total_b: usize,
    /// B-records that could be candidates (indexed / with coordinates).
    pub candidates_b: usize,
    /// A-records with at least one match row.
    pub matched: usize,
    pub match_rows: usize,
    /// A-records that fanned out to more than one B-record.
    pub ambiguous: usize,
    pub unmatched: usize,
    pub excluded: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct NameOutput {
    pub summary: StrategySummary,
    pub matches: Vec<MatchRecord>,
    pub unmatched: Vec<UnmatchedRecord>,
    pub excluded: Vec<ExcludedRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoordsOutput {
    pub summary: StrategySummary,
    pub max_distance_m: f64,
    pub matches: Vec<MatchRecord>,
    pub unmatched: Vec<UnmatchedRecord>,
    pub excluded: Vec<ExcludedRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub strategies: Vec<Strategy>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<NameOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coords: Option<CoordsOutput>,
}

impl ReconResult {
    /// Total unmatched A-records across all strategies that ran.
    pub fn unmatched_total(&self) -> usize {
        self.name.as_ref().map_or(0, |n| n.summary.unmatched)
            + self.coords.as_ref().map_or(0, |c| c.summary.unmatched)
    }
}
