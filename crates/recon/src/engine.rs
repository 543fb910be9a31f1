use std::collections::HashSet;

use crate::canonical::Canonicalizer;
use crate::config::{ReconConfig, Strategy};
use crate::error::ReconError;
use crate::index::NameIndex;
use crate::matcher::{match_by_coords, match_by_name};
use crate::model::{
    CoordsOutput, ExcludedRecord, ExclusionReason, NameOutput, ReconInput, ReconMeta, ReconResult,
    StrategySummary, StreetRecord, UnmatchedRecord,
};
use crate::summary::{check_accounting, compute_summary};

/// Run every configured strategy over pre-loaded catalogs.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    ensure_unique_ids("a", &input.a)?;
    ensure_unique_ids("b", &input.b)?;

    let canonicalizer = config.canonicalizer()?;

    let mut name = None;
    let mut coords = None;
    for strategy in &config.strategies {
        match strategy {
            Strategy::Name => name = Some(run_name(&input.a, &input.b, &canonicalizer)?),
            Strategy::Coords => {
                coords = Some(run_coords(&input.a, &input.b, config.coords.max_distance_m)?)
            }
        }
    }

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            strategies: config.strategies.clone(),
        },
        name,
        coords,
    })
}

/// Name strategy: blank names are excluded, the rest are looked up in an
/// index over `b`.
pub fn run_name(
    a: &[StreetRecord],
    b: &[StreetRecord],
    canonicalizer: &Canonicalizer,
) -> Result<NameOutput, ReconError> {
    let (named, blank): (Vec<StreetRecord>, Vec<StreetRecord>) =
        a.iter().cloned().partition(|r| r.has_name());
    let excluded = exclude(blank, ExclusionReason::EmptyName);

    let index = NameIndex::build(b, canonicalizer);
    tracing::debug!(
        keys = index.len(),
        indexed = index.indexed(),
        skipped = index.skipped(),
        ambiguous_keys = index.ambiguous_keys().len(),
        "name index built"
    );

    let out = match_by_name(&named, &index, canonicalizer);
    let summary = compute_summary(
        a.len(),
        b.len(),
        index.indexed(),
        &out.matches,
        out.unmatched.len(),
        excluded.len(),
    );
    check_accounting(Strategy::Name, &summary)?;
    log_summary(Strategy::Name, &summary);

    Ok(NameOutput {
        summary,
        matches: out.matches,
        unmatched: out.unmatched,
        excluded,
    })
}

/// Coordinate strategy: records without geometry are excluded; located
/// records with no accepted candidate form the unmatched complement.
pub fn run_coords(
    a: &[StreetRecord],
    b: &[StreetRecord],
    max_distance_m: f64,
) -> Result<CoordsOutput, ReconError> {
    let (located, unlocated): (Vec<StreetRecord>, Vec<StreetRecord>) =
        a.iter().cloned().partition(|r| r.coordinates.is_some());
    let excluded = exclude(unlocated, ExclusionReason::MissingCoordinates);

    let matches = match_by_coords(&located, b, max_distance_m);

    let matched_ids: HashSet<&str> = matches.iter().map(|m| m.a.street_id.as_str()).collect();
    let unmatched: Vec<UnmatchedRecord> = located
        .iter()
        .filter(|r| !matched_ids.contains(r.street_id.as_str()))
        .map(|r| UnmatchedRecord {
            record: r.clone(),
            canonical: None,
        })
        .collect();

    let candidates_b = b.iter().filter(|r| r.coordinates.is_some()).count();
    let summary = compute_summary(
        a.len(),
        b.len(),
        candidates_b,
        &matches,
        unmatched.len(),
        excluded.len(),
    );
    check_accounting(Strategy::Coords, &summary)?;
    log_summary(Strategy::Coords, &summary);

    Ok(CoordsOutput {
        summary,
        max_distance_m,
        matches,
        unmatched,
        excluded,
    })
}

fn exclude(records: Vec<StreetRecord>, reason: ExclusionReason) -> Vec<ExcludedRecord> {
    records
        .into_iter()
        .map(|record| ExcludedRecord { record, reason })
        .collect()
}

fn ensure_unique_ids(catalog: &str, records: &[StreetRecord]) -> Result<(), ReconError> {
    let mut seen = HashSet::with_capacity(records.len());
    for r in records {
        if !seen.insert(r.street_id.as_str()) {
            return Err(ReconError::DuplicateStreetId {
                catalog: catalog.into(),
                street_id: r.street_id.clone(),
            });
        }
    }
    Ok(())
}

fn log_summary(strategy: Strategy, s: &StrategySummary) {
    tracing::info!(
        %strategy,
        total_a = s.total_a,
        total_b = s.total_b,
        candidates_b = s.candidates_b,
        matched = s.matched,
        match_rows = s.match_rows,
        ambiguous = s.ambiguous,
        unmatched = s.unmatched,
        excluded = s.excluded,
        "strategy complete"
    );
}
