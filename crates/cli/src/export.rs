//! Run artifacts: the JSON result document and the coordinate-match CSV.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use streetlink_recon::geo::round_2dp;
use streetlink_recon::model::{CoordsOutput, MatchRecord, ReconResult};

/// One CSV row per coordinate match, both sides flattened.
#[derive(Debug, Serialize)]
struct CoordsCsvRow<'a> {
    distance_m: f64,
    a_street_id: &'a str,
    a_display_name: &'a str,
    a_district_name: &'a str,
    a_subdivision_name: &'a str,
    a_latitude: Option<f64>,
    a_longitude: Option<f64>,
    b_street_id: &'a str,
    b_display_name: &'a str,
    b_district_name: &'a str,
    b_subdivision_name: &'a str,
    b_latitude: Option<f64>,
    b_longitude: Option<f64>,
}

impl<'a> CoordsCsvRow<'a> {
    fn from_match(m: &'a MatchRecord) -> Self {
        let (a, b) = (&m.a, &m.b);
        Self {
            distance_m: round_2dp(m.distance_m().unwrap_or_default()),
            a_street_id: &a.street_id,
            a_display_name: &a.display_name,
            a_district_name: &a.district_name,
            a_subdivision_name: &a.subdivision_name,
            a_latitude: a.coordinates.map(|p| p.latitude),
            a_longitude: a.coordinates.map(|p| p.longitude),
            b_street_id: &b.street_id,
            b_display_name: &b.display_name,
            b_district_name: &b.district_name,
            b_subdivision_name: &b.subdivision_name,
            b_latitude: b.coordinates.map(|p| p.latitude),
            b_longitude: b.coordinates.map(|p| p.longitude),
        }
    }
}

pub fn coords_csv<W: Write>(out: W, coords: &CoordsOutput) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new().has_headers(true).from_writer(out);
    for m in &coords.matches {
        writer
            .serialize(CoordsCsvRow::from_match(m))
            .map_err(|e| format!("CSV write error: {e}"))?;
    }
    // csv only emits the header alongside the first record.
    if coords.matches.is_empty() {
        writer
            .write_record(HEADER)
            .map_err(|e| format!("CSV write error: {e}"))?;
    }
    writer.flush().map_err(|e| format!("CSV write error: {e}"))
}

const HEADER: [&str; 13] = [
    "distance_m",
    "a_street_id",
    "a_display_name",
    "a_district_name",
    "a_subdivision_name",
    "a_latitude",
    "a_longitude",
    "b_street_id",
    "b_display_name",
    "b_district_name",
    "b_subdivision_name",
    "b_latitude",
    "b_longitude",
];

pub fn result_json(result: &ReconResult) -> Result<String, String> {
    serde_json::to_string_pretty(result).map_err(|e| format!("JSON serialization error: {e}"))
}

pub fn coords_csv_bytes(coords: &CoordsOutput) -> Result<Vec<u8>, String> {
    let mut buf = Vec::new();
    coords_csv(&mut buf, coords)?;
    Ok(buf)
}

/// Write every artifact or none of them.
///
/// Each file is first written to a `.partial` sibling; only when all staged
/// writes succeed are they renamed into place.
pub fn write_artifacts(artifacts: &[(PathBuf, Vec<u8>)]) -> Result<(), String> {
    let mut staged: Vec<PathBuf> = Vec::with_capacity(artifacts.len());
    for (path, data) in artifacts {
        let partial = partial_path(path);
        if let Err(e) = std::fs::write(&partial, data) {
            discard(&staged);
            return Err(format!("cannot write {}: {e}", path.display()));
        }
        staged.push(partial);
    }
    for (i, ((path, _), partial)) in artifacts.iter().zip(&staged).enumerate() {
        if let Err(e) = std::fs::rename(partial, path) {
            discard(&staged[i..]);
            return Err(format!("cannot write {}: {e}", path.display()));
        }
    }
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

fn discard(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::debug!(path = %path.display(), error = %e, "could not remove staged artifact");
        }
    }
}
