use crate::canonical::Canonicalizer;
use crate::index::NameIndex;
use crate::model::{MatchMetric, MatchRecord, NameMatchOutput, StreetRecord, UnmatchedRecord};

/// Match A-records to B-records sharing their canonical key.
///
/// Every A-record lands in exactly one place: one match row per B-record in
/// its bucket, or a single unmatched row carrying the key that failed.
/// Ambiguous keys fan out; nothing here filters by district or distance.
pub fn match_by_name(
    a_records: &[StreetRecord],
    b_index: &NameIndex<'_>,
    canonicalizer: &Canonicalizer,
) -> NameMatchOutput {
    let mut out = NameMatchOutput::default();

    for a in a_records {
        let key = canonicalizer.canonicalize(&a.display_name);
        let candidates = if key.is_empty() { None } else { b_index.get(&key) };

        match candidates {
            Some(bucket) => {
                for b in bucket {
                    out.matches.push(MatchRecord {
                        a: a.clone(),
                        b: (*b).clone(),
                        metric: MatchMetric::Canonical(key.clone()),
                    });
                }
            }
            None => out.unmatched.push(UnmatchedRecord {
                record: a.clone(),
                canonical: Some(key),
            }),
        }
    }

    out
}

/// Containment: same city when both ids are known, same district when both
/// names are known. A missing side never blocks a pair.
fn compatible(a: &StreetRecord, b: &StreetRecord) -> bool {
    if let (Some(ca), Some(cb)) = (&a.city_id, &b.city_id) {
        if ca != cb {
            return false;
        }
    }
    if !a.district_name.is_empty() && !b.district_name.is_empty() && a.district_name != b.district_name {
        return false;
    }
    true
}

/// For each A-record with coordinates, find the nearest compatible B-record
/// with coordinates and keep it when it lies within `max_distance_m`.
///
/// Ties go to the first candidate seen. A-records without an acceptable
/// candidate are simply absent from the output.
pub fn match_by_coords(
    a_records: &[StreetRecord],
    b_records: &[StreetRecord],
    max_distance_m: f64,
) -> Vec<MatchRecord> {
    let b_with_coords: Vec<_> = b_records
        .iter()
        .filter_map(|b| b.coordinates.map(|p| (b, p)))
        .collect();

    let mut matches = Vec::new();

    for a in a_records {
        let Some(a_point) = a.coordinates else {
            continue;
        };

        let mut best: Option<(&StreetRecord, f64)> = None;
        for (b, b_point) in &b_with_coords {
            if !compatible(a, b) {
                continue;
            }
            let d = a_point.distance_to(b_point);
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((*b, d));
            }
        }

        if let Some((b, d)) = best {
            if d <= max_distance_m {
                matches.push(MatchRecord {
                    a: a.clone(),
                    b: b.clone(),
                    metric: MatchMetric::Distance(d),
                });
            }
        }
    }

    matches
}
