use std::collections::HashMap;

use crate::config::Strategy;
use crate::error::ReconError;
use crate::model::{MatchRecord, StrategySummary};

/// Per-strategy counts. A-records are identified by `street_id`, which the
/// driver guarantees unique.
pub fn compute_summary(
    total_a: usize,
    total_b: usize,
    candidates_b: usize,
    matches: &[MatchRecord],
    unmatched: usize,
    excluded: usize,
) -> StrategySummary {
    let mut rows_per_a: HashMap<&str, usize> = HashMap::new();
    for m in matches {
        *rows_per_a.entry(m.a.street_id.as_str()).or_insert(0) += 1;
    }

    StrategySummary {
        total_a,
        total_b,
        candidates_b,
        matched: rows_per_a.len(),
        match_rows: matches.len(),
        ambiguous: rows_per_a.values().filter(|&&n| n > 1).count(),
        unmatched,
        excluded,
    }
}

/// Every A-record must land in exactly one of matched / unmatched / excluded.
pub fn check_accounting(strategy: Strategy, summary: &StrategySummary) -> Result<(), ReconError> {
    let accounted = summary.matched + summary.unmatched + summary.excluded;
    if accounted != summary.total_a {
        return Err(ReconError::Accounting {
            strategy: strategy.to_string(),
            detail: format!(
                "matched {} + unmatched {} + excluded {} = {accounted}, expected {}",
                summary.matched, summary.unmatched, summary.excluded, summary.total_a
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchMetric, StreetRecord};

    fn row(a_id: &str, b_id: &str) -> MatchRecord {
        MatchRecord {
            a: StreetRecord::new("myhome", a_id, "x"),
            b: StreetRecord::new("ss", b_id, "x"),
            metric: MatchMetric::Canonical("x".into()),
        }
    }

    #[test]
    fn summary_counts() {
        let matches = vec![row("1", "10"), row("1", "11"), row("2", "12")];
        let s = compute_summary(5, 7, 6, &matches, 2, 1);
        assert_eq!(s.total_a, 5);
        assert_eq!(s.total_b, 7);
        assert_eq!(s.candidates_b, 6);
        assert_eq!(s.matched, 2);
        assert_eq!(s.match_rows, 3);
        assert_eq!(s.ambiguous, 1);
        assert_eq!(s.unmatched, 2);
        assert_eq!(s.excluded, 1);
        assert!(check_accounting(Strategy::Name, &s).is_ok());
    }

    #[test]
    fn summary_empty() {
        let s = compute_summary(0, 0, 0, &[], 0, 0);
        assert_eq!(s, StrategySummary::default());
        assert!(check_accounting(Strategy::Coords, &s).is_ok());
    }

    #[test]
    fn accounting_mismatch_is_an_error() {
        let s = compute_summary(4, 1, 1, &[row("1", "10")], 1, 1);
        let err = check_accounting(Strategy::Coords, &s).unwrap_err();
        assert!(matches!(err, ReconError::Accounting { ref strategy, .. } if strategy == "coords"));
        assert!(err.to_string().contains("expected 4"));
    }
}
