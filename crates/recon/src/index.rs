use std::collections::BTreeMap;

use crate::canonical::Canonicalizer;
use crate::model::StreetRecord;

/// Canonical key → B-records sharing it, in input order.
#[derive(Debug, Default)]
pub struct NameIndex<'a> {
    buckets: BTreeMap<String, Vec<&'a StreetRecord>>,
    indexed: usize,
    skipped: usize,
}

impl<'a> NameIndex<'a> {
    /// Index `records` by canonical key. Records whose key is empty are skipped.
    pub fn build(records: &'a [StreetRecord], canonicalizer: &Canonicalizer) -> Self {
        let mut index = NameIndex::default();
        for record in records {
            let key = canonicalizer.canonicalize(&record.display_name);
            if key.is_empty() {
                index.skipped += 1;
                continue;
            }
            index.buckets.entry(key).or_default().push(record);
            index.indexed += 1;
        }
        index
    }

    pub fn get(&self, key: &str) -> Option<&[&'a StreetRecord]> {
        self.buckets.get(key).map(|v| v.as_slice())
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Records placed in some bucket.
    pub fn indexed(&self) -> usize {
        self.indexed
    }

    /// Records left out because their key was empty.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Keys shared by more than one record.
    pub fn ambiguous_keys(&self) -> Vec<&str> {
        self.buckets
            .iter()
            .filter(|(_, bucket)| bucket.len() > 1)
            .map(|(key, _)| key.as_str())
            .collect()
    }
}
