//! `streetlink-recon` — Street catalog reconciliation engine.
//!
//! Links records from two independently sourced street catalogs that denote
//! the same real-world street, by canonical name and by proximity. The
//! matchers take in-memory collections; [`load`] reads catalog files and
//! [`config`] parses the TOML run configuration.

pub mod canonical;
pub mod config;
pub mod engine;
pub mod error;
pub mod geo;
pub mod index;
pub mod load;
pub mod matcher;
pub mod model;
pub mod summary;

pub use canonical::{CanonicalRules, Canonicalizer};
pub use config::{ReconConfig, Strategy};
pub use engine::run;
pub use error::ReconError;
pub use geo::{distance_m, GeoPoint};
pub use model::{MatchRecord, ReconInput, ReconResult, StreetRecord};
