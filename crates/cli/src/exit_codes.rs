//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 2       | Universal        | CLI usage error (bad args)               |
//! | 60-69   | recon            | Street reconciliation codes              |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into [`recon_exit_code`] or the relevant command

use streetlink_recon::ReconError;

// =============================================================================
// Universal (0, 2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, conflicting options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Recon (60-69)
// =============================================================================

/// Config file unreadable, unparseable or invalid (including bad rules).
pub const EXIT_RECON_INVALID_CONFIG: u8 = 60;

/// Catalog parse failure, duplicate ids, output write failure.
pub const EXIT_RECON_RUNTIME: u8 = 61;

/// A catalog file named by the config does not exist.
pub const EXIT_RECON_MISSING_INPUT: u8 = 62;

/// `--strict` and at least one strategy left unmatched records.
pub const EXIT_RECON_UNMATCHED: u8 = 63;

/// Map a ReconError to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_)
        | ReconError::ConfigValidation(_)
        | ReconError::InvalidRule { .. } => EXIT_RECON_INVALID_CONFIG,
        ReconError::MissingInput { .. } => EXIT_RECON_MISSING_INPUT,
        ReconError::MissingColumn { .. }
        | ReconError::DuplicateStreetId { .. }
        | ReconError::Csv { .. }
        | ReconError::Json { .. }
        | ReconError::Io(_)
        | ReconError::Accounting { .. } => EXIT_RECON_RUNTIME,
    }
}

/// Short remediation hint for errors a user can fix.
pub fn recon_hint(err: &ReconError) -> Option<String> {
    match err {
        ReconError::MissingInput { .. } => {
            Some("catalog paths are resolved relative to the config file".into())
        }
        ReconError::MissingColumn { catalog, .. } => Some(format!(
            "check [catalogs.{catalog}.columns] against the file's header row"
        )),
        ReconError::DuplicateStreetId { .. } => {
            Some("street ids must be unique within a catalog; deduplicate the export".into())
        }
        ReconError::InvalidRule { .. } => {
            Some("tokens in [canonical] are literal text; remove empty entries".into())
        }
        _ => None,
    }
}
