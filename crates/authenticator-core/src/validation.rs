//! # Validation Module
//!
//! Input validation for entries and snapshots.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Host app (Kotlin / Swift / TypeScript)                       │
//! │  ├── Form checks (empty name, empty secret)                            │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Entry constructors (THIS MODULE)                             │
//! │  ├── Field rules: name, secret, period, digits                         │
//! │  └── Rejects the entry before it reaches the ledger                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Snapshot checks (THIS MODULE, optional)                      │
//! │  └── Duplicate ids inside one snapshot (strict checker only)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use authenticator_core::validation::{validate_name, validate_period};
//!
//! assert!(validate_name("alice@example.com").is_ok());
//! assert!(validate_period(0).is_err());
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::ledger::LocalEntry;
use crate::remote::RemoteEntry;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Shortest accepted TOTP period (seconds).
pub const MIN_PERIOD: u16 = 1;

/// Longest accepted TOTP period (seconds).
pub const MAX_PERIOD: u16 = 3600;

/// Fewest accepted code digits.
pub const MIN_DIGITS: u8 = 4;

/// Most accepted code digits.
pub const MAX_DIGITS: u8 = 10;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates an entry name (label).
///
/// ## Rules
/// - Must not be empty after trimming
pub fn validate_name(name: &str) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    Ok(())
}

/// Validates an entry secret.
///
/// Decoding is left to the code generator, which accepts both base32 and
/// (for Steam) base64 secrets.
pub fn validate_secret(secret: &str) -> ValidationResult<()> {
    if secret.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "secret".to_string(),
        });
    }

    Ok(())
}

/// Validates a TOTP period in seconds.
pub fn validate_period(period: u16) -> ValidationResult<()> {
    if !(MIN_PERIOD..=MAX_PERIOD).contains(&period) {
        return Err(ValidationError::OutOfRange {
            field: "period".to_string(),
            min: MIN_PERIOD as i64,
            max: MAX_PERIOD as i64,
        });
    }

    Ok(())
}

/// Validates the number of code digits.
pub fn validate_digits(digits: u8) -> ValidationResult<()> {
    if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits) {
        return Err(ValidationError::OutOfRange {
            field: "digits".to_string(),
            min: MIN_DIGITS as i64,
            max: MAX_DIGITS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Snapshot Validators
// =============================================================================

/// Returns the first id that occurs more than once, if any.
pub fn find_duplicate_ids<'a, I>(ids: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    ids.into_iter()
        .find(|id| !seen.insert(*id))
        .map(str::to_string)
}

/// Rejects a remote snapshot that lists the same entry id twice.
pub fn validate_unique_remote(remote: &[RemoteEntry]) -> ValidationResult<()> {
    match find_duplicate_ids(remote.iter().map(|r| r.entry.id.as_str())) {
        Some(value) => Err(ValidationError::Duplicate {
            field: "remote entry id".to_string(),
            value,
        }),
        None => Ok(()),
    }
}

/// Rejects a local snapshot that lists the same entry id twice.
pub fn validate_unique_local(local: &[LocalEntry]) -> ValidationResult<()> {
    match find_duplicate_ids(local.iter().map(|l| l.entry.id.as_str())) {
        Some(value) => Err(ValidationError::Duplicate {
            field: "local entry id".to_string(),
            value,
        }),
        None => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
