//! # Error Types
//!
//! Domain-specific error types for authenticator-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  authenticator-core errors (this file)                                 │
//! │  ├── CoreError        - Ledger and entry failures                      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  authenticator-sync errors (separate crate)                            │
//! │  └── SyncError        - Config, snapshot and scheduler failures        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SyncError → Host binding          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Note that [`crate::operations::calculate_operations`] never returns an
//! error. Everything here belongs to the code around it: entry construction,
//! ledger edits and the optional strict duplicate check.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No ledger record exists for this entry id.
    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    /// An entry with the same id is already tracked.
    ///
    /// ## When This Occurs
    /// - `Ledger::create` called with an entry whose id is already present
    /// - Host generated an id twice (should never happen with UUID v4)
    #[error("Entry {0} already exists")]
    DuplicateEntry(String),

    /// Entry could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Duplicate value (e.g., the same entry id twice in one snapshot).
    #[error("{field} '{value}' appears more than once")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
