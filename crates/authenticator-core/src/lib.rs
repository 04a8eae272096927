//! # authenticator-core: Entry Reconciliation for the Authenticator
//!
//! Pure, deterministic logic for keeping a device's entries in step with the
//! server's copy. No I/O, no async, no clock reads inside the engine.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Authenticator Sync Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │           Host apps (Android / iOS / Web / Desktop)             │   │
//! │  │    fetch remote ──► decrypt ──► reconcile ──► apply & push     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ bindings                               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              authenticator-sync (scheduler, config)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │           ★ authenticator-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌────────────┐  ┌────────────┐    │   │
//! │  │   │  entry  │  │ ledger  │  │ operations │  │ resolution │    │   │
//! │  │   │ remote  │  │         │  │  ordering  │  │ validation │    │   │
//! │  │   └─────────┘  └─────────┘  └────────────┘  └────────────┘    │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`entry`] - The credential/2FA entry value type
//! - [`ledger`] - Local sync state per entry
//! - [`remote`] - The server's view of an entry
//! - [`operations`] - The reconciliation engine and its result type
//! - [`resolution`] - Last-writer-wins conflict rules
//! - [`ordering`] - Display order merge
//! - [`validation`] - Field and snapshot checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use authenticator_core::{calculate_operations, Ledger, OperationType, RemoteEntry};
//! use authenticator_core::entry::{Entry, SteamParameters};
//!
//! let entry = Entry::new_steam(SteamParameters {
//!     name: "gaming".to_string(),
//!     secret: "STEAMKEY".to_string(),
//!     note: None,
//! })
//! .unwrap();
//!
//! let mut ledger = Ledger::new();
//! let remote = vec![RemoteEntry::new("REMOTE_ID", entry, 1_700_000_000)];
//!
//! for op in calculate_operations(remote.clone(), ledger.snapshot()) {
//!     assert_eq!(op.operation, OperationType::Upsert);
//!     ledger.apply(&op, 1_700_000_100).unwrap();
//! }
//!
//! // Converged
//! assert!(calculate_operations(remote, ledger.snapshot()).is_empty());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod entry;
pub mod error;
pub mod ledger;
pub mod operations;
pub mod ordering;
pub mod remote;
pub mod resolution;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_utils;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use entry::{Algorithm, Entry, EntryKind};
pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{Ledger, LocalEntry, LocalEntryState};
pub use operations::{calculate_operations, EntryOperation, OperationType};
pub use ordering::{reorder_items, EntryWithOrder};
pub use remote::RemoteEntry;
pub use resolution::{ConflictResolver, Resolution};
