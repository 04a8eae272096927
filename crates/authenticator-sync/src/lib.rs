//! # authenticator-sync: Sync Runtime for the Authenticator
//!
//! Everything around the pure reconciliation engine that needs a runtime:
//! configuration files, a cancellable periodic scheduler and a bridge from
//! `tracing` to the host app's logger.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   SyncConfig::load ──► ReconcileScheduler::from_config ──► start()     │
//! │                               │                                         │
//! │            every period_ms    ▼                                         │
//! │   SnapshotSource ──► SyncOperationChecker ──► ReconcileEventEmitter    │
//! │   (host transport      (duplicate policy +     (host applies ops,      │
//! │    and storage)         core engine)            then Ledger::apply)    │
//! │                                                                         │
//! │   SchedulerHandle::cancel() ──► no further emitter calls               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`] - TOML + environment configuration
//! - [`checker`] - Engine wrapped with the duplicate policy and logging
//! - [`scheduler`] - Periodic reconciliation with only-on-change and cancel
//! - [`log`] - Host log bridge
//! - [`error`] - Sync error taxonomy

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checker;
pub mod config;
pub mod error;
pub mod log;
pub mod scheduler;

// =============================================================================
// Re-exports
// =============================================================================

pub use checker::{OperationSummary, SyncOperationChecker};
pub use config::{DuplicatePolicy, LoggingSettings, ReconcileSettings, SchedulerSettings, SyncConfig};
pub use error::{SyncError, SyncResult};
pub use log::{init_logging, HostLogLayer, LogLevel, Logger};
pub use scheduler::{
    NoOpEmitter, ReconcileEventEmitter, ReconcileScheduler, SchedulerHandle, SchedulerStatus,
    SnapshotSource,
};
