//! # Sync Error Types
//!
//! Error types for the sync runtime.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Snapshots     │  │     Validation          │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  RemoteFetch-   │  │  Core (duplicate ids,   │ │
//! │  │  ConfigLoad-    │  │    Failed       │  │    ledger errors)       │ │
//! │  │    Failed       │  │  LocalRead-     │  │                         │ │
//! │  │  ConfigSave-    │  │    Failed       │  │                         │ │
//! │  │    Failed       │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  Internal: LoggingInitFailed, ChannelError                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use authenticator_core::CoreError;
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync runtime error.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid sync configuration.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Snapshot Errors
    // =========================================================================
    /// The host could not fetch the remote entries.
    #[error("Remote fetch failed: {0}")]
    RemoteFetchFailed(String),

    /// The host could not read the local ledger.
    #[error("Local read failed: {0}")]
    LocalReadFailed(String),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    /// Error from the core crate.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// A global tracing subscriber is already installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInitFailed(String),

    /// The scheduler task ended abnormally (panicked or was aborted).
    #[error("Channel error: {0}")]
    ChannelError(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

impl From<authenticator_core::ValidationError> for SyncError {
    fn from(err: authenticator_core::ValidationError) -> Self {
        SyncError::Core(CoreError::Validation(err))
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl SyncError {
    /// Returns true if the next tick may succeed without any change on our side.
    ///
    /// ## Retryable Errors
    /// - Remote fetch failures (network, server)
    /// - Local read failures (locked storage)
    ///
    /// ## Non-Retryable Errors
    /// - Configuration errors
    /// - Invalid snapshots (duplicate ids under the strict policy)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::RemoteFetchFailed(_) | SyncError::LocalReadFailed(_)
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}
