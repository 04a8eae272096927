//! # Sync Operation Checker
//!
//! The configured entry point hosts call between fetching the remote
//! snapshot and applying the result.
//!
//! ```text
//! remote + local snapshots
//!        │
//!        ▼
//!  duplicate policy ──(Reject + duplicate id)──► SyncError::Core(Validation)
//!        │
//!        ▼
//!  calculate_operations (authenticator-core)
//!        │
//!        ▼
//!  OperationSummary ──► tracing
//! ```

use authenticator_core::validation::{validate_unique_local, validate_unique_remote};
use authenticator_core::{calculate_operations, EntryOperation, LocalEntry, OperationType, RemoteEntry};
use tracing::{debug, warn};

use crate::config::{DuplicatePolicy, ReconcileSettings};
use crate::error::SyncResult;

/// Operation counts by type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationSummary {
    pub upserts: usize,
    pub pushes: usize,
    pub local_deletes: usize,
    pub remote_deletes: usize,
}

impl OperationSummary {
    pub fn from_ops(ops: &[EntryOperation]) -> Self {
        let mut summary = OperationSummary::default();
        for op in ops {
            match op.operation {
                OperationType::Upsert => summary.upserts += 1,
                OperationType::Push => summary.pushes += 1,
                OperationType::DeleteLocal => summary.local_deletes += 1,
                OperationType::DeleteLocalAndRemote => summary.remote_deletes += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.upserts + self.pushes + self.local_deletes + self.remote_deletes
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Runs the reconciliation engine under the configured duplicate policy.
#[derive(Debug, Clone, Default)]
pub struct SyncOperationChecker {
    settings: ReconcileSettings,
}

impl SyncOperationChecker {
    pub fn new(settings: ReconcileSettings) -> Self {
        SyncOperationChecker { settings }
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.settings.duplicate_policy
    }

    /// Calculates the operations that converge `local` with `remote`.
    ///
    /// Fails only under [`DuplicatePolicy::Reject`] when either snapshot
    /// repeats an entry id.
    pub fn calculate_operations(
        &self,
        remote: Vec<RemoteEntry>,
        local: Vec<LocalEntry>,
    ) -> SyncResult<Vec<EntryOperation>> {
        if self.settings.duplicate_policy == DuplicatePolicy::Reject {
            if let Err(e) = validate_unique_remote(&remote).and_then(|_| validate_unique_local(&local)) {
                warn!(error = %e, "Rejecting snapshot with duplicate entry ids");
                return Err(e.into());
            }
        }

        let remote_count = remote.len();
        let local_count = local.len();
        let ops = calculate_operations(remote, local);

        let summary = OperationSummary::from_ops(&ops);
        debug!(
            remote = remote_count,
            local = local_count,
            upserts = summary.upserts,
            pushes = summary.pushes,
            local_deletes = summary.local_deletes,
            remote_deletes = summary.remote_deletes,
            "Calculated operations"
        );

        Ok(ops)
    }
}
