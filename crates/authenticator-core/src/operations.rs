//! # Reconciliation Engine
//!
//! Compares the local ledger with a remote snapshot and computes the
//! operations that converge them.
//!
//! ## Decision Table
//! ```text
//! ┌──────────────┬─────────────────┬──────────────────────────────────────┐
//! │ Remote       │ Local           │ Operation                            │
//! ├──────────────┼─────────────────┼──────────────────────────────────────┤
//! │ present      │ absent          │ Upsert                               │
//! │ absent       │ PendingSync     │ Push (no remote id)                  │
//! │ absent       │ Synced          │ DeleteLocal (deleted on the server)  │
//! │ absent       │ PendingToDelete │ DeleteLocal (server never had it)    │
//! │ present      │ Synced          │ Upsert or nothing (resolve_synced)   │
//! │ present      │ PendingSync     │ Upsert or Push (resolve_pending)     │
//! │ present      │ PendingToDelete │ DeleteLocalAndRemote                 │
//! └──────────────┴─────────────────┴──────────────────────────────────────┘
//! ```
//!
//! ## Properties
//! - Total: never fails, never panics on any input
//! - Deterministic: no clock, no randomness; same input, same output
//! - At most one operation per entry id
//!
//! If an id appears more than once on one side, the last occurrence is used.
//! Callers that want such input rejected run
//! [`crate::validation::validate_unique_remote`] first.
//!
//! The driver may apply the returned operations in any order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::entry::Entry;
use crate::ledger::{LocalEntry, LocalEntryState};
use crate::remote::RemoteEntry;
use crate::resolution::{ConflictResolver, Resolution};

// =============================================================================
// Operation Types
// =============================================================================

/// What the sync driver has to do for one entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub enum OperationType {
    /// Store the remote copy locally.
    Upsert,
    /// Send the local copy to the server.
    Push,
    /// Remove the local record only.
    DeleteLocal,
    /// Remove the local record and delete the remote copy.
    DeleteLocalAndRemote,
}

impl OperationType {
    pub fn is_delete(&self) -> bool {
        matches!(self, OperationType::DeleteLocal | OperationType::DeleteLocalAndRemote)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Upsert => "upsert",
            OperationType::Push => "push",
            OperationType::DeleteLocal => "delete_local",
            OperationType::DeleteLocalAndRemote => "delete_local_and_remote",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One required action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EntryOperation {
    pub entry: Entry,

    /// Server id of the copy this operation targets. `None` for a first push
    /// and for deletes of entries the server never had.
    pub remote_id: Option<String>,

    /// Remote revision the operation was calculated against.
    pub revision: Option<u32>,

    /// Remote modify time, set on `Upsert`.
    pub modify_time: Option<i64>,

    pub operation: OperationType,
}

impl EntryOperation {
    /// Pull a remote copy down.
    pub fn upsert(remote: RemoteEntry) -> Self {
        EntryOperation {
            entry: remote.entry,
            remote_id: Some(remote.remote_id),
            revision: remote.revision,
            modify_time: Some(remote.modify_time),
            operation: OperationType::Upsert,
        }
    }

    /// Push an entry the server has never seen.
    pub fn push_new(local: LocalEntry) -> Self {
        EntryOperation {
            entry: local.entry,
            remote_id: None,
            revision: None,
            modify_time: None,
            operation: OperationType::Push,
        }
    }

    /// Push a local edit over an existing remote copy.
    pub fn push_over(local: LocalEntry, remote: &RemoteEntry) -> Self {
        EntryOperation {
            entry: local.entry,
            remote_id: Some(remote.remote_id.clone()),
            revision: remote.revision,
            modify_time: None,
            operation: OperationType::Push,
        }
    }

    pub fn delete_local(local: LocalEntry) -> Self {
        EntryOperation {
            entry: local.entry,
            remote_id: None,
            revision: None,
            modify_time: None,
            operation: OperationType::DeleteLocal,
        }
    }

    pub fn delete_local_and_remote(local: LocalEntry, remote: RemoteEntry) -> Self {
        EntryOperation {
            entry: local.entry,
            remote_id: Some(remote.remote_id),
            revision: remote.revision,
            modify_time: None,
            operation: OperationType::DeleteLocalAndRemote,
        }
    }

    /// The entry id this operation is about.
    #[inline]
    pub fn id(&self) -> &str {
        &self.entry.id
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Computes the operations that converge `local` with `remote`.
///
/// Output order: operations driven by remote entries in remote order,
/// then local-only operations in local order.
///
/// ## Example
/// ```rust
/// use authenticator_core::entry::{Entry, SteamParameters};
/// use authenticator_core::operations::{calculate_operations, OperationType};
/// use authenticator_core::remote::RemoteEntry;
///
/// let entry = Entry::new_steam(SteamParameters {
///     name: "gaming".to_string(),
///     secret: "STEAMKEY".to_string(),
///     note: None,
/// })
/// .unwrap();
///
/// let ops = calculate_operations(vec![RemoteEntry::new("REMOTE_ID", entry, 1_700_000_000)], vec![]);
/// assert_eq!(ops.len(), 1);
/// assert_eq!(ops[0].operation, OperationType::Upsert);
/// assert_eq!(ops[0].remote_id.as_deref(), Some("REMOTE_ID"));
/// ```
pub fn calculate_operations(remote: Vec<RemoteEntry>, local: Vec<LocalEntry>) -> Vec<EntryOperation> {
    let remote = keep_last_by_id(remote);
    let local = keep_last_by_id(local);

    let index: HashMap<String, usize> = local
        .iter()
        .enumerate()
        .map(|(slot, record)| (record.id().to_string(), slot))
        .collect();
    let mut slots: Vec<Option<LocalEntry>> = local.into_iter().map(Some).collect();

    let mut operations = Vec::new();

    for remote_entry in remote {
        let matched = index
            .get(remote_entry.id())
            .and_then(|&slot| slots[slot].take());

        let operation = match matched {
            None => Some(EntryOperation::upsert(remote_entry)),
            Some(local_entry) => reconcile_pair(local_entry, remote_entry),
        };
        operations.extend(operation);
    }

    for local_entry in slots.into_iter().flatten() {
        operations.push(reconcile_local_only(local_entry));
    }

    operations
}

/// Entry present on both sides.
fn reconcile_pair(local: LocalEntry, remote: RemoteEntry) -> Option<EntryOperation> {
    match local.state {
        LocalEntryState::Synced => match ConflictResolver::resolve_synced(&local, &remote) {
            Resolution::AcceptRemote => Some(EntryOperation::upsert(remote)),
            Resolution::KeepLocal => None,
        },
        LocalEntryState::PendingSync => match ConflictResolver::resolve_pending(&local, &remote) {
            Resolution::AcceptRemote => Some(EntryOperation::upsert(remote)),
            Resolution::KeepLocal => Some(EntryOperation::push_over(local, &remote)),
        },
        LocalEntryState::PendingToDelete => {
            Some(EntryOperation::delete_local_and_remote(local, remote))
        }
    }
}

/// Entry the remote snapshot does not contain.
fn reconcile_local_only(local: LocalEntry) -> EntryOperation {
    match local.state {
        LocalEntryState::PendingSync => EntryOperation::push_new(local),
        LocalEntryState::Synced | LocalEntryState::PendingToDelete => {
            EntryOperation::delete_local(local)
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for RemoteEntry {
    fn key(&self) -> &str {
        self.id()
    }
}

impl Keyed for LocalEntry {
    fn key(&self) -> &str {
        self.id()
    }
}

/// Drops every occurrence of an id except the last one.
fn keep_last_by_id<T: Keyed>(items: Vec<T>) -> Vec<T> {
    let last: HashMap<String, usize> = items
        .iter()
        .enumerate()
        .map(|(position, item)| (item.key().to_string(), position))
        .collect();

    if last.len() == items.len() {
        return items;
    }

    items
        .into_iter()
        .enumerate()
        .filter(|(position, item)| last.get(item.key()) == Some(position))
        .map(|(_, item)| item)
        .collect()
}

/// Order-insensitive comparison of two operation lists.
///
/// Relies on at most one operation per entry id, which
/// [`calculate_operations`] guarantees.
pub fn same_operation_set(a: &[EntryOperation], b: &[EntryOperation]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut a: Vec<&EntryOperation> = a.iter().collect();
    let mut b: Vec<&EntryOperation> = b.iter().collect();
    a.sort_by(|x, y| x.id().cmp(y.id()).then(x.operation.cmp(&y.operation)));
    b.sort_by(|x, y| x.id().cmp(y.id()).then(x.operation.cmp(&y.operation)));
    a == b
}

// =============================================================================
// Unit Tests
// =============================================================================
