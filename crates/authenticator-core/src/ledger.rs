//! # Local State Ledger
//!
//! Per-entry local bookkeeping: sync state, timestamps and the remote
//! revision the record was last synced at.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       LocalEntryState                                   │
//! │                                                                         │
//! │        create / edit                    mark_deleted                    │
//! │   ─────────────────────►  PendingSync  ──────────────►  PendingToDelete │
//! │                             │    ▲                           │          │
//! │              Push applied   │    │ edit                      │ Delete   │
//! │                             ▼    │                           ▼ applied  │
//! │   Upsert applied ────────►  Synced  ─────────────────────►  (removed)   │
//! │                                        DeleteLocal applied              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Entry ids are unique within a ledger
//! - A `Synced` record was written from a remote copy (Upsert) or confirmed
//!   by one (Push)
//! - A `PendingSync` record may have no remote counterpart yet
//!
//! All methods take `now` explicitly so the ledger stays deterministic;
//! hosts pass [`now_seconds`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::entry::Entry;
use crate::error::{CoreError, CoreResult};
use crate::operations::{EntryOperation, OperationType};
use crate::remote::RemoteEntry;
use crate::resolution::{ConflictResolver, Resolution};
use crate::validation::validate_unique_local;

/// Current wall-clock time in seconds since epoch.
pub fn now_seconds() -> i64 {
    chrono::Utc::now().timestamp()
}

// =============================================================================
// Local Entry State
// =============================================================================

/// Sync state of a local record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum LocalEntryState {
    /// Local copy matches the last known remote state.
    Synced,
    /// Created or edited locally, not yet pushed.
    PendingSync,
    /// Deleted locally, remote deletion not yet confirmed.
    PendingToDelete,
}

// =============================================================================
// Local Entry
// =============================================================================

/// One record of the local ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LocalEntry {
    pub entry: Entry,
    pub state: LocalEntryState,

    /// Remote modify time of the last synced version, seconds since epoch.
    pub modify_time: i64,

    /// When the pending local edit happened. `None` for records that were
    /// never edited locally, or created offline by hosts that do not track it.
    #[serde(default)]
    pub local_modify_time: Option<i64>,

    /// Remote revision the record was last synced at.
    #[serde(default)]
    pub revision: Option<u32>,
}

impl LocalEntry {
    /// A record matching the remote state as of `modify_time`.
    pub fn synced(entry: Entry, modify_time: i64) -> Self {
        LocalEntry {
            entry,
            state: LocalEntryState::Synced,
            modify_time,
            local_modify_time: None,
            revision: None,
        }
    }

    /// A record waiting to be pushed, with no recorded edit time.
    pub fn pending(entry: Entry, modify_time: i64) -> Self {
        LocalEntry {
            entry,
            state: LocalEntryState::PendingSync,
            modify_time,
            local_modify_time: None,
            revision: None,
        }
    }

    /// The entry id used as join key.
    #[inline]
    pub fn id(&self) -> &str {
        &self.entry.id
    }
}

// =============================================================================
// Ledger
// =============================================================================

/// Insertion-ordered collection of local records keyed by entry id.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    records: Vec<LocalEntry>,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from a stored snapshot, rejecting duplicate ids.
    pub fn from_snapshot(records: Vec<LocalEntry>) -> CoreResult<Self> {
        validate_unique_local(&records)?;
        Ok(Ledger { records })
    }

    /// Records an entry created on this device.
    pub fn create(&mut self, entry: Entry, now: i64) -> CoreResult<()> {
        if self.position(&entry.id).is_some() {
            return Err(CoreError::DuplicateEntry(entry.id));
        }

        self.records.push(LocalEntry {
            entry,
            state: LocalEntryState::PendingSync,
            modify_time: now,
            local_modify_time: Some(now),
            revision: None,
        });
        Ok(())
    }

    /// Records a local edit. The remote bookkeeping of the record is kept so
    /// the next pass can tell which side moved.
    pub fn edit(&mut self, entry: Entry, now: i64) -> CoreResult<()> {
        let record = self.get_mut(&entry.id)?;
        record.entry = entry;
        record.state = LocalEntryState::PendingSync;
        record.local_modify_time = Some(now);
        Ok(())
    }

    /// Marks an entry as deleted locally.
    ///
    /// The record stays until a delete operation is applied. If the remote
    /// never saw the entry, the next pass yields `DeleteLocal` for it.
    /// A pending delete always wins, so no deletion time is recorded.
    pub fn mark_deleted(&mut self, id: &str) -> CoreResult<()> {
        let record = self.get_mut(id)?;
        record.state = LocalEntryState::PendingToDelete;
        Ok(())
    }

    /// Applies an operation the sync driver has executed.
    ///
    /// ## Effects
    /// - `Upsert`: stores the remote entry as `Synced`
    /// - `Push`: marks the record `Synced`
    /// - `DeleteLocal` / `DeleteLocalAndRemote`: removes the record
    ///
    /// The record may have changed locally after the operation was
    /// calculated. A local change that the next pass would still keep is
    /// left pending:
    /// - `Upsert` over a `PendingToDelete` record, or over a `PendingSync`
    ///   edit that wins against the remote copy
    /// - `Push` whose entry no longer equals the record's
    /// - a delete over a `PendingSync` record
    ///
    /// Applying the same delete twice is a no-op.
    pub fn apply(&mut self, operation: &EntryOperation, now: i64) -> CoreResult<()> {
        match operation.operation {
            OperationType::Upsert => {
                let record = LocalEntry {
                    entry: operation.entry.clone(),
                    state: LocalEntryState::Synced,
                    modify_time: operation.modify_time.unwrap_or(now),
                    local_modify_time: None,
                    revision: operation.revision,
                };
                match self.position(&operation.entry.id) {
                    Some(idx) => {
                        if upsert_overrides(&self.records[idx], operation, now) {
                            self.records[idx] = record;
                        }
                    }
                    None => self.records.push(record),
                }
            }
            OperationType::Push => {
                let record = self.get_mut(&operation.entry.id)?;
                if record.entry == operation.entry {
                    record.state = LocalEntryState::Synced;
                    record.modify_time = now;
                    record.local_modify_time = None;
                    // The server bumps the revision on write; learn it on the next fetch
                    record.revision = None;
                }
            }
            OperationType::DeleteLocal | OperationType::DeleteLocalAndRemote => {
                self.records.retain(|r| {
                    r.entry.id != operation.entry.id || r.state == LocalEntryState::PendingSync
                });
            }
        }
        Ok(())
    }

    /// Returns the record for an entry id.
    pub fn get(&self, id: &str) -> Option<&LocalEntry> {
        self.records.iter().find(|r| r.entry.id == id)
    }

    /// Iterates over records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &LocalEntry> {
        self.records.iter()
    }

    /// Copies the ledger into the shape the engine consumes.
    pub fn snapshot(&self) -> Vec<LocalEntry> {
        self.records.clone()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.entry.id == id)
    }

    fn get_mut(&mut self, id: &str) -> CoreResult<&mut LocalEntry> {
        self.records
            .iter_mut()
            .find(|r| r.entry.id == id)
            .ok_or_else(|| CoreError::EntryNotFound(id.to_string()))
    }
}

/// Whether an applied `Upsert` may replace `record`.
///
/// Re-runs the pending-edit rule against the operation's remote copy, so a
/// record that lost when the operation was calculated is still replaced.
fn upsert_overrides(record: &LocalEntry, operation: &EntryOperation, now: i64) -> bool {
    match record.state {
        LocalEntryState::Synced => true,
        LocalEntryState::PendingToDelete => false,
        LocalEntryState::PendingSync => {
            let remote = RemoteEntry {
                remote_id: operation.remote_id.clone().unwrap_or_default(),
                revision: operation.revision,
                entry: operation.entry.clone(),
                modify_time: operation.modify_time.unwrap_or(now),
            };
            ConflictResolver::resolve_pending(record, &remote) == Resolution::AcceptRemote
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::calculate_operations;
    use crate::test_utils::{modify_entry, fixture_entry, NOW};

    #[test]
    fn test_create_is_pending_with_edit_time() {
        let mut ledger = Ledger::new();
        let entry = fixture_entry();
        ledger.create(entry.clone(), NOW).unwrap();

        let record = ledger.get(&entry.id).unwrap();
        assert_eq!(record.state, LocalEntryState::PendingSync);
        assert_eq!(record.local_modify_time, Some(NOW));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_create_duplicate_rejected() {
        let mut ledger = Ledger::new();
        let entry = fixture_entry();
        ledger.create(entry.clone(), NOW).unwrap();
        assert!(matches!(
            ledger.create(entry, NOW),
            Err(CoreError::DuplicateEntry(_))
        ));
    }

    #[test]
    fn test_from_snapshot_rejects_duplicates() {
        let entry = fixture_entry();
        let result = Ledger::from_snapshot(vec![
            LocalEntry::synced(entry.clone(), NOW),
            LocalEntry::pending(entry, NOW),
        ]);
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_edit_keeps_remote_bookkeeping() {
        let entry = fixture_entry();
        let mut synced = LocalEntry::synced(entry.clone(), NOW);
        synced.revision = Some(4);
        let mut ledger = Ledger::from_snapshot(vec![synced]).unwrap();

        ledger.edit(modify_entry(&entry), NOW + 60).unwrap();

        let record = ledger.get(&entry.id).unwrap();
        assert_eq!(record.state, LocalEntryState::PendingSync);
        assert_eq!(record.modify_time, NOW);
        assert_eq!(record.revision, Some(4));
        assert_eq!(record.local_modify_time, Some(NOW + 60));
    }

    #[test]
    fn test_edit_unknown_entry_fails() {
        let mut ledger = Ledger::new();
        assert!(matches!(
            ledger.edit(fixture_entry(), NOW),
            Err(CoreError::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_apply_upsert_inserts_synced_record() {
        let mut ledger = Ledger::new();
        let remote = RemoteEntry::new("REMOTE_ID", fixture_entry(), NOW).with_revision(3);
        let ops = calculate_operations(vec![remote.clone()], ledger.snapshot());

        ledger.apply(&ops[0], NOW + 5).unwrap();

        let record = ledger.get(remote.id()).unwrap();
        assert_eq!(record.state, LocalEntryState::Synced);
        assert_eq!(record.modify_time, NOW);
        assert_eq!(record.revision, Some(3));

        // Converged: a second pass over the same remote is silent
        assert!(calculate_operations(vec![remote], ledger.snapshot()).is_empty());
    }

    #[test]
    fn test_apply_push_marks_synced() {
        let mut ledger = Ledger::new();
        let entry = fixture_entry();
        ledger.create(entry.clone(), NOW).unwrap();

        let ops = calculate_operations(vec![], ledger.snapshot());
        assert_eq!(ops[0].operation, OperationType::Push);

        ledger.apply(&ops[0], NOW + 1).unwrap();
        let record = ledger.get(&entry.id).unwrap();
        assert_eq!(record.state, LocalEntryState::Synced);
        assert_eq!(record.local_modify_time, None);
    }

    #[test]
    fn test_apply_push_after_newer_edit_stays_pending() {
        let mut ledger = Ledger::new();
        let entry = fixture_entry();
        ledger.create(entry.clone(), NOW).unwrap();
        let ops = calculate_operations(vec![], ledger.snapshot());

        // Edited again while the push was in flight
        ledger.edit(modify_entry(&entry), NOW + 2).unwrap();
        ledger.apply(&ops[0], NOW + 3).unwrap();

        let record = ledger.get(&entry.id).unwrap();
        assert_eq!(record.state, LocalEntryState::PendingSync);
    }

    #[test]
    fn test_mark_deleted_then_apply_delete() {
        let entry = fixture_entry();
        let mut ledger = Ledger::from_snapshot(vec![LocalEntry::synced(entry.clone(), NOW)]).unwrap();
        ledger.mark_deleted(&entry.id).unwrap();
        assert_eq!(
            ledger.get(&entry.id).unwrap().state,
            LocalEntryState::PendingToDelete
        );

        let remote = RemoteEntry::new("REMOTE_ID", entry.clone(), NOW);
        let ops = calculate_operations(vec![remote], ledger.snapshot());
        assert_eq!(ops[0].operation, OperationType::DeleteLocalAndRemote);

        ledger.apply(&ops[0], NOW + 2).unwrap();
        assert!(ledger.is_empty());

        // Idempotent
        ledger.apply(&ops[0], NOW + 3).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_deleting_never_pushed_entry() {
        let mut ledger = Ledger::new();
        let entry = fixture_entry();
        ledger.create(entry.clone(), NOW).unwrap();
        ledger.mark_deleted(&entry.id).unwrap();

        let ops = calculate_operations(vec![], ledger.snapshot());
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].operation, OperationType::DeleteLocal);
        assert_eq!(ops[0].remote_id, None);
    }

    /// A synced record for which the remote has a newer copy.
    fn synced_with_newer_remote() -> (Ledger, Entry, EntryOperation) {
        let entry = fixture_entry();
        let ledger = Ledger::from_snapshot(vec![LocalEntry::synced(entry.clone(), NOW)]).unwrap();
        let theirs = RemoteEntry::new("REMOTE_ID", modify_entry(&entry), NOW + 10);

        let ops = calculate_operations(vec![theirs], ledger.snapshot());
        assert_eq!(ops[0].operation, OperationType::Upsert);
        (ledger, entry, ops[0].clone())
    }

    #[test]
    fn test_apply_upsert_keeps_newer_local_edit() {
        let (mut ledger, entry, upsert) = synced_with_newer_remote();
        let mut mine = entry.clone();
        mine.name = "mine".to_string();

        // Edited while the fetch was in flight
        ledger.edit(mine.clone(), NOW + 20).unwrap();
        ledger.apply(&upsert, NOW + 21).unwrap();

        let record = ledger.get(&entry.id).unwrap();
        assert_eq!(record.state, LocalEntryState::PendingSync);
        assert_eq!(record.entry, mine);

        // The next pass pushes the edit over the remote copy
        let theirs = RemoteEntry::new("REMOTE_ID", upsert.entry.clone(), NOW + 10);
        let ops = calculate_operations(vec![theirs], ledger.snapshot());
        assert_eq!(ops[0].operation, OperationType::Push);
        assert_eq!(ops[0].remote_id.as_deref(), Some("REMOTE_ID"));
    }

    #[test]
    fn test_apply_upsert_keeps_pending_delete() {
        let (mut ledger, entry, upsert) = synced_with_newer_remote();

        ledger.mark_deleted(&entry.id).unwrap();
        ledger.apply(&upsert, NOW + 21).unwrap();

        let record = ledger.get(&entry.id).unwrap();
        assert_eq!(record.state, LocalEntryState::PendingToDelete);
        assert_eq!(record.entry, entry);
    }

    #[test]
    fn test_apply_upsert_replaces_losing_edit() {
        let entry = fixture_entry();
        let mut ledger = Ledger::from_snapshot(vec![LocalEntry::synced(entry.clone(), NOW)]).unwrap();
        ledger.edit(modify_entry(&entry), NOW + 5).unwrap();

        let theirs = RemoteEntry::new("REMOTE_ID", entry.clone(), NOW + 10);
        let ops = calculate_operations(vec![theirs], ledger.snapshot());
        assert_eq!(ops[0].operation, OperationType::Upsert);

        ledger.apply(&ops[0], NOW + 11).unwrap();
        let record = ledger.get(&entry.id).unwrap();
        assert_eq!(record.state, LocalEntryState::Synced);
        assert_eq!(record.entry, entry);
        assert_eq!(record.modify_time, NOW + 10);
    }

    #[test]
    fn test_apply_delete_keeps_newer_local_edit() {
        let entry = fixture_entry();
        let mut ledger = Ledger::from_snapshot(vec![LocalEntry::synced(entry.clone(), NOW)]).unwrap();

        // Deleted on the server
        let ops = calculate_operations(vec![], ledger.snapshot());
        assert_eq!(ops[0].operation, OperationType::DeleteLocal);

        ledger.edit(modify_entry(&entry), NOW + 20).unwrap();
        ledger.apply(&ops[0], NOW + 21).unwrap();

        let record = ledger.get(&entry.id).unwrap();
        assert_eq!(record.state, LocalEntryState::PendingSync);

        let ops = calculate_operations(vec![], ledger.snapshot());
        assert_eq!(ops[0].operation, OperationType::Push);
        assert_eq!(ops[0].remote_id, None);
    }
}
