//! # Conflict Resolution
//!
//! Last-writer-wins rules for an entry present on both sides.
//!
//! ## Authority Signals
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Which side wins?                                   │
//! │                                                                         │
//! │  1. REVISION (when both sides have one and they differ)                │
//! │     Server-assigned, monotonic, immune to clock skew.                  │
//! │     remote.revision > local.revision  → remote wins                    │
//! │     remote.revision < local.revision  → local wins (stale snapshot)    │
//! │                                                                         │
//! │  2. TIMESTAMP (fallback, seconds since epoch)                          │
//! │     Synced local:   remote wins on any payload change or newer time    │
//! │     PendingSync:    local_modify_time > remote.modify_time → local     │
//! │                     otherwise remote (ties favour remote)              │
//! │                     no local_modify_time → local (fresh offline edit)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The unit of resolution is the whole entry. There is no field-level merge.

use std::cmp::Ordering;

use crate::ledger::LocalEntry;
use crate::remote::RemoteEntry;

/// Conflict resolution outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The remote copy is authoritative.
    AcceptRemote,
    /// The local copy stands.
    KeepLocal,
}

pub struct ConflictResolver;

impl ConflictResolver {
    /// Resolves an entry whose local record is `Synced`.
    ///
    /// `KeepLocal` here means both sides already agree (or the remote
    /// snapshot is older than what we synced), so nothing needs to happen.
    pub fn resolve_synced(local: &LocalEntry, remote: &RemoteEntry) -> Resolution {
        match Self::revision_order(local, remote) {
            Some(Ordering::Greater) => Resolution::AcceptRemote,
            Some(_) => Resolution::KeepLocal,
            None => {
                if local.entry != remote.entry || remote.modify_time > local.modify_time {
                    Resolution::AcceptRemote
                } else {
                    Resolution::KeepLocal
                }
            }
        }
    }

    /// Resolves an entry edited locally while the remote also has a copy.
    pub fn resolve_pending(local: &LocalEntry, remote: &RemoteEntry) -> Resolution {
        match Self::revision_order(local, remote) {
            Some(Ordering::Greater) => Resolution::AcceptRemote,
            Some(_) => Resolution::KeepLocal,
            None => match local.local_modify_time {
                None => Resolution::KeepLocal,
                Some(edited_at) if edited_at > remote.modify_time => Resolution::KeepLocal,
                Some(_) => Resolution::AcceptRemote,
            },
        }
    }

    /// Orders the remote revision against the local one.
    ///
    /// Returns `None` when either side lacks a revision or both are equal,
    /// i.e. when revisions cannot decide and timestamps must.
    fn revision_order(local: &LocalEntry, remote: &RemoteEntry) -> Option<Ordering> {
        match (remote.revision, local.revision) {
            (Some(remote_rev), Some(local_rev)) if remote_rev != local_rev => {
                Some(remote_rev.cmp(&local_rev))
            }
            _ => None,
        }
    }
}
