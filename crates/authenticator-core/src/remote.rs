//! # Remote Snapshot
//!
//! The server's view of one entry, as delivered by the remote fetch step.
//! A snapshot is consumed by exactly one reconciliation pass and replaced on
//! the next fetch.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::entry::Entry;

/// One entry as the server reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RemoteEntry {
    /// Server-side identifier. Distinct from `entry.id`.
    pub remote_id: String,

    /// Server-assigned counter, monotonic per `remote_id`.
    /// Older server versions do not send one.
    #[serde(default)]
    pub revision: Option<u32>,

    /// The decrypted entry.
    pub entry: Entry,

    /// Last server-side modification, seconds since epoch.
    pub modify_time: i64,
}

impl RemoteEntry {
    /// Creates a remote entry without revision information.
    pub fn new(remote_id: impl Into<String>, entry: Entry, modify_time: i64) -> Self {
        RemoteEntry {
            remote_id: remote_id.into(),
            revision: None,
            entry,
            modify_time,
        }
    }

    /// Attaches a server revision.
    pub fn with_revision(mut self, revision: u32) -> Self {
        self.revision = Some(revision);
        self
    }

    /// The entry id used as join key.
    #[inline]
    pub fn id(&self) -> &str {
        &self.entry.id
    }
}
