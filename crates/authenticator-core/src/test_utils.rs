//! Shared fixtures for unit tests.

use crate::entry::{Algorithm, Entry, EntryKind, EntryUpdateContents, TotpParameters};

/// Fixed "current time" so tests never read the clock.
pub const NOW: i64 = 1_700_000_000;

pub fn fixture_entry() -> Entry {
    Entry::new_totp(TotpParameters {
        name: "MYLABEL".to_string(),
        secret: "MYSECRET".to_string(),
        issuer: "MYISSUER".to_string(),
        period: Some(15),
        digits: Some(8),
        algorithm: Some(Algorithm::Sha256),
        note: None,
    })
    .expect("valid fixture")
}

pub fn entry_with_id(id: &str) -> Entry {
    fixture_entry().with_id(id)
}

/// Same id, different payload.
pub fn modify_entry(entry: &Entry) -> Entry {
    let mut modified = entry.clone();
    modified
        .update(EntryUpdateContents {
            kind: EntryKind::Totp,
            name: format!("{}_edited", entry.name),
            secret: entry.secret.clone(),
            issuer: entry.issuer.clone(),
            period: entry.period,
            digits: entry.digits,
            algorithm: entry.algorithm,
            note: Some("edited".to_string()),
        })
        .expect("valid fixture");
    modified
}
