//! # Entry Model
//!
//! The value type describing one credential/2FA entry.
//!
//! ## Identity vs Payload
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              Entry                                      │
//! │                                                                         │
//! │  IDENTITY (join key)            PAYLOAD (compared as one unit)          │
//! │  ───────────────────            ──────────────────────────────          │
//! │  id: UUID v4 string             kind, name, issuer, secret,             │
//! │  • assigned at creation         period, digits, algorithm, note         │
//! │  • never changes                                                        │
//! │  • survives serialization       Any field change = "entry differs"      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The reconciliation engine never looks inside the payload except through
//! `PartialEq`. Parsing `otpauth://` URIs and generating codes happen
//! elsewhere; this type only carries the already-parsed values.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::validation::{validate_digits, validate_name, validate_period, validate_secret};

// =============================================================================
// Constants
// =============================================================================

/// Default TOTP period in seconds.
pub const DEFAULT_PERIOD: u16 = 30;

/// Default number of TOTP digits.
pub const DEFAULT_DIGITS: u8 = 6;

/// Issuer shown for every Steam entry.
pub const STEAM_ISSUER: &str = "Steam";

/// Steam Guard codes are always 5 characters.
pub const STEAM_DIGITS: u8 = 5;

/// Steam Guard codes rotate every 30 seconds.
pub const STEAM_PERIOD: u16 = 30;

// =============================================================================
// Entry Kind / Algorithm
// =============================================================================

/// The kind of code an entry produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum EntryKind {
    /// RFC 6238 time-based code.
    Totp,
    /// Steam Guard code (TOTP with a custom alphabet).
    Steam,
}

/// HMAC algorithm used for code generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Algorithm {
    #[default]
    Sha1,
    Sha256,
    Sha512,
}

// =============================================================================
// Creation / Update Parameters
// =============================================================================

/// Parameters for creating a TOTP entry.
#[derive(Debug, Clone)]
pub struct TotpParameters {
    pub name: String,
    pub secret: String,
    pub issuer: String,
    pub period: Option<u16>,
    pub digits: Option<u8>,
    pub algorithm: Option<Algorithm>,
    pub note: Option<String>,
}

/// Parameters for creating a Steam entry.
#[derive(Debug, Clone)]
pub struct SteamParameters {
    pub name: String,
    pub secret: String,
    pub note: Option<String>,
}

/// New contents for an existing entry. The id is kept.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EntryUpdateContents {
    pub kind: EntryKind,
    pub name: String,
    pub secret: String,
    pub issuer: String,
    pub period: u16,
    pub digits: u8,
    pub algorithm: Algorithm,
    pub note: Option<String>,
}

// =============================================================================
// Entry
// =============================================================================

/// One credential/2FA record.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Entry {
    /// Stable identifier (UUID v4). Join key for reconciliation.
    pub id: String,
    pub kind: EntryKind,
    pub name: String,
    pub issuer: String,
    pub secret: String,
    pub period: u16,
    pub digits: u8,
    pub algorithm: Algorithm,
    pub note: Option<String>,
}

impl PartialEq for Entry {
    /// Whole-entry comparison. A missing note and an empty note are equal,
    /// since hosts round-trip `None` through empty text fields.
    fn eq(&self, other: &Self) -> bool {
        if self.id != other.id
            || self.kind != other.kind
            || self.name != other.name
            || self.issuer != other.issuer
            || self.secret != other.secret
            || self.period != other.period
            || self.digits != other.digits
            || self.algorithm != other.algorithm
        {
            return false;
        }

        match (&self.note, &other.note) {
            (None, None) => true,
            (None, Some(other)) => other.is_empty(),
            (Some(this), None) => this.is_empty(),
            (Some(this), Some(other)) => this == other,
        }
    }
}

impl Eq for Entry {}

impl Entry {
    /// Generates a fresh entry id.
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Creates a TOTP entry with a fresh id.
    ///
    /// ## Example
    /// ```rust
    /// use authenticator_core::entry::{Entry, TotpParameters};
    ///
    /// let entry = Entry::new_totp(TotpParameters {
    ///     name: "alice@example.com".to_string(),
    ///     secret: "JBSWY3DPEHPK3PXP".to_string(),
    ///     issuer: "Example".to_string(),
    ///     period: None,
    ///     digits: None,
    ///     algorithm: None,
    ///     note: None,
    /// })
    /// .unwrap();
    ///
    /// assert_eq!(entry.period, 30);
    /// assert_eq!(entry.digits, 6);
    /// ```
    pub fn new_totp(params: TotpParameters) -> CoreResult<Self> {
        Self::from_update(
            Self::generate_id(),
            EntryUpdateContents {
                kind: EntryKind::Totp,
                name: params.name,
                secret: params.secret,
                issuer: params.issuer,
                period: params.period.unwrap_or(DEFAULT_PERIOD),
                digits: params.digits.unwrap_or(DEFAULT_DIGITS),
                algorithm: params.algorithm.unwrap_or_default(),
                note: params.note,
            },
        )
    }

    /// Creates a Steam entry with a fresh id.
    pub fn new_steam(params: SteamParameters) -> CoreResult<Self> {
        Self::from_update(
            Self::generate_id(),
            EntryUpdateContents {
                kind: EntryKind::Steam,
                name: params.name,
                secret: params.secret,
                issuer: STEAM_ISSUER.to_string(),
                period: STEAM_PERIOD,
                digits: STEAM_DIGITS,
                algorithm: Algorithm::Sha1,
                note: params.note,
            },
        )
    }

    /// Returns a copy of this entry carrying a different id.
    ///
    /// Used by hosts that already assigned an id (e.g. re-importing an export).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Replaces the payload, keeping the id.
    pub fn update(&mut self, contents: EntryUpdateContents) -> CoreResult<()> {
        let updated = Self::from_update(self.id.clone(), contents)?;
        *self = updated;
        Ok(())
    }

    /// Serializes the entry. The id is preserved exactly.
    pub fn to_bytes(&self) -> CoreResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserializes an entry produced by [`Entry::to_bytes`].
    pub fn from_bytes(data: &[u8]) -> CoreResult<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    fn from_update(id: String, contents: EntryUpdateContents) -> CoreResult<Self> {
        let name = contents.name.trim().to_string();
        let secret = contents.secret.trim().to_string();
        validate_name(&name)?;
        validate_secret(&secret)?;

        // Steam parameters are fixed by the protocol, whatever the caller sent
        let (issuer, period, digits, algorithm) = match contents.kind {
            EntryKind::Steam => (
                STEAM_ISSUER.to_string(),
                STEAM_PERIOD,
                STEAM_DIGITS,
                Algorithm::Sha1,
            ),
            EntryKind::Totp => {
                validate_period(contents.period)?;
                validate_digits(contents.digits)?;
                (
                    contents.issuer.trim().to_string(),
                    contents.period,
                    contents.digits,
                    contents.algorithm,
                )
            }
        };

        Ok(Entry {
            id,
            kind: contents.kind,
            name,
            issuer,
            secret,
            period,
            digits,
            algorithm,
            note: contents.note,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
