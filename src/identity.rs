//! Account identity model
//!
//! The [`Identity`] is the authoritative record of the current user: the
//! address derived from their key material, the profile data assigned at
//! registration, and the security state (`verified` + `balance`) that the
//! sign-out gate evaluates. Exactly one identity is current per process;
//! it is created by successful provisioning and destroyed by sign-out.
//!
//! Balance and verification flag travel on the identity itself so callers
//! always read them atomically with the rest of the record, never as a
//! separate, possibly-stale lookup.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A 20-byte public account identifier, displayed as 0x-prefixed hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// Creates an Address from a 20-byte slice
    pub fn from_bytes(bytes: &[u8]) -> Self {
        assert_eq!(bytes.len(), 20, "Address must be 20 bytes");
        let mut arr = [0u8; 20];
        arr.copy_from_slice(bytes);
        Self(arr)
    }

    /// Returns the raw bytes of the address
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Error parsing an address from its hex form.
#[derive(Debug, thiserror::Error)]
#[error("invalid address: {0}")]
pub struct ParseAddressError(String);

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes =
            hex::decode(stripped).map_err(|e| ParseAddressError(format!("{}: {}", s, e)))?;
        if bytes.len() != 20 {
            return Err(ParseAddressError(format!(
                "{}: expected 20 bytes, got {}",
                s,
                bytes.len()
            )));
        }
        Ok(Address::from_bytes(&bytes))
    }
}

// Addresses cross the registration backend's JSON boundary as hex strings.
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Per-star review counts, keyed "1" through "5" on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StarsCount {
    #[serde(rename = "1")]
    pub one: u32,
    #[serde(rename = "2")]
    pub two: u32,
    #[serde(rename = "3")]
    pub three: u32,
    #[serde(rename = "4")]
    pub four: u32,
    #[serde(rename = "5")]
    pub five: u32,
}

/// Reputation display data attached to a registered account.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingScore {
    pub reputation_score: f64,
    pub average_rating: f64,
    pub review_count: u32,
    pub stars: StarsCount,
}

impl RatingScore {
    /// The rating of a freshly registered account.
    pub fn zero() -> Self {
        Self::default()
    }
}

/// The record the registration backend returns for a newly registered
/// address. Mirrors the backend's JSON shape.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityRecord {
    pub address: Address,
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rating: RatingScore,
}

/// The current user's identity.
///
/// `verified` records whether the user completed the backup/security steps
/// for their key material; `balance` is the wallet balance in the account's
/// native unit, never negative. Both default to the unverified/empty state
/// at install time and are updated together by a status refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub address: Address,
    pub username: String,
    pub name: String,
    pub verified: bool,
    pub balance: Decimal,
    pub rating: RatingScore,
}

impl Identity {
    /// Build the identity installed after a successful registration.
    ///
    /// Verification and balance start at their safe defaults; a later
    /// status refresh fills them in. Registration and status refresh are
    /// independent steps, so a failed refresh never affects installation.
    pub fn from_record(record: IdentityRecord) -> Self {
        Self {
            address: record.address,
            username: record.username,
            name: record.name,
            verified: false,
            balance: Decimal::ZERO,
            rating: record.rating,
        }
    }
}
