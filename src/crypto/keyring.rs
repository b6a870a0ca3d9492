//! Key material and address derivation from a BIP-39 mnemonic
//!
//! All account key material in tessera is rooted in a BIP-39 mnemonic.
//! The public account address is derived deterministically from the
//! mnemonic's seed via HKDF-SHA256 with domain separation, then an
//! HMAC-SHA256 tag truncated to 20 bytes:
//!
//! ```text
//! BIP-39 Mnemonic (24 words)
//!         │
//!         ▼
//! bip39::Mnemonic::to_seed("")  → [u8; 64]
//!         │
//!         ▼
//! HKDF-SHA256(salt="tessera-address-v1", seed)
//!         │
//!         └─► HKDF expand("account-address") → address key
//!                     │
//!                     ▼
//!             HMAC-SHA256(address key, "tessera-account")[..20] → Address
//! ```
//!
//! Determinism is the load-bearing property: the same mnemonic always
//! yields the same address, which is what makes retrying a failed
//! registration with retained key material safe (no orphaned second
//! identity). Mnemonic and seed are zeroized on drop.

use crate::identity::Address;
use async_trait::async_trait;
use bip39::Mnemonic;
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use ring::hmac;
use sha2::Sha256;
use std::fmt;
use thiserror::Error;
use zeroize::Zeroize;

/// Domain separation salt for address derivation (versioned for rotation)
const ADDRESS_SALT: &[u8] = b"tessera-address-v1";

/// HKDF info strings for purpose-specific key derivation
mod purposes {
    pub const ACCOUNT_ADDRESS: &[u8] = b"account-address";
}

/// HMAC message binding the derived tag to account addressing.
const ADDRESS_CONTEXT: &[u8] = b"tessera-account";

/// Entropy size for fresh key material (256 bits → 24-word mnemonic).
const ENTROPY_BYTES: usize = 32;

/// Errors that can occur during key material handling
#[derive(Debug, Error)]
pub enum KeyringError {
    /// Invalid BIP-39 mnemonic
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Entropy could not be turned into a mnemonic
    #[error("Key generation failed: {0}")]
    GenerationFailed(String),
}

/// Cryptographic key material for one account.
///
/// Holds the BIP-39 mnemonic (the user-facing backup phrase) and the
/// 64-byte seed derived from it. The public [`Address`] is derived on
/// demand and is stable for the lifetime of the material, so the same
/// `KeyMaterial` can be carried across a failed registration attempt and
/// resubmitted without producing a different identity.
///
/// # Security
///
/// - Mnemonic and seed are zeroized on drop
/// - `Debug` prints only the derived address, never the secret
#[derive(Clone)]
pub struct KeyMaterial {
    mnemonic: String,
    seed: [u8; 64],
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.mnemonic.zeroize();
        self.seed.zeroize();
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let address = self.address().to_string();
        f.debug_struct("KeyMaterial")
            .field("address", &address)
            .finish_non_exhaustive()
    }
}

impl KeyMaterial {
    /// Generate fresh key material from the given RNG.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, KeyringError> {
        let mut entropy = [0u8; ENTROPY_BYTES];
        rng.fill_bytes(&mut entropy);
        let material = Self::from_entropy(&entropy);
        entropy.zeroize();
        material
    }

    /// Build key material from raw entropy (256 bits).
    ///
    /// Exposed so tests and deterministic key sources can construct
    /// reproducible material.
    pub fn from_entropy(entropy: &[u8; ENTROPY_BYTES]) -> Result<Self, KeyringError> {
        let mnemonic = Mnemonic::from_entropy(entropy)
            .map_err(|e| KeyringError::GenerationFailed(e.to_string()))?;
        Ok(Self::from_parsed(mnemonic))
    }

    /// Recover key material from an existing mnemonic phrase.
    ///
    /// This is the sign-in path: a user presenting a backup phrase that
    /// matches no registered account is offered registration of exactly
    /// this material, so the resulting address matches their phrase.
    pub fn from_mnemonic(phrase: &str) -> Result<Self, KeyringError> {
        let parsed =
            Mnemonic::parse(phrase).map_err(|e| KeyringError::InvalidMnemonic(e.to_string()))?;
        Ok(Self::from_parsed(parsed))
    }

    fn from_parsed(mnemonic: Mnemonic) -> Self {
        // BIP-39 standard seed derivation; empty passphrase
        let seed = mnemonic.to_seed("");
        Self {
            mnemonic: mnemonic.to_string(),
            seed,
        }
    }

    /// The backup phrase the user must secure before sign-out is safe.
    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    /// Derive the public account address for this key material.
    ///
    /// Deterministic: same seed, same address, always.
    pub fn address(&self) -> Address {
        let hkdf = Hkdf::<Sha256>::new(Some(ADDRESS_SALT), &self.seed);
        let mut key_bytes = [0u8; 32];
        hkdf.expand(purposes::ACCOUNT_ADDRESS, &mut key_bytes)
            .expect("HKDF expand should never fail with valid length");

        let key = hmac::Key::new(hmac::HMAC_SHA256, &key_bytes);
        let tag = hmac::sign(&key, ADDRESS_CONTEXT);
        key_bytes.zeroize();

        Address::from_bytes(&tag.as_ref()[..20])
    }
}

/// Default key-management collaborator: fresh BIP-39 material from the
/// operating system RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct MnemonicKeySource;

#[async_trait]
impl crate::account::traits::KeySource for MnemonicKeySource {
    async fn generate_key_material(&self) -> Result<KeyMaterial, KeyringError> {
        KeyMaterial::generate(&mut OsRng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Standard BIP-39 test mnemonics (DO NOT use in production)
    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon art";
    const OTHER_MNEMONIC: &str = "zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo vote";

    #[test]
    fn test_from_valid_mnemonic() {
        let material = KeyMaterial::from_mnemonic(TEST_MNEMONIC);
        assert!(material.is_ok(), "Should accept a valid mnemonic");
    }

    #[test]
    fn test_from_invalid_mnemonic() {
        let result = KeyMaterial::from_mnemonic("invalid mnemonic words");
        assert!(matches!(result, Err(KeyringError::InvalidMnemonic(_))));
    }

    #[test]
    fn test_address_determinism() {
        // Same mnemonic must always derive the same address
        let first = KeyMaterial::from_mnemonic(TEST_MNEMONIC).unwrap();
        let second = KeyMaterial::from_mnemonic(TEST_MNEMONIC).unwrap();

        assert_eq!(first.address(), second.address());
    }

    #[test]
    fn test_different_mnemonics_produce_different_addresses() {
        let first = KeyMaterial::from_mnemonic(TEST_MNEMONIC).unwrap();
        let second = KeyMaterial::from_mnemonic(OTHER_MNEMONIC).unwrap();

        assert_ne!(first.address(), second.address());
    }

    #[test]
    fn test_clone_preserves_address() {
        let material = KeyMaterial::from_mnemonic(TEST_MNEMONIC).unwrap();
        let cloned = material.clone();

        assert_eq!(material.address(), cloned.address());
    }

    #[test]
    fn test_generate_yields_24_words() {
        let material = KeyMaterial::generate(&mut OsRng).unwrap();
        assert_eq!(material.mnemonic().split_whitespace().count(), 24);
    }

    #[test]
    fn test_generate_yields_distinct_material() {
        let first = KeyMaterial::generate(&mut OsRng).unwrap();
        let second = KeyMaterial::generate(&mut OsRng).unwrap();

        assert_ne!(first.address(), second.address());
    }

    #[test]
    fn test_from_entropy_is_deterministic() {
        let entropy = [7u8; 32];
        let first = KeyMaterial::from_entropy(&entropy).unwrap();
        let second = KeyMaterial::from_entropy(&entropy).unwrap();

        assert_eq!(first.address(), second.address());
        assert_eq!(first.mnemonic(), second.mnemonic());
    }

    #[test]
    fn test_entropy_roundtrips_through_mnemonic() {
        let entropy = [42u8; 32];
        let material = KeyMaterial::from_entropy(&entropy).unwrap();
        let recovered = KeyMaterial::from_mnemonic(material.mnemonic()).unwrap();

        assert_eq!(material.address(), recovered.address());
    }

    #[test]
    fn test_debug_does_not_leak_mnemonic() {
        let material = KeyMaterial::from_mnemonic(TEST_MNEMONIC).unwrap();
        let debugged = format!("{:?}", material);

        assert!(!debugged.contains("abandon"));
        assert!(debugged.contains(&material.address().to_string()));
    }
}
