/// Cryptographic key material handling
///
/// This module implements:
/// - Key material generation and recovery from BIP-39 mnemonics (keyring)
/// - Deterministic account address derivation via HKDF + HMAC
pub mod keyring;

pub use keyring::{KeyMaterial, KeyringError, MnemonicKeySource};
