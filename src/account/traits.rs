//! Collaborator Trait Abstractions
//!
//! The account core never talks to a key store, a registration backend, a
//! balance source, or a dialog directly; everything external sits behind
//! these traits so the full lifecycle is coverable with the mocks in
//! [`crate::account::mock`].

use crate::account::connectivity::ConnectivityStatus;
use crate::crypto::keyring::{KeyMaterial, KeyringError};
use crate::identity::{Address, IdentityRecord};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Result type for provisioning operations
pub type ProvisionResult<T> = Result<T, ProvisionError>;

/// Provisioning errors surfaced to the caller for user-facing display.
///
/// None of these trigger an automatic retry; every retry is a fresh,
/// user-initiated call.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// A provisioning attempt is already outstanding in this process
    #[error("another account creation attempt is already in progress")]
    AlreadyInProgress,

    /// The backend failed and the connectivity probe reported unreachable
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The backend failed while the network was reachable
    #[error("registration failed: {0}")]
    RegistrationFailed(String),

    /// Key material could not be generated
    #[error("key material unavailable: {0}")]
    KeySource(String),
}

/// Errors reported by the registration backend and status source.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    /// Backend-side timeout. Classified exactly like any other failure.
    #[error("request timed out")]
    Timeout,
}

/// Errors from the destructive half of sign-out.
///
/// A `Blocked` *decision* is not an error (the gate always returns a
/// decision value); this error only occurs when a caller asks for
/// destruction in a state where it is refused.
#[derive(Debug, thiserror::Error)]
pub enum SignOutError {
    #[error("no identity is currently installed")]
    NotSignedIn,

    #[error("sign-out refused: {0}")]
    Blocked(String),

    #[error("an account creation attempt is in progress")]
    ProvisioningInFlight,
}

/// Errors from refreshing the current identity's balance/verification.
#[derive(Debug, thiserror::Error)]
pub enum StatusRefreshError {
    #[error("no identity is currently installed")]
    NotSignedIn,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Balance and verification state for an address, fetched as a unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountStatus {
    /// Whether the user completed the backup/security steps
    pub verified: bool,
    /// Wallet balance, non-negative
    pub balance: Decimal,
}

/// Key-management collaborator: produces fresh key material.
///
/// Idempotence per seed is a property of [`KeyMaterial`] itself (the same
/// seed always derives the same address); the source only supplies fresh
/// entropy.
#[async_trait]
pub trait KeySource {
    async fn generate_key_material(&self) -> Result<KeyMaterial, KeyringError>;
}

/// Registration backend collaborator: registers a derived address and
/// returns the resulting account record.
#[async_trait]
pub trait RegistrationBackend {
    async fn register(&self, address: &Address) -> Result<IdentityRecord, BackendError>;
}

/// Balance/verification source for the current identity.
///
/// The sign-out gate never fetches; it only reads values already on the
/// identity. This source feeds the explicit status-refresh step.
#[async_trait]
pub trait StatusSource {
    async fn fetch_status(&self, address: &Address) -> Result<AccountStatus, BackendError>;
}

/// Connectivity probe, read only at failure-classification time.
pub trait ConnectivityProbe {
    fn current_status(&self) -> ConnectivityStatus;
}

/// What the user picked on the terms dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermsChoice {
    /// Accept the terms; provisioning may proceed
    Agree,
    /// Abandon account creation
    Cancel,
    /// Open the full terms document, then come back to the dialog
    ReadMore,
}

/// The dialog/browser surface owned by the UI layer.
///
/// `present` shows the terms prompt and resolves with the user's choice;
/// `open_reference` displays the full terms document and resolves when the
/// user dismisses it (reading never auto-agrees).
#[async_trait]
pub trait TermsScreen {
    async fn present(&self) -> TermsChoice;
    async fn open_reference(&self, url: &str);
}
