//! Session ownership and account lifecycle orchestration
//!
//! [`Session`] is the single owner of the process-wide current identity:
//! components never mutate a shared global; they go through explicit
//! `install`/`destroy` here, and reads are whole-struct snapshots so
//! balance and verification are never observed out of sync with the rest
//! of the record.
//!
//! [`SessionManager`] wires the terms gate, the provisioner, and the
//! status source into the two user-visible flows: account creation
//! (terms → provision → install) and sign-out (evaluate → confirm →
//! destroy).

use crate::account::provisioner::{IdentityProvisioner, PendingKey};
use crate::account::signout::{evaluate_sign_out, SignOutDecision};
use crate::account::terms::{TermsGate, TermsOutcome};
use crate::account::traits::{
    AccountStatus, ConnectivityProbe, KeySource, ProvisionError, RegistrationBackend,
    SignOutError, StatusRefreshError, StatusSource, TermsScreen,
};
use crate::crypto::keyring::KeyMaterial;
use crate::identity::Identity;
use std::sync::RwLock;

/// Owner of the current identity.
#[derive(Default)]
pub struct Session {
    current: RwLock<Option<Identity>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a newly provisioned identity, replacing any previous one
    /// atomically.
    pub fn install(&self, identity: Identity) {
        tracing::info!(address = %identity.address, "identity installed");
        *self.current.write().expect("session lock poisoned") = Some(identity);
    }

    /// Destroy the current identity. Returns the removed record, if any.
    pub fn destroy(&self) -> Option<Identity> {
        let removed = self
            .current
            .write()
            .expect("session lock poisoned")
            .take();
        if let Some(ref identity) = removed {
            tracing::info!(address = %identity.address, "identity destroyed");
        }
        removed
    }

    /// Snapshot of the current identity, all fields read as a unit.
    pub fn current(&self) -> Option<Identity> {
        self.current.read().expect("session lock poisoned").clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current
            .read()
            .expect("session lock poisoned")
            .is_some()
    }

    /// Update balance and verification together under one write lock.
    ///
    /// Returns the updated snapshot, or None if the identity was destroyed
    /// in the meantime.
    pub fn update_status(&self, status: AccountStatus) -> Option<Identity> {
        let mut guard = self.current.write().expect("session lock poisoned");
        let identity = guard.as_mut()?;
        identity.verified = status.verified;
        identity.balance = status.balance;
        Some(identity.clone())
    }
}

/// Result of one pass through the account-creation flow.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateAccountOutcome {
    /// Terms agreed, registration succeeded, identity installed
    Created(Identity),
    /// The user declined the terms; nothing was registered
    Cancelled,
}

/// Composes the terms gate, provisioner, session, and status source.
pub struct SessionManager<K, B, P, A, S> {
    session: Session,
    provisioner: IdentityProvisioner<K, B, P>,
    terms: TermsGate<S>,
    status: A,
}

impl<K, B, P, A, S> SessionManager<K, B, P, A, S>
where
    K: KeySource,
    B: RegistrationBackend,
    P: ConnectivityProbe,
    A: StatusSource,
    S: TermsScreen,
{
    pub fn new(
        keys: K,
        backend: B,
        probe: P,
        status: A,
        screen: S,
        terms_url: impl Into<String>,
    ) -> Self {
        let pending = PendingKey::new();
        Self {
            session: Session::new(),
            provisioner: IdentityProvisioner::new(keys, backend, probe, pending.clone()),
            terms: TermsGate::new(screen, terms_url, pending),
            status,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Key material carried across a failed attempt, shared with the gate.
    pub fn pending(&self) -> &PendingKey {
        self.provisioner.pending()
    }

    /// Snapshot of the current identity.
    pub fn current_identity(&self) -> Option<Identity> {
        self.session.current()
    }

    /// Run the account-creation flow once: terms gate, then provisioning.
    ///
    /// `seed` is the sign-in re-registration path: key material recovered
    /// from a backup phrase that matches no registered account. It is
    /// recorded as pending before the gate runs, so cancelling the terms
    /// discards it like any other pending material.
    ///
    /// Provisioning errors are returned for display; the caller retries by
    /// calling this again (the terms gate is re-entered, pending material
    /// is reused).
    pub async fn create_account(
        &self,
        seed: Option<KeyMaterial>,
    ) -> Result<CreateAccountOutcome, ProvisionError> {
        if let Some(seed) = seed {
            self.pending().set(seed);
        }

        match self.terms.present_terms().await {
            TermsOutcome::Cancelled => {
                tracing::debug!("account creation cancelled at the terms gate");
                Ok(CreateAccountOutcome::Cancelled)
            }
            TermsOutcome::Agreed => {
                let identity = self.provisioner.create_identity(None).await?;
                self.session.install(identity.clone());
                Ok(CreateAccountOutcome::Created(identity))
            }
        }
    }

    /// Fetch balance and verification for the current identity and apply
    /// them atomically.
    ///
    /// Installation and status refresh are independent: a failure here
    /// surfaces to the caller but never uninstalls the identity.
    pub async fn refresh_status(&self) -> Result<Identity, StatusRefreshError> {
        let current = self
            .session
            .current()
            .ok_or(StatusRefreshError::NotSignedIn)?;

        let status = self.status.fetch_status(&current.address).await?;

        self.session
            .update_status(status)
            .ok_or(StatusRefreshError::NotSignedIn)
    }

    /// Evaluate the sign-out policy over the current identity.
    ///
    /// Always returns a decision for a signed-in session; `Blocked` is a
    /// normal negative decision, not an error.
    pub fn evaluate_sign_out(&self) -> Result<SignOutDecision, SignOutError> {
        let current = self.session.current().ok_or(SignOutError::NotSignedIn)?;
        Ok(evaluate_sign_out(&current))
    }

    /// Destroy the current identity after the caller collected explicit
    /// confirmation for a non-blocked decision.
    ///
    /// The policy is re-checked here so a mishandled decision can never
    /// destroy a blocked identity, and the provisioner's in-flight guard
    /// is held so sign-out never overlaps an account creation attempt.
    pub fn complete_sign_out(&self) -> Result<(), SignOutError> {
        let _exclusive = self
            .provisioner
            .try_exclusive()
            .ok_or(SignOutError::ProvisioningInFlight)?;

        let current = self.session.current().ok_or(SignOutError::NotSignedIn)?;

        let decision = evaluate_sign_out(&current);
        if !decision.allows_destruction() {
            return Err(SignOutError::Blocked(decision.message().to_string()));
        }

        self.session.destroy();
        Ok(())
    }
}
