//! Terms acceptance gate
//!
//! A small finite-state dialog flow that must reach an explicit agree
//! outcome before provisioning proceeds:
//!
//! ```text
//! Idle → Presented → Agreed                    (control moves to provisioning)
//!                  → Cancelled                 (pending key material discarded)
//!                  → ReadMore → Presented      (terms document opened, never auto-agrees)
//! ```
//!
//! The gate is re-enterable: after a provisioning failure the caller
//! invokes [`TermsGate::present_terms`] again, and key material held in
//! the shared pending slot stays available for reuse unless the user
//! cancelled.

use crate::account::provisioner::PendingKey;
use crate::account::traits::{TermsChoice, TermsScreen};
use std::sync::Mutex;

/// Outcome of one pass through the terms dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermsOutcome {
    Agreed,
    Cancelled,
}

/// Observable gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TermsState {
    #[default]
    Idle,
    Presented,
}

/// Drives the terms dialog through its collaborator screen.
pub struct TermsGate<S> {
    screen: S,
    terms_url: String,
    pending: PendingKey,
    state: Mutex<TermsState>,
}

impl<S: TermsScreen> TermsGate<S> {
    pub fn new(screen: S, terms_url: impl Into<String>, pending: PendingKey) -> Self {
        Self {
            screen,
            terms_url: terms_url.into(),
            pending,
            state: Mutex::new(TermsState::Idle),
        }
    }

    pub fn state(&self) -> TermsState {
        *self.state.lock().expect("terms state lock poisoned")
    }

    fn set_state(&self, state: TermsState) {
        *self.state.lock().expect("terms state lock poisoned") = state;
    }

    /// Present the terms dialog until the user agrees or cancels.
    ///
    /// `ReadMore` opens the configured terms document and returns to the
    /// dialog when the user is done reading. `Cancel` discards any pending
    /// key material, so a later account creation starts from a fresh seed.
    pub async fn present_terms(&self) -> TermsOutcome {
        self.set_state(TermsState::Presented);

        loop {
            match self.screen.present().await {
                TermsChoice::Agree => {
                    self.set_state(TermsState::Idle);
                    return TermsOutcome::Agreed;
                }
                TermsChoice::Cancel => {
                    if self.pending.clear() {
                        tracing::debug!("discarded pending key material on cancel");
                    }
                    self.set_state(TermsState::Idle);
                    return TermsOutcome::Cancelled;
                }
                TermsChoice::ReadMore => {
                    self.screen.open_reference(&self.terms_url).await;
                    // back to the dialog; reading never agrees on the user's behalf
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::mock::MockTermsScreen;
    use crate::crypto::keyring::KeyMaterial;

    const TERMS_URL: &str = "https://tessera.network/terms-of-service/";

    fn gate(choices: &[TermsChoice]) -> (TermsGate<MockTermsScreen>, MockTermsScreen, PendingKey) {
        let screen = MockTermsScreen::scripted(choices.iter().copied());
        let pending = PendingKey::new();
        let gate = TermsGate::new(screen.clone(), TERMS_URL, pending.clone());
        (gate, screen, pending)
    }

    #[tokio::test]
    async fn test_agree_outcome() {
        let (gate, screen, _pending) = gate(&[TermsChoice::Agree]);

        let outcome = gate.present_terms().await;

        assert_eq!(outcome, TermsOutcome::Agreed);
        assert_eq!(gate.state(), TermsState::Idle);
        assert!(screen.opened_references().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_discards_pending_key_material() {
        let (gate, _screen, pending) = gate(&[TermsChoice::Cancel]);
        pending.set(KeyMaterial::from_entropy(&[1u8; 32]).unwrap());

        let outcome = gate.present_terms().await;

        assert_eq!(outcome, TermsOutcome::Cancelled);
        assert!(!pending.is_set());
        assert_eq!(gate.state(), TermsState::Idle);
    }

    #[tokio::test]
    async fn test_read_more_returns_to_dialog() {
        let (gate, screen, _pending) = gate(&[TermsChoice::ReadMore, TermsChoice::Agree]);

        let outcome = gate.present_terms().await;

        assert_eq!(outcome, TermsOutcome::Agreed);
        assert_eq!(screen.opened_references(), vec![TERMS_URL.to_string()]);
    }

    #[tokio::test]
    async fn test_read_more_is_never_terminal() {
        let (gate, screen, _pending) = gate(&[
            TermsChoice::ReadMore,
            TermsChoice::ReadMore,
            TermsChoice::Cancel,
        ]);

        let outcome = gate.present_terms().await;

        assert_eq!(outcome, TermsOutcome::Cancelled);
        assert_eq!(screen.opened_references().len(), 2);
    }

    #[tokio::test]
    async fn test_agree_leaves_pending_key_material_for_provisioning() {
        let (gate, _screen, pending) = gate(&[TermsChoice::Agree]);
        let seed = KeyMaterial::from_entropy(&[2u8; 32]).unwrap();
        let address = seed.address();
        pending.set(seed);

        gate.present_terms().await;

        // Agreement hands the carried seed to the provisioner untouched
        assert_eq!(pending.address(), Some(address));
    }

    #[tokio::test]
    async fn test_gate_is_reenterable() {
        let (gate, _screen, pending) = gate(&[TermsChoice::Agree, TermsChoice::Agree]);
        pending.set(KeyMaterial::from_entropy(&[3u8; 32]).unwrap());

        assert_eq!(gate.present_terms().await, TermsOutcome::Agreed);
        // Simulates the retry loop after a provisioning failure: the
        // pending material survives into the second pass.
        assert!(pending.is_set());
        assert_eq!(gate.present_terms().await, TermsOutcome::Agreed);
    }
}
