//! Mock collaborators for testing
//!
//! In-memory implementations of every external contract so the whole
//! account lifecycle is testable without a key store, a backend, or a UI.

use crate::account::connectivity::ConnectivityStatus;
use crate::account::traits::{
    AccountStatus, BackendError, ConnectivityProbe, KeySource, RegistrationBackend, StatusSource,
    TermsChoice, TermsScreen,
};
use crate::crypto::keyring::{KeyMaterial, KeyringError};
use crate::identity::{Address, IdentityRecord, RatingScore};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Deterministic key source: each call yields distinct, reproducible
/// material derived from a counter.
#[derive(Clone, Default)]
pub struct MockKeySource {
    state: Arc<Mutex<KeySourceState>>,
}

#[derive(Default)]
struct KeySourceState {
    generated: u32,
    fail_next: bool,
}

impl MockKeySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times key material was generated.
    pub fn generate_count(&self) -> u32 {
        self.state.lock().unwrap().generated
    }

    /// Script the next generation to fail.
    pub fn fail_next(&self) {
        self.state.lock().unwrap().fail_next = true;
    }
}

#[async_trait]
impl KeySource for MockKeySource {
    async fn generate_key_material(&self) -> Result<KeyMaterial, KeyringError> {
        let counter = {
            let mut state = self.state.lock().unwrap();
            if state.fail_next {
                state.fail_next = false;
                return Err(KeyringError::GenerationFailed(
                    "scripted failure".to_string(),
                ));
            }
            state.generated += 1;
            state.generated
        };

        let mut entropy = [0u8; 32];
        entropy[0] = counter as u8;
        entropy[1] = (counter >> 8) as u8;
        entropy[2] = (counter >> 16) as u8;
        entropy[3] = (counter >> 24) as u8;
        KeyMaterial::from_entropy(&entropy)
    }
}

/// Mock registration backend.
///
/// Records every successful registration and supports two scripts:
/// a one-shot failure, and a hold that parks the next call until
/// [`MockRegistrationBackend::release`] (for exercising the in-flight
/// guard).
#[derive(Clone, Default)]
pub struct MockRegistrationBackend {
    state: Arc<Mutex<BackendState>>,
    hold_entered: Arc<Notify>,
    hold_release: Arc<Notify>,
}

#[derive(Default)]
struct BackendState {
    fail_next: Option<BackendError>,
    hold_next: bool,
    registered: Vec<Address>,
}

impl MockRegistrationBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next register call to fail with the given error.
    pub fn fail_next(&self, err: BackendError) {
        self.state.lock().unwrap().fail_next = Some(err);
    }

    /// Park the next register call until [`release`](Self::release).
    pub fn hold_next(&self) {
        self.state.lock().unwrap().hold_next = true;
    }

    /// Wait until a held register call is parked inside the backend.
    pub async fn wait_for_hold(&self) {
        self.hold_entered.notified().await;
    }

    /// Let a held register call proceed.
    pub fn release(&self) {
        self.hold_release.notify_one();
    }

    /// Addresses registered so far, in order.
    pub fn registered_addresses(&self) -> Vec<Address> {
        self.state.lock().unwrap().registered.clone()
    }
}

#[async_trait]
impl RegistrationBackend for MockRegistrationBackend {
    async fn register(&self, address: &Address) -> Result<IdentityRecord, BackendError> {
        let should_hold = {
            let mut state = self.state.lock().unwrap();
            std::mem::take(&mut state.hold_next)
        };
        if should_hold {
            self.hold_entered.notify_one();
            self.hold_release.notified().await;
        }

        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.fail_next.take() {
            return Err(err);
        }

        state.registered.push(*address);
        Ok(IdentityRecord {
            address: *address,
            username: format!("user{:05}", state.registered.len()),
            name: String::new(),
            rating: RatingScore::zero(),
        })
    }
}

/// Connectivity probe with a settable status.
#[derive(Clone)]
pub struct MockConnectivityProbe {
    status: Arc<Mutex<ConnectivityStatus>>,
}

impl MockConnectivityProbe {
    pub fn new(status: ConnectivityStatus) -> Self {
        Self {
            status: Arc::new(Mutex::new(status)),
        }
    }

    pub fn set_status(&self, status: ConnectivityStatus) {
        *self.status.lock().unwrap() = status;
    }
}

impl ConnectivityProbe for MockConnectivityProbe {
    fn current_status(&self) -> ConnectivityStatus {
        *self.status.lock().unwrap()
    }
}

/// Balance/verification source with settable values.
#[derive(Clone)]
pub struct MockStatusSource {
    state: Arc<Mutex<StatusState>>,
}

struct StatusState {
    status: AccountStatus,
    fail_next: Option<BackendError>,
}

impl Default for MockStatusSource {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(StatusState {
                status: AccountStatus {
                    verified: false,
                    balance: Decimal::ZERO,
                },
                fail_next: None,
            })),
        }
    }
}

impl MockStatusSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&self, verified: bool, balance: Decimal) {
        self.state.lock().unwrap().status = AccountStatus { verified, balance };
    }

    pub fn fail_next(&self, err: BackendError) {
        self.state.lock().unwrap().fail_next = Some(err);
    }
}

#[async_trait]
impl StatusSource for MockStatusSource {
    async fn fetch_status(&self, _address: &Address) -> Result<AccountStatus, BackendError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.fail_next.take() {
            return Err(err);
        }
        Ok(state.status)
    }
}

/// Terms screen driven by a script of choices.
///
/// Each `present` pops the next scripted choice; an exhausted script
/// cancels, so a test that forgets a choice terminates instead of
/// looping. Opened reference URLs are recorded for assertions.
#[derive(Clone, Default)]
pub struct MockTermsScreen {
    choices: Arc<Mutex<VecDeque<TermsChoice>>>,
    opened: Arc<Mutex<Vec<String>>>,
}

impl MockTermsScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(choices: impl IntoIterator<Item = TermsChoice>) -> Self {
        let screen = Self::new();
        screen.choices.lock().unwrap().extend(choices);
        screen
    }

    /// Append a choice to the script (for multi-pass flows).
    pub fn push_choice(&self, choice: TermsChoice) {
        self.choices.lock().unwrap().push_back(choice);
    }

    /// Reference URLs opened via ReadMore, in order.
    pub fn opened_references(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl TermsScreen for MockTermsScreen {
    async fn present(&self) -> TermsChoice {
        self.choices
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(TermsChoice::Cancel)
    }

    async fn open_reference(&self, url: &str) {
        self.opened.lock().unwrap().push(url.to_string());
    }
}
