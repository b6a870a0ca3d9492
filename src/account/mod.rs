//! Account Lifecycle Module
//!
//! Implements the identity lifecycle of the wallet-backed messenger:
//! - Terms gate: explicit agree/cancel before anything is registered
//! - Identity provisioner: key material + backend registration, with
//!   pending-key carry-over so user-driven retries are idempotent
//! - Sign-out security gate: pure policy over backup/balance state
//! - Session: single owner of the process-wide current identity
//!
//! External collaborators (key store, backend, connectivity, balance
//! source, dialog surface) are trait seams with mocks in [`mock`].

pub mod connectivity;
pub mod mock;
pub mod provisioner;
pub mod session;
pub mod signout;
pub mod terms;
pub mod traits;

pub use connectivity::{classify_registration_failure, ConnectivityStatus};
pub use provisioner::{IdentityProvisioner, PendingKey};
pub use session::{CreateAccountOutcome, Session, SessionManager};
pub use signout::{evaluate_sign_out, SignOutDecision};
pub use terms::{TermsGate, TermsOutcome, TermsState};
pub use traits::{
    AccountStatus, BackendError, ConnectivityProbe, KeySource, ProvisionError, ProvisionResult,
    RegistrationBackend, SignOutError, StatusRefreshError, StatusSource, TermsChoice, TermsScreen,
};
