//! Sign-out security gate
//!
//! Destroying the local identity is gated on whether the user has secured
//! their backup phrase and whether funds are at risk. The policy is a
//! pure, total function over `(verified, balance)`; the UI renders the
//! returned variant and collects confirmation, it never re-derives the
//! policy. Actual destruction happens elsewhere, after confirmation.

use crate::identity::Identity;
use rust_decimal::Decimal;

/// What the sign-out gate decided. First matching rule wins:
///
/// 1. verified → `ConfirmDestructive`
/// 2. unverified, zero balance → `ConfirmDeleteAccount`
/// 3. unverified, funds present → `Blocked`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutDecision {
    /// Backup steps completed; sign-out is safe but destroys the local
    /// session, so it still requires explicit confirmation.
    ConfirmDestructive,
    /// No backup and no funds at risk; the account will be deleted
    /// outright on confirmation.
    ConfirmDeleteAccount,
    /// Funds are at risk and not backed up; sign-out is refused until the
    /// user secures or empties the account.
    Blocked,
}

impl SignOutDecision {
    /// User-facing copy for the confirmation (or refusal) dialog.
    pub fn message(&self) -> &'static str {
        match self {
            SignOutDecision::ConfirmDestructive => {
                "Have you secured your backup phrase? Without it you will not be able to \
                 recover this account or sign back in."
            }
            SignOutDecision::ConfirmDeleteAccount => {
                "You have no funds and did not secure this account, so signing out will \
                 delete it."
            }
            SignOutDecision::Blocked => {
                "Complete at least one security step or empty your balance before signing out."
            }
        }
    }

    /// Whether the caller may proceed to destruction after confirmation.
    pub fn allows_destruction(&self) -> bool {
        !matches!(self, SignOutDecision::Blocked)
    }
}

/// Evaluate whether destroying the given identity is currently safe.
///
/// Total and deterministic: every `(verified, balance)` combination maps
/// to exactly one decision, and the identity is never mutated here.
pub fn evaluate_sign_out(identity: &Identity) -> SignOutDecision {
    if identity.verified {
        SignOutDecision::ConfirmDestructive
    } else if identity.balance == Decimal::ZERO {
        SignOutDecision::ConfirmDeleteAccount
    } else {
        SignOutDecision::Blocked
    }
}
