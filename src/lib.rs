//! Tessera - Account Identity Lifecycle Core
//!
//! The in-process decision and orchestration layer of a wallet-backed
//! messaging client: provisioning a cryptographic identity behind a
//! terms-acceptance gate, and refusing to destroy it on sign-out unless
//! the backup/balance safety invariants hold.
//!
//! Key principles:
//! - One current identity per process, one provisioning attempt in flight
//! - Key material recorded before any network call, so retries are idempotent
//! - Retries are always user-driven, never automatic
//! - Sign-out policy is a pure, total decision function
//!
//! UI rendering, key derivation internals, and transport live behind the
//! collaborator traits in [`account::traits`].

pub mod account;
pub mod config;
pub mod crypto;
pub mod identity;
