//! Identity provisioning
//!
//! [`IdentityProvisioner`] owns the attempt to create (or re-register) a
//! cryptographic identity. The contract that makes retry safe:
//!
//! - Key material is recorded in the shared [`PendingKey`] slot **before**
//!   any network call, so a failed registration can be retried with the
//!   same material and produce the same address instead of a second,
//!   orphaned identity.
//! - The slot is cleared on success and on explicit user cancellation,
//!   never implicitly.
//! - Nothing here retries on its own; a retry is always a fresh call
//!   driven by the user re-entering the terms flow.
//!
//! One attempt may be in flight per process; a second concurrent call
//! fails fast with [`ProvisionError::AlreadyInProgress`].

use crate::account::connectivity::classify_registration_failure;
use crate::account::traits::{
    ConnectivityProbe, KeySource, ProvisionError, ProvisionResult, RegistrationBackend,
};
use crate::crypto::keyring::KeyMaterial;
use crate::identity::{Address, Identity};
use std::sync::{Arc, Mutex};

/// Shared slot for key material generated ahead of backend registration.
///
/// Cloning the handle shares the slot: the provisioner writes it before
/// registering, and the terms gate clears it when the user cancels.
#[derive(Clone, Default)]
pub struct PendingKey {
    slot: Arc<Mutex<Option<KeyMaterial>>>,
}

impl PendingKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record key material for a pending (or retryable) registration.
    pub fn set(&self, key: KeyMaterial) {
        *self.slot.lock().expect("pending key lock poisoned") = Some(key);
    }

    /// Snapshot the pending material, leaving the slot occupied.
    pub fn get(&self) -> Option<KeyMaterial> {
        self.slot.lock().expect("pending key lock poisoned").clone()
    }

    /// Discard any pending material. Returns true if something was held.
    pub fn clear(&self) -> bool {
        self.slot
            .lock()
            .expect("pending key lock poisoned")
            .take()
            .is_some()
    }

    pub fn is_set(&self) -> bool {
        self.slot
            .lock()
            .expect("pending key lock poisoned")
            .is_some()
    }

    /// Address the pending material would register, if any.
    pub fn address(&self) -> Option<Address> {
        self.slot
            .lock()
            .expect("pending key lock poisoned")
            .as_ref()
            .map(KeyMaterial::address)
    }
}

/// Creates or re-registers the account identity against the registration
/// backend, generic over the external collaborators.
pub struct IdentityProvisioner<K, B, P> {
    keys: K,
    backend: B,
    probe: P,
    pending: PendingKey,
    in_flight: tokio::sync::Mutex<()>,
}

impl<K, B, P> IdentityProvisioner<K, B, P>
where
    K: KeySource,
    B: RegistrationBackend,
    P: ConnectivityProbe,
{
    pub fn new(keys: K, backend: B, probe: P, pending: PendingKey) -> Self {
        Self {
            keys,
            backend,
            probe,
            pending,
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// The shared pending-key slot (also held by the terms gate).
    pub fn pending(&self) -> &PendingKey {
        &self.pending
    }

    /// Acquire the in-flight guard without waiting.
    ///
    /// Sign-out holds this while destroying the identity so destruction
    /// never overlaps a provisioning attempt.
    pub(crate) fn try_exclusive(&self) -> Option<tokio::sync::MutexGuard<'_, ()>> {
        self.in_flight.try_lock().ok()
    }

    /// Create (or re-register) an identity.
    ///
    /// Key material resolution order: an explicit `seed` (the sign-in
    /// re-registration path) is recorded as pending and used; otherwise
    /// material already pending from a failed attempt is reused; otherwise
    /// fresh material is requested from the key source and recorded as
    /// pending before the backend is contacted.
    ///
    /// On success the pending slot is cleared and the registered identity
    /// returned. On failure the slot is left intact and the error is
    /// classified by connectivity: unreachable →
    /// [`ProvisionError::NetworkUnavailable`], reachable →
    /// [`ProvisionError::RegistrationFailed`]. Failed calls have no
    /// visible effect beyond the retained pending material.
    pub async fn create_identity(&self, seed: Option<KeyMaterial>) -> ProvisionResult<Identity> {
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| ProvisionError::AlreadyInProgress)?;

        let key = match seed {
            Some(seed) => {
                self.pending.set(seed.clone());
                seed
            }
            None => match self.pending.get() {
                Some(existing) => {
                    tracing::debug!(address = %existing.address(), "reusing pending key material");
                    existing
                }
                None => {
                    let fresh = self
                        .keys
                        .generate_key_material()
                        .await
                        .map_err(|e| ProvisionError::KeySource(e.to_string()))?;
                    // Recorded before the network call so a failed attempt
                    // retries the same address.
                    self.pending.set(fresh.clone());
                    fresh
                }
            },
        };

        let address = key.address();

        match self.backend.register(&address).await {
            Ok(record) => {
                self.pending.clear();
                let identity = Identity::from_record(record);
                tracing::info!(address = %identity.address, username = %identity.username, "identity registered");
                Ok(identity)
            }
            Err(err) => {
                let status = self.probe.current_status();
                let classified = classify_registration_failure(status, err);
                tracing::warn!(%address, ?status, "registration failed: {}", classified);
                Err(classified)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::connectivity::ConnectivityStatus;
    use crate::account::mock::{MockConnectivityProbe, MockKeySource, MockRegistrationBackend};
    use crate::account::traits::BackendError;

    fn provisioner() -> (
        IdentityProvisioner<MockKeySource, MockRegistrationBackend, MockConnectivityProbe>,
        MockKeySource,
        MockRegistrationBackend,
        MockConnectivityProbe,
    ) {
        let keys = MockKeySource::new();
        let backend = MockRegistrationBackend::new();
        let probe = MockConnectivityProbe::new(ConnectivityStatus::ReachableWan);
        let prov = IdentityProvisioner::new(
            keys.clone(),
            backend.clone(),
            probe.clone(),
            PendingKey::new(),
        );
        (prov, keys, backend, probe)
    }

    #[tokio::test]
    async fn test_success_clears_pending() {
        let (prov, _keys, backend, _probe) = provisioner();

        let identity = prov.create_identity(None).await.unwrap();

        assert!(!prov.pending().is_set());
        assert_eq!(backend.registered_addresses(), vec![identity.address]);
    }

    #[tokio::test]
    async fn test_failure_retains_pending() {
        let (prov, _keys, backend, _probe) = provisioner();
        backend.fail_next(BackendError::Rejected("nope".to_string()));

        let result = prov.create_identity(None).await;

        assert!(matches!(result, Err(ProvisionError::RegistrationFailed(_))));
        assert!(prov.pending().is_set());
    }

    #[tokio::test]
    async fn test_retry_reuses_pending_address() {
        let (prov, keys, backend, _probe) = provisioner();
        backend.fail_next(BackendError::Transport("reset".to_string()));

        prov.create_identity(None).await.unwrap_err();
        let retry_address = prov.pending().address().unwrap();

        let identity = prov.create_identity(None).await.unwrap();

        assert_eq!(identity.address, retry_address);
        // Key material was generated exactly once across both attempts
        assert_eq!(keys.generate_count(), 1);
        assert!(!prov.pending().is_set());
    }

    #[tokio::test]
    async fn test_fresh_call_after_clear_generates_new_material() {
        let (prov, keys, backend, _probe) = provisioner();
        backend.fail_next(BackendError::Transport("reset".to_string()));

        prov.create_identity(None).await.unwrap_err();
        let abandoned = prov.pending().address().unwrap();
        prov.pending().clear();

        let identity = prov.create_identity(None).await.unwrap();

        assert_ne!(identity.address, abandoned);
        assert_eq!(keys.generate_count(), 2);
    }

    #[tokio::test]
    async fn test_explicit_seed_is_recorded_and_used() {
        let (prov, keys, backend, _probe) = provisioner();
        let seed = KeyMaterial::from_entropy(&[9u8; 32]).unwrap();
        let expected = seed.address();
        backend.fail_next(BackendError::Timeout);

        prov.create_identity(Some(seed)).await.unwrap_err();

        // The sign-in seed is carried like any other pending material
        assert_eq!(prov.pending().address(), Some(expected));
        assert_eq!(keys.generate_count(), 0);

        let identity = prov.create_identity(None).await.unwrap();
        assert_eq!(identity.address, expected);
    }

    #[tokio::test]
    async fn test_offline_failure_classifies_network_unavailable() {
        let (prov, _keys, backend, probe) = provisioner();
        probe.set_status(ConnectivityStatus::Unreachable);
        backend.fail_next(BackendError::Transport("no route".to_string()));

        let result = prov.create_identity(None).await;

        assert!(matches!(result, Err(ProvisionError::NetworkUnavailable(_))));
    }

    #[tokio::test]
    async fn test_key_source_failure_surfaces_and_leaves_no_pending() {
        let (prov, keys, _backend, _probe) = provisioner();
        keys.fail_next();

        let result = prov.create_identity(None).await;

        assert!(matches!(result, Err(ProvisionError::KeySource(_))));
        assert!(!prov.pending().is_set());
    }

    #[tokio::test]
    async fn test_concurrent_call_fails_fast_without_perturbing_first() {
        let (prov, _keys, backend, _probe) = provisioner();
        let prov = Arc::new(prov);
        backend.hold_next();

        let first = {
            let prov = prov.clone();
            tokio::spawn(async move { prov.create_identity(None).await })
        };

        // Wait until the first attempt is parked inside the backend call
        backend.wait_for_hold().await;

        let second = prov.create_identity(None).await;
        assert!(matches!(second, Err(ProvisionError::AlreadyInProgress)));

        backend.release();
        let first = first.await.unwrap();
        assert!(first.is_ok(), "second call must not alter the first's outcome");
        assert_eq!(backend.registered_addresses().len(), 1);
    }
}
