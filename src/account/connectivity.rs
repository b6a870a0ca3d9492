//! Connectivity classification for provisioning failures
//!
//! A failed registration reads the probe once and maps the backend error
//! to the user-facing category: no connectivity means the user should
//! check their connection; a reachable network means the failure is on
//! the registration side. The classification never alters control flow,
//! only which error the caller displays.

use crate::account::traits::{BackendError, ProvisionError};

/// Coarse network reachability, read at failure-classification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityStatus {
    /// No route to the network. A probe that cannot determine status
    /// should report this, the conservative choice.
    Unreachable,
    /// Reachable over a local network (wifi)
    ReachableLan,
    /// Reachable over a wide-area/cellular network
    ReachableWan,
}

impl ConnectivityStatus {
    pub fn is_reachable(&self) -> bool {
        !matches!(self, ConnectivityStatus::Unreachable)
    }
}

/// Map a backend failure to its user-facing category.
///
/// Unreachable → [`ProvisionError::NetworkUnavailable`]; any reachable
/// status → [`ProvisionError::RegistrationFailed`]. Timeouts classify like
/// every other backend failure.
pub fn classify_registration_failure(
    status: ConnectivityStatus,
    err: BackendError,
) -> ProvisionError {
    match status {
        ConnectivityStatus::Unreachable => ProvisionError::NetworkUnavailable(err.to_string()),
        ConnectivityStatus::ReachableLan | ConnectivityStatus::ReachableWan => {
            ProvisionError::RegistrationFailed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_maps_to_network_unavailable() {
        let err = BackendError::Transport("connection refused".to_string());
        let classified = classify_registration_failure(ConnectivityStatus::Unreachable, err);

        assert!(matches!(classified, ProvisionError::NetworkUnavailable(_)));
    }

    #[test]
    fn test_reachable_maps_to_registration_failed() {
        for status in [
            ConnectivityStatus::ReachableLan,
            ConnectivityStatus::ReachableWan,
        ] {
            let err = BackendError::Rejected("address already registered".to_string());
            let classified = classify_registration_failure(status, err);

            assert!(matches!(classified, ProvisionError::RegistrationFailed(_)));
        }
    }

    #[test]
    fn test_timeout_classifies_like_any_other_failure() {
        let offline =
            classify_registration_failure(ConnectivityStatus::Unreachable, BackendError::Timeout);
        assert!(matches!(offline, ProvisionError::NetworkUnavailable(_)));

        let online =
            classify_registration_failure(ConnectivityStatus::ReachableWan, BackendError::Timeout);
        assert!(matches!(online, ProvisionError::RegistrationFailed(_)));
    }

    #[test]
    fn test_is_reachable() {
        assert!(!ConnectivityStatus::Unreachable.is_reachable());
        assert!(ConnectivityStatus::ReachableLan.is_reachable());
        assert!(ConnectivityStatus::ReachableWan.is_reachable());
    }

    #[test]
    fn test_classification_preserves_backend_detail() {
        let err = BackendError::Rejected("username taken".to_string());
        let classified = classify_registration_failure(ConnectivityStatus::ReachableLan, err);

        assert!(classified.to_string().contains("username taken"));
    }
}
