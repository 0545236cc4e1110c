//! Public facade over the platform backends.

use log::debug;

use crate::backends::{platform_backend, StatusBackend};
use crate::error::{Error, Result};
use crate::status::ServiceStatus;

/// Answers "does this service exist, and in what state is it?" through
/// whichever backend fits the running platform.
///
/// The backend is selected once at construction. Everything below the
/// facade is call-scoped: no handle, connection or subprocess outlives
/// a single query, so concurrent calls are independent.
pub struct ServiceResolver {
    backend: Box<dyn StatusBackend>,
}

impl ServiceResolver {
    /// Resolver for the running platform.
    pub fn new() -> Self {
        ServiceResolver {
            backend: platform_backend(),
        }
    }

    /// Resolver over a caller-supplied backend.
    pub fn with_backend(backend: Box<dyn StatusBackend>) -> Self {
        ServiceResolver { backend }
    }

    /// Whether a service with this name is registered.
    ///
    /// An absent service is a plain `false`, never an error.
    pub fn exists(&self, name: &str) -> Result<bool> {
        let name = validate_name(name)?;
        debug!("resolving existence of '{}'", name);
        self.backend.exists(name)
    }

    /// Canonical status of the named service.
    ///
    /// Unlike [`exists`](Self::exists), an absent service is
    /// `Error::NotFound` here: status retrieval requires an existing
    /// subject.
    pub fn status(&self, name: &str) -> Result<ServiceStatus> {
        let name = validate_name(name)?;
        debug!("resolving status of '{}'", name);
        self.backend.status(name)
    }
}

impl Default for ServiceResolver {
    fn default() -> Self {
        ServiceResolver::new()
    }
}

/// Reject unusable names before any OS contact.
fn validate_name(name: &str) -> Result<&str> {
    if name.trim().is_empty() {
        return Err(Error::InvalidArgument(
            "service name must be a non-empty string".to_string(),
        ));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{CanonicalState, RawCode};

    /// Backend that panics on contact, proving validation runs first.
    struct UntouchableBackend;

    impl StatusBackend for UntouchableBackend {
        fn exists(&self, _name: &str) -> Result<bool> {
            panic!("backend reached with an invalid name");
        }
        fn status(&self, _name: &str) -> Result<ServiceStatus> {
            panic!("backend reached with an invalid name");
        }
    }

    /// Backend with one fixed answer.
    struct FixedBackend(ServiceStatus);

    impl StatusBackend for FixedBackend {
        fn exists(&self, _name: &str) -> Result<bool> {
            Ok(true)
        }
        fn status(&self, _name: &str) -> Result<ServiceStatus> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_empty_name_rejected_before_backend() {
        let resolver = ServiceResolver::with_backend(Box::new(UntouchableBackend));
        assert!(matches!(
            resolver.exists(""),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            resolver.status("   "),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_valid_name_passes_through() {
        let answer =
            ServiceStatus::new("sshd", CanonicalState::Running, 1234, "active".into());
        let resolver = ServiceResolver::with_backend(Box::new(FixedBackend(answer.clone())));
        assert!(resolver.exists("sshd").unwrap());
        assert_eq!(resolver.status("sshd").unwrap(), answer);
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let answer = ServiceStatus::new(
            "crond",
            CanonicalState::Stopped,
            0,
            RawCode::Text("inactive".into()),
        );
        let resolver = ServiceResolver::with_backend(Box::new(FixedBackend(answer)));
        let first = resolver.status("crond").unwrap();
        let second = resolver.status("crond").unwrap();
        assert_eq!(first, second);
    }
}
