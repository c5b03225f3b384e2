use std::fmt::Display;

use thiserror::Error;

use crate::bugtracker::{AuthenticationPolicy, AuthenticationProtocol};
use crate::context::Permission;
use crate::identifiers::BugTrackerId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OwnershipError {
    #[error("{entity} {id} was not found")]
    NotFound { entity: &'static str, id: String },
    #[error("no credentials available for bugtracker `{bugtracker}`")]
    NoCredentials { bugtracker: String },
    #[error("bugtracker `{bugtracker}` does not support {protocol} authentication")]
    UnsupportedAuthProtocol {
        bugtracker: String,
        protocol: AuthenticationProtocol,
    },
    #[error(
        "bugtracker `{bugtracker}` uses {expected} authentication, not {attempted}"
    )]
    WrongAuthPolicy {
        bugtracker: String,
        expected: AuthenticationPolicy,
        attempted: AuthenticationPolicy,
    },
    #[error("remote bugtracker call failed: {0}")]
    RemoteTracker(String),
    #[error("authentication against bugtracker `{bugtracker}` failed: {message}")]
    Authentication { bugtracker: String, message: String },
    #[error("malformed issue key `{0}`")]
    MalformedKey(String),
    #[error("remote issue `{remote_issue_id}` is already bound to bugtracker {bugtracker}")]
    AlreadyBound {
        remote_issue_id: String,
        bugtracker: BugTrackerId,
    },
    #[error("access denied: {permission} permission required on {target}")]
    AccessDenied {
        permission: Permission,
        target: String,
    },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl OwnershipError {
    pub fn not_found(entity: &'static str, id: impl Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::RemoteTracker(message.into())
    }

    /// Errors raised before any remote call was attempted.
    pub fn is_fail_fast(&self) -> bool {
        matches!(
            self,
            Self::NoCredentials { .. }
                | Self::UnsupportedAuthProtocol { .. }
                | Self::WrongAuthPolicy { .. }
                | Self::Configuration(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::OwnershipError;
    use crate::bugtracker::AuthenticationProtocol;
    use crate::identifiers::BugTrackerId;

    #[test]
    fn not_found_formats_entity_and_id() {
        let error = OwnershipError::not_found("execution", 12);
        assert_eq!(error.to_string(), "execution 12 was not found");
    }

    #[test]
    fn fail_fast_covers_configuration_and_credential_errors_only() {
        assert!(OwnershipError::NoCredentials {
            bugtracker: "jira".to_owned()
        }
        .is_fail_fast());
        assert!(OwnershipError::UnsupportedAuthProtocol {
            bugtracker: "jira".to_owned(),
            protocol: AuthenticationProtocol::OAuth1a,
        }
        .is_fail_fast());
        assert!(!OwnershipError::remote("timed out").is_fail_fast());
        assert!(!OwnershipError::AlreadyBound {
            remote_issue_id: "BUG-1".to_owned(),
            bugtracker: BugTrackerId::new(1),
        }
        .is_fail_fast());
    }
}
