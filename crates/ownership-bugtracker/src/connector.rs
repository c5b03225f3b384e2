use async_trait::async_trait;
use ownership_domain::{
    Attachment, AuthenticationProtocol, BugTracker, Credentials, Locale, OwnershipError,
    RemoteIssue, RemoteIssueDraft, RemoteProject,
};
use thiserror::Error;

/// Failures reported by a tracker connector. The gateway maps them onto
/// [`OwnershipError`] at its boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    #[error("authentication rejected: {0}")]
    Authentication(String),
    #[error("remote issue `{0}` does not exist")]
    NotFound(String),
    #[error("malformed issue key `{0}`")]
    MalformedKey(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

impl ConnectorError {
    pub fn into_ownership_error(self, tracker: &BugTracker) -> OwnershipError {
        match self {
            Self::Authentication(message) => OwnershipError::Authentication {
                bugtracker: tracker.name.clone(),
                message,
            },
            Self::NotFound(key) => OwnershipError::not_found("remote issue", key),
            Self::MalformedKey(key) => OwnershipError::MalformedKey(key),
            Self::Transport(message) => {
                OwnershipError::remote(format!("bugtracker `{}`: {message}", tracker.name))
            }
        }
    }
}

/// Wire-level access to one external tracker. A fresh connector is built for
/// every logical call and authenticated before use.
#[async_trait]
pub trait BugTrackerConnector: Send + Sync {
    fn supports(&self, protocol: AuthenticationProtocol) -> bool;

    /// Locale used for remote messages. Connectors that do not localize
    /// anything can ignore it.
    fn set_locale(&mut self, _locale: &Locale) {}

    async fn authenticate(&mut self, credentials: &Credentials) -> Result<(), ConnectorError>;
    async fn check_credentials(&self, credentials: &Credentials) -> Result<(), ConnectorError>;
    async fn find_issue(&self, key: &str) -> Result<RemoteIssue, ConnectorError>;
    async fn find_issues(&self, keys: &[String]) -> Result<Vec<RemoteIssue>, ConnectorError>;
    async fn create_issue(&self, draft: RemoteIssueDraft) -> Result<RemoteIssue, ConnectorError>;
    async fn forward_attachments(
        &self,
        issue_key: &str,
        attachments: Vec<Attachment>,
    ) -> Result<(), ConnectorError>;
    async fn find_project(&self, name_or_id: &str) -> Result<RemoteProject, ConnectorError>;
}

/// Builds connectors for one tracker kind.
pub trait ConnectorProvider: Send + Sync {
    fn kind(&self) -> &str;
    fn connect(&self, tracker: &BugTracker) -> Result<Box<dyn BugTrackerConnector>, OwnershipError>;
}
