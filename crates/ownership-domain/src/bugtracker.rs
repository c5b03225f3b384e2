use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identifiers::BugTrackerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthenticationPolicy {
    User,
    ApplicationLevel,
}

impl fmt::Display for AuthenticationPolicy {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => formatter.write_str("USER"),
            Self::ApplicationLevel => formatter.write_str("APPLICATION_LEVEL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthenticationProtocol {
    Basic,
    OAuth1a,
    Token,
}

impl fmt::Display for AuthenticationProtocol {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => formatter.write_str("BASIC_AUTH"),
            Self::OAuth1a => formatter.write_str("OAUTH_1A"),
            Self::Token => formatter.write_str("TOKEN_AUTH"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugTracker {
    pub id: BugTrackerId,
    pub name: String,
    /// Connector key, e.g. `bugtracker.jira`.
    pub kind: String,
    pub url: String,
    pub authentication_policy: AuthenticationPolicy,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    Basic { username: String, password: String },
    OAuth1a { token: String, token_secret: String },
    Token { token: String },
}

impl Credentials {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn token(token: impl Into<String>) -> Self {
        Self::Token {
            token: token.into(),
        }
    }

    pub fn protocol(&self) -> AuthenticationProtocol {
        match self {
            Self::Basic { .. } => AuthenticationProtocol::Basic,
            Self::OAuth1a { .. } => AuthenticationProtocol::OAuth1a,
            Self::Token { .. } => AuthenticationProtocol::Token,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { username, .. } => formatter
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::OAuth1a { .. } => formatter
                .debug_struct("OAuth1a")
                .field("token", &"<redacted>")
                .field("token_secret", &"<redacted>")
                .finish(),
            Self::Token { .. } => formatter
                .debug_struct("Token")
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

/// Live view of an issue as the remote tracker currently knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIssue {
    pub id: String,
    pub key: String,
    pub bugtracker_name: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Set when the tracker renamed or merged the issue since it was attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_key: Option<String>,
}

impl RemoteIssue {
    pub fn answers_to(&self, remote_issue_id: &str) -> bool {
        self.id == remote_issue_id || self.key == remote_issue_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIssueDraft {
    pub project: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteProject {
    pub id: String,
    pub name: String,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl fmt::Debug for Attachment {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.content.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BugTrackerStatus {
    Undefined,
    NeedsCredentials,
    Ready,
}

#[cfg(test)]
mod tests {
    use super::{AuthenticationPolicy, AuthenticationProtocol, Credentials, RemoteIssue};

    #[test]
    fn credentials_debug_output_redacts_secrets() {
        let rendered = format!("{:?}", Credentials::basic("alice", "hunter2"));
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));

        let rendered = format!("{:?}", Credentials::token("secret-token"));
        assert!(!rendered.contains("secret-token"));
    }

    #[test]
    fn credentials_report_their_protocol() {
        assert_eq!(
            Credentials::basic("a", "b").protocol(),
            AuthenticationProtocol::Basic
        );
        assert_eq!(
            Credentials::OAuth1a {
                token: "t".to_owned(),
                token_secret: "s".to_owned(),
            }
            .protocol(),
            AuthenticationProtocol::OAuth1a
        );
        assert_eq!(
            Credentials::token("t").protocol(),
            AuthenticationProtocol::Token
        );
    }

    #[test]
    fn authentication_policy_uses_screaming_case_on_the_wire() {
        let encoded =
            serde_json::to_string(&AuthenticationPolicy::ApplicationLevel).expect("serialize");
        assert_eq!(encoded, "\"APPLICATION_LEVEL\"");
    }

    #[test]
    fn remote_issue_answers_to_id_or_key() {
        let issue = RemoteIssue {
            id: "10042".to_owned(),
            key: "BUG-42".to_owned(),
            bugtracker_name: "jira".to_owned(),
            summary: "crash".to_owned(),
            status: None,
            url: None,
            new_key: None,
        };
        assert!(issue.answers_to("10042"));
        assert!(issue.answers_to("BUG-42"));
        assert!(!issue.answers_to("BUG-4"));
    }
}
