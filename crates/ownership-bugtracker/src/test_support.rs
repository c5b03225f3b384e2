//! Scriptable in-process connector used by tests across the workspace.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use ownership_domain::{
    Attachment, AuthenticationPolicy, AuthenticationProtocol, BugTracker, BugTrackerId,
    Credentials, Locale, OwnershipError, RemoteIssue, RemoteIssueDraft, RemoteProject,
};

use crate::connector::{BugTrackerConnector, ConnectorError, ConnectorProvider};

pub const STUB_CONNECTOR_KIND: &str = "bugtracker.stub";

pub fn stub_tracker(id: i64, name: &str, policy: AuthenticationPolicy) -> BugTracker {
    BugTracker {
        id: BugTrackerId::new(id),
        name: name.to_owned(),
        kind: STUB_CONNECTOR_KIND.to_owned(),
        url: format!("https://{name}.example.invalid"),
        authentication_policy: policy,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubCall {
    Authenticate {
        protocol: AuthenticationProtocol,
        locale: Option<String>,
    },
    CheckCredentials,
    FindIssue(String),
    FindIssues(Vec<String>),
    CreateIssue(String),
    ForwardAttachments { key: String, count: usize },
    FindProject(String),
}

#[derive(Debug)]
struct StubRemoteState {
    bugtracker_name: String,
    issues: BTreeMap<String, RemoteIssue>,
    projects: Vec<RemoteProject>,
    accepted_credentials: Option<Credentials>,
    supported_protocols: Vec<AuthenticationProtocol>,
    delay: Option<Duration>,
    transport_failure: Option<String>,
    calls: Vec<StubCall>,
    next_issue_number: u32,
}

/// In-memory stand-in for one remote tracker instance.
#[derive(Debug, Clone)]
pub struct StubRemote {
    state: Arc<Mutex<StubRemoteState>>,
}

impl StubRemote {
    pub fn new(bugtracker_name: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(StubRemoteState {
                bugtracker_name: bugtracker_name.to_owned(),
                issues: BTreeMap::new(),
                projects: Vec::new(),
                accepted_credentials: None,
                supported_protocols: vec![
                    AuthenticationProtocol::Basic,
                    AuthenticationProtocol::Token,
                ],
                delay: None,
                transport_failure: None,
                calls: Vec::new(),
                next_issue_number: 1_000,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, StubRemoteState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_issue(self, key: &str, summary: &str) -> Self {
        {
            let mut state = self.state();
            let issue = RemoteIssue {
                id: key.to_owned(),
                key: key.to_owned(),
                bugtracker_name: state.bugtracker_name.clone(),
                summary: summary.to_owned(),
                status: Some("open".to_owned()),
                url: Some(format!("https://remote.example.invalid/browse/{key}")),
                new_key: None,
            };
            state.issues.insert(key.to_owned(), issue);
        }
        self
    }

    pub fn with_issues(self, keys: &[&str]) -> Self {
        keys.iter()
            .fold(self, |remote, key| remote.with_issue(key, &format!("issue {key}")))
    }

    pub fn with_project(self, id: &str, name: &str) -> Self {
        self.state().projects.push(RemoteProject {
            id: id.to_owned(),
            name: name.to_owned(),
        });
        self
    }

    pub fn renamed(self, key: &str, new_key: &str) -> Self {
        if let Some(issue) = self.state().issues.get_mut(key) {
            issue.new_key = Some(new_key.to_owned());
        }
        self
    }

    pub fn accepting_only(self, credentials: Credentials) -> Self {
        self.state().accepted_credentials = Some(credentials);
        self
    }

    pub fn supporting(self, protocols: &[AuthenticationProtocol]) -> Self {
        self.state().supported_protocols = protocols.to_vec();
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        self.state().delay = Some(delay);
        self
    }

    pub fn failing_with(self, message: &str) -> Self {
        self.state().transport_failure = Some(message.to_owned());
        self
    }

    pub fn calls(&self) -> Vec<StubCall> {
        self.state().calls.clone()
    }

    /// Calls that would have reached the network.
    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    pub fn issue(&self, key: &str) -> Option<RemoteIssue> {
        self.state().issues.get(key).cloned()
    }

    fn record(&self, call: StubCall) {
        self.state().calls.push(call);
    }

    async fn simulate_latency(&self) -> Result<(), ConnectorError> {
        let (delay, failure) = {
            let state = self.state();
            (state.delay, state.transport_failure.clone())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(message) => Err(ConnectorError::Transport(message)),
            None => Ok(()),
        }
    }
}

#[derive(Debug)]
pub struct StubConnector {
    remote: StubRemote,
    locale: Option<Locale>,
    authenticated: bool,
}

impl StubConnector {
    fn ensure_authenticated(&self) -> Result<(), ConnectorError> {
        if self.authenticated {
            Ok(())
        } else {
            Err(ConnectorError::Authentication(
                "connector used before authentication".to_owned(),
            ))
        }
    }

    fn validate_key(key: &str) -> Result<(), ConnectorError> {
        if key.trim().is_empty() || key.chars().any(char::is_whitespace) {
            return Err(ConnectorError::MalformedKey(key.to_owned()));
        }
        Ok(())
    }

    fn credentials_accepted(&self, credentials: &Credentials) -> bool {
        match &self.remote.state().accepted_credentials {
            Some(accepted) => accepted == credentials,
            None => true,
        }
    }
}

#[async_trait]
impl BugTrackerConnector for StubConnector {
    fn supports(&self, protocol: AuthenticationProtocol) -> bool {
        self.remote.state().supported_protocols.contains(&protocol)
    }

    fn set_locale(&mut self, locale: &Locale) {
        self.locale = Some(locale.clone());
    }

    async fn authenticate(&mut self, credentials: &Credentials) -> Result<(), ConnectorError> {
        self.remote.record(StubCall::Authenticate {
            protocol: credentials.protocol(),
            locale: self.locale.as_ref().map(|locale| locale.as_str().to_owned()),
        });
        if !self.credentials_accepted(credentials) {
            return Err(ConnectorError::Authentication(
                "invalid credentials".to_owned(),
            ));
        }
        self.authenticated = true;
        Ok(())
    }

    async fn check_credentials(&self, credentials: &Credentials) -> Result<(), ConnectorError> {
        self.remote.record(StubCall::CheckCredentials);
        self.remote.simulate_latency().await?;
        if self.credentials_accepted(credentials) {
            Ok(())
        } else {
            Err(ConnectorError::Authentication(
                "invalid credentials".to_owned(),
            ))
        }
    }

    async fn find_issue(&self, key: &str) -> Result<RemoteIssue, ConnectorError> {
        self.remote.record(StubCall::FindIssue(key.to_owned()));
        self.ensure_authenticated()?;
        Self::validate_key(key)?;
        self.remote.simulate_latency().await?;
        self.remote
            .issue(key)
            .ok_or_else(|| ConnectorError::NotFound(key.to_owned()))
    }

    async fn find_issues(&self, keys: &[String]) -> Result<Vec<RemoteIssue>, ConnectorError> {
        self.remote.record(StubCall::FindIssues(keys.to_vec()));
        self.ensure_authenticated()?;
        self.remote.simulate_latency().await?;
        Ok(keys.iter().filter_map(|key| self.remote.issue(key)).collect())
    }

    async fn create_issue(&self, draft: RemoteIssueDraft) -> Result<RemoteIssue, ConnectorError> {
        self.remote.record(StubCall::CreateIssue(draft.summary.clone()));
        self.ensure_authenticated()?;
        self.remote.simulate_latency().await?;
        let mut state = self.remote.state();
        state.next_issue_number += 1;
        let key = format!("{}-{}", draft.project, state.next_issue_number);
        let issue = RemoteIssue {
            id: key.clone(),
            key: key.clone(),
            bugtracker_name: state.bugtracker_name.clone(),
            summary: draft.summary,
            status: Some("open".to_owned()),
            url: None,
            new_key: None,
        };
        state.issues.insert(key, issue.clone());
        Ok(issue)
    }

    async fn forward_attachments(
        &self,
        issue_key: &str,
        attachments: Vec<Attachment>,
    ) -> Result<(), ConnectorError> {
        self.remote.record(StubCall::ForwardAttachments {
            key: issue_key.to_owned(),
            count: attachments.len(),
        });
        self.ensure_authenticated()?;
        self.remote.simulate_latency().await?;
        if self.remote.issue(issue_key).is_none() {
            return Err(ConnectorError::NotFound(issue_key.to_owned()));
        }
        Ok(())
    }

    async fn find_project(&self, name_or_id: &str) -> Result<RemoteProject, ConnectorError> {
        self.remote.record(StubCall::FindProject(name_or_id.to_owned()));
        self.ensure_authenticated()?;
        self.remote.simulate_latency().await?;
        let target = name_or_id.trim();
        self.remote
            .state()
            .projects
            .iter()
            .find(|project| project.id == target || project.name.eq_ignore_ascii_case(target))
            .cloned()
            .ok_or_else(|| ConnectorError::NotFound(target.to_owned()))
    }
}

/// Serves one [`StubRemote`] per registered tracker id.
#[derive(Debug, Default, Clone)]
pub struct StubConnectorProvider {
    remotes: HashMap<BugTrackerId, StubRemote>,
}

impl StubConnectorProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_remote(mut self, tracker_id: BugTrackerId, remote: StubRemote) -> Self {
        self.remotes.insert(tracker_id, remote);
        self
    }
}

impl ConnectorProvider for StubConnectorProvider {
    fn kind(&self) -> &str {
        STUB_CONNECTOR_KIND
    }

    fn connect(
        &self,
        tracker: &BugTracker,
    ) -> Result<Box<dyn BugTrackerConnector>, OwnershipError> {
        let remote = self.remotes.get(&tracker.id).cloned().ok_or_else(|| {
            OwnershipError::Configuration(format!(
                "no stub remote registered for bugtracker `{}`",
                tracker.name
            ))
        })?;
        Ok(Box::new(StubConnector {
            remote,
            locale: None,
            authenticated: false,
        }))
    }
}
