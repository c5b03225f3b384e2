//! Seeding helpers shared by the unit and integration tests.

use std::sync::Arc;
use std::time::Duration;

use ownership_bugtracker::test_support::{stub_tracker, StubConnectorProvider, StubRemote};
use ownership_bugtracker::{
    ConnectorRegistry, CredentialResolver, InMemoryCredentialStore, RemoteTrackerGateway,
};
use ownership_config::RemoteRuntimeConfig;
use ownership_domain::{
    AuthenticationPolicy, BugTracker, BugTrackerBinding, BugTrackerId, Credentials, Execution,
    ExecutionId, ExecutionStep, ExecutionStepId, HolderRef, Issue, IssueId, IssueListId,
    IterationId, OwnershipError, Permission, Project, ProjectId, TestCaseId, TestSuiteId, UserLogin,
};

use crate::memory::InMemoryIssueRepository;
use crate::permissions::PermissionEvaluator;
use crate::service::IssueOwnershipService;

pub const APP_TOKEN: &str = "app-token";

/// Denies the listed (user, permission) combinations on every holder.
#[derive(Debug, Clone, Default)]
pub struct StaticPermissions {
    denied: Vec<(UserLogin, Permission)>,
}

impl StaticPermissions {
    pub fn deny(mut self, user: &str, permission: Permission) -> Self {
        self.denied.push((UserLogin::new(user), permission));
        self
    }
}

impl PermissionEvaluator for StaticPermissions {
    fn has_permission(
        &self,
        user: &UserLogin,
        permission: Permission,
        _target: &HolderRef,
    ) -> bool {
        !self
            .denied
            .iter()
            .any(|(denied_user, denied)| denied_user == user && *denied == permission)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionLinks {
    pub test_case: Option<TestCaseId>,
    pub iteration: Option<IterationId>,
    pub test_suites: Vec<TestSuiteId>,
}

/// Builds a repository, a set of stub trackers and the service over them.
pub struct OwnershipFixture {
    pub repository: Arc<InMemoryIssueRepository>,
    provider: StubConnectorProvider,
    app_level_trackers: Vec<BugTracker>,
    permissions: StaticPermissions,
    fetch_timeout: Duration,
    next_issue_list: i64,
    next_issue: i64,
}

impl Default for OwnershipFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl OwnershipFixture {
    pub fn new() -> Self {
        Self {
            repository: Arc::new(InMemoryIssueRepository::new()),
            provider: StubConnectorProvider::new(),
            app_level_trackers: Vec::new(),
            permissions: StaticPermissions::default(),
            fetch_timeout: Duration::from_secs(15),
            next_issue_list: 100,
            next_issue: 0,
        }
    }

    pub fn with_permissions(mut self, permissions: StaticPermissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Registers an application-level tracker served by `remote`. Its
    /// credentials are stored when the service is built.
    pub fn tracker(&mut self, id: i64, name: &str, remote: StubRemote) -> BugTracker {
        let tracker =
            self.tracker_with_policy(id, name, AuthenticationPolicy::ApplicationLevel, remote);
        self.app_level_trackers.push(tracker.clone());
        tracker
    }

    pub fn tracker_with_policy(
        &mut self,
        id: i64,
        name: &str,
        policy: AuthenticationPolicy,
        remote: StubRemote,
    ) -> BugTracker {
        let tracker = stub_tracker(id, name, policy);
        self.provider = std::mem::take(&mut self.provider).with_remote(tracker.id, remote);
        self.repository.add_bugtracker(tracker.clone());
        tracker
    }

    pub fn project(&mut self, id: i64, tracker: Option<&BugTracker>) -> ProjectId {
        let project_id = ProjectId::new(id);
        self.repository.add_project(Project {
            id: project_id,
            name: format!("project-{id}"),
            bugtracker_binding: tracker.map(|tracker| BugTrackerBinding {
                bugtracker_id: tracker.id,
                remote_project_names: vec![format!("REMOTE{id}")],
            }),
        });
        project_id
    }

    fn issue_list(&mut self) -> IssueListId {
        self.next_issue_list += 1;
        IssueListId::new(self.next_issue_list)
    }

    pub fn execution(
        &mut self,
        id: i64,
        project_id: ProjectId,
        links: ExecutionLinks,
    ) -> Execution {
        let execution = Execution {
            id: ExecutionId::new(id),
            name: format!("execution-{id}"),
            project_id,
            test_case_id: links.test_case,
            iteration_id: links.iteration,
            test_suite_ids: links.test_suites,
            issue_list_id: self.issue_list(),
        };
        self.repository.add_execution(execution.clone());
        execution
    }

    pub fn step(&mut self, id: i64, execution: &Execution, index: u32) -> ExecutionStep {
        let step = ExecutionStep {
            id: ExecutionStepId::new(id),
            execution_id: execution.id,
            index,
            issue_list_id: self.issue_list(),
        };
        self.repository.add_execution_step(step.clone());
        step
    }

    pub fn issue(
        &mut self,
        issue_list_id: IssueListId,
        tracker_id: BugTrackerId,
        remote_id: &str,
    ) -> Issue {
        self.next_issue += 1;
        let issue = Issue {
            id: IssueId::new(self.next_issue),
            issue_list_id,
            bugtracker_id: tracker_id,
            remote_issue_id: remote_id.to_owned(),
        };
        self.repository.add_issue(issue.clone());
        issue
    }

    pub fn gateway(&self) -> Result<RemoteTrackerGateway, OwnershipError> {
        let registry = ConnectorRegistry::new().with_provider(Arc::new(self.provider.clone()));
        let gateway = RemoteTrackerGateway::new(
            Arc::new(registry),
            CredentialResolver::new(Arc::new(InMemoryCredentialStore::new())),
            RemoteRuntimeConfig {
                fetch_timeout: self.fetch_timeout,
            },
        );
        for tracker in &self.app_level_trackers {
            gateway
                .resolver()
                .store_app_level(tracker, Credentials::token(APP_TOKEN))?;
        }
        Ok(gateway)
    }

    pub fn service(&self) -> Result<IssueOwnershipService, OwnershipError> {
        Ok(IssueOwnershipService::new(
            self.repository.clone(),
            self.gateway()?,
            Arc::new(self.permissions.clone()),
        ))
    }
}
