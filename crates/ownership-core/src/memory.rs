use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ownership_domain::{
    BugTracker, BugTrackerId, Campaign, CampaignFolder, CampaignFolderId, CampaignId, Execution,
    ExecutionId, ExecutionStep, ExecutionStepId, HolderRef, Issue, IssueId, IssueListId,
    Iteration, IterationId, OwnershipError, Project, ProjectId, Requirement, RequirementId,
    RequirementVersion, RequirementVersionId, TestCase, TestCaseId, TestSuite, TestSuiteId,
};

use crate::repository::{ExecutionScope, IssueRepository};

#[derive(Debug, Default)]
struct MemoryState {
    projects: BTreeMap<ProjectId, Project>,
    bugtrackers: BTreeMap<BugTrackerId, BugTracker>,
    executions: BTreeMap<ExecutionId, Execution>,
    steps: BTreeMap<ExecutionStepId, ExecutionStep>,
    test_cases: BTreeMap<TestCaseId, TestCase>,
    campaigns: BTreeMap<CampaignId, Campaign>,
    folders: BTreeMap<CampaignFolderId, CampaignFolder>,
    iterations: BTreeMap<IterationId, Iteration>,
    test_suites: BTreeMap<TestSuiteId, TestSuite>,
    requirements: BTreeMap<RequirementId, Requirement>,
    requirement_versions: BTreeMap<RequirementVersionId, RequirementVersion>,
    issues: BTreeMap<IssueId, Issue>,
    next_issue_id: i64,
}

impl MemoryState {
    fn execution_matches(&self, execution: &Execution, scope: &ExecutionScope) -> bool {
        match scope {
            ExecutionScope::TestCase(id) => execution.test_case_id == Some(*id),
            ExecutionScope::TestCases(ids) => execution
                .test_case_id
                .is_some_and(|test_case_id| ids.contains(&test_case_id)),
            ExecutionScope::Iteration(id) => execution.iteration_id == Some(*id),
            ExecutionScope::TestSuite(id) => execution.test_suite_ids.contains(id),
            ExecutionScope::Campaigns(ids) => execution
                .iteration_id
                .and_then(|iteration_id| self.iterations.get(&iteration_id))
                .is_some_and(|iteration| ids.contains(&iteration.campaign_id)),
        }
    }
}

/// Store backed by ordered maps, for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryIssueRepository {
    state: RwLock<MemoryState>,
}

fn poisoned() -> OwnershipError {
    OwnershipError::Persistence("in-memory issue repository lock poisoned".to_owned())
}

impl InMemoryIssueRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, OwnershipError> {
        self.state.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, OwnershipError> {
        self.state.write().map_err(|_| poisoned())
    }

    fn seed(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_project(&self, project: Project) {
        self.seed().projects.insert(project.id, project);
    }

    pub fn add_bugtracker(&self, tracker: BugTracker) {
        self.seed().bugtrackers.insert(tracker.id, tracker);
    }

    pub fn add_execution(&self, execution: Execution) {
        self.seed().executions.insert(execution.id, execution);
    }

    pub fn add_execution_step(&self, step: ExecutionStep) {
        self.seed().steps.insert(step.id, step);
    }

    pub fn add_test_case(&self, test_case: TestCase) {
        self.seed().test_cases.insert(test_case.id, test_case);
    }

    pub fn add_campaign(&self, campaign: Campaign) {
        self.seed().campaigns.insert(campaign.id, campaign);
    }

    pub fn add_campaign_folder(&self, folder: CampaignFolder) {
        self.seed().folders.insert(folder.id, folder);
    }

    pub fn add_iteration(&self, iteration: Iteration) {
        self.seed().iterations.insert(iteration.id, iteration);
    }

    pub fn add_test_suite(&self, test_suite: TestSuite) {
        self.seed().test_suites.insert(test_suite.id, test_suite);
    }

    pub fn add_requirement(&self, requirement: Requirement) {
        self.seed().requirements.insert(requirement.id, requirement);
    }

    pub fn add_requirement_version(&self, version: RequirementVersion) {
        self.seed().requirement_versions.insert(version.id, version);
    }

    /// Stores a fully-formed issue as is, bypassing the duplicate check.
    pub fn add_issue(&self, issue: Issue) {
        let mut state = self.seed();
        state.next_issue_id = state.next_issue_id.max(issue.id.get());
        state.issues.insert(issue.id, issue);
    }

    pub fn issue_count(&self) -> Result<usize, OwnershipError> {
        Ok(self.read()?.issues.len())
    }
}

impl IssueRepository for InMemoryIssueRepository {
    fn find_project(&self, id: ProjectId) -> Result<Option<Project>, OwnershipError> {
        Ok(self.read()?.projects.get(&id).cloned())
    }

    fn find_bugtracker(&self, id: BugTrackerId) -> Result<Option<BugTracker>, OwnershipError> {
        Ok(self.read()?.bugtrackers.get(&id).cloned())
    }

    fn find_execution(&self, id: ExecutionId) -> Result<Option<Execution>, OwnershipError> {
        Ok(self.read()?.executions.get(&id).cloned())
    }

    fn find_execution_step(
        &self,
        id: ExecutionStepId,
    ) -> Result<Option<ExecutionStep>, OwnershipError> {
        Ok(self.read()?.steps.get(&id).cloned())
    }

    fn find_test_case(&self, id: TestCaseId) -> Result<Option<TestCase>, OwnershipError> {
        Ok(self.read()?.test_cases.get(&id).cloned())
    }

    fn find_campaign(&self, id: CampaignId) -> Result<Option<Campaign>, OwnershipError> {
        Ok(self.read()?.campaigns.get(&id).cloned())
    }

    fn find_campaign_folder(
        &self,
        id: CampaignFolderId,
    ) -> Result<Option<CampaignFolder>, OwnershipError> {
        Ok(self.read()?.folders.get(&id).cloned())
    }

    fn find_iteration(&self, id: IterationId) -> Result<Option<Iteration>, OwnershipError> {
        Ok(self.read()?.iterations.get(&id).cloned())
    }

    fn find_test_suite(&self, id: TestSuiteId) -> Result<Option<TestSuite>, OwnershipError> {
        Ok(self.read()?.test_suites.get(&id).cloned())
    }

    fn find_requirement(&self, id: RequirementId) -> Result<Option<Requirement>, OwnershipError> {
        Ok(self.read()?.requirements.get(&id).cloned())
    }

    fn find_requirement_version(
        &self,
        id: RequirementVersionId,
    ) -> Result<Option<RequirementVersion>, OwnershipError> {
        Ok(self.read()?.requirement_versions.get(&id).cloned())
    }

    fn find_executions(&self, scope: &ExecutionScope) -> Result<Vec<Execution>, OwnershipError> {
        let state = self.read()?;
        Ok(state
            .executions
            .values()
            .filter(|execution| state.execution_matches(execution, scope))
            .cloned()
            .collect())
    }

    fn find_execution_steps(
        &self,
        execution_id: ExecutionId,
    ) -> Result<Vec<ExecutionStep>, OwnershipError> {
        let mut steps: Vec<ExecutionStep> = self
            .read()?
            .steps
            .values()
            .filter(|step| step.execution_id == execution_id)
            .cloned()
            .collect();
        steps.sort_by_key(|step| step.index);
        Ok(steps)
    }

    fn find_child_folders(
        &self,
        parent_id: CampaignFolderId,
    ) -> Result<Vec<CampaignFolder>, OwnershipError> {
        Ok(self
            .read()?
            .folders
            .values()
            .filter(|folder| folder.parent_id == Some(parent_id))
            .cloned()
            .collect())
    }

    fn find_campaigns_in_folders(
        &self,
        folder_ids: &[CampaignFolderId],
    ) -> Result<Vec<Campaign>, OwnershipError> {
        Ok(self
            .read()?
            .campaigns
            .values()
            .filter(|campaign| {
                campaign
                    .folder_id
                    .is_some_and(|folder_id| folder_ids.contains(&folder_id))
            })
            .cloned()
            .collect())
    }

    fn find_child_requirements(
        &self,
        parent_id: RequirementId,
    ) -> Result<Vec<Requirement>, OwnershipError> {
        Ok(self
            .read()?
            .requirements
            .values()
            .filter(|requirement| requirement.parent_id == Some(parent_id))
            .cloned()
            .collect())
    }

    fn find_issues(&self, issue_list_id: IssueListId) -> Result<Vec<Issue>, OwnershipError> {
        Ok(self
            .read()?
            .issues
            .values()
            .filter(|issue| issue.issue_list_id == issue_list_id)
            .cloned()
            .collect())
    }

    fn find_issue(&self, id: IssueId) -> Result<Option<Issue>, OwnershipError> {
        Ok(self.read()?.issues.get(&id).cloned())
    }

    fn find_issue_list_owner(
        &self,
        issue_list_id: IssueListId,
    ) -> Result<Option<HolderRef>, OwnershipError> {
        let state = self.read()?;
        let execution = state
            .executions
            .values()
            .find(|execution| execution.issue_list_id == issue_list_id)
            .map(|execution| HolderRef::Execution(execution.id));
        Ok(execution.or_else(|| {
            state
                .steps
                .values()
                .find(|step| step.issue_list_id == issue_list_id)
                .map(|step| HolderRef::ExecutionStep(step.id))
        }))
    }

    fn insert_issue(
        &self,
        issue_list_id: IssueListId,
        bugtracker_id: BugTrackerId,
        remote_issue_id: &str,
    ) -> Result<Issue, OwnershipError> {
        let mut state = self.write()?;
        let duplicate = state.issues.values().any(|issue| {
            issue.issue_list_id == issue_list_id
                && issue.bugtracker_id == bugtracker_id
                && issue.remote_issue_id == remote_issue_id
        });
        if duplicate {
            return Err(OwnershipError::AlreadyBound {
                remote_issue_id: remote_issue_id.to_owned(),
                bugtracker: bugtracker_id,
            });
        }
        state.next_issue_id += 1;
        let issue = Issue {
            id: IssueId::new(state.next_issue_id),
            issue_list_id,
            bugtracker_id,
            remote_issue_id: remote_issue_id.to_owned(),
        };
        state.issues.insert(issue.id, issue.clone());
        Ok(issue)
    }

    fn delete_issue(&self, id: IssueId) -> Result<(), OwnershipError> {
        self.write()?
            .issues
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| OwnershipError::not_found("issue", id))
    }

    fn update_remote_issue_id(
        &self,
        id: IssueId,
        remote_issue_id: &str,
    ) -> Result<(), OwnershipError> {
        let mut state = self.write()?;
        let issue = state
            .issues
            .get_mut(&id)
            .ok_or_else(|| OwnershipError::not_found("issue", id))?;
        issue.remote_issue_id = remote_issue_id.to_owned();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ownership_domain::{
        BugTrackerId, Execution, ExecutionId, HolderRef, Issue, IssueId, IssueListId,
        OwnershipError, ProjectId,
    };

    use super::InMemoryIssueRepository;
    use crate::repository::IssueRepository;

    fn execution(id: i64, list: i64) -> Execution {
        Execution {
            id: ExecutionId::new(id),
            name: format!("execution {id}"),
            project_id: ProjectId::new(1),
            test_case_id: None,
            iteration_id: None,
            test_suite_ids: Vec::new(),
            issue_list_id: IssueListId::new(list),
        }
    }

    #[test]
    fn insert_rejects_a_second_binding_of_the_same_remote_issue() {
        let repository = InMemoryIssueRepository::new();
        let list = IssueListId::new(1);
        let tracker = BugTrackerId::new(1);
        repository
            .insert_issue(list, tracker, "BUG-99")
            .expect("first insert");

        let error = repository
            .insert_issue(list, tracker, "BUG-99")
            .expect_err("duplicate insert");

        assert_eq!(
            error,
            OwnershipError::AlreadyBound {
                remote_issue_id: "BUG-99".to_owned(),
                bugtracker: tracker,
            }
        );
        assert_eq!(repository.issue_count().expect("count"), 1);
    }

    #[test]
    fn inserted_ids_continue_after_seeded_issues() {
        let repository = InMemoryIssueRepository::new();
        repository.add_issue(Issue {
            id: IssueId::new(40),
            issue_list_id: IssueListId::new(1),
            bugtracker_id: BugTrackerId::new(1),
            remote_issue_id: "BUG-1".to_owned(),
        });

        let inserted = repository
            .insert_issue(IssueListId::new(1), BugTrackerId::new(1), "BUG-2")
            .expect("insert");

        assert_eq!(inserted.id, IssueId::new(41));
    }

    #[test]
    fn issue_list_owner_resolves_the_execution() {
        let repository = InMemoryIssueRepository::new();
        repository.add_execution(execution(5, 50));

        assert_eq!(
            repository
                .find_issue_list_owner(IssueListId::new(50))
                .expect("lookup"),
            Some(HolderRef::Execution(ExecutionId::new(5)))
        );
        assert_eq!(
            repository
                .find_issue_list_owner(IssueListId::new(51))
                .expect("lookup"),
            None
        );
    }

    #[test]
    fn deleting_an_unknown_issue_is_not_found() {
        let repository = InMemoryIssueRepository::new();
        let error = repository
            .delete_issue(IssueId::new(3))
            .expect_err("nothing to delete");
        assert!(matches!(error, OwnershipError::NotFound { .. }));
    }
}
