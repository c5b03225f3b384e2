//! Persistence seam. The ownership subsystem only reads holders and issue
//! records through this trait, plus the three issue writes the service
//! performs.

use ownership_domain::{
    BugTracker, BugTrackerId, Campaign, CampaignFolder, CampaignFolderId, CampaignId, Execution,
    ExecutionId, ExecutionStep, ExecutionStepId, HolderRef, Issue, IssueId, IssueListId,
    Iteration, IterationId, OwnershipError, Project, ProjectId, Requirement, RequirementId,
    RequirementVersion, RequirementVersionId, TestCase, TestCaseId, TestSuite, TestSuiteId,
};

/// Selects the executions an aggregating holder exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionScope {
    TestCase(TestCaseId),
    TestCases(Vec<TestCaseId>),
    Iteration(IterationId),
    TestSuite(TestSuiteId),
    Campaigns(Vec<CampaignId>),
}

pub trait IssueRepository: Send + Sync {
    fn find_project(&self, id: ProjectId) -> Result<Option<Project>, OwnershipError>;
    fn find_bugtracker(&self, id: BugTrackerId) -> Result<Option<BugTracker>, OwnershipError>;
    fn find_execution(&self, id: ExecutionId) -> Result<Option<Execution>, OwnershipError>;
    fn find_execution_step(
        &self,
        id: ExecutionStepId,
    ) -> Result<Option<ExecutionStep>, OwnershipError>;
    fn find_test_case(&self, id: TestCaseId) -> Result<Option<TestCase>, OwnershipError>;
    fn find_campaign(&self, id: CampaignId) -> Result<Option<Campaign>, OwnershipError>;
    fn find_campaign_folder(
        &self,
        id: CampaignFolderId,
    ) -> Result<Option<CampaignFolder>, OwnershipError>;
    fn find_iteration(&self, id: IterationId) -> Result<Option<Iteration>, OwnershipError>;
    fn find_test_suite(&self, id: TestSuiteId) -> Result<Option<TestSuite>, OwnershipError>;
    fn find_requirement(&self, id: RequirementId) -> Result<Option<Requirement>, OwnershipError>;
    fn find_requirement_version(
        &self,
        id: RequirementVersionId,
    ) -> Result<Option<RequirementVersion>, OwnershipError>;

    /// Executions in `scope`, ordered by id.
    fn find_executions(&self, scope: &ExecutionScope) -> Result<Vec<Execution>, OwnershipError>;
    /// Steps of one execution, ordered by index.
    fn find_execution_steps(
        &self,
        execution_id: ExecutionId,
    ) -> Result<Vec<ExecutionStep>, OwnershipError>;
    fn find_child_folders(
        &self,
        parent_id: CampaignFolderId,
    ) -> Result<Vec<CampaignFolder>, OwnershipError>;
    fn find_campaigns_in_folders(
        &self,
        folder_ids: &[CampaignFolderId],
    ) -> Result<Vec<Campaign>, OwnershipError>;
    fn find_child_requirements(
        &self,
        parent_id: RequirementId,
    ) -> Result<Vec<Requirement>, OwnershipError>;

    /// Issues recorded on one list, ordered by id.
    fn find_issues(&self, issue_list_id: IssueListId) -> Result<Vec<Issue>, OwnershipError>;
    fn find_issue(&self, id: IssueId) -> Result<Option<Issue>, OwnershipError>;
    /// The execution or step owning `issue_list_id`.
    fn find_issue_list_owner(
        &self,
        issue_list_id: IssueListId,
    ) -> Result<Option<HolderRef>, OwnershipError>;

    /// Records a new issue. A list never holds the same remote issue of the
    /// same tracker twice: a duplicate fails with
    /// [`OwnershipError::AlreadyBound`] and nothing is written.
    fn insert_issue(
        &self,
        issue_list_id: IssueListId,
        bugtracker_id: BugTrackerId,
        remote_issue_id: &str,
    ) -> Result<Issue, OwnershipError>;
    fn delete_issue(&self, id: IssueId) -> Result<(), OwnershipError>;
    fn update_remote_issue_id(
        &self,
        id: IssueId,
        remote_issue_id: &str,
    ) -> Result<(), OwnershipError>;
}
