pub mod bugtracker;
pub mod context;
pub mod entities;
pub mod error;
pub mod identifiers;
pub mod ownership;
pub mod paging;

pub use bugtracker::{
    Attachment, AuthenticationPolicy, AuthenticationProtocol, BugTracker, BugTrackerStatus,
    Credentials, RemoteIssue, RemoteIssueDraft, RemoteProject,
};
pub use context::{Locale, Permission, RequestContext, UserLogin};
pub use entities::{
    BugTrackerBinding, Campaign, CampaignFolder, Execution, ExecutionStep, HolderRef, Issue,
    IssueDetector, Iteration, Project, Requirement, RequirementScope, RequirementVersion,
    TestCase, TestSuite,
};
pub use error::OwnershipError;
pub use identifiers::{
    BugTrackerId, CampaignFolderId, CampaignId, ExecutionId, ExecutionStepId, IssueId,
    IssueListId, IterationId, ProjectId, RequirementId, RequirementVersionId, TestCaseId,
    TestSuiteId,
};
pub use ownership::{IssueOwnership, RemoteIssueDecorator};
pub use paging::{PagedResult, PagingAndSorting, SortField, SortOrder};
