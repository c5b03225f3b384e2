use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identifiers::{
    BugTrackerId, CampaignFolderId, CampaignId, ExecutionId, ExecutionStepId, IssueId,
    IssueListId, IterationId, ProjectId, RequirementId, RequirementVersionId, TestCaseId,
    TestSuiteId,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugTrackerBinding {
    pub bugtracker_id: BugTrackerId,
    #[serde(default)]
    pub remote_project_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bugtracker_binding: Option<BugTrackerBinding>,
}

impl Project {
    pub fn bugtracker_id(&self) -> Option<BugTrackerId> {
        self.bugtracker_binding
            .as_ref()
            .map(|binding| binding.bugtracker_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    pub id: ExecutionId,
    pub name: String,
    pub project_id: ProjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_case_id: Option<TestCaseId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration_id: Option<IterationId>,
    #[serde(default)]
    pub test_suite_ids: Vec<TestSuiteId>,
    pub issue_list_id: IssueListId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStep {
    pub id: ExecutionStepId,
    pub execution_id: ExecutionId,
    pub index: u32,
    pub issue_list_id: IssueListId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: TestCaseId,
    pub name: String,
    pub project_id: ProjectId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub project_id: ProjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<CampaignFolderId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignFolder {
    pub id: CampaignFolderId,
    pub name: String,
    pub project_id: ProjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CampaignFolderId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Iteration {
    pub id: IterationId,
    pub name: String,
    pub campaign_id: CampaignId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSuite {
    pub id: TestSuiteId,
    pub name: String,
    pub iteration_id: IterationId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: RequirementId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<RequirementId>,
    pub current_version_id: RequirementVersionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementVersion {
    pub id: RequirementVersionId,
    pub requirement_id: RequirementId,
    pub project_id: ProjectId,
    #[serde(default)]
    pub verifying_test_case_ids: Vec<TestCaseId>,
}

/// Local record linking an issue list to one entry of an external tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub issue_list_id: IssueListId,
    pub bugtracker_id: BugTrackerId,
    pub remote_issue_id: String,
}

/// The entity that directly owns an issue list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IssueDetector {
    Execution {
        execution_id: ExecutionId,
        name: String,
    },
    Step {
        step_id: ExecutionStepId,
        execution_id: ExecutionId,
        index: u32,
    },
}

impl IssueDetector {
    pub fn execution_id(&self) -> ExecutionId {
        match self {
            Self::Execution { execution_id, .. } | Self::Step { execution_id, .. } => *execution_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RequirementScope {
    /// Only the issues of this exact requirement version.
    #[default]
    InfoPanel,
    /// The version plus the current versions of every descendant requirement.
    Descendants,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum HolderRef {
    Execution(ExecutionId),
    ExecutionStep(ExecutionStepId),
    TestCase(TestCaseId),
    Campaign(CampaignId),
    CampaignFolder(CampaignFolderId),
    Iteration(IterationId),
    TestSuite(TestSuiteId),
    RequirementVersion(RequirementVersionId, RequirementScope),
}

impl fmt::Display for HolderRef {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Execution(id) => write!(formatter, "execution {id}"),
            Self::ExecutionStep(id) => write!(formatter, "execution step {id}"),
            Self::TestCase(id) => write!(formatter, "test case {id}"),
            Self::Campaign(id) => write!(formatter, "campaign {id}"),
            Self::CampaignFolder(id) => write!(formatter, "campaign folder {id}"),
            Self::Iteration(id) => write!(formatter, "iteration {id}"),
            Self::TestSuite(id) => write!(formatter, "test suite {id}"),
            Self::RequirementVersion(id, _) => write!(formatter, "requirement version {id}"),
        }
    }
}

impl From<&IssueDetector> for HolderRef {
    fn from(detector: &IssueDetector) -> Self {
        match detector {
            IssueDetector::Execution { execution_id, .. } => Self::Execution(*execution_id),
            IssueDetector::Step { step_id, .. } => Self::ExecutionStep(*step_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{HolderRef, IssueDetector, RequirementScope};
    use crate::identifiers::{ExecutionId, ExecutionStepId, RequirementVersionId};

    #[test]
    fn detector_exposes_owning_execution() {
        let step = IssueDetector::Step {
            step_id: ExecutionStepId::new(9),
            execution_id: ExecutionId::new(3),
            index: 0,
        };
        assert_eq!(step.execution_id(), ExecutionId::new(3));
        assert_eq!(
            HolderRef::from(&step),
            HolderRef::ExecutionStep(ExecutionStepId::new(9))
        );
    }

    #[test]
    fn holder_ref_display_names_the_kind() {
        assert_eq!(
            HolderRef::Execution(ExecutionId::new(4)).to_string(),
            "execution 4"
        );
        assert_eq!(
            HolderRef::RequirementVersion(
                RequirementVersionId::new(2),
                RequirementScope::Descendants
            )
            .to_string(),
            "requirement version 2"
        );
    }
}
