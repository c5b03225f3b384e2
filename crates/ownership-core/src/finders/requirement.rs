use std::collections::BTreeSet;
use std::sync::Arc;

use ownership_domain::{
    OwnershipError, RequirementScope, RequirementVersion, RequirementVersionId, TestCaseId,
};

use super::{HolderPairFinder, TrackerLookup};
use crate::pairs::{self, IssueDetectorPair};
use crate::repository::{ExecutionScope, IssueRepository};

/// Issues of the executions of the test cases verifying a requirement
/// version. In [`RequirementScope::Descendants`] mode the current versions of
/// all descendant requirements contribute as well.
#[derive(Clone)]
pub struct RequirementVersionPairFinder {
    repository: Arc<dyn IssueRepository>,
    scope: RequirementScope,
}

impl RequirementVersionPairFinder {
    pub fn new(repository: Arc<dyn IssueRepository>, scope: RequirementScope) -> Self {
        Self { repository, scope }
    }

    fn versions(
        &self,
        root: &RequirementVersion,
    ) -> Result<Vec<RequirementVersion>, OwnershipError> {
        let mut versions = vec![root.clone()];
        if self.scope == RequirementScope::InfoPanel {
            return Ok(versions);
        }
        let mut visited = BTreeSet::from([root.requirement_id]);
        let mut pending = vec![root.requirement_id];
        while let Some(requirement_id) = pending.pop() {
            for child in self.repository.find_child_requirements(requirement_id)? {
                if !visited.insert(child.id) {
                    continue;
                }
                pending.push(child.id);
                if let Some(version) = self
                    .repository
                    .find_requirement_version(child.current_version_id)?
                {
                    versions.push(version);
                }
            }
        }
        Ok(versions)
    }
}

impl HolderPairFinder for RequirementVersionPairFinder {
    type Id = RequirementVersionId;
    type Holder = RequirementVersion;

    fn find_holder(&self, id: RequirementVersionId) -> Result<RequirementVersion, OwnershipError> {
        self.repository
            .find_requirement_version(id)?
            .ok_or_else(|| OwnershipError::not_found("requirement version", id))
    }

    fn load_pairs(
        &self,
        holder: &RequirementVersion,
    ) -> Result<Vec<IssueDetectorPair>, OwnershipError> {
        let test_cases: BTreeSet<TestCaseId> = self
            .versions(holder)?
            .into_iter()
            .flat_map(|version| version.verifying_test_case_ids)
            .collect();
        if test_cases.is_empty() {
            return Ok(Vec::new());
        }
        let executions = self
            .repository
            .find_executions(&ExecutionScope::TestCases(test_cases.into_iter().collect()))?;
        let loaded = pairs::execution_pairs(self.repository.as_ref(), &executions)?;
        pairs::retain_consistent(self.repository.as_ref(), loaded)
    }

    fn find_tracker(&self, _holder: &RequirementVersion) -> Result<TrackerLookup, OwnershipError> {
        Ok(TrackerLookup::PerProject)
    }
}
