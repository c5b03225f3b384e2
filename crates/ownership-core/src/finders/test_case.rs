use std::sync::Arc;

use ownership_domain::{OwnershipError, TestCase, TestCaseId};

use super::{HolderPairFinder, TrackerLookup};
use crate::pairs::{self, IssueDetectorPair};
use crate::repository::{ExecutionScope, IssueRepository};

/// Issues of every execution of a test case. Executions may belong to other
/// projects than the test case itself, hence per-project tracker lookup.
/// Issues recorded on a tracker their execution's project no longer uses are
/// left out.
#[derive(Clone)]
pub struct TestCasePairFinder {
    repository: Arc<dyn IssueRepository>,
}

impl TestCasePairFinder {
    pub fn new(repository: Arc<dyn IssueRepository>) -> Self {
        Self { repository }
    }
}

impl HolderPairFinder for TestCasePairFinder {
    type Id = TestCaseId;
    type Holder = TestCase;

    fn find_holder(&self, id: TestCaseId) -> Result<TestCase, OwnershipError> {
        self.repository
            .find_test_case(id)?
            .ok_or_else(|| OwnershipError::not_found("test case", id))
    }

    fn load_pairs(&self, holder: &TestCase) -> Result<Vec<IssueDetectorPair>, OwnershipError> {
        let executions = self
            .repository
            .find_executions(&ExecutionScope::TestCase(holder.id))?;
        let loaded = pairs::execution_pairs(self.repository.as_ref(), &executions)?;
        pairs::retain_consistent(self.repository.as_ref(), loaded)
    }

    fn find_tracker(&self, _holder: &TestCase) -> Result<TrackerLookup, OwnershipError> {
        Ok(TrackerLookup::PerProject)
    }
}
