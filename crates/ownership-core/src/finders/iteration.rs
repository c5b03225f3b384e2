use std::sync::Arc;

use ownership_domain::{
    Campaign, Iteration, IterationId, OwnershipError, ProjectId, TestSuite, TestSuiteId,
};

use super::{HolderPairFinder, TrackerLookup};
use crate::pairs::{self, IssueDetectorPair};
use crate::repository::{ExecutionScope, IssueRepository};

#[derive(Debug, Clone)]
pub struct IterationHolder {
    pub iteration: Iteration,
    pub campaign: Campaign,
}

#[derive(Clone)]
pub struct IterationPairFinder {
    repository: Arc<dyn IssueRepository>,
}

impl IterationPairFinder {
    pub fn new(repository: Arc<dyn IssueRepository>) -> Self {
        Self { repository }
    }
}

fn load_iteration(
    repository: &dyn IssueRepository,
    id: IterationId,
) -> Result<IterationHolder, OwnershipError> {
    let iteration = repository
        .find_iteration(id)?
        .ok_or_else(|| OwnershipError::not_found("iteration", id))?;
    let campaign = repository
        .find_campaign(iteration.campaign_id)?
        .ok_or_else(|| OwnershipError::not_found("campaign", iteration.campaign_id))?;
    Ok(IterationHolder {
        iteration,
        campaign,
    })
}

fn scoped_pairs(
    repository: &dyn IssueRepository,
    scope: ExecutionScope,
) -> Result<Vec<IssueDetectorPair>, OwnershipError> {
    let executions = repository.find_executions(&scope)?;
    let loaded = pairs::execution_pairs(repository, &executions)?;
    pairs::retain_consistent(repository, loaded)
}

impl HolderPairFinder for IterationPairFinder {
    type Id = IterationId;
    type Holder = IterationHolder;

    fn find_holder(&self, id: IterationId) -> Result<IterationHolder, OwnershipError> {
        load_iteration(self.repository.as_ref(), id)
    }

    fn load_pairs(
        &self,
        holder: &IterationHolder,
    ) -> Result<Vec<IssueDetectorPair>, OwnershipError> {
        scoped_pairs(
            self.repository.as_ref(),
            ExecutionScope::Iteration(holder.iteration.id),
        )
    }

    fn find_tracker(&self, holder: &IterationHolder) -> Result<TrackerLookup, OwnershipError> {
        pairs::project_tracker(self.repository.as_ref(), holder.campaign.project_id)
            .map(TrackerLookup::Single)
    }
}

#[derive(Debug, Clone)]
pub struct TestSuiteHolder {
    pub test_suite: TestSuite,
    pub project_id: ProjectId,
}

#[derive(Clone)]
pub struct TestSuitePairFinder {
    repository: Arc<dyn IssueRepository>,
}

impl TestSuitePairFinder {
    pub fn new(repository: Arc<dyn IssueRepository>) -> Self {
        Self { repository }
    }
}

impl HolderPairFinder for TestSuitePairFinder {
    type Id = TestSuiteId;
    type Holder = TestSuiteHolder;

    fn find_holder(&self, id: TestSuiteId) -> Result<TestSuiteHolder, OwnershipError> {
        let test_suite = self
            .repository
            .find_test_suite(id)?
            .ok_or_else(|| OwnershipError::not_found("test suite", id))?;
        let iteration = load_iteration(self.repository.as_ref(), test_suite.iteration_id)?;
        Ok(TestSuiteHolder {
            test_suite,
            project_id: iteration.campaign.project_id,
        })
    }

    fn load_pairs(
        &self,
        holder: &TestSuiteHolder,
    ) -> Result<Vec<IssueDetectorPair>, OwnershipError> {
        scoped_pairs(
            self.repository.as_ref(),
            ExecutionScope::TestSuite(holder.test_suite.id),
        )
    }

    fn find_tracker(&self, holder: &TestSuiteHolder) -> Result<TrackerLookup, OwnershipError> {
        pairs::project_tracker(self.repository.as_ref(), holder.project_id)
            .map(TrackerLookup::Single)
    }
}
