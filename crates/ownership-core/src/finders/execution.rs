use std::sync::Arc;

use ownership_domain::{
    Execution, ExecutionId, ExecutionStep, ExecutionStepId, IssueDetector, OwnershipError,
    PagingAndSorting,
};

use super::{HolderPairFinder, TrackerLookup};
use crate::ordering;
use crate::pairs::{self, IssueDetectorPair};
use crate::repository::IssueRepository;

/// Issues of an execution and of every one of its steps.
#[derive(Clone)]
pub struct ExecutionPairFinder {
    repository: Arc<dyn IssueRepository>,
}

impl ExecutionPairFinder {
    pub fn new(repository: Arc<dyn IssueRepository>) -> Self {
        Self { repository }
    }
}

impl HolderPairFinder for ExecutionPairFinder {
    type Id = ExecutionId;
    type Holder = Execution;

    fn find_holder(&self, id: ExecutionId) -> Result<Execution, OwnershipError> {
        self.repository
            .find_execution(id)?
            .ok_or_else(|| OwnershipError::not_found("execution", id))
    }

    fn load_pairs(&self, holder: &Execution) -> Result<Vec<IssueDetectorPair>, OwnershipError> {
        pairs::execution_pairs(self.repository.as_ref(), std::slice::from_ref(holder))
    }

    /// Execution-level and step-level issues are sorted apart, then merged.
    fn order_pairs(
        &self,
        pairs: Vec<IssueDetectorPair>,
        paging: &PagingAndSorting,
    ) -> Vec<IssueDetectorPair> {
        let (mut own, mut steps): (Vec<_>, Vec<_>) = pairs
            .into_iter()
            .partition(|pair| matches!(pair.detector, IssueDetector::Execution { .. }));
        let compare = ordering::comparator(paging.sort_field, paging.sort_order);
        own.sort_by(compare);
        steps.sort_by(compare);
        ordering::merge_sorted(vec![own, steps], compare)
    }

    fn find_tracker(&self, holder: &Execution) -> Result<TrackerLookup, OwnershipError> {
        pairs::project_tracker(self.repository.as_ref(), holder.project_id)
            .map(TrackerLookup::Single)
    }
}

#[derive(Debug, Clone)]
pub struct StepHolder {
    pub step: ExecutionStep,
    pub execution: Execution,
}

#[derive(Clone)]
pub struct ExecutionStepPairFinder {
    repository: Arc<dyn IssueRepository>,
}

impl ExecutionStepPairFinder {
    pub fn new(repository: Arc<dyn IssueRepository>) -> Self {
        Self { repository }
    }
}

impl HolderPairFinder for ExecutionStepPairFinder {
    type Id = ExecutionStepId;
    type Holder = StepHolder;

    fn find_holder(&self, id: ExecutionStepId) -> Result<StepHolder, OwnershipError> {
        let step = self
            .repository
            .find_execution_step(id)?
            .ok_or_else(|| OwnershipError::not_found("execution step", id))?;
        let execution = self
            .repository
            .find_execution(step.execution_id)?
            .ok_or_else(|| OwnershipError::not_found("execution", step.execution_id))?;
        Ok(StepHolder { step, execution })
    }

    fn load_pairs(&self, holder: &StepHolder) -> Result<Vec<IssueDetectorPair>, OwnershipError> {
        pairs::step_pairs(
            self.repository.as_ref(),
            &holder.step,
            holder.execution.project_id,
        )
    }

    fn find_tracker(&self, holder: &StepHolder) -> Result<TrackerLookup, OwnershipError> {
        pairs::project_tracker(self.repository.as_ref(), holder.execution.project_id)
            .map(TrackerLookup::Single)
    }
}
