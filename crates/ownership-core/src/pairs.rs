use std::collections::HashMap;

use ownership_domain::{
    BugTracker, BugTrackerId, Execution, ExecutionStep, Issue, IssueDetector, OwnershipError,
    ProjectId,
};
use tracing::debug;

use crate::repository::IssueRepository;

/// A local issue together with the execution or step that detected it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDetectorPair {
    pub detector: IssueDetector,
    pub issue: Issue,
    /// Project of the detector's execution.
    pub project_id: ProjectId,
}

impl IssueDetectorPair {
    pub fn remote_issue_id(&self) -> &str {
        &self.issue.remote_issue_id
    }
}

pub(crate) fn execution_detector(execution: &Execution) -> IssueDetector {
    IssueDetector::Execution {
        execution_id: execution.id,
        name: execution.name.clone(),
    }
}

pub(crate) fn step_detector(step: &ExecutionStep) -> IssueDetector {
    IssueDetector::Step {
        step_id: step.id,
        execution_id: step.execution_id,
        index: step.index,
    }
}

/// Pairs for the issues of one step.
pub(crate) fn step_pairs(
    repository: &dyn IssueRepository,
    step: &ExecutionStep,
    project_id: ProjectId,
) -> Result<Vec<IssueDetectorPair>, OwnershipError> {
    Ok(repository
        .find_issues(step.issue_list_id)?
        .into_iter()
        .map(|issue| IssueDetectorPair {
            detector: step_detector(step),
            issue,
            project_id,
        })
        .collect())
}

/// Pairs for the issues of each execution and of all its steps.
pub(crate) fn execution_pairs(
    repository: &dyn IssueRepository,
    executions: &[Execution],
) -> Result<Vec<IssueDetectorPair>, OwnershipError> {
    let mut pairs = Vec::new();
    for execution in executions {
        pairs.extend(
            repository
                .find_issues(execution.issue_list_id)?
                .into_iter()
                .map(|issue| IssueDetectorPair {
                    detector: execution_detector(execution),
                    issue,
                    project_id: execution.project_id,
                }),
        );
        for step in repository.find_execution_steps(execution.id)? {
            pairs.extend(step_pairs(repository, &step, execution.project_id)?);
        }
    }
    Ok(pairs)
}

/// Resolves the tracker bound to `project_id`, or `None` when the project has
/// no binding.
pub(crate) fn project_tracker(
    repository: &dyn IssueRepository,
    project_id: ProjectId,
) -> Result<Option<BugTracker>, OwnershipError> {
    let project = repository
        .find_project(project_id)?
        .ok_or_else(|| OwnershipError::not_found("project", project_id))?;
    match project.bugtracker_id() {
        Some(tracker_id) => repository
            .find_bugtracker(tracker_id)?
            .map(Some)
            .ok_or_else(|| OwnershipError::not_found("bugtracker", tracker_id)),
        None => Ok(None),
    }
}

/// Drops pairs whose issue was reported to a tracker other than the one
/// bound to its execution's project.
pub(crate) fn retain_consistent(
    repository: &dyn IssueRepository,
    pairs: Vec<IssueDetectorPair>,
) -> Result<Vec<IssueDetectorPair>, OwnershipError> {
    let mut bindings: HashMap<ProjectId, Option<BugTrackerId>> = HashMap::new();
    let mut kept = Vec::with_capacity(pairs.len());
    let loaded = pairs.len();
    for pair in pairs {
        let bound = match bindings.get(&pair.project_id) {
            Some(bound) => *bound,
            None => {
                let bound = repository
                    .find_project(pair.project_id)?
                    .and_then(|project| project.bugtracker_id());
                bindings.insert(pair.project_id, bound);
                bound
            }
        };
        if bound == Some(pair.issue.bugtracker_id) {
            kept.push(pair);
        }
    }
    if kept.len() < loaded {
        debug!(
            loaded,
            kept = kept.len(),
            "dropped issues bound to a tracker their project no longer uses"
        );
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use ownership_bugtracker::test_support::StubRemote;
    use ownership_domain::IssueDetector;

    use super::{execution_pairs, retain_consistent};
    use crate::test_support::{ExecutionLinks, OwnershipFixture};

    #[test]
    fn execution_pairs_list_execution_issues_before_step_issues() {
        let mut fixture = OwnershipFixture::new();
        let tracker = fixture.tracker(1, "jira", StubRemote::new("jira"));
        let project = fixture.project(1, Some(&tracker));
        let execution = fixture.execution(1, project, ExecutionLinks::default());
        let late_step = fixture.step(12, &execution, 1);
        let early_step = fixture.step(11, &execution, 0);
        fixture.issue(late_step.issue_list_id, tracker.id, "S-2");
        fixture.issue(early_step.issue_list_id, tracker.id, "S-1");
        fixture.issue(execution.issue_list_id, tracker.id, "E-1");

        let repository = fixture.repository.as_ref();
        let pairs = execution_pairs(repository, &[execution]).expect("pairs");

        let ids: Vec<&str> = pairs.iter().map(|pair| pair.remote_issue_id()).collect();
        assert_eq!(ids, vec!["E-1", "S-1", "S-2"]);
        assert!(matches!(pairs[1].detector, IssueDetector::Step { index: 0, .. }));
    }

    #[test]
    fn consistency_guard_drops_pairs_of_other_trackers() {
        let mut fixture = OwnershipFixture::new();
        let bound = fixture.tracker(1, "jira", StubRemote::new("jira"));
        let stale = fixture.tracker(2, "legacy", StubRemote::new("legacy"));
        let project = fixture.project(1, Some(&bound));
        let execution = fixture.execution(1, project, ExecutionLinks::default());
        fixture.issue(execution.issue_list_id, bound.id, "NEW-1");
        fixture.issue(execution.issue_list_id, stale.id, "OLD-1");
        let repository = fixture.repository.as_ref();

        let pairs = execution_pairs(repository, &[execution]).expect("pairs");
        let kept = retain_consistent(repository, pairs).expect("guard");

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].remote_issue_id(), "NEW-1");
    }
}
