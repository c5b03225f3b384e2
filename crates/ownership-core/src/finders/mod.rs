//! One pair-loading strategy per holder kind.

mod campaign;
mod execution;
mod iteration;
mod requirement;
mod test_case;

use std::fmt::Display;

use ownership_domain::{BugTracker, OwnershipError, PagingAndSorting};

use crate::ordering;
use crate::pairs::IssueDetectorPair;

pub use campaign::{CampaignFolderPairFinder, CampaignPairFinder};
pub use execution::{ExecutionPairFinder, ExecutionStepPairFinder, StepHolder};
pub use iteration::{IterationHolder, IterationPairFinder, TestSuiteHolder, TestSuitePairFinder};
pub use requirement::RequirementVersionPairFinder;
pub use test_case::TestCasePairFinder;

/// How the pairs of a holder map to trackers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerLookup {
    /// Every pair belongs to this tracker; `None` when the holder's project
    /// is not bound to one.
    Single(Option<BugTracker>),
    /// Each pair belongs to the tracker bound to its execution's project.
    PerProject,
}

pub trait HolderPairFinder: Send + Sync {
    type Id: Copy + Display + Send;
    type Holder: Send + Sync;

    fn find_holder(&self, id: Self::Id) -> Result<Self::Holder, OwnershipError>;

    /// Every pair of the holder, in load order.
    fn load_pairs(&self, holder: &Self::Holder) -> Result<Vec<IssueDetectorPair>, OwnershipError>;

    fn find_tracker(&self, holder: &Self::Holder) -> Result<TrackerLookup, OwnershipError>;

    /// Puts loaded pairs in the order `paging` asks for. Stable on ties.
    fn order_pairs(
        &self,
        mut pairs: Vec<IssueDetectorPair>,
        paging: &PagingAndSorting,
    ) -> Vec<IssueDetectorPair> {
        ordering::sort_pairs(&mut pairs, paging);
        pairs
    }

    /// The page of pairs `paging` asks for, sorted by its criteria.
    fn find_pairs(
        &self,
        holder: &Self::Holder,
        paging: &PagingAndSorting,
    ) -> Result<Vec<IssueDetectorPair>, OwnershipError> {
        let pairs = self.load_pairs(holder)?;
        Ok(paging.slice(self.order_pairs(pairs, paging)))
    }

    /// Local issue count, independent of paging and of remote availability.
    fn count_issues(&self, holder: &Self::Holder) -> Result<usize, OwnershipError> {
        Ok(self.load_pairs(holder)?.len())
    }

    /// Count and page taken from a single load, so both describe the same
    /// snapshot of the store.
    fn find_page(
        &self,
        holder: &Self::Holder,
        paging: &PagingAndSorting,
    ) -> Result<(usize, Vec<IssueDetectorPair>), OwnershipError> {
        let pairs = self.load_pairs(holder)?;
        let total_count = pairs.len();
        Ok((total_count, paging.slice(self.order_pairs(pairs, paging))))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use ownership_domain::{
        BugTrackerId, ExecutionId, Issue, IssueDetector, IssueId, IssueListId, OwnershipError,
        PagingAndSorting, ProjectId,
    };

    use super::{HolderPairFinder, TrackerLookup};
    use crate::pairs::IssueDetectorPair;

    /// Serves a store that gains one issue after every load.
    #[derive(Default)]
    struct GrowingFinder {
        loads: AtomicUsize,
        remote_ids: Mutex<Vec<String>>,
    }

    impl HolderPairFinder for GrowingFinder {
        type Id = i64;
        type Holder = ();

        fn find_holder(&self, _id: i64) -> Result<(), OwnershipError> {
            Ok(())
        }

        fn load_pairs(&self, _holder: &()) -> Result<Vec<IssueDetectorPair>, OwnershipError> {
            let load = self.loads.fetch_add(1, Ordering::SeqCst);
            let mut remote_ids = self.remote_ids.lock().expect("remote ids");
            let pairs = remote_ids
                .iter()
                .enumerate()
                .map(|(index, remote_id)| IssueDetectorPair {
                    detector: IssueDetector::Execution {
                        execution_id: ExecutionId::new(1),
                        name: "run".to_owned(),
                    },
                    issue: Issue {
                        id: IssueId::new(index as i64 + 1),
                        issue_list_id: IssueListId::new(1),
                        bugtracker_id: BugTrackerId::new(1),
                        remote_issue_id: remote_id.clone(),
                    },
                    project_id: ProjectId::new(1),
                })
                .collect();
            remote_ids.push(format!("BUG-{load}"));
            Ok(pairs)
        }

        fn find_tracker(&self, _holder: &()) -> Result<TrackerLookup, OwnershipError> {
            Ok(TrackerLookup::Single(None))
        }
    }

    #[test]
    fn page_and_count_come_from_one_load() {
        let finder = GrowingFinder::default();
        finder.load_pairs(&()).expect("warm up");
        finder.load_pairs(&()).expect("warm up");

        let (total_count, page) = finder
            .find_page(&(), &PagingAndSorting::page(0, 1))
            .expect("page");

        assert_eq!(finder.loads.load(Ordering::SeqCst), 3);
        assert_eq!(total_count, 2);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].remote_issue_id(), "BUG-0");
    }
}
