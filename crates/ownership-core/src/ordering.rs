//! Ordering of issue/detector pairs, grouping by tracker and the
//! order-preserving recombination of remote results.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use ownership_domain::{
    BugTracker, BugTrackerId, IssueOwnership, OwnershipError, PagingAndSorting, RemoteIssue,
    RemoteIssueDecorator, SortField, SortOrder,
};

use crate::pairs::IssueDetectorPair;

pub type PairComparator = fn(&IssueDetectorPair, &IssueDetectorPair) -> Ordering;

pub fn remote_id_ascending(left: &IssueDetectorPair, right: &IssueDetectorPair) -> Ordering {
    left.remote_issue_id().cmp(right.remote_issue_id())
}

pub fn remote_id_descending(left: &IssueDetectorPair, right: &IssueDetectorPair) -> Ordering {
    remote_id_ascending(left, right).reverse()
}

pub fn issue_id_ascending(left: &IssueDetectorPair, right: &IssueDetectorPair) -> Ordering {
    left.issue.id.cmp(&right.issue.id)
}

pub fn issue_id_descending(left: &IssueDetectorPair, right: &IssueDetectorPair) -> Ordering {
    issue_id_ascending(left, right).reverse()
}

pub fn comparator(field: SortField, order: SortOrder) -> PairComparator {
    match (field, order) {
        (SortField::RemoteIssueId, SortOrder::Ascending) => remote_id_ascending,
        (SortField::RemoteIssueId, SortOrder::Descending) => remote_id_descending,
        (SortField::IssueId, SortOrder::Ascending) => issue_id_ascending,
        (SortField::IssueId, SortOrder::Descending) => issue_id_descending,
    }
}

/// Stable sort by the criteria of `paging`; ties keep load order.
pub fn sort_pairs(pairs: &mut [IssueDetectorPair], paging: &PagingAndSorting) {
    pairs.sort_by(comparator(paging.sort_field, paging.sort_order));
}

/// Merges lists that are each already sorted by `compare`. On ties the item
/// from the earlier list comes first.
pub fn merge_sorted<T, C>(lists: Vec<Vec<T>>, compare: C) -> Vec<T>
where
    C: Fn(&T, &T) -> Ordering,
{
    lists
        .into_iter()
        .fold(Vec::new(), |merged, list| merge_two(merged, list, &compare))
}

fn merge_two<T, C>(left: Vec<T>, right: Vec<T>, compare: &C) -> Vec<T>
where
    C: Fn(&T, &T) -> Ordering,
{
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare(r, l) != Ordering::Less,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        merged.extend(if take_left { left.next() } else { right.next() });
    }
    merged
}

/// Remote ids to fetch from one tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerGroup {
    pub tracker: BugTracker,
    pub remote_ids: Vec<String>,
}

/// Pairs partitioned by tracker. Each pair position remembers the tracker it
/// was assigned to, so results can be put back in load order.
#[derive(Debug, Default, Clone)]
pub struct TrackerGroups {
    groups: BTreeMap<BugTrackerId, TrackerGroup>,
    assignments: Vec<Option<BugTrackerId>>,
}

impl TrackerGroups {
    pub fn single(tracker: BugTracker, pairs: &[IssueDetectorPair]) -> Self {
        let mut groups = Self::default();
        for pair in pairs {
            groups.assign(Some(&tracker), pair);
        }
        groups
    }

    /// Groups each pair under the tracker `resolve` returns for it. Pairs
    /// resolving to `None` stay unassigned.
    pub fn resolve_each<R>(
        pairs: &[IssueDetectorPair],
        mut resolve: R,
    ) -> Result<Self, OwnershipError>
    where
        R: FnMut(&IssueDetectorPair) -> Result<Option<BugTracker>, OwnershipError>,
    {
        let mut groups = Self::default();
        for pair in pairs {
            let tracker = resolve(pair)?;
            groups.assign(tracker.as_ref(), pair);
        }
        Ok(groups)
    }

    fn assign(&mut self, tracker: Option<&BugTracker>, pair: &IssueDetectorPair) {
        let Some(tracker) = tracker else {
            self.assignments.push(None);
            return;
        };
        let group = self
            .groups
            .entry(tracker.id)
            .or_insert_with(|| TrackerGroup {
                tracker: tracker.clone(),
                remote_ids: Vec::new(),
            });
        let remote_id = pair.remote_issue_id();
        if !group.remote_ids.iter().any(|known| known == remote_id) {
            group.remote_ids.push(remote_id.to_owned());
        }
        self.assignments.push(Some(tracker.id));
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> impl Iterator<Item = &TrackerGroup> {
        self.groups.values()
    }

    pub fn tracker_of(&self, index: usize) -> Option<BugTrackerId> {
        self.assignments.get(index).copied().flatten()
    }
}

/// Rebuilds ownerships in the exact order of `pairs`. Unassigned pairs are
/// dropped. A tracker absent from `fetched` yields items without a remote
/// representation.
pub fn recombine(
    pairs: Vec<IssueDetectorPair>,
    groups: &TrackerGroups,
    fetched: &HashMap<BugTrackerId, Vec<RemoteIssue>>,
) -> Vec<IssueOwnership> {
    pairs
        .into_iter()
        .enumerate()
        .filter_map(|(index, pair)| {
            let tracker_id = groups.tracker_of(index)?;
            let remote = fetched.get(&tracker_id).and_then(|issues| {
                issues
                    .iter()
                    .find(|remote| remote.answers_to(pair.remote_issue_id()))
                    .cloned()
            });
            Some(IssueOwnership {
                issue: RemoteIssueDecorator::new(&pair.issue, remote),
                owner: pair.detector,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use ownership_domain::{
        AuthenticationPolicy, BugTracker, BugTrackerId, ExecutionId, Issue, IssueDetector,
        IssueId, IssueListId, PagingAndSorting, ProjectId, SortField, SortOrder,
    };

    use super::{merge_sorted, recombine, sort_pairs, TrackerGroups};
    use crate::pairs::IssueDetectorPair;

    fn tracker(id: i64) -> BugTracker {
        BugTracker {
            id: BugTrackerId::new(id),
            name: format!("tracker-{id}"),
            kind: "bugtracker.stub".to_owned(),
            url: String::new(),
            authentication_policy: AuthenticationPolicy::ApplicationLevel,
        }
    }

    fn pair(issue_id: i64, remote_id: &str) -> IssueDetectorPair {
        IssueDetectorPair {
            detector: IssueDetector::Execution {
                execution_id: ExecutionId::new(1),
                name: "run".to_owned(),
            },
            issue: Issue {
                id: IssueId::new(issue_id),
                issue_list_id: IssueListId::new(1),
                bugtracker_id: BugTrackerId::new(1),
                remote_issue_id: remote_id.to_owned(),
            },
            project_id: ProjectId::new(1),
        }
    }

    fn remote_ids(pairs: &[IssueDetectorPair]) -> Vec<&str> {
        pairs.iter().map(|pair| pair.remote_issue_id()).collect()
    }

    #[test]
    fn remote_ids_sort_lexicographically() {
        let mut pairs = vec![pair(1, "BUG-5"), pair(2, "BUG-10"), pair(3, "BUG-2")];
        sort_pairs(&mut pairs, &PagingAndSorting::default());
        assert_eq!(remote_ids(&pairs), vec!["BUG-10", "BUG-2", "BUG-5"]);
    }

    #[test]
    fn descending_issue_ids_sort_numerically() {
        let mut pairs = vec![pair(9, "A"), pair(10, "B"), pair(2, "C")];
        let paging =
            PagingAndSorting::default().sorted_by(SortField::IssueId, SortOrder::Descending);
        sort_pairs(&mut pairs, &paging);
        assert_eq!(remote_ids(&pairs), vec!["B", "A", "C"]);
    }

    #[test]
    fn merge_prefers_the_earlier_list_on_ties() {
        let merged = merge_sorted(
            vec![vec![(1, 'a'), (3, 'a')], vec![(1, 'b'), (2, 'b')]],
            |left: &(i32, char), right: &(i32, char)| left.0.cmp(&right.0),
        );
        assert_eq!(merged, vec![(1, 'a'), (1, 'b'), (2, 'b'), (3, 'a')]);
    }

    #[test]
    fn grouping_deduplicates_remote_ids() {
        let pairs = vec![pair(1, "BUG-1"), pair(2, "BUG-1"), pair(3, "BUG-2")];
        let groups = TrackerGroups::single(tracker(1), &pairs);
        let group = groups.groups().next().expect("one group");
        assert_eq!(group.remote_ids, vec!["BUG-1", "BUG-2"]);
    }

    #[test]
    fn recombine_drops_unassigned_pairs_and_keeps_order() {
        let pairs = vec![pair(1, "A-1"), pair(2, "X-1"), pair(3, "B-1")];
        let groups = TrackerGroups::resolve_each(&pairs, |pair| {
            Ok(match pair.remote_issue_id() {
                "A-1" => Some(tracker(1)),
                "B-1" => Some(tracker(2)),
                _ => None,
            })
        })
        .expect("grouping");

        let items = recombine(pairs, &groups, &HashMap::new());

        let ids: Vec<i64> = items.iter().map(|item| item.issue.issue_id.get()).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(items.iter().all(|item| item.issue.remote.is_none()));
    }
}
