//! Property-based tests for pair ordering and tracker recombination.
//!
//! Uses proptest to verify that:
//! - Descending order is the exact inverse of ascending order
//! - Grouping by tracker then recombining keeps the directly sorted order
//! - Merging separately sorted lists equals sorting their concatenation

use std::cmp::Ordering;
use std::collections::HashMap;

use proptest::prelude::*;
use tracing::info;

use ownership_core::ordering::{
    self, comparator, merge_sorted, recombine, remote_id_ascending, remote_id_descending,
    TrackerGroups,
};
use ownership_core::IssueDetectorPair;
use ownership_domain::{
    AuthenticationPolicy, BugTracker, BugTrackerId, ExecutionId, ExecutionStepId, Issue,
    IssueDetector, IssueId, IssueListId, PagingAndSorting, ProjectId, RemoteIssue, SortField,
    SortOrder,
};

fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}

fn tracker(id: i64) -> BugTracker {
    BugTracker {
        id: BugTrackerId::new(id),
        name: format!("tracker-{id}"),
        kind: "bugtracker.stub".to_owned(),
        url: String::new(),
        authentication_policy: AuthenticationPolicy::ApplicationLevel,
    }
}

fn make_pair(index: usize, remote_id: &str, tracker_id: i64, on_step: bool) -> IssueDetectorPair {
    let detector = if on_step {
        IssueDetector::Step {
            step_id: ExecutionStepId::new(index as i64),
            execution_id: ExecutionId::new(1),
            index: index as u32,
        }
    } else {
        IssueDetector::Execution {
            execution_id: ExecutionId::new(1),
            name: "run".to_owned(),
        }
    };
    IssueDetectorPair {
        detector,
        issue: Issue {
            id: IssueId::new(index as i64 + 1),
            issue_list_id: IssueListId::new(1),
            bugtracker_id: BugTrackerId::new(tracker_id),
            remote_issue_id: remote_id.to_owned(),
        },
        project_id: ProjectId::new(tracker_id),
    }
}

fn pairs_strategy() -> impl Strategy<Value = Vec<IssueDetectorPair>> {
    prop::collection::vec(("[A-C]{1,2}-[0-9]{1,3}", 1i64..4, any::<bool>()), 0..40).prop_map(
        |raw| {
            raw.into_iter()
                .enumerate()
                .map(|(index, (remote_id, tracker_id, on_step))| {
                    make_pair(index, &remote_id, tracker_id, on_step)
                })
                .collect()
        },
    )
}

fn order_strategy() -> impl Strategy<Value = SortOrder> {
    prop_oneof![Just(SortOrder::Ascending), Just(SortOrder::Descending)]
}

fn issue_ids(pairs: &[IssueDetectorPair]) -> Vec<IssueId> {
    pairs.iter().map(|pair| pair.issue.id).collect()
}

fn remote_echo(remote_id: &str) -> RemoteIssue {
    RemoteIssue {
        id: remote_id.to_owned(),
        key: remote_id.to_owned(),
        bugtracker_name: "stub".to_owned(),
        summary: String::new(),
        status: None,
        url: None,
        new_key: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        ..Default::default()
    })]

    /// Property: descending is ascending with its arguments swapped
    #[test]
    fn descending_inverts_ascending(
        left in "[A-Z]{1,3}-[0-9]{1,4}",
        right in "[A-Z]{1,3}-[0-9]{1,4}",
    ) {
        let a = make_pair(0, &left, 1, false);
        let b = make_pair(1, &right, 1, false);

        prop_assert_eq!(remote_id_descending(&a, &b), remote_id_ascending(&b, &a));
        prop_assert_eq!(remote_id_descending(&a, &b), remote_id_ascending(&a, &b).reverse());
        if left == right {
            prop_assert_eq!(remote_id_ascending(&a, &b), Ordering::Equal);
        }
    }

    /// Property: group by tracker then recombine yields the direct sort order
    #[test]
    fn recombination_preserves_sorted_order(
        mut pairs in pairs_strategy(),
        order in order_strategy(),
    ) {
        init_test_logging();
        info!("proptest_recombine: pairs={len}", len = pairs.len());

        let paging = PagingAndSorting::unpaged().sorted_by(SortField::RemoteIssueId, order);
        ordering::sort_pairs(&mut pairs, &paging);
        let expected = issue_ids(&pairs);

        let groups = TrackerGroups::resolve_each(&pairs, |pair| {
            Ok(Some(tracker(pair.issue.bugtracker_id.get())))
        })
        .expect("grouping never fails");
        // trackers answer in an arbitrary order of their own
        let fetched: HashMap<BugTrackerId, Vec<RemoteIssue>> = groups
            .groups()
            .map(|group| {
                let issues = group.remote_ids.iter().rev().map(|id| remote_echo(id)).collect();
                (group.tracker.id, issues)
            })
            .collect();

        let items = recombine(pairs, &groups, &fetched);

        let actual: Vec<IssueId> = items.iter().map(|item| item.issue.issue_id).collect();
        prop_assert_eq!(actual, expected);
        for item in &items {
            let remote = item.issue.remote.as_ref().expect("every id answered");
            prop_assert_eq!(&remote.id, &item.issue.remote_issue_id);
        }
    }

    /// Property: merging sorted execution and step lists equals one stable sort
    #[test]
    fn merge_equals_sort_of_concatenation(
        pairs in pairs_strategy(),
        field in prop_oneof![Just(SortField::RemoteIssueId), Just(SortField::IssueId)],
        order in order_strategy(),
    ) {
        let compare = comparator(field, order);
        let (mut own, mut steps): (Vec<_>, Vec<_>) = pairs
            .into_iter()
            .partition(|pair| matches!(pair.detector, IssueDetector::Execution { .. }));

        let mut concatenated: Vec<IssueDetectorPair> =
            own.iter().chain(steps.iter()).cloned().collect();
        concatenated.sort_by(compare);

        own.sort_by(compare);
        steps.sort_by(compare);
        let merged = merge_sorted(vec![own, steps], compare);

        prop_assert_eq!(issue_ids(&merged), issue_ids(&concatenated));
    }
}
