use std::collections::HashMap;
use std::sync::Arc;

use ownership_bugtracker::RemoteTrackerGateway;
use ownership_domain::{
    BugTracker, BugTrackerId, IssueOwnership, OwnershipError, PagedResult, PagingAndSorting,
    ProjectId, RemoteIssue, RequestContext,
};
use tracing::{debug, warn};

use crate::finders::{HolderPairFinder, TrackerLookup};
use crate::ordering::{self, TrackerGroups};
use crate::pairs::{self, IssueDetectorPair};
use crate::repository::IssueRepository;

/// Loads the pairs of a holder through its finder, enriches them with their
/// remote representation and returns one page in load order.
#[derive(Clone)]
pub struct OwnershipAggregator {
    repository: Arc<dyn IssueRepository>,
    gateway: RemoteTrackerGateway,
}

impl OwnershipAggregator {
    pub fn new(repository: Arc<dyn IssueRepository>, gateway: RemoteTrackerGateway) -> Self {
        Self {
            repository,
            gateway,
        }
    }

    pub async fn find_sorted<F>(
        &self,
        finder: &F,
        holder_id: F::Id,
        paging: &PagingAndSorting,
        ctx: &RequestContext,
    ) -> Result<PagedResult<IssueOwnership>, OwnershipError>
    where
        F: HolderPairFinder,
    {
        let holder = finder.find_holder(holder_id)?;
        let (total_count, pairs) = finder.find_page(&holder, paging)?;
        if pairs.is_empty() {
            return Ok(PagedResult::empty(total_count, *paging));
        }

        let groups = match finder.find_tracker(&holder)? {
            TrackerLookup::Single(None) => {
                debug!(
                    holder = %holder_id,
                    total_count,
                    "holder has no bound bugtracker, skipping remote lookup"
                );
                return Ok(PagedResult::empty(total_count, *paging));
            }
            TrackerLookup::Single(Some(tracker)) => TrackerGroups::single(tracker, &pairs),
            TrackerLookup::PerProject => self.group_by_project(&pairs)?,
        };

        let fetched = self.fetch_groups(&groups, ctx).await?;
        let items = ordering::recombine(pairs, &groups, &fetched);
        debug!(
            holder = %holder_id,
            total_count,
            returned = items.len(),
            trackers = groups.len(),
            "resolved issue ownerships"
        );
        Ok(PagedResult::new(items, total_count, *paging))
    }

    fn group_by_project(
        &self,
        pairs: &[IssueDetectorPair],
    ) -> Result<TrackerGroups, OwnershipError> {
        let mut trackers: HashMap<ProjectId, Option<BugTracker>> = HashMap::new();
        TrackerGroups::resolve_each(pairs, |pair| {
            if let Some(tracker) = trackers.get(&pair.project_id) {
                return Ok(tracker.clone());
            }
            let tracker = pairs::project_tracker(self.repository.as_ref(), pair.project_id)?;
            trackers.insert(pair.project_id, tracker.clone());
            Ok(tracker)
        })
    }

    /// Fetches every group concurrently. A lone group's failure is returned.
    /// With several groups a remote failure leaves that group out of the
    /// result, while credential and configuration errors are still returned.
    async fn fetch_groups(
        &self,
        groups: &TrackerGroups,
        ctx: &RequestContext,
    ) -> Result<HashMap<BugTrackerId, Vec<RemoteIssue>>, OwnershipError> {
        let handles: Vec<_> = groups
            .groups()
            .map(|group| {
                let gateway = self.gateway.clone();
                let tracker = group.tracker.clone();
                let remote_ids = group.remote_ids.clone();
                let ctx = ctx.clone();
                let handle = tokio::spawn(async move {
                    gateway.get_issues(remote_ids, &tracker, &ctx).await
                });
                (group.tracker.clone(), handle)
            })
            .collect();

        let degrade = handles.len() > 1;
        let mut fetched = HashMap::with_capacity(handles.len());
        for (tracker, handle) in handles {
            let outcome = handle.await.unwrap_or_else(|error| {
                Err(OwnershipError::remote(format!(
                    "fetch from bugtracker `{}` did not complete: {error}",
                    tracker.name
                )))
            });
            match outcome {
                Ok(issues) => {
                    fetched.insert(tracker.id, issues);
                }
                Err(error) if degrade && !error.is_fail_fast() => {
                    warn!(
                        tracker = %tracker.name,
                        %error,
                        "remote enrichment degraded for one bugtracker"
                    );
                }
                Err(error) => return Err(error),
            }
        }
        Ok(fetched)
    }
}
