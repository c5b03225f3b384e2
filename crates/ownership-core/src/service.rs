use std::sync::Arc;

use ownership_bugtracker::{
    ConnectorFactory, CredentialResolver, CredentialStore, RemoteTrackerGateway,
};
use ownership_config::{OwnershipConfig, PagingRuntimeConfig};
use ownership_domain::{
    Attachment, BugTracker, BugTrackerStatus, HolderRef, Issue, IssueId, IssueListId,
    IssueOwnership, OwnershipError, PagedResult, PagingAndSorting, Permission, ProjectId,
    RemoteIssue, RemoteIssueDraft, RemoteProject, RequestContext,
};
use tracing::info;

use crate::aggregator::OwnershipAggregator;
use crate::finders::{
    CampaignFolderPairFinder, CampaignPairFinder, ExecutionPairFinder, ExecutionStepPairFinder,
    IterationPairFinder, RequirementVersionPairFinder, TestCasePairFinder, TestSuitePairFinder,
};
use crate::pairs;
use crate::permissions::{self, PermissionEvaluator};
use crate::repository::IssueRepository;

/// Where a new issue of an execution or step is recorded.
struct DetectorTarget {
    issue_list_id: IssueListId,
    project_id: ProjectId,
}

/// Entry point for reading and changing the issues attached to holders.
#[derive(Clone)]
pub struct IssueOwnershipService {
    repository: Arc<dyn IssueRepository>,
    gateway: RemoteTrackerGateway,
    permissions: Arc<dyn PermissionEvaluator>,
    aggregator: OwnershipAggregator,
    paging: PagingRuntimeConfig,
}

impl IssueOwnershipService {
    pub fn new(
        repository: Arc<dyn IssueRepository>,
        gateway: RemoteTrackerGateway,
        permissions: Arc<dyn PermissionEvaluator>,
    ) -> Self {
        Self {
            aggregator: OwnershipAggregator::new(repository.clone(), gateway.clone()),
            repository,
            gateway,
            permissions,
            paging: OwnershipConfig::default().paging_runtime(),
        }
    }

    pub fn from_config(
        config: &OwnershipConfig,
        repository: Arc<dyn IssueRepository>,
        connectors: Arc<dyn ConnectorFactory>,
        credentials: Arc<dyn CredentialStore>,
        permissions: Arc<dyn PermissionEvaluator>,
    ) -> Self {
        let gateway = RemoteTrackerGateway::new(
            connectors,
            CredentialResolver::new(credentials),
            config.remote_runtime(),
        );
        Self::new(repository, gateway, permissions).with_paging(config.paging_runtime())
    }

    pub fn with_paging(mut self, paging: PagingRuntimeConfig) -> Self {
        self.paging = paging;
        self
    }

    pub fn gateway(&self) -> &RemoteTrackerGateway {
        &self.gateway
    }

    pub async fn find_sorted(
        &self,
        holder: HolderRef,
        paging: &PagingAndSorting,
        ctx: &RequestContext,
    ) -> Result<PagedResult<IssueOwnership>, OwnershipError> {
        self.require(ctx, Permission::Read, &holder)?;
        let paging = self.normalize_paging(paging);
        let repository = self.repository.clone();
        let aggregator = &self.aggregator;
        match holder {
            HolderRef::Execution(id) => {
                aggregator
                    .find_sorted(&ExecutionPairFinder::new(repository), id, &paging, ctx)
                    .await
            }
            HolderRef::ExecutionStep(id) => {
                aggregator
                    .find_sorted(&ExecutionStepPairFinder::new(repository), id, &paging, ctx)
                    .await
            }
            HolderRef::TestCase(id) => {
                aggregator
                    .find_sorted(&TestCasePairFinder::new(repository), id, &paging, ctx)
                    .await
            }
            HolderRef::Campaign(id) => {
                aggregator
                    .find_sorted(&CampaignPairFinder::new(repository), id, &paging, ctx)
                    .await
            }
            HolderRef::CampaignFolder(id) => {
                aggregator
                    .find_sorted(&CampaignFolderPairFinder::new(repository), id, &paging, ctx)
                    .await
            }
            HolderRef::Iteration(id) => {
                aggregator
                    .find_sorted(&IterationPairFinder::new(repository), id, &paging, ctx)
                    .await
            }
            HolderRef::TestSuite(id) => {
                aggregator
                    .find_sorted(&TestSuitePairFinder::new(repository), id, &paging, ctx)
                    .await
            }
            HolderRef::RequirementVersion(id, scope) => {
                let finder = RequirementVersionPairFinder::new(repository, scope);
                aggregator.find_sorted(&finder, id, &paging, ctx).await
            }
        }
    }

    /// Binds an existing remote issue to an execution or step. The key must
    /// resolve remotely before anything is written.
    pub async fn attach_issue(
        &self,
        detector: HolderRef,
        remote_key: &str,
        ctx: &RequestContext,
    ) -> Result<Issue, OwnershipError> {
        let target = self.detector_target(detector)?;
        self.require(ctx, Permission::Write, &detector)?;
        let tracker = self.bound_tracker(target.project_id)?;
        let remote = self.gateway.find_by_key(remote_key, &tracker, ctx).await?;
        let issue = self
            .repository
            .insert_issue(target.issue_list_id, tracker.id, &remote.id)?;
        info!(
            holder = %detector,
            tracker = %tracker.name,
            remote_issue = %remote.id,
            "attached remote issue"
        );
        Ok(issue)
    }

    pub fn detach_issue(
        &self,
        issue_id: IssueId,
        ctx: &RequestContext,
    ) -> Result<(), OwnershipError> {
        let (issue, owner) = self.issue_with_owner(issue_id)?;
        self.require(ctx, Permission::Write, &owner)?;
        self.repository.delete_issue(issue.id)?;
        info!(
            holder = %owner,
            remote_issue = %issue.remote_issue_id,
            "detached issue"
        );
        Ok(())
    }

    /// Reports a new issue remotely, forwarding the draft's attachments, and
    /// records it on the detector.
    pub async fn create_issue(
        &self,
        detector: HolderRef,
        draft: RemoteIssueDraft,
        ctx: &RequestContext,
    ) -> Result<RemoteIssue, OwnershipError> {
        let target = self.detector_target(detector)?;
        self.require(ctx, Permission::Write, &detector)?;
        let tracker = self.bound_tracker(target.project_id)?;
        let created = self.gateway.create_issue(draft, &tracker, ctx).await?;
        self.repository
            .insert_issue(target.issue_list_id, tracker.id, &created.id)?;
        info!(
            holder = %detector,
            tracker = %tracker.name,
            remote_issue = %created.key,
            "reported new remote issue"
        );
        Ok(created)
    }

    pub async fn forward_attachments(
        &self,
        issue_id: IssueId,
        attachments: Vec<Attachment>,
        ctx: &RequestContext,
    ) -> Result<(), OwnershipError> {
        let (issue, owner) = self.issue_with_owner(issue_id)?;
        self.require(ctx, Permission::Write, &owner)?;
        let tracker = self
            .repository
            .find_bugtracker(issue.bugtracker_id)?
            .ok_or_else(|| OwnershipError::not_found("bugtracker", issue.bugtracker_id))?;
        self.gateway
            .forward_attachments(&issue.remote_issue_id, attachments, &tracker, ctx)
            .await
    }

    /// Looks up the remote project issues of `project_id` are reported into.
    /// Without an explicit name the first name of the project's binding is
    /// used, then the project's own name.
    pub async fn find_remote_project(
        &self,
        project_id: ProjectId,
        remote_project_name: Option<&str>,
        ctx: &RequestContext,
    ) -> Result<RemoteProject, OwnershipError> {
        let project = self
            .repository
            .find_project(project_id)?
            .ok_or_else(|| OwnershipError::not_found("project", project_id))?;
        let tracker = self.bound_tracker(project_id)?;
        let name = match remote_project_name {
            Some(name) => name.to_owned(),
            None => project
                .bugtracker_binding
                .as_ref()
                .and_then(|binding| binding.remote_project_names.first().cloned())
                .unwrap_or(project.name),
        };
        self.gateway.find_remote_project(&name, &tracker, ctx).await
    }

    pub fn bugtracker_status(
        &self,
        project_id: ProjectId,
        ctx: &RequestContext,
    ) -> Result<BugTrackerStatus, OwnershipError> {
        let tracker = pairs::project_tracker(self.repository.as_ref(), project_id)?;
        self.gateway.status(tracker.as_ref(), &ctx.user)
    }

    /// Rewrites the local remote id of every item whose remote issue reports a
    /// new key. Returns how many records changed.
    pub fn apply_remote_renames(
        &self,
        ownerships: &[IssueOwnership],
        ctx: &RequestContext,
    ) -> Result<usize, OwnershipError> {
        let mut renamed = 0;
        for ownership in ownerships {
            let Some(new_key) = ownership.issue.renamed_key() else {
                continue;
            };
            let owner = HolderRef::from(&ownership.owner);
            self.require(ctx, Permission::Write, &owner)?;
            self.repository
                .update_remote_issue_id(ownership.issue.issue_id, new_key)?;
            info!(
                from = %ownership.issue.remote_issue_id,
                to = new_key,
                "applied remote issue rename"
            );
            renamed += 1;
        }
        Ok(renamed)
    }

    fn require(
        &self,
        ctx: &RequestContext,
        permission: Permission,
        target: &HolderRef,
    ) -> Result<(), OwnershipError> {
        permissions::require(self.permissions.as_ref(), &ctx.user, permission, target)
    }

    fn normalize_paging(&self, paging: &PagingAndSorting) -> PagingAndSorting {
        let mut paging = *paging;
        if paging.page_size == 0 {
            paging.page_size = self.paging.default_page_size;
        }
        paging.page_size = paging.page_size.min(self.paging.max_page_size);
        paging
    }

    fn bound_tracker(&self, project_id: ProjectId) -> Result<BugTracker, OwnershipError> {
        pairs::project_tracker(self.repository.as_ref(), project_id)?.ok_or_else(|| {
            OwnershipError::Configuration(format!(
                "project {project_id} is not bound to a bugtracker"
            ))
        })
    }

    fn detector_target(&self, detector: HolderRef) -> Result<DetectorTarget, OwnershipError> {
        match detector {
            HolderRef::Execution(id) => {
                let execution = self
                    .repository
                    .find_execution(id)?
                    .ok_or_else(|| OwnershipError::not_found("execution", id))?;
                Ok(DetectorTarget {
                    issue_list_id: execution.issue_list_id,
                    project_id: execution.project_id,
                })
            }
            HolderRef::ExecutionStep(id) => {
                let step = self
                    .repository
                    .find_execution_step(id)?
                    .ok_or_else(|| OwnershipError::not_found("execution step", id))?;
                let execution = self
                    .repository
                    .find_execution(step.execution_id)?
                    .ok_or_else(|| OwnershipError::not_found("execution", step.execution_id))?;
                Ok(DetectorTarget {
                    issue_list_id: step.issue_list_id,
                    project_id: execution.project_id,
                })
            }
            other => Err(OwnershipError::Configuration(format!(
                "{other} does not hold issues directly"
            ))),
        }
    }

    fn issue_with_owner(&self, issue_id: IssueId) -> Result<(Issue, HolderRef), OwnershipError> {
        let issue = self
            .repository
            .find_issue(issue_id)?
            .ok_or_else(|| OwnershipError::not_found("issue", issue_id))?;
        let owner = self
            .repository
            .find_issue_list_owner(issue.issue_list_id)?
            .ok_or_else(|| OwnershipError::not_found("issue list", issue.issue_list_id))?;
        Ok((issue, owner))
    }
}

#[cfg(test)]
mod tests {
    use ownership_config::PagingRuntimeConfig;
    use ownership_domain::PagingAndSorting;

    use crate::test_support::OwnershipFixture;

    #[test]
    fn page_size_is_defaulted_and_capped() {
        let service = OwnershipFixture::new()
            .service()
            .expect("service")
            .with_paging(PagingRuntimeConfig {
                default_page_size: 25,
                max_page_size: 100,
            });

        let defaulted = service.normalize_paging(&PagingAndSorting::page(0, 0));
        let capped = service.normalize_paging(&PagingAndSorting::page(40, 5_000));

        assert_eq!(defaulted.page_size, 25);
        assert_eq!(capped.page_size, 100);
        assert_eq!(capped.first_item_index, 40);
    }
}
