use std::collections::BTreeSet;
use std::sync::Arc;

use ownership_domain::{Campaign, CampaignFolder, CampaignFolderId, CampaignId, OwnershipError};

use super::{HolderPairFinder, TrackerLookup};
use crate::pairs::{self, IssueDetectorPair};
use crate::repository::{ExecutionScope, IssueRepository};

#[derive(Clone)]
pub struct CampaignPairFinder {
    repository: Arc<dyn IssueRepository>,
}

impl CampaignPairFinder {
    pub fn new(repository: Arc<dyn IssueRepository>) -> Self {
        Self { repository }
    }
}

impl HolderPairFinder for CampaignPairFinder {
    type Id = CampaignId;
    type Holder = Campaign;

    fn find_holder(&self, id: CampaignId) -> Result<Campaign, OwnershipError> {
        self.repository
            .find_campaign(id)?
            .ok_or_else(|| OwnershipError::not_found("campaign", id))
    }

    fn load_pairs(&self, holder: &Campaign) -> Result<Vec<IssueDetectorPair>, OwnershipError> {
        let executions = self
            .repository
            .find_executions(&ExecutionScope::Campaigns(vec![holder.id]))?;
        let loaded = pairs::execution_pairs(self.repository.as_ref(), &executions)?;
        pairs::retain_consistent(self.repository.as_ref(), loaded)
    }

    fn find_tracker(&self, holder: &Campaign) -> Result<TrackerLookup, OwnershipError> {
        pairs::project_tracker(self.repository.as_ref(), holder.project_id)
            .map(TrackerLookup::Single)
    }
}

/// Issues of every campaign below a folder, at any depth.
#[derive(Clone)]
pub struct CampaignFolderPairFinder {
    repository: Arc<dyn IssueRepository>,
}

impl CampaignFolderPairFinder {
    pub fn new(repository: Arc<dyn IssueRepository>) -> Self {
        Self { repository }
    }

    fn subtree(&self, root: CampaignFolderId) -> Result<Vec<CampaignFolderId>, OwnershipError> {
        let mut visited = BTreeSet::from([root]);
        let mut pending = vec![root];
        while let Some(folder_id) = pending.pop() {
            for child in self.repository.find_child_folders(folder_id)? {
                // a folder reachable twice is only walked once
                if visited.insert(child.id) {
                    pending.push(child.id);
                }
            }
        }
        Ok(visited.into_iter().collect())
    }
}

impl HolderPairFinder for CampaignFolderPairFinder {
    type Id = CampaignFolderId;
    type Holder = CampaignFolder;

    fn find_holder(&self, id: CampaignFolderId) -> Result<CampaignFolder, OwnershipError> {
        self.repository
            .find_campaign_folder(id)?
            .ok_or_else(|| OwnershipError::not_found("campaign folder", id))
    }

    fn load_pairs(
        &self,
        holder: &CampaignFolder,
    ) -> Result<Vec<IssueDetectorPair>, OwnershipError> {
        let folders = self.subtree(holder.id)?;
        let campaigns: Vec<CampaignId> = self
            .repository
            .find_campaigns_in_folders(&folders)?
            .into_iter()
            .map(|campaign| campaign.id)
            .collect();
        if campaigns.is_empty() {
            return Ok(Vec::new());
        }
        let executions = self
            .repository
            .find_executions(&ExecutionScope::Campaigns(campaigns))?;
        let loaded = pairs::execution_pairs(self.repository.as_ref(), &executions)?;
        pairs::retain_consistent(self.repository.as_ref(), loaded)
    }

    fn find_tracker(&self, holder: &CampaignFolder) -> Result<TrackerLookup, OwnershipError> {
        pairs::project_tracker(self.repository.as_ref(), holder.project_id)
            .map(TrackerLookup::Single)
    }
}
