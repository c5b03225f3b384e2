use serde::{Deserialize, Serialize};

use crate::bugtracker::RemoteIssue;
use crate::entities::{Issue, IssueDetector};
use crate::identifiers::{BugTrackerId, IssueId};

/// A remote issue carrying the identity of the local record it was resolved
/// from. `remote` is empty when the tracker could not be reached for this
/// item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIssueDecorator {
    pub issue_id: IssueId,
    pub bugtracker_id: BugTrackerId,
    pub remote_issue_id: String,
    pub remote: Option<RemoteIssue>,
}

impl RemoteIssueDecorator {
    pub fn new(issue: &Issue, remote: Option<RemoteIssue>) -> Self {
        Self {
            issue_id: issue.id,
            bugtracker_id: issue.bugtracker_id,
            remote_issue_id: issue.remote_issue_id.clone(),
            remote,
        }
    }

    pub fn renamed_key(&self) -> Option<&str> {
        self.remote
            .as_ref()
            .and_then(|remote| remote.new_key.as_deref())
            .filter(|new_key| *new_key != self.remote_issue_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueOwnership {
    pub issue: RemoteIssueDecorator,
    pub owner: IssueDetector,
}

#[cfg(test)]
mod tests {
    use super::RemoteIssueDecorator;
    use crate::bugtracker::RemoteIssue;
    use crate::entities::Issue;
    use crate::identifiers::{BugTrackerId, IssueId, IssueListId};

    fn issue() -> Issue {
        Issue {
            id: IssueId::new(1),
            issue_list_id: IssueListId::new(1),
            bugtracker_id: BugTrackerId::new(1),
            remote_issue_id: "BUG-1".to_owned(),
        }
    }

    fn remote(new_key: Option<&str>) -> RemoteIssue {
        RemoteIssue {
            id: "BUG-1".to_owned(),
            key: "BUG-1".to_owned(),
            bugtracker_name: "jira".to_owned(),
            summary: "broken".to_owned(),
            status: None,
            url: None,
            new_key: new_key.map(str::to_owned),
        }
    }

    #[test]
    fn renamed_key_is_reported_only_when_it_differs() {
        let local = issue();
        assert_eq!(
            RemoteIssueDecorator::new(&local, Some(remote(Some("OPS-7")))).renamed_key(),
            Some("OPS-7")
        );
        assert_eq!(
            RemoteIssueDecorator::new(&local, Some(remote(Some("BUG-1")))).renamed_key(),
            None
        );
        assert_eq!(RemoteIssueDecorator::new(&local, None).renamed_key(), None);
    }
}
