use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! numeric_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }
    };
}

numeric_id!(BugTrackerId);
numeric_id!(ProjectId);
numeric_id!(IssueId);
numeric_id!(IssueListId);
numeric_id!(ExecutionId);
numeric_id!(ExecutionStepId);
numeric_id!(TestCaseId);
numeric_id!(CampaignId);
numeric_id!(CampaignFolderId);
numeric_id!(IterationId);
numeric_id!(TestSuiteId);
numeric_id!(RequirementId);
numeric_id!(RequirementVersionId);

#[cfg(test)]
mod tests {
    use super::{BugTrackerId, IssueId};

    #[test]
    fn numeric_ids_display_their_raw_value() {
        assert_eq!(BugTrackerId::new(7).to_string(), "7");
        assert_eq!(IssueId::from(42).get(), 42);
    }

    #[test]
    fn numeric_ids_serialize_transparently() {
        let encoded = serde_json::to_string(&IssueId::new(12)).expect("serialize id");
        assert_eq!(encoded, "12");
        let decoded: IssueId = serde_json::from_str("12").expect("deserialize id");
        assert_eq!(decoded, IssueId::new(12));
    }
}
