pub mod aggregator;
pub mod finders;
pub mod memory;
pub mod ordering;
pub mod pairs;
pub mod permissions;
pub mod repository;
pub mod service;
pub mod telemetry;
pub mod test_support;

pub use aggregator::OwnershipAggregator;
pub use finders::{
    CampaignFolderPairFinder, CampaignPairFinder, ExecutionPairFinder, ExecutionStepPairFinder,
    HolderPairFinder, IterationPairFinder, RequirementVersionPairFinder, TestCasePairFinder,
    TestSuitePairFinder, TrackerLookup,
};
pub use memory::InMemoryIssueRepository;
pub use pairs::IssueDetectorPair;
pub use permissions::{GrantAll, PermissionEvaluator};
pub use repository::{ExecutionScope, IssueRepository};
pub use service::IssueOwnershipService;
pub use telemetry::init_tracing;
