pub mod connector;
pub mod credentials;
pub mod gateway;
pub mod registry;
pub mod test_support;

pub use connector::{BugTrackerConnector, ConnectorError, ConnectorProvider};
pub use credentials::{
    CredentialResolver, CredentialScope, CredentialStore, InMemoryCredentialStore,
};
pub use gateway::RemoteTrackerGateway;
pub use registry::{ConnectorFactory, ConnectorRegistry};
