use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ownership_domain::{BugTracker, OwnershipError};

use crate::connector::{BugTrackerConnector, ConnectorProvider};

pub trait ConnectorFactory: Send + Sync {
    fn build(&self, tracker: &BugTracker) -> Result<Box<dyn BugTrackerConnector>, OwnershipError>;
}

/// Connector providers keyed by tracker kind.
#[derive(Clone, Default)]
pub struct ConnectorRegistry {
    providers: BTreeMap<String, Arc<dyn ConnectorProvider>>,
}

impl fmt::Debug for ConnectorRegistry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ConnectorRegistry")
            .field("kinds", &self.supported_kinds())
            .finish()
    }
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: Arc<dyn ConnectorProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Registers `provider`, replacing any provider already bound to its kind.
    pub fn register(&mut self, provider: Arc<dyn ConnectorProvider>) {
        let kind = provider.kind().trim().to_ascii_lowercase();
        self.providers.insert(kind, provider);
    }

    pub fn supported_kinds(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn resolve_provider(
        &self,
        kind: &str,
    ) -> Result<&Arc<dyn ConnectorProvider>, OwnershipError> {
        self.providers
            .get(&kind.trim().to_ascii_lowercase())
            .ok_or_else(|| {
                OwnershipError::Configuration(format!("unknown bugtracker connector kind: {kind}"))
            })
    }
}

impl ConnectorFactory for ConnectorRegistry {
    fn build(&self, tracker: &BugTracker) -> Result<Box<dyn BugTrackerConnector>, OwnershipError> {
        self.resolve_provider(&tracker.kind)?.connect(tracker)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{ConnectorFactory, ConnectorRegistry};
    use crate::test_support::{stub_tracker, StubConnectorProvider, StubRemote, STUB_CONNECTOR_KIND};
    use ownership_domain::{AuthenticationPolicy, OwnershipError};

    #[test]
    fn supported_kinds_lists_registered_providers() {
        let registry =
            ConnectorRegistry::new().with_provider(Arc::new(StubConnectorProvider::new()));
        assert_eq!(registry.supported_kinds(), vec![STUB_CONNECTOR_KIND]);
    }

    #[test]
    fn resolve_provider_ignores_case_and_padding() {
        let registry =
            ConnectorRegistry::new().with_provider(Arc::new(StubConnectorProvider::new()));
        registry
            .resolve_provider("  BUGTRACKER.STUB ")
            .expect("resolve padded key");
    }

    #[test]
    fn build_rejects_unknown_kinds() {
        let registry = ConnectorRegistry::new();
        let mut tracker = stub_tracker(1, "mantis", AuthenticationPolicy::User);
        tracker.kind = "bugtracker.mantis".to_owned();

        let error = registry.build(&tracker).err().expect("reject unknown kind");
        assert_eq!(
            error,
            OwnershipError::Configuration(
                "unknown bugtracker connector kind: bugtracker.mantis".to_owned()
            )
        );
    }

    #[test]
    fn build_returns_connector_for_registered_tracker() {
        let tracker = stub_tracker(1, "jira", AuthenticationPolicy::User);
        let provider =
            StubConnectorProvider::new().with_remote(tracker.id, StubRemote::new("jira"));
        let registry = ConnectorRegistry::new().with_provider(Arc::new(provider));

        assert!(registry.build(&tracker).is_ok());
    }
}
