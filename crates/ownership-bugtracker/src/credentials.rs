use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use ownership_domain::{
    AuthenticationPolicy, BugTracker, BugTrackerId, Credentials, OwnershipError, UserLogin,
};

/// Whose credentials a store entry holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CredentialScope {
    Application,
    User(UserLogin),
}

impl CredentialScope {
    pub fn for_policy(policy: AuthenticationPolicy, user: &UserLogin) -> Self {
        match policy {
            AuthenticationPolicy::ApplicationLevel => Self::Application,
            AuthenticationPolicy::User => Self::User(user.clone()),
        }
    }
}

pub trait CredentialStore: Send + Sync {
    fn find(
        &self,
        scope: &CredentialScope,
        server_id: BugTrackerId,
    ) -> Result<Option<Credentials>, OwnershipError>;
    fn store(
        &self,
        scope: &CredentialScope,
        server_id: BugTrackerId,
        credentials: Credentials,
    ) -> Result<(), OwnershipError>;
    fn delete(&self, scope: &CredentialScope, server_id: BugTrackerId)
        -> Result<(), OwnershipError>;
}

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    entries: RwLock<HashMap<(CredentialScope, BugTrackerId), Credentials>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> OwnershipError {
    OwnershipError::Persistence("credential store lock poisoned".to_owned())
}

impl CredentialStore for InMemoryCredentialStore {
    fn find(
        &self,
        scope: &CredentialScope,
        server_id: BugTrackerId,
    ) -> Result<Option<Credentials>, OwnershipError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(&(scope.clone(), server_id)).cloned())
    }

    fn store(
        &self,
        scope: &CredentialScope,
        server_id: BugTrackerId,
        credentials: Credentials,
    ) -> Result<(), OwnershipError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert((scope.clone(), server_id), credentials);
        Ok(())
    }

    fn delete(
        &self,
        scope: &CredentialScope,
        server_id: BugTrackerId,
    ) -> Result<(), OwnershipError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.remove(&(scope.clone(), server_id));
        Ok(())
    }
}

/// Picks the credential store entry matching a tracker's authentication
/// policy.
#[derive(Clone)]
pub struct CredentialResolver {
    store: Arc<dyn CredentialStore>,
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    pub fn resolve(
        &self,
        tracker: &BugTracker,
        user: &UserLogin,
    ) -> Result<Credentials, OwnershipError> {
        let scope = CredentialScope::for_policy(tracker.authentication_policy, user);
        self.store
            .find(&scope, tracker.id)?
            .ok_or_else(|| OwnershipError::NoCredentials {
                bugtracker: tracker.name.clone(),
            })
    }

    pub fn has_credentials(
        &self,
        tracker: &BugTracker,
        user: &UserLogin,
    ) -> Result<bool, OwnershipError> {
        let scope = CredentialScope::for_policy(tracker.authentication_policy, user);
        Ok(self.store.find(&scope, tracker.id)?.is_some())
    }

    pub fn store_app_level(
        &self,
        tracker: &BugTracker,
        credentials: Credentials,
    ) -> Result<(), OwnershipError> {
        ensure_policy(tracker, AuthenticationPolicy::ApplicationLevel)?;
        self.store
            .store(&CredentialScope::Application, tracker.id, credentials)
    }

    pub fn store_user(
        &self,
        tracker: &BugTracker,
        user: &UserLogin,
        credentials: Credentials,
    ) -> Result<(), OwnershipError> {
        ensure_policy(tracker, AuthenticationPolicy::User)?;
        self.store
            .store(&CredentialScope::User(user.clone()), tracker.id, credentials)
    }

    pub fn delete_app_level(&self, tracker: &BugTracker) -> Result<(), OwnershipError> {
        self.store.delete(&CredentialScope::Application, tracker.id)
    }

    pub fn delete_user(
        &self,
        tracker: &BugTracker,
        user: &UserLogin,
    ) -> Result<(), OwnershipError> {
        self.store
            .delete(&CredentialScope::User(user.clone()), tracker.id)
    }
}

fn ensure_policy(
    tracker: &BugTracker,
    attempted: AuthenticationPolicy,
) -> Result<(), OwnershipError> {
    if tracker.authentication_policy == attempted {
        return Ok(());
    }
    Err(OwnershipError::WrongAuthPolicy {
        bugtracker: tracker.name.clone(),
        expected: tracker.authentication_policy,
        attempted,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{CredentialResolver, CredentialScope, CredentialStore, InMemoryCredentialStore};
    use crate::test_support::stub_tracker;
    use ownership_domain::{AuthenticationPolicy, Credentials, OwnershipError, UserLogin};

    fn resolver() -> (CredentialResolver, Arc<InMemoryCredentialStore>) {
        let store = Arc::new(InMemoryCredentialStore::new());
        (CredentialResolver::new(store.clone()), store)
    }

    #[test]
    fn application_level_policy_reads_the_application_scope() {
        let (resolver, store) = resolver();
        let tracker = stub_tracker(3, "jira", AuthenticationPolicy::ApplicationLevel);
        store
            .store(
                &CredentialScope::Application,
                tracker.id,
                Credentials::token("app-token"),
            )
            .expect("store app credentials");

        let resolved = resolver
            .resolve(&tracker, &UserLogin::from("anyone"))
            .expect("resolve app credentials");
        assert_eq!(resolved, Credentials::token("app-token"));
    }

    #[test]
    fn application_level_policy_without_credentials_fails() {
        let (resolver, _) = resolver();
        let tracker = stub_tracker(3, "jira", AuthenticationPolicy::ApplicationLevel);

        let error = resolver
            .resolve(&tracker, &UserLogin::from("alice"))
            .expect_err("missing app credentials");
        assert_eq!(
            error,
            OwnershipError::NoCredentials {
                bugtracker: "jira".to_owned()
            }
        );
    }

    #[test]
    fn user_policy_reads_only_the_requesting_users_entry() {
        let (resolver, _) = resolver();
        let tracker = stub_tracker(4, "redmine", AuthenticationPolicy::User);
        resolver
            .store_user(
                &tracker,
                &UserLogin::from("alice"),
                Credentials::basic("alice", "pw"),
            )
            .expect("store user credentials");

        assert!(resolver
            .resolve(&tracker, &UserLogin::from("alice"))
            .is_ok());
        assert!(matches!(
            resolver.resolve(&tracker, &UserLogin::from("bob")),
            Err(OwnershipError::NoCredentials { .. })
        ));
    }

    #[test]
    fn storing_credentials_for_the_wrong_policy_is_rejected() {
        let (resolver, store) = resolver();
        let user_tracker = stub_tracker(5, "user-bt", AuthenticationPolicy::User);
        let app_tracker = stub_tracker(6, "app-bt", AuthenticationPolicy::ApplicationLevel);

        let error = resolver
            .store_app_level(&user_tracker, Credentials::token("t"))
            .expect_err("reject app credentials on user tracker");
        assert!(matches!(error, OwnershipError::WrongAuthPolicy { .. }));

        let error = resolver
            .store_user(&app_tracker, &UserLogin::from("alice"), Credentials::token("t"))
            .expect_err("reject user credentials on app tracker");
        assert!(matches!(error, OwnershipError::WrongAuthPolicy { .. }));

        assert!(store
            .find(&CredentialScope::Application, user_tracker.id)
            .expect("read store")
            .is_none());
    }

    #[test]
    fn delete_user_removes_only_that_users_entry() {
        let (resolver, _) = resolver();
        let tracker = stub_tracker(7, "redmine", AuthenticationPolicy::User);
        let alice = UserLogin::from("alice");
        let bob = UserLogin::from("bob");
        resolver
            .store_user(&tracker, &alice, Credentials::token("a"))
            .expect("store alice");
        resolver
            .store_user(&tracker, &bob, Credentials::token("b"))
            .expect("store bob");

        resolver.delete_user(&tracker, &alice).expect("delete alice");

        assert!(!resolver.has_credentials(&tracker, &alice).expect("check alice"));
        assert!(resolver.has_credentials(&tracker, &bob).expect("check bob"));
    }
}
