use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ownership_config::RemoteRuntimeConfig;
use ownership_domain::{
    Attachment, BugTracker, BugTrackerStatus, Credentials, Locale, OwnershipError, RemoteIssue,
    RemoteIssueDraft, RemoteProject, RequestContext, UserLogin,
};
use tracing::{debug, warn};

use crate::connector::{BugTrackerConnector, ConnectorError};
use crate::credentials::CredentialResolver;
use crate::registry::ConnectorFactory;

/// Per-call state moved into the spawned remote task. It is consumed by the
/// task, so nothing outlives the call that needed it.
struct CallScope {
    locale: Locale,
    credentials: Credentials,
}

/// Entry point for every remote tracker operation.
///
/// Each call builds a fresh connector, resolves credentials according to the
/// tracker's policy and checks protocol support before anything goes over the
/// wire. The remote part then runs in its own task bounded by the configured
/// deadline.
#[derive(Clone)]
pub struct RemoteTrackerGateway {
    connectors: Arc<dyn ConnectorFactory>,
    resolver: CredentialResolver,
    fetch_timeout: Duration,
}

impl RemoteTrackerGateway {
    pub fn new(
        connectors: Arc<dyn ConnectorFactory>,
        resolver: CredentialResolver,
        config: RemoteRuntimeConfig,
    ) -> Self {
        Self {
            connectors,
            resolver,
            fetch_timeout: config.fetch_timeout,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    pub fn resolver(&self) -> &CredentialResolver {
        &self.resolver
    }

    /// Fetches the live representation of `remote_ids`. Every failure past
    /// credential resolution surfaces as [`OwnershipError::RemoteTracker`].
    pub async fn get_issues(
        &self,
        remote_ids: Vec<String>,
        tracker: &BugTracker,
        ctx: &RequestContext,
    ) -> Result<Vec<RemoteIssue>, OwnershipError> {
        if remote_ids.is_empty() {
            return Ok(Vec::new());
        }
        let requested = remote_ids.len();
        let issues = self
            .run_bounded(tracker, ctx, "get_issues", move |connector| async move {
                connector.find_issues(&remote_ids).await
            })
            .await
            .map_err(|error| match error {
                OwnershipError::RemoteTracker(_) => error,
                error if error.is_fail_fast() => error,
                other => OwnershipError::remote(format!(
                    "fetching issues from bugtracker `{}` failed: {other}",
                    tracker.name
                )),
            })?;
        debug!(
            tracker = %tracker.name,
            requested,
            received = issues.len(),
            "fetched remote issues"
        );
        Ok(issues)
    }

    pub async fn find_by_key(
        &self,
        key: &str,
        tracker: &BugTracker,
        ctx: &RequestContext,
    ) -> Result<RemoteIssue, OwnershipError> {
        let key = key.to_owned();
        self.run_bounded(tracker, ctx, "find_by_key", move |connector| async move {
            connector.find_issue(&key).await
        })
        .await
    }

    /// Creates the issue remotely, then forwards the draft's attachments to
    /// it within the same bounded call.
    pub async fn create_issue(
        &self,
        mut draft: RemoteIssueDraft,
        tracker: &BugTracker,
        ctx: &RequestContext,
    ) -> Result<RemoteIssue, OwnershipError> {
        let attachments = std::mem::take(&mut draft.attachments);
        self.run_bounded(tracker, ctx, "create_issue", move |connector| async move {
            let created = connector.create_issue(draft).await?;
            if !attachments.is_empty() {
                connector
                    .forward_attachments(&created.key, attachments)
                    .await?;
            }
            Ok::<_, ConnectorError>(created)
        })
        .await
    }

    pub async fn forward_attachments(
        &self,
        issue_key: &str,
        attachments: Vec<Attachment>,
        tracker: &BugTracker,
        ctx: &RequestContext,
    ) -> Result<(), OwnershipError> {
        if attachments.is_empty() {
            return Ok(());
        }
        let issue_key = issue_key.to_owned();
        self.run_bounded(
            tracker,
            ctx,
            "forward_attachments",
            move |connector| async move {
                connector
                    .forward_attachments(&issue_key, attachments)
                    .await
            },
        )
        .await
    }

    pub async fn find_remote_project(
        &self,
        name_or_id: &str,
        tracker: &BugTracker,
        ctx: &RequestContext,
    ) -> Result<RemoteProject, OwnershipError> {
        let name_or_id = name_or_id.to_owned();
        self.run_bounded(
            tracker,
            ctx,
            "find_remote_project",
            move |connector| async move { connector.find_project(&name_or_id).await },
        )
        .await
    }

    /// Asks the tracker whether `credentials` would be accepted. Nothing is
    /// stored.
    pub async fn validate_credentials(
        &self,
        tracker: &BugTracker,
        credentials: Credentials,
    ) -> Result<(), OwnershipError> {
        let connector = self.connectors.build(tracker)?;
        ensure_protocol(connector.as_ref(), tracker, &credentials)?;
        let owned_tracker = tracker.clone();
        let task = tokio::spawn(async move {
            connector
                .check_credentials(&credentials)
                .await
                .map_err(|error| error.into_ownership_error(&owned_tracker))
        });
        self.await_bounded(task, tracker, "validate_credentials")
            .await
    }

    /// Local readiness check; never calls the tracker.
    pub fn status(
        &self,
        tracker: Option<&BugTracker>,
        user: &UserLogin,
    ) -> Result<BugTrackerStatus, OwnershipError> {
        let Some(tracker) = tracker else {
            return Ok(BugTrackerStatus::Undefined);
        };
        if self.resolver.has_credentials(tracker, user)? {
            Ok(BugTrackerStatus::Ready)
        } else {
            Ok(BugTrackerStatus::NeedsCredentials)
        }
    }

    fn prepare(
        &self,
        tracker: &BugTracker,
        ctx: &RequestContext,
    ) -> Result<(Box<dyn BugTrackerConnector>, CallScope), OwnershipError> {
        let connector = self.connectors.build(tracker)?;
        let credentials = self.resolver.resolve(tracker, &ctx.user)?;
        ensure_protocol(connector.as_ref(), tracker, &credentials)?;
        Ok((
            connector,
            CallScope {
                locale: ctx.locale.clone(),
                credentials,
            },
        ))
    }

    async fn run_bounded<T, F, Fut>(
        &self,
        tracker: &BugTracker,
        ctx: &RequestContext,
        operation: &'static str,
        call: F,
    ) -> Result<T, OwnershipError>
    where
        T: Send + 'static,
        F: FnOnce(Box<dyn BugTrackerConnector>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ConnectorError>> + Send + 'static,
    {
        let (mut connector, scope) = self.prepare(tracker, ctx)?;
        let owned_tracker = tracker.clone();
        let task = tokio::spawn(async move {
            let CallScope {
                locale,
                credentials,
            } = scope;
            connector.set_locale(&locale);
            let authenticated = connector.authenticate(&credentials).await;
            drop(credentials);
            if let Err(error) = authenticated {
                return Err(error.into_ownership_error(&owned_tracker));
            }
            call(connector)
                .await
                .map_err(|error| error.into_ownership_error(&owned_tracker))
        });
        self.await_bounded(task, tracker, operation).await
    }

    async fn await_bounded<T>(
        &self,
        mut task: tokio::task::JoinHandle<Result<T, OwnershipError>>,
        tracker: &BugTracker,
        operation: &'static str,
    ) -> Result<T, OwnershipError> {
        match tokio::time::timeout(self.fetch_timeout, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => {
                warn!(
                    tracker = %tracker.name,
                    operation,
                    error = %join_error,
                    "remote bugtracker task did not complete"
                );
                Err(OwnershipError::remote(format!(
                    "{operation} on bugtracker `{}` did not complete: {join_error}",
                    tracker.name
                )))
            }
            Err(_) => {
                task.abort();
                warn!(
                    tracker = %tracker.name,
                    operation,
                    timeout_secs = self.fetch_timeout.as_secs(),
                    "remote bugtracker call timed out"
                );
                Err(OwnershipError::remote(format!(
                    "{operation} on bugtracker `{}` timed out after {}s",
                    tracker.name,
                    self.fetch_timeout.as_secs()
                )))
            }
        }
    }
}

fn ensure_protocol(
    connector: &dyn BugTrackerConnector,
    tracker: &BugTracker,
    credentials: &Credentials,
) -> Result<(), OwnershipError> {
    let protocol = credentials.protocol();
    if connector.supports(protocol) {
        Ok(())
    } else {
        Err(OwnershipError::UnsupportedAuthProtocol {
            bugtracker: tracker.name.clone(),
            protocol,
        })
    }
}
