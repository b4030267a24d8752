//! Namespace deletion guard
//!
//! Runs the ordered safety checks that must all pass before a namespace may be
//! deleted:
//!
//! 1. the namespace is public
//! 2. the operator is a master of the app
//! 3. no instance uses the main branch (skippable)
//! 4. no instance uses the gray branch's latest release (skippable)
//! 5. linked namespaces stop here
//! 6. no other app is associated with the public namespace
//!
//! A failed stage short-circuits every later one. A passing run opens the
//! confirmation dialog; the delete itself only happens on `confirm`.

use std::collections::HashMap;
use std::sync::Arc;

use nsguard_common::{DELETE_FAILED_TITLE, GuardError};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::GuardConfig;
use crate::event::{EventBus, EventEnvelope, GuardEvent};
use crate::executor::DeleteExecutor;
use crate::model::{
    AbortContext, AbortReason, AssociatedNamespace, Namespace, NamespaceKey, PipelineOutcome,
    SkipCheck, SkipChecks,
};
use crate::provider::{
    NamespaceProvider, NotificationSink, PermissionProvider, Presentation, UserProvider,
};

/// Message shown when a private namespace is submitted
pub const NOT_PUBLIC_TEXT: &str = "A private namespace cannot be deleted";

/// Collaborators of the guard
#[derive(Clone)]
pub struct GuardProviders {
    pub users: Arc<dyn UserProvider>,
    pub permissions: Arc<dyn PermissionProvider>,
    pub namespaces: Arc<dyn NamespaceProvider>,
    pub notifier: Arc<dyn NotificationSink>,
    pub presentation: Arc<dyn Presentation>,
}

/// Result of the permission stage, local to one attempt
#[derive(Debug, Clone, Default)]
struct PermissionCheck {
    master_users: Vec<String>,
    is_app_master_user: bool,
}

/// Guards namespace deletion behind the safety checks
pub struct DeletionGuard {
    users: Arc<dyn UserProvider>,
    permissions: Arc<dyn PermissionProvider>,
    namespaces: Arc<dyn NamespaceProvider>,
    notifier: Arc<dyn NotificationSink>,
    presentation: Arc<dyn Presentation>,
    executor: DeleteExecutor,
    bus: EventBus,
    /// Namespaces whose confirmation dialog is open, as captured when it opened
    pending: Mutex<HashMap<NamespaceKey, Namespace>>,
}

impl DeletionGuard {
    pub fn new(providers: GuardProviders, config: &GuardConfig, bus: EventBus) -> Self {
        let executor = DeleteExecutor::new(
            providers.namespaces.clone(),
            providers.notifier.clone(),
            providers.presentation.clone(),
            config.reload_delay(),
        )
        .with_event_bus(bus.clone());

        Self {
            users: providers.users,
            permissions: providers.permissions,
            namespaces: providers.namespaces,
            notifier: providers.notifier,
            presentation: providers.presentation,
            executor,
            bus,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.bus
    }

    /// Namespace awaiting confirmation under `key`, if any
    pub fn pending(&self, key: &NamespaceKey) -> Option<Namespace> {
        self.pending.lock().get(key).cloned()
    }

    /// Run the checks for one deletion attempt
    ///
    /// Performs no side effect besides collaborator lookups. `Err` means a
    /// collaborator failed, never that a check rejected the namespace.
    pub async fn evaluate(
        &self,
        namespace: &Namespace,
        skip_checks: &SkipChecks,
    ) -> Result<PipelineOutcome, GuardError> {
        if !namespace.is_public {
            return Ok(PipelineOutcome::abort(
                AbortReason::NotPublic,
                AbortContext::None,
            ));
        }

        let permission = self.check_permission(namespace).await?;
        if !permission.is_app_master_user {
            return Ok(PipelineOutcome::abort(
                AbortReason::NoPermission,
                AbortContext::MasterUsers(permission.master_users),
            ));
        }

        if let Some(outcome) = check_master_instance(namespace, skip_checks) {
            return Ok(outcome);
        }

        if let Some(outcome) = check_branch_instance(namespace, skip_checks) {
            return Ok(outcome);
        }

        if namespace.is_linked_namespace {
            debug!("Linked namespace, association check not applicable");
            return Ok(PipelineOutcome::Proceed);
        }

        let associated = self.other_app_associations(namespace).await?;
        if !associated.is_empty() {
            return Ok(PipelineOutcome::abort(
                AbortReason::PublicNamespace,
                AbortContext::AssociatedNamespaces(associated),
            ));
        }

        Ok(PipelineOutcome::Proceed)
    }

    /// Handle a deletion request and deliver its outcome
    ///
    /// On success the confirmation dialog is shown. Rejections are announced
    /// on the bus; the private and permission rejections are also shown to the
    /// operator directly.
    pub async fn handle(
        &self,
        namespace: Namespace,
        skip_checks: Option<SkipChecks>,
    ) -> Result<PipelineOutcome, GuardError> {
        let skip_checks = skip_checks.unwrap_or_default();
        let span = info_span!(
            "delete_guard",
            attempt = %Uuid::new_v4(),
            namespace = %namespace.key()
        );

        async move {
            let key = namespace.key();
            self.pending.lock().remove(&key);
            self.bus.emit(GuardEvent::PipelineStarted {
                namespace: namespace.clone(),
            });

            match self.evaluate(&namespace, &skip_checks).await {
                Ok(PipelineOutcome::Proceed) => {
                    info!("All deletion checks passed");
                    self.pending.lock().insert(key, namespace.clone());
                    self.presentation.show_confirm_dialog(&namespace);
                    Ok(PipelineOutcome::Proceed)
                }
                Ok(PipelineOutcome::Abort { reason, context }) => {
                    warn!(reason = %reason, "Deletion refused");
                    self.notify_rejection(reason, &context);
                    self.bus.emit(GuardEvent::DeleteNamespaceFailed {
                        namespace,
                        reason,
                        context: context.clone(),
                    });
                    Ok(PipelineOutcome::Abort { reason, context })
                }
                Err(e) => {
                    error!(error = %e, "Deletion checks could not complete");
                    self.notifier.error(&e.to_string(), DELETE_FAILED_TITLE);
                    self.bus.emit(GuardEvent::PipelineErrored {
                        namespace,
                        message: e.to_string(),
                    });
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Delete the namespace whose confirmation dialog for `key` was answered
    ///
    /// Uses the namespace captured when that dialog opened. Fails with
    /// `IllegalArgument` when no dialog for `key` is open.
    pub async fn confirm(&self, key: &NamespaceKey) -> Result<(), GuardError> {
        let namespace = self.pending(key).ok_or_else(|| {
            GuardError::IllegalArgument(format!(
                "namespace '{}' is not pending confirmation",
                key
            ))
        })?;

        self.executor.execute(&namespace).await?;

        let mut pending = self.pending.lock();
        if pending.get(key) == Some(&namespace) {
            pending.remove(key);
        }
        Ok(())
    }

    /// Serve deletion requests from the bus one at a time until shutdown
    ///
    /// Subscribes before returning, so a request raised right after this call
    /// is served even if the returned future has not been polled yet.
    pub fn run(
        self: Arc<Self>,
        shutdown: broadcast::Receiver<()>,
    ) -> impl Future<Output = ()> + Send + 'static {
        let receiver = self.bus.subscribe();
        self.serve(receiver, shutdown)
    }

    async fn serve(
        self: Arc<Self>,
        mut receiver: broadcast::Receiver<EventEnvelope>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        info!("Deletion guard listening for delete requests");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Deletion guard shutting down");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(envelope) => {
                        if let GuardEvent::PreDeleteNamespace { namespace, skip_checks } =
                            envelope.event
                        {
                            // Outcome is delivered through the bus and collaborators
                            let _ = self.handle(namespace, skip_checks).await;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Deletion guard lagged behind the event bus");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
    }

    async fn check_permission(
        &self,
        namespace: &Namespace,
    ) -> Result<PermissionCheck, GuardError> {
        let current_user = self.users.load_current_user().await?;
        let role_users = self.permissions.app_role_users(&namespace.app_id).await?;

        let mut check = PermissionCheck::default();
        for user in role_users.master_users {
            if user.user_id == current_user.user_id {
                check.is_app_master_user = true;
            }
            check.master_users.push(user.user_id);
        }

        debug!(
            user = %current_user.user_id,
            is_master = check.is_app_master_user,
            "Permission checked"
        );
        Ok(check)
    }

    async fn other_app_associations(
        &self,
        namespace: &Namespace,
    ) -> Result<Vec<AssociatedNamespace>, GuardError> {
        let associated = self
            .namespaces
            .associated_namespaces(&namespace.app_id, namespace.env, &namespace.namespace_name)
            .await?;

        Ok(associated
            .into_iter()
            .filter(|ns| ns.app_id != namespace.app_id)
            .collect())
    }

    fn notify_rejection(&self, reason: AbortReason, context: &AbortContext) {
        match (reason, context) {
            (AbortReason::NotPublic, _) => {
                self.notifier.error(NOT_PUBLIC_TEXT, DELETE_FAILED_TITLE);
            }
            (AbortReason::NoPermission, AbortContext::MasterUsers(masters)) => {
                let text = format!(
                    "Only app masters can delete a namespace, please ask one of [{}]",
                    masters.join(", ")
                );
                self.notifier.error(&text, DELETE_FAILED_TITLE);
            }
            // Left to subscribers of the failure event
            _ => {}
        }
    }
}

fn check_master_instance(
    namespace: &Namespace,
    skip_checks: &SkipChecks,
) -> Option<PipelineOutcome> {
    if skip_checks.skips(SkipCheck::MasterInstance) || namespace.instances_count == 0 {
        return None;
    }
    Some(PipelineOutcome::abort(
        AbortReason::MasterInstance,
        AbortContext::SkipChecks(*skip_checks),
    ))
}

fn check_branch_instance(
    namespace: &Namespace,
    skip_checks: &SkipChecks,
) -> Option<PipelineOutcome> {
    if skip_checks.skips(SkipCheck::BranchInstance)
        || !namespace.has_branch()
        || namespace.branch_instances() == 0
    {
        return None;
    }
    Some(PipelineOutcome::abort(
        AbortReason::BranchInstance,
        AbortContext::SkipChecks(*skip_checks),
    ))
}
