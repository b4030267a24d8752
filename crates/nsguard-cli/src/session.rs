//! Interactive deletion session
//!
//! Raises a delete request on the guard's bus and reacts to what comes back:
//! instance warnings are put to the operator and re-submitted with the
//! matching override, associated namespaces are listed, and a passing run
//! is confirmed before the delete is sent.

use std::sync::Arc;

use anyhow::{Context, bail};
use nsguard_common::error::{
    ACCESS_DENIED, BRANCH_INSTANCE_BLOCKING, DELETE_IN_FLIGHT, DELETION_REQUEST_FAILED,
    MASTER_INSTANCE_BLOCKING, NAMESPACE_NOT_PUBLIC, PUBLIC_NAMESPACE_ASSOCIATED,
};
use nsguard_common::{Env, GuardError};
use nsguard_core::{
    AbortContext, AbortReason, DeletionGuard, GuardEvent, Namespace, NamespaceLoader,
    PipelineOutcome, SkipChecks,
};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::terminal::DialogSignal;

/// Operator interaction used by the session
#[async_trait::async_trait]
pub trait Prompt: Send + Sync {
    /// Ask a yes/no question
    ///
    /// Must not block the runtime: the session is raced against shutdown
    /// signals while a question is open.
    async fn confirm(&self, question: &str) -> bool;

    fn show(&self, text: &str);
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Deleted,
    /// The operator said no at the confirmation dialog
    Declined,
    /// The guard refused; carries the matching rejection error
    Refused(GuardError),
}

impl SessionOutcome {
    pub fn exit_status(&self) -> u8 {
        match self {
            SessionOutcome::Deleted => 0,
            SessionOutcome::Declined => 2,
            SessionOutcome::Refused(err) => exit_status(err),
        }
    }
}

/// Process exit status for a guard error, keyed by its error code
pub fn exit_status(err: &GuardError) -> u8 {
    match err.code().code {
        c if c == ACCESS_DENIED.code => 3,
        c if c == NAMESPACE_NOT_PUBLIC.code => 4,
        c if c == MASTER_INSTANCE_BLOCKING.code => 5,
        c if c == BRANCH_INSTANCE_BLOCKING.code => 6,
        c if c == PUBLIC_NAMESPACE_ASSOCIATED.code => 7,
        c if c == DELETION_REQUEST_FAILED.code => 8,
        c if c == DELETE_IN_FLIGHT.code => 9,
        _ => 1,
    }
}

pub struct DeleteSession {
    guard: Arc<DeletionGuard>,
    loader: Arc<dyn NamespaceLoader>,
    dialogs: mpsc::UnboundedReceiver<DialogSignal>,
    prompt: Arc<dyn Prompt>,
}

impl DeleteSession {
    pub fn new(
        guard: Arc<DeletionGuard>,
        loader: Arc<dyn NamespaceLoader>,
        dialogs: mpsc::UnboundedReceiver<DialogSignal>,
        prompt: Arc<dyn Prompt>,
    ) -> Self {
        Self {
            guard,
            loader,
            dialogs,
            prompt,
        }
    }

    /// Load the namespace from the portal and try to delete it
    pub async fn run(
        self,
        app_id: &str,
        env: Env,
        cluster_name: &str,
        namespace_name: &str,
    ) -> anyhow::Result<SessionOutcome> {
        let namespace = self
            .loader
            .load_namespace(app_id, env, cluster_name, namespace_name)
            .await
            .with_context(|| {
                format!(
                    "Failed to load namespace {} of app {} ({}, cluster {})",
                    namespace_name, app_id, env, cluster_name
                )
            })?;

        info!(
            namespace = %namespace.key(),
            public = namespace.is_public,
            linked = namespace.is_linked_namespace,
            instances = namespace.instances_count,
            "Loaded namespace"
        );
        self.submit(namespace).await
    }

    /// Try to delete an already loaded namespace
    ///
    /// The guard's request loop must be running.
    pub async fn submit(mut self, namespace: Namespace) -> anyhow::Result<SessionOutcome> {
        let key = namespace.key();
        let bus = self.guard.event_bus().clone();
        let mut events = bus.subscribe();
        bus.request_delete(namespace, None);

        loop {
            tokio::select! {
                signal = self.dialogs.recv() => match signal {
                    Some(DialogSignal::Confirm(namespace)) => {
                        let question = format!(
                            "Delete namespace {} of app {} ({}, cluster {})?",
                            namespace.namespace_name,
                            namespace.app_id,
                            namespace.env,
                            namespace.cluster_name
                        );
                        if !self.prompt.confirm(&question).await {
                            info!("Deletion declined by operator");
                            return Ok(SessionOutcome::Declined);
                        }
                        self.guard.confirm(&namespace.key()).await?;
                    }
                    Some(DialogSignal::Reloaded) => return Ok(SessionOutcome::Deleted),
                    None => bail!("Dialog channel closed"),
                },
                received = events.recv() => match received {
                    Ok(envelope) => match envelope.event {
                        GuardEvent::DeleteNamespaceFailed { namespace, reason, context }
                            if namespace.key() == key =>
                        {
                            match self.on_refused(&namespace, reason, &context).await {
                                Some(skip_checks) => {
                                    info!(reason = %reason, "Re-submitting with override");
                                    bus.request_delete(namespace, Some(skip_checks));
                                }
                                None => {
                                    let refusal = PipelineOutcome::abort(reason, context)
                                        .into_result(&key)
                                        .err()
                                        .unwrap_or_else(|| {
                                            GuardError::IllegalArgument(format!(
                                                "refusal without reason for '{}'",
                                                key
                                            ))
                                        });
                                    return Ok(SessionOutcome::Refused(refusal));
                                }
                            }
                        }
                        GuardEvent::PipelineErrored { namespace, message } if namespace.key() == key => {
                            bail!("Deletion checks failed: {}", message);
                        }
                        _ => {}
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Session lagged behind the event bus");
                    }
                    Err(RecvError::Closed) => bail!("Event bus closed"),
                },
            }
        }
    }

    /// React to a refusal; returns the overrides to retry with, if any
    async fn on_refused(
        &self,
        namespace: &Namespace,
        reason: AbortReason,
        context: &AbortContext,
    ) -> Option<SkipChecks> {
        match (reason.skip_check(), context) {
            (Some(check), AbortContext::SkipChecks(skip_checks)) => {
                let warning = match reason {
                    AbortReason::BranchInstance => format!(
                        "{} instance(s) use the latest gray release of {}; they fall back to the main branch once it is deleted.",
                        namespace.branch_instances(),
                        namespace.namespace_name
                    ),
                    _ => format!(
                        "{} instance(s) still use {}; they lose its configuration once it is deleted.",
                        namespace.instances_count, namespace.namespace_name
                    ),
                };
                self.prompt.show(&warning);
                self.prompt
                    .confirm("Delete anyway?")
                    .await
                    .then(|| skip_checks.with(check))
            }
            (_, AbortContext::AssociatedNamespaces(associated)) => {
                self.prompt.show(&format!(
                    "{} is still associated by other apps; delete their namespaces first:",
                    namespace.namespace_name
                ));
                for ns in associated {
                    self.prompt.show(&format!(
                        "  app {} cluster {} namespace {}",
                        ns.app_id, ns.cluster_name, ns.namespace_name
                    ));
                }
                None
            }
            // The guard already told the operator
            _ => None,
        }
    }
}
