//! Guard event bus
//!
//! Broadcasts deletion requests and pipeline results between components.

use chrono::{DateTime, Utc};
use nsguard_common::event_name;
use tokio::sync::broadcast;
use tracing::debug;

use crate::model::{AbortContext, AbortReason, Namespace, NamespaceKey, SkipChecks};

/// Events exchanged on the bus
#[derive(Debug, Clone)]
pub enum GuardEvent {
    /// An operator asked to delete a namespace
    PreDeleteNamespace {
        namespace: Namespace,
        skip_checks: Option<SkipChecks>,
    },
    /// The guard started checking a namespace
    PipelineStarted { namespace: Namespace },
    /// The guard refused a deletion
    DeleteNamespaceFailed {
        namespace: Namespace,
        reason: AbortReason,
        context: AbortContext,
    },
    /// A collaborator failed while the guard was checking
    PipelineErrored { namespace: Namespace, message: String },
    /// The namespace was deleted
    NamespaceDeleted { key: NamespaceKey },
}

impl GuardEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GuardEvent::PreDeleteNamespace { .. } => event_name::PRE_DELETE_NAMESPACE,
            GuardEvent::PipelineStarted { .. } => event_name::PIPELINE_STARTED,
            GuardEvent::DeleteNamespaceFailed { .. } => event_name::DELETE_NAMESPACE_FAILED,
            GuardEvent::PipelineErrored { .. } => event_name::PIPELINE_ERRORED,
            GuardEvent::NamespaceDeleted { .. } => event_name::NAMESPACE_DELETED,
        }
    }
}

/// An event with its emission time
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: GuardEvent,
}

/// Broadcast bus for guard events
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Having no subscriber is not an error.
    pub fn emit(&self, event: GuardEvent) {
        let name = event.name();
        let envelope = EventEnvelope {
            timestamp: Utc::now(),
            event,
        };
        match self.sender.send(envelope) {
            Ok(receivers) => debug!(event = name, receivers, "Event emitted"),
            Err(_) => debug!(event = name, "Event emitted without subscribers"),
        }
    }

    /// Raise a deletion request
    pub fn request_delete(&self, namespace: Namespace, skip_checks: Option<SkipChecks>) {
        self.emit(GuardEvent::PreDeleteNamespace {
            namespace,
            skip_checks,
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(nsguard_common::DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use nsguard_common::Env;

    use super::*;

    #[tokio::test]
    async fn test_emit_and_receive() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let ns = Namespace::new("app1", Env::Dev, "default", "ns");

        bus.request_delete(ns.clone(), None);

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.event.name(), "pre_delete_namespace");
        match envelope.event {
            GuardEvent::PreDeleteNamespace {
                namespace,
                skip_checks,
            } => {
                assert_eq!(namespace, ns);
                assert!(skip_checks.is_none());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::default();
        assert_eq!(bus.subscriber_count(), 0);
        bus.emit(GuardEvent::NamespaceDeleted {
            key: Namespace::new("app1", Env::Dev, "default", "ns").key(),
        });
    }

    #[tokio::test]
    async fn test_every_subscriber_sees_event() {
        let bus = EventBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        let ns = Namespace::new("app1", Env::Dev, "default", "ns");

        bus.emit(GuardEvent::PipelineStarted { namespace: ns });

        assert_eq!(a.recv().await.unwrap().event.name(), "pipeline_started");
        assert_eq!(b.recv().await.unwrap().event.name(), "pipeline_started");
    }
}
