//! Delete execution
//!
//! Issues the delete call for a namespace the operator has confirmed.
//! At most one delete per namespace is in flight at any time.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use nsguard_common::{DELETE_FAILED_TITLE, GuardError};
use tracing::{error, info, warn};

use crate::event::{EventBus, GuardEvent};
use crate::model::{Namespace, NamespaceKey};
use crate::provider::{NamespaceProvider, NotificationSink, Presentation};

/// Message shown after a successful delete
pub const DELETE_SUCCESS_TEXT: &str = "Deleted successfully";

/// Marks a namespace as being deleted until dropped
struct InFlightTicket<'a> {
    in_flight: &'a DashMap<NamespaceKey, ()>,
    key: NamespaceKey,
}

impl Drop for InFlightTicket<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.key);
    }
}

/// Runs confirmed deletions
pub struct DeleteExecutor {
    namespaces: Arc<dyn NamespaceProvider>,
    notifier: Arc<dyn NotificationSink>,
    presentation: Arc<dyn Presentation>,
    reload_delay: Duration,
    in_flight: DashMap<NamespaceKey, ()>,
    bus: Option<EventBus>,
}

impl DeleteExecutor {
    pub fn new(
        namespaces: Arc<dyn NamespaceProvider>,
        notifier: Arc<dyn NotificationSink>,
        presentation: Arc<dyn Presentation>,
        reload_delay: Duration,
    ) -> Self {
        Self {
            namespaces,
            notifier,
            presentation,
            reload_delay,
            in_flight: DashMap::new(),
            bus: None,
        }
    }

    /// Announce successful deletes on `bus`
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn is_in_flight(&self, key: &NamespaceKey) -> bool {
        self.in_flight.contains_key(key)
    }

    fn acquire(&self, key: &NamespaceKey) -> Result<InFlightTicket<'_>, GuardError> {
        if self.in_flight.insert(key.clone(), ()).is_some() {
            return Err(GuardError::DeleteInFlight(key.to_string()));
        }
        Ok(InFlightTicket {
            in_flight: &self.in_flight,
            key: key.clone(),
        })
    }

    /// Delete `namespace`, then notify and reload
    ///
    /// On failure the portal's message is shown and nothing is retried.
    pub async fn execute(&self, namespace: &Namespace) -> Result<(), GuardError> {
        let key = namespace.key();
        let _ticket = match self.acquire(&key) {
            Ok(ticket) => ticket,
            Err(e) => {
                warn!(namespace = %key, "Ignoring duplicate delete request");
                return Err(e);
            }
        };

        info!(namespace = %key, "Deleting namespace");

        let result = self
            .namespaces
            .delete_namespace(
                &namespace.app_id,
                namespace.env,
                &namespace.cluster_name,
                &namespace.namespace_name,
            )
            .await;

        match result {
            Ok(()) => {
                info!(namespace = %key, "Namespace deleted");
                self.notifier.success(DELETE_SUCCESS_TEXT);
                if let Some(bus) = &self.bus {
                    bus.emit(GuardEvent::NamespaceDeleted { key: key.clone() });
                }

                tokio::time::sleep(self.reload_delay).await;
                self.presentation.reload();
                Ok(())
            }
            Err(e) => {
                let (message, detail) = match e {
                    GuardError::DeletionRequestFailed { message, detail } => (message, detail),
                    other => (other.to_string(), None),
                };
                error!(namespace = %key, error = %message, "Failed to delete namespace");
                self.notifier.error(&message, DELETE_FAILED_TITLE);
                Err(GuardError::DeletionRequestFailed { message, detail })
            }
        }
    }
}
