//! Collaborators of the deletion guard
//!
//! These traits abstract away the portal, allowing the guard to run against
//! HTTP-backed providers in production and in-memory ones in tests.

use nsguard_common::{Env, GuardError};

use crate::model::{AppRoleUsers, AssociatedNamespace, Namespace, User};

/// Identity of the current operator
#[async_trait::async_trait]
pub trait UserProvider: Send + Sync {
    /// Load the current user. Not cached across guard invocations.
    async fn load_current_user(&self) -> Result<User, GuardError>;
}

/// App role lookups
#[async_trait::async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Get the users holding the master role of an app
    async fn app_role_users(&self, app_id: &str) -> Result<AppRoleUsers, GuardError>;
}

/// Namespace lookups and the delete call
#[async_trait::async_trait]
pub trait NamespaceProvider: Send + Sync {
    /// Namespaces associated with the public namespace `namespace_name` of `app_id`
    async fn associated_namespaces(
        &self,
        app_id: &str,
        env: Env,
        namespace_name: &str,
    ) -> Result<Vec<AssociatedNamespace>, GuardError>;

    /// Delete a namespace instance
    ///
    /// Fails with `GuardError::DeletionRequestFailed` carrying the portal's message.
    async fn delete_namespace(
        &self,
        app_id: &str,
        env: Env,
        cluster_name: &str,
        namespace_name: &str,
    ) -> Result<(), GuardError>;
}

/// Builds the guard's input snapshot of a namespace
#[async_trait::async_trait]
pub trait NamespaceLoader: Send + Sync {
    async fn load_namespace(
        &self,
        app_id: &str,
        env: Env,
        cluster_name: &str,
        namespace_name: &str,
    ) -> Result<Namespace, GuardError>;
}

/// User-facing messages
pub trait NotificationSink: Send + Sync {
    fn success(&self, text: &str);

    fn error(&self, text: &str, title: &str);
}

/// Dialog display and view reload
pub trait Presentation: Send + Sync {
    /// Ask the operator to confirm deletion of `namespace`
    fn show_confirm_dialog(&self, namespace: &Namespace);

    /// Tear down and reload the current view
    fn reload(&self);
}
