//! Guarded namespace deletion
//!
//! This crate checks whether a configuration namespace may be deleted and,
//! once an operator confirms, deletes it:
//! - `guard`: the ordered check pipeline and its result delivery
//! - `executor`: the single-flight delete call
//! - `event`: the bus announcing requests and outcomes
//! - `provider`: collaborator traits (portal lookups, notifications, dialogs)

pub mod config;
pub mod event;
pub mod executor;
pub mod guard;
pub mod model;
pub mod provider;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::GuardConfig;
pub use event::{EventBus, EventEnvelope, GuardEvent};
pub use executor::{DELETE_SUCCESS_TEXT, DeleteExecutor};
pub use guard::{DeletionGuard, GuardProviders, NOT_PUBLIC_TEXT};
pub use model::{
    AbortContext, AbortReason, AppRoleUsers, AssociatedNamespace, InstanceCount, Namespace,
    NamespaceBranch, NamespaceKey, PipelineOutcome, SkipCheck, SkipChecks, User,
};
pub use provider::{
    NamespaceLoader, NamespaceProvider, NotificationSink, PermissionProvider, Presentation,
    UserProvider,
};
