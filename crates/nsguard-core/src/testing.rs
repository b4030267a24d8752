//! In-memory collaborators for unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use nsguard_common::{Env, GuardError};
use parking_lot::Mutex;

use crate::model::{AppRoleUsers, AssociatedNamespace, Namespace, User};
use crate::provider::{
    NamespaceProvider, NotificationSink, PermissionProvider, Presentation, UserProvider,
};

/// Portal stand-in that counts every call
pub struct MockPortal {
    pub current_user: Result<User, GuardError>,
    pub master_users: Vec<String>,
    pub associated: Vec<AssociatedNamespace>,
    pub associated_error: Option<GuardError>,
    pub delete_result: Result<(), GuardError>,
    pub delete_latency: Option<Duration>,
    pub user_calls: AtomicUsize,
    pub role_calls: AtomicUsize,
    pub associated_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    /// Names of deleted namespaces, in call order
    pub deleted: Mutex<Vec<String>>,
}

impl MockPortal {
    /// Portal where `user` is the current operator and the only master of every app
    pub fn with_master(user: &str) -> Self {
        Self {
            current_user: Ok(User::new(user)),
            master_users: vec![user.to_string()],
            associated: Vec::new(),
            associated_error: None,
            delete_result: Ok(()),
            delete_latency: None,
            user_calls: AtomicUsize::new(0),
            role_calls: AtomicUsize::new(0),
            associated_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub fn masters(mut self, users: &[&str]) -> Self {
        self.master_users = users.iter().map(|u| u.to_string()).collect();
        self
    }

    pub fn associated(mut self, app_ids: &[&str]) -> Self {
        self.associated = app_ids
            .iter()
            .enumerate()
            .map(|(i, app_id)| AssociatedNamespace {
                app_id: app_id.to_string(),
                cluster_name: format!("cluster-{}", i),
                namespace_name: "TEST1.common".to_string(),
            })
            .collect();
        self
    }

    pub fn total_calls(&self) -> usize {
        self.user_calls.load(Ordering::SeqCst)
            + self.role_calls.load(Ordering::SeqCst)
            + self.associated_calls.load(Ordering::SeqCst)
            + self.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl UserProvider for MockPortal {
    async fn load_current_user(&self) -> Result<User, GuardError> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        self.current_user.clone()
    }
}

#[async_trait::async_trait]
impl PermissionProvider for MockPortal {
    async fn app_role_users(&self, app_id: &str) -> Result<AppRoleUsers, GuardError> {
        self.role_calls.fetch_add(1, Ordering::SeqCst);
        Ok(AppRoleUsers {
            app_id: app_id.to_string(),
            master_users: self.master_users.iter().map(|u| User::new(u)).collect(),
        })
    }
}

#[async_trait::async_trait]
impl NamespaceProvider for MockPortal {
    async fn associated_namespaces(
        &self,
        _app_id: &str,
        _env: Env,
        _namespace_name: &str,
    ) -> Result<Vec<AssociatedNamespace>, GuardError> {
        self.associated_calls.fetch_add(1, Ordering::SeqCst);
        match &self.associated_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.associated.clone()),
        }
    }

    async fn delete_namespace(
        &self,
        _app_id: &str,
        _env: Env,
        _cluster_name: &str,
        namespace_name: &str,
    ) -> Result<(), GuardError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.deleted.lock().push(namespace_name.to_string());
        if let Some(latency) = self.delete_latency {
            tokio::time::sleep(latency).await;
        }
        self.delete_result.clone()
    }
}

/// Notification sink that records every message
#[derive(Default)]
pub struct RecordingNotifier {
    pub successes: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<(String, String)>>,
}

impl NotificationSink for RecordingNotifier {
    fn success(&self, text: &str) {
        self.successes.lock().push(text.to_string());
    }

    fn error(&self, text: &str, title: &str) {
        self.errors.lock().push((text.to_string(), title.to_string()));
    }
}

/// Presentation layer that records dialogs and reloads
#[derive(Default)]
pub struct RecordingPresentation {
    pub dialogs: Mutex<Vec<Namespace>>,
    pub reloads: AtomicUsize,
}

impl Presentation for RecordingPresentation {
    fn show_confirm_dialog(&self, namespace: &Namespace) {
        self.dialogs.lock().push(namespace.clone());
    }

    fn reload(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }
}

/// Public, non-linked namespace with no instances
pub fn public_namespace() -> Namespace {
    let mut ns = Namespace::new("app1", Env::Dev, "default", "TEST1.common");
    ns.is_public = true;
    ns
}
