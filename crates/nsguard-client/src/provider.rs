//! Portal-backed collaborators
//!
//! Implements every lookup the deletion guard needs on top of `PortalHttpClient`.

use nsguard_common::{Env, GuardError};
use nsguard_core::{
    AppRoleUsers, AssociatedNamespace, InstanceCount, Namespace, NamespaceBranch, NamespaceLoader,
    NamespaceProvider, PermissionProvider, User, UserProvider,
};
use serde::Serialize;
use tracing::debug;

use crate::config::PortalClientConfig;
use crate::constants::portal_api_path;
use crate::error::PortalError;
use crate::http::PortalHttpClient;
use crate::model::{BranchView, NamespaceView, Page};

/// Portal providers for the deletion guard
pub struct PortalProviders {
    http_client: PortalHttpClient,
}

impl PortalProviders {
    pub fn new(config: PortalClientConfig) -> Result<Self, PortalError> {
        Ok(Self {
            http_client: PortalHttpClient::new(config)?,
        })
    }

    /// Create from a single portal address
    pub fn from_server_addr(addr: &str, access_token: Option<&str>) -> Result<Self, PortalError> {
        let mut config = PortalClientConfig::new(addr);
        config.access_token = access_token.map(str::to_string);
        Self::new(config)
    }

    async fn instance_count(
        &self,
        app_id: &str,
        env: &str,
        cluster_name: &str,
        namespace_name: &str,
    ) -> Result<u32, PortalError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Query<'a> {
            app_id: &'a str,
            cluster_name: &'a str,
            namespace_name: &'a str,
        }

        self.http_client
            .get_with_query(
                &portal_api_path::instance_count_by_namespace(env),
                &Query {
                    app_id,
                    cluster_name,
                    namespace_name,
                },
            )
            .await
    }

    async fn branch(
        &self,
        app_id: &str,
        env: &str,
        cluster_name: &str,
        namespace_name: &str,
    ) -> Result<Option<NamespaceBranch>, PortalError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Query {
            release_id: i64,
            page: u32,
            size: u32,
        }

        let branch: Option<BranchView> = self
            .http_client
            .get_optional(&portal_api_path::namespace_branch(
                app_id,
                env,
                cluster_name,
                namespace_name,
            ))
            .await?;
        let Some(branch) = branch else {
            return Ok(None);
        };

        let total = match branch.latest_release_id {
            Some(release_id) => {
                let page: Page = self
                    .http_client
                    .get_with_query(
                        &portal_api_path::instances_by_release(env),
                        &Query {
                            release_id,
                            page: 0,
                            size: 1,
                        },
                    )
                    .await?;
                page.total
            }
            // Never released, so no instance can use it
            None => 0,
        };

        Ok(Some(NamespaceBranch {
            branch_name: branch.base_info.cluster_name,
            latest_release_instances: InstanceCount { total },
        }))
    }
}

#[async_trait::async_trait]
impl UserProvider for PortalProviders {
    async fn load_current_user(&self) -> Result<User, GuardError> {
        Ok(self.http_client.get(&portal_api_path::current_user()).await?)
    }
}

#[async_trait::async_trait]
impl PermissionProvider for PortalProviders {
    async fn app_role_users(&self, app_id: &str) -> Result<AppRoleUsers, GuardError> {
        Ok(self
            .http_client
            .get(&portal_api_path::app_role_users(app_id))
            .await?)
    }
}

#[async_trait::async_trait]
impl NamespaceProvider for PortalProviders {
    async fn associated_namespaces(
        &self,
        app_id: &str,
        env: Env,
        namespace_name: &str,
    ) -> Result<Vec<AssociatedNamespace>, GuardError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Query<'a> {
            app_id: &'a str,
        }

        let associated: Vec<AssociatedNamespace> = self
            .http_client
            .get_with_query(
                &portal_api_path::associated_namespaces(env.as_str(), namespace_name),
                &Query { app_id },
            )
            .await?;
        debug!(
            app_id,
            namespace = namespace_name,
            count = associated.len(),
            "Loaded associated namespaces"
        );
        Ok(associated)
    }

    async fn delete_namespace(
        &self,
        app_id: &str,
        env: Env,
        cluster_name: &str,
        namespace_name: &str,
    ) -> Result<(), GuardError> {
        self.http_client
            .delete(&portal_api_path::namespace(
                app_id,
                env.as_str(),
                cluster_name,
                namespace_name,
            ))
            .await
            .map_err(PortalError::into_deletion_failure)
    }
}

#[async_trait::async_trait]
impl NamespaceLoader for PortalProviders {
    async fn load_namespace(
        &self,
        app_id: &str,
        env: Env,
        cluster_name: &str,
        namespace_name: &str,
    ) -> Result<Namespace, GuardError> {
        let env_name = env.as_str();
        let view: NamespaceView = self
            .http_client
            .get(&portal_api_path::namespace(
                app_id,
                env_name,
                cluster_name,
                namespace_name,
            ))
            .await?;
        let instances_count = self
            .instance_count(app_id, env_name, cluster_name, namespace_name)
            .await?;
        let branch = self
            .branch(app_id, env_name, cluster_name, namespace_name)
            .await?;

        Ok(Namespace {
            is_public: view.is_public,
            is_linked_namespace: view.is_linked(),
            app_id: view.base_info.app_id,
            env,
            cluster_name: view.base_info.cluster_name,
            namespace_name: view.base_info.namespace_name,
            instances_count,
            branch,
        })
    }
}
