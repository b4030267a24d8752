//! Namespace deletion models
//!
//! Inputs, intermediate records and outcomes of the deletion guard.

use std::fmt;

use nsguard_common::{Env, GuardError};
use serde::{Deserialize, Serialize};

/// Instance count of a release
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceCount {
    pub total: u32,
}

/// Gray (canary) branch of a namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceBranch {
    /// Branch cluster name
    pub branch_name: String,
    /// Instances on the branch's latest release
    #[serde(default)]
    pub latest_release_instances: InstanceCount,
}

/// A namespace submitted for deletion
///
/// Supplied fresh on every attempt; the guard never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    pub app_id: String,
    pub env: Env,
    pub cluster_name: String,
    pub namespace_name: String,
    pub is_public: bool,
    /// Inherited from a public namespace of another app
    #[serde(default)]
    pub is_linked_namespace: bool,
    /// Instances using the main branch
    #[serde(default)]
    pub instances_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<NamespaceBranch>,
}

impl Namespace {
    /// Create a private namespace with no instances and no branch
    pub fn new(app_id: &str, env: Env, cluster_name: &str, namespace_name: &str) -> Self {
        Self {
            app_id: app_id.to_string(),
            env,
            cluster_name: cluster_name.to_string(),
            namespace_name: namespace_name.to_string(),
            is_public: false,
            is_linked_namespace: false,
            instances_count: 0,
            branch: None,
        }
    }

    pub fn has_branch(&self) -> bool {
        self.branch.is_some()
    }

    /// Instances on the gray branch's latest release, zero without a branch
    pub fn branch_instances(&self) -> u32 {
        self.branch
            .as_ref()
            .map(|b| b.latest_release_instances.total)
            .unwrap_or(0)
    }

    pub fn key(&self) -> NamespaceKey {
        NamespaceKey {
            app_id: self.app_id.clone(),
            env: self.env,
            cluster_name: self.cluster_name.clone(),
            namespace_name: self.namespace_name.clone(),
        }
    }
}

/// Identity of a namespace instance (app + env + cluster + namespace)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceKey {
    pub app_id: String,
    pub env: Env,
    pub cluster_name: String,
    pub namespace_name: String,
}

impl fmt::Display for NamespaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}+{}+{}+{}",
            self.app_id, self.env, self.cluster_name, self.namespace_name
        )
    }
}

/// A check the operator may explicitly override after being warned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipCheck {
    MasterInstance,
    BranchInstance,
}

/// Overrides granted for one deletion attempt
///
/// Accepts the portal's `{"skipCheckMasterInstance": true}` shape and rejects
/// any other key. Authorization checks have no override.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SkipChecks {
    #[serde(default)]
    pub skip_check_master_instance: bool,
    #[serde(default)]
    pub skip_check_branch_instance: bool,
}

impl SkipChecks {
    pub fn none() -> Self {
        Self::default()
    }

    /// Grant one more override
    pub fn with(mut self, check: SkipCheck) -> Self {
        match check {
            SkipCheck::MasterInstance => self.skip_check_master_instance = true,
            SkipCheck::BranchInstance => self.skip_check_branch_instance = true,
        }
        self
    }

    pub fn skips(&self, check: SkipCheck) -> bool {
        match check {
            SkipCheck::MasterInstance => self.skip_check_master_instance,
            SkipCheck::BranchInstance => self.skip_check_branch_instance,
        }
    }

    /// Parse a skip list, rejecting unknown check names
    pub fn from_json(value: serde_json::Value) -> Result<Self, GuardError> {
        serde_json::from_value(value).map_err(|e| GuardError::IllegalArgument(e.to_string()))
    }
}

/// Operator identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl User {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            name: None,
            email: None,
        }
    }
}

/// Users holding the master role of an app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRoleUsers {
    pub app_id: String,
    #[serde(default)]
    pub master_users: Vec<User>,
}

/// A namespace of some app linked to a public namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociatedNamespace {
    pub app_id: String,
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub namespace_name: String,
}

/// Why a deletion attempt was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    NotPublic,
    NoPermission,
    MasterInstance,
    BranchInstance,
    PublicNamespace,
}

impl AbortReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbortReason::NotPublic => "not_public",
            AbortReason::NoPermission => "no_permission",
            AbortReason::MasterInstance => "master_instance",
            AbortReason::BranchInstance => "branch_instance",
            AbortReason::PublicNamespace => "public_namespace",
        }
    }

    /// The override that lifts this rejection, if one exists
    pub fn skip_check(&self) -> Option<SkipCheck> {
        match self {
            AbortReason::MasterInstance => Some(SkipCheck::MasterInstance),
            AbortReason::BranchInstance => Some(SkipCheck::BranchInstance),
            _ => None,
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Data a caller needs to react to a rejection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortContext {
    None,
    /// Master user ids in role order
    MasterUsers(Vec<String>),
    /// The skip list of the attempt, for a retry with one more override
    SkipChecks(SkipChecks),
    /// Associated namespaces owned by other apps, in lookup order
    AssociatedNamespaces(Vec<AssociatedNamespace>),
}

/// Result of one guard pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Proceed,
    Abort {
        reason: AbortReason,
        context: AbortContext,
    },
}

impl PipelineOutcome {
    pub fn abort(reason: AbortReason, context: AbortContext) -> Self {
        PipelineOutcome::Abort { reason, context }
    }

    pub fn is_proceed(&self) -> bool {
        matches!(self, PipelineOutcome::Proceed)
    }

    pub fn reason(&self) -> Option<AbortReason> {
        match self {
            PipelineOutcome::Proceed => None,
            PipelineOutcome::Abort { reason, .. } => Some(*reason),
        }
    }

    /// Convert a rejection into the matching `GuardError`
    pub fn into_result(self, key: &NamespaceKey) -> Result<(), GuardError> {
        let PipelineOutcome::Abort { reason, context } = self else {
            return Ok(());
        };
        let err = match (reason, context) {
            (AbortReason::NotPublic, _) => GuardError::NotPublic(key.to_string()),
            (AbortReason::NoPermission, AbortContext::MasterUsers(users)) => {
                GuardError::NoPermission(users)
            }
            (AbortReason::NoPermission, _) => GuardError::NoPermission(Vec::new()),
            (AbortReason::MasterInstance, _) => GuardError::MasterInstanceBlocking(key.to_string()),
            (AbortReason::BranchInstance, _) => GuardError::BranchInstanceBlocking(key.to_string()),
            (AbortReason::PublicNamespace, AbortContext::AssociatedNamespaces(namespaces)) => {
                GuardError::PublicNamespaceAssociated(
                    namespaces.into_iter().map(|ns| ns.app_id).collect(),
                )
            }
            (AbortReason::PublicNamespace, _) => GuardError::PublicNamespaceAssociated(Vec::new()),
        };
        Err(err)
    }
}
