// Portal payloads

use serde::Deserialize;

/// Identifiers of a namespace instance as returned by the portal
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceBaseInfo {
    pub app_id: String,
    pub cluster_name: String,
    pub namespace_name: String,
}

/// Namespace view returned by the portal
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceView {
    pub base_info: NamespaceBaseInfo,
    #[serde(default)]
    pub is_public: bool,
    /// Owner of the public namespace this one derives from
    #[serde(default)]
    pub parent_app_id: Option<String>,
}

impl NamespaceView {
    /// A public namespace owned by another app is linked into this one
    pub fn is_linked(&self) -> bool {
        self.is_public
            && self
                .parent_app_id
                .as_deref()
                .is_some_and(|parent| parent != self.base_info.app_id)
    }
}

/// Gray branch of a namespace
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchView {
    pub base_info: NamespaceBaseInfo,
    #[serde(default)]
    pub latest_release_id: Option<i64>,
}

/// Paged portal result; only the total is used
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub total: u32,
}

/// Error body of a failed portal call
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct PortalErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub exception: Option<String>,
}
