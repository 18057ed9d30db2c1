// ── Domain model ──
//
// The console's wire types ARE the domain types -- the backend JSON maps
// 1:1 onto what the mirror stores -- so this module re-exports them from
// `modelfs-api` and adds the identity-key trait the mirror reconciles on.

pub use modelfs_api::types::{
    DatasetSummary, ErrorBanner, EventAction, ItemList, ModelDetail, ModelRequest,
    ModelSourceDetail, ModelSourceRequest, ModelSourceSummary, ModelSummary, ModelVersionSpec,
    ModelVersionView, NamespaceInfo, Phase, ResourcePayload, SecretValidation, StreamEvent,
};

/// Identity key access for mirrored records.
///
/// Every record's identity is the `(namespace, name)` pair -- immutable
/// once created; collections hold at most one record per key.
pub trait Keyed {
    fn namespace(&self) -> &str;
    fn name(&self) -> &str;

    /// Whether this record's identity key matches `(namespace, name)`.
    fn key_matches(&self, namespace: &str, name: &str) -> bool {
        self.namespace() == namespace && self.name() == name
    }
}

impl Keyed for ModelSummary {
    fn namespace(&self) -> &str {
        &self.namespace
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl Keyed for ModelSourceSummary {
    fn namespace(&self) -> &str {
        &self.namespace
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl Keyed for DatasetSummary {
    fn namespace(&self) -> &str {
        &self.namespace
    }
    fn name(&self) -> &str {
        &self.name
    }
}
