// Wire types for the modelfs console API.
//
// Field names and casing follow the backend JSON exactly -- the
// `(namespace, name)` pair on every resource payload is the identity key
// the mirror reconciles on, so those two field names are a wire contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Envelopes ────────────────────────────────────────────────────────

/// Every list endpoint returns `{ "items": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemList<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

// ── Phase ────────────────────────────────────────────────────────────

/// Lifecycle phase reported for models and datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Ready,
    Pending,
    Processing,
    Failed,
    /// Catch-all for phases this client doesn't know about.
    #[serde(other)]
    Unknown,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Failed => "FAILED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Resource summaries ───────────────────────────────────────────────

/// One row of the models collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    pub name: String,
    pub namespace: String,
    pub source_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub versions_ready: u32,
    pub versions_total: u32,
    pub last_sync_time: DateTime<Utc>,
    pub status: Phase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconcile_message: Option<String>,
}

/// One row of the model sources collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSourceSummary {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<String>,
    pub credentials_ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_models: Option<Vec<String>>,
    pub last_checked: DateTime<Utc>,
}

/// One row of the datasets collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub name: String,
    pub namespace: String,
    pub phase: Phase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pvc_name: Option<String>,
    pub last_sync: DateTime<Utc>,
}

/// A transient advisory banner. No identity key -- always replaced
/// wholesale on refresh, never patched by the event feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBanner {
    pub namespace: String,
    pub message: String,
    pub reason: String,
    pub retry_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceInfo {
    pub name: String,
}

// ── Detail / mutation types ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelVersionView {
    pub name: String,
    pub repo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<String>,
    pub desired_state: String,
    pub share_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_policy: Option<String>,
    pub dataset_phase: Phase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pvc_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDetail {
    pub summary: ModelSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "logoURL", skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub versions: Vec<ModelVersionView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_targets: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions_json: Option<String>,
}

/// Full model source record as returned by the detail endpoint.
/// The spec is backend-defined and opaque to this client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSourceDetail {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub spec: serde_json::Value,
}

/// Version entry in a model create/update request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelVersionSpec {
    pub name: String,
    pub repo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_enabled: Option<bool>,
}

/// Body for `POST /api/models` and `PUT /api/models/{ns}/{name}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRequest {
    pub name: String,
    pub namespace: String,
    pub source_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub versions: Vec<ModelVersionSpec>,
}

/// Body for `POST /api/modelsources` and `PUT /api/modelsources/{ns}/{name}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSourceRequest {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<std::collections::HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretValidation {
    pub ready: bool,
    pub message: String,
}

// ── Event feed ───────────────────────────────────────────────────────

/// Change kind carried by an event frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    Added,
    Modified,
    Deleted,
}

/// The record a frame's payload refers to, tagged by resource kind.
#[derive(Debug, Clone)]
pub enum ResourcePayload {
    Model(ModelSummary),
    ModelSource(ModelSourceSummary),
    Dataset(DatasetSummary),
}

impl ResourcePayload {
    pub fn namespace(&self) -> &str {
        match self {
            Self::Model(m) => &m.namespace,
            Self::ModelSource(s) => &s.namespace,
            Self::Dataset(d) => &d.namespace,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Model(m) => &m.name,
            Self::ModelSource(s) => &s.name,
            Self::Dataset(d) => &d.name,
        }
    }

    /// Resource tag as it appears on the wire.
    pub fn resource(&self) -> &'static str {
        match self {
            Self::Model(_) => "models",
            Self::ModelSource(_) => "modelsources",
            Self::Dataset(_) => "datasets",
        }
    }
}

/// A fully decoded event frame, ready for reconciliation.
#[derive(Debug, Clone)]
pub struct StreamEvent {
    pub action: EventAction,
    pub payload: ResourcePayload,
}

/// Raw wire shape of an event frame: `{resource, action, payload}`.
#[derive(Debug, Deserialize)]
struct WireFrame {
    resource: String,
    action: String,
    payload: serde_json::Value,
}

impl StreamEvent {
    /// Decode one frame's data field.
    ///
    /// Returns `None` for malformed JSON, unknown resource/action tags,
    /// or a payload that doesn't match its resource's schema. Dropping
    /// those here keeps the reconcile match exhaustive over known kinds.
    pub fn decode(data: &str) -> Option<Self> {
        let frame: WireFrame = serde_json::from_str(data).ok()?;

        let action = match frame.action.as_str() {
            "added" => EventAction::Added,
            "modified" => EventAction::Modified,
            "deleted" => EventAction::Deleted,
            _ => return None,
        };

        let payload = match frame.resource.as_str() {
            "models" => ResourcePayload::Model(serde_json::from_value(frame.payload).ok()?),
            "modelsources" => {
                ResourcePayload::ModelSource(serde_json::from_value(frame.payload).ok()?)
            }
            "datasets" => ResourcePayload::Dataset(serde_json::from_value(frame.payload).ok()?),
            _ => return None,
        };

        Some(Self { action, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_model_frame() {
        let data = r#"{
            "resource": "models",
            "action": "modified",
            "payload": {
                "name": "llama-3",
                "namespace": "model-system",
                "sourceRef": "hf-public",
                "versionsReady": 1,
                "versionsTotal": 2,
                "lastSyncTime": "2026-05-01T10:00:00Z",
                "status": "PROCESSING"
            }
        }"#;

        let event = StreamEvent::decode(data).expect("frame should decode");
        assert_eq!(event.action, EventAction::Modified);
        match event.payload {
            ResourcePayload::Model(ref m) => {
                assert_eq!(m.name, "llama-3");
                assert_eq!(m.status, Phase::Processing);
            }
            ref other => panic!("expected model payload, got {other:?}"),
        }
    }

    #[test]
    fn decode_dataset_frame() {
        let data = r#"{
            "resource": "datasets",
            "action": "added",
            "payload": {
                "name": "llama-3-main",
                "namespace": "team-a",
                "phase": "PENDING",
                "pvcName": "pvc-llama-3",
                "lastSync": "2026-05-01T10:00:00Z"
            }
        }"#;

        let event = StreamEvent::decode(data).expect("frame should decode");
        assert_eq!(event.payload.namespace(), "team-a");
        assert_eq!(event.payload.resource(), "datasets");
    }

    #[test]
    fn decode_rejects_unknown_resource() {
        let data = r#"{"resource": "secrets", "action": "added", "payload": {}}"#;
        assert!(StreamEvent::decode(data).is_none());
    }

    #[test]
    fn decode_rejects_unknown_action() {
        let data = r#"{"resource": "models", "action": "bookmarked", "payload": {}}"#;
        assert!(StreamEvent::decode(data).is_none());
    }

    #[test]
    fn decode_rejects_malformed_json() {
        assert!(StreamEvent::decode("not json at all").is_none());
        assert!(StreamEvent::decode("").is_none());
    }

    #[test]
    fn phase_tolerates_unknown_strings() {
        let phase: Phase = serde_json::from_str(r#""SYNCING""#).expect("should fall back");
        assert_eq!(phase, Phase::Unknown);
    }
}
