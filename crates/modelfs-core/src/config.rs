// ── Session configuration & persisted selection ──
//
// Runtime configuration for a console session, plus the small state file
// remembering which namespace the user last selected. The selection is
// the only thing persisted -- mirrored data never touches disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use modelfs_api::sse::ReconnectConfig;
use modelfs_api::transport::TlsMode;

/// Namespace used when no selection has been persisted.
pub const DEFAULT_NAMESPACE: &str = "model-system";

const STATE_FILE: &str = "state.toml";

/// Configuration for a [`Session`](crate::Session).
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Console base URL (e.g. `http://localhost:8090`).
    pub url: Url,

    /// Namespace to activate when none is persisted.
    pub default_namespace: String,

    /// TLS verification mode.
    pub tls: TlsMode,

    /// Per-request timeout for REST calls.
    pub timeout: Duration,

    /// Whether to attach the SSE event channel. When false the mirror
    /// runs snapshot-only.
    pub events_enabled: bool,

    /// Backoff policy for event stream reconnection.
    pub reconnect: ReconnectConfig,

    /// Override for the directory holding the persisted selection.
    /// `None` uses the platform config directory.
    pub state_dir: Option<PathBuf>,
}

impl ConsoleConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            default_namespace: DEFAULT_NAMESPACE.to_string(),
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            events_enabled: true,
            reconnect: ReconnectConfig::default(),
            state_dir: None,
        }
    }

    /// The namespace a fresh session starts in: the persisted selection
    /// if present and non-empty, else the configured default.
    pub fn initial_namespace(&self) -> String {
        load_selected_namespace(self.state_dir.as_deref())
            .unwrap_or_else(|| self.default_namespace.clone())
    }
}

// ── Persisted selection ──────────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
struct SelectionState {
    namespace: Option<String>,
}

fn state_file(dir: Option<&Path>) -> Option<PathBuf> {
    match dir {
        Some(d) => Some(d.join(STATE_FILE)),
        None => ProjectDirs::from("", "", "modelfs").map(|p| p.config_dir().join(STATE_FILE)),
    }
}

/// Read the persisted namespace selection. Empty values count as absent.
pub(crate) fn load_selected_namespace(dir: Option<&Path>) -> Option<String> {
    let path = state_file(dir)?;
    let raw = std::fs::read_to_string(&path).ok()?;
    let state: SelectionState = toml::from_str(&raw).ok()?;
    state.namespace.filter(|ns| !ns.is_empty())
}

/// Persist the namespace selection. Best-effort: failures are logged at
/// debug and otherwise ignored -- losing the selection costs one extra
/// click, not data.
pub(crate) fn persist_selected_namespace(dir: Option<&Path>, namespace: &str) {
    let Some(path) = state_file(dir) else {
        return;
    };

    let state = SelectionState {
        namespace: Some(namespace.to_string()),
    };
    let Ok(raw) = toml::to_string(&state) else {
        return;
    };

    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            debug!(error = %e, "could not create state directory");
            return;
        }
    }
    if let Err(e) = std::fs::write(&path, raw) {
        debug!(error = %e, path = %path.display(), "could not persist namespace selection");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn selection_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        persist_selected_namespace(Some(dir.path()), "team-a");
        assert_eq!(
            load_selected_namespace(Some(dir.path())).as_deref(),
            Some("team-a")
        );
    }

    #[test]
    fn missing_state_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_selected_namespace(Some(dir.path())).is_none());
    }

    #[test]
    fn empty_selection_counts_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        persist_selected_namespace(Some(dir.path()), "");
        assert!(load_selected_namespace(Some(dir.path())).is_none());
    }

    #[test]
    fn initial_namespace_prefers_persisted_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ConsoleConfig::new(Url::parse("http://localhost:8090").unwrap());
        config.state_dir = Some(dir.path().to_path_buf());

        assert_eq!(config.initial_namespace(), DEFAULT_NAMESPACE);

        persist_selected_namespace(Some(dir.path()), "team-b");
        assert_eq!(config.initial_namespace(), "team-b");
    }
}
