// ── Console session ──
//
// Lifecycle management for one console connection: namespace selection,
// snapshot refresh, and event channel attachment. The session is the
// only writer of the mirror store it owns.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use modelfs_api::sse::EventChannel;
use modelfs_api::transport::TransportConfig;
use modelfs_api::{Client, EventChannelHandle};

use crate::config::{self, ConsoleConfig};
use crate::error::CoreError;
use crate::model::NamespaceInfo;
use crate::store::MirrorStore;

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<SessionInner>`. Owns the active namespace,
/// the mirror store, and the event channel for the current namespace.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: ConsoleConfig,
    transport: TransportConfig,
    client: Client,
    store: Arc<MirrorStore>,

    /// The currently selected namespace. Never empty -- starts at the
    /// persisted selection or the configured default.
    active_namespace: watch::Sender<String>,

    /// Namespaces known to the backend, refreshed on demand.
    namespaces: watch::Sender<Arc<Vec<NamespaceInfo>>>,

    /// Bumped on every namespace switch. An in-flight refresh captures
    /// the epoch before fetching and discards its result if the value
    /// moved -- a late snapshot for a previous namespace must never
    /// overwrite the current one.
    epoch: AtomicU64,

    /// Event channel for the active namespace. Released before the next
    /// namespace's channel opens.
    channel: Mutex<Option<EventChannelHandle>>,

    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Session {
    /// Create a session from configuration. Does NOT fetch anything --
    /// call [`start()`](Self::start) to load the initial snapshot and
    /// attach the event channel.
    pub fn new(config: ConsoleConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: config.tls.clone(),
            timeout: config.timeout,
        };
        let client = Client::new(config.url.clone(), &transport)?;

        let (active_namespace, _) = watch::channel(config.initial_namespace());
        let (namespaces, _) = watch::channel(Arc::new(Vec::new()));

        Ok(Self {
            inner: Arc::new(SessionInner {
                config,
                transport,
                client,
                store: Arc::new(MirrorStore::new()),
                active_namespace,
                namespaces,
                epoch: AtomicU64::new(0),
                channel: Mutex::new(None),
                cancel: CancellationToken::new(),
                tasks: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Access the underlying REST client, for foreground operations
    /// (create/update/get) whose failures propagate to the caller.
    pub fn client(&self) -> &Client {
        &self.inner.client
    }

    /// Access the mirror store.
    pub fn store(&self) -> &Arc<MirrorStore> {
        &self.inner.store
    }

    /// The currently selected namespace.
    pub fn active_namespace(&self) -> String {
        self.inner.active_namespace.borrow().clone()
    }

    /// Subscribe to namespace changes.
    pub fn subscribe_active_namespace(&self) -> watch::Receiver<String> {
        self.inner.active_namespace.subscribe()
    }

    /// Namespaces known to the backend as of the last refresh.
    pub fn known_namespaces(&self) -> Arc<Vec<NamespaceInfo>> {
        self.inner.namespaces.borrow().clone()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Bring the mirror up for the initial namespace: refresh the known
    /// namespace set (falling back if the selection disappeared), fetch
    /// the first snapshot, and attach the event channel.
    ///
    /// Best-effort like every mirror-maintenance path -- a failed fetch
    /// leaves empty collections and a warning, not an error.
    pub async fn start(&self) {
        self.refresh_namespaces().await;
        self.refresh_all().await;
        self.attach_channel().await;
        info!(namespace = %self.active_namespace(), "console session started");
    }

    /// Shut the session down: release the channel and stop all tasks.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.release_channel().await;
        let mut tasks = self.inner.tasks.lock().await;
        for task in tasks.drain(..) {
            let _ = task.await;
        }
        debug!("console session shut down");
    }

    // ── Namespace switching ──────────────────────────────────────────

    /// Switch the active namespace.
    ///
    /// No-op when unchanged. Otherwise: persist the selection
    /// (best-effort), bump the epoch, release the old namespace's event
    /// channel, fetch the new snapshot, then attach the new channel.
    /// Release happens before attach so two channels never feed
    /// collections scoped to one namespace.
    pub async fn set_namespace(&self, namespace: &str) {
        if self.active_namespace() == namespace {
            return;
        }

        config::persist_selected_namespace(self.inner.config.state_dir.as_deref(), namespace);
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        let _ = self.inner.active_namespace.send(namespace.to_string());
        info!(%namespace, "switching namespace");

        self.release_channel().await;
        self.refresh_all().await;
        self.attach_channel().await;
    }

    /// Refresh the set of known namespaces. If the active namespace is no
    /// longer known, fall back to the first known one (running the full
    /// switch path).
    pub async fn refresh_namespaces(&self) {
        let items = match self.inner.client.list_namespaces().await {
            Ok(items) => items,
            Err(e) => {
                debug!(error = %e, "namespace list refresh failed");
                return;
            }
        };

        let active = self.active_namespace();
        let fallback = if items.is_empty() || items.iter().any(|n| n.name == active) {
            None
        } else {
            Some(items[0].name.clone())
        };

        self.inner.namespaces.send_modify(|ns| *ns = Arc::new(items));

        if let Some(first) = fallback {
            warn!(%active, fallback = %first, "active namespace no longer known, falling back");
            self.set_namespace(&first).await;
        }
    }

    // ── Snapshot fetch ───────────────────────────────────────────────

    /// Fetch the active namespace's four collections concurrently and
    /// apply them to the store -- all of them, or none of them.
    ///
    /// Failures are absorbed: prior state stays untouched and the
    /// loading flag clears on every path out. A snapshot whose namespace
    /// was switched away from while it was in flight is discarded.
    pub async fn refresh_all(&self) {
        let namespace = self.active_namespace();
        let epoch = self.inner.epoch.load(Ordering::SeqCst);
        let _loading = self.inner.store.begin_loading();

        let client = &self.inner.client;
        let (models, sources, errors, datasets) = tokio::join!(
            client.list_models(&namespace),
            client.list_model_sources(&namespace),
            client.list_errors(&namespace),
            client.list_datasets(&namespace),
        );

        let (models, sources, errors, datasets) = match (models, sources, errors, datasets) {
            (Ok(m), Ok(s), Ok(e), Ok(d)) => (m, s, e, d),
            (m, s, e, d) => {
                for err in [m.err(), s.err(), e.err(), d.err()].into_iter().flatten() {
                    warn!(%namespace, error = %err, "snapshot read failed, keeping prior state");
                }
                return;
            }
        };

        if self.inner.epoch.load(Ordering::SeqCst) != epoch {
            debug!(%namespace, "namespace switched during refresh, discarding stale snapshot");
            return;
        }

        self.inner
            .store
            .replace_snapshot(models, sources, errors, datasets);
        debug!(
            %namespace,
            models = self.inner.store.model_count(),
            sources = self.inner.store.source_count(),
            datasets = self.inner.store.dataset_count(),
            "snapshot applied"
        );
    }

    // ── Optimistic delete ────────────────────────────────────────────

    /// Delete a model optimistically: remove it from the local mirror
    /// immediately and fire the DELETE without awaiting it.
    ///
    /// A failed server-side delete is not rolled back locally -- the
    /// event feed or the next snapshot restores ground truth.
    pub fn delete_model_optimistic(&self, namespace: &str, name: &str) {
        self.inner.store.remove_local(namespace, name);

        let client = self.inner.client.clone();
        let (ns, n) = (namespace.to_string(), name.to_string());
        tokio::spawn(async move {
            if let Err(e) = client.delete_model(&ns, &n).await {
                warn!(namespace = %ns, name = %n, error = %e, "model delete failed");
            }
        });
    }

    // ── Event channel plumbing ───────────────────────────────────────

    /// Release the current event channel, if any. Safe to call when no
    /// channel is attached.
    async fn release_channel(&self) {
        if let Some(handle) = self.inner.channel.lock().await.take() {
            handle.shutdown();
            debug!("event channel released");
        }
    }

    /// Attach the event channel for the active namespace and spawn the
    /// bridge task that folds its events into the store.
    async fn attach_channel(&self) {
        if !self.inner.config.events_enabled {
            debug!("event channel disabled, running snapshot-only");
            return;
        }

        let namespace = self.active_namespace();
        let chan_cancel = self.inner.cancel.child_token();
        let handle = EventChannel::attach(
            self.inner.client.sse_url(&namespace),
            self.inner.config.reconnect.clone(),
            chan_cancel.clone(),
            &self.inner.transport,
        );

        let mut rx = handle.subscribe();
        let store = Arc::clone(&self.inner.store);
        let task_namespace = namespace.clone();
        let task = tokio::spawn(async move {
            let namespace = task_namespace;
            loop {
                tokio::select! {
                    biased;
                    () = chan_cancel.cancelled() => break,
                    result = rx.recv() => match result {
                        Ok(event) => {
                            // The stream is namespace-scoped server-side;
                            // a frame tagged with another namespace would
                            // poison collections now scoped to this one.
                            if event.payload.namespace() != namespace {
                                warn!(
                                    frame_namespace = %event.payload.namespace(),
                                    active = %namespace,
                                    "dropping cross-namespace event frame"
                                );
                                continue;
                            }
                            store.reconcile((*event).clone());
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(skipped = n, "event bridge lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        });

        // Swap the new handle in; shut down any previous one (normally
        // released already by set_namespace, but attach must be safe on
        // its own).
        if let Some(old) = self.inner.channel.lock().await.replace(handle) {
            old.shutdown();
        }
        self.inner.tasks.lock().await.push(task);
        debug!(%namespace, "event channel attached");
    }
}
