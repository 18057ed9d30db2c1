// ── Central mirror store ──
//
// The namespace-scoped copy of the server's collections: models, model
// sources, error banners, and datasets, plus the loading flag. The
// single source of truth consumed by presentation. Mutations are
// broadcast to subscribers via `watch` channels.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::Applied;
use super::collection::ResourceCollection;
use crate::model::{
    DatasetSummary, ErrorBanner, EventAction, ModelSourceSummary, ModelSummary, ResourcePayload,
    StreamEvent,
};
use crate::stream::CollectionStream;

/// Reactive mirror of one namespace's collections.
///
/// Owned by a [`Session`](crate::Session) -- construct one per session
/// (or per test), not process-wide. All writes go through the collection
/// channels' internal locks, so the store is safe to share behind an
/// `Arc` across tasks; reads are snapshot-based and never block writers.
pub struct MirrorStore {
    models: ResourceCollection<ModelSummary>,
    sources: ResourceCollection<ModelSourceSummary>,
    datasets: ResourceCollection<DatasetSummary>,
    /// Advisory banners have no identity key: the event feed never
    /// patches them, refresh replaces them wholesale.
    errors: watch::Sender<Arc<Vec<ErrorBanner>>>,
    loading: watch::Sender<bool>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl MirrorStore {
    pub fn new() -> Self {
        let (errors, _) = watch::channel(Arc::new(Vec::new()));
        let (loading, _) = watch::channel(false);
        let (last_refresh, _) = watch::channel(None);

        Self {
            models: ResourceCollection::new(),
            sources: ResourceCollection::new(),
            datasets: ResourceCollection::new(),
            errors,
            loading,
            last_refresh,
        }
    }

    // ── Reconciliation ───────────────────────────────────────────────

    /// Fold one event into its collection.
    ///
    /// - `deleted`: remove if present, no-op otherwise (idempotent);
    /// - anything else: replace in place when the key exists, insert at
    ///   the front when it doesn't.
    ///
    /// Events apply in arrival order; nothing is coalesced. Datasets
    /// follow the identical algorithm as models and sources.
    pub fn reconcile(&self, event: StreamEvent) -> Applied {
        match (event.action, event.payload) {
            (EventAction::Deleted, ResourcePayload::Model(m)) => {
                self.models.remove(&m.namespace, &m.name)
            }
            (EventAction::Deleted, ResourcePayload::ModelSource(s)) => {
                self.sources.remove(&s.namespace, &s.name)
            }
            (EventAction::Deleted, ResourcePayload::Dataset(d)) => {
                self.datasets.remove(&d.namespace, &d.name)
            }
            (_, ResourcePayload::Model(m)) => self.models.upsert(m),
            (_, ResourcePayload::ModelSource(s)) => self.sources.upsert(s),
            (_, ResourcePayload::Dataset(d)) => self.datasets.upsert(d),
        }
    }

    /// Unconditional wholesale replacement of all four collections.
    /// Used only by the snapshot fetcher; there is no await point here,
    /// so observers never see a half-applied refresh interleaved with
    /// event reconciliation.
    pub fn replace_snapshot(
        &self,
        models: Vec<ModelSummary>,
        sources: Vec<ModelSourceSummary>,
        errors: Vec<ErrorBanner>,
        datasets: Vec<DatasetSummary>,
    ) {
        self.models.replace_all(models);
        self.sources.replace_all(sources);
        self.errors.send_modify(|e| *e = Arc::new(errors));
        self.datasets.replace_all(datasets);
        let _ = self.last_refresh.send(Some(Utc::now()));
    }

    /// Optimistic local removal from the models collection, reflecting a
    /// delete request before (and independent of) server confirmation.
    pub fn remove_local(&self, namespace: &str, name: &str) -> Applied {
        self.models.remove(namespace, name)
    }

    // ── Loading flag ─────────────────────────────────────────────────

    /// Raise the loading flag; the returned guard clears it on drop, on
    /// every path out of a refresh.
    pub fn begin_loading(self: &Arc<Self>) -> LoadingGuard {
        let _ = self.loading.send(true);
        LoadingGuard {
            store: Arc::clone(self),
        }
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn models_snapshot(&self) -> Arc<Vec<Arc<ModelSummary>>> {
        self.models.snapshot()
    }

    pub fn sources_snapshot(&self) -> Arc<Vec<Arc<ModelSourceSummary>>> {
        self.sources.snapshot()
    }

    pub fn datasets_snapshot(&self) -> Arc<Vec<Arc<DatasetSummary>>> {
        self.datasets.snapshot()
    }

    pub fn errors_snapshot(&self) -> Arc<Vec<ErrorBanner>> {
        self.errors.borrow().clone()
    }

    // ── Count accessors ──────────────────────────────────────────────

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn dataset_count(&self) -> usize {
        self.datasets.len()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_models(&self) -> CollectionStream<ModelSummary> {
        CollectionStream::new(self.models.subscribe())
    }

    pub fn subscribe_sources(&self) -> CollectionStream<ModelSourceSummary> {
        CollectionStream::new(self.sources.subscribe())
    }

    pub fn subscribe_datasets(&self) -> CollectionStream<DatasetSummary> {
        CollectionStream::new(self.datasets.subscribe())
    }

    pub fn subscribe_errors(&self) -> watch::Receiver<Arc<Vec<ErrorBanner>>> {
        self.errors.subscribe()
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }
}

impl Default for MirrorStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the store's loading flag when dropped.
pub struct LoadingGuard {
    store: Arc<MirrorStore>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        let _ = self.store.loading.send(false);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn model(namespace: &str, name: &str, status: crate::model::Phase) -> ModelSummary {
        ModelSummary {
            name: name.into(),
            namespace: namespace.into(),
            source_ref: "src".into(),
            tags: None,
            versions_ready: 0,
            versions_total: 1,
            last_sync_time: Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap(),
            status,
            reconcile_message: None,
        }
    }

    fn event(action: EventAction, payload: ModelSummary) -> StreamEvent {
        StreamEvent {
            action,
            payload: ResourcePayload::Model(payload),
        }
    }

    fn model_names(store: &MirrorStore) -> Vec<String> {
        store
            .models_snapshot()
            .iter()
            .map(|m| m.name.clone())
            .collect()
    }

    #[test]
    fn snapshot_then_modified_event_updates_in_place() {
        // Start empty, fetch delivers a PENDING model, then a modified
        // event flips it to READY at the same array position.
        let store = MirrorStore::new();
        store.replace_snapshot(
            vec![model("ns1", "m1", crate::model::Phase::Pending)],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );

        let applied = store.reconcile(event(
            EventAction::Modified,
            model("ns1", "m1", crate::model::Phase::Ready),
        ));

        assert_eq!(applied, Applied::Replaced);
        let models = store.models_snapshot();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].status, crate::model::Phase::Ready);
    }

    #[test]
    fn modified_event_preserves_row_order() {
        let store = MirrorStore::new();
        store.replace_snapshot(
            vec![
                model("ns1", "a", crate::model::Phase::Ready),
                model("ns1", "b", crate::model::Phase::Pending),
                model("ns1", "c", crate::model::Phase::Ready),
            ],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );

        store.reconcile(event(
            EventAction::Modified,
            model("ns1", "b", crate::model::Phase::Failed),
        ));

        assert_eq!(model_names(&store), vec!["a", "b", "c"]);
        assert_eq!(store.models_snapshot()[1].status, crate::model::Phase::Failed);
    }

    #[test]
    fn added_event_inserts_at_front() {
        let store = MirrorStore::new();
        store.replace_snapshot(
            vec![
                model("ns1", "a", crate::model::Phase::Ready),
                model("ns1", "b", crate::model::Phase::Ready),
            ],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );

        let applied = store.reconcile(event(
            EventAction::Added,
            model("ns1", "d", crate::model::Phase::Pending),
        ));

        assert_eq!(applied, Applied::Inserted);
        assert_eq!(model_names(&store), vec!["d", "a", "b"]);
    }

    #[test]
    fn modified_event_for_unseen_key_is_an_implicit_insert() {
        // A delta can outrun the snapshot; absence means insert, whatever
        // the action label said.
        let store = MirrorStore::new();

        let applied = store.reconcile(event(
            EventAction::Modified,
            model("ns1", "early", crate::model::Phase::Processing),
        ));

        assert_eq!(applied, Applied::Inserted);
        assert_eq!(store.model_count(), 1);
    }

    #[test]
    fn deleted_event_is_idempotent() {
        let store = MirrorStore::new();
        store.replace_snapshot(
            vec![model("ns1", "m1", crate::model::Phase::Ready)],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );

        let gone = model("ns1", "m1", crate::model::Phase::Ready);
        assert_eq!(
            store.reconcile(event(EventAction::Deleted, gone.clone())),
            Applied::Removed
        );
        assert_eq!(
            store.reconcile(event(EventAction::Deleted, gone)),
            Applied::Noop
        );
        assert_eq!(store.model_count(), 0);
    }

    #[test]
    fn event_sequences_never_duplicate_keys() {
        let store = MirrorStore::new();

        for round in 0..4 {
            let status = if round % 2 == 0 {
                crate::model::Phase::Pending
            } else {
                crate::model::Phase::Ready
            };
            store.reconcile(event(EventAction::Added, model("ns1", "m1", status)));
            store.reconcile(event(EventAction::Modified, model("ns1", "m1", status)));
        }

        assert_eq!(store.model_count(), 1);
    }

    #[test]
    fn dataset_events_follow_the_same_algorithm() {
        let store = MirrorStore::new();
        let dataset = DatasetSummary {
            name: "d1".into(),
            namespace: "ns1".into(),
            phase: crate::model::Phase::Pending,
            pvc_name: None,
            last_sync: Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap(),
        };

        let applied = store.reconcile(StreamEvent {
            action: EventAction::Added,
            payload: ResourcePayload::Dataset(dataset.clone()),
        });
        assert_eq!(applied, Applied::Inserted);

        let applied = store.reconcile(StreamEvent {
            action: EventAction::Deleted,
            payload: ResourcePayload::Dataset(dataset),
        });
        assert_eq!(applied, Applied::Removed);
        assert_eq!(store.dataset_count(), 0);
    }

    #[test]
    fn remove_local_only_touches_models() {
        let store = MirrorStore::new();
        store.replace_snapshot(
            vec![model("ns1", "m1", crate::model::Phase::Ready)],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        );

        assert_eq!(store.remove_local("ns1", "m1"), Applied::Removed);
        assert_eq!(store.remove_local("ns1", "m1"), Applied::Noop);
        assert_eq!(store.model_count(), 0);
    }

    #[test]
    fn replace_snapshot_swaps_all_four_collections() {
        let store = MirrorStore::new();
        store.replace_snapshot(
            vec![model("old", "m", crate::model::Phase::Ready)],
            Vec::new(),
            vec![ErrorBanner {
                namespace: "old".into(),
                message: "boom".into(),
                reason: "Test".into(),
                retry_at: Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap(),
            }],
            Vec::new(),
        );

        store.replace_snapshot(Vec::new(), Vec::new(), Vec::new(), Vec::new());

        assert_eq!(store.model_count(), 0);
        assert!(store.errors_snapshot().is_empty());
        assert!(store.last_refresh().is_some());
    }

    #[test]
    fn loading_guard_clears_on_drop() {
        let store = Arc::new(MirrorStore::new());
        assert!(!store.is_loading());

        {
            let _guard = store.begin_loading();
            assert!(store.is_loading());
        }

        assert!(!store.is_loading());
    }
}
