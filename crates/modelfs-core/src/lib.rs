//! Reactive data layer between `modelfs-api` and UI consumers.
//!
//! This crate owns the live resource mirror for the modelfs console: a
//! namespace-scoped, in-memory copy of the server's collections, kept
//! consistent under bulk snapshot fetches, the incremental event feed,
//! and namespace switches.
//!
//! - **[`Session`]** — Central facade managing the mirror lifecycle:
//!   [`start()`](Session::start) loads the initial snapshot and attaches
//!   the event channel; [`set_namespace()`](Session::set_namespace)
//!   releases the old channel, re-fetches, and re-attaches — in that
//!   order, so stale cross-namespace frames can never leak in.
//!
//! - **[`MirrorStore`]** — Reactive storage for the four mirrored
//!   collections (models, sources, errors, datasets) plus the loading
//!   flag. Collections are insertion-ordered: reconciliation replaces
//!   records in place and inserts unseen records at the front, so row
//!   order is stable under updates.
//!
//! - **[`CollectionStream`]** — Subscription handle vended by the store.
//!   Exposes `current()` / `latest()` / `changed()` for reactive
//!   rendering.
//!
//! Every session owns its store — nothing here is a process-wide
//! singleton, so tests construct isolated instances freely.

pub mod config;
pub mod error;
pub mod model;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ConsoleConfig;
pub use error::CoreError;
pub use session::Session;
pub use store::{Applied, MirrorStore};
pub use stream::CollectionStream;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    DatasetSummary, ErrorBanner, EventAction, Keyed, ModelDetail, ModelSourceDetail,
    ModelSourceSummary, ModelSummary, NamespaceInfo, Phase, ResourcePayload, StreamEvent,
};
