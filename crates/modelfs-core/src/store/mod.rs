// ── Reactive mirror store ──
//
// Insertion-ordered collection storage with push-based change
// notification via `watch` channels.

mod collection;
mod mirror;

pub use mirror::{LoadingGuard, MirrorStore};

/// What a reconciliation step actually did to its collection.
///
/// Mirror maintenance is best-effort -- public callers may discard this --
/// but returning it keeps the silent cases (idempotent deletes, implicit
/// inserts) visible to code that cares, instead of being lost behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The record was new and was inserted at the front.
    Inserted,
    /// An existing record was replaced in place at its current position.
    Replaced,
    /// The record was found and removed.
    Removed,
    /// Nothing matched; the collection is unchanged.
    Noop,
}
