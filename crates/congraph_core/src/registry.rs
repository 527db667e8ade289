//! Registry of open cursors.

use crate::cursor::{Cursor, CursorCell, IterFactory};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// A concurrent map of every cursor that is still open.
///
/// A cursor is present here exactly while it is open: it enters on the read
/// call that creates it and leaves on exhaustion, fault, explicit close or
/// coordinator freeze. Removal is idempotent - exhaustion on the reader
/// thread can race removal by the coordinator, and only the first remover's
/// action has effect.
///
/// The coordinator iterates over a cloned snapshot of the entries, so map
/// iteration never holds the registry lock while cursors remove themselves.
pub(crate) struct CursorRegistry {
    cursors: RwLock<HashMap<Uuid, Arc<CursorCell>>>,
    /// Creation stamps for cursor age ordering.
    next_seq: AtomicU64,
}

impl CursorRegistry {
    pub(crate) fn new() -> Self {
        Self {
            cursors: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Registers a fresh cursor around the given native-iterator factory
    /// and returns the caller-facing handle.
    pub(crate) fn register(self: &Arc<Self>, factory: IterFactory) -> Cursor {
        let id = Uuid::new_v4();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let cell = Arc::new(CursorCell::new(id, seq, factory));
        self.cursors.write().insert(id, Arc::clone(&cell));
        tracing::trace!(cursor = %id, seq, "cursor registered");
        Cursor::new(cell, Arc::clone(self))
    }

    /// Removes a cursor; returns whether this call was the one that removed
    /// it.
    pub(crate) fn remove(&self, id: &Uuid) -> bool {
        self.cursors.write().remove(id).is_some()
    }

    /// Clones the current entries out for coordinator iteration.
    pub(crate) fn snapshot(&self) -> Vec<Arc<CursorCell>> {
        self.cursors.read().values().cloned().collect()
    }

    /// Number of currently open cursors.
    pub(crate) fn open_count(&self) -> usize {
        self.cursors.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use congraph_store::{GraphResult, Triple, TripleIter};

    struct EmptyIter;

    impl TripleIter for EmptyIter {
        fn next(&mut self) -> GraphResult<Option<Triple>> {
            Ok(None)
        }

        fn close(&mut self) {}
    }

    fn empty_factory() -> IterFactory {
        Box::new(|| Ok(Box::new(EmptyIter) as Box<dyn TripleIter>))
    }

    #[test]
    fn register_and_remove() {
        let registry = Arc::new(CursorRegistry::new());
        let c1 = registry.register(empty_factory());
        let _c2 = registry.register(empty_factory());
        assert_eq!(registry.open_count(), 2);

        c1.close();
        assert_eq!(registry.open_count(), 1);
    }

    #[test]
    fn removal_is_idempotent() {
        let registry = Arc::new(CursorRegistry::new());
        let id = Uuid::new_v4();
        assert!(!registry.remove(&id));
    }

    #[test]
    fn snapshot_orders_by_creation_seq() {
        let registry = Arc::new(CursorRegistry::new());
        let _c1 = registry.register(empty_factory());
        let _c2 = registry.register(empty_factory());
        let _c3 = registry.register(empty_factory());

        let mut snapshot = registry.snapshot();
        snapshot.sort_by_key(|cell| cell.seq);
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot[0].seq < snapshot[1].seq);
        assert!(snapshot[1].seq < snapshot[2].seq);
    }
}
