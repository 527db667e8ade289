//! Tracked cursors and their buffered native backing.
//!
//! A read call returns a [`Cursor`]: a handle over a lazily-built native
//! iterator, guarded by its own mutex. While the cursor is live, the
//! coordinator (see `coordinator` module) may drain parts of its native
//! sequence into a FIFO buffer and finally swap the whole backing to a
//! frozen in-memory queue, after which the cursor never touches the
//! underlying graph again. The caller observes none of this: elements come
//! out in original production order either way.

use crate::error::EngineResult;
use crate::registry::CursorRegistry;
use congraph_store::{GraphResult, Triple, TripleIter};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

/// Deferred constructor for a native iterator, invoked at most once.
pub(crate) type IterFactory = Box<dyn FnOnce() -> GraphResult<Box<dyn TripleIter>> + Send>;

/// A native iterator plus a FIFO buffer of pulled-but-not-yet-returned
/// triples.
///
/// The native iterator is built lazily on first use; until then the cursor
/// has no tie to the underlying graph at all, which is what lets the
/// coordinator simply hold unstarted cursors locked across a mutation
/// instead of snapshotting them.
pub(crate) struct BufferedNativeCursor {
    factory: Option<IterFactory>,
    native: Option<Box<dyn TripleIter>>,
    buffer: VecDeque<Triple>,
}

impl BufferedNativeCursor {
    pub(crate) fn new(factory: IterFactory) -> Self {
        Self {
            factory: Some(factory),
            native: None,
            buffer: VecDeque::new(),
        }
    }

    fn ensure_native(&mut self) -> GraphResult<()> {
        if self.native.is_none() {
            if let Some(factory) = self.factory.take() {
                self.native = Some(factory()?);
            }
        }
        Ok(())
    }

    /// Pulls one element, buffer first, then the native iterator.
    pub(crate) fn pull(&mut self) -> GraphResult<Option<Triple>> {
        if let Some(triple) = self.buffer.pop_front() {
            return Ok(Some(triple));
        }
        self.pull_native()
    }

    /// Pulls one element directly from the native iterator.
    fn pull_native(&mut self) -> GraphResult<Option<Triple>> {
        self.ensure_native()?;
        match self.native.as_mut() {
            Some(native) => native.next(),
            None => Ok(None),
        }
    }

    /// Returns `true` if at least one element is buffered.
    pub(crate) fn has_buffered(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Puts a single pulled-ahead element back; only valid while the buffer
    /// is empty, so FIFO order is preserved.
    pub(crate) fn push_back(&mut self, triple: Triple) {
        debug_assert!(self.buffer.is_empty());
        self.buffer.push_back(triple);
    }

    /// Moves up to `chunk` elements from the native iterator into the
    /// buffer without exposing them to the caller.
    ///
    /// Returns `Ok(true)` if the native iterator may still have more
    /// elements, `Ok(false)` once it is exhausted. Coordinator-only.
    pub(crate) fn cache(&mut self, chunk: usize) -> GraphResult<bool> {
        self.ensure_native()?;
        let Some(native) = self.native.as_mut() else {
            return Ok(false);
        };
        let mut moved = 0;
        while moved < chunk {
            match native.next()? {
                Some(triple) => {
                    self.buffer.push_back(triple);
                    moved += 1;
                }
                None => return Ok(false),
            }
        }
        Ok(true)
    }

    /// Takes the buffered elements out, leaving the buffer empty.
    pub(crate) fn take_buffer(&mut self) -> VecDeque<Triple> {
        std::mem::take(&mut self.buffer)
    }

    /// Releases the native iterator (and the never-invoked factory) and
    /// discards buffered elements.
    pub(crate) fn close_native(&mut self) {
        self.factory = None;
        if let Some(mut native) = self.native.take() {
            native.close();
        }
        self.buffer.clear();
    }
}

/// The swappable backing of a cursor.
///
/// `Live` still (potentially) reaches into the underlying graph; `Frozen` is
/// a pure in-memory remainder that never touches the graph again; `Closed`
/// yields nothing. Once a cursor leaves `Live` it also leaves the registry,
/// so its mutex is never again contended by the coordinator - the state
/// check replaces the original design's no-op lock sentinel.
pub(crate) enum Backing {
    /// Lazily-iterating backing tied to the live graph.
    Live(BufferedNativeCursor),
    /// Remaining elements of a snapshot taken at freeze time.
    Frozen(VecDeque<Triple>),
    /// Explicitly closed or faulted; yields nothing.
    Closed,
}

/// Mutable cursor state, protected by the per-cursor mutex.
pub(crate) struct CursorInner {
    /// Whether the cursor has begun producing elements.
    pub(crate) started: bool,
    pub(crate) backing: Backing,
}

/// Registry-owned cursor record: identity, age and the guarded state.
pub(crate) struct CursorCell {
    /// Registry key.
    pub(crate) id: Uuid,
    /// Monotonic creation stamp; smaller means older.
    pub(crate) seq: u64,
    /// The per-cursor guard. `Arc` so the coordinator can hold owned guards
    /// across a mutation.
    pub(crate) inner: Arc<Mutex<CursorInner>>,
}

impl CursorCell {
    pub(crate) fn new(id: Uuid, seq: u64, factory: IterFactory) -> Self {
        Self {
            id,
            seq,
            inner: Arc::new(Mutex::new(CursorInner {
                started: false,
                backing: Backing::Live(BufferedNativeCursor::new(factory)),
            })),
        }
    }
}

/// A lazy cursor over a query result, safe to drive while the graph is
/// concurrently mutated.
///
/// Obtained from `ConcurrentGraph::find`/`find_all`/`stream`. The obtaining
/// call performs no work against the graph; the first pull does. Pulls and
/// [`close`](Cursor::close) take `&self` and are internally locked, so an
/// `Arc<Cursor>` may be pulled and closed from different threads.
///
/// A cursor that began producing elements before a mutation yields a
/// point-in-time view frozen at the moment the write neutralized it; a
/// cursor never pulled before the mutation transparently observes the
/// post-mutation graph instead.
///
/// `Cursor` implements [`Iterator`] over `EngineResult<Triple>`, which is
/// the streaming view of the same sequence.
pub struct Cursor {
    cell: Arc<CursorCell>,
    registry: Arc<CursorRegistry>,
}

impl Cursor {
    pub(crate) fn new(cell: Arc<CursorCell>, registry: Arc<CursorRegistry>) -> Self {
        Self { cell, registry }
    }

    /// Pulls the next element.
    ///
    /// Returns `Ok(None)` once the sequence is exhausted; exhaustion
    /// deregisters the cursor and releases its native resources.
    ///
    /// # Errors
    ///
    /// Propagates a fault from the native iterator; the cursor is closed
    /// and deregistered before the error is returned, so a faulted cursor
    /// never lingers in the registry.
    pub fn try_next(&self) -> EngineResult<Option<Triple>> {
        let mut inner = self.cell.inner.lock();
        inner.started = true;
        let pulled = match &mut inner.backing {
            Backing::Live(live) => live.pull(),
            Backing::Frozen(rest) => return Ok(rest.pop_front()),
            Backing::Closed => return Ok(None),
        };
        match pulled {
            Ok(Some(triple)) => Ok(Some(triple)),
            Ok(None) => {
                // Natural exhaustion: the native iterator is done, so the
                // cursor degenerates to an empty frozen sequence.
                inner.backing = Backing::Frozen(VecDeque::new());
                drop(inner);
                self.release();
                Ok(None)
            }
            Err(err) => {
                if let Backing::Live(live) = &mut inner.backing {
                    live.close_native();
                }
                inner.backing = Backing::Closed;
                drop(inner);
                self.release();
                Err(err.into())
            }
        }
    }

    /// Returns `true` if another element is available.
    ///
    /// May pull one element ahead from the native iterator; the element is
    /// buffered and delivered by the next [`try_next`](Cursor::try_next) in
    /// order.
    ///
    /// # Errors
    ///
    /// Propagates a fault from the native iterator, closing and
    /// deregistering the cursor first.
    pub fn has_next(&self) -> EngineResult<bool> {
        let mut inner = self.cell.inner.lock();
        inner.started = true;
        let peeked = match &mut inner.backing {
            Backing::Live(live) => {
                if live.has_buffered() {
                    return Ok(true);
                }
                live.pull()
            }
            Backing::Frozen(rest) => return Ok(!rest.is_empty()),
            Backing::Closed => return Ok(false),
        };
        match peeked {
            Ok(Some(triple)) => {
                if let Backing::Live(live) = &mut inner.backing {
                    live.push_back(triple);
                }
                Ok(true)
            }
            Ok(None) => {
                inner.backing = Backing::Frozen(VecDeque::new());
                drop(inner);
                self.release();
                Ok(false)
            }
            Err(err) => {
                if let Backing::Live(live) = &mut inner.backing {
                    live.close_native();
                }
                inner.backing = Backing::Closed;
                drop(inner);
                self.release();
                Err(err.into())
            }
        }
    }

    /// Closes the cursor, releasing any native resource and deregistering
    /// it.
    ///
    /// Safe to call from any thread, at any point of the cursor's life, and
    /// idempotent: closing an already-closed or exhausted cursor is a
    /// no-op.
    pub fn close(&self) {
        let mut inner = self.cell.inner.lock();
        if let Backing::Live(live) = &mut inner.backing {
            live.close_native();
        }
        inner.backing = Backing::Closed;
        drop(inner);
        self.release();
    }

    fn release(&self) {
        if self.registry.remove(&self.cell.id) {
            tracing::trace!(cursor = %self.cell.id, "cursor released");
        }
    }
}

impl Iterator for Cursor {
    type Item = EngineResult<Triple>;

    fn next(&mut self) -> Option<Self::Item> {
        self.try_next().transpose()
    }
}

impl Drop for Cursor {
    /// Dropping the handle closes the cursor, so abandoned cursors do not
    /// linger in the registry until the next write neutralizes them.
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use congraph_store::GraphError;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn triple(n: usize) -> Triple {
        use congraph_store::Node;
        Triple::new(
            Node::iri(format!("urn:s{n}")),
            Node::iri("urn:p"),
            Node::literal(format!("o{n}")),
        )
    }

    struct VecIter {
        items: VecDeque<Triple>,
        fail_after: Option<usize>,
        pulled: usize,
    }

    impl VecIter {
        fn of(n: usize) -> Box<dyn TripleIter> {
            Box::new(Self {
                items: (0..n).map(triple).collect(),
                fail_after: None,
                pulled: 0,
            })
        }

        fn failing_after(n: usize, total: usize) -> Box<dyn TripleIter> {
            Box::new(Self {
                items: (0..total).map(triple).collect(),
                fail_after: Some(n),
                pulled: 0,
            })
        }
    }

    impl TripleIter for VecIter {
        fn next(&mut self) -> GraphResult<Option<Triple>> {
            if let Some(limit) = self.fail_after {
                if self.pulled >= limit {
                    return Err(GraphError::ConcurrentModification);
                }
            }
            self.pulled += 1;
            Ok(self.items.pop_front())
        }

        fn close(&mut self) {
            self.items.clear();
        }
    }

    fn registered(factory: IterFactory) -> (Cursor, Arc<CursorRegistry>) {
        let registry = Arc::new(CursorRegistry::new());
        let cursor = registry.register(factory);
        (cursor, registry)
    }

    #[test]
    fn factory_is_not_invoked_before_first_pull() {
        let invoked = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&invoked);
        let (cursor, _registry) = registered(Box::new(move || {
            flag.store(true, Ordering::SeqCst);
            Ok(VecIter::of(1))
        }));

        assert!(!invoked.load(Ordering::SeqCst));
        assert_eq!(cursor.try_next().unwrap(), Some(triple(0)));
        assert!(invoked.load(Ordering::SeqCst));
    }

    #[test]
    fn exhaustion_deregisters_cursor() {
        let (cursor, registry) = registered(Box::new(|| Ok(VecIter::of(2))));
        assert_eq!(registry.open_count(), 1);

        assert!(cursor.try_next().unwrap().is_some());
        assert!(cursor.try_next().unwrap().is_some());
        assert_eq!(registry.open_count(), 1);

        assert!(cursor.try_next().unwrap().is_none());
        assert_eq!(registry.open_count(), 0);
        // stays exhausted
        assert!(cursor.try_next().unwrap().is_none());
    }

    #[test]
    fn has_next_buffers_the_peeked_element_in_order() {
        let (cursor, _registry) = registered(Box::new(|| Ok(VecIter::of(2))));
        assert!(cursor.has_next().unwrap());
        assert!(cursor.has_next().unwrap());
        assert_eq!(cursor.try_next().unwrap(), Some(triple(0)));
        assert_eq!(cursor.try_next().unwrap(), Some(triple(1)));
        assert!(!cursor.has_next().unwrap());
    }

    #[test]
    fn fault_deregisters_cursor_before_propagating() {
        let (cursor, registry) = registered(Box::new(|| Ok(VecIter::failing_after(1, 3))));
        assert!(cursor.try_next().unwrap().is_some());

        let err = cursor.try_next().unwrap_err();
        assert_eq!(
            err,
            crate::EngineError::Graph(GraphError::ConcurrentModification)
        );
        assert_eq!(registry.open_count(), 0);
        // faulted cursor behaves as closed afterwards
        assert!(cursor.try_next().unwrap().is_none());
    }

    #[test]
    fn factory_error_surfaces_on_first_pull() {
        let (cursor, registry) = registered(Box::new(|| Err(GraphError::Closed)));
        let err = cursor.try_next().unwrap_err();
        assert_eq!(err, crate::EngineError::Graph(GraphError::Closed));
        assert_eq!(registry.open_count(), 0);
    }

    #[test]
    fn close_is_idempotent() {
        let (cursor, registry) = registered(Box::new(|| Ok(VecIter::of(3))));
        cursor.close();
        assert_eq!(registry.open_count(), 0);
        cursor.close();
        assert_eq!(registry.open_count(), 0);
        assert!(cursor.try_next().unwrap().is_none());
    }

    #[test]
    fn drop_deregisters_cursor() {
        let (cursor, registry) = registered(Box::new(|| Ok(VecIter::of(3))));
        assert_eq!(registry.open_count(), 1);
        drop(cursor);
        assert_eq!(registry.open_count(), 0);
    }

    #[test]
    fn cache_is_bounded_and_preserves_order() {
        let mut buffered = BufferedNativeCursor::new(Box::new(|| Ok(VecIter::of(5))));
        assert!(buffered.cache(2).unwrap());
        assert!(buffered.cache(2).unwrap());
        // 4 buffered, 1 still native
        assert_eq!(buffered.pull().unwrap(), Some(triple(0)));
        assert_eq!(buffered.pull().unwrap(), Some(triple(1)));
        assert_eq!(buffered.pull().unwrap(), Some(triple(2)));
        assert_eq!(buffered.pull().unwrap(), Some(triple(3)));
        assert_eq!(buffered.pull().unwrap(), Some(triple(4)));
        assert_eq!(buffered.pull().unwrap(), None);
    }

    #[test]
    fn cache_reports_exhaustion() {
        let mut buffered = BufferedNativeCursor::new(Box::new(|| Ok(VecIter::of(3))));
        assert!(!buffered.cache(10).unwrap());
        assert_eq!(buffered.take_buffer().len(), 3);
    }

    #[test]
    fn iterator_adapter_yields_all_elements() {
        let (cursor, _registry) = registered(Box::new(|| Ok(VecIter::of(3))));
        let collected: Result<Vec<_>, _> = cursor.collect();
        assert_eq!(collected.unwrap(), vec![triple(0), triple(1), triple(2)]);
    }
}
