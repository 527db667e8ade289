//! The thread-safe graph facade.

use crate::config::EngineConfig;
use crate::coordinator;
use crate::cursor::Cursor;
use crate::error::{EngineError, EngineResult};
use crate::registry::CursorRegistry;
use crate::strategy::{SplitStrategy, SyncStrategy};
use congraph_store::{BaseGraph, GraphResult, Triple, TriplePattern};
use std::sync::Arc;

/// A thread-safe wrapper around an unsynchronized [`BaseGraph`].
///
/// `ConcurrentGraph` exposes the same operation set as the store it wraps,
/// but makes it safe for many threads:
///
/// - **Reads that iterate** (`find`, `find_all`, `stream`) are lazy. The
///   call registers a [`Cursor`] and returns immediately - no element is
///   pulled, no work runs against the store, and the call itself cannot
///   fail. Pulls on the cursor happen later, on the caller's own schedule.
/// - **Mutations** (`add`, `delete`, `remove`, `clear`, `close`) first
///   neutralize every open cursor (freezing in-progress ones to bounded
///   snapshots and holding not-yet-started ones locked), then delegate to
///   the store. Cursors therefore never observe a native
///   concurrent-modification fault.
///
/// A cursor already producing elements when a mutation runs keeps a
/// point-in-time view frozen at that moment; a cursor obtained but never
/// pulled is transparently rebased onto the post-mutation state at its
/// first pull.
///
/// The admission discipline is pluggable via [`SyncStrategy`]; the default
/// [`SplitStrategy`] lets reads run concurrently with each other.
///
/// # Example
///
/// ```rust
/// use congraph_core::ConcurrentGraph;
/// use congraph_store::{MemoryGraph, Node, Triple};
///
/// let graph = ConcurrentGraph::new(MemoryGraph::new());
/// let cursor = graph.find_all(); // nothing pulled yet
///
/// let t = Triple::new(Node::iri("s"), Node::iri("p"), Node::literal("o"));
/// graph.add(t.clone()).unwrap();
///
/// // the unstarted cursor observes the post-mutation graph
/// assert_eq!(cursor.try_next().unwrap(), Some(t));
/// ```
pub struct ConcurrentGraph<G: BaseGraph + 'static, S: SyncStrategy = SplitStrategy> {
    base: Arc<G>,
    registry: Arc<CursorRegistry>,
    strategy: S,
    config: EngineConfig,
}

impl<G: BaseGraph + 'static> ConcurrentGraph<G> {
    /// Wraps a graph with the split read/write strategy and default
    /// configuration.
    #[must_use]
    pub fn new(base: G) -> Self {
        Self {
            base: Arc::new(base),
            registry: Arc::new(CursorRegistry::new()),
            strategy: SplitStrategy::default(),
            config: EngineConfig::default(),
        }
    }

    /// Wraps a graph with the split read/write strategy and the given
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the configuration is
    /// invalid (zero `chunk_size`).
    pub fn with_config(base: G, config: EngineConfig) -> EngineResult<Self> {
        Self::with_strategy(base, config, SplitStrategy::default())
    }
}

impl<G: BaseGraph + 'static, S: SyncStrategy> ConcurrentGraph<G, S> {
    /// Wraps a graph with an explicit strategy and configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the configuration is
    /// invalid (zero `chunk_size`).
    pub fn with_strategy(base: G, config: EngineConfig, strategy: S) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            base: Arc::new(base),
            registry: Arc::new(CursorRegistry::new()),
            strategy,
            config,
        })
    }

    /// Runs a mutation: write admission, coordinator pass, then the store
    /// call. Guards over unstarted cursors are released after the store
    /// call, successful or not.
    fn modify<T>(&self, op: impl FnOnce(&G) -> GraphResult<T>) -> EngineResult<T> {
        self.strategy.write_admit(|| {
            let hold = coordinator::neutralize(&self.registry, &self.config)?;
            let result = op(&self.base).map_err(EngineError::from);
            drop(hold);
            result
        })
    }

    /// Registers a lazy cursor around a deferred store query.
    fn open_cursor(&self, pattern: Option<TriplePattern>) -> Cursor {
        self.strategy.read_admit(|| {
            let base = Arc::clone(&self.base);
            self.registry.register(Box::new(move || match pattern {
                Some(pattern) => base.find(&pattern),
                None => base.find_all(),
            }))
        })
    }

    /// Adds a triple.
    ///
    /// # Errors
    ///
    /// Propagates a store refusal (e.g. add denied) unchanged, or a cursor
    /// fault encountered while neutralizing open cursors; in the latter
    /// case the store is untouched.
    pub fn add(&self, triple: Triple) -> EngineResult<()> {
        self.modify(move |base| base.add(triple))
    }

    /// Deletes a triple.
    ///
    /// # Errors
    ///
    /// Propagates a store refusal unchanged, or a cursor fault encountered
    /// while neutralizing open cursors.
    pub fn delete(&self, triple: &Triple) -> EngineResult<()> {
        self.modify(|base| base.delete(triple))
    }

    /// Removes every triple matching the pattern.
    ///
    /// # Errors
    ///
    /// Propagates a store refusal unchanged, or a cursor fault encountered
    /// while neutralizing open cursors.
    pub fn remove(&self, pattern: &TriplePattern) -> EngineResult<()> {
        self.modify(|base| base.remove(pattern))
    }

    /// Removes all triples.
    ///
    /// # Errors
    ///
    /// Propagates a store refusal unchanged, or a cursor fault encountered
    /// while neutralizing open cursors.
    pub fn clear(&self) -> EngineResult<()> {
        self.modify(|base| base.clear())
    }

    /// Closes the underlying store.
    ///
    /// # Errors
    ///
    /// Propagates the store's close failure, or a cursor fault encountered
    /// while neutralizing open cursors.
    pub fn close(&self) -> EngineResult<()> {
        self.modify(|base| base.close())
    }

    /// Opens a lazy cursor over every triple matching the pattern.
    ///
    /// Returns immediately; the store is first queried on the cursor's
    /// first pull, which is also when any store error surfaces.
    #[must_use]
    pub fn find(&self, pattern: &TriplePattern) -> Cursor {
        self.open_cursor(Some(pattern.clone()))
    }

    /// Opens a lazy cursor over the whole graph.
    #[must_use]
    pub fn find_all(&self) -> Cursor {
        self.open_cursor(None)
    }

    /// Opens a lazy cursor to be consumed as an [`Iterator`].
    ///
    /// Identical to [`find`](Self::find); `Cursor` implements
    /// `Iterator<Item = EngineResult<Triple>>`, which is the streaming view
    /// of the result.
    #[must_use]
    pub fn stream(&self, pattern: &TriplePattern) -> Cursor {
        self.find(pattern)
    }

    /// Opens a lazy cursor over the whole graph, to be consumed as an
    /// [`Iterator`]. Identical to [`find_all`](Self::find_all).
    #[must_use]
    pub fn stream_all(&self) -> Cursor {
        self.find_all()
    }

    /// Returns `true` if any triple matches the pattern. Fully synchronous;
    /// creates no cursor.
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub fn contains(&self, pattern: &TriplePattern) -> EngineResult<bool> {
        self.strategy
            .read_admit(|| self.base.contains(pattern).map_err(EngineError::from))
    }

    /// Returns the number of triples. Fully synchronous; creates no cursor.
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub fn len(&self) -> EngineResult<usize> {
        self.strategy
            .read_admit(|| self.base.len().map_err(EngineError::from))
    }

    /// Returns `true` if the graph holds no triples.
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub fn is_empty(&self) -> EngineResult<bool> {
        self.strategy
            .read_admit(|| self.base.is_empty().map_err(EngineError::from))
    }

    /// Number of currently open cursors. Diagnostic; after every cursor is
    /// exhausted or closed this is zero.
    #[must_use]
    pub fn open_cursors(&self) -> usize {
        self.registry.open_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use congraph_store::{GraphError, MemoryGraph, Node};

    fn triple(n: usize) -> Triple {
        Triple::new(
            Node::iri(format!("urn:s{n}")),
            Node::iri("urn:p"),
            Node::literal(format!("o{n}")),
        )
    }

    fn graph_of(n: usize) -> ConcurrentGraph<MemoryGraph> {
        ConcurrentGraph::new(MemoryGraph::from_triples((0..n).map(triple)))
    }

    #[test]
    fn basic_operations() {
        let graph = graph_of(0);
        assert!(graph.is_empty().unwrap());

        graph.add(triple(1)).unwrap();
        graph.add(triple(2)).unwrap();
        assert_eq!(graph.len().unwrap(), 2);
        assert!(graph.contains(&TriplePattern::from(&triple(1))).unwrap());

        graph.delete(&triple(1)).unwrap();
        assert_eq!(graph.len().unwrap(), 1);

        graph.clear().unwrap();
        assert!(graph.is_empty().unwrap());
    }

    #[test]
    fn find_pulls_nothing_up_front() {
        let graph = graph_of(3);
        let cursor = graph.find_all();
        assert_eq!(graph.open_cursors(), 1);
        drop(cursor);
        assert_eq!(graph.open_cursors(), 0);
    }

    #[test]
    fn find_filters_by_pattern() {
        let graph = graph_of(3);
        let pattern = TriplePattern::new(Some(Node::iri("urn:s1")), None, None);
        let found: Result<Vec<_>, _> = graph.find(&pattern).collect();
        assert_eq!(found.unwrap(), vec![triple(1)]);
    }

    #[test]
    fn stream_views_are_lazy_cursors() {
        let graph = graph_of(3);

        let all: Result<Vec<_>, _> = graph.stream_all().collect();
        assert_eq!(all.unwrap().len(), 3);

        let pattern = TriplePattern::new(Some(Node::iri("urn:s1")), None, None);
        let one: Result<Vec<_>, _> = graph.stream(&pattern).collect();
        assert_eq!(one.unwrap(), vec![triple(1)]);

        assert_eq!(graph.open_cursors(), 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EngineConfig::new().chunk_size(0);
        let result = ConcurrentGraph::with_config(MemoryGraph::new(), config);
        assert!(matches!(result, Err(EngineError::InvalidConfig { .. })));
    }

    #[test]
    fn mutation_with_open_started_cursor_succeeds() {
        let graph = graph_of(3);
        let cursor = graph.find_all();
        let first = cursor.try_next().unwrap().unwrap();

        graph.add(triple(10)).unwrap();
        assert_eq!(graph.len().unwrap(), 4);

        // cursor still yields its frozen pre-mutation view, fault-free
        let mut seen = vec![first];
        for item in cursor {
            seen.push(item.unwrap());
        }
        assert_eq!(seen, vec![triple(0), triple(1), triple(2)]);
    }

    #[test]
    fn close_propagates_to_store() {
        let graph = graph_of(1);
        graph.close().unwrap();
        assert_eq!(graph.len(), Err(EngineError::Graph(GraphError::Closed)));
        assert_eq!(
            graph.add(triple(2)),
            Err(EngineError::Graph(GraphError::Closed))
        );
    }

    #[test]
    fn exclusive_strategy_behaves_identically() {
        let graph = ConcurrentGraph::with_strategy(
            MemoryGraph::from_triples((0..3).map(triple)),
            EngineConfig::default(),
            crate::ExclusiveStrategy::default(),
        )
        .unwrap();

        let cursor = graph.find_all();
        assert!(cursor.try_next().unwrap().is_some());
        graph.delete(&triple(2)).unwrap();

        let rest: Result<Vec<_>, _> = cursor.collect();
        assert_eq!(rest.unwrap(), vec![triple(1), triple(2)]);
        assert_eq!(graph.len().unwrap(), 2);
    }
}
