//! Eagerly-materializing synchronized graph, the baseline alternative to
//! [`ConcurrentGraph`](crate::ConcurrentGraph).

use crate::error::{EngineError, EngineResult};
use congraph_store::{BaseGraph, Triple, TriplePattern};
use parking_lot::Mutex;

/// A fully synchronized wrapper that materializes every query result.
///
/// Every operation runs under one exclusive lock, and `find` drains the
/// native iterator to completion *before returning*, handing the caller a
/// plain in-memory [`SnapshotIter`]. No cursor ever outlives the call that
/// produced it, so mutation needs no coordination at all.
///
/// This trades scalability for simplicity: reads serialize against each
/// other and against writes, and every `find` pays the full materialization
/// cost up front - on a large graph, in both memory and latency. Prefer
/// [`ConcurrentGraph`](crate::ConcurrentGraph) unless result sets are known
/// to be small.
pub struct SynchronizedGraph<G: BaseGraph> {
    base: G,
    gate: Mutex<()>,
}

impl<G: BaseGraph> SynchronizedGraph<G> {
    /// Wraps a graph.
    #[must_use]
    pub fn new(base: G) -> Self {
        Self {
            base,
            gate: Mutex::new(()),
        }
    }

    /// Adds a triple.
    ///
    /// # Errors
    ///
    /// Propagates the store's refusal unchanged.
    pub fn add(&self, triple: Triple) -> EngineResult<()> {
        let _admitted = self.gate.lock();
        self.base.add(triple).map_err(EngineError::from)
    }

    /// Deletes a triple.
    ///
    /// # Errors
    ///
    /// Propagates the store's refusal unchanged.
    pub fn delete(&self, triple: &Triple) -> EngineResult<()> {
        let _admitted = self.gate.lock();
        self.base.delete(triple).map_err(EngineError::from)
    }

    /// Removes every triple matching the pattern.
    ///
    /// # Errors
    ///
    /// Propagates the store's refusal unchanged.
    pub fn remove(&self, pattern: &TriplePattern) -> EngineResult<()> {
        let _admitted = self.gate.lock();
        self.base.remove(pattern).map_err(EngineError::from)
    }

    /// Removes all triples.
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub fn clear(&self) -> EngineResult<()> {
        let _admitted = self.gate.lock();
        self.base.clear().map_err(EngineError::from)
    }

    /// Closes the underlying store.
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub fn close(&self) -> EngineResult<()> {
        let _admitted = self.gate.lock();
        self.base.close().map_err(EngineError::from)
    }

    /// Returns every triple matching the pattern, fully materialized under
    /// the lock.
    ///
    /// Unlike the lazy facade, this fails at call time if the query or the
    /// enumeration fails.
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub fn find(&self, pattern: &TriplePattern) -> EngineResult<SnapshotIter> {
        let _admitted = self.gate.lock();
        let mut native = self.base.find(pattern)?;
        let mut items = Vec::new();
        while let Some(triple) = native.next()? {
            items.push(triple);
        }
        native.close();
        Ok(SnapshotIter {
            items: items.into_iter(),
        })
    }

    /// Returns the whole graph, fully materialized under the lock.
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub fn find_all(&self) -> EngineResult<SnapshotIter> {
        self.find(&TriplePattern::any())
    }

    /// Returns `true` if any triple matches the pattern.
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub fn contains(&self, pattern: &TriplePattern) -> EngineResult<bool> {
        let _admitted = self.gate.lock();
        self.base.contains(pattern).map_err(EngineError::from)
    }

    /// Returns the number of triples.
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub fn len(&self) -> EngineResult<usize> {
        let _admitted = self.gate.lock();
        self.base.len().map_err(EngineError::from)
    }

    /// Returns `true` if the graph holds no triples.
    ///
    /// # Errors
    ///
    /// Propagates the store's error.
    pub fn is_empty(&self) -> EngineResult<bool> {
        let _admitted = self.gate.lock();
        self.base.is_empty().map_err(EngineError::from)
    }
}

/// An owned, already-materialized query result.
///
/// Independent of the graph from the moment it is returned; later mutations
/// cannot affect it and it cannot fail.
#[derive(Debug)]
pub struct SnapshotIter {
    items: std::vec::IntoIter<Triple>,
}

impl Iterator for SnapshotIter {
    type Item = Triple;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

impl ExactSizeIterator for SnapshotIter {}
