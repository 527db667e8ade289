//! In-memory reference graph with fail-fast iterators.

use crate::error::{GraphError, GraphResult};
use crate::graph::{BaseGraph, TripleIter};
use crate::model::{Triple, TriplePattern};
use parking_lot::RwLock;
use std::sync::Arc;

/// An in-memory triple store.
///
/// This graph keeps its triples in a plain vector with set semantics and is
/// the reference [`BaseGraph`] implementation. It is internally consistent
/// under concurrent calls (every operation takes an internal lock), but its
/// iterators are **fail-fast**: a [`TripleIter`] opened on this graph records
/// the graph's version stamp and fails with
/// [`GraphError::ConcurrentModification`] as soon as it observes a newer
/// version. That is exactly the behavior the `congraph_core` engine exists to
/// neutralize.
///
/// # Example
///
/// ```rust
/// use congraph_store::{BaseGraph, MemoryGraph, Node, Triple};
///
/// let graph = MemoryGraph::new();
/// let t = Triple::new(Node::iri("s"), Node::iri("p"), Node::literal("o"));
/// graph.add(t.clone()).unwrap();
/// graph.add(t).unwrap(); // set semantics: still one triple
/// assert_eq!(graph.len().unwrap(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryGraph {
    inner: Arc<RwLock<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    triples: Vec<Triple>,
    version: u64,
    closed: bool,
}

impl MemoryState {
    fn check_open(&self) -> GraphResult<()> {
        if self.closed {
            Err(GraphError::Closed)
        } else {
            Ok(())
        }
    }
}

impl MemoryGraph {
    /// Creates a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a graph pre-populated with the given triples (set semantics).
    #[must_use]
    pub fn from_triples(triples: impl IntoIterator<Item = Triple>) -> Self {
        let graph = Self::new();
        {
            let mut state = graph.inner.write();
            for triple in triples {
                if !state.triples.contains(&triple) {
                    state.triples.push(triple);
                }
            }
        }
        graph
    }

    /// Returns a copy of all triples, in insertion order. Test helper.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Triple> {
        self.inner.read().triples.clone()
    }
}

impl BaseGraph for MemoryGraph {
    fn add(&self, triple: Triple) -> GraphResult<()> {
        let mut state = self.inner.write();
        state.check_open()?;
        if !state.triples.contains(&triple) {
            state.triples.push(triple);
            state.version += 1;
        }
        Ok(())
    }

    fn delete(&self, triple: &Triple) -> GraphResult<()> {
        let mut state = self.inner.write();
        state.check_open()?;
        if let Some(index) = state.triples.iter().position(|t| t == triple) {
            state.triples.remove(index);
            state.version += 1;
        }
        Ok(())
    }

    fn remove(&self, pattern: &TriplePattern) -> GraphResult<()> {
        let mut state = self.inner.write();
        state.check_open()?;
        let before = state.triples.len();
        state.triples.retain(|t| !pattern.matches(t));
        if state.triples.len() != before {
            state.version += 1;
        }
        Ok(())
    }

    fn clear(&self) -> GraphResult<()> {
        let mut state = self.inner.write();
        state.check_open()?;
        if !state.triples.is_empty() {
            state.triples.clear();
            state.version += 1;
        }
        Ok(())
    }

    fn close(&self) -> GraphResult<()> {
        let mut state = self.inner.write();
        state.closed = true;
        state.version += 1;
        Ok(())
    }

    fn contains(&self, pattern: &TriplePattern) -> GraphResult<bool> {
        let state = self.inner.read();
        state.check_open()?;
        Ok(state.triples.iter().any(|t| pattern.matches(t)))
    }

    fn len(&self) -> GraphResult<usize> {
        let state = self.inner.read();
        state.check_open()?;
        Ok(state.triples.len())
    }

    fn find(&self, pattern: &TriplePattern) -> GraphResult<Box<dyn TripleIter>> {
        let state = self.inner.read();
        state.check_open()?;
        Ok(Box::new(MemoryIter {
            graph: Arc::clone(&self.inner),
            pattern: pattern.clone(),
            version: state.version,
            position: 0,
            done: false,
        }))
    }
}

/// Fail-fast lazy iterator over a [`MemoryGraph`].
struct MemoryIter {
    graph: Arc<RwLock<MemoryState>>,
    pattern: TriplePattern,
    version: u64,
    position: usize,
    done: bool,
}

impl TripleIter for MemoryIter {
    fn next(&mut self) -> GraphResult<Option<Triple>> {
        if self.done {
            return Ok(None);
        }
        let state = self.graph.read();
        if state.closed {
            self.done = true;
            return Err(GraphError::Closed);
        }
        if state.version != self.version {
            self.done = true;
            return Err(GraphError::ConcurrentModification);
        }
        while self.position < state.triples.len() {
            let candidate = &state.triples[self.position];
            self.position += 1;
            if self.pattern.matches(candidate) {
                return Ok(Some(candidate.clone()));
            }
        }
        self.done = true;
        Ok(None)
    }

    fn close(&mut self) {
        self.done = true;
    }
}
