//! Base graph trait definition.

use crate::error::GraphResult;
use crate::model::{Triple, TriplePattern};

/// A native iterator over triples produced by a [`BaseGraph`] query.
///
/// Native iterators are **lazy views into live store state**. They are only
/// valid as long as the graph is not mutated: once a triple is added or
/// removed, every iterator opened before the mutation must fail with
/// [`GraphError::ConcurrentModification`](crate::GraphError::ConcurrentModification)
/// on its next pull rather than yield corrupt results.
///
/// Synchronized wrappers (see `congraph_core`) are responsible for never
/// driving a native iterator across a mutation of the same store.
pub trait TripleIter: Send {
    /// Pulls the next matching triple.
    ///
    /// Returns `Ok(None)` once the sequence is exhausted; after that every
    /// call returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph was mutated or closed since the
    /// iterator was created.
    fn next(&mut self) -> GraphResult<Option<Triple>>;

    /// Releases the iterator.
    ///
    /// After `close` the iterator yields `Ok(None)`. Closing twice is a
    /// no-op.
    fn close(&mut self);
}

/// A mutable triple store with pattern-matching iteration.
///
/// `BaseGraph` is the contract the concurrency layer builds on. It is
/// deliberately *unsynchronized at the operation level*: implementations may
/// use interior mutability so all methods take `&self`, but they make no
/// promise that iteration and mutation are safe together - see
/// [`TripleIter`].
///
/// # Invariants
///
/// - `add` has set semantics: adding a triple already present is a no-op
/// - `find` returns a lazy iterator and performs no matching work up front
/// - iterators opened before a successful mutation are invalidated
/// - implementations must be `Send + Sync` so a synchronized wrapper can own
///   them behind an `Arc`
pub trait BaseGraph: Send + Sync {
    /// Adds a triple to the graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the store refuses the triple or is closed.
    fn add(&self, triple: Triple) -> GraphResult<()>;

    /// Deletes a triple from the graph; deleting an absent triple is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the store refuses the deletion or is closed.
    fn delete(&self, triple: &Triple) -> GraphResult<()>;

    /// Removes every triple matching the pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the store refuses the deletion or is closed.
    fn remove(&self, pattern: &TriplePattern) -> GraphResult<()>;

    /// Removes all triples.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed.
    fn clear(&self) -> GraphResult<()>;

    /// Closes the graph; subsequent operations fail with `Closed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be closed.
    fn close(&self) -> GraphResult<()>;

    /// Returns `true` if any triple matches the pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed.
    fn contains(&self, pattern: &TriplePattern) -> GraphResult<bool>;

    /// Returns the number of triples in the graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed.
    fn len(&self) -> GraphResult<usize>;

    /// Returns `true` if the graph holds no triples.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed.
    fn is_empty(&self) -> GraphResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Opens a lazy native iterator over every triple matching the pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed.
    fn find(&self, pattern: &TriplePattern) -> GraphResult<Box<dyn TripleIter>>;

    /// Opens a lazy native iterator over the whole graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is closed.
    fn find_all(&self) -> GraphResult<Box<dyn TripleIter>> {
        self.find(&TriplePattern::any())
    }
}
