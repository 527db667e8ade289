//! The modification coordinator.
//!
//! Every mutating call runs [`neutralize`] before touching the underlying
//! graph, always already holding write admission. The pass leaves every
//! registered cursor in a state the mutation cannot corrupt:
//!
//! - cursors that have begun producing elements are drained, a bounded
//!   chunk at a time, until their native sequence is fully buffered, then
//!   swapped to a frozen in-memory backing and deregistered;
//! - cursors that have not started yet are simply held locked until the
//!   mutation is done - they have no native iterator to invalidate, and
//!   their eventual first pull will lazily query the post-mutation graph.
//!
//! Draining round-robins across cursors so a reader actively pulling from
//! one cursor is never blocked behind an unbounded drain of that cursor;
//! each visit moves at most `chunk_size` elements and then releases the
//! guard. Every visit strictly shrinks the remaining native sequence, so
//! the pass terminates.

use crate::config::EngineConfig;
use crate::cursor::{Backing, CursorCell, CursorInner};
use crate::error::EngineResult;
use crate::registry::CursorRegistry;
use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::RawMutex;
use std::collections::VecDeque;
use std::sync::Arc;

type CursorGuard = ArcMutexGuard<RawMutex, CursorInner>;

/// Guards of not-yet-started cursors, held across the mutation.
///
/// Dropping this (after the mutation, or on any early exit) releases every
/// held cursor; its owner's next pull then builds a fresh native iterator
/// over the post-mutation graph.
pub(crate) struct UnstartedHold {
    guards: Vec<CursorGuard>,
}

impl UnstartedHold {
    #[cfg(test)]
    pub(crate) fn held(&self) -> usize {
        self.guards.len()
    }
}

/// Neutralizes every open cursor so a mutation can safely run.
///
/// Returns the hold over unstarted cursors; the caller must keep it alive
/// until the mutation has executed.
///
/// # Errors
///
/// If draining a cursor faults, that cursor is closed and deregistered,
/// every guard already taken is released, and the error is propagated: the
/// mutation must not proceed when iterator safety could not be established.
pub(crate) fn neutralize(
    registry: &CursorRegistry,
    config: &EngineConfig,
) -> EngineResult<UnstartedHold> {
    let mut snapshot = registry.snapshot();
    if config.oldest_first {
        snapshot.sort_by_key(|cell| cell.seq);
    }
    tracing::debug!(open = snapshot.len(), "coordinator pass");

    let mut hold = UnstartedHold { guards: Vec::new() };
    let mut worklist: VecDeque<Arc<CursorCell>> = VecDeque::new();
    for cell in snapshot {
        let guard = cell.inner.lock_arc();
        if guard.started {
            // Do not hold guards of in-progress cursors across the loop;
            // the reader may be pulling from them right now.
            drop(guard);
            worklist.push_back(cell);
        } else {
            hold.guards.push(guard);
        }
    }

    while let Some(cell) = worklist.pop_front() {
        let mut guard = cell.inner.lock();
        match std::mem::replace(&mut guard.backing, Backing::Closed) {
            Backing::Live(mut live) => match live.cache(config.chunk_size) {
                Ok(true) => {
                    guard.backing = Backing::Live(live);
                    drop(guard);
                    worklist.push_back(cell);
                }
                Ok(false) => {
                    let rest = live.take_buffer();
                    live.close_native();
                    tracing::trace!(cursor = %cell.id, buffered = rest.len(), "cursor frozen");
                    guard.backing = Backing::Frozen(rest);
                    drop(guard);
                    registry.remove(&cell.id);
                }
                Err(err) => {
                    // Backing stays Closed; the faulted cursor must not
                    // survive in the registry.
                    live.close_native();
                    drop(guard);
                    registry.remove(&cell.id);
                    return Err(err.into());
                }
            },
            // The reader exhausted or closed the cursor since the snapshot.
            other => {
                guard.backing = other;
                drop(guard);
                registry.remove(&cell.id);
            }
        }
    }

    Ok(hold)
}
