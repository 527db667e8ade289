//! # congraph core
//!
//! A concurrent-iteration engine for mutable in-memory triple stores.
//!
//! The underlying stores (see `congraph_store`) are unsynchronized: their
//! native iterators fail as soon as the graph is mutated. This crate makes
//! such a store safe for many threads while keeping reads *lazy* - a query
//! returns a [`Cursor`] immediately, without materializing its result, and
//! the cursor stays valid across later mutations.
//!
//! ## How a write neutralizes open cursors
//!
//! Before a mutation touches the store, a coordinator pass visits every
//! open cursor:
//!
//! - cursors already producing elements are drained into in-memory buffers,
//!   a bounded chunk per visit (round-robin, so no single reader is starved),
//!   and end up *frozen*: pure in-memory sequences that never touch the
//!   store again;
//! - cursors that were obtained but never pulled are simply held locked for
//!   the duration of the write, and their first pull afterwards observes the
//!   post-mutation graph.
//!
//! Writers therefore pay for the snapshots, readers stay wait-free apart
//! from brief per-cursor guard contention, and nobody ever sees a native
//! concurrent-modification fault.
//!
//! ## Choosing a wrapper
//!
//! - [`ConcurrentGraph`] - lazy cursors plus the coordinator, with a
//!   pluggable [`SyncStrategy`] ([`SplitStrategy`] read/write admission by
//!   default, [`ExclusiveStrategy`] for a single global lock).
//! - [`SynchronizedGraph`] - the simple baseline: one lock, every query
//!   materialized eagerly under it. Correct and obvious, but every `find`
//!   pays full materialization cost.
//!
//! ## Example
//!
//! ```rust
//! use congraph_core::ConcurrentGraph;
//! use congraph_store::{MemoryGraph, Node, Triple};
//!
//! fn triple(n: u32) -> Triple {
//!     Triple::new(
//!         Node::iri(format!("urn:s{n}")),
//!         Node::iri("urn:p"),
//!         Node::literal(format!("o{n}")),
//!     )
//! }
//!
//! let graph = ConcurrentGraph::new(MemoryGraph::new());
//! graph.add(triple(1)).unwrap();
//! graph.add(triple(2)).unwrap();
//!
//! let cursor = graph.find_all();
//! assert!(cursor.try_next().unwrap().is_some()); // cursor is in progress
//!
//! graph.add(triple(3)).unwrap(); // freezes the cursor, then mutates
//!
//! // the cursor completes its pre-mutation view without faults
//! let rest: Result<Vec<_>, _> = cursor.collect();
//! assert_eq!(rest.unwrap().len(), 1);
//! assert_eq!(graph.len().unwrap(), 3);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod coordinator;
mod cursor;
mod error;
mod graph;
mod registry;
mod strategy;
mod synchronized;

pub use config::EngineConfig;
pub use cursor::Cursor;
pub use error::{EngineError, EngineResult};
pub use graph::ConcurrentGraph;
pub use strategy::{ExclusiveStrategy, SplitStrategy, SyncStrategy};
pub use synchronized::{SnapshotIter, SynchronizedGraph};
