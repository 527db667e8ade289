//! # congraph store
//!
//! Triple data model and base graph abstraction for congraph.
//!
//! This crate defines the *unsynchronized* side of the system:
//!
//! - [`Node`], [`Triple`], [`TriplePattern`] - the value types a graph holds
//!   and queries
//! - [`BaseGraph`] - the contract an underlying triple store implements
//! - [`TripleIter`] - the native iterator a graph produces, explicitly unsafe
//!   to drive across a mutation of the same store
//! - [`MemoryGraph`] - an in-memory reference implementation with fail-fast
//!   iterators
//!
//! Thread-safe access on top of a [`BaseGraph`] is provided by the
//! `congraph_core` crate; nothing in this crate coordinates readers and
//! writers.
//!
//! ## Example
//!
//! ```rust
//! use congraph_store::{BaseGraph, MemoryGraph, Node, Triple, TriplePattern};
//!
//! let graph = MemoryGraph::new();
//! graph
//!     .add(Triple::new(
//!         Node::iri("urn:s"),
//!         Node::iri("urn:p"),
//!         Node::literal("o"),
//!     ))
//!     .unwrap();
//!
//! assert_eq!(graph.len().unwrap(), 1);
//! assert!(graph.contains(&TriplePattern::any()).unwrap());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod graph;
mod memory;
mod model;

pub use error::{GraphError, GraphResult};
pub use graph::{BaseGraph, TripleIter};
pub use memory::MemoryGraph;
pub use model::{Node, Triple, TriplePattern};
