//! Engine configuration.

use crate::error::{EngineError, EngineResult};

/// Configuration for the concurrent-iteration engine.
///
/// Both knobs tune the coordinator pass a mutation performs over open
/// cursors; neither affects correctness, only write latency and fairness
/// toward concurrently-pulling readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// How many elements one coordinator visit moves from a cursor's native
    /// iterator into its buffer. Must be positive.
    ///
    /// Small chunks keep readers responsive during a write (the per-cursor
    /// guard is released between chunks); large chunks finish the write
    /// sooner.
    pub chunk_size: usize,

    /// Whether the coordinator drains longer-lived in-progress cursors
    /// before newer ones. A pure scheduling heuristic.
    pub oldest_first: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            oldest_first: false,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-visit drain chunk size.
    #[must_use]
    pub const fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Sets whether older cursors are drained first.
    #[must_use]
    pub const fn oldest_first(mut self, value: bool) -> Self {
        self.oldest_first = value;
        self
    }

    pub(crate) fn validate(&self) -> EngineResult<()> {
        if self.chunk_size == 0 {
            return Err(EngineError::invalid_config("chunk_size must be positive"));
        }
        Ok(())
    }
}
