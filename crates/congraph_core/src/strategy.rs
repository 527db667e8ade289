//! Synchronization strategies: how reads and writes are admitted.

use parking_lot::{Mutex, RwLock};

/// Policy governing admission of read and write operations.
///
/// The rest of the engine (registry, coordinator, cursors) is written once
/// and parameterized over this trait; only the admission discipline
/// differs between implementations:
///
/// - [`ExclusiveStrategy`] - a single lock, all operations mutually
///   exclusive
/// - [`SplitStrategy`] - reads run concurrently with each other, writes
///   exclude everything
///
/// Admission is not reentrant: code running inside `read_admit` or
/// `write_admit` must not call back into the same strategy.
pub trait SyncStrategy: Send + Sync {
    /// Runs `op` holding read admission.
    fn read_admit<T>(&self, op: impl FnOnce() -> T) -> T;

    /// Runs `op` holding write admission, exclusive of all other admitted
    /// operations.
    fn write_admit<T>(&self, op: impl FnOnce() -> T) -> T;
}

/// A single exclusive lock: every read and write is serialized.
///
/// Simpler and cheaper per operation than [`SplitStrategy`], at the price
/// of zero read concurrency.
#[derive(Debug, Default)]
pub struct ExclusiveStrategy {
    gate: Mutex<()>,
}

impl SyncStrategy for ExclusiveStrategy {
    fn read_admit<T>(&self, op: impl FnOnce() -> T) -> T {
        let _admitted = self.gate.lock();
        op()
    }

    fn write_admit<T>(&self, op: impl FnOnce() -> T) -> T {
        let _admitted = self.gate.lock();
        op()
    }
}

/// A read/write lock pair: reads admit concurrently, writes are exclusive.
///
/// While a write is admitted no new read can begin, so only cursors that
/// were already open can race the coordinator - exactly the case the
/// per-cursor guard arbitrates.
#[derive(Debug, Default)]
pub struct SplitStrategy {
    gate: RwLock<()>,
}

impl SyncStrategy for SplitStrategy {
    fn read_admit<T>(&self, op: impl FnOnce() -> T) -> T {
        let _admitted = self.gate.read();
        op()
    }

    fn write_admit<T>(&self, op: impl FnOnce() -> T) -> T {
        let _admitted = self.gate.write();
        op()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn admissions_pass_values_through() {
        let strategy = ExclusiveStrategy::default();
        assert_eq!(strategy.read_admit(|| 1), 1);
        assert_eq!(strategy.write_admit(|| 2), 2);

        let strategy = SplitStrategy::default();
        assert_eq!(strategy.read_admit(|| 3), 3);
        assert_eq!(strategy.write_admit(|| 4), 4);
    }

    #[test]
    fn split_reads_admit_concurrently() {
        let strategy = Arc::new(SplitStrategy::default());
        let barrier = Arc::new(Barrier::new(2));

        // Both threads must be inside read admission at the same time to
        // get past the barrier; a serializing strategy would deadlock here.
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let strategy = Arc::clone(&strategy);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    strategy.read_admit(|| {
                        barrier.wait();
                    });
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn write_excludes_reads() {
        let strategy = Arc::new(SplitStrategy::default());
        let observed = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let inner_strategy = Arc::clone(&strategy);
        let inner_observed = Arc::clone(&observed);
        strategy.write_admit(|| {
            let reader = thread::spawn(move || {
                inner_strategy.read_admit(|| {
                    inner_observed.store(1, std::sync::atomic::Ordering::SeqCst);
                })
            });
            // The reader must not get admitted while the write is held.
            thread::sleep(std::time::Duration::from_millis(50));
            assert_eq!(observed.load(std::sync::atomic::Ordering::SeqCst), 0);
            reader
        })
        .join()
        .unwrap();
        assert_eq!(observed.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
