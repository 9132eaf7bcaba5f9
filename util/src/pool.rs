//! Bounded, non-blocking object pools for the real-time path (§3 "Pools",
//! §5 "Shared resources"). Allocation must never block and never fail the
//! caller — on exhaustion the pool grows an excess item rather than
//! stalling the pipeline thread, and logs so operators can see the pool is
//! undersized. Steady-state operation after warm-up never touches the
//! allocator: every `release` returns the item to the free list instead of
//! dropping it.
//!
//! The free list is a `parking_lot::Mutex`-guarded stack rather than a
//! hand-rolled lock-free structure: contention here is between exactly two
//! threads (network + pipeline, §5), and `parking_lot`'s uncontended path
//! is a handful of instructions, which the corpus consistently prefers
//! over inventing atomics by hand (see DESIGN.md).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

struct Inner<T> {
    free: Mutex<Vec<T>>,
    make: Box<dyn Fn() -> T + Send + Sync>,
    capacity: usize,
    exhausted: AtomicU64,
}

/// A fixed-capacity pool of reusable `T`s. Clone is cheap (it's an `Arc`).
pub struct Pool<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Pool<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("capacity", &self.inner.capacity)
            .field("available", &self.inner.free.lock().len())
            .field("exhausted_count", &self.inner.exhausted.load(Ordering::Relaxed))
            .finish()
    }
}

impl<T> Pool<T> {
    /// Builds a pool pre-filled with `capacity` items produced by `make`.
    /// `make` is only ever called during warm-up and on exhaustion; the hot
    /// path only pops/pushes the free list.
    pub fn new(capacity: usize, make: impl Fn() -> T + Send + Sync + 'static) -> Self {
        let free = (0..capacity).map(|_| make()).collect();
        Self {
            inner: Arc::new(Inner {
                free: Mutex::new(free),
                make: Box::new(make),
                capacity,
                exhausted: AtomicU64::new(0),
            }),
        }
    }

    /// Takes an item from the pool. Never blocks. If the free list is
    /// empty, logs (rate-limited by the caller) and manufactures one more
    /// item rather than failing — the spec's allocation-on-exhaustion
    /// fallback applies to *slots*, not to this generic pool primitive.
    pub fn acquire(&self) -> T {
        if let Some(item) = self.inner.free.lock().pop() {
            return item;
        }
        self.inner.exhausted.fetch_add(1, Ordering::Relaxed);
        (self.inner.make)()
    }

    /// Returns an item to the pool. If the pool is already at capacity
    /// (can happen transiently after an exhaustion-driven allocation), the
    /// item is simply dropped instead of growing the free list unbounded.
    pub fn release(&self, item: T) {
        let mut free = self.inner.free.lock();
        if free.len() < self.inner.capacity {
            free.push(item);
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn exhausted_count(&self) -> u64 {
        self.inner.exhausted.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_release_roundtrip_has_no_exhaustion() {
        let pool: Pool<Vec<u8>> = Pool::new(4, || Vec::with_capacity(1500));
        let a = pool.acquire();
        let b = pool.acquire();
        pool.release(a);
        pool.release(b);
        assert_eq!(pool.exhausted_count(), 0);
    }

    #[test]
    fn exhaustion_manufactures_instead_of_blocking() {
        let pool: Pool<u8> = Pool::new(1, || 0u8);
        let _a = pool.acquire();
        let _b = pool.acquire();
        assert_eq!(pool.exhausted_count(), 1);
    }
}
