//! Pooled byte buffers for frame encoding.
//!
//! Rent a buffer of at least N bytes, hand it to a [`Writer`](crate::writer::Writer), and
//! let it drop: it goes back to a bounded free list for its size class. Classes are powers
//! of two from 16 bytes to 1 MiB; larger requests are allocated and freed normally.
//!
//! Each class is a lock-free `crossbeam_queue::ArrayQueue`, so renting and returning from
//! several threads needs no further synchronization. A rented buffer is owned exclusively
//! by its [`PooledBuffer`] until it is dropped.

use crossbeam_queue::ArrayQueue;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

const MIN_CLASS_SHIFT: u32 = 4;
const MAX_CLASS_SHIFT: u32 = 20;
const CLASS_COUNT: usize = (MAX_CLASS_SHIFT - MIN_CLASS_SHIFT + 1) as usize;

/// Free buffers kept per size class by [`BufferPool::shared`].
pub const DEFAULT_MAX_PER_CLASS: usize = 32;

/// Size-class index and class size for a request of `min_len` bytes, if it is poolable.
fn class_for(min_len: usize) -> Option<(usize, usize)> {
    let size = min_len.max(1 << MIN_CLASS_SHIFT).checked_next_power_of_two()?;
    let shift = size.trailing_zeros();
    if shift > MAX_CLASS_SHIFT {
        return None;
    }
    Some(((shift - MIN_CLASS_SHIFT) as usize, size))
}

#[derive(Debug)]
struct PoolInner {
    classes: Vec<ArrayQueue<Vec<u8>>>,
    clear_on_return: bool,
    allocations: AtomicUsize,
}

impl PoolInner {
    fn give_back(&self, mut buf: Vec<u8>) {
        let Some((index, size)) = class_for(buf.len()) else {
            return;
        };
        if size != buf.len() {
            return;
        }
        if self.clear_on_return {
            buf.fill(0);
        }
        // A full class just drops the buffer.
        let _ = self.classes[index].push(buf);
    }
}

/// Bounded, thread-safe free lists of byte buffers keyed by size class.
#[derive(Debug, Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

impl BufferPool {
    /// A pool keeping at most `max_per_class` free buffers in each size class.
    pub fn new(max_per_class: usize) -> Self {
        Self::build(max_per_class, false)
    }

    /// Like [`BufferPool::new`], but returned buffers are zeroed before reuse.
    pub fn zeroing(max_per_class: usize) -> Self {
        Self::build(max_per_class, true)
    }

    fn build(max_per_class: usize, clear_on_return: bool) -> Self {
        let cap = max_per_class.max(1);
        BufferPool {
            inner: Arc::new(PoolInner {
                classes: (0..CLASS_COUNT).map(|_| ArrayQueue::new(cap)).collect(),
                clear_on_return,
                allocations: AtomicUsize::new(0),
            }),
        }
    }

    /// The process-wide pool.
    pub fn shared() -> &'static BufferPool {
        static SHARED: OnceLock<BufferPool> = OnceLock::new();
        SHARED.get_or_init(|| BufferPool::new(DEFAULT_MAX_PER_CLASS))
    }

    /// A buffer of at least `min_len` bytes. Contents of a reused buffer are unspecified
    /// unless the pool was built with [`BufferPool::zeroing`].
    pub fn rent(&self, min_len: usize) -> PooledBuffer {
        let data = match class_for(min_len) {
            Some((index, size)) => match self.inner.classes[index].pop() {
                Some(buf) => buf,
                None => self.allocate(size),
            },
            None => self.allocate(min_len),
        };
        PooledBuffer { data, pool: Arc::clone(&self.inner) }
    }

    fn allocate(&self, len: usize) -> Vec<u8> {
        self.inner.allocations.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(len, "pool allocation");
        vec![0u8; len]
    }

    /// Buffers allocated because no free one was available.
    pub fn allocations(&self) -> usize {
        self.inner.allocations.load(Ordering::Relaxed)
    }

    /// Free buffers currently held across all classes.
    pub fn pooled(&self) -> usize {
        self.inner.classes.iter().map(ArrayQueue::len).sum()
    }
}

/// A rented buffer; returns to its pool on drop.
pub struct PooledBuffer {
    data: Vec<u8>,
    pool: Arc<PoolInner>,
}

impl PooledBuffer {
    /// Takes the bytes out; the buffer is not returned to the pool.
    pub fn into_vec(mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let data = std::mem::take(&mut self.data);
        if !data.is_empty() {
            self.pool.give_back(data);
        }
    }
}

impl Deref for PooledBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl std::fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBuffer").field("len", &self.data.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn rent_rounds_up_to_class() {
        let pool = BufferPool::new(2);
        assert_eq!(pool.rent(1).len(), 16);
        assert_eq!(pool.rent(17).len(), 32);
        assert_eq!(pool.rent(1024).len(), 1024);
    }

    #[test]
    fn dropped_buffer_is_reused() {
        let pool = BufferPool::new(2);
        drop(pool.rent(100));
        assert_eq!(pool.pooled(), 1);
        let again = pool.rent(120);
        assert_eq!(again.len(), 128);
        assert_eq!(pool.allocations(), 1);
        assert_eq!(pool.pooled(), 0);
    }

    #[test]
    fn oversized_requests_bypass_pool() {
        let pool = BufferPool::new(2);
        let big = pool.rent((1 << MAX_CLASS_SHIFT) + 1);
        assert_eq!(big.len(), (1 << MAX_CLASS_SHIFT) + 1);
        drop(big);
        assert_eq!(pool.pooled(), 0);
    }

    #[test]
    fn class_is_bounded() {
        let pool = BufferPool::new(1);
        let a = pool.rent(10);
        let b = pool.rent(10);
        drop(a);
        drop(b);
        assert_eq!(pool.pooled(), 1);
    }

    #[test]
    fn zeroing_pool_clears() {
        let pool = BufferPool::zeroing(1);
        let mut buf = pool.rent(16);
        buf[0] = 0xAA;
        drop(buf);
        assert_eq!(pool.rent(16)[0], 0);
    }

    #[test]
    fn into_vec_detaches() {
        let pool = BufferPool::new(1);
        let v = pool.rent(16).into_vec();
        assert_eq!(v.len(), 16);
        assert_eq!(pool.pooled(), 0);
    }

    #[test]
    fn rent_from_many_threads() {
        let pool = BufferPool::new(8);
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let pool = pool.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        let mut buf = pool.rent(64);
                        buf[0] = i;
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(pool.pooled() <= 8);
    }
}
