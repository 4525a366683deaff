//! Lock-free SPSC (single producer, single consumer) byte ring.
//!
//! Both serial directions are built on this type. The receive ring is filled
//! by the interrupt handler and drained by the application; the transmit
//! ring is the other way round.
//!
//! # Architecture
//!
//! ```text
//! Producer ──▶ [head] ─── RingBuffer<N> ─── [tail] ──▶ Consumer
//!              writes                         reads
//! ```
//!
//! # Rules
//!
//! - Only the [`Producer`] stores `head`, only the [`Consumer`] stores `tail`
//! - Index loads/stores are single-word atomics, never read-modify-write
//! - One slot stays free so that `head == tail` always means empty

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Fixed-capacity byte ring with `N - 1` usable slots.
///
/// # Safety
///
/// This type uses `UnsafeCell` internally but is safe to use because:
/// - Handles are only handed out by [`RingBuffer::split`], which takes
///   `&mut self`, so there is at most one producer and one consumer
/// - The producer only writes the slot at `head` before publishing it
/// - The consumer only reads slots in `tail..head`
///
/// # Memory Ordering
///
/// - Producer stores `head` with `Release` after writing the slot
/// - Consumer loads `head` with `Acquire` before reading the slot
/// - The same pairing applies to `tail` in the other direction
pub struct RingBuffer<const N: usize> {
    /// Byte storage.
    slots: UnsafeCell<[u8; N]>,

    /// Next write slot, always `< N`.
    head: AtomicUsize,

    /// Next read slot, always `< N`.
    tail: AtomicUsize,
}

// SAFETY: Single producer, single consumer, atomic coordination.
// The split handles make a second producer or consumer unreachable.
unsafe impl<const N: usize> Sync for RingBuffer<N> {}
unsafe impl<const N: usize> Send for RingBuffer<N> {}

impl<const N: usize> RingBuffer<N> {
    /// Mask for wrapping an index to the ring size.
    const MASK: usize = N - 1;

    /// Create a new empty ring.
    ///
    /// # Panics
    ///
    /// Panics at compile time if N is not a power of 2 or is smaller than 2.
    pub const fn new() -> Self {
        const { assert!(N.is_power_of_two() && N >= 2, "Ring size must be a power of 2, at least 2") };

        Self {
            slots: UnsafeCell::new([0u8; N]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Split into the producer and consumer halves.
    ///
    /// Buffered bytes survive a split; dropping both handles and splitting
    /// again resumes where the previous pair stopped.
    pub fn split(&mut self) -> (Producer<'_, N>, Consumer<'_, N>) {
        let ring: &Self = self;
        (Producer { ring }, Consumer { ring })
    }

    /// Ring size, including the reserved slot.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Snapshot of buffered bytes.
    #[inline]
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        Self::occupancy(head, tail)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn occupancy(head: usize, tail: usize) -> usize {
        head.wrapping_sub(tail) & Self::MASK
    }

    #[inline]
    fn slot(&self, idx: usize) -> *mut u8 {
        debug_assert!(idx < N);
        // SAFETY: idx is masked to the array length by every caller.
        unsafe { (self.slots.get() as *mut u8).add(idx) }
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Write end of a [`RingBuffer`]. Sole owner of `head`.
pub struct Producer<'a, const N: usize> {
    ring: &'a RingBuffer<N>,
}

impl<'a, const N: usize> Producer<'a, N> {
    /// Append a byte.
    ///
    /// Returns the byte back if the ring is full. Never blocks.
    #[inline]
    pub fn enqueue(&mut self, byte: u8) -> Result<(), u8> {
        let head = self.ring.head.load(Ordering::Relaxed);
        let next = (head + 1) & RingBuffer::<N>::MASK;

        if next == self.ring.tail.load(Ordering::Acquire) {
            return Err(byte);
        }

        // SAFETY: Slot `head` is outside `tail..head`, the consumer never
        // reads it until `head` is published below.
        unsafe { self.ring.slot(head).write(byte) };

        self.ring.head.store(next, Ordering::Release);
        Ok(())
    }

    /// True if the next [`enqueue`](Self::enqueue) would fail.
    #[inline]
    pub fn is_full(&self) -> bool {
        let head = self.ring.head.load(Ordering::Relaxed);
        ((head + 1) & RingBuffer::<N>::MASK) == self.ring.tail.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.head.load(Ordering::Relaxed) == self.ring.tail.load(Ordering::Acquire)
    }

    /// Advisory occupancy.
    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Advisory free slots (`N - 1 - len`).
    #[inline]
    pub fn free(&self) -> usize {
        N - 1 - self.len()
    }
}

/// Read end of a [`RingBuffer`]. Sole owner of `tail`.
pub struct Consumer<'a, const N: usize> {
    ring: &'a RingBuffer<N>,
}

impl<'a, const N: usize> Consumer<'a, N> {
    /// Take the oldest byte, or `None` if the ring is empty.
    #[inline]
    pub fn dequeue(&mut self) -> Option<u8> {
        let tail = self.ring.tail.load(Ordering::Relaxed);

        if tail == self.ring.head.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: Slot `tail` is inside `tail..head`, published by the producer.
        let byte = unsafe { self.ring.slot(tail).read() };

        self.ring.tail.store((tail + 1) & RingBuffer::<N>::MASK, Ordering::Release);
        Some(byte)
    }

    /// Look at the oldest byte without taking it.
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        let tail = self.ring.tail.load(Ordering::Relaxed);

        if tail == self.ring.head.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: As in `dequeue`.
        Some(unsafe { self.ring.slot(tail).read() })
    }

    /// Drop everything published so far.
    ///
    /// A byte the producer publishes concurrently may or may not survive.
    #[inline]
    pub fn clear(&mut self) {
        let head = self.ring.head.load(Ordering::Acquire);
        self.ring.tail.store(head, Ordering::Release);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.tail.load(Ordering::Relaxed) == self.ring.head.load(Ordering::Acquire)
    }

    /// Advisory occupancy.
    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Advisory free slots (`N - 1 - len`).
    #[inline]
    pub fn free(&self) -> usize {
        N - 1 - self.len()
    }
}
