//! Ring buffer tests

use proptest::prelude::*;
use uart_ring::RingBuffer;

#[test]
fn test_ring_empty() {
    let ring: RingBuffer<64> = RingBuffer::new();
    assert!(ring.is_empty());
    assert_eq!(ring.len(), 0);
    assert_eq!(ring.capacity(), 64);
}

#[test]
fn test_ring_full_then_one_slot() {
    let mut ring: RingBuffer<16> = RingBuffer::new();
    let (mut tx, mut rx) = ring.split();

    for i in 0..15u8 {
        tx.enqueue(i).unwrap();
    }

    // Next write would block
    assert!(tx.is_full());
    assert_eq!(tx.free(), 0);
    assert!(tx.enqueue(0xAA).is_err());

    // Read one: room for exactly one more
    assert_eq!(rx.dequeue(), Some(0));
    assert_eq!(tx.free(), 1);
    assert!(tx.enqueue(0xAA).is_ok());
    assert!(tx.is_full());
}

#[test]
fn test_ring_dequeue_empty() {
    let mut ring: RingBuffer<4> = RingBuffer::new();
    let (_tx, mut rx) = ring.split();
    assert_eq!(rx.dequeue(), None);
    assert_eq!(rx.peek(), None);
}

proptest! {
    #[test]
    fn prop_fifo_order(data in proptest::collection::vec(any::<u8>(), 0..64)) {
        let mut ring: RingBuffer<64> = RingBuffer::new();
        let (mut tx, mut rx) = ring.split();

        for &b in &data {
            prop_assert!(tx.enqueue(b).is_ok());
        }
        let out: Vec<u8> = std::iter::from_fn(|| rx.dequeue()).collect();
        prop_assert_eq!(out, data);
    }

    #[test]
    fn prop_occupancy_plus_free_is_capacity_minus_one(
        ops in proptest::collection::vec(any::<bool>(), 0..200)
    ) {
        let mut ring: RingBuffer<16> = RingBuffer::new();
        let (mut tx, mut rx) = ring.split();
        let mut expected = 0usize;

        for push in ops {
            if push {
                if tx.enqueue(7).is_ok() {
                    expected += 1;
                }
            } else if rx.dequeue().is_some() {
                expected -= 1;
            }
            prop_assert_eq!(rx.len(), expected);
            prop_assert_eq!(rx.len() + rx.free(), 15);
            prop_assert_eq!(tx.len() + tx.free(), 15);
        }
    }

    #[test]
    fn prop_interleaved_fifo(chunks in proptest::collection::vec(1usize..8, 1..40)) {
        let mut ring: RingBuffer<8> = RingBuffer::new();
        let (mut tx, mut rx) = ring.split();
        let mut next_in = 0u8;
        let mut next_out = 0u8;

        for chunk in chunks {
            for _ in 0..chunk {
                if tx.enqueue(next_in).is_ok() {
                    next_in = next_in.wrapping_add(1);
                }
            }
            while let Some(b) = rx.dequeue() {
                prop_assert_eq!(b, next_out);
                next_out = next_out.wrapping_add(1);
            }
        }
        prop_assert_eq!(next_in, next_out);
    }
}
