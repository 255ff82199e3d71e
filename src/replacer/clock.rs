//! The clock / second chance replacement policy.
//!
//! Candidates sit on a logical ring together with one reference bit each. A cursor, the clock
//! hand, sweeps the ring looking for a victim: a candidate whose bit is set gets its bit cleared
//! and is skipped once, and the first candidate found with a clear bit is evicted. Every full
//! sweep clears every bit it passes, so a victim is always found within two sweeps.
//!
//! Since frame IDs are dense indices, the ring is an array of `prev` / `next` links indexed by
//! frame ID rather than a list of allocated nodes. Every operation is O(1) apart from the sweep
//! itself.

use super::Replacer;
use crate::storage::FrameId;
use tracing::trace;

/// The ring links and reference bit of a single frame.
#[derive(Debug, Clone, Copy, Default)]
struct ClockSlot {
    /// The frame before this one on the ring.
    prev: usize,
    /// The frame after this one on the ring, visited next by the hand.
    next: usize,
    /// The second chance bit.
    referenced: bool,
    /// Whether this frame is currently a candidate.
    in_ring: bool,
}

/// A [`Replacer`] implementing the clock (second chance) algorithm.
#[derive(Debug)]
pub struct ClockReplacer {
    /// One slot per frame in the pool.
    slots: Vec<ClockSlot>,

    /// The candidate the next sweep starts at, or `None` if the ring is empty.
    hand: Option<usize>,

    /// The number of candidates on the ring.
    len: usize,
}

impl ClockReplacer {
    /// The frame the clock hand currently points at.
    pub fn hand(&self) -> Option<FrameId> {
        self.hand.map(FrameId::new)
    }

    /// Inserts `index` just behind the hand, making it the last candidate the next sweep reaches.
    fn link(&mut self, index: usize) {
        match self.hand {
            None => {
                self.slots[index].prev = index;
                self.slots[index].next = index;
                self.hand = Some(index);
            }
            Some(hand) => {
                let prev = self.slots[hand].prev;
                self.slots[index].prev = prev;
                self.slots[index].next = hand;
                self.slots[prev].next = index;
                self.slots[hand].prev = index;
            }
        }

        self.slots[index].in_ring = true;
        self.slots[index].referenced = true;
        self.len += 1;
    }

    /// Takes `index` off the ring, moving the hand past it first if it points at it.
    fn unlink(&mut self, index: usize) {
        debug_assert!(self.slots[index].in_ring);

        let ClockSlot { prev, next, .. } = self.slots[index];

        if self.len == 1 {
            self.hand = None;
        } else {
            if self.hand == Some(index) {
                self.hand = Some(next);
            }
            self.slots[prev].next = next;
            self.slots[next].prev = prev;
        }

        self.slots[index] = ClockSlot::default();
        self.len -= 1;
    }
}

impl Replacer for ClockReplacer {
    fn new(num_frames: usize) -> Self {
        Self {
            slots: vec![ClockSlot::default(); num_frames],
            hand: None,
            len: 0,
        }
    }

    /// # Panics
    ///
    /// Panics if `frame_id` is outside of the pool.
    fn pin(&mut self, frame_id: FrameId) {
        let index = frame_id.as_usize();
        if self.slots[index].in_ring {
            trace!("Clock: {frame_id} is no longer a candidate");
            self.unlink(index);
        }
    }

    /// # Panics
    ///
    /// Panics if `frame_id` is outside of the pool.
    fn unpin(&mut self, frame_id: FrameId) {
        let index = frame_id.as_usize();
        if !self.slots[index].in_ring {
            trace!("Clock: {frame_id} is now a candidate");
            self.link(index);
        }
    }

    fn victim(&mut self) -> Option<FrameId> {
        loop {
            let hand = self.hand?;

            if self.slots[hand].referenced {
                // Second chance.
                self.slots[hand].referenced = false;
                self.hand = Some(self.slots[hand].next);
            } else {
                self.unlink(hand);
                trace!("Clock: chose Frame {hand} as the victim");
                return Some(FrameId::new(hand));
            }
        }
    }

    /// # Panics
    ///
    /// Panics if `frame_id` is outside of the pool.
    fn restore(&mut self, frame_id: FrameId) {
        let index = frame_id.as_usize();
        if self.slots[index].in_ring {
            return;
        }

        // `victim` left the hand on the frame after this one, so linking behind the hand puts
        // the frame back in its old position. It lost its second chance before being picked.
        self.link(index);
        self.slots[index].referenced = false;
        self.hand = Some(index);

        trace!("Clock: restored {frame_id} at the hand");
    }

    fn size(&self) -> usize {
        self.len
    }

    fn contains(&self, frame_id: FrameId) -> bool {
        self.slots
            .get(frame_id.as_usize())
            .is_some_and(|slot| slot.in_ring)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(index: usize) -> FrameId {
        FrameId::new(index)
    }

    #[test]
    fn empty_ring_has_no_victim() {
        let mut clock = ClockReplacer::new(4);
        assert_eq!(clock.size(), 0);
        assert_eq!(clock.hand(), None);
        assert_eq!(clock.victim(), None);
    }

    #[test]
    fn all_referenced_evicts_first_on_second_pass() {
        let mut clock = ClockReplacer::new(4);
        clock.unpin(f(0));
        clock.unpin(f(1));
        clock.unpin(f(2));
        assert_eq!(clock.size(), 3);
        assert_eq!(clock.hand(), Some(f(0)));

        assert_eq!(clock.victim(), Some(f(0)));
        assert_eq!(clock.size(), 2);

        // The first sweep cleared the survivors' bits, so they now go in ring order.
        assert!(!clock.slots[1].referenced);
        assert!(!clock.slots[2].referenced);
        assert_eq!(clock.hand(), Some(f(1)));
        assert_eq!(clock.victim(), Some(f(1)));
        assert_eq!(clock.victim(), Some(f(2)));
        assert_eq!(clock.victim(), None);
    }

    #[test]
    fn unreferenced_frame_at_hand_is_evicted_immediately() {
        let mut clock = ClockReplacer::new(3);
        clock.unpin(f(0));
        clock.unpin(f(1));
        clock.unpin(f(2));
        clock.slots[0].referenced = false;
        clock.slots[2].referenced = false;

        assert_eq!(clock.victim(), Some(f(0)));
        assert!(clock.slots[1].referenced);
        assert_eq!(clock.hand(), Some(f(1)));

        // Frame 1 still has its second chance, frame 2 does not.
        assert_eq!(clock.victim(), Some(f(2)));
        assert_eq!(clock.victim(), Some(f(1)));
    }

    #[test]
    fn unpin_is_idempotent() {
        let mut clock = ClockReplacer::new(2);
        clock.unpin(f(1));
        clock.unpin(f(1));
        assert_eq!(clock.size(), 1);
        assert!(clock.contains(f(1)));
        assert!(!clock.contains(f(0)));
    }

    #[test]
    fn pinned_frames_are_never_victims() {
        let mut clock = ClockReplacer::new(4);
        for i in 0..4 {
            clock.unpin(f(i));
        }
        clock.pin(f(0));
        clock.pin(f(2));
        // Pinning a non-candidate is a no-op.
        clock.pin(f(2));
        assert_eq!(clock.size(), 2);

        let mut victims = vec![clock.victim().unwrap(), clock.victim().unwrap()];
        victims.sort();
        assert_eq!(victims, vec![f(1), f(3)]);
        assert_eq!(clock.victim(), None);
    }

    #[test]
    fn pin_at_hand_advances_hand() {
        let mut clock = ClockReplacer::new(3);
        clock.unpin(f(0));
        clock.unpin(f(1));
        clock.unpin(f(2));
        assert_eq!(clock.hand(), Some(f(0)));

        clock.pin(f(0));
        assert_eq!(clock.hand(), Some(f(1)));

        clock.pin(f(1));
        clock.pin(f(2));
        assert_eq!(clock.hand(), None);
        assert_eq!(clock.size(), 0);
    }

    #[test]
    fn new_candidates_are_reached_last() {
        let mut clock = ClockReplacer::new(4);
        clock.unpin(f(0));
        clock.unpin(f(1));
        clock.unpin(f(2));

        // Clears every bit and evicts frame 0, leaving the hand on frame 1.
        assert_eq!(clock.victim(), Some(f(0)));

        // Frame 3 lands behind the hand with its bit set.
        clock.unpin(f(3));
        assert_eq!(clock.victim(), Some(f(1)));
        assert_eq!(clock.victim(), Some(f(2)));
        assert_eq!(clock.victim(), Some(f(3)));
    }

    #[test]
    fn repinned_frame_gets_a_fresh_second_chance() {
        let mut clock = ClockReplacer::new(2);
        clock.unpin(f(0));
        clock.unpin(f(1));

        assert_eq!(clock.victim(), Some(f(0)));
        assert_eq!(clock.hand(), Some(f(1)));

        clock.pin(f(1));
        clock.unpin(f(1));
        clock.unpin(f(0));

        // Both bits are set again, so the sweep starts over from frame 1.
        assert_eq!(clock.victim(), Some(f(1)));
        assert_eq!(clock.victim(), Some(f(0)));
    }

    #[test]
    fn restored_victim_is_picked_again() {
        let mut clock = ClockReplacer::new(3);
        clock.unpin(f(0));
        clock.unpin(f(1));
        clock.unpin(f(2));

        assert_eq!(clock.victim(), Some(f(0)));
        clock.restore(f(0));
        assert_eq!(clock.size(), 3);
        assert_eq!(clock.hand(), Some(f(0)));
        assert!(!clock.slots[0].referenced);

        assert_eq!(clock.victim(), Some(f(0)));
        assert_eq!(clock.victim(), Some(f(1)));
        assert_eq!(clock.victim(), Some(f(2)));

        // Restoring into an empty ring.
        clock.unpin(f(1));
        assert_eq!(clock.victim(), Some(f(1)));
        clock.restore(f(1));
        assert_eq!(clock.hand(), Some(f(1)));
        assert_eq!(clock.victim(), Some(f(1)));
    }
}
