//! Page replacement policies.
//!
//! A [`Replacer`] tracks the _candidate set_ of the buffer pool: frames that hold a resident page
//! whose pin count is zero. When the pool has no free frame left, it asks the replacer for a
//! victim among those candidates.

use crate::storage::FrameId;

mod clock;
mod fifo;

pub use clock::ClockReplacer;
pub use fifo::FifoReplacer;

/// A policy that picks which unpinned frame to evict.
///
/// The buffer pool manager calls every method while holding its own lock, so implementations do
/// not need any internal synchronization.
pub trait Replacer: Send {
    /// Creates a replacer for a pool of `num_frames` frames, with no candidates.
    fn new(num_frames: usize) -> Self
    where
        Self: Sized;

    /// Removes `frame_id` from the candidate set. Does nothing if it is not a candidate.
    fn pin(&mut self, frame_id: FrameId);

    /// Adds `frame_id` to the candidate set. Does nothing if it is already a candidate.
    fn unpin(&mut self, frame_id: FrameId);

    /// Picks a candidate, removes it from the candidate set and returns it. Returns `None` if there
    /// are no candidates.
    fn victim(&mut self) -> Option<FrameId>;

    /// Puts back a frame that [`victim`](Self::victim) just returned, so that it is picked again
    /// first. Used when evicting the victim failed.
    fn restore(&mut self, frame_id: FrameId);

    /// The number of candidates.
    fn size(&self) -> usize;

    /// Whether `frame_id` is a candidate.
    fn contains(&self, frame_id: FrameId) -> bool;
}
