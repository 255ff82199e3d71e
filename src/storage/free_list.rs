//! The free-frame allocator.

use super::frame::FrameId;
use std::collections::VecDeque;

/// A FIFO queue of frames that hold no page.
///
/// The buffer pool always asks the free list for a frame before it asks the replacer for a
/// victim, so a cold pool fills every frame before anything is evicted.
#[derive(Debug)]
pub struct FreeList {
    /// Frames in the order they will be handed out.
    frames: VecDeque<FrameId>,
}

impl FreeList {
    /// Creates a free list holding every frame of a pool with `num_frames` frames, in index order.
    pub fn new(num_frames: usize) -> Self {
        Self {
            frames: (0..num_frames).map(FrameId::new).collect(),
        }
    }

    /// Takes the oldest free frame, if there is one.
    pub fn take(&mut self) -> Option<FrameId> {
        self.frames.pop_front()
    }

    /// Puts a frame back at the end of the queue.
    pub fn give_back(&mut self, frame_id: FrameId) {
        debug_assert!(
            !self.frames.contains(&frame_id),
            "{frame_id} was returned to the free list twice"
        );
        self.frames.push_back(frame_id);
    }

    /// Whether `frame_id` is currently free.
    pub fn contains(&self, frame_id: FrameId) -> bool {
        self.frames.contains(&frame_id)
    }

    /// The number of free frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether every frame holds a page.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
