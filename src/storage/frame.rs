//! This module contains the definition and implementation of [`Frame`] and [`FrameId`], which
//! are the buffer frames that the buffer pool manager is in charge of.
//!
//! A [`Frame`] holds exactly `page_size` bytes of data. Every frame is allocated once when the
//! pool is built and lives for as long as the pool does: pages move in and out of frames, frames
//! never move.

use parking_lot::RwLock;
use std::fmt::Display;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// The identity of a slot in the buffer pool, in the range `[0, num_frames)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId {
    /// Index into the pool's frame table.
    inner: usize,
}

impl FrameId {
    /// Creates a new `FrameId` from a frame table index.
    pub fn new(index: usize) -> Self {
        Self { inner: index }
    }

    /// Returns the frame table index of this frame.
    pub fn as_usize(self) -> usize {
        self.inner
    }
}

impl Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frame {}", self.inner)
    }
}

/// A shared, lock-protected buffer frame.
pub type FrameRef = Arc<RwLock<Frame>>;

/// An owned buffer frame.
#[derive(Debug)]
pub struct Frame {
    /// The pool slot this buffer belongs to.
    frame_id: FrameId,

    /// The buffer that this `Frame` holds ownership over.
    buf: Box<[u8]>,
}

impl Frame {
    /// Allocates a zeroed frame of `page_size` bytes.
    pub(crate) fn new(frame_id: FrameId, page_size: usize) -> Self {
        Self {
            frame_id,
            buf: vec![0u8; page_size].into_boxed_slice(),
        }
    }

    /// The pool slot this buffer belongs to.
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Overwrites the whole buffer with a page payload.
    ///
    /// # Panics
    ///
    /// Panics if `data` is not exactly as long as the frame. The buffer pool manager checks
    /// payload lengths before installing them.
    pub(crate) fn load(&mut self, data: &[u8]) {
        self.buf.copy_from_slice(data);
    }

    /// Zeroes the whole buffer.
    pub(crate) fn clear(&mut self) {
        self.buf.fill(0);
    }
}

impl Deref for Frame {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}

impl DerefMut for Frame {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buf
    }
}
