//! Construction-time configuration of a [`BufferPoolManager`](crate::bpm::BufferPoolManager).

use crate::error::{BpmError, Result};
use crate::page::PAGE_SIZE;

/// The default number of frames in a buffer pool.
pub const DEFAULT_NUM_FRAMES: usize = 64;

/// The fixed parameters of a buffer pool. Neither can change after the pool has been built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPoolConfig {
    /// The number of frames, which is the maximum number of resident pages.
    pub num_frames: usize,

    /// The size in bytes of every page payload.
    pub page_size: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            num_frames: DEFAULT_NUM_FRAMES,
            page_size: PAGE_SIZE,
        }
    }
}

impl BufferPoolConfig {
    /// Sets the number of frames.
    pub fn with_num_frames(mut self, num_frames: usize) -> Self {
        self.num_frames = num_frames;
        self
    }

    /// Sets the page size in bytes.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Checks that the configuration describes a usable pool.
    ///
    /// # Errors
    ///
    /// Returns [`BpmError::InvalidConfig`] if either the frame count or the page size is zero.
    pub fn validate(&self) -> Result<()> {
        if self.num_frames == 0 {
            return Err(BpmError::InvalidConfig(
                "a buffer pool needs at least one frame".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(BpmError::InvalidConfig(
                "the page size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
