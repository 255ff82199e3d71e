//! Error types returned by the buffer pool manager and its disk managers.

use crate::page::PageId;
use thiserror::Error;

/// A specialized [`Result`](std::result::Result) type for buffer pool operations.
pub type Result<T> = std::result::Result<T, BpmError>;

/// The errors that buffer pool operations and [`DiskManager`](crate::storage::DiskManager)
/// implementations can return.
///
/// Every failure is surfaced to the caller. Nothing is retried internally.
#[derive(Debug, Error)]
pub enum BpmError {
    /// The page is not in the page table.
    #[error("{0} is not resident in the buffer pool")]
    NotResident(PageId),

    /// The page has outstanding pins and cannot be deleted.
    #[error("{pid} is still pinned (pin count {pin_count})")]
    Pinned {
        /// The page that was referenced.
        pid: PageId,
        /// The pin count at the time of the request.
        pin_count: usize,
    },

    /// Every frame in the pool holds a pinned page.
    #[error("no free frame available: every frame in the buffer pool is pinned")]
    NoFreeFrames,

    /// The disk manager cannot mint any more page IDs.
    #[error("disk is full: unable to allocate a new page")]
    DiskFull,

    /// The disk manager has no data for the page.
    #[error("{0} was not found on disk")]
    PageNotFound(PageId),

    /// The disk manager returned a payload with the wrong length.
    #[error("{pid} has {actual} bytes on disk but the page size is {expected}")]
    PageSizeMismatch {
        /// The page that was read.
        pid: PageId,
        /// The configured page size.
        expected: usize,
        /// The number of bytes returned.
        actual: usize,
    },

    /// An I/O error from the underlying storage.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// `flush_all_pages` was unable to write out the listed pages.
    #[error("failed to flush pages {0:?}")]
    FlushFailed(Vec<PageId>),

    /// The buffer pool was constructed with an unusable configuration.
    #[error("invalid buffer pool configuration: {0}")]
    InvalidConfig(String),
}

impl BpmError {
    /// Returns `true` if the error means a resource ran out, either frames in the pool or space on
    /// disk. The caller may retry after releasing pins or freeing disk pages.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::NoFreeFrames | Self::DiskFull)
    }
}
