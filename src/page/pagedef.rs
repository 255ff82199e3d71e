//! Definitions and types related to logical pages of data.

use crate::storage::frame::FrameRef;
use derivative::Derivative;
use std::fmt::Display;

/// The default size of a buffer [`Frame`](crate::storage::Frame) / logical [`Page`] of data.
pub const PAGE_SIZE: usize = 1 << 12;

/// A unique identifier for a logical page, minted by a
/// [`DiskManager`](crate::storage::DiskManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    /// Inner representation subject to change...
    inner: u64,
}

impl Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Page {}", self.inner)
    }
}

impl PageId {
    /// Creates a new `PageId` from a `u64`.
    pub fn new(id: u64) -> Self {
        Self { inner: id }
    }

    /// Returns the `PageId` as a `u64`.
    ///
    /// A `PageId` must always be convertible into a unique 64-bit integer.
    pub fn as_u64(self) -> u64 {
        self.inner
    }

    /// Returns the byte offset of this page's data in a file of `page_size`d pages.
    pub(crate) fn offset(self, page_size: usize) -> u64 {
        self.inner * page_size as u64
    }
}

/// A `PageId` must always be convertible into a unique 64-bit integer.
impl From<PageId> for u64 {
    fn from(value: PageId) -> Self {
        value.as_u64()
    }
}

impl From<u64> for PageId {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

/// A page that is resident in the buffer pool.
///
/// The `Page` is the pool's bookkeeping record for one occupied frame: the identity of the page,
/// how many callers currently pin it, and whether its bytes differ from what is on disk. The bytes
/// themselves live in the frame's buffer, which the `Page` shares with every
/// [`PageHandle`](super::PageHandle) handed out for it.
///
/// Only the buffer pool manager mutates a `Page`, and only while holding the pool lock.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Page {
    /// The unique ID of this logical page of data.
    pid: PageId,

    /// The number of outstanding pins. Never negative.
    pin_count: usize,

    /// Set when some unpin reported a modification, cleared only by a flush.
    is_dirty: bool,

    /// The frame buffer holding this page's bytes.
    #[derivative(Debug = "ignore")]
    frame: FrameRef,
}

impl Page {
    /// Installs a freshly loaded or freshly created page: pinned once and clean.
    pub(crate) fn new(pid: PageId, frame: FrameRef) -> Self {
        Self {
            pid,
            pin_count: 1,
            is_dirty: false,
            frame,
        }
    }

    /// The ID of this page.
    pub fn id(&self) -> PageId {
        self.pid
    }

    /// The number of callers currently holding a pin on this page.
    pub fn pin_count(&self) -> usize {
        self.pin_count
    }

    /// Whether the in-memory bytes have been modified since the last load or flush.
    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    /// The frame buffer holding this page's bytes.
    pub fn data(&self) -> &FrameRef {
        &self.frame
    }

    /// Adds one pin and returns the new pin count.
    pub(crate) fn increment_pin(&mut self) -> usize {
        self.pin_count += 1;
        self.pin_count
    }

    /// Removes one pin and returns the new pin count. Decrementing an unpinned page is a no-op.
    pub fn decrement_pin(&mut self) -> usize {
        self.pin_count = self.pin_count.saturating_sub(1);
        self.pin_count
    }

    /// Folds an unpin's dirty hint into the dirty flag. A dirty page never becomes clean here.
    pub(crate) fn mark_dirty(&mut self, is_dirty: bool) {
        self.is_dirty |= is_dirty;
    }

    /// Clears the dirty flag after the page has been written out.
    pub(crate) fn mark_clean(&mut self) {
        self.is_dirty = false;
    }
}
