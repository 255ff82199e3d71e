//! Implementation of the `PageHandle` type.

use super::page_guard::{ReadPageGuard, WritePageGuard};
use super::PageId;
use crate::storage::frame::{FrameId, FrameRef};

/// A reference to a pinned page, returned by
/// [`fetch_page`](crate::bpm::BufferPoolManager::fetch_page) and
/// [`new_page`](crate::bpm::BufferPoolManager::new_page).
///
/// Every handle corresponds to exactly one pin. Dropping the handle does _not_ release that pin:
/// the caller must call [`unpin_page`](crate::bpm::BufferPoolManager::unpin_page) once it is done
/// with the page, after dropping every guard taken through the handle. A handle that outlives its
/// pin may observe a different page's data once the frame has been reused.
#[derive(Debug, Clone)]
pub struct PageHandle {
    /// The page this handle was created for.
    pub(crate) pid: PageId,

    /// The slot of `frame`.
    pub(crate) frame_id: FrameId,

    /// The frame the page was resident in when the handle was created.
    pub(crate) frame: FrameRef,
}

impl PageHandle {
    /// Creates a handle for `pid`, which currently lives in `frame`.
    pub(crate) fn new(pid: PageId, frame_id: FrameId, frame: FrameRef) -> Self {
        Self {
            pid,
            frame_id,
            frame,
        }
    }

    /// The ID of the page this handle refers to.
    pub fn pid(&self) -> PageId {
        self.pid
    }

    /// The ID of the frame holding the page.
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Gets a read guard on the page's bytes, blocking while a writer holds the frame.
    pub fn read(&self) -> ReadPageGuard<'_> {
        ReadPageGuard::new(self.pid, self.frame.read())
    }

    /// Gets a write guard on the page's bytes, blocking while any other guard holds the frame.
    pub fn write(&self) -> WritePageGuard<'_> {
        WritePageGuard::new(self.pid, self.frame.write())
    }
}
