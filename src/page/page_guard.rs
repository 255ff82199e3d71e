//! Wrappers around `parking_lot`'s `RwLockReadGuard` and `RwLockWriteGuard`, dedicated for pages
//! of data.

use super::PageId;
use crate::storage::frame::Frame;
use parking_lot::{RwLockReadGuard, RwLockWriteGuard};
use std::ops::{Deref, DerefMut};

/// A read guard for a page's [`Frame`].
///
/// This guard can only be dereferenced in read mode, but other threads are allowed to read from
/// this same page at the same time.
///
/// The guard does not pin anything. The page stays in its frame only for as long as the caller
/// holds a pin obtained from the buffer pool manager.
#[derive(Debug)]
pub struct ReadPageGuard<'a> {
    /// The unique page ID of the page this guard read protects.
    pid: PageId,

    /// The `RwLock` read guard of the frame.
    guard: RwLockReadGuard<'a, Frame>,
}

impl<'a> ReadPageGuard<'a> {
    /// Creates a new `ReadPageGuard`.
    pub(crate) fn new(pid: PageId, guard: RwLockReadGuard<'a, Frame>) -> Self {
        Self { pid, guard }
    }

    /// The page this guard protects.
    pub fn pid(&self) -> PageId {
        self.pid
    }
}

impl<'a> Deref for ReadPageGuard<'a> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.guard.deref()
    }
}

/// A write guard for a page's [`Frame`].
///
/// This guard can be dereferenced in both read and write mode, and no other thread can access the
/// page's data while it is held.
///
/// Writing through this guard does not mark the page dirty. Report the modification when
/// unpinning with [`unpin_page`](crate::bpm::BufferPoolManager::unpin_page).
#[derive(Debug)]
pub struct WritePageGuard<'a> {
    /// The unique page ID of the page this guard write protects.
    pid: PageId,

    /// The `RwLock` write guard of the frame.
    guard: RwLockWriteGuard<'a, Frame>,
}

impl<'a> WritePageGuard<'a> {
    /// Creates a new `WritePageGuard`.
    pub(crate) fn new(pid: PageId, guard: RwLockWriteGuard<'a, Frame>) -> Self {
        Self { pid, guard }
    }

    /// The page this guard protects.
    pub fn pid(&self) -> PageId {
        self.pid
    }
}

impl<'a> Deref for WritePageGuard<'a> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.guard.deref()
    }
}

impl<'a> DerefMut for WritePageGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.guard.deref_mut()
    }
}
