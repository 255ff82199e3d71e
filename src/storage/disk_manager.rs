//! The contract between the buffer pool manager and persistent storage.

use crate::error::Result;
use crate::page::PageId;

/// Reads, writes, allocates and deallocates pages on persistent storage.
///
/// The buffer pool manager owns its disk manager and only calls into it while holding the pool
/// lock, so implementations never see concurrent calls from the same pool and can take `&mut self`.
/// Every call is synchronous from the pool's point of view.
pub trait DiskManager: Send {
    /// Returns the exact payload last written for `pid`.
    ///
    /// # Errors
    ///
    /// Returns [`BpmError::PageNotFound`](crate::BpmError::PageNotFound) if `pid` was never
    /// allocated or has been deallocated, or an I/O error.
    fn read_page(&mut self, pid: PageId) -> Result<Vec<u8>>;

    /// Persists `data` as the content of `pid`, overwriting anything written before.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload could not be persisted.
    fn write_page(&mut self, pid: PageId, data: &[u8]) -> Result<()>;

    /// Mints a fresh page ID that has never been handed out before.
    ///
    /// # Errors
    ///
    /// Returns [`BpmError::DiskFull`](crate::BpmError::DiskFull) if storage is exhausted.
    fn allocate_page(&mut self) -> Result<PageId>;

    /// Releases the storage behind `pid`. Later reads of `pid` are not required to succeed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage could not be released.
    fn deallocate_page(&mut self, pid: PageId) -> Result<()>;
}

impl<D: DiskManager + ?Sized> DiskManager for Box<D> {
    fn read_page(&mut self, pid: PageId) -> Result<Vec<u8>> {
        (**self).read_page(pid)
    }

    fn write_page(&mut self, pid: PageId, data: &[u8]) -> Result<()> {
        (**self).write_page(pid, data)
    }

    fn allocate_page(&mut self) -> Result<PageId> {
        (**self).allocate_page()
    }

    fn deallocate_page(&mut self, pid: PageId) -> Result<()> {
        (**self).deallocate_page(pid)
    }
}
