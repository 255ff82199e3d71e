//! An in-memory [`DiskManager`], used to exercise the buffer pool without touching a file system.

use super::disk_manager::DiskManager;
use crate::error::{BpmError, Result};
use crate::page::PageId;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::Arc;

/// The default number of live pages a [`MemoryDiskManager`] can hold.
pub const DEFAULT_MAX_PAGES: usize = 15;

/// The state shared by every clone of a [`MemoryDiskManager`].
#[derive(Debug, Default)]
struct MemoryDiskInner {
    /// The size every stored payload must have.
    page_size: usize,
    /// The maximum number of live pages.
    max_pages: usize,
    /// The next page ID to mint.
    next_pid: u64,
    /// The payload of every live page.
    pages: HashMap<PageId, Vec<u8>>,
    /// How many times each page has been written.
    writes: HashMap<PageId, usize>,
    /// Pages whose reads fail with an I/O error.
    failing_reads: HashSet<PageId>,
    /// Pages whose writes fail with an I/O error.
    failing_writes: HashSet<PageId>,
}

/// A page store kept entirely in memory.
///
/// Cloning a `MemoryDiskManager` yields another handle to the same store, so a test can move one
/// handle into a buffer pool and keep another to look at what the pool wrote. It can also be told
/// to fail reads or writes of specific pages.
#[derive(Debug, Clone)]
pub struct MemoryDiskManager {
    /// The shared store.
    inner: Arc<Mutex<MemoryDiskInner>>,
}

impl MemoryDiskManager {
    /// Creates an empty store of `page_size`d pages holding up to [`DEFAULT_MAX_PAGES`] pages.
    pub fn new(page_size: usize) -> Self {
        Self::with_max_pages(page_size, DEFAULT_MAX_PAGES)
    }

    /// Creates an empty store of `page_size`d pages holding up to `max_pages` live pages.
    pub fn with_max_pages(page_size: usize, max_pages: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryDiskInner {
                page_size,
                max_pages,
                ..Default::default()
            })),
        }
    }

    /// Whether `pid` is currently allocated.
    pub fn contains(&self, pid: PageId) -> bool {
        self.inner.lock().pages.contains_key(&pid)
    }

    /// A copy of the bytes stored for `pid`.
    pub fn page_data(&self, pid: PageId) -> Option<Vec<u8>> {
        self.inner.lock().pages.get(&pid).cloned()
    }

    /// The number of live pages.
    pub fn num_pages(&self) -> usize {
        self.inner.lock().pages.len()
    }

    /// How many times `pid` has been written.
    pub fn num_writes(&self, pid: PageId) -> usize {
        self.inner.lock().writes.get(&pid).copied().unwrap_or(0)
    }

    /// How many writes the store has received in total.
    pub fn total_writes(&self) -> usize {
        self.inner.lock().writes.values().sum()
    }

    /// Makes every following read of `pid` fail.
    pub fn fail_reads_of(&self, pid: PageId) {
        self.inner.lock().failing_reads.insert(pid);
    }

    /// Makes every following write of `pid` fail.
    pub fn fail_writes_of(&self, pid: PageId) {
        self.inner.lock().failing_writes.insert(pid);
    }

    /// Removes every injected failure.
    pub fn clear_failures(&self) {
        let mut guard = self.inner.lock();
        guard.failing_reads.clear();
        guard.failing_writes.clear();
    }
}

impl DiskManager for MemoryDiskManager {
    fn read_page(&mut self, pid: PageId) -> Result<Vec<u8>> {
        let guard = self.inner.lock();

        if guard.failing_reads.contains(&pid) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("injected read failure of {pid}"),
            )
            .into());
        }

        let data = guard.pages.get(&pid).cloned();
        data.ok_or(BpmError::PageNotFound(pid))
    }

    fn write_page(&mut self, pid: PageId, data: &[u8]) -> Result<()> {
        let mut guard = self.inner.lock();

        if guard.failing_writes.contains(&pid) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("injected write failure of {pid}"),
            )
            .into());
        }
        if !guard.pages.contains_key(&pid) {
            return Err(BpmError::PageNotFound(pid));
        }
        if data.len() != guard.page_size {
            return Err(BpmError::PageSizeMismatch {
                pid,
                expected: guard.page_size,
                actual: data.len(),
            });
        }

        guard.pages.insert(pid, data.to_vec());
        *guard.writes.entry(pid).or_default() += 1;

        Ok(())
    }

    fn allocate_page(&mut self) -> Result<PageId> {
        let mut guard = self.inner.lock();

        if guard.pages.len() >= guard.max_pages {
            return Err(BpmError::DiskFull);
        }

        let pid = PageId::new(guard.next_pid);
        guard.next_pid += 1;

        let zeroes = vec![0u8; guard.page_size];
        guard.pages.insert(pid, zeroes);

        Ok(pid)
    }

    fn deallocate_page(&mut self, pid: PageId) -> Result<()> {
        self.inner.lock().pages.remove(&pid);
        Ok(())
    }
}
