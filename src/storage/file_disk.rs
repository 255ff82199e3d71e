//! This module contains the definition and implementation of [`FileDiskManager`], a
//! [`DiskManager`] that stores every page in a single file.
//!
//! Page `n` lives at byte offset `n * page_size`. Page IDs are handed out in increasing order and
//! the file grows by one zeroed page on every allocation. Deallocated pages keep their space in
//! the file but can no longer be read or written
//! until the file is reopened.

use super::disk_manager::DiskManager;
use crate::error::{BpmError, Result};
use crate::page::PageId;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Manages reads and writes of pages between memory and a single file on persistent storage.
///
/// Only the page data is persisted. The set of deallocated pages lives in memory, so
/// [`open`](Self::open) treats every page slot in the file as live again, including pages that
/// were deallocated before the file was closed.
#[derive(Debug)]
pub struct FileDiskManager {
    /// The path of the backing file.
    path: PathBuf,

    /// The backing file, opened for reading and writing.
    file: File,

    /// The size of every page in the file.
    page_size: usize,

    /// An optional cap on the number of live pages.
    max_pages: Option<usize>,

    /// The next page ID to mint. Also the number of page slots in the file.
    next_pid: u64,

    /// Pages that have been allocated and not deallocated.
    live: HashSet<PageId>,
}

impl FileDiskManager {
    /// Creates a new, empty page file at `path`, truncating anything already there.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created, or if `page_size` is zero.
    pub fn create<P: AsRef<Path>>(path: P, page_size: usize) -> Result<Self> {
        Self::check_page_size(page_size)?;

        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        debug!("Created page file {}", path.display());

        Ok(Self {
            path,
            file,
            page_size,
            max_pages: None,
            next_pid: 0,
            live: HashSet::new(),
        })
    }

    /// Opens an existing page file at `path`. Every whole page already in the file is treated as
    /// allocated, whether or not it was deallocated before the file was last closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, if its length is not a multiple of
    /// `page_size`, or if `page_size` is zero.
    pub fn open<P: AsRef<Path>>(path: P, page_size: usize) -> Result<Self> {
        Self::check_page_size(page_size)?;

        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let len = file.metadata()?.len();
        if len % page_size as u64 != 0 {
            return Err(BpmError::InvalidConfig(format!(
                "{} is {len} bytes long, which is not a multiple of the page size {page_size}",
                path.display()
            )));
        }

        let next_pid = len / page_size as u64;
        let live = (0..next_pid).map(PageId::new).collect();

        debug!(
            "Opened page file {} with {} page(s)",
            path.display(),
            next_pid
        );

        Ok(Self {
            path,
            file,
            page_size,
            max_pages: None,
            next_pid,
            live,
        })
    }

    /// Caps the number of live pages. Allocations beyond the cap fail with
    /// [`BpmError::DiskFull`].
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// The path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The number of live pages.
    pub fn num_pages(&self) -> usize {
        self.live.len()
    }

    /// Flushes all written data to the storage device.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying `fdatasync` fails.
    pub fn sync(&self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }

    /// Rejects a zero page size.
    fn check_page_size(page_size: usize) -> Result<()> {
        if page_size == 0 {
            return Err(BpmError::InvalidConfig(
                "the page size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Fails with [`BpmError::PageNotFound`] unless `pid` is live.
    fn check_live(&self, pid: PageId) -> Result<()> {
        if self.live.contains(&pid) {
            Ok(())
        } else {
            Err(BpmError::PageNotFound(pid))
        }
    }
}

impl DiskManager for FileDiskManager {
    fn read_page(&mut self, pid: PageId) -> Result<Vec<u8>> {
        self.check_live(pid)?;

        let mut buf = vec![0u8; self.page_size];
        self.file.read_exact_at(&mut buf, pid.offset(self.page_size))?;

        Ok(buf)
    }

    fn write_page(&mut self, pid: PageId, data: &[u8]) -> Result<()> {
        self.check_live(pid)?;

        if data.len() != self.page_size {
            return Err(BpmError::PageSizeMismatch {
                pid,
                expected: self.page_size,
                actual: data.len(),
            });
        }

        self.file.write_all_at(data, pid.offset(self.page_size))?;

        Ok(())
    }

    fn allocate_page(&mut self) -> Result<PageId> {
        if self.max_pages.is_some_and(|max| self.live.len() >= max) {
            return Err(BpmError::DiskFull);
        }

        let pid = PageId::new(self.next_pid);

        // Extend the file so that the new page reads back as zeroes.
        self.file
            .set_len(PageId::new(self.next_pid + 1).offset(self.page_size))?;

        self.next_pid += 1;
        self.live.insert(pid);

        Ok(pid)
    }

    fn deallocate_page(&mut self, pid: PageId) -> Result<()> {
        self.live.remove(&pid);
        Ok(())
    }
}
