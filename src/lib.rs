//! A fixed-size buffer pool manager with a clock (second chance) page replacement policy.
//!
//! The [`BufferPoolManager`](bpm::BufferPoolManager) mediates all access to pages that live on
//! persistent storage behind a [`DiskManager`](storage::DiskManager). It keeps a bounded working
//! set of pages in memory, decides which page to evict once every frame is in use, and guarantees
//! that a pinned page is never evicted.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(clippy::missing_errors_doc)]
#![warn(clippy::missing_panics_doc)]
#![warn(clippy::missing_safety_doc)]

pub mod bpm;
pub mod config;
pub mod error;
pub mod page;
pub mod replacer;
pub mod stats;
pub mod storage;

pub use bpm::BufferPoolManager;
pub use config::BufferPoolConfig;
pub use error::{BpmError, Result};
pub use page::{Page, PageHandle, PageId, ReadPageGuard, WritePageGuard, PAGE_SIZE};
pub use replacer::{ClockReplacer, FifoReplacer, Replacer};
pub use stats::StatsSnapshot;
#[cfg(target_family = "unix")]
pub use storage::FileDiskManager;
pub use storage::{DiskManager, FrameId, MemoryDiskManager};
