//! Implementation of functionality related to the management of data in between persistent /
//! non-volatile storage and volatile memory.
//!
//! The buffer pool's side of that boundary is made of [`Frame`]s and the [`FreeList`] of empty
//! frames. The storage side is the [`DiskManager`] trait, with an in-memory and a file-backed
//! implementation.

pub(crate) mod disk_manager;
#[cfg(target_family = "unix")]
pub(crate) mod file_disk;
pub(crate) mod frame;
pub(crate) mod free_list;
pub(crate) mod memory_disk;

pub use disk_manager::DiskManager;
#[cfg(target_family = "unix")]
pub use file_disk::FileDiskManager;
pub use frame::{Frame, FrameId, FrameRef};
pub use free_list::FreeList;
pub use memory_disk::{MemoryDiskManager, DEFAULT_MAX_PAGES};
