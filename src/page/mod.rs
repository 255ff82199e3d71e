//! Implementation of [`Page`], [`PageHandle`] and other related types.
//!
//! This module contains the [`Page`] type, which is the buffer pool's record of a single logical
//! page of data that is currently resident in one of its frames.
//!
//! Users interact with resident pages via the [`PageHandle`] type. Once a user has a
//! [`PageHandle`], they can create a [`ReadPageGuard`] or a [`WritePageGuard`] to access the
//! frame's bytes in either read-locked or write-locked mode.

mod page_guard;
mod page_handle;
mod pagedef;

pub use page_guard::*;
pub use page_handle::*;
pub use pagedef::*;
