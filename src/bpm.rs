//! Implementation of the [`BufferPoolManager`].

use crate::config::BufferPoolConfig;
use crate::error::{BpmError, Result};
use crate::page::{Page, PageHandle, PageId};
use crate::replacer::{ClockReplacer, Replacer};
use crate::stats::{BufferPoolStats, StatsSnapshot};
use crate::storage::{DiskManager, Frame, FrameId, FrameRef, FreeList};
use derivative::Derivative;
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// A fixed-size buffer pool manager that brings logical pages from disk into memory.
///
/// The pool owns `num_frames` buffer frames. Every page access goes through the pool: a page is
/// _pinned_ by [`fetch_page`](Self::fetch_page) or [`new_page`](Self::new_page), and stays in its
/// frame until every pin has been released by [`unpin_page`](Self::unpin_page). When all frames
/// are occupied, the [`Replacer`] picks an unpinned frame to evict, and its page is written back
/// first if it is dirty.
///
/// All bookkeeping (the frame table, the page table, the free list and the replacer) sits behind
/// a single mutex, and every operation holds it from start to finish, including across the calls
/// it makes into the [`DiskManager`]. The manager can therefore be shared between threads behind
/// an [`Arc`], and every operation is atomic with respect to every other one.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct BufferPoolManager<D: DiskManager, R: Replacer = ClockReplacer> {
    /// The total number of buffer frames this buffer pool manager manages.
    num_frames: usize,

    /// The size of every frame in bytes.
    page_size: usize,

    /// Every frame buffer, allocated once up front and indexed by [`FrameId`].
    #[derivative(Debug = "ignore")]
    frames: Box<[FrameRef]>,

    /// The mutable state of the pool.
    #[derivative(Debug = "ignore")]
    inner: Mutex<PoolInner<D, R>>,

    /// Usage counters.
    stats: BufferPoolStats,
}

/// The state guarded by the pool lock. These structures change together under one lock.
struct PoolInner<D, R> {
    /// The frame table: the resident page of every frame, if any.
    pages: Vec<Option<Page>>,

    /// Where each resident page lives.
    page_table: HashMap<PageId, FrameId>,

    /// Frames that hold no page.
    free_list: FreeList,

    /// Frames that hold an unpinned page.
    replacer: R,

    /// The persistent storage behind the pool.
    disk: D,
}

impl<D, R> PoolInner<D, R> {
    /// The page resident in `frame_id`.
    ///
    /// # Panics
    ///
    /// Panics if the frame is empty. Callers only pass frames found in the page table.
    fn page_mut(&mut self, frame_id: FrameId) -> &mut Page {
        self.pages[frame_id.as_usize()]
            .as_mut()
            .unwrap_or_else(|| panic!("page table points at {frame_id}, which holds no page"))
    }

    /// Looks up the frame of a resident page.
    fn frame_of(&self, pid: PageId) -> Result<FrameId> {
        self.page_table
            .get(&pid)
            .copied()
            .ok_or(BpmError::NotResident(pid))
    }
}

impl<D: DiskManager> BufferPoolManager<D, ClockReplacer> {
    /// Constructs a new buffer pool manager with a [`ClockReplacer`].
    ///
    /// # Errors
    ///
    /// Returns [`BpmError::InvalidConfig`] if the configuration has no frames or a zero page size.
    pub fn new(config: BufferPoolConfig, disk: D) -> Result<Self> {
        Self::with_replacer(config, disk)
    }
}

impl<D: DiskManager, R: Replacer> BufferPoolManager<D, R> {
    /// Constructs a new buffer pool manager using replacement policy `R`.
    ///
    /// All frames are allocated up front and start out on the free list.
    ///
    /// # Errors
    ///
    /// Returns [`BpmError::InvalidConfig`] if the configuration has no frames or a zero page size.
    pub fn with_replacer(config: BufferPoolConfig, disk: D) -> Result<Self> {
        config.validate()?;

        let BufferPoolConfig {
            num_frames,
            page_size,
        } = config;

        let frames: Box<[FrameRef]> = (0..num_frames)
            .map(|i| Arc::new(RwLock::new(Frame::new(FrameId::new(i), page_size))))
            .collect();

        let inner = PoolInner {
            pages: (0..num_frames).map(|_| None).collect(),
            page_table: HashMap::with_capacity(num_frames),
            free_list: FreeList::new(num_frames),
            replacer: R::new(num_frames),
            disk,
        };

        debug!("Created a buffer pool of {num_frames} frames of {page_size} bytes");

        Ok(Self {
            num_frames,
            page_size,
            frames,
            inner: Mutex::new(inner),
            stats: BufferPoolStats::default(),
        })
    }

    /// Gets the number of fixed frames the buffer pool manages.
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Gets the size of every page in bytes.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Fetches a page, pinning it in memory.
    ///
    /// If the page is resident, its pin count goes up and it stops being an eviction candidate.
    /// Otherwise a frame is taken from the free list, or reclaimed from the replacer (writing the
    /// evicted page back first if it is dirty), and the page is read into it with a pin count of
    /// one.
    ///
    /// # Errors
    ///
    /// - [`BpmError::NoFreeFrames`] if the page is not resident and every frame is pinned.
    /// - [`BpmError::PageNotFound`] or an I/O error if the page cannot be read. Nothing in the
    ///   pool changes in that case.
    /// - An I/O error if the evicted page cannot be written back. The evicted page stays resident
    ///   and is the replacer's next victim again.
    pub fn fetch_page(&self, pid: PageId) -> Result<PageHandle> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        if let Some(&frame_id) = inner.page_table.get(&pid) {
            let page = inner.page_mut(frame_id);
            let pin_count = page.increment_pin();
            let handle = PageHandle::new(pid, frame_id, page.data().clone());
            inner.replacer.pin(frame_id);

            self.stats.record_hit();
            trace!("Hit: {pid} in {frame_id}, pin count {pin_count}");

            return Ok(handle);
        }

        self.stats.record_miss();
        Self::check_frame_available(inner)?;

        // Read before touching any frame so that a failed read leaves the pool as it was.
        let data = inner.disk.read_page(pid)?;
        self.stats.record_disk_read();
        if data.len() != self.page_size {
            return Err(BpmError::PageSizeMismatch {
                pid,
                expected: self.page_size,
                actual: data.len(),
            });
        }

        let frame_id = self.acquire_frame(inner)?;
        let frame = &self.frames[frame_id.as_usize()];
        frame.write().load(&data);

        debug!("Miss: read {pid} into {frame_id}");

        Ok(self.install(inner, pid, frame_id))
    }

    /// Releases one pin on a page.
    ///
    /// `is_dirty` reports whether the caller modified the page. The page's dirty flag becomes the
    /// logical OR of every hint since it was last loaded or flushed, so a `false` hint never
    /// cleans a dirty page. Once the pin count reaches zero the frame becomes an eviction
    /// candidate. Unpinning a page whose pin count is already zero leaves it at zero.
    ///
    /// # Errors
    ///
    /// Returns [`BpmError::NotResident`] if the page is not in the buffer pool.
    pub fn unpin_page(&self, pid: PageId, is_dirty: bool) -> Result<()> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let frame_id = inner.frame_of(pid)?;
        let page = inner.page_mut(frame_id);

        page.mark_dirty(is_dirty);
        let pin_count = page.decrement_pin();

        if pin_count == 0 {
            inner.replacer.unpin(frame_id);
        }

        trace!("Unpinned {pid} in {frame_id}, pin count {pin_count}, dirty hint {is_dirty}");

        Ok(())
    }

    /// Writes a resident page out to disk and marks it clean.
    ///
    /// The pin count and eviction eligibility of the page are left alone.
    ///
    /// If another thread holds a [`WritePageGuard`](crate::page::WritePageGuard) on the page, the
    /// flush waits for it with the pool unlocked. Must not be called while the calling thread holds
    /// one on the same page.
    ///
    /// # Errors
    ///
    /// Returns [`BpmError::NotResident`] if the page is not in the buffer pool, or left it while
    /// the flush waited for a writer, in which case nothing is written. Returns the disk manager's
    /// error if the write fails.
    pub fn flush_page(&self, pid: PageId) -> Result<()> {
        let mut guard = self.inner.lock();
        self.flush_resident(&mut guard, pid)
    }

    /// Creates a new zeroed page on disk and pins it into a frame.
    ///
    /// # Errors
    ///
    /// - [`BpmError::NoFreeFrames`] if every frame is pinned. Nothing is allocated on disk.
    /// - [`BpmError::DiskFull`] if the disk manager cannot allocate a page. Nothing in the pool
    ///   changes.
    /// - An I/O error if the evicted page cannot be written back. The freshly allocated page is
    ///   released again.
    pub fn new_page(&self) -> Result<PageHandle> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        Self::check_frame_available(inner)?;

        let pid = inner.disk.allocate_page()?;

        let frame_id = match self.acquire_frame(inner) {
            Ok(frame_id) => frame_id,
            Err(e) => {
                if let Err(dealloc) = inner.disk.deallocate_page(pid) {
                    warn!("Unable to release {pid} after a failed allocation: {dealloc}");
                }
                return Err(e);
            }
        };

        self.frames[frame_id.as_usize()].write().clear();
        self.stats.record_allocation();

        debug!("Created {pid} in {frame_id}");

        Ok(self.install(inner, pid, frame_id))
    }

    /// Deletes a page from the buffer pool and from disk.
    ///
    /// Deleting a page that is not resident does nothing. A dirty page is discarded without being
    /// written back.
    ///
    /// # Errors
    ///
    /// Returns [`BpmError::Pinned`] if the page has outstanding pins, or the disk manager's error
    /// if the page cannot be deallocated. Nothing changes in either case.
    pub fn delete_page(&self, pid: PageId) -> Result<()> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let Some(&frame_id) = inner.page_table.get(&pid) else {
            trace!("Delete of {pid}, which is not resident");
            return Ok(());
        };

        let pin_count = inner.page_mut(frame_id).pin_count();
        if pin_count > 0 {
            return Err(BpmError::Pinned { pid, pin_count });
        }

        inner.disk.deallocate_page(pid)?;

        inner.page_table.remove(&pid);
        inner.replacer.pin(frame_id);
        inner.pages[frame_id.as_usize()] = None;
        inner.free_list.give_back(frame_id);

        self.stats.record_deletion();
        debug!("Deleted {pid} from {frame_id}");

        Ok(())
    }

    /// Flushes every resident page, in page ID order.
    ///
    /// A failure to write one page does not stop the others from being written.
    ///
    /// # Errors
    ///
    /// Returns [`BpmError::FlushFailed`] listing every page that could not be written.
    pub fn flush_all_pages(&self) -> Result<()> {
        let mut guard = self.inner.lock();

        let mut pids: Vec<PageId> = guard.page_table.keys().copied().collect();
        pids.sort_unstable();

        let mut failed = Vec::new();
        for pid in pids {
            match self.flush_resident(&mut guard, pid) {
                Ok(()) => {}
                // Evicted or deleted while the pool was unlocked.
                Err(BpmError::NotResident(_)) => {}
                Err(e) => {
                    warn!("Unable to flush {pid}: {e}");
                    failed.push(pid);
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(BpmError::FlushFailed(failed))
        }
    }

    /// The pin count of a resident page, or `None` if it is not resident.
    pub fn pin_count(&self, pid: PageId) -> Option<usize> {
        let mut guard = self.inner.lock();
        let frame_id = guard.frame_of(pid).ok()?;
        Some(guard.page_mut(frame_id).pin_count())
    }

    /// Whether a resident page is dirty, or `None` if it is not resident.
    pub fn is_dirty(&self, pid: PageId) -> Option<bool> {
        let mut guard = self.inner.lock();
        let frame_id = guard.frame_of(pid).ok()?;
        Some(guard.page_mut(frame_id).is_dirty())
    }

    /// Whether a page is in the buffer pool.
    pub fn is_resident(&self, pid: PageId) -> bool {
        self.inner.lock().page_table.contains_key(&pid)
    }

    /// Every resident page, in page ID order.
    pub fn resident_pages(&self) -> Vec<PageId> {
        let mut pids: Vec<PageId> = self.inner.lock().page_table.keys().copied().collect();
        pids.sort_unstable();
        pids
    }

    /// The number of frames that hold no page.
    pub fn free_frame_count(&self) -> usize {
        self.inner.lock().free_list.len()
    }

    /// The number of frames that could be evicted right now.
    pub fn evictable_count(&self) -> usize {
        self.inner.lock().replacer.size()
    }

    /// A snapshot of the pool's usage counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Checks the consistency of the frame table, the page table, the free list and the
    /// replacer.
    ///
    /// # Panics
    ///
    /// Panics with a description of the first violation found:
    /// - a page table entry whose frame holds a different page, or no page,
    /// - a frame that is both free and occupied, or neither,
    /// - an occupied frame that is an eviction candidate while pinned, or is not one while
    ///   unpinned,
    /// - a free frame that is an eviction candidate.
    pub fn check_invariants(&self) {
        let guard = self.inner.lock();

        assert!(guard.page_table.len() <= self.num_frames);

        for (&pid, &frame_id) in &guard.page_table {
            let page = guard.pages[frame_id.as_usize()]
                .as_ref()
                .unwrap_or_else(|| panic!("{pid} maps to the empty {frame_id}"));
            assert_eq!(page.id(), pid, "{frame_id} holds {} but {pid} maps to it", page.id());
        }

        for (index, slot) in guard.pages.iter().enumerate() {
            let frame_id = FrameId::new(index);
            let is_free = guard.free_list.contains(frame_id);
            let is_candidate = guard.replacer.contains(frame_id);

            match slot {
                None => {
                    assert!(is_free, "{frame_id} holds no page but is not free");
                    assert!(!is_candidate, "{frame_id} holds no page but is a candidate");
                }
                Some(page) => {
                    assert!(!is_free, "{frame_id} holds {} but is free", page.id());
                    assert_eq!(
                        guard.page_table.get(&page.id()),
                        Some(&frame_id),
                        "{frame_id} holds {}, which the page table does not map to it",
                        page.id()
                    );
                    assert_eq!(
                        is_candidate,
                        page.pin_count() == 0,
                        "{frame_id} holds {} with pin count {} but candidate = {is_candidate}",
                        page.id(),
                        page.pin_count()
                    );
                }
            }
        }

        assert_eq!(
            guard.free_list.len() + guard.page_table.len(),
            self.num_frames,
            "free and occupied frames do not add up to the pool size"
        );
    }

    /// Consumes the buffer pool manager without flushing anything, returning its disk manager.
    pub fn into_disk(self) -> D {
        self.inner.into_inner().disk
    }

    /// Fails with [`BpmError::NoFreeFrames`] if there is neither a free frame nor an eviction
    /// candidate.
    fn check_frame_available(inner: &PoolInner<D, R>) -> Result<()> {
        if inner.free_list.is_empty() && inner.replacer.size() == 0 {
            debug!("Every frame is pinned");
            return Err(BpmError::NoFreeFrames);
        }
        Ok(())
    }

    /// Obtains an empty frame, preferring the free list and otherwise evicting the replacer's
    /// victim.
    ///
    /// If the victim's page is dirty it is written back before it leaves the page table. If that
    /// write fails, the victim is restored to the replacer where it was picked and stays resident.
    fn acquire_frame(&self, inner: &mut PoolInner<D, R>) -> Result<FrameId> {
        if let Some(frame_id) = inner.free_list.take() {
            trace!("Took {frame_id} from the free list");
            return Ok(frame_id);
        }

        let frame_id = inner.replacer.victim().ok_or(BpmError::NoFreeFrames)?;

        // A victim should always hold a page, but an empty frame is just as good.
        if let Some(page) = &inner.pages[frame_id.as_usize()] {
            let victim_pid = page.id();

            if page.is_dirty() {
                let data = page.data().read();
                if let Err(e) = inner.disk.write_page(victim_pid, &data) {
                    warn!("Unable to write back {victim_pid} from {frame_id}: {e}");
                    drop(data);
                    inner.replacer.restore(frame_id);
                    return Err(e);
                }
                self.stats.record_disk_write();
            }

            inner.page_table.remove(&victim_pid);
            inner.pages[frame_id.as_usize()] = None;

            self.stats.record_eviction();
            debug!("Evicted {victim_pid} from {frame_id}");
        }

        Ok(frame_id)
    }

    /// Records `pid` as resident in `frame_id` with a single pin and returns a handle to it.
    fn install(&self, inner: &mut PoolInner<D, R>, pid: PageId, frame_id: FrameId) -> PageHandle {
        debug_assert!(!inner.replacer.contains(frame_id));
        debug_assert!(!inner.page_table.contains_key(&pid));

        let frame = self.frames[frame_id.as_usize()].clone();

        inner.pages[frame_id.as_usize()] = Some(Page::new(pid, frame.clone()));
        inner.page_table.insert(pid, frame_id);

        PageHandle::new(pid, frame_id, frame)
    }

    /// Writes a resident page out and marks it clean.
    ///
    /// The page's bytes are written while the pool lock is held, so a modification reported by a
    /// later unpin is never lost. The pool lock is never held while waiting on a frame lock: if
    /// the frame is write-locked, the pool is unlocked until the writer is done and the page is
    /// looked up again.
    fn flush_resident(
        &self,
        guard: &mut MutexGuard<'_, PoolInner<D, R>>,
        pid: PageId,
    ) -> Result<()> {
        loop {
            let frame_id = guard.frame_of(pid)?;
            let frame = self.frames[frame_id.as_usize()].clone();

            let Some(data) = frame.try_read() else {
                trace!("{pid} in {frame_id} is write-locked, waiting with the pool unlocked");
                MutexGuard::unlocked(guard, || drop(frame.read()));
                continue;
            };

            guard.disk.write_page(pid, &data)?;
            drop(data);

            guard.page_mut(frame_id).mark_clean();

            self.stats.record_disk_write();
            debug!("Flushed {pid} from {frame_id}");

            return Ok(());
        }
    }
}
