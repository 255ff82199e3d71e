use clock_bpm::{BufferPoolConfig, BufferPoolManager, DiskManager, MemoryDiskManager, PageId};
use rand::distributions::{Bernoulli, Distribution};
use std::{
    fs::File,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    thread,
};
use tracing::{trace, Level};
use zipf::ZipfDistribution;

static COUNTER: AtomicUsize = AtomicUsize::new(0);
static WRITES: AtomicUsize = AtomicUsize::new(0);

#[test]
fn bench() {
    const THREADS: usize = 8;
    const ITERATIONS: usize = 512; // iterations per thread

    const PAGE_SIZE: usize = 256;
    const FRAMES: usize = 16;
    const DISK_PAGES: usize = 128;

    let log_dir = tempfile::tempdir().unwrap();
    let log_file = File::create(log_dir.path().join("bench.log")).unwrap();

    let stdout_subscriber = tracing_subscriber::fmt()
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false)
        .without_time()
        .with_max_level(Level::TRACE)
        .with_writer(Mutex::new(log_file))
        .finish();
    tracing::subscriber::set_global_default(stdout_subscriber).unwrap();

    let mut disk = MemoryDiskManager::with_max_pages(PAGE_SIZE, DISK_PAGES);
    for _ in 0..DISK_PAGES {
        disk.allocate_page().unwrap();
    }

    let config = BufferPoolConfig::default()
        .with_num_frames(FRAMES)
        .with_page_size(PAGE_SIZE);
    let bpm = BufferPoolManager::new(config, disk.clone()).unwrap();
    let bpm = &bpm;

    // Page 1 is the hottest page, mapped to `PageId` 0.
    let zipf = ZipfDistribution::new(DISK_PAGES, 1.1).unwrap();
    let coin = Bernoulli::new(0.25).unwrap();
    let zipf = &zipf;

    // Every thread pins at most one page at a time, and there are more frames than threads, so no
    // request can run out of frames.
    thread::scope(|s| {
        for thread in 0..THREADS {
            s.spawn(move || {
                let mut rng = rand::thread_rng();

                for iteration in 0..ITERATIONS {
                    let pid = PageId::new(zipf.sample(&mut rng) as u64 - 1);
                    let ph = bpm.fetch_page(pid).unwrap();

                    trace!("Start  thread {thread}, iteration {iteration} ({pid})");

                    let dirty = coin.sample(&mut rng);
                    if dirty {
                        // The first 8 bytes count how many times the page has been written.
                        let mut guard = ph.write();
                        let count = u64::from_le_bytes(guard[..8].try_into().unwrap());
                        guard[..8].copy_from_slice(&(count + 1).to_le_bytes());
                        WRITES.fetch_add(1, Ordering::SeqCst);
                    } else {
                        let guard = ph.read();
                        std::hint::black_box(&guard[..]);
                    }

                    bpm.unpin_page(pid, dirty).unwrap();
                    COUNTER.fetch_add(1, Ordering::SeqCst);

                    trace!("Finish thread {thread}, iteration {iteration} ({pid})");
                }
            });
        }
    });

    assert_eq!(COUNTER.load(Ordering::SeqCst), THREADS * ITERATIONS);

    bpm.check_invariants();
    assert_eq!(bpm.evictable_count(), bpm.resident_pages().len());
    for pid in bpm.resident_pages() {
        assert_eq!(bpm.pin_count(pid), Some(0));
    }

    // No update may be lost across evictions.
    bpm.flush_all_pages().unwrap();
    let total: u64 = (0..DISK_PAGES as u64)
        .map(|id| {
            let data = disk.page_data(PageId::new(id)).unwrap();
            u64::from_le_bytes(data[..8].try_into().unwrap())
        })
        .sum();
    assert_eq!(total as usize, WRITES.load(Ordering::SeqCst));

    let stats = bpm.stats();
    assert_eq!((stats.hits + stats.misses) as usize, THREADS * ITERATIONS);
    assert!(stats.evictions > 0);
}
