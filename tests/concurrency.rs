use clock_bpm::{BpmError, BufferPoolConfig, BufferPoolManager, MemoryDiskManager, PageId};
use std::{
    sync::{mpsc, Arc},
    thread,
    time::Duration,
};

const PAGE_SIZE: usize = 64;

fn shared_pool(frames: usize, disk_pages: usize) -> Arc<BufferPoolManager<MemoryDiskManager>> {
    let disk = MemoryDiskManager::with_max_pages(PAGE_SIZE, disk_pages);
    let config = BufferPoolConfig::default()
        .with_num_frames(frames)
        .with_page_size(PAGE_SIZE);
    Arc::new(BufferPoolManager::new(config, disk).unwrap())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_new_pages() {
    const TASKS: usize = 16;
    const PAGES_PER_TASK: usize = 8;

    let bpm = shared_pool(8, TASKS * PAGES_PER_TASK);

    let handles: Vec<_> = (0..TASKS)
        .map(|task| {
            let bpm = bpm.clone();
            tokio::task::spawn_blocking(move || {
                let mut created = Vec::with_capacity(PAGES_PER_TASK);
                while created.len() < PAGES_PER_TASK {
                    let ph = match bpm.new_page() {
                        Ok(ph) => ph,
                        // Other tasks may briefly hold every frame.
                        Err(BpmError::NoFreeFrames) => {
                            std::thread::yield_now();
                            continue;
                        }
                        Err(e) => panic!("unexpected error {e}"),
                    };
                    ph.write().fill(task as u8);
                    bpm.unpin_page(ph.pid(), true).unwrap();
                    created.push(ph.pid());
                }
                (task, created)
            })
        })
        .collect();

    let mut all: Vec<(usize, Vec<PageId>)> = Vec::new();
    for handle in handles {
        all.push(handle.await.unwrap());
    }

    bpm.check_invariants();

    // Every page ID was handed out exactly once.
    let mut pids: Vec<PageId> = all.iter().flat_map(|(_, pids)| pids.clone()).collect();
    pids.sort_unstable();
    pids.dedup();
    assert_eq!(pids.len(), TASKS * PAGES_PER_TASK);

    for (task, pids) in all {
        for pid in pids {
            let ph = bpm.fetch_page(pid).unwrap();
            assert!(ph.read().iter().all(|&b| b == task as u8));
            bpm.unpin_page(pid, false).unwrap();
        }
    }
    bpm.check_invariants();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_pins_on_one_page() {
    const TASKS: usize = 8;
    const ROUNDS: usize = 100;

    let bpm = shared_pool(2, 4);
    let pid = bpm.new_page().unwrap().pid();

    let handles: Vec<_> = (0..TASKS)
        .map(|_| {
            let bpm = bpm.clone();
            tokio::task::spawn_blocking(move || {
                for _ in 0..ROUNDS {
                    let ph = bpm.fetch_page(pid).unwrap();
                    {
                        let mut guard = ph.write();
                        guard[0] = guard[0].wrapping_add(1);
                    }
                    bpm.unpin_page(pid, true).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    // Only the pin taken by `new_page` is left.
    assert_eq!(bpm.pin_count(pid), Some(1));
    assert_eq!(bpm.is_dirty(pid), Some(true));
    assert_eq!(bpm.evictable_count(), 0);

    let ph = bpm.fetch_page(pid).unwrap();
    assert_eq!(ph.read()[0], (TASKS * ROUNDS % 256) as u8);
    bpm.check_invariants();
}

#[test]
fn test_flush_while_writer_needs_the_pool() {
    let disk = MemoryDiskManager::with_max_pages(PAGE_SIZE, 4);
    let config = BufferPoolConfig::default()
        .with_num_frames(4)
        .with_page_size(PAGE_SIZE);
    let bpm = Arc::new(BufferPoolManager::new(config, disk.clone()).unwrap());

    let first = bpm.new_page().unwrap();
    let first_pid = first.pid();
    let (tx, rx) = mpsc::channel();

    // Holds the write lock of one page while asking the pool for another.
    {
        let bpm = bpm.clone();
        let tx = tx.clone();
        thread::spawn(move || {
            let mut guard = first.write();
            guard.fill(b'W');
            thread::sleep(Duration::from_millis(100));

            let second = bpm.new_page().unwrap();
            second.write().copy_from_slice(&guard);
            drop(guard);

            bpm.unpin_page(first.pid(), true).unwrap();
            bpm.unpin_page(second.pid(), true).unwrap();
            tx.send(Some(second.pid())).unwrap();
        });
    }

    // Flushes while the writer holds the page.
    {
        let bpm = bpm.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            bpm.flush_all_pages().unwrap();
            tx.send(None).unwrap();
        });
    }

    let mut second_pid = None;
    for _ in 0..2 {
        let done = rx
            .recv_timeout(Duration::from_secs(10))
            .expect("the pool deadlocked");
        second_pid = second_pid.or(done);
    }
    let second_pid = second_pid.unwrap();

    bpm.flush_all_pages().unwrap();
    assert_eq!(disk.page_data(first_pid).unwrap(), vec![b'W'; PAGE_SIZE]);
    assert_eq!(disk.page_data(second_pid).unwrap(), vec![b'W'; PAGE_SIZE]);
    assert_eq!(bpm.evictable_count(), 2);
    bpm.check_invariants();
}
