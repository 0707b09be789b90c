//! Run lock behaviour under contention

use metasync_fs::{Error, RunLock, StateLayout};
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::tempdir;

#[test]
fn concurrent_acquires_admit_exactly_one_holder() {
    let dir = tempdir().unwrap();
    let layout = StateLayout::new(dir.path());
    let path = layout.run_lock("moh-fy18").unwrap();

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let release = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            let release = Arc::clone(&release);
            thread::spawn(move || {
                barrier.wait();
                let outcome = RunLock::try_acquire(&path);
                // Hold whatever we got until every thread has tried
                release.wait();
                match outcome {
                    Ok(_lock) => true,
                    Err(Error::LockHeld { .. }) => false,
                    Err(other) => panic!("unexpected error: {other}"),
                }
            })
        })
        .collect();

    let holders = handles
        .into_iter()
        .map(|h| h.join().expect("thread should not panic"))
        .filter(|held| *held)
        .count();

    assert_eq!(holders, 1);
}

#[test]
fn different_pairs_do_not_contend() {
    let dir = tempdir().unwrap();
    let layout = StateLayout::new(dir.path());

    let _a = RunLock::try_acquire(&layout.run_lock("pair-a").unwrap()).unwrap();
    let _b = RunLock::try_acquire(&layout.run_lock("pair-b").unwrap()).unwrap();
}
