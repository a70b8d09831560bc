use std::{sync::Arc, thread};

use super::*;

fn paths(names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(PathBuf::from).collect()
}

#[test]
fn paths_are_visible_between_begin_and_end() {
    let tracker = FileTracker::new();
    let task = paths(&["a.svg", "a.png"]);
    assert!(tracker.begin_write(&task));
    assert_eq!(tracker.snapshot().in_flight, paths(&["a.png", "a.svg"]));

    assert!(tracker.end_write(&task));
    let snap = tracker.snapshot();
    assert!(snap.in_flight.is_empty());
    assert_eq!(snap.completed, 1);
}

#[test]
fn shared_path_stays_registered_until_every_writer_releases_it() {
    let tracker = FileTracker::new();
    let shared = paths(&["shared.svg"]);
    assert!(tracker.begin_write(&shared));
    assert!(tracker.begin_write(&shared));

    assert!(tracker.end_write(&shared));
    assert_eq!(tracker.snapshot().in_flight, shared);
    assert!(!tracker.wait_idle(Duration::from_millis(10)));

    tracker.abort_write(&shared);
    assert!(tracker.snapshot().in_flight.is_empty());
    assert_eq!(tracker.completed(), 1);
}

#[test]
fn releasing_unregistered_paths_is_a_no_op() {
    let tracker = FileTracker::new();
    tracker.abort_write(&paths(&["never.svg"]));
    assert!(tracker.snapshot().in_flight.is_empty());
}

#[test]
fn abort_does_not_count() {
    let tracker = FileTracker::new();
    let task = paths(&["b.svg"]);
    tracker.begin_write(&task);
    tracker.abort_write(&task);
    assert_eq!(tracker.snapshot(), TrackerSnapshot::default());
}

#[test]
fn cancel_freezes_counter_and_keeps_paths_registered() {
    let tracker = FileTracker::new();
    let done = paths(&["done.svg"]);
    let pending = paths(&["pending.svg"]);
    tracker.begin_write(&done);
    tracker.end_write(&done);
    tracker.begin_write(&pending);

    let snap = tracker.cancel();
    assert_eq!(snap.completed, 1);
    assert_eq!(snap.in_flight, pending);

    assert!(!tracker.end_write(&pending));
    assert!(!tracker.begin_write(&paths(&["late.svg"])));
    assert_eq!(tracker.completed(), 1);
    assert_eq!(tracker.snapshot().in_flight, pending);
}

#[test]
fn concurrent_workers_count_one_per_task() {
    let tracker = Arc::new(FileTracker::new());
    let handles: Vec<_> = (0..8)
        .map(|w| {
            let tracker = Arc::clone(&tracker);
            thread::spawn(move || {
                for i in 0..50 {
                    let task = vec![
                        PathBuf::from(format!("w{w}-{i}.svg")),
                        PathBuf::from(format!("w{w}-{i}.png")),
                    ];
                    assert!(tracker.begin_write(&task));
                    assert!(tracker.end_write(&task));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let snap = tracker.snapshot();
    assert_eq!(snap.completed, 400);
    assert!(snap.in_flight.is_empty());
}

#[test]
fn wait_idle_returns_once_registry_drains() {
    let tracker = Arc::new(FileTracker::new());
    let task = paths(&["slow.svg"]);
    tracker.begin_write(&task);
    assert!(!tracker.wait_idle(Duration::from_millis(10)));

    let worker = {
        let tracker = Arc::clone(&tracker);
        let task = task.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            tracker.abort_write(&task);
        })
    };
    assert!(tracker.wait_idle(Duration::from_secs(5)));
    worker.join().unwrap();
}
