//! Priority work queue with subsystem-scoped worker budgeting.
//!
//! A dedicated OS thread per worker, blocking on a condition variable
//! instead of polling, the same shape as a tick-loop server thread that
//! waits on a channel rather than an executor. Subsystems replace a single
//! channel with one named, budgeted queue per work kind.

use dare_assets::WorkPriority;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use crate::work_item::WorkItem;

struct QueuedItem {
    priority: WorkPriority,
    sequence: u64,
    item: WorkItem,
}

impl PartialEq for QueuedItem {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}
impl Eq for QueuedItem {}

impl PartialOrd for QueuedItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: higher WorkPriority pops first. Among
        // equal priorities, the lower sequence number (submitted earlier)
        // pops first.
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

struct Queue {
    heap: Mutex<BinaryHeap<QueuedItem>>,
    condvar: Condvar,
    next_sequence: AtomicUsize,
}

impl Queue {
    fn new() -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
            condvar: Condvar::new(),
            next_sequence: AtomicUsize::new(0),
        }
    }

    fn push(&self, priority: WorkPriority, item: WorkItem) {
        let sequence = self.next_sequence.fetch_add(1, AtomicOrdering::Relaxed) as u64;
        let mut heap = self.heap.lock().unwrap();
        heap.push(QueuedItem {
            priority,
            sequence,
            item,
        });
        self.condvar.notify_one();
    }

    /// Blocks until an item is available or the pool is shutting down.
    fn pop(&self, shutdown: &AtomicBool) -> Option<WorkItem> {
        let mut heap = self.heap.lock().unwrap();
        loop {
            if let Some(queued) = heap.pop() {
                return Some(queued.item);
            }
            if shutdown.load(AtomicOrdering::Acquire) {
                return None;
            }
            heap = self.condvar.wait(heap).unwrap();
        }
    }
}

/// A named worker pool scoped to one work kind, with its own min/max
/// worker budget and default priority.
struct Subsystem {
    min_workers: usize,
    max_workers: usize,
    queue: Arc<Queue>,
    handler: Arc<dyn Fn(WorkItem) + Send + Sync>,
    shutdown: Arc<AtomicBool>,
    spawned: Mutex<Vec<JoinHandle<()>>>,
}

impl Subsystem {
    fn spawn_one(&self, name: String) {
        let queue = self.queue.clone();
        let handler = self.handler.clone();
        let shutdown = self.shutdown.clone();
        let thread_name = name.clone();
        let handle = std::thread::Builder::new()
            .name(format!("{name}-worker"))
            .spawn(move || {
                tracing::trace!(subsystem = %thread_name, "worker thread started");
                while let Some(item) = queue.pop(&shutdown) {
                    handler(item);
                }
                tracing::trace!(subsystem = %thread_name, "worker thread stopped");
            })
            .expect("failed to spawn subsystem worker thread");
        self.spawned.lock().unwrap().push(handle);
        tracing::debug!(subsystem = %name, "spawned worker");
    }

    fn worker_count(&self) -> usize {
        self.spawned.lock().unwrap().len()
    }
}

/// The pool honors priority ordering and never drops submitted items: a
/// submission either lands in a registered subsystem's queue or the call
/// panics (a submission to an unregistered subsystem is a programmer
/// error, analogous to the Registry's state-violation handling).
pub struct ThreadPool {
    subsystems: Mutex<HashMap<String, Arc<Subsystem>>>,
}

impl Default for ThreadPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadPool {
    pub fn new() -> Self {
        Self {
            subsystems: Mutex::new(HashMap::new()),
        }
    }

    /// Registers a subsystem and immediately spawns its minimum worker
    /// count. `handler` receives every work item submitted to this
    /// subsystem, on whichever worker thread is free.
    pub fn register_subsystem(
        &self,
        name: &str,
        min_workers: usize,
        max_workers: usize,
        handler: impl Fn(WorkItem) + Send + Sync + 'static,
    ) {
        let subsystem = Arc::new(Subsystem {
            min_workers,
            max_workers,
            queue: Arc::new(Queue::new()),
            handler: Arc::new(handler),
            shutdown: Arc::new(AtomicBool::new(false)),
            spawned: Mutex::new(Vec::new()),
        });
        for _ in 0..min_workers {
            subsystem.spawn_one(name.to_string());
        }
        self.subsystems
            .lock()
            .unwrap()
            .insert(name.to_string(), subsystem);
    }

    /// Requests that up to `n` workers be available for `name`, spawning
    /// additional worker threads (bounded by the subsystem's registered
    /// max) if fewer are currently running.
    pub fn request_workers(&self, name: &str, n: usize) {
        let subsystem = {
            let subsystems = self.subsystems.lock().unwrap();
            match subsystems.get(name) {
                Some(s) => s.clone(),
                None => return,
            }
        };
        let target = n.min(subsystem.max_workers);
        while subsystem.worker_count() < target {
            subsystem.spawn_one(name.to_string());
        }
    }

    /// Submits a work item to a named subsystem's priority queue.
    pub fn submit(&self, name: &str, priority: WorkPriority, item: WorkItem) {
        let subsystem = self
            .subsystems
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_else(|| panic!("submission to unregistered subsystem {name:?}"));
        subsystem.queue.push(priority, item);
    }

    pub fn worker_count(&self, name: &str) -> usize {
        self.subsystems
            .lock()
            .unwrap()
            .get(name)
            .map(|s| s.worker_count())
            .unwrap_or(0)
    }

    pub fn min_workers(&self, name: &str) -> usize {
        self.subsystems
            .lock()
            .unwrap()
            .get(name)
            .map(|s| s.min_workers)
            .unwrap_or(0)
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        tracing::trace!("shutting down thread pool");
        let subsystems = self.subsystems.lock().unwrap();
        for subsystem in subsystems.values() {
            subsystem.shutdown.store(true, AtomicOrdering::Release);
            subsystem.queue.condvar.notify_all();
        }
        for (name, subsystem) in subsystems.iter() {
            let mut handles = subsystem.spawned.lock().unwrap();
            for handle in handles.drain(..) {
                let _ = handle.join();
            }
            tracing::trace!(subsystem = %name, "all workers joined");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn submitted_items_run_in_priority_order() {
        let pool = ThreadPool::new();
        let (tx, rx) = mpsc::channel();
        pool.register_subsystem("test", 0, 1, move |item| {
            if let WorkItem::Custom(f) = item {
                f();
            }
        });
        pool.request_workers("test", 1);

        // Block the single worker on a barrier so all three submissions
        // queue up before any run, making priority ordering observable.
        let release = Arc::new((Mutex::new(false), Condvar::new()));
        let release_clone = release.clone();
        let tx_block = tx.clone();
        pool.submit(
            "test",
            WorkPriority::Low,
            WorkItem::Custom(Box::new(move || {
                let (lock, cvar) = &*release_clone;
                let mut ready = lock.lock().unwrap();
                while !*ready {
                    ready = cvar.wait(ready).unwrap();
                }
                tx_block.send("gate").unwrap();
            })),
        );
        std::thread::sleep(std::time::Duration::from_millis(20));

        let tx2 = tx.clone();
        pool.submit(
            "test",
            WorkPriority::Low,
            WorkItem::Custom(Box::new(move || tx2.send("low").unwrap())),
        );
        let tx3 = tx.clone();
        pool.submit(
            "test",
            WorkPriority::Critical,
            WorkItem::Custom(Box::new(move || tx3.send("critical").unwrap())),
        );

        {
            let (lock, cvar) = &*release;
            *lock.lock().unwrap() = true;
            cvar.notify_all();
        }

        assert_eq!(rx.recv().unwrap(), "gate");
        assert_eq!(rx.recv().unwrap(), "critical");
        assert_eq!(rx.recv().unwrap(), "low");
    }

    #[test]
    fn request_workers_respects_max() {
        let pool = ThreadPool::new();
        pool.register_subsystem("capped", 1, 2, |_item| {});
        pool.request_workers("capped", 10);
        assert_eq!(pool.worker_count("capped"), 2);
    }
}
