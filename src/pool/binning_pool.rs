//! Thread-local binning pool (§5): `run(f)` publishes `f`, wakes every
//! worker, calls `f(0)` on the calling thread, then blocks until every
//! worker has executed `f(i)`. Used by the threaded circle-binning path
//! (§4.3.8) once the circle count passes
//! [`crate::optimizer::binning::THREADED_BINNING_THRESHOLD`].

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Condvar, Mutex};
use std::thread::JoinHandle;

#[derive(Clone, Copy)]
struct JobPtr(*const (dyn Fn(usize) + Sync));

// SAFETY: a JobPtr is only ever read while `run` is blocked waiting on the
// barrier, so the pointee always outlives every read through this pointer.
unsafe impl Send for JobPtr {}
unsafe impl Sync for JobPtr {}

struct SharedState {
    job: Mutex<Option<JobPtr>>,
    generation: AtomicU64,
    cv_start: Condvar,
    remaining: Mutex<usize>,
    cv_done: Condvar,
    shutdown: AtomicBool,
}

/// A pool of `hardware_concurrency() - 1` worker threads (the calling
/// thread participates as worker 0), local to the thread that created it.
pub struct BinningPool {
    state: std::sync::Arc<SharedState>,
    workers: Vec<JoinHandle<()>>,
    worker_count: usize,
}

impl BinningPool {
    fn new(worker_count: usize) -> Self {
        let state = std::sync::Arc::new(SharedState {
            job: Mutex::new(None),
            generation: AtomicU64::new(0),
            cv_start: Condvar::new(),
            remaining: Mutex::new(0),
            cv_done: Condvar::new(),
            shutdown: AtomicBool::new(false),
        });

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 1..=worker_count {
            let state = state.clone();
            workers.push(std::thread::spawn(move || worker_loop(state, worker_id)));
        }

        Self {
            state,
            workers,
            worker_count,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count + 1
    }

    /// Runs `f(0)` on the calling thread and `f(i)` on worker `i` for
    /// `i in 1..=worker_count`, returning once every invocation has
    /// completed.
    pub fn run<F: Fn(usize) + Sync>(&self, f: F) {
        if self.worker_count == 0 {
            f(0);
            return;
        }

        let ptr: *const (dyn Fn(usize) + Sync) = &f;
        {
            let mut job = self.state.job.lock().unwrap();
            *job = Some(JobPtr(ptr));
            *self.state.remaining.lock().unwrap() = self.worker_count;
        }
        self.state.generation.fetch_add(1, Ordering::SeqCst);
        self.state.cv_start.notify_all();

        f(0);

        let guard = self.state.remaining.lock().unwrap();
        let _guard = self
            .state
            .cv_done
            .wait_while(guard, |remaining| *remaining > 0)
            .unwrap();
    }
}

impl Drop for BinningPool {
    fn drop(&mut self) {
        self.state.shutdown.store(true, Ordering::SeqCst);
        self.state.generation.fetch_add(1, Ordering::SeqCst);
        self.state.cv_start.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(state: std::sync::Arc<SharedState>, worker_id: usize) {
    let mut seen_generation = 0u64;
    loop {
        let guard = state.job.lock().unwrap();
        let guard = state
            .cv_start
            .wait_while(guard, |_| {
                state.generation.load(Ordering::SeqCst) == seen_generation
                    && !state.shutdown.load(Ordering::SeqCst)
            })
            .unwrap();
        seen_generation = state.generation.load(Ordering::SeqCst);
        if state.shutdown.load(Ordering::SeqCst) {
            return;
        }
        let job = *guard;
        drop(guard);

        if let Some(JobPtr(ptr)) = job {
            // SAFETY: see `JobPtr`'s Send/Sync justification above.
            let func: &(dyn Fn(usize) + Sync) = unsafe { &*ptr };
            func(worker_id);
        }

        let mut remaining = state.remaining.lock().unwrap();
        *remaining -= 1;
        if *remaining == 0 {
            state.cv_done.notify_all();
        }
    }
}

thread_local! {
    static POOL: RefCell<Option<BinningPool>> = const { RefCell::new(None) };
}

impl BinningPool {
    /// Returns this thread's binning pool, creating it on first use.
    pub fn get() -> std::sync::Arc<PoolHandle> {
        POOL.with(|cell| {
            let mut slot = cell.borrow_mut();
            if slot.is_none() {
                let worker_count = crate::pool::hardware_concurrency().saturating_sub(1);
                *slot = Some(BinningPool::new(worker_count));
            }
            std::sync::Arc::new(PoolHandle)
        })
    }
}

/// A zero-sized handle that forwards to the thread-local pool. Kept
/// separate from `BinningPool` itself so `get()` doesn't need to hand out a
/// reference tied to the `RefCell` borrow.
pub struct PoolHandle;

impl PoolHandle {
    pub fn run<F: Fn(usize) + Sync>(&self, f: F) {
        POOL.with(|cell| {
            let slot = cell.borrow();
            slot.as_ref().unwrap().run(f);
        });
    }

    pub fn worker_count(&self) -> usize {
        POOL.with(|cell| cell.borrow().as_ref().unwrap().worker_count())
    }
}
