//! Process-wide rasterization worker pool (§5): `run(n, f)` dispatches `n`
//! jobs that every worker (plus the calling thread) pulls via an atomic
//! `fetch_add` counter, returning once all `n` have executed.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, OnceLock};
use std::thread::JoinHandle;

#[derive(Clone, Copy)]
struct JobPtr(*const (dyn Fn(usize) + Sync));

// SAFETY: a JobPtr is only read while `run` is blocked on the completion
// barrier, so the pointee always outlives every read through this pointer.
unsafe impl Send for JobPtr {}
unsafe impl Sync for JobPtr {}

struct SharedState {
    job: Mutex<Option<JobPtr>>,
    job_len: AtomicUsize,
    cursor: AtomicUsize,
    generation: AtomicU64,
    cv_start: Condvar,
    remaining: Mutex<usize>,
    cv_done: Condvar,
    shutdown: AtomicBool,
}

/// A pool of `hardware_concurrency()` worker threads, shared process-wide.
pub struct TilePool {
    state: std::sync::Arc<SharedState>,
    workers: RefCell<Vec<JoinHandle<()>>>,
    worker_count: usize,
}

// SAFETY: the only interior mutability is `workers`, touched solely by
// `Drop`, which runs with exclusive access to the singleton.
unsafe impl Sync for TilePool {}

impl TilePool {
    fn new(worker_count: usize) -> Self {
        let state = std::sync::Arc::new(SharedState {
            job: Mutex::new(None),
            job_len: AtomicUsize::new(0),
            cursor: AtomicUsize::new(0),
            generation: AtomicU64::new(0),
            cv_start: Condvar::new(),
            remaining: Mutex::new(0),
            cv_done: Condvar::new(),
            shutdown: AtomicBool::new(false),
        });

        let mut workers = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let state = state.clone();
            workers.push(std::thread::spawn(move || worker_loop(state)));
        }

        Self {
            state,
            workers: RefCell::new(workers),
            worker_count,
        }
    }

    /// Runs `f(i)` for every `i in 0..n`, split across this pool's workers
    /// and the calling thread, returning once all have completed.
    pub fn run<F: Fn(usize) + Sync>(&self, n: usize, f: F) {
        if n == 0 {
            return;
        }
        if self.worker_count == 0 {
            for i in 0..n {
                f(i);
            }
            return;
        }

        let ptr: *const (dyn Fn(usize) + Sync) = &f;
        {
            let mut job = self.state.job.lock().unwrap();
            *job = Some(JobPtr(ptr));
            self.state.job_len.store(n, Ordering::SeqCst);
            self.state.cursor.store(0, Ordering::SeqCst);
            *self.state.remaining.lock().unwrap() = self.worker_count;
        }
        self.state.generation.fetch_add(1, Ordering::SeqCst);
        self.state.cv_start.notify_all();

        pull_and_run(&self.state, n);

        let guard = self.state.remaining.lock().unwrap();
        let _guard = self
            .state
            .cv_done
            .wait_while(guard, |remaining| *remaining > 0)
            .unwrap();
    }
}

fn pull_and_run(state: &SharedState, n: usize) {
    let job = {
        let guard = state.job.lock().unwrap();
        *guard
    };
    let Some(JobPtr(ptr)) = job else { return };
    // SAFETY: see `JobPtr`'s Send/Sync justification above.
    let func: &(dyn Fn(usize) + Sync) = unsafe { &*ptr };
    loop {
        let i = state.cursor.fetch_add(1, Ordering::SeqCst);
        if i >= n {
            break;
        }
        func(i);
    }
}

impl Drop for TilePool {
    fn drop(&mut self) {
        self.state.shutdown.store(true, Ordering::SeqCst);
        self.state.generation.fetch_add(1, Ordering::SeqCst);
        self.state.cv_start.notify_all();
        for worker in self.workers.borrow_mut().drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(state: std::sync::Arc<SharedState>) {
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
        drop(guard);

        let n = state.job_len.load(Ordering::SeqCst);
        pull_and_run(&state, n);

        let mut remaining = state.remaining.lock().unwrap();
        *remaining -= 1;
        if *remaining == 0 {
            state.cv_done.notify_all();
        }
    }
}

static POOL: OnceLock<TilePool> = OnceLock::new();

/// Returns the process-wide tile rasterization pool, creating it on first
/// use, sized to `hardware_concurrency()`.
pub fn get() -> &'static TilePool {
    POOL.get_or_init(|| TilePool::new(crate::pool::hardware_concurrency()))
}
