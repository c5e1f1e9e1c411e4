//! Process-wide worker pools (§5). Both are lazily initialized singletons
//! with a pool-less public API: callers never see a handle to configure or
//! shut down directly, they just call `run`.

pub mod binning_pool;
pub mod tile_pool;

/// Number of threads to size a pool to, based on the available parallelism
/// of the machine. Falls back to 1 if it cannot be determined.
pub fn hardware_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
