//! Crate-local worker pool for the per-row transform fan-out.
//!
//! Rayon's implicit global pool panics on first use when its lazy
//! initialization fails, which happens on thread-starved hosts (many test
//! binaries at once, tight containers). The bridge therefore owns a private
//! pool and treats a failed bootstrap as "no pool": the fan-out falls back to
//! its sequential path instead of panicking mid-evaluation.

#![cfg(all(feature = "parallel", not(target_arch = "wasm32")))]

use std::sync::OnceLock;

use rayon::ThreadPool;

/// Rows are coarse units of work; more workers than a typical batch has rows
/// is pure dispatch overhead.
const MAX_WORKERS: usize = 16;

static ROW_POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();

/// `FX_ROW_THREADS` overrides the worker count; otherwise the host's
/// available parallelism, capped at [`MAX_WORKERS`].
fn worker_count() -> usize {
    let from_env = std::env::var("FX_ROW_THREADS")
        .ok()
        .and_then(|raw| raw.parse::<usize>().ok())
        .filter(|&n| n > 0);
    let available = std::thread::available_parallelism().map_or(1, |n| n.get());
    from_env.unwrap_or(available).min(MAX_WORKERS)
}

/// The pool, built on first use and shared by every fan-out thereafter.
/// `None` when no pool could be brought up at any size, single worker
/// included.
pub(crate) fn row_pool() -> Option<&'static ThreadPool> {
    ROW_POOL
        .get_or_init(|| {
            let build = |n| rayon::ThreadPoolBuilder::new().num_threads(n).build().ok();
            let workers = worker_count();
            build(workers).or_else(|| if workers > 1 { build(1) } else { None })
        })
        .as_ref()
}
