//! Process-wide default planners.
//!
//! One lazily initialized planner per element type, behind a mutex, for
//! embeddings that do not want to thread a [`Planner`] through their call
//! graph. Everything here is a thin veneer; library code and tests use
//! explicit planners.

use std::sync::{Mutex, MutexGuard, OnceLock};

use crate::planner::Planner;

static PLANNER_F32: OnceLock<Mutex<Planner<f32>>> = OnceLock::new();
static PLANNER_F64: OnceLock<Mutex<Planner<f64>>> = OnceLock::new();

fn lock_f32() -> MutexGuard<'static, Planner<f32>> {
    PLANNER_F32
        .get_or_init(|| Mutex::new(Planner::new()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

fn lock_f64() -> MutexGuard<'static, Planner<f64>> {
    PLANNER_F64
        .get_or_init(|| Mutex::new(Planner::new()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

/// Force both default planners into existence. Optional; the `with_*`
/// accessors initialize on first use.
pub fn init_default_planners() {
    drop(lock_f32());
    drop(lock_f64());
}

/// Run `f` with the process-wide `f32` planner locked.
pub fn with_planner_f32<R>(f: impl FnOnce(&mut Planner<f32>) -> R) -> R {
    f(&mut lock_f32())
}

/// Run `f` with the process-wide `f64` planner locked.
pub fn with_planner_f64<R>(f: impl FnOnce(&mut Planner<f64>) -> R) -> R {
    f(&mut lock_f64())
}

/// Reset both default planners: wisdom, hooks, solver tables, twiddles.
/// Plans already produced stay valid; they own their tables.
pub fn cleanup() {
    *lock_f32() = Planner::new();
    *lock_f64() = Planner::new();
}
