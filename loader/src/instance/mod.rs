// src/instance/mod.rs

//! Singleton enforcement across processes.
//!
//! `InstanceGuard::enter` bumps the shared counter; dropping the guard undoes
//! it. Because the decrement lives in `Drop`, every way out of a run (normal
//! exit, abort, help, second instance, unwinding) decrements exactly once.

pub mod shared_counter;

pub use shared_counter::{SharedCounter, COUNTER_SECTION_NAME};

use crate::ldr_log;
use log::Level;

pub struct InstanceGuard<'a> {
    counter: &'a SharedCounter,
    count:   i32,
}

impl<'a> InstanceGuard<'a> {
    /// Registers this process as a running instance.
    pub fn enter(counter: &'a SharedCounter) -> Self {
        let count = counter.increment();
        ldr_log!(Level::Debug, "instance", "Instance count = {}", count);
        Self { counter, count }
    }

    /// `false` when another instance was already active; the caller must then
    /// do nothing but let the guard drop.
    pub fn is_first(&self) -> bool {
        self.count <= 1
    }

    /// Post-increment value observed on entry.
    pub fn count(&self) -> i32 {
        self.count
    }
}

impl Drop for InstanceGuard<'_> {
    fn drop(&mut self) {
        self.counter.decrement();
    }
}
