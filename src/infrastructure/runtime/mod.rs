//! Runtime infrastructure - Tokio runtime bridge for async operations

mod bridge;
mod worker;

pub use bridge::{Operation, Outcome, Request, RuntimeBridge, RuntimeCommand, RuntimeEvent};
pub use worker::{execute, run_async_worker};
