//! In-process background work for the API.
//!
//! Photo uploads, compensating deletes, and notifications run on a
//! [`BackgroundTasks`] runner so the request path only waits for what it needs.
//! Every task is tracked until it finishes, a panicking task is logged and
//! reported as an absent outcome, and shutdown drains in-flight work up to a
//! deadline.

pub mod runner;

pub use runner::{BackgroundTasks, TaskHandle};
