//! Task domain module.
//!
//! Tasks belong to exactly one event; their status drives the derived
//! per-event progress percentage.

pub mod task;

pub use task::{event_progress, Task, TaskDraft, TaskPriority, TaskStatus, TaskUpdate};
