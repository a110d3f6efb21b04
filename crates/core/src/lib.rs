//! Core types for the dugong background completion engine.
//!
//! Defines the task entity and its state machine, the normalized
//! completion request exchanged with provider adapters, the append-only
//! stream event log, usage accounting, and the error taxonomy. The
//! provider and runtime crates build on these types; nothing in here
//! performs I/O.

pub mod error;
pub mod event;
pub mod message;
pub mod request;
pub mod task;
pub mod usage;

pub use {
    error::Error,
    event::StreamEvent,
    message::{Message, Role},
    request::{CompletionRequest, Reasoning, StreamOptions},
    task::{OutputMessage, Task, TaskHandle, TaskId, TaskStatus},
    usage::Usage,
};
