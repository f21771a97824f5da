// ABOUTME: Review request workflow for Docket
// ABOUTME: State machine, moderation guards, and item linking over the storage traits

pub mod engine;
pub mod linking;
pub mod transitions;

pub use engine::{CloseOutcome, WorkflowEngine};
pub use linking::{union_items, ItemLinker, ItemSelection};
