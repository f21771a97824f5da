// ABOUTME: Discussion threads for Docket review requests
// ABOUTME: Author-only comment editing over a pluggable thread store

pub mod discussion;

pub use discussion::DiscussionService;
