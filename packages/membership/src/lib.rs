// ABOUTME: Membership resolution for review requests
// ABOUTME: Pure answers to "is this user privileged" and "may this user moderate"

pub mod resolver;

pub use resolver::{is_reviewer, ModerationHint, WorkspaceMembership};
