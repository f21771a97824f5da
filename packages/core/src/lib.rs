// ABOUTME: Core types, validation, and error taxonomy for Docket
// ABOUTME: Foundational package shared by storage, membership, threads, and requests

pub mod error;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export main types
pub use types::{
    Author, AuthorKind, Comment, CreateRequestInput, Request, RequestItem, RequestState,
    RequestUpdateInput, Role, UserRef, WorkflowAction, WorkspaceMember,
};

// Re-export errors
pub use error::{ReviewError, ReviewResult};

// Re-export utilities
pub use utils::{dedup_preserving_order, generate_id};

// Re-export validation
pub use validation::{
    normalize_items, normalize_reviewers, validate_comment_content, validate_item_id,
    validate_title, validate_user_id, ValidationError, MAX_COMMENT_LENGTH, MAX_ID_LENGTH,
    MAX_TITLE_LENGTH,
};
