// ABOUTME: Input validation for review requests and comments
// ABOUTME: Title, identifier, and comment rules plus set normalisation

use thiserror::Error;

use crate::types::RequestItem;
use crate::utils::dedup_preserving_order;

pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_ID_LENGTH: usize = 128;
pub const MAX_COMMENT_LENGTH: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title cannot be empty")]
    EmptyTitle,

    #[error("Title exceeds {max} characters (got {0})", max = MAX_TITLE_LENGTH)]
    TitleTooLong(usize),

    #[error("At least one reviewer is required")]
    NoReviewers,

    #[error("Malformed reviewer id: '{0}'")]
    MalformedReviewerId(String),

    #[error("Malformed item id: '{0}'")]
    MalformedItemId(String),

    #[error("Comment cannot be empty")]
    EmptyComment,

    #[error("Comment exceeds {max} characters (got {0})", max = MAX_COMMENT_LENGTH)]
    CommentTooLong(usize),

    #[error("Unknown request state: {0}")]
    UnknownState(String),

    #[error("Unknown workspace role: {0}")]
    UnknownRole(String),

    #[error("Unknown author type: {0}")]
    UnknownAuthorKind(String),
}

/// Punctuation allowed in ids besides ASCII letters and digits. Covers emails, URNs, and
/// identity-provider ids such as `auth0|abc` or `google-oauth2|123`.
const ID_PUNCTUATION: &[char] = &['_', '-', '.', ':', '@', '|', '+', '/'];

fn is_valid_identifier(id: &str) -> bool {
    !id.is_empty()
        && id.chars().count() <= MAX_ID_LENGTH
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ID_PUNCTUATION.contains(&c))
}

/// Trim and check a request title
pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let len = trimmed.chars().count();
    if len > MAX_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong(len));
    }
    Ok(trimmed.to_string())
}

pub fn validate_user_id(user_id: &str) -> Result<(), ValidationError> {
    if is_valid_identifier(user_id) {
        Ok(())
    } else {
        Err(ValidationError::MalformedReviewerId(user_id.to_string()))
    }
}

pub fn validate_item_id(item_id: &str) -> Result<(), ValidationError> {
    if is_valid_identifier(item_id) {
        Ok(())
    } else {
        Err(ValidationError::MalformedItemId(item_id.to_string()))
    }
}

/// Validate reviewer ids and drop duplicates, keeping first-occurrence order.
/// An empty list is accepted here; `create` enforces the non-empty guard itself.
pub fn normalize_reviewers(reviewers: Vec<String>) -> Result<Vec<String>, ValidationError> {
    for reviewer in &reviewers {
        validate_user_id(reviewer)?;
    }
    Ok(dedup_preserving_order(reviewers, |r| r.clone()))
}

/// Validate item ids and drop duplicates, keeping first-occurrence order
pub fn normalize_items(items: Vec<RequestItem>) -> Result<Vec<RequestItem>, ValidationError> {
    for item in &items {
        validate_item_id(&item.item_id)?;
    }
    Ok(dedup_preserving_order(items, |i| i.item_id.clone()))
}

/// Trim and check comment content
pub fn validate_comment_content(content: &str) -> Result<String, ValidationError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyComment);
    }
    let len = trimmed.chars().count();
    if len > MAX_COMMENT_LENGTH {
        return Err(ValidationError::CommentTooLong(len));
    }
    Ok(trimmed.to_string())
}
