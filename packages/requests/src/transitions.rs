// ABOUTME: Pure request state transitions with their guards
// ABOUTME: Each function returns the post-transition request or the reason it was refused

use chrono::{DateTime, Utc};

use docket_core::{
    normalize_items, normalize_reviewers, validate_title, CreateRequestInput, Request,
    RequestItem, RequestState, RequestUpdateInput, ReviewError, ReviewResult, UserRef,
    ValidationError, WorkflowAction,
};
use docket_membership::WorkspaceMembership;
use docket_storage::NewRequest;

use crate::linking::union_items;

/// States reachable in one step from `from`, including staying put
pub fn successors(from: RequestState) -> &'static [RequestState] {
    match from {
        RequestState::Draft => &[RequestState::Draft, RequestState::Closed],
        RequestState::Waiting => &[
            RequestState::Waiting,
            RequestState::Approved,
            RequestState::Closed,
        ],
        RequestState::Approved => &[RequestState::Approved],
        RequestState::Closed => &[RequestState::Closed, RequestState::Waiting],
    }
}

fn require_id(kind: &str, value: &str) -> ReviewResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ReviewError::ValidationFailed(format!("{} is required", kind)));
    }
    Ok(trimmed.to_string())
}

fn clean_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

/// Validate creation input into the fields the store persists.
/// New requests always start in `WAITING`.
pub fn new_request(
    input: CreateRequestInput,
    actor: &UserRef,
    now: DateTime<Utc>,
) -> ReviewResult<NewRequest> {
    let project_id = require_id("project id", &input.project_id)?;
    let workspace_id = require_id("workspace id", &input.workspace_id)?;
    let title = validate_title(&input.title)?;

    let reviewers = normalize_reviewers(input.reviewers_id)?;
    if reviewers.is_empty() {
        return Err(ValidationError::NoReviewers.into());
    }
    let items = normalize_items(input.items)?;

    Ok(NewRequest {
        project_id,
        workspace_id,
        title,
        description: clean_description(input.description),
        state: RequestState::Waiting,
        created_by: actor.clone(),
        reviewers,
        items,
        created_at: now,
    })
}

/// Replace title, description, reviewers, and items wholesale.
/// The state must match the current one; lifecycle moves have their own transitions.
pub fn update_metadata(
    request: &Request,
    input: RequestUpdateInput,
    now: DateTime<Utc>,
) -> ReviewResult<Request> {
    if input.state != request.state {
        return Err(ReviewError::not_permitted(
            WorkflowAction::UpdateMetadata,
            format!(
                "cannot move {} from {} to {} through a metadata update",
                request.id, request.state, input.state
            ),
        ));
    }

    let mut updated = request.clone();
    updated.title = validate_title(&input.title)?;
    updated.description = clean_description(input.description);
    updated.reviewers = normalize_reviewers(input.reviewers_id)?;
    updated.items = normalize_items(input.items)?;
    updated.updated_at = now;
    Ok(updated)
}

/// Union `incoming` into the request's items. `None` when every item is already linked.
pub fn add_items(
    request: &Request,
    incoming: Vec<RequestItem>,
    now: DateTime<Utc>,
) -> ReviewResult<Option<Request>> {
    let incoming = normalize_items(incoming)?;
    let items = union_items(&request.items, incoming);
    if items.len() == request.items.len() {
        return Ok(None);
    }

    let mut updated = request.clone();
    updated.items = items;
    updated.updated_at = now;
    Ok(Some(updated))
}

pub fn approve(
    request: &Request,
    actor: &str,
    membership: &WorkspaceMembership,
    now: DateTime<Utc>,
) -> ReviewResult<Request> {
    if let Some(reason) = membership.moderation_denial(request, actor) {
        return Err(ReviewError::not_permitted(WorkflowAction::Approve, reason));
    }
    if request.state != RequestState::Waiting {
        return Err(ReviewError::not_permitted(
            WorkflowAction::Approve,
            format!("{} is {}, not WAITING", request.id, request.state),
        ));
    }

    let mut updated = request.clone();
    updated.state = RequestState::Approved;
    updated.approved_at = request.approved_at.or(Some(now));
    updated.updated_at = now;
    Ok(updated)
}

pub fn close(
    request: &Request,
    actor: &str,
    membership: &WorkspaceMembership,
    now: DateTime<Utc>,
) -> ReviewResult<Request> {
    if let Some(reason) = membership.moderation_denial(request, actor) {
        return Err(ReviewError::not_permitted(WorkflowAction::Close, reason));
    }
    if !request.state.is_open() {
        return Err(ReviewError::not_permitted(
            WorkflowAction::Close,
            format!("{} is already {}", request.id, request.state),
        ));
    }

    let mut updated = request.clone();
    updated.state = RequestState::Closed;
    updated.closed_at = request.closed_at.or(Some(now));
    updated.updated_at = now;
    Ok(updated)
}

/// Move a closed request back to `WAITING`. Requires write access to the workspace;
/// `approved_at` and `closed_at` are kept.
pub fn reopen(
    request: &Request,
    actor: &str,
    membership: &WorkspaceMembership,
    now: DateTime<Utc>,
) -> ReviewResult<Request> {
    if request.workspace_id != membership.workspace_id() || !membership.has_write_access(actor)
    {
        return Err(ReviewError::not_permitted(
            WorkflowAction::Reopen,
            format!("{} has no write access to {}", actor, request.workspace_id),
        ));
    }
    if request.state != RequestState::Closed {
        return Err(ReviewError::not_permitted(
            WorkflowAction::Reopen,
            format!("{} is {}, not CLOSED", request.id, request.state),
        ));
    }

    let mut updated = request.clone();
    updated.state = RequestState::Waiting;
    updated.updated_at = now;
    Ok(updated)
}
