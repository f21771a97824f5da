// ABOUTME: Workflow engine for review requests
// ABOUTME: Fetches, checks guards against workspace membership, and persists version-checked replacements

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use docket_config::Config;
use docket_core::{
    CreateRequestInput, Request, RequestItem, RequestUpdateInput, ReviewError, ReviewResult,
    UserRef, WorkflowAction,
};
use docket_membership::{ModerationHint, WorkspaceMembership};
use docket_storage::{
    MembershipSource, PaginatedResponse, PaginationParams, RequestFilter, RequestReplacement,
    RequestSort, RequestStore,
};

use crate::linking::ItemLinker;
use crate::transitions;

/// Result of closing one request in a bulk close
#[derive(Debug, Clone, PartialEq)]
pub struct CloseOutcome {
    pub request_id: String,
    pub result: ReviewResult<Request>,
}

pub struct WorkflowEngine {
    store: Arc<dyn RequestStore>,
    members: Arc<dyn MembershipSource>,
    linker: ItemLinker,
    default_page_size: i64,
}

impl WorkflowEngine {
    pub fn new(
        store: Arc<dyn RequestStore>,
        members: Arc<dyn MembershipSource>,
        config: &Config,
    ) -> Self {
        Self {
            linker: ItemLinker::new(store.clone(), config.write_retries),
            store,
            members,
            default_page_size: config.default_page_size,
        }
    }

    /// Item linking entry points sharing this engine's store
    pub fn linker(&self) -> &ItemLinker {
        &self.linker
    }

    pub async fn get(&self, request_id: &str) -> ReviewResult<Request> {
        self.store
            .get_request(request_id)
            .await?
            .ok_or_else(|| ReviewError::NotFound(format!("request {}", request_id)))
    }

    pub async fn list(
        &self,
        project_id: &str,
        filter: &RequestFilter,
        pagination: Option<PaginationParams>,
        sort: RequestSort,
    ) -> ReviewResult<PaginatedResponse<Request>> {
        let params =
            pagination.unwrap_or_else(|| PaginationParams::first_page(self.default_page_size));
        let (requests, total) = self
            .store
            .list_requests(project_id, filter, &params, sort)
            .await?;
        Ok(PaginatedResponse::new(requests, &params, total))
    }

    pub async fn create(
        &self,
        actor: &UserRef,
        input: CreateRequestInput,
    ) -> ReviewResult<Request> {
        let new = transitions::new_request(input, actor, Utc::now())
            .inspect_err(|e| warn!("{} could not create request: {}", actor.id, e))?;
        let request = self.store.create_request(new).await?;

        info!(
            "Request {} created by {} in project {} ({} reviewers, {} items)",
            request.id,
            actor.id,
            request.project_id,
            request.reviewers.len(),
            request.items.len()
        );
        Ok(request)
    }

    /// Replace title, description, reviewers, and items.
    /// Guarded by `input.expected_version` when given, else by the version just read.
    pub async fn update_metadata(
        &self,
        request_id: &str,
        actor: &UserRef,
        input: RequestUpdateInput,
    ) -> ReviewResult<Request> {
        let current = self.get(request_id).await?;
        let expected_version = input.expected_version.unwrap_or(current.version);

        let updated = transitions::update_metadata(&current, input, Utc::now())
            .inspect_err(|e| warn!("{} could not update {}: {}", actor.id, request_id, e))?;

        let mut replacement = RequestReplacement::from_request(&updated);
        replacement.expected_version = expected_version;
        let saved = self.store.replace_request(request_id, replacement).await?;

        info!("Request {} updated by {}", request_id, actor.id);
        Ok(saved)
    }

    /// Union `items` into the request regardless of its state
    pub async fn add_items(
        &self,
        request_id: &str,
        actor: &UserRef,
        items: Vec<RequestItem>,
    ) -> ReviewResult<Request> {
        self.linker.append(request_id, items, actor, None).await
    }

    pub async fn approve(&self, request_id: &str, actor: &UserRef) -> ReviewResult<Request> {
        self.moderate(WorkflowAction::Approve, request_id, actor, transitions::approve)
            .await
    }

    pub async fn close(&self, request_id: &str, actor: &UserRef) -> ReviewResult<Request> {
        self.moderate(WorkflowAction::Close, request_id, actor, transitions::close)
            .await
    }

    pub async fn reopen(&self, request_id: &str, actor: &UserRef) -> ReviewResult<Request> {
        self.moderate(WorkflowAction::Reopen, request_id, actor, transitions::reopen)
            .await
    }

    /// Close each request independently; one failure does not stop the rest
    pub async fn close_many(&self, request_ids: &[String], actor: &UserRef) -> Vec<CloseOutcome> {
        let mut outcomes = Vec::with_capacity(request_ids.len());
        for request_id in request_ids {
            let result = self.close(request_id, actor).await;
            outcomes.push(CloseOutcome {
                request_id: request_id.clone(),
                result,
            });
        }

        let closed = outcomes.iter().filter(|o| o.result.is_ok()).count();
        info!(
            "{} closed {} of {} requests",
            actor.id,
            closed,
            outcomes.len()
        );
        outcomes
    }

    /// Which moderation controls `actor` may use on the request right now
    pub async fn moderation(&self, request_id: &str, actor: &UserRef) -> ReviewResult<ModerationHint> {
        let request = self.get(request_id).await?;
        let membership = self.membership(&request.workspace_id).await?;
        Ok(ModerationHint::evaluate(&request, &membership, &actor.id))
    }

    async fn membership(&self, workspace_id: &str) -> ReviewResult<WorkspaceMembership> {
        let members = self.members.get_workspace_members(workspace_id).await?;
        debug!(
            "Loaded {} members for workspace {}",
            members.len(),
            workspace_id
        );
        Ok(WorkspaceMembership::new(workspace_id, members))
    }

    async fn moderate<F>(
        &self,
        action: WorkflowAction,
        request_id: &str,
        actor: &UserRef,
        transition: F,
    ) -> ReviewResult<Request>
    where
        F: Fn(
            &Request,
            &str,
            &WorkspaceMembership,
            chrono::DateTime<Utc>,
        ) -> ReviewResult<Request>,
    {
        let current = self.get(request_id).await?;
        let membership = self.membership(&current.workspace_id).await?;

        let updated = transition(&current, &actor.id, &membership, Utc::now()).inspect_err(|e| {
            warn!("{} refused for {} on {}: {}", action, actor.id, request_id, e)
        })?;

        let saved = self
            .store
            .replace_request(request_id, RequestReplacement::from_request(&updated))
            .await
            .inspect_err(|e| warn!("{} on {} failed to persist: {}", action, request_id, e))?;

        info!(
            "Request {} {} -> {} by {}",
            request_id, current.state, saved.state, actor.id
        );
        Ok(saved)
    }
}
