// ABOUTME: Persistence contracts consumed by the workflow engine and discussion threads
// ABOUTME: Request store, thread store, and workspace membership source

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use docket_core::{Author, Comment, Request, RequestItem, RequestState, UserRef, WorkspaceMember};

use crate::error::StorageResult;
use crate::listing::{RequestFilter, RequestSort};
use crate::pagination::PaginationParams;

/// Fully validated fields for a new request. The store assigns ids and the thread.
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub project_id: String,
    pub workspace_id: String,
    pub title: String,
    pub description: Option<String>,
    pub state: RequestState,
    pub created_by: UserRef,
    pub reviewers: Vec<String>,
    pub items: Vec<RequestItem>,
    pub created_at: DateTime<Utc>,
}

/// Complete post-transition state of the mutable request fields.
/// Applied only if the stored version still equals `expected_version`.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestReplacement {
    pub title: String,
    pub description: Option<String>,
    pub state: RequestState,
    pub reviewers: Vec<String>,
    pub items: Vec<RequestItem>,
    pub updated_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub expected_version: i64,
}

impl RequestReplacement {
    /// Replacement that writes `request` back as-is, guarded by its current version
    pub fn from_request(request: &Request) -> Self {
        Self {
            title: request.title.clone(),
            description: request.description.clone(),
            state: request.state,
            reviewers: request.reviewers.clone(),
            items: request.items.clone(),
            updated_at: request.updated_at,
            approved_at: request.approved_at,
            closed_at: request.closed_at,
            expected_version: request.version,
        }
    }
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Create the request and its discussion thread in one unit of work
    async fn create_request(&self, input: NewRequest) -> StorageResult<Request>;

    async fn get_request(&self, id: &str) -> StorageResult<Option<Request>>;

    /// Replace every mutable field, failing with `Conflict` on a stale version
    async fn replace_request(
        &self,
        id: &str,
        replacement: RequestReplacement,
    ) -> StorageResult<Request>;

    async fn list_requests(
        &self,
        project_id: &str,
        filter: &RequestFilter,
        pagination: &PaginationParams,
        sort: RequestSort,
    ) -> StorageResult<(Vec<Request>, i64)>;
}

#[async_trait]
pub trait ThreadStore: Send + Sync {
    async fn create_thread(&self) -> StorageResult<String>;

    /// Comments in creation order
    async fn list_comments(&self, thread_id: &str) -> StorageResult<Vec<Comment>>;

    async fn get_comment(&self, thread_id: &str, comment_id: &str)
        -> StorageResult<Option<Comment>>;

    async fn add_comment(
        &self,
        thread_id: &str,
        author: &Author,
        content: &str,
    ) -> StorageResult<Comment>;

    async fn edit_comment(
        &self,
        thread_id: &str,
        comment_id: &str,
        content: &str,
    ) -> StorageResult<Comment>;

    async fn remove_comment(&self, thread_id: &str, comment_id: &str) -> StorageResult<()>;
}

#[async_trait]
pub trait MembershipSource: Send + Sync {
    async fn get_workspace_members(&self, workspace_id: &str)
        -> StorageResult<Vec<WorkspaceMember>>;
}
