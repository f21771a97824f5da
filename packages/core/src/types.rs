// ABOUTME: Review request type definitions
// ABOUTME: Request aggregate, workflow states, workspace roles, and comment authors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestState {
    Draft,
    #[default]
    Waiting,
    Approved,
    Closed,
}

impl RequestState {
    pub const ALL: [RequestState; 4] = [
        RequestState::Draft,
        RequestState::Waiting,
        RequestState::Approved,
        RequestState::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::Draft => "DRAFT",
            RequestState::Waiting => "WAITING",
            RequestState::Approved => "APPROVED",
            RequestState::Closed => "CLOSED",
        }
    }

    /// States a reviewer may still close
    pub fn is_open(&self) -> bool {
        matches!(self, RequestState::Draft | RequestState::Waiting)
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Ok(RequestState::Draft),
            "WAITING" => Ok(RequestState::Waiting),
            "APPROVED" => Ok(RequestState::Approved),
            "CLOSED" => Ok(RequestState::Closed),
            _ => Err(ValidationError::UnknownState(s.to_string())),
        }
    }
}

/// Role held by a user inside a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Owner,
    Maintainer,
    Writer,
    Reader,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "OWNER",
            Role::Maintainer => "MAINTAINER",
            Role::Writer => "WRITER",
            Role::Reader => "READER",
        }
    }

    /// Owners and maintainers may approve or close requests they review
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Owner | Role::Maintainer)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "OWNER" => Ok(Role::Owner),
            "MAINTAINER" => Ok(Role::Maintainer),
            "WRITER" => Ok(Role::Writer),
            "READER" => Ok(Role::Reader),
            _ => Err(ValidationError::UnknownRole(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceMember {
    pub user_id: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
    pub name: String,
}

impl UserRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorKind {
    User,
    Integration,
}

impl AuthorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorKind::User => "user",
            AuthorKind::Integration => "integration",
        }
    }
}

impl FromStr for AuthorKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(AuthorKind::User),
            "integration" => Ok(AuthorKind::Integration),
            _ => Err(ValidationError::UnknownAuthorKind(s.to_string())),
        }
    }
}

/// Identity that wrote a comment. The variant is fixed when the comment is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Author {
    User { id: String, name: String },
    Integration { id: String, name: String },
}

impl Author {
    pub fn from_parts(kind: AuthorKind, id: String, name: String) -> Self {
        match kind {
            AuthorKind::User => Author::User { id, name },
            AuthorKind::Integration => Author::Integration { id, name },
        }
    }

    pub fn kind(&self) -> AuthorKind {
        match self {
            Author::User { .. } => AuthorKind::User,
            Author::Integration { .. } => AuthorKind::Integration,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Author::User { id, .. } | Author::Integration { id, .. } => id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Author::User { name, .. } | Author::Integration { name, .. } => name,
        }
    }

    /// Same variant and same id. Display names are not part of identity.
    pub fn is_same_identity(&self, other: &Author) -> bool {
        self.kind() == other.kind() && self.id() == other.id()
    }
}

impl From<UserRef> for Author {
    fn from(user: UserRef) -> Self {
        Author::User {
            id: user.id,
            name: user.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestItem {
    pub item_id: String,
}

impl RequestItem {
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
        }
    }
}

/// A reviewable bundle of content-item changes with its own discussion thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: String,
    pub project_id: String,
    pub workspace_id: String,
    pub title: String,
    pub description: Option<String>,
    pub state: RequestState,
    pub created_by: UserRef,
    /// Reviewer user ids, unique, in display order
    pub reviewers: Vec<String>,
    /// Linked content items, unique by item id
    pub items: Vec<RequestItem>,
    pub thread_id: String,
    /// Incremented on every persisted write
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Request {
    pub fn has_reviewer(&self, user_id: &str) -> bool {
        self.reviewers.iter().any(|r| r == user_id)
    }

    pub fn contains_item(&self, item_id: &str) -> bool {
        self.items.iter().any(|i| i.item_id == item_id)
    }

    pub fn item_ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|i| i.item_id.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestInput {
    pub project_id: String,
    pub workspace_id: String,
    pub title: String,
    pub description: Option<String>,
    pub reviewers_id: Vec<String>,
    #[serde(default)]
    pub items: Vec<RequestItem>,
}

/// Full post-update metadata. Every field replaces the stored value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestUpdateInput {
    pub title: String,
    pub description: Option<String>,
    pub state: RequestState,
    pub reviewers_id: Vec<String>,
    pub items: Vec<RequestItem>,
    /// Version the caller last read; `None` uses the version read just before writing
    #[serde(default)]
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub thread_id: String,
    pub author: Author,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowAction {
    Create,
    UpdateMetadata,
    AddItems,
    Approve,
    Close,
    Reopen,
}

impl WorkflowAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowAction::Create => "create",
            WorkflowAction::UpdateMetadata => "update",
            WorkflowAction::AddItems => "add items",
            WorkflowAction::Approve => "approve",
            WorkflowAction::Close => "close",
            WorkflowAction::Reopen => "reopen",
        }
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
