// ABOUTME: Workspace membership resolver
// ABOUTME: Role lookup, reviewer checks, and the assigned-and-privileged moderation gate

use std::collections::HashMap;

use docket_core::{Request, RequestState, Role, WorkspaceMember};
use serde::Serialize;
use tracing::debug;

/// True iff `user_id` is one of the request's reviewers
pub fn is_reviewer(request: &Request, user_id: &str) -> bool {
    request.has_reviewer(user_id)
}

/// Snapshot of the roles held in one workspace.
/// Lookups are total: an unknown user simply holds no role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceMembership {
    workspace_id: String,
    roles: HashMap<String, Role>,
}

impl WorkspaceMembership {
    /// Later entries for the same user replace earlier ones
    pub fn new(
        workspace_id: impl Into<String>,
        members: impl IntoIterator<Item = WorkspaceMember>,
    ) -> Self {
        let roles = members
            .into_iter()
            .map(|member| (member.user_id, member.role))
            .collect();

        Self {
            workspace_id: workspace_id.into(),
            roles,
        }
    }

    pub fn empty(workspace_id: impl Into<String>) -> Self {
        Self::new(workspace_id, Vec::new())
    }

    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn role_of(&self, user_id: &str) -> Option<Role> {
        self.roles.get(user_id).copied()
    }

    /// Owner or maintainer of this workspace
    pub fn is_privileged(&self, user_id: &str) -> bool {
        self.role_of(user_id)
            .map(|role| role.is_privileged())
            .unwrap_or(false)
    }

    /// Any role except reader
    pub fn has_write_access(&self, user_id: &str) -> bool {
        matches!(
            self.role_of(user_id),
            Some(Role::Owner | Role::Maintainer | Role::Writer)
        )
    }

    /// Why `user_id` may not approve or close `request`, or `None` when allowed.
    /// Both factors are required: assigned as reviewer AND holding a privileged role.
    pub fn moderation_denial(&self, request: &Request, user_id: &str) -> Option<String> {
        if request.workspace_id != self.workspace_id {
            return Some(format!(
                "membership is for workspace {}, request belongs to {}",
                self.workspace_id, request.workspace_id
            ));
        }
        if !is_reviewer(request, user_id) {
            return Some(format!("{} is not a reviewer of {}", user_id, request.id));
        }
        match self.role_of(user_id) {
            Some(role) if role.is_privileged() => None,
            Some(role) => Some(format!("reviewer {} holds role {}", user_id, role)),
            None => Some(format!(
                "reviewer {} is not a member of workspace {}",
                user_id, self.workspace_id
            )),
        }
    }

    pub fn can_moderate(&self, request: &Request, user_id: &str) -> bool {
        let denial = self.moderation_denial(request, user_id);
        if let Some(reason) = &denial {
            debug!("Moderation denied on {}: {}", request.id, reason);
        }
        denial.is_none()
    }
}

/// Control enablement for a request screen, computed with the same predicates the
/// workflow engine enforces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationHint {
    pub can_approve: bool,
    pub can_close: bool,
    pub can_reopen: bool,
}

impl ModerationHint {
    pub fn evaluate(request: &Request, membership: &WorkspaceMembership, user_id: &str) -> Self {
        let moderator = membership.can_moderate(request, user_id);

        Self {
            can_approve: moderator && request.state == RequestState::Waiting,
            can_close: moderator && request.state.is_open(),
            can_reopen: request.state == RequestState::Closed
                && request.workspace_id == membership.workspace_id()
                && membership.has_write_access(user_id),
        }
    }
}
