// ABOUTME: Request listing filters and sort orders
// ABOUTME: Translates a filter into a parameterised SQL WHERE clause

use docket_core::RequestState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFilter {
    /// Case-insensitive substring of the title
    pub title_contains: Option<String>,
    /// Any of these states; `None` or an empty list means every state
    pub states: Option<Vec<RequestState>>,
    pub created_by: Option<String>,
    pub reviewer: Option<String>,
}

impl RequestFilter {
    pub fn with_states(states: impl IntoIterator<Item = RequestState>) -> Self {
        Self {
            states: Some(states.into_iter().collect()),
            ..Default::default()
        }
    }

    /// Requests a picker may offer as bulk-attach targets
    pub fn attach_targets() -> Self {
        Self::with_states([RequestState::Waiting])
    }

    /// WHERE clause (without the keyword) scoped to `project_id`, plus its bind values in order
    pub(crate) fn to_sql(&self, project_id: &str) -> (String, Vec<String>) {
        let mut clauses = vec!["project_id = ?".to_string()];
        let mut binds = vec![project_id.to_string()];

        if let Some(text) = self
            .title_contains
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            clauses.push("title_search LIKE ? ESCAPE '\\'".to_string());
            binds.push(format!("%{}%", escape_like(&title_search_key(text))));
        }

        if let Some(states) = self.states.as_ref().filter(|s| !s.is_empty()) {
            let placeholders = vec!["?"; states.len()].join(", ");
            clauses.push(format!("state IN ({})", placeholders));
            binds.extend(states.iter().map(|s| s.as_str().to_string()));
        }

        if let Some(created_by) = &self.created_by {
            clauses.push("created_by_id = ?".to_string());
            binds.push(created_by.clone());
        }

        if let Some(reviewer) = &self.reviewer {
            clauses.push(
                "EXISTS (SELECT 1 FROM request_reviewers rr \
                 WHERE rr.request_id = requests.id AND rr.user_id = ?)"
                    .to_string(),
            );
            binds.push(reviewer.clone());
        }

        (clauses.join(" AND "), binds)
    }
}

/// Case-folded title stored alongside each request and matched by `title_contains`.
/// SQLite's `LOWER` only folds ASCII, so both sides are folded here.
pub(crate) fn title_search_key(title: &str) -> String {
    title.to_lowercase()
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestSort {
    #[default]
    CreatedDesc,
    CreatedAsc,
    UpdatedDesc,
    TitleAsc,
}

impl RequestSort {
    pub(crate) fn order_by(&self) -> &'static str {
        match self {
            RequestSort::CreatedDesc => "created_at DESC, rowid DESC",
            RequestSort::CreatedAsc => "created_at ASC, rowid ASC",
            RequestSort::UpdatedDesc => "updated_at DESC, rowid DESC",
            RequestSort::TitleAsc => "title COLLATE NOCASE ASC, rowid ASC",
        }
    }
}
