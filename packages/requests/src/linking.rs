// ABOUTME: Item linking for review requests
// ABOUTME: Set-union of content items, create-with-items, and bulk attach with conflict retry

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use docket_core::{
    CreateRequestInput, Request, RequestItem, RequestState, ReviewError, ReviewResult, UserRef,
    WorkflowAction,
};
use docket_storage::{RequestReplacement, RequestStore, StorageError};

use crate::transitions;

/// `existing` followed by each item of `incoming` not already present, in first-seen order
pub fn union_items(
    existing: &[RequestItem],
    incoming: impl IntoIterator<Item = RequestItem>,
) -> Vec<RequestItem> {
    let mut seen: HashSet<String> = existing.iter().map(|i| i.item_id.clone()).collect();
    let mut items = existing.to_vec();
    for item in incoming {
        if seen.insert(item.item_id.clone()) {
            items.push(item);
        }
    }
    items
}

pub struct ItemLinker {
    store: Arc<dyn RequestStore>,
    write_retries: u32,
}

impl ItemLinker {
    pub fn new(store: Arc<dyn RequestStore>, write_retries: u32) -> Self {
        Self {
            store,
            write_retries,
        }
    }

    /// Create a request whose items are exactly `items`
    pub async fn create_with_items(
        &self,
        actor: &UserRef,
        mut input: CreateRequestInput,
        items: Vec<RequestItem>,
    ) -> ReviewResult<Request> {
        input.items = items;
        let new = transitions::new_request(input, actor, Utc::now())?;
        let request = self.store.create_request(new).await?;

        info!(
            "Request {} created by {} with {} items",
            request.id,
            actor.id,
            request.items.len()
        );
        Ok(request)
    }

    /// Add `items` to an existing `WAITING` request
    pub async fn attach_items(
        &self,
        request_id: &str,
        items: Vec<RequestItem>,
        actor: &UserRef,
    ) -> ReviewResult<Request> {
        self.append(request_id, items, actor, Some(RequestState::Waiting))
            .await
    }

    /// Union `items` into the request, re-reading and retrying on version conflicts.
    /// When `required_state` is set, the request must be in it at the time of each attempt.
    pub(crate) async fn append(
        &self,
        request_id: &str,
        items: Vec<RequestItem>,
        actor: &UserRef,
        required_state: Option<RequestState>,
    ) -> ReviewResult<Request> {
        let mut attempt = 0;

        loop {
            let current = self
                .store
                .get_request(request_id)
                .await?
                .ok_or_else(|| ReviewError::NotFound(format!("request {}", request_id)))?;

            if let Some(required) = required_state {
                if current.state != required {
                    warn!(
                        "{} tried to attach items to {} in state {}",
                        actor.id, request_id, current.state
                    );
                    return Err(ReviewError::not_permitted(
                        WorkflowAction::AddItems,
                        format!("{} is {}, not {}", request_id, current.state, required),
                    ));
                }
            }

            let Some(updated) = transitions::add_items(&current, items.clone(), Utc::now())? else {
                debug!("All items already linked to {}, skipping write", request_id);
                return Ok(current);
            };

            let added = updated.items.len() - current.items.len();
            match self
                .store
                .replace_request(request_id, RequestReplacement::from_request(&updated))
                .await
            {
                Ok(saved) => {
                    info!("{} linked {} items to {}", actor.id, added, request_id);
                    return Ok(saved);
                }
                Err(StorageError::Conflict { actual, .. }) if attempt < self.write_retries => {
                    attempt += 1;
                    warn!(
                        "Request {} moved to version {} while linking items, retrying ({}/{})",
                        request_id, actual, attempt, self.write_retries
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// A caller's pending multi-selection of content items
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSelection {
    items: Vec<RequestItem>,
}

impl ItemSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item; selecting it twice keeps one entry
    pub fn select(&mut self, item_id: impl Into<String>) {
        let item_id = item_id.into();
        if !self.contains(&item_id) {
            self.items.push(RequestItem::new(item_id));
        }
    }

    pub fn deselect(&mut self, item_id: &str) {
        self.items.retain(|i| i.item_id != item_id);
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.items.iter().any(|i| i.item_id == item_id)
    }

    pub fn items(&self) -> &[RequestItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Attach the selection to `request_id`. Cleared only once the write succeeds.
    pub async fn attach_to(
        &mut self,
        linker: &ItemLinker,
        request_id: &str,
        actor: &UserRef,
    ) -> ReviewResult<Request> {
        let request = linker
            .attach_items(request_id, self.items.clone(), actor)
            .await?;
        self.clear();
        Ok(request)
    }
}

impl FromIterator<String> for ItemSelection {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut selection = Self::new();
        for item_id in iter {
            selection.select(item_id);
        }
        selection
    }
}
