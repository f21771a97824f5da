// ABOUTME: End-to-end review workflow tests against in-memory SQLite
// ABOUTME: Creation, moderation guards, item linking, reopen, and the request's discussion

use std::sync::Arc;

use docket_config::Config;
use docket_core::{
    Author, CreateRequestInput, RequestItem, RequestState, RequestUpdateInput, ReviewError, Role,
    UserRef, WorkflowAction,
};
use docket_requests::{ItemSelection, WorkflowEngine};
use docket_storage::{Database, PaginationParams, RequestFilter, RequestSort};
use docket_threads::DiscussionService;
use pretty_assertions::assert_eq;

struct Harness {
    db: Database,
    engine: WorkflowEngine,
}

async fn harness(roles: &[(&str, Role)]) -> Harness {
    let db = Database::in_memory().await.unwrap();
    let members = db.membership_store();
    for (user_id, role) in roles {
        members.upsert_member("ws-1", user_id, *role).await.unwrap();
    }

    let engine = WorkflowEngine::new(
        Arc::new(db.request_store()),
        Arc::new(db.membership_store()),
        &Config::default(),
    );
    Harness { db, engine }
}

fn user(id: &str) -> UserRef {
    UserRef::new(id, id.to_uppercase())
}

fn items(ids: &[&str]) -> Vec<RequestItem> {
    ids.iter().map(|id| RequestItem::new(*id)).collect()
}

fn input(title: &str, reviewers: &[&str], item_ids: &[&str]) -> CreateRequestInput {
    CreateRequestInput {
        project_id: "proj-1".to_string(),
        workspace_id: "ws-1".to_string(),
        title: title.to_string(),
        description: None,
        reviewers_id: reviewers.iter().map(|r| r.to_string()).collect(),
        items: items(item_ids),
    }
}

#[tokio::test]
async fn test_create_defaults_to_waiting() {
    let h = harness(&[("u1", Role::Owner)]).await;

    let request = h
        .engine
        .create(&user("u1"), input("Fix typo", &["u1"], &["i1"]))
        .await
        .unwrap();

    assert_eq!(request.state, RequestState::Waiting);
    assert_eq!(request.items, items(&["i1"]));
    assert_eq!(request.reviewers, vec!["u1".to_string()]);
    assert_eq!(request.created_at, request.updated_at);
    assert!(request.approved_at.is_none());
    assert!(request.closed_at.is_none());

    let fetched = h.engine.get(&request.id).await.unwrap();
    assert_eq!(fetched, request);
}

#[tokio::test]
async fn test_owner_reviewer_approves_once() {
    let h = harness(&[("u1", Role::Owner)]).await;
    let request = h
        .engine
        .create(&user("u1"), input("Fix typo", &["u1"], &["i1"]))
        .await
        .unwrap();

    let approved = h.engine.approve(&request.id, &user("u1")).await.unwrap();
    assert_eq!(approved.state, RequestState::Approved);
    let approved_at = approved.approved_at.unwrap();

    let err = h.engine.approve(&request.id, &user("u1")).await.unwrap_err();
    assert!(matches!(
        err,
        ReviewError::ActionNotPermitted {
            action: WorkflowAction::Approve,
            ..
        }
    ));

    let current = h.engine.get(&request.id).await.unwrap();
    assert_eq!(current.state, RequestState::Approved);
    assert_eq!(current.approved_at, Some(approved_at));
}

#[tokio::test]
async fn test_writer_reviewer_cannot_close() {
    let h = harness(&[("u1", Role::Owner), ("u2", Role::Writer)]).await;
    let request = h
        .engine
        .create(&user("u1"), input("Fix typo", &["u1", "u2"], &[]))
        .await
        .unwrap();

    let err = h.engine.close(&request.id, &user("u2")).await.unwrap_err();
    assert!(matches!(
        err,
        ReviewError::ActionNotPermitted {
            action: WorkflowAction::Close,
            ..
        }
    ));

    let current = h.engine.get(&request.id).await.unwrap();
    assert_eq!(current.state, RequestState::Waiting);
    assert_eq!(current.version, request.version);
}

#[tokio::test]
async fn test_adding_items_is_a_union() {
    let h = harness(&[("u1", Role::Owner)]).await;
    let request = h
        .engine
        .create(&user("u1"), input("Fix typo", &["u1"], &["i1"]))
        .await
        .unwrap();

    let grown = h
        .engine
        .add_items(&request.id, &user("u1"), items(&["i2", "i3"]))
        .await
        .unwrap();
    assert_eq!(grown.items, items(&["i1", "i2", "i3"]));

    let again = h
        .engine
        .add_items(&request.id, &user("u1"), items(&["i3"]))
        .await
        .unwrap();
    assert_eq!(again.items, items(&["i1", "i2", "i3"]));
    assert_eq!(again.version, grown.version);
}

#[tokio::test]
async fn test_reopen_keeps_closed_at() {
    let h = harness(&[("u1", Role::Maintainer), ("u3", Role::Writer)]).await;
    let request = h
        .engine
        .create(&user("u1"), input("Fix typo", &["u1"], &[]))
        .await
        .unwrap();

    let closed = h.engine.close(&request.id, &user("u1")).await.unwrap();
    let closed_at = closed.closed_at.unwrap();

    let reopened = h.engine.reopen(&request.id, &user("u3")).await.unwrap();
    assert_eq!(reopened.state, RequestState::Waiting);
    assert_eq!(reopened.closed_at, Some(closed_at));

    let closed_again = h.engine.close(&request.id, &user("u1")).await.unwrap();
    assert_eq!(closed_again.closed_at, Some(closed_at));
}

#[tokio::test]
async fn test_reader_and_writer_reviewers_are_refused_in_every_state() {
    let h = harness(&[
        ("u1", Role::Owner),
        ("reader", Role::Reader),
        ("writer", Role::Writer),
    ])
    .await;
    let request = h
        .engine
        .create(&user("u1"), input("Fix typo", &["u1", "reader", "writer"], &[]))
        .await
        .unwrap();

    for actor in ["reader", "writer"] {
        let hint = h.engine.moderation(&request.id, &user(actor)).await.unwrap();
        assert!(!hint.can_approve);
        assert!(!hint.can_close);

        assert!(h.engine.approve(&request.id, &user(actor)).await.unwrap_err().is_not_permitted());
        assert!(h.engine.close(&request.id, &user(actor)).await.unwrap_err().is_not_permitted());
    }

    h.engine.close(&request.id, &user("u1")).await.unwrap();
    for actor in ["reader", "writer"] {
        assert!(h.engine.approve(&request.id, &user(actor)).await.unwrap_err().is_not_permitted());
        assert!(h.engine.close(&request.id, &user(actor)).await.unwrap_err().is_not_permitted());
    }

    let hint = h.engine.moderation(&request.id, &user("writer")).await.unwrap();
    assert!(hint.can_reopen);
    let hint = h.engine.moderation(&request.id, &user("reader")).await.unwrap();
    assert!(!hint.can_reopen);
}

#[tokio::test]
async fn test_metadata_update_replaces_sets_and_checks_version() {
    let h = harness(&[("u1", Role::Owner)]).await;
    let request = h
        .engine
        .create(&user("u1"), input("Fix typo", &["u1"], &["i1", "i2"]))
        .await
        .unwrap();

    let update = RequestUpdateInput {
        title: "Fix typos".to_string(),
        description: Some("Homepage and footer".to_string()),
        state: RequestState::Waiting,
        reviewers_id: vec!["u2".to_string(), "u1".to_string(), "u2".to_string()],
        items: items(&["i2"]),
        expected_version: Some(request.version),
    };
    let updated = h
        .engine
        .update_metadata(&request.id, &user("u1"), update.clone())
        .await
        .unwrap();

    assert_eq!(updated.title, "Fix typos");
    assert_eq!(updated.reviewers, vec!["u2".to_string(), "u1".to_string()]);
    assert_eq!(updated.items, items(&["i2"]));
    assert_eq!(updated.version, request.version + 1);

    // Same expected version again is now stale
    let err = h
        .engine
        .update_metadata(&request.id, &user("u1"), update)
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewError::Conflict(_)));

    let current = h.engine.get(&request.id).await.unwrap();
    assert_eq!(current, updated);
}

#[tokio::test]
async fn test_bulk_attach_targets_waiting_requests_and_clears_selection() {
    let h = harness(&[("u1", Role::Owner)]).await;
    let target = h
        .engine
        .create(&user("u1"), input("Homepage", &["u1"], &["i1"]))
        .await
        .unwrap();
    let approved = h
        .engine
        .create(&user("u1"), input("Pricing", &["u1"], &[]))
        .await
        .unwrap();
    h.engine.approve(&approved.id, &user("u1")).await.unwrap();

    let picker = h
        .engine
        .list(
            "proj-1",
            &RequestFilter::attach_targets(),
            Some(PaginationParams::default()),
            RequestSort::default(),
        )
        .await
        .unwrap();
    assert_eq!(picker.pagination.total_items, 1);
    assert_eq!(picker.data[0].id, target.id);

    let mut selection: ItemSelection = ["i1", "i4", "i5"].iter().map(|s| s.to_string()).collect();
    let err = selection
        .attach_to(h.engine.linker(), &approved.id, &user("u1"))
        .await
        .unwrap_err();
    assert!(err.is_not_permitted());
    assert_eq!(selection.len(), 3);

    let attached = selection
        .attach_to(h.engine.linker(), &target.id, &user("u1"))
        .await
        .unwrap();
    assert_eq!(attached.items, items(&["i1", "i4", "i5"]));
    assert!(selection.is_empty());
}

#[tokio::test]
async fn test_create_with_items_uses_exactly_the_given_items() {
    let h = harness(&[("u1", Role::Owner)]).await;

    let request = h
        .engine
        .linker()
        .create_with_items(
            &user("u1"),
            input("Review hero image", &["u1"], &["ignored"]),
            items(&["hero", "hero"]),
        )
        .await
        .unwrap();

    assert_eq!(request.items, items(&["hero"]));
    assert_eq!(request.state, RequestState::Waiting);
}

#[tokio::test]
async fn test_invalid_creation_input_is_rejected() {
    let h = harness(&[("u1", Role::Owner)]).await;

    for bad in [
        input("   ", &["u1"], &[]),
        input("Fix typo", &[], &[]),
        input("Fix typo", &["not a user"], &[]),
        input("Fix typo", &["u1"], &["bad item"]),
    ] {
        let err = h.engine.create(&user("u1"), bad).await.unwrap_err();
        assert!(matches!(err, ReviewError::ValidationFailed(_)), "{:?}", err);
    }

    let page = h
        .engine
        .list("proj-1", &RequestFilter::default(), None, RequestSort::default())
        .await
        .unwrap();
    assert_eq!(page.pagination.total_items, 0);
}

#[tokio::test]
async fn test_request_discussion_enforces_authorship() {
    let h = harness(&[("u1", Role::Owner)]).await;
    let request = h
        .engine
        .create(&user("u1"), input("Fix typo", &["u1"], &[]))
        .await
        .unwrap();
    let discussion = DiscussionService::new(Arc::new(h.db.thread_store()));

    let author = Author::from(user("u1"));
    let comment = discussion
        .create(Some(&request.thread_id), &author, "Please check the footer too")
        .await
        .unwrap()
        .unwrap();

    let other = Author::from(user("u2"));
    assert!(matches!(
        discussion
            .update(Some(&request.thread_id), &comment.id, &other, "no")
            .await,
        Err(ReviewError::Forbidden(_))
    ));
    assert!(matches!(
        discussion
            .delete(Some(&request.thread_id), &comment.id, &other)
            .await,
        Err(ReviewError::Forbidden(_))
    ));

    discussion
        .delete(Some(&request.thread_id), &comment.id, &author)
        .await
        .unwrap();
    assert!(discussion
        .list(Some(&request.thread_id))
        .await
        .unwrap()
        .is_empty());
}
