//! API integration tests.
//!
//! The router runs against the in-memory datastore.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use facility_admin_api::{AppState, endpoints::MAX_NESTED_DEPTH, router as api_router};
use facility_admin_common::config::CommunityConfig;
use facility_admin_core::{CommentService, CommunityStatsService, PostService, ReportService};
use facility_admin_db::{
    entities::{comment, like, post, report},
    repositories::{
        CommentRepository, LikeRepository, PostRepository, ReportRepository, UserRepository,
    },
    test_utils::MockDataSource,
};
use serde_json::{Value, json};
use tower::ServiceExt;

const USERS: &str = "users";

fn comment_row(id: &str, parent: Option<&str>, minute: u32) -> Value {
    let at = format!("2024-03-01T09:{minute:02}:00Z");
    json!({
        "id": id,
        "post_id": "p1",
        "parent_comment_id": parent,
        "author_id": "u2",
        "author_name": "Lee",
        "content": format!("comment {id}"),
        "status": "active",
        "created_at": at,
        "updated_at": at,
    })
}

fn like_row(id: &str, comment_id: &str) -> Value {
    json!({
        "id": id,
        "user_id": "u1",
        "post_id": null,
        "comment_id": comment_id,
        "created_at": "2024-03-01T10:00:00Z",
    })
}

fn report_row(id: &str, comment_id: &str, reason: &str, status: &str, day: u32) -> Value {
    json!({
        "id": id,
        "reporter_id": "u1",
        "post_id": "p1",
        "comment_id": comment_id,
        "reason": reason,
        "description": format!("{reason} report"),
        "status": status,
        "created_at": format!("2024-03-{day:02}T10:00:00Z"),
        "resolved_by": null,
    })
}

fn seeded_db() -> MockDataSource {
    let comments = vec![
        comment_row("c1", None, 0),
        comment_row("c2", Some("c1"), 1),
        comment_row("c3", Some("deleted-parent"), 2),
    ];
    MockDataSource::new()
        .with_rows(comment::TABLE, comments.clone())
        .with_rows(comment::WRITE_TABLE, comments)
        .with_rows(
            like::TABLE,
            vec![like_row("l1", "c1"), like_row("l2", "c1"), like_row("l3", "c2")],
        )
        .with_rows(
            report::TABLE,
            vec![
                report_row("r1", "c1", "spam", "pending", 1),
                report_row("r2", "c1", "spam", "pending", 2),
                report_row("r3", "c1", "other", "reviewed", 3),
            ],
        )
        .with_rows(
            post::TABLE,
            vec![
                json!({
                    "id": "p1", "author_id": "u2", "title": "Gym reopening",
                    "category": "notice", "status": "active",
                    "view_count": 30, "like_count": 4, "comment_count": 3,
                    "created_at": "2024-02-28T10:00:00Z",
                }),
                json!({
                    "id": "p2", "author_id": "u1", "title": "Lost key",
                    "category": "question", "status": "active",
                    "view_count": 10, "like_count": 0, "comment_count": 1,
                    "created_at": "2024-02-29T10:00:00Z",
                }),
            ],
        )
        .with_rows(
            USERS,
            vec![
                json!({"id": "u1", "nickname": "Park"}),
                json!({"id": "u2", "nickname": "Lee"}),
            ],
        )
}

fn create_test_router(db: &MockDataSource) -> Router {
    let shared = db.clone().into_shared();
    let comment_repo = CommentRepository::new(shared.clone());
    let post_repo = PostRepository::new(shared.clone());
    let report_repo = ReportRepository::new(shared.clone());

    let state = AppState {
        comment_service: CommentService::new(
            comment_repo.clone(),
            LikeRepository::new(shared.clone()),
        ),
        post_service: PostService::new(post_repo.clone()),
        report_service: ReportService::new(
            report_repo.clone(),
            UserRepository::new(shared, USERS),
            comment_repo,
            post_repo.clone(),
        ),
        stats_service: CommunityStatsService::new(post_repo, report_repo),
        community: CommunityConfig::default(),
    };

    Router::new().nest("/api", api_router()).with_state(state)
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .method("POST")
                .header("Content-Type", "application/json")
                .header("x-admin-id", "admin-1")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_missing_admin_header_is_unauthorized() {
    let app = create_test_router(&seeded_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/community/comments/tree")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"postId":"p1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_comment_tree() {
    let app = create_test_router(&seeded_db());

    let (status, body) =
        post_json(app, "/api/admin/community/comments/tree", json!({"postId": "p1"})).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["totalComments"], 3);
    assert_eq!(data["orphansPromoted"], 1);
    assert_eq!(data["likesDegraded"], false);

    let roots = data["comments"].as_array().unwrap();
    assert_eq!(roots.len(), 2);
    assert_eq!(roots[0]["id"], "c1");
    assert_eq!(roots[0]["likesCount"], 2);
    assert_eq!(roots[0]["children"][0]["id"], "c2");
    assert_eq!(roots[0]["children"][0]["likesCount"], 1);
    assert_eq!(roots[0]["children"][0]["indent"], 1);
    assert_eq!(roots[1]["id"], "c3");
    assert_eq!(roots[1]["orphaned"], true);
    assert_eq!(roots[1]["likesCount"], 0);
}

#[tokio::test]
async fn test_comment_tree_with_failing_likes() {
    let db = seeded_db().fail_table(like::TABLE);
    let app = create_test_router(&db);

    let (status, body) =
        post_json(app, "/api/admin/community/comments/tree", json!({"postId": "p1"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["likesDegraded"], true);
    assert_eq!(body["data"]["comments"][0]["likesCount"], 0);
}

#[tokio::test]
async fn test_comment_tree_with_failing_comments() {
    let db = seeded_db().fail_table(comment::TABLE);
    let app = create_test_router(&db);

    let (status, body) =
        post_json(app, "/api/admin/community/comments/tree", json!({"postId": "p1"})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "DATASTORE_ERROR");
}

#[tokio::test]
async fn test_deep_reply_chain() {
    const DEPTH: usize = 10_000;
    let ids: Vec<String> = (0..DEPTH).map(|i| format!("c{i}")).collect();
    let comments: Vec<Value> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| comment_row(id, i.checked_sub(1).map(|p| ids[p].as_str()), 0))
        .collect();
    let db = MockDataSource::new()
        .with_rows(comment::TABLE, comments)
        .with_rows(like::TABLE, Vec::new());
    let app = create_test_router(&db);

    let (status, body) =
        post_json(app, "/api/admin/community/comments/tree", json!({"postId": "p1"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalComments"], DEPTH);

    let mut node = &body["data"]["comments"][0];
    for depth in 1..=MAX_NESTED_DEPTH {
        node = &node["children"][0];
        assert_eq!(node["depth"], depth);
    }
    let flat = node["children"].as_array().unwrap();
    assert_eq!(flat.len(), DEPTH - MAX_NESTED_DEPTH - 1);

    let last = flat.last().unwrap();
    assert_eq!(last["id"], format!("c{}", DEPTH - 1));
    assert_eq!(last["parentCommentId"], format!("c{}", DEPTH - 2));
    assert_eq!(last["depth"], DEPTH - 1);
    assert_eq!(last["indent"], 4);
    assert_eq!(last["children"], json!([]));
}

#[tokio::test]
async fn test_empty_post_id_is_rejected() {
    let app = create_test_router(&seeded_db());

    let (status, _) =
        post_json(app, "/api/admin/community/comments/tree", json!({"postId": ""})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reports_for_comment() {
    let app = create_test_router(&seeded_db());

    let (status, body) = post_json(
        app,
        "/api/admin/community/reports/for-comment",
        json!({"commentId": "c1"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["target"], json!({"kind": "comment", "id": "c1"}));
    assert_eq!(data["reportsByReason"], json!({"spam": 2, "other": 1}));
    assert_eq!(data["totalReports"], 3);
    assert_eq!(data["reports"][0]["id"], "r3");
    assert_eq!(data["reports"][0]["reporterName"], "Park");
}

#[tokio::test]
async fn test_report_list_pagination() {
    let app = create_test_router(&seeded_db());

    let (status, body) = post_json(
        app,
        "/api/admin/community/reports/list",
        json!({"reason": "spam", "page": 1, "pageSize": 1}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["items"].as_array().unwrap().len(), 1);
    assert_eq!(data["items"][0]["id"], "r2");
    assert_eq!(data["items"][0]["postTitle"], "Gym reopening");
    assert_eq!(data["pagination"]["totalCount"], 2);
    assert_eq!(data["pagination"]["totalPages"], 2);
    assert_eq!(data["pagination"]["hasNext"], true);
    assert_eq!(data["pagination"]["hasPrevious"], false);
}

#[tokio::test]
async fn test_report_list_rejects_oversized_page() {
    let app = create_test_router(&seeded_db());

    let (status, _) = post_json(
        app,
        "/api/admin/community/reports/list",
        json!({"pageSize": 1000}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_report_status_transitions() {
    let db = seeded_db();

    let (status, body) = post_json(
        create_test_router(&db),
        "/api/admin/community/reports/update-status",
        json!({"reportId": "r1", "status": "resolved"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["resolvedBy"], "admin-1");

    let (status, body) = post_json(
        create_test_router(&db),
        "/api/admin/community/reports/update-status",
        json!({"reportId": "r1", "status": "pending"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_TRANSITION");
}

#[tokio::test]
async fn test_unknown_report_is_not_found() {
    let app = create_test_router(&seeded_db());

    let (status, _) = post_json(
        app,
        "/api/admin/community/reports/show",
        json!({"reportId": "missing"}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_hide_comment() {
    let db = seeded_db();
    let app = create_test_router(&db);

    let (status, body) = post_json(
        app,
        "/api/admin/community/comments/update-status",
        json!({"commentId": "c2", "status": "hidden"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "hidden");
    assert_eq!(db.rows(comment::WRITE_TABLE)[1]["status"], "hidden");
}

#[tokio::test]
async fn test_category_stats_and_dashboard() {
    let db = seeded_db();

    let (status, body) = post_json(
        create_test_router(&db),
        "/api/admin/community/posts/category-stats",
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalPosts"], 2);
    assert_eq!(body["data"]["totalComments"], 4);
    assert_eq!(body["data"]["categories"][0]["category"], "notice");

    let (status, body) =
        post_json(create_test_router(&db), "/api/admin/community/stats", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pendingReports"], 2);
    assert_eq!(body["data"]["reviewedReports"], 1);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_router(&seeded_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/metrics/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_router(&seeded_db());

    let (status, _) = post_json(app, "/api/admin/community/nope", json!({})).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
