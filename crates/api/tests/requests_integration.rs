//! Integration tests for the service request lifecycle.

mod common;

use axum::http::StatusCode;
use common::{id_of, TestContext};
use serde_json::json;
use uuid::Uuid;

const STATUS_ROWS: &str = "SELECT COUNT(*) FROM request_status WHERE request_id = $1";
const LOG_ROWS: &str = "SELECT COUNT(*) FROM request_logs WHERE request_id = $1";
const RELATION_ROWS: &str = "SELECT COUNT(*) FROM grave_related_users WHERE request_id = $1";

#[tokio::test]
async fn test_create_request_starts_pending_with_one_log() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let user = ctx.register().await;

    let body = ctx.create_request(&user, None).await;
    let id: Uuid = id_of(&body).parse().unwrap();

    assert_eq!(body["status"], "pending");
    assert_eq!(body["isOverdue"], false);
    assert_eq!(body["details"]["priority"], "high");
    assert_eq!(
        body["details"]["details"],
        "Please repaint the headstone lettering"
    );
    assert_eq!(body["logs"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["logs"][0]["message"],
        "Request submitted with high priority"
    );

    assert_eq!(ctx.count(STATUS_ROWS, id).await, 1);
    assert_eq!(ctx.count(LOG_ROWS, id).await, 1);
}

#[tokio::test]
async fn test_create_request_for_unknown_grave_is_not_found() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let user = ctx.register().await;

    let (status, _) = ctx
        .post(
            "/api/v1/requests",
            &user.token,
            json!({"graveId": Uuid::new_v4(), "details": "Clean the plot"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_request_rejects_blank_details() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let user = ctx.register().await;

    let (status, body) = ctx
        .post("/api/v1/requests", &user.token, json!({"details": "   "}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_status_updates_upsert_one_row_and_append_logs() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let user = ctx.register().await;
    let admin = ctx.register_admin().await;
    let request = ctx.create_request(&user, None).await;
    let id = id_of(&request);
    let uuid: Uuid = id.parse().unwrap();

    let uri = format!("/api/v1/admin/requests/{}/status", id);
    let (status, body) = ctx
        .put(&uri, &admin.token, json!({"status": "processing"}))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "processing");

    // Moving back to pending is allowed.
    let (status, body) = ctx
        .put(&uri, &admin.token, json!({"status": "pending", "remark": "  "}))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "pending");
    assert!(body["statusRemark"].is_null());

    assert_eq!(ctx.count(STATUS_ROWS, uuid).await, 1);
    assert_eq!(ctx.count(LOG_ROWS, uuid).await, 3);
    assert_eq!(body["logs"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_status_update_for_unknown_request_is_not_found() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let admin = ctx.register_admin().await;

    let (status, _) = ctx
        .put(
            &format!("/api/v1/admin/requests/{}/status", Uuid::new_v4()),
            &admin.token,
            json!({"status": "approved"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_status_value_is_rejected() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let user = ctx.register().await;
    let admin = ctx.register_admin().await;
    let request = ctx.create_request(&user, None).await;

    let (status, _) = ctx
        .put(
            &format!("/api/v1/admin/requests/{}/status", id_of(&request)),
            &admin.token,
            json!({"status": "completed"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_append_log_and_unknown_request() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let user = ctx.register().await;
    let admin = ctx.register_admin().await;
    let request = ctx.create_request(&user, None).await;

    let (status, log) = ctx
        .post(
            &format!("/api/v1/admin/requests/{}/logs", id_of(&request)),
            &admin.token,
            json!({"message": "Called the family to confirm the schedule"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", log);
    assert_eq!(log["message"], "Called the family to confirm the schedule");
    assert_eq!(log["userId"], admin.id.to_string());

    let (status, _) = ctx
        .post(
            &format!("/api/v1/admin/requests/{}/logs", Uuid::new_v4()),
            &admin.token,
            json!({"message": "Orphan"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_visibility() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let owner = ctx.register().await;
    let stranger = ctx.register().await;
    let admin = ctx.register_admin().await;
    let request = ctx.create_request(&owner, None).await;
    let uri = format!("/api/v1/requests/{}", id_of(&request));

    let (status, _) = ctx.get(&uri, &owner.token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.get(&uri, &admin.token).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.get(&uri, &stranger.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = ctx.send(axum::http::Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, mine) = ctx.get("/api/v1/requests", &stranger.token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(mine.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_request_removes_status_logs_and_relations() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let user = ctx.register().await;
    let admin = ctx.register_admin().await;
    let cluster = ctx.create_cluster(&admin, "Lakeside Garden").await;
    let grave = ctx
        .create_grave(&admin, &id_of(&cluster), json!({"deceasedName": "Elena Reyes"}))
        .await;
    let request = ctx.create_request(&user, Some(&id_of(&grave))).await;
    let id = id_of(&request);
    let uuid: Uuid = id.parse().unwrap();

    let (status, body) = ctx
        .post(
            "/api/v1/admin/relations",
            &admin.token,
            json!({
                "userId": user.id,
                "graveId": id_of(&grave),
                "relationship": "granddaughter",
                "requestId": id,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(ctx.count(RELATION_ROWS, uuid).await, 1);

    let (status, _) = ctx
        .delete(&format!("/api/v1/admin/requests/{}", id), &admin.token)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert_eq!(ctx.count(STATUS_ROWS, uuid).await, 0);
    assert_eq!(ctx.count(LOG_ROWS, uuid).await, 0);
    assert_eq!(ctx.count(RELATION_ROWS, uuid).await, 0);

    let (status, _) = ctx
        .get(&format!("/api/v1/requests/{}", id), &admin.token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .delete(&format!("/api/v1/admin/requests/{}", id), &admin.token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_garden_of_peace_approval_flow() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let user = ctx.register().await;
    let admin = ctx.register_admin().await;
    let cluster = ctx.create_cluster(&admin, "Garden of Peace").await;
    let grave = ctx
        .create_grave(
            &admin,
            &id_of(&cluster),
            json!({"deceasedName": "Jose Santos", "plotNumber": "A-001"}),
        )
        .await;
    assert_eq!(cluster["coordinates"]["latitude"], 14.5995);
    assert_eq!(cluster["coordinates"]["longitude"], 120.9842);
    let request = ctx.create_request(&user, Some(&id_of(&grave))).await;
    let id = id_of(&request);
    assert_eq!(request["grave"]["clusterName"], "Garden of Peace");
    assert_eq!(request["grave"]["plotNumber"], "A-001");

    let uri = format!("/api/v1/admin/requests/{}/status", id);
    let (status, body) = ctx
        .put(
            &uri,
            &admin.token,
            json!({"status": "approved", "remark": "Approved by management"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "approved");
    assert_eq!(body["statusRemark"], "Approved by management");
    assert_eq!(body["isOverdue"], false);

    let (status, body) = ctx
        .get(&format!("/api/v1/requests/{}", id), &user.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");
    assert_eq!(body["statusRemark"], "Approved by management");
    let messages: Vec<&str> = body["logs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|log| log["message"].as_str().unwrap())
        .collect();
    assert_eq!(
        messages,
        vec![
            "Status changed from pending to approved: Approved by management",
            "Request submitted with high priority",
        ]
    );
}

#[tokio::test]
async fn test_stale_pending_request_is_overdue() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let user = ctx.register().await;
    let request = ctx.create_request(&user, None).await;
    let id: Uuid = id_of(&request).parse().unwrap();

    sqlx::query("UPDATE requests SET created_at = NOW() - INTERVAL '8 days' WHERE id = $1")
        .bind(id)
        .execute(&ctx.pool)
        .await
        .unwrap();

    let (status, body) = ctx
        .get(&format!("/api/v1/requests/{}", id), &user.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isOverdue"], true);
}

#[tokio::test]
async fn test_plain_text_details_are_returned_verbatim() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let user = ctx.register().await;
    let request = ctx.create_request(&user, None).await;
    let id: Uuid = id_of(&request).parse().unwrap();

    sqlx::query("UPDATE requests SET details = 'legacy free text' WHERE id = $1")
        .bind(id)
        .execute(&ctx.pool)
        .await
        .unwrap();

    let (_, body) = ctx
        .get(&format!("/api/v1/requests/{}", id), &user.token)
        .await;
    assert_eq!(body["details"]["details"], "legacy free text");
    assert_eq!(body["details"]["priority"], "medium");
}

#[tokio::test]
async fn test_admin_list_is_paginated() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let user = ctx.register().await;
    let admin = ctx.register_admin().await;
    for _ in 0..3 {
        ctx.create_request(&user, None).await;
    }

    let (status, body) = ctx
        .get("/api/v1/admin/requests?page=1&limit=2", &admin.token)
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let pagination = &body["pagination"];
    assert_eq!(pagination["page"], 1);
    assert_eq!(pagination["limit"], 2);
    assert!(pagination["total"].as_i64().unwrap() >= 3);
    assert!(pagination["totalPages"].as_i64().unwrap() >= 2);
    assert_eq!(pagination["hasNext"], true);
    assert_eq!(pagination["hasPrev"], false);

    let (status, _) = ctx.get("/api/v1/admin/requests", &user.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .get("/api/v1/admin/requests?page=0", &admin.token)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_list_rejects_out_of_range_page() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let admin = ctx.register_admin().await;

    let (status, body) = ctx
        .get(
            &format!("/api/v1/admin/requests?page={}&limit=100", i64::MAX),
            &admin.token,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = ctx
        .get("/api/v1/admin/requests?page=1000000&limit=100", &admin.token)
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["data"].as_array().unwrap().is_empty());
    assert_eq!(body["pagination"]["hasNext"], false);
}

#[tokio::test]
async fn test_stats_count_backdated_pending_request_as_overdue() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let user = ctx.register().await;
    let admin = ctx.register_admin().await;
    let request = ctx.create_request(&user, None).await;
    let id: Uuid = id_of(&request).parse().unwrap();

    sqlx::query("UPDATE requests SET created_at = NOW() - INTERVAL '30 days' WHERE id = $1")
        .bind(id)
        .execute(&ctx.pool)
        .await
        .unwrap();

    let (status, stats) = ctx.get("/api/v1/admin/requests/stats", &admin.token).await;
    assert_eq!(status, StatusCode::OK, "{}", stats);
    assert!(stats["overdue"].as_i64().unwrap() >= 1);
    assert!(stats["pending"].as_i64().unwrap() >= 1);
}

#[tokio::test]
async fn test_stats_count_each_status() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let admin = ctx.register_admin().await;

    let (status, stats) = ctx.get("/api/v1/admin/requests/stats", &admin.token).await;
    assert_eq!(status, StatusCode::OK);

    let sum = ["pending", "processing", "approved", "rejected"]
        .iter()
        .map(|key| stats[*key].as_i64().unwrap())
        .sum::<i64>();
    assert_eq!(sum, stats["total"].as_i64().unwrap());
    assert!(stats["overdue"].as_i64().unwrap() <= stats["pending"].as_i64().unwrap());
}
