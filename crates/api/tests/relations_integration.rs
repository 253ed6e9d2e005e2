//! Integration tests for grave-user relations.

mod common;

use axum::http::StatusCode;
use common::{id_of, TestContext};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_create_and_list_relation() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let user = ctx.register().await;
    let admin = ctx.register_admin().await;
    let cluster = ctx.create_cluster(&admin, "Hillside").await;
    let grave = ctx
        .create_grave(&admin, &id_of(&cluster), json!({"deceasedName": "Pedro Cruz"}))
        .await;

    let (status, relation) = ctx
        .post(
            "/api/v1/admin/relations",
            &admin.token,
            json!({
                "userId": user.id,
                "graveId": id_of(&grave),
                "relationship": "  son  ",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", relation);
    assert_eq!(relation["user"]["id"], user.id.to_string());
    assert_eq!(relation["grave"]["id"], id_of(&grave));
    assert_eq!(relation["grave"]["clusterName"], "Hillside");
    assert_eq!(relation["relationship"], "son");

    let (status, mine) = ctx.get("/api/v1/relations", &user.token).await;
    assert_eq!(status, StatusCode::OK);
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["id"], relation["id"]);

    let (status, by_grave) = ctx
        .get(
            &format!("/api/v1/admin/graves/{}/relations", id_of(&grave)),
            &admin.token,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_grave.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_relation_is_conflict() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let user = ctx.register().await;
    let admin = ctx.register_admin().await;
    let cluster = ctx.create_cluster(&admin, "Riverside").await;
    let grave = ctx.create_grave(&admin, &id_of(&cluster), json!({})).await;
    let body = json!({"userId": user.id, "graveId": id_of(&grave)});

    let (status, _) = ctx
        .post("/api/v1/admin/relations", &admin.token, body.clone())
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, error) = ctx
        .post("/api/v1/admin/relations", &admin.token, body)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["error"], "conflict");
    assert_eq!(error["message"], "User is already related to this grave");
}

#[tokio::test]
async fn test_relation_requires_existing_user_and_grave() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let user = ctx.register().await;
    let admin = ctx.register_admin().await;
    let cluster = ctx.create_cluster(&admin, "Orchard").await;
    let grave = ctx.create_grave(&admin, &id_of(&cluster), json!({})).await;

    let (status, error) = ctx
        .post(
            "/api/v1/admin/relations",
            &admin.token,
            json!({"userId": Uuid::new_v4(), "graveId": id_of(&grave)}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["message"], "User not found");

    let (status, _) = ctx
        .post(
            "/api/v1/admin/relations",
            &admin.token,
            json!({"userId": user.id, "graveId": Uuid::new_v4()}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_relation_visibility_and_delete() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let user = ctx.register().await;
    let stranger = ctx.register().await;
    let admin = ctx.register_admin().await;
    let cluster = ctx.create_cluster(&admin, "Meadow").await;
    let grave = ctx.create_grave(&admin, &id_of(&cluster), json!({})).await;

    let (_, relation) = ctx
        .post(
            "/api/v1/admin/relations",
            &admin.token,
            json!({"userId": user.id, "graveId": id_of(&grave)}),
        )
        .await;
    let uri = format!("/api/v1/relations/{}", id_of(&relation));

    let (status, _) = ctx.get(&uri, &user.token).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = ctx.get(&uri, &stranger.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .post(
            "/api/v1/admin/relations",
            &stranger.token,
            json!({"userId": stranger.id, "graveId": id_of(&grave)}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let delete_uri = format!("/api/v1/admin/relations/{}", id_of(&relation));
    let (status, _) = ctx.delete(&delete_uri, &admin.token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = ctx.delete(&delete_uri, &admin.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = ctx.get(&uri, &user.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_grave_removes_its_relations() {
    let Some(ctx) = TestContext::new().await else {
        return;
    };
    let user = ctx.register().await;
    let admin = ctx.register_admin().await;
    let cluster = ctx.create_cluster(&admin, "Chapel Row").await;
    let grave = ctx.create_grave(&admin, &id_of(&cluster), json!({})).await;

    let (status, _) = ctx
        .post(
            "/api/v1/admin/relations",
            &admin.token,
            json!({"userId": user.id, "graveId": id_of(&grave)}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = ctx
        .delete(&format!("/api/v1/admin/graves/{}", id_of(&grave)), &admin.token)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, mine) = ctx.get("/api/v1/relations", &user.token).await;
    assert!(mine.as_array().unwrap().is_empty());
}
