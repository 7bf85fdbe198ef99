use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn default_creator_id_can_be_set_and_cleared() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "password123").await;

    let res = app
        .put_with_token(
            routes::DEFAULT_CREATOR_ID,
            &json!({"creator_id": "acme"}),
            &token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["default_creator_id"], "acme");

    let res = app
        .put_with_token(
            routes::DEFAULT_CREATOR_ID,
            &json!({"creator_id": null}),
            &token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert!(res.body["default_creator_id"].is_null());
}

#[tokio::test]
async fn invalid_default_creator_id_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "password123").await;

    let res = app
        .put_with_token(
            routes::DEFAULT_CREATOR_ID,
            &json!({"creator_id": "Not Valid!"}),
            &token,
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.body["code"], "ID_INVALID");
}

#[tokio::test]
async fn cleanup_releases_only_workless_creator_ids() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "password123").await;

    app.upload_bytes("acme", "w1", 10, &token).await;
    app.upload_bytes("zed", "w2", 10, &token).await;

    let me = app.get_with_token(routes::ME, &token).await;
    let mut claimed: Vec<String> = me.body["creator_ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    claimed.sort();
    assert_eq!(claimed, ["acme", "zed"]);

    let res = app.delete_with_token(&routes::work("zed", "w2"), &token).await;
    assert_eq!(res.status, 204, "{}", res.text);

    let res = app
        .post_empty_with_token(routes::CLEANUP_CREATOR_IDS, &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["creator_ids"].as_array().unwrap().len(), 1);
    assert_eq!(res.body["creator_ids"][0], "acme");

    // Released id is claimable by someone else now.
    let bob = app.create_authenticated_user("bob", "password123").await;
    app.upload_bytes("zed", "fresh", 5, &bob).await;

    // Running the cleanup again changes nothing.
    let res = app
        .post_empty_with_token(routes::CLEANUP_CREATOR_IDS, &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["creator_ids"][0], "acme");
}
