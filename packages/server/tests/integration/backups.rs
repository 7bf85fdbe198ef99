use crate::common::{TestApp, routes};

#[tokio::test]
async fn restore_preserves_current_content_as_a_new_backup() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "password123").await;

    let res = app
        .upload_with_token(
            &routes::work("acme", "demo"),
            &[("main.bin", vec![b'A'; 100])],
            &token,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let res = app
        .upload_with_token(
            &routes::work("acme", "demo"),
            &[("main.bin", vec![b'B'; 150])],
            &token,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);

    let res = app
        .post_empty_with_token(&routes::backup_restore("acme", "demo", "1"), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["file_size"], 100);
    assert_eq!(res.body["backups"][0]["name"], "2");
    assert_eq!(res.body["backups"][0]["file_size"], 150);

    // The first version is active again; the displaced one kept its bytes.
    let active = app.uploads_root.join("acme/demo/content/main.bin");
    assert_eq!(std::fs::read(active).unwrap(), vec![b'A'; 100]);
    let displaced = app.backups_root.join("acme/demo/2/content/main.bin");
    assert_eq!(std::fs::read(displaced).unwrap(), vec![b'B'; 150]);
}

#[tokio::test]
async fn deleting_a_backup_drops_entry_and_directory() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "password123").await;

    app.upload_bytes("acme", "demo", 10, &token).await;
    app.upload_bytes("acme", "demo", 20, &token).await;
    app.upload_bytes("acme", "demo", 30, &token).await;

    let res = app
        .delete_with_token(&routes::backup("acme", "demo", "1"), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["backups"].as_array().unwrap().len(), 1);
    assert_eq!(res.body["backups"][0]["name"], "2");

    assert!(!app.backups_root.join("acme/demo/1").exists());
    assert!(app.backups_root.join("acme/demo/2").exists());
}

#[tokio::test]
async fn restoring_an_unknown_backup_is_not_found() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "password123").await;

    app.upload_bytes("acme", "demo", 10, &token).await;

    let res = app
        .post_empty_with_token(&routes::backup_restore("acme", "demo", "5"), &token)
        .await;
    assert_eq!(res.status, 404, "{}", res.text);
    assert_eq!(res.body["code"], "BACKUP_NOT_FOUND");
}

#[tokio::test]
async fn backups_belong_to_their_owner_only() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice", "password123").await;
    let bob = app.create_authenticated_user("bob", "password123").await;

    app.upload_bytes("acme", "demo", 10, &alice).await;
    app.upload_bytes("acme", "demo", 20, &alice).await;

    let res = app.get_with_token(&routes::backups("acme", "demo"), &bob).await;
    assert_eq!(res.status, 403, "{}", res.text);
    assert_eq!(res.body["code"], "WORK_DIFFERENT_OWNER");

    let res = app
        .post_empty_with_token(&routes::backup_restore("acme", "demo", "1"), &bob)
        .await;
    assert_eq!(res.status, 403, "{}", res.text);
    assert_eq!(res.body["code"], "WORK_DIFFERENT_OWNER");
}
