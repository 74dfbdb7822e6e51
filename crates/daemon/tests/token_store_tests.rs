//! Token file writes.

use drivegate_daemon::token_store::TokenStore;

#[tokio::test]
async fn test_replace_creates_parent_and_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("google-token.json");
    let store = TokenStore::new(&path);

    store.replace(r#"{"access_token":"one"}"#).await.unwrap();
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        r#"{"access_token":"one"}"#
    );

    store.replace(r#"{"access_token":"two"}"#).await.unwrap();
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        r#"{"access_token":"two"}"#
    );
    assert!(!path.with_file_name("google-token.json.tmp").exists());
}

#[tokio::test]
async fn test_concurrent_writes_never_interleave() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("google-token.json");
    let store = TokenStore::new(&path);

    let bodies: Vec<String> = (0..16)
        .map(|i| format!(r#"{{"access_token":"{}"}}"#, i.to_string().repeat(512)))
        .collect();

    let mut tasks = Vec::new();
    for body in bodies.clone() {
        let store = store.clone();
        tasks.push(tokio::spawn(async move { store.replace(&body).await }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(bodies.contains(&written));
}

#[cfg(unix)]
#[tokio::test]
async fn test_token_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("google-token.json");
    TokenStore::new(&path).replace("{}").await.unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}
