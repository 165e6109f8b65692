use std::sync::Arc;

use bulletin_board::error::BoardError;
use bulletin_board::storage::models::{Post, PostPatch};
use bulletin_board::storage::{
    DocumentBackend, FileBackend, JsonCollection, MemoryBackend, PostKey, PostStore, StorageError,
};

fn test_store() -> (tempfile::TempDir, PostStore) {
    let dir = tempfile::tempdir().unwrap();
    let backend = FileBackend::new(dir.path().join("data").join("posts.json")).unwrap();
    (dir, PostStore::new(Arc::new(backend)))
}

fn sample_post(author: &str, title: &str) -> Post {
    Post::new(author, title, "body", vec![format!("1700000000000-abcd1234-{title}.png")])
}

fn title_patch(title: &str) -> PostPatch {
    PostPatch {
        title: Some(title.to_string()),
        content: None,
    }
}

// ============================================================================
// Documents
// ============================================================================

#[tokio::test]
async fn test_missing_document_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(FileBackend::new(dir.path().join("posts.json")).unwrap());
    assert!(backend.load().await.unwrap().is_none());

    let collection: JsonCollection<Post> = JsonCollection::new(backend);
    assert!(collection.read().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_commit_writes_pretty_json_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("posts.json");
    let store = PostStore::new(Arc::new(FileBackend::new(&path).unwrap()));

    store.append(sample_post("alice", "hi")).await.unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.starts_with("[\n"));
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value[0]["author"], "alice");
    assert_eq!(value[0]["title"], "hi");
    assert!(value[0]["date"].is_string());
}

#[tokio::test]
async fn test_commit_leaves_no_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = PostStore::new(Arc::new(
        FileBackend::new(dir.path().join("posts.json")).unwrap(),
    ));

    for i in 0..5 {
        store
            .append(sample_post("alice", &format!("p{i}")))
            .await
            .unwrap();
    }

    let entries: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["posts.json".to_string()]);
}

#[tokio::test]
async fn test_corrupt_document_is_an_error_and_is_preserved() {
    let backend = Arc::new(MemoryBackend::new("posts.json"));
    backend.set_raw("[{\"title\": ");
    let store = PostStore::new(backend.clone());

    let err = store.list().await.unwrap_err();
    assert!(matches!(
        err,
        BoardError::Storage(StorageError::Corrupt { .. })
    ));

    let err = store.append(sample_post("alice", "hi")).await.unwrap_err();
    assert!(matches!(err, BoardError::Storage(_)));
    assert_eq!(
        backend.load().await.unwrap().unwrap(),
        b"[{\"title\": ".to_vec()
    );
}

#[tokio::test]
async fn test_legacy_document_without_ids() {
    let backend = Arc::new(MemoryBackend::new("posts.json"));
    backend.set_raw(
        r#"[{"title":"old","content":"c","files":["1-a.png"],"author":"alice","date":"2024-01-02T03:04:05.000Z"}]"#,
    );
    let store = PostStore::new(backend);

    let posts = store.list().await.unwrap();
    assert_eq!(posts.len(), 1);
    assert!(posts[0].id.is_nil());
    assert_eq!(posts[0].files, vec!["1-a.png".to_string()]);

    let updated = store.replace_at(0, &title_patch("new")).await.unwrap();
    assert_eq!(updated.title, "new");
    assert!(updated.id.is_nil());
}

// ============================================================================
// Post store
// ============================================================================

#[tokio::test]
async fn test_append_and_list_preserve_order() {
    let (_dir, store) = test_store();
    store.append(sample_post("alice", "first")).await.unwrap();
    store.append(sample_post("bob", "second")).await.unwrap();

    let titles: Vec<String> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.title)
        .collect();
    assert_eq!(titles, vec!["first", "second"]);
}

#[tokio::test]
async fn test_list_is_idempotent() {
    let (_dir, store) = test_store();
    store.append(sample_post("alice", "a")).await.unwrap();
    store.append(sample_post("alice", "b")).await.unwrap();

    assert_eq!(store.list().await.unwrap(), store.list().await.unwrap());
}

#[tokio::test]
async fn test_replace_at_merges_and_refreshes_date() {
    let (_dir, store) = test_store();
    let original = sample_post("alice", "hi");
    store.append(original.clone()).await.unwrap();

    let updated = store.replace_at(0, &title_patch("edited")).await.unwrap();
    assert_eq!(updated.title, "edited");
    assert_eq!(updated.content, original.content);
    assert_eq!(updated.files, original.files);
    assert_eq!(updated.author, "alice");
    assert_eq!(updated.id, original.id);
    assert!(updated.date >= original.date);

    assert_eq!(store.list().await.unwrap(), vec![updated]);
}

#[tokio::test]
async fn test_empty_patch_only_refreshes_date() {
    let (_dir, store) = test_store();
    let original = sample_post("alice", "hi");
    store.append(original.clone()).await.unwrap();

    let updated = store.replace_at(0, &PostPatch::default()).await.unwrap();
    assert_eq!(updated.title, original.title);
    assert_eq!(updated.content, original.content);
    assert!(updated.date >= original.date);
}

#[tokio::test]
async fn test_out_of_range_index() {
    let (_dir, store) = test_store();
    store.append(sample_post("alice", "only")).await.unwrap();

    let err = store.replace_at(1, &title_patch("x")).await.unwrap_err();
    assert!(matches!(err, BoardError::InvalidIndex { index: 1, len: 1 }));

    let err = store.remove_at(7).await.unwrap_err();
    assert!(matches!(err, BoardError::InvalidIndex { index: 7, len: 1 }));

    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_remove_at_returns_post_and_shifts_indices() {
    let (_dir, store) = test_store();
    for title in ["p0", "p1", "p2"] {
        store.append(sample_post("alice", title)).await.unwrap();
    }

    let removed = store.remove_at(0).await.unwrap();
    assert_eq!(removed.title, "p0");

    let posts = store.list().await.unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].title, "p1");
    assert_eq!(posts[1].title, "p2");
}

#[tokio::test]
async fn test_lookup_by_id_survives_reordering() {
    let (_dir, store) = test_store();
    let first = sample_post("alice", "p0");
    let second = sample_post("alice", "p1");
    store.append(first.clone()).await.unwrap();
    store.append(second.clone()).await.unwrap();

    store.remove_at(0).await.unwrap();

    assert_eq!(store.get(PostKey::Id(second.id)).await.unwrap().title, "p1");
    let err = store.get(PostKey::Id(first.id)).await.unwrap_err();
    assert!(matches!(err, BoardError::PostNotFound(id) if id == first.id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_lose_nothing() {
    let (_dir, store) = test_store();
    let store = Arc::new(store);

    let mut handles = Vec::new();
    for i in 0..25 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .append(sample_post("alice", &format!("p{i}")))
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.list().await.unwrap().len(), 25);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_edits_and_appends_interleave_safely() {
    let (_dir, store) = test_store();
    let store = Arc::new(store);
    store.append(sample_post("alice", "target")).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..10 {
        let append_store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            append_store
                .append(sample_post("bob", &format!("extra{i}")))
                .await
                .unwrap();
        }));
        let edit_store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            edit_store
                .replace_at(0, &title_patch(&format!("edit{i}")))
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let posts = store.list().await.unwrap();
    assert_eq!(posts.len(), 11);
    assert!(posts[0].title.starts_with("edit"));
    assert_eq!(posts[0].author, "alice");
}
