// Blob store behaviour across concurrent writers and restarts

mod common;

use bytes::Bytes;
use common::{png_bytes, seeded_bytes};
use futures::TryStreamExt;
use imgapi_core::ImageDigest;
use imgapi_storage::{BlobStore, FilesystemBlobStore, StorageError};
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_put_returns_content_digest() {
    let temp_dir = TempDir::new().unwrap();
    let store = FilesystemBlobStore::new(temp_dir.path()).await.unwrap();
    let data = png_bytes(4, 4);

    let outcome = store.put(data.clone()).await.unwrap();

    assert_eq!(outcome.digest, ImageDigest::compute(&data));
    assert_eq!(outcome.path, temp_dir.path().join(outcome.digest.to_hex()));
    assert_eq!(store.read_at(&outcome.path).await.unwrap(), data);
}

#[tokio::test]
async fn test_second_put_of_same_bytes_not_created() {
    let temp_dir = TempDir::new().unwrap();
    let store = FilesystemBlobStore::new(temp_dir.path()).await.unwrap();
    let data = seeded_bytes(7, 4096);

    let first = store.put(data.clone()).await.unwrap();
    let second = store.put(data).await.unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.digest, second.digest);
    assert_eq!(first.path, second.path);
}

#[tokio::test]
async fn test_concurrent_puts_create_exactly_once() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(FilesystemBlobStore::new(temp_dir.path()).await.unwrap());
    let data = seeded_bytes(99, 64 * 1024);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = store.clone();
        let data = data.clone();
        handles.push(tokio::spawn(async move { store.put(data).await.unwrap() }));
    }

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().created {
            created += 1;
        }
    }
    assert_eq!(created, 1);

    let blobs: Vec<_> = store.list_all().await.unwrap().try_collect().await.unwrap();
    assert_eq!(blobs.len(), 1);
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_path_for_after_put() {
    let temp_dir = TempDir::new().unwrap();
    let store = FilesystemBlobStore::new(temp_dir.path()).await.unwrap();

    let outcome = store.put(Bytes::from_static(b"abc")).await.unwrap();

    assert_eq!(store.path_for(&outcome.digest).await.unwrap(), outcome.path);
    let missing = ImageDigest::compute(b"never stored");
    assert!(matches!(
        store.path_for(&missing).await,
        Err(StorageError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_list_all_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let mut expected = HashSet::new();
    {
        let store = FilesystemBlobStore::new(temp_dir.path()).await.unwrap();
        for seed in 0..10 {
            expected.insert(store.put(seeded_bytes(seed, 512)).await.unwrap().digest);
        }
    }

    let reopened = FilesystemBlobStore::new(temp_dir.path()).await.unwrap();
    let listed: HashSet<_> = reopened
        .list_all()
        .await
        .unwrap()
        .map_ok(|blob| blob.digest)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(listed, expected);
}
