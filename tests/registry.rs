use airsense::{
    data::{
        registry::{LocationRegistry, STORAGE_KEY},
        store::{FileStore, KeyValueStore},
    },
    domain::location::Coordinate,
    error::EngineError,
};
use anyhow::{Result, anyhow};
use futures::future::{self, BoxFuture, FutureExt};

/// Reads succeed with nothing stored; every write fails.
struct ReadOnlyStore;

impl KeyValueStore for ReadOnlyStore {
    fn get<'a>(&'a self, _key: &'a str) -> BoxFuture<'a, Result<Option<String>>> {
        future::ready(Ok(None)).boxed()
    }

    fn set<'a>(&'a self, _key: &'a str, _value: String) -> BoxFuture<'a, Result<()>> {
        future::ready(Err(anyhow!("read-only filesystem"))).boxed()
    }
}

#[tokio::test]
async fn saved_location_survives_a_restart() {
    let dir = tempfile::tempdir().expect("tempdir");

    let mut registry = LocationRegistry::new(FileStore::new(dir.path()));
    assert!(registry.load().await.is_empty());
    let created = registry
        .create("Oliwa", "park gate", Coordinate::new(54.41, 18.56))
        .await
        .expect("create");
    assert!(created.is_persisted());

    let mut reopened = LocationRegistry::new(FileStore::new(dir.path()));
    let loaded = reopened.load().await;
    assert_eq!(loaded, vec![created.location.clone()]);
    assert!(reopened.find_by_id(&created.location.id).is_some());

    let second = reopened
        .create("Sopot", "", Coordinate::new(54.44, 18.57))
        .await
        .expect("second create");
    assert_ne!(second.location.id, created.location.id);
    assert_eq!(reopened.locations().len(), 2);
}

#[tokio::test]
async fn store_file_lands_under_the_config_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStore::new(dir.path());
    let mut registry = LocationRegistry::new(store.clone());
    registry
        .create("Brzezno", "", Coordinate::new(54.41, 18.63))
        .await
        .expect("create");

    let path = store.path_for(STORAGE_KEY);
    assert!(path.starts_with(dir.path()));
    let raw = std::fs::read_to_string(&path).expect("payload on disk");
    assert!(raw.contains("Brzezno"));
}

#[tokio::test]
async fn corrupt_file_loads_as_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStore::new(dir.path());
    std::fs::write(store.path_for(STORAGE_KEY), "[{\"id\": 1").expect("write corrupt payload");

    let mut registry = LocationRegistry::new(store);
    assert!(registry.load().await.is_empty());
}

#[tokio::test]
async fn failed_write_keeps_the_entry_in_memory() {
    let mut registry = LocationRegistry::new(ReadOnlyStore);
    let created = registry
        .create("Stogi", "beach", Coordinate::new(54.37, 18.72))
        .await
        .expect("validation passes");

    assert!(!created.is_persisted());
    assert!(matches!(
        &created.persist_error,
        Some(EngineError::PersistenceFailure(message)) if message.contains("read-only filesystem")
    ));
    assert_eq!(registry.locations(), std::slice::from_ref(&created.location));
}

#[tokio::test]
#[cfg(unix)]
async fn store_file_is_private_to_the_user() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStore::new(dir.path());
    store
        .set(STORAGE_KEY, "[]".to_string())
        .await
        .expect("write payload");

    let mode = std::fs::metadata(store.path_for(STORAGE_KEY))
        .expect("metadata")
        .permissions()
        .mode()
        & 0o777;
    assert_eq!(mode, 0o600);
}
