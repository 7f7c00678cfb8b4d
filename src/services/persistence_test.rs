use super::*;
use crate::factory::{NodeSpec, create_node};
use crate::scene::SceneGraph;
use crate::shape::ShapeKind;

#[tokio::test]
async fn memory_store_keeps_snapshots_in_order() {
    let store = MemorySnapshotStore::new();
    let mut scene = SceneGraph::new();
    create_node(&mut scene, NodeSpec::new(ShapeKind::Rectangle, "red"));

    let first = store.save("alpha", &scene.snapshot()).await.unwrap();
    let second = store.save("beta", &BoardSnapshot::default()).await.unwrap();

    let saved = store.saved().await;
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].id, first);
    assert_eq!(saved[0].room, "alpha");
    assert_eq!(saved[0].snapshot["nodes"].as_array().map(Vec::len), Some(1));
    assert_eq!(saved[1].id, second);
    assert_ne!(first, second);
}

#[tokio::test]
async fn clones_share_storage() {
    let store = MemorySnapshotStore::new();
    let handle: Arc<dyn SnapshotStore> = Arc::new(store.clone());
    handle.save("room", &BoardSnapshot::default()).await.unwrap();
    assert_eq!(store.saved().await.len(), 1);
}

#[test]
fn counts_saturate() {
    assert_eq!(count(3), 3);
    assert_eq!(count(usize::MAX), i32::MAX);
}

#[test]
fn database_errors_are_retryable() {
    let err = PersistenceError::Database(sqlx::Error::PoolTimedOut);
    assert_eq!(err.error_code(), "E_DATABASE");
    assert!(err.retryable());
}
