use super::*;
use crate::factory::{NodeSpec, create_node};
use crate::scene::SceneGraph;
use crate::shape::ShapeKind;
use crate::state::test_helpers;

#[tokio::test]
async fn save_snapshot_returns_created_with_id() {
    let (state, store) = test_helpers::test_app_state();
    let mut scene = SceneGraph::new();
    create_node(&mut scene, NodeSpec::new(ShapeKind::Ellipse, "blue"));

    let (status, Json(body)) = save_snapshot(State(state), Path("gallery".into()), Json(scene.snapshot()))
        .await
        .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.room_id, "gallery");
    let saved = store.saved().await;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].id, body.id);
    assert_eq!(saved[0].room, "gallery");
}
