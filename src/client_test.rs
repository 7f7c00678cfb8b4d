use std::time::Duration;

use uuid::Uuid;

use super::*;
use crate::factory::NodeSpec;
use crate::geometry::{Point, Transform};
use crate::node::NodeId;
use crate::scene::BoardSnapshot;
use crate::shape::ShapeKind;
use crate::transport::{HubTransport, RoomHub};

async fn wait_for_members(hub: &RoomHub, room: &str, n: usize) {
    for _ in 0..400 {
        if hub.members(room).await >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("room {room} never reached {n} members");
}

fn spawn_client(
    hub: &RoomHub,
    room: &str,
) -> (mpsc::Sender<Command>, tokio::task::JoinHandle<Result<Board, ClientError>>) {
    let (tx, rx) = mpsc::channel(64);
    let handle = tokio::spawn(run_client(HubTransport::new(hub.clone(), 256), Board::new(room), rx));
    (tx, handle)
}

#[tokio::test]
async fn local_commands_replicate_to_peer() {
    let hub = RoomHub::new();
    let (tx_b, b) = spawn_client(&hub, "room");
    wait_for_members(&hub, "room", 1).await;
    let (tx_a, a) = spawn_client(&hub, "room");

    let rect = NodeSpec::new(ShapeKind::Rectangle, "red");
    let ellipse = NodeSpec::new(ShapeKind::Ellipse, "blue").at(Point::new(400.0, 300.0));
    let (ra, eb): (NodeId, NodeId) = (rect.id, ellipse.id);
    let commands = [
        Command::AddNode(rect),
        Command::AddNode(ellipse),
        Command::ToggleConnectMode,
        Command::Press { id: ra, at_ms: 0 },
        Command::Press { id: ra, at_ms: 100 },
        Command::Press { id: eb, at_ms: 1_000 },
        Command::Press { id: eb, at_ms: 1_100 },
        Command::Transform { id: ra, transform: Transform::at(Point::new(50.0, 50.0)) },
        Command::Press { id: eb, at_ms: 5_000 },
        Command::Press { id: eb, at_ms: 5_100 },
        Command::CommitText { id: eb, text: "hello".into() },
        Command::ChangeColor { id: ra, color: "green".into() },
    ];
    for command in commands {
        tx_a.send(command).await.unwrap();
    }
    drop(tx_a);
    let board_a = a.await.unwrap().unwrap();
    drop(tx_b);
    let board_b = b.await.unwrap().unwrap();

    for board in [&board_a, &board_b] {
        let scene = board.scene();
        assert_eq!(scene.nodes().len(), 2);
        assert_eq!(scene.lines().len(), 1);
        let rect = scene.node(ra).unwrap();
        assert_eq!(rect.shape.fill, "green");
        assert_eq!(rect.transform.origin(), Point::new(50.0, 50.0));
        assert_eq!(scene.node(eb).unwrap().label.text, "hello");
        let line = &scene.lines()[0];
        assert_eq!(Point::new(line.x1, line.y1), rect.center());
        assert_eq!(Point::new(line.x2, line.y2), scene.node(eb).unwrap().center());
    }
}

#[tokio::test]
async fn clear_publishes_event_then_snapshot() {
    let hub = RoomHub::new();
    let (tx, mut rx) = mpsc::channel(16);
    hub.join("room", Uuid::new_v4(), tx).await;
    let (tx_a, a) = spawn_client(&hub, "room");

    tx_a.send(Command::AddNode(NodeSpec::new(ShapeKind::Rectangle, "red"))).await.unwrap();
    tx_a.send(Command::Clear).await.unwrap();
    drop(tx_a);
    let board = a.await.unwrap().unwrap();
    assert!(board.scene().is_empty());

    assert_eq!(rx.recv().await.unwrap().syscall, "scene:addedObject");
    assert_eq!(rx.recv().await.unwrap().syscall, "scene:clearCanvas");
    let save = rx.recv().await.unwrap();
    assert_eq!(save.syscall, SAVE_SYSCALL);
    assert_eq!(save.room_id.as_deref(), Some("room"));
    let snapshot: BoardSnapshot = serde_json::from_value(save.data["snapshot"].clone()).unwrap();
    assert_eq!(snapshot.nodes.len(), 1);
}

#[tokio::test]
async fn non_scene_frames_are_ignored() {
    let hub = RoomHub::new();
    let (tx_a, a) = spawn_client(&hub, "room");
    wait_for_members(&hub, "room", 1).await;

    let stray = Frame::request(SAVE_SYSCALL, Data::new()).with_room("room");
    hub.broadcast("room", &stray, None).await;
    drop(tx_a);
    let board = a.await.unwrap().unwrap();
    assert!(board.scene().is_empty());
}
