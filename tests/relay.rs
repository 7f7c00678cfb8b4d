//! The relay server end to end: a real listener, websocket clients speaking
//! JSON frames, and the in-memory snapshot store.

use std::sync::Arc;
use std::time::Duration;

use syncboard::board::{Board, Command, Input, Outcome};
use syncboard::client::SAVE_SYSCALL;
use syncboard::factory::NodeSpec;
use syncboard::frame::{Data, FRAME_CODE, Frame, Status};
use syncboard::geometry::{Point, Transform};
use syncboard::protocol;
use syncboard::routes;
use syncboard::services::persistence::MemorySnapshotStore;
use syncboard::shape::ShapeKind;
use syncboard::state::AppState;
use syncboard::transport::{Transport, WsTransport};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

const ROOM: &str = "relay-room";

struct Relay {
    addr: std::net::SocketAddr,
    state: AppState,
    store: MemorySnapshotStore,
}

impl Relay {
    fn ws_url(&self) -> String {
        format!("ws://{}/api/ws", self.addr)
    }

    async fn wait_for_members(&self, n: usize) {
        for _ in 0..400 {
            if self.state.hub.members(ROOM).await == n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("room never reached {n} members");
    }
}

async fn start_relay() -> Relay {
    let store = MemorySnapshotStore::new();
    let state = AppState::new(Arc::new(store.clone()), 64);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = routes::app(state.clone());
    tokio::spawn(async move { axum::serve(listener, app).await });
    Relay { addr, state, store }
}

/// Next frame whose syscall satisfies `pred`, skipping membership notices.
async fn recv_matching(transport: &mut WsTransport, pred: impl Fn(&Frame) -> bool) -> Frame {
    timeout(Duration::from_secs(2), async {
        loop {
            let frame = transport.recv().await.expect("relay closed the socket");
            if pred(&frame) {
                return frame;
            }
        }
    })
    .await
    .expect("timed out waiting for frame")
}

#[tokio::test]
async fn healthz_answers_ok() {
    let relay = start_relay().await;
    let mut stream = TcpStream::connect(relay.addr).await.unwrap();
    stream
        .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"), "unexpected response: {response}");
}

#[tokio::test]
async fn websocket_peers_converge_through_relay() {
    let relay = start_relay().await;
    let mut sender = WsTransport::connect(&relay.ws_url()).await.unwrap();
    let mut receiver = WsTransport::connect(&relay.ws_url()).await.unwrap();
    assert!(sender.client_id().is_some());
    receiver.join_room(ROOM).await.unwrap();
    sender.join_room(ROOM).await.unwrap();
    relay.wait_for_members(2).await;

    let mut origin = Board::new(ROOM);
    let mut replica = Board::new(ROOM);
    let rect = NodeSpec::new(ShapeKind::Rectangle, "red");
    let ellipse = NodeSpec::new(ShapeKind::Ellipse, "blue").at(Point::new(300.0, 200.0));
    let (ra, eb) = (rect.id, ellipse.id);
    let commands = [
        Command::AddNode(rect),
        Command::AddNode(ellipse),
        Command::ToggleConnectMode,
        Command::Press { id: ra, at_ms: 0 },
        Command::Press { id: ra, at_ms: 50 },
        Command::Press { id: eb, at_ms: 1_000 },
        Command::Press { id: eb, at_ms: 1_050 },
        Command::Transform { id: eb, transform: Transform::at(Point::new(350.0, 220.0)) },
        Command::ChangeColor { id: ra, color: "orange".into() },
    ];

    let mut published = 0;
    for command in commands {
        if let Some(event) = origin.dispatch(Input::Local(command)).event() {
            sender.emit(protocol::to_frame(event, ROOM).unwrap()).await.unwrap();
            published += 1;
        }
    }
    assert_eq!(published, 5);

    for _ in 0..published {
        let frame = recv_matching(&mut receiver, |f| protocol::is_scene_syscall(&f.syscall)).await;
        assert_eq!(replica.receive(&frame), Outcome::Quiet);
    }

    let summary = |board: &Board| -> Vec<_> {
        board.scene().nodes().iter().map(|n| (n.id, n.transform, n.shape.fill.clone(), n.connections.len())).collect()
    };
    assert_eq!(summary(&replica), summary(&origin));
    assert_eq!(replica.scene().lines().len(), 1);
    let line = &replica.scene().lines()[0];
    assert_eq!(Point::new(line.x2, line.y2), replica.scene().node(eb).unwrap().center());

    sender.disconnect().await.unwrap();
    let part = recv_matching(&mut receiver, |f| f.syscall == "room:part").await;
    assert_eq!(part.str_field("client_id"), sender.client_id());
    relay.wait_for_members(1).await;
    receiver.disconnect().await.unwrap();
}

#[tokio::test]
async fn malformed_scene_frame_bounces_to_sender() {
    let relay = start_relay().await;
    let mut sender = WsTransport::connect(&relay.ws_url()).await.unwrap();
    sender.join_room(ROOM).await.unwrap();

    let bogus = Frame::request("scene:regrouping", Data::new()).with_data("text", "no id");
    let bogus_id = bogus.id;
    sender.emit(bogus).await.unwrap();

    let reply = recv_matching(&mut sender, |f| f.parent_id == Some(bogus_id)).await;
    assert_eq!(reply.status, Status::Error);
    assert_eq!(reply.str_field(FRAME_CODE), Some("E_MALFORMED_EVENT"));
}

#[tokio::test]
async fn save_frame_archives_snapshot() {
    let relay = start_relay().await;
    let mut sender = WsTransport::connect(&relay.ws_url()).await.unwrap();
    sender.join_room(ROOM).await.unwrap();

    let mut board = Board::new(ROOM);
    board.dispatch(Input::Local(Command::AddNode(NodeSpec::new(ShapeKind::Rectangle, "red"))));
    let Outcome::PublishAndArchive { snapshot, .. } = board.dispatch(Input::Local(Command::Clear)) else {
        panic!("clear should archive");
    };
    let save = Frame::request(SAVE_SYSCALL, Data::new()).with_data("snapshot", snapshot.to_value().unwrap());
    let save_id = save.id;
    sender.emit(save).await.unwrap();

    let reply = recv_matching(&mut sender, |f| f.parent_id == Some(save_id)).await;
    assert_eq!(reply.status, Status::Done);
    let saved = relay.store.saved().await;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].room, ROOM);
    assert_eq!(reply.str_field("snapshot_id"), Some(saved[0].id.to_string().as_str()));
}
