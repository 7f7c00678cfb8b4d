#![allow(clippy::float_cmp)]

use super::*;
use crate::factory::{NodeSpec, create_node};
use crate::geometry::{Point, Transform};
use crate::lifecycle;
use crate::shape::ShapeKind;

fn two_nodes() -> (SceneGraph, NodeId, NodeId) {
    let mut scene = SceneGraph::new();
    let a = create_node(&mut scene, NodeSpec::new(ShapeKind::Rectangle, "red"));
    let b = create_node(&mut scene, NodeSpec::new(ShapeKind::Ellipse, "blue").at(Point::new(400.0, 300.0)));
    (scene, a, b)
}

fn connected() -> (SceneGraph, NodeId, NodeId, LineId) {
    let (mut scene, a, b) = two_nodes();
    let mut mode = ConnectMode::new();
    mode.enter();
    mode.pick(a);
    mode.pick(b);
    let line = connect(&mut scene, &mut mode).unwrap();
    (scene, a, b, line)
}

// =============================================================
// SelectionBuffer / ConnectMode
// =============================================================

#[test]
fn buffer_holds_at_most_two_distinct_picks() {
    let mut buffer = SelectionBuffer::new();
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    assert!(buffer.push(a));
    assert!(!buffer.push(a));
    assert!(buffer.push(b));
    assert!(!buffer.push(c));
    assert_eq!(buffer.picks(), &[a, b]);
}

#[test]
fn toggling_connect_mode_clears_picks() {
    let mut mode = ConnectMode::new();
    assert!(mode.toggle());
    mode.pick(Uuid::new_v4());
    assert_eq!(mode.buffer().len(), 1);
    assert!(!mode.toggle());
    assert!(mode.buffer().is_empty());
    assert!(mode.toggle());
    assert!(mode.buffer().is_empty());
}

#[test]
fn pick_reports_full_pair() {
    let mut mode = ConnectMode::new();
    mode.enter();
    assert!(!mode.pick(Uuid::new_v4()));
    assert!(mode.pick(Uuid::new_v4()));
}

// =============================================================
// connect
// =============================================================

#[test]
fn connect_draws_line_between_centers_and_tags_back_refs() {
    let (scene, a, b, line_id) = connected();

    let line = scene.line(line_id).unwrap();
    assert_eq!(line.endpoint(Endpoint::P1), scene.node(a).unwrap().center());
    assert_eq!(line.endpoint(Endpoint::P2), scene.node(b).unwrap().center());
    assert_eq!(line.stroke, "black");
    assert_eq!(line.stroke_width, 2.0);

    assert_eq!(
        scene.node(a).unwrap().connections,
        vec![BackRef { endpoint: Endpoint::P1, line: line_id, peer: b }]
    );
    assert_eq!(
        scene.node(b).unwrap().connections,
        vec![BackRef { endpoint: Endpoint::P2, line: line_id, peer: a }]
    );
}

#[test]
fn connect_consumes_buffer_and_exits_mode() {
    let (mut scene, a, b) = two_nodes();
    let mut mode = ConnectMode::new();
    mode.enter();
    mode.pick(a);
    mode.pick(b);
    connect(&mut scene, &mut mode).unwrap();
    assert!(!mode.is_active());
    assert!(mode.buffer().is_empty());
}

#[test]
fn new_lines_go_beneath_existing_lines() {
    let (mut scene, a, b, first) = connected();
    let mut mode = ConnectMode::new();
    mode.enter();
    mode.pick(b);
    mode.pick(a);
    let second = connect(&mut scene, &mut mode).unwrap();
    assert_eq!(scene.lines()[0].id, second);
    assert_eq!(scene.lines()[1].id, first);
}

#[test]
fn connect_with_one_pick_is_rejected_without_mutation() {
    let (mut scene, a, _) = two_nodes();
    let mut mode = ConnectMode::new();
    mode.enter();
    mode.pick(a);

    let err = connect(&mut scene, &mut mode).unwrap_err();
    assert!(matches!(err, ConnectError::IncompleteSelection(1)));
    assert!(scene.lines().is_empty());
    assert!(mode.is_active());
    assert_eq!(mode.buffer().picks(), &[a]);
    assert!(scene.node(a).unwrap().connections.is_empty());
}

#[test]
fn connect_with_empty_buffer_is_rejected() {
    let (mut scene, _, _) = two_nodes();
    let mut mode = ConnectMode::new();
    let err = connect(&mut scene, &mut mode).unwrap_err();
    assert!(matches!(err, ConnectError::IncompleteSelection(0)));
    assert_eq!(err.error_code(), "E_INCOMPLETE_SELECTION");
}

#[test]
fn connect_to_missing_node_is_rejected_without_mutation() {
    let (mut scene, a, _) = two_nodes();
    let ghost = Uuid::new_v4();
    let mut mode = ConnectMode::new();
    mode.enter();
    mode.pick(a);
    mode.pick(ghost);

    let err = connect(&mut scene, &mut mode).unwrap_err();
    assert!(matches!(err, ConnectError::NodeNotFound(id) if id == ghost));
    assert!(scene.lines().is_empty());
    assert!(scene.node(a).unwrap().connections.is_empty());
    assert_eq!(mode.buffer().len(), 2);
}

#[test]
fn connect_reaches_node_held_for_editing() {
    let (mut scene, a, b) = two_nodes();
    let token = lifecycle::ungroup(&mut scene, b).unwrap();
    let mut mode = ConnectMode::new();
    mode.enter();
    mode.pick(a);
    mode.pick(b);

    let line = connect(&mut scene, &mut mode).unwrap();
    assert_eq!(scene.detached(b).unwrap().connections[0].line, line);

    lifecycle::regroup(&mut scene, token, None).unwrap();
    let node = scene.node(b).unwrap();
    assert_eq!(node.connections.len(), 1);
    assert_eq!(node.connections[0].endpoint, Endpoint::P2);
    assert_eq!(scene.line(line).unwrap().endpoint(Endpoint::P2), node.center());
}

// =============================================================
// reanchor
// =============================================================

#[test]
fn moving_first_node_updates_only_p1() {
    let (mut scene, a, b, line_id) = connected();
    let before_p2 = scene.line(line_id).unwrap().endpoint(Endpoint::P2);

    lifecycle::apply_transform(&mut scene, a, Transform::at(Point::new(50.0, 50.0))).unwrap();

    let line = scene.line(line_id).unwrap();
    assert_eq!(line.endpoint(Endpoint::P1), Point::new(150.0, 100.0));
    assert_eq!(line.endpoint(Endpoint::P2), before_p2);
    assert_eq!(line.endpoint(Endpoint::P2), scene.node(b).unwrap().center());
}

#[test]
fn endpoints_track_centers_after_many_moves() {
    let (mut scene, a, b, line_id) = connected();
    for step in 0..20 {
        let offset = f64::from(step) * 13.5;
        lifecycle::apply_transform(&mut scene, a, Transform::at(Point::new(offset, -offset))).unwrap();
        lifecycle::apply_transform(&mut scene, b, Transform::at(Point::new(-offset, offset * 2.0))).unwrap();
    }
    let line = scene.line(line_id).unwrap();
    assert_eq!(line.endpoint(Endpoint::P1), scene.node(a).unwrap().center());
    assert_eq!(line.endpoint(Endpoint::P2), scene.node(b).unwrap().center());
}

#[test]
fn reanchor_without_connections_touches_nothing() {
    let (mut scene, a, _) = two_nodes();
    assert_eq!(reanchor(&mut scene, a), 0);
    assert_eq!(reanchor(&mut scene, Uuid::new_v4()), 0);
}

#[test]
fn reanchor_counts_every_owned_endpoint() {
    let (mut scene, a, b, _) = connected();
    let mut mode = ConnectMode::new();
    mode.enter();
    mode.pick(a);
    mode.pick(b);
    connect(&mut scene, &mut mode).unwrap();
    assert_eq!(reanchor(&mut scene, a), 2);
}
