//! Synchronization core for a collaborative diagramming board.
//!
//! Every client keeps its own scene graph of diagram nodes (a shape plus a
//! text label) and the lines connecting them. Structural changes made locally
//! are turned into named events and relayed to the other clients in the same
//! room, which replay them through the same code paths so every scene graph
//! converges on the same visible state.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`geometry`] | Points, sizes, unit transforms and anchor math |
//! | [`consts`] | Default geometry, timing and styling constants |
//! | [`shape`] | Shape variants and text labels |
//! | [`node`] | Diagram nodes and connection back-references |
//! | [`scene`] | In-memory scene graph and board snapshots |
//! | [`connection`] | Connect mode, selection buffer, line creation and re-anchoring |
//! | [`lifecycle`] | Grouped / ungrouped-editing state machine and cascading delete |
//! | [`input`] | Double-press detector and node notifications |
//! | [`factory`] | Node construction with default geometry |
//! | [`frame`] | Wire envelope shared by clients and the relay |
//! | [`protocol`] | Replication events and their frame encoding |
//! | [`board`] | Per-client dispatcher for local commands and inbound events |
//! | [`transport`] | Room-scoped publish/subscribe interface and implementations |
//! | [`client`] | Cooperative client event loop |
//! | [`config`] | Relay configuration from the environment |
//! | [`state`], [`routes`], [`services`], [`db`] | Room relay server and snapshot persistence |

pub mod board;
pub mod client;
pub mod config;
pub mod connection;
pub mod consts;
pub mod db;
pub mod factory;
pub mod frame;
pub mod geometry;
pub mod input;
pub mod lifecycle;
pub mod node;
pub mod protocol;
pub mod routes;
pub mod scene;
pub mod services;
pub mod shape;
pub mod state;
pub mod transport;
