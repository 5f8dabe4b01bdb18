// SPDX-License-Identifier: GPL-3.0-only

//! Presentable graph and device-state synthesis engine.
//!
//! Turns the flat stream of raw block-device change notifications coming
//! from the daemon into a coherent, hierarchical model of things a user can
//! act on: drives, volumes, free-space holes, RAID arrays, LVM volume
//! groups and logical volumes, host adapters and expanders.
//!
//! ## Architecture
//!
//! - [`cache::DeviceRecordCache`] holds the latest snapshot per device.
//! - [`presentable::Presentable`] is the closed set of node kinds.
//! - [`pool::Pool`] owns all live presentables and their enclosing edges;
//!   every cache mutation triggers a full re-synthesis that is diffed
//!   against the live set, so replaying device events in any order
//!   converges to the same graph.
//! - [`events`] fans `Added`/`Removed`/`Changed`/`JobChanged` out to
//!   consumers after all graph mutation for a pass has completed.
//! - [`dispatch::Dispatcher`] is the single logical thread of control:
//!   device events, coldplug replays and remote-operation completions all
//!   go through one FIFO queue.
//! - [`ops`] is the seam to the daemon for mount/format/RAID/LVM requests;
//!   the engine routes them and relays completions, nothing more.

pub mod cache;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod ops;
pub mod pool;
pub mod presentable;

pub use storage_graph_types as types;

pub use cache::DeviceRecordCache;
pub use dispatch::{Dispatcher, DispatcherHandle, GraphMessage};
pub use error::GraphError;
pub use events::{PoolEvent, PoolEventStream};
pub use ops::{CompletionSink, RemoteCompletion, RemoteOps, RemoteTransport};
pub use pool::Pool;
pub use presentable::Presentable;
