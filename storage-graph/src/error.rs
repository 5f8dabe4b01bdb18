//! Error types for the graph engine.
//!
//! Lookup misses are deliberately *not* errors: the graph is eventually
//! consistent and `Option` returns are the normal way to observe a device
//! or presentable that is mid-rebuild or already gone.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    /// A synthesis rule produced two presentables with the same id. This is
    /// a rule bug; release builds coalesce to the first-seen instance.
    #[error("duplicate presentable id: {0}")]
    DuplicateId(String),

    /// The dispatcher queue is gone, usually because the engine shut down
    /// while a caller still held a handle.
    #[error("graph dispatcher is not running")]
    DispatcherGone,

    /// A remote completion arrived for a request we are not tracking.
    #[error("unknown remote request: {0}")]
    UnknownRequest(String),
}
