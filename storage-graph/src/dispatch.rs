//! The single logical thread of control.
//!
//! Every mutation of the cache or the graph happens by posting a
//! [`GraphMessage`] onto one FIFO queue and letting the dispatcher process
//! it; device notifications, coldplug replays, deferred re-notifications
//! and remote-operation completions all interleave on that queue. No
//! handler blocks and no locks exist, because nothing else ever touches
//! the pool.

use std::collections::HashMap;

use storage_graph_types::{DeviceRecord, RemoteOpError, RequestId};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::GraphError;
use crate::events::PoolEventStream;
use crate::pool::Pool;

/// One unit of work for the dispatcher.
#[derive(Debug)]
pub enum GraphMessage {
    DeviceAdded(DeviceRecord),
    DeviceChanged(DeviceRecord),
    DeviceRemoved(String),

    /// Full-scan replay; processed as one synthesis pass.
    Coldplug(Vec<DeviceRecord>),

    /// Deferred re-notification: re-emit `Changed` for a presentable on a
    /// later queue turn, after whatever pass queued it has fully flushed.
    NotifyChanged(String),

    /// A remote operation was submitted; the waiter gets the completion.
    RemoteSubmitted {
        request_id: RequestId,
        waiter: oneshot::Sender<Result<(), RemoteOpError>>,
    },

    /// A remote operation finished; relayed verbatim to the waiter.
    RemoteComplete {
        request_id: RequestId,
        result: Result<(), RemoteOpError>,
    },

    Shutdown,
}

/// Cloneable handle for posting messages onto the dispatcher queue.
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    sender: mpsc::UnboundedSender<GraphMessage>,
}

impl DispatcherHandle {
    pub fn send(&self, message: GraphMessage) -> Result<(), GraphError> {
        self.sender
            .send(message)
            .map_err(|_| GraphError::DispatcherGone)
    }

    pub fn device_added(&self, record: DeviceRecord) -> Result<(), GraphError> {
        self.send(GraphMessage::DeviceAdded(record))
    }

    pub fn device_changed(&self, record: DeviceRecord) -> Result<(), GraphError> {
        self.send(GraphMessage::DeviceChanged(record))
    }

    pub fn device_removed(&self, device_id: impl Into<String>) -> Result<(), GraphError> {
        self.send(GraphMessage::DeviceRemoved(device_id.into()))
    }

    pub fn coldplug(&self, records: Vec<DeviceRecord>) -> Result<(), GraphError> {
        self.send(GraphMessage::Coldplug(records))
    }

    pub fn shutdown(&self) -> Result<(), GraphError> {
        self.send(GraphMessage::Shutdown)
    }
}

/// Owns the pool and drains the message queue.
pub struct Dispatcher {
    pool: Pool,
    receiver: mpsc::UnboundedReceiver<GraphMessage>,
    pending: HashMap<RequestId, oneshot::Sender<Result<(), RemoteOpError>>>,
}

impl Dispatcher {
    pub fn new() -> (Self, DispatcherHandle) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                pool: Pool::new(),
                receiver,
                pending: HashMap::new(),
            },
            DispatcherHandle { sender },
        )
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut Pool {
        &mut self.pool
    }

    pub fn subscribe(&mut self) -> PoolEventStream {
        self.pool.subscribe()
    }

    /// Processes messages until the queue closes or a `Shutdown` arrives.
    pub async fn run(mut self) {
        while let Some(message) = self.receiver.recv().await {
            if !self.handle(message) {
                break;
            }
        }
        debug!("graph dispatcher stopped");
    }

    /// Drains everything currently queued without waiting. Useful for
    /// callers that drive the loop themselves.
    pub fn drain(&mut self) {
        while let Ok(message) = self.receiver.try_recv() {
            if !self.handle(message) {
                break;
            }
        }
    }

    fn handle(&mut self, message: GraphMessage) -> bool {
        match message {
            GraphMessage::DeviceAdded(record) => self.pool.device_added(record),
            GraphMessage::DeviceChanged(record) => self.pool.device_changed(record),
            GraphMessage::DeviceRemoved(device_id) => self.pool.device_removed(&device_id),
            GraphMessage::Coldplug(records) => self.pool.coldplug(records),
            GraphMessage::NotifyChanged(id) => self.pool.renotify(&id),
            GraphMessage::RemoteSubmitted { request_id, waiter } => {
                self.pending.insert(request_id, waiter);
            }
            GraphMessage::RemoteComplete { request_id, result } => {
                match self.pending.remove(&request_id) {
                    Some(waiter) => {
                        // The waiter may have given up; that is its business.
                        let _ = waiter.send(result);
                    }
                    None => {
                        // Duplicate or unsolicited completion; at-most-once
                        // delivery means we drop it, loudly.
                        warn!(request = %request_id, "completion for unknown remote request dropped");
                    }
                }
            }
            GraphMessage::Shutdown => return false,
        }
        true
    }
}
