//! Remote operation routing.
//!
//! Format, mount, RAID and LVM commands are opaque to the engine: it
//! submits them to the transport, hands the caller a waiter, and relays
//! whatever completion the daemon produces. At most one completion is
//! delivered per request, always on the dispatcher's thread of control.
//! Retry policy, if any, belongs to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use storage_graph_types::{RemoteOpError, RemoteRequest, RequestId};
use tokio::sync::oneshot;
use tracing::debug;

use crate::dispatch::{DispatcherHandle, GraphMessage};
use crate::error::GraphError;

/// Where a transport posts completions. Routes them through the dispatcher
/// queue so they land on the same logical thread as graph mutation.
#[derive(Debug, Clone)]
pub struct CompletionSink {
    queue: DispatcherHandle,
}

impl CompletionSink {
    pub fn complete(&self, request_id: RequestId, result: Result<(), RemoteOpError>) {
        // A shut-down dispatcher means nobody is waiting; drop silently.
        let _ = self
            .queue
            .send(GraphMessage::RemoteComplete { request_id, result });
    }
}

/// The seam to the daemon. Implementations submit the request over the
/// wire and eventually post exactly one completion to the sink, including
/// after a cancel (which completes with [`RemoteOpError::Cancelled`]).
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    async fn submit(
        &self,
        request_id: RequestId,
        request: RemoteRequest,
        completions: CompletionSink,
    ) -> Result<(), RemoteOpError>;

    /// Requests cancellation. Best effort: the engine only routes it and
    /// accepts a later completion carrying the cancellation error.
    async fn cancel(&self, request_id: RequestId);
}

/// A waiter for one submitted operation.
pub struct RemoteCompletion {
    pub request_id: RequestId,
    receiver: oneshot::Receiver<Result<(), RemoteOpError>>,
}

impl RemoteCompletion {
    /// Resolves when the daemon completes the request. An engine shutdown
    /// before completion surfaces as [`GraphError::DispatcherGone`].
    pub async fn wait(self) -> Result<Result<(), RemoteOpError>, GraphError> {
        self.receiver.await.map_err(|_| GraphError::DispatcherGone)
    }
}

/// Entry point for issuing remote operations against the graph's devices.
#[derive(Clone)]
pub struct RemoteOps {
    transport: Arc<dyn RemoteTransport>,
    queue: DispatcherHandle,
}

impl RemoteOps {
    pub fn new(transport: Arc<dyn RemoteTransport>, queue: DispatcherHandle) -> Self {
        Self { transport, queue }
    }

    /// Fire-and-forget submit. The returned waiter resolves with the
    /// daemon's verdict; dropping it does not cancel the operation.
    pub async fn submit(&self, request: RemoteRequest) -> Result<RemoteCompletion, GraphError> {
        let request_id = RequestId::new();
        let (waiter, receiver) = oneshot::channel();

        // Register the waiter before the transport can possibly complete.
        self.queue
            .send(GraphMessage::RemoteSubmitted { request_id, waiter })?;

        debug!(request = %request_id, "submitting remote operation");
        if let Err(error) = self
            .transport
            .submit(
                request_id,
                request,
                CompletionSink {
                    queue: self.queue.clone(),
                },
            )
            .await
        {
            // Synchronous rejection: complete the request ourselves so the
            // waiter resolves exactly once, still via the queue.
            CompletionSink {
                queue: self.queue.clone(),
            }
            .complete(request_id, Err(error));
        }

        Ok(RemoteCompletion {
            request_id,
            receiver,
        })
    }

    /// Routes a cancel request. The completion, when it arrives, carries
    /// [`RemoteOpError::Cancelled`]; the engine does not enforce anything.
    pub async fn cancel(&self, request_id: RequestId) {
        self.transport.cancel(request_id).await;
    }
}
