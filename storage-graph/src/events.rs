//! Pool event fan-out.
//!
//! Consumers learn about graph changes only through these events; there is
//! deliberately no polling interface. Events for one synthesis pass are
//! queued while the graph mutates and flushed FIFO afterwards, so a
//! consumer never observes a partially built graph.

use futures::Stream;
use futures::task::{Context, Poll};
use tokio::sync::mpsc;

use crate::presentable::Presentable;

/// One graph change notification.
#[derive(Debug, Clone, PartialEq)]
pub enum PoolEvent {
    /// A presentable came into existence. Parents are always announced
    /// before their children.
    Added(Presentable),

    /// The presentable with this id is gone; no further events will be
    /// emitted for it. Children are always announced before their parents.
    Removed(String),

    /// Attributes changed. Suppressed when a re-synthesis produced
    /// attribute-identical output.
    Changed(Presentable),

    /// Only the in-flight job state of the backing device changed.
    JobChanged(Presentable),
}

impl PoolEvent {
    /// Id of the presentable the event concerns.
    pub fn presentable_id(&self) -> &str {
        match self {
            Self::Added(p) | Self::Changed(p) | Self::JobChanged(p) => p.id(),
            Self::Removed(id) => id,
        }
    }
}

/// A subscription to pool events.
pub struct PoolEventStream {
    receiver: mpsc::UnboundedReceiver<PoolEvent>,
}

impl PoolEventStream {
    /// Receives the next event; `None` once the pool is dropped.
    pub async fn recv(&mut self) -> Option<PoolEvent> {
        self.receiver.recv().await
    }

    /// Drains whatever is queued right now without waiting.
    pub fn drain(&mut self) -> Vec<PoolEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }
}

impl Stream for PoolEventStream {
    type Item = PoolEvent;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Registry of live subscribers. Senders whose receiver went away are
/// pruned on the next broadcast.
#[derive(Debug, Default)]
pub(crate) struct EventFanout {
    senders: Vec<mpsc::UnboundedSender<PoolEvent>>,
}

impl EventFanout {
    pub(crate) fn subscribe(&mut self) -> PoolEventStream {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.senders.push(sender);
        PoolEventStream { receiver }
    }

    pub(crate) fn broadcast(&mut self, events: &[PoolEvent]) {
        if events.is_empty() {
            return;
        }
        self.senders
            .retain(|sender| events.iter().all(|event| sender.send(event.clone()).is_ok()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentable::Machine;

    #[test]
    fn broadcast_reaches_every_subscriber() {
        let mut fanout = EventFanout::default();
        let mut first = fanout.subscribe();
        let mut second = fanout.subscribe();

        fanout.broadcast(&[PoolEvent::Added(Presentable::Machine(Machine::new()))]);

        assert_eq!(first.drain().len(), 1);
        assert_eq!(second.drain().len(), 1);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut fanout = EventFanout::default();
        let stream = fanout.subscribe();
        drop(stream);

        fanout.broadcast(&[PoolEvent::Removed("drive:/devices/sda".to_string())]);
        assert!(fanout.senders.is_empty());
    }

    #[test]
    fn events_arrive_in_broadcast_order() {
        let mut fanout = EventFanout::default();
        let mut stream = fanout.subscribe();

        fanout.broadcast(&[
            PoolEvent::Added(Presentable::Machine(Machine::new())),
            PoolEvent::Removed("volume:/devices/sda1".to_string()),
        ]);

        let events = stream.drain();
        assert!(matches!(events[0], PoolEvent::Added(_)));
        assert!(matches!(events[1], PoolEvent::Removed(_)));
    }
}
