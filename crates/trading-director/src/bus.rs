//! Bounded FIFO event bus between producers and the director.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use trading_core::error::BusError;
use trading_core::traits::EventSink;
use trading_core::types::Event;

/// Default queue capacity.
pub const DEFAULT_CAPACITY: usize = 1_024;

/// Item carried by the queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Event(Event),
    /// Shutdown sentinel; everything queued behind it is discarded.
    Stop,
}

/// Create a bus holding at most `capacity` envelopes.
pub fn channel(capacity: usize) -> (EventPublisher, EventReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EventPublisher { tx }, EventReceiver { rx })
}

/// Cloneable producer handle.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    tx: mpsc::Sender<Envelope>,
}

impl EventPublisher {
    /// Enqueue `event`, waiting while the queue is full.
    pub async fn publish(&self, event: Event) -> Result<(), BusError> {
        self.tx
            .send(Envelope::Event(event))
            .await
            .map_err(|_| BusError::Closed)
    }

    /// Enqueue `event` without waiting.
    pub fn try_publish(&self, event: Event) -> Result<(), BusError> {
        self.tx
            .try_send(Envelope::Event(event))
            .map_err(|e| match e {
                TrySendError::Full(_) => BusError::Full,
                TrySendError::Closed(_) => BusError::Closed,
            })
    }

    /// Ask the director to stop after the event it is processing.
    pub async fn stop(&self) -> Result<(), BusError> {
        self.tx
            .send(Envelope::Stop)
            .await
            .map_err(|_| BusError::Closed)
    }
}

#[async_trait]
impl EventSink for EventPublisher {
    async fn publish(&self, event: Event) -> Result<(), BusError> {
        EventPublisher::publish(self, event).await
    }
}

/// Consumer end, owned by the director.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<Envelope>,
}

impl EventReceiver {
    /// Next envelope; `None` once every publisher is gone.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    /// Close the queue and drop whatever is still in it. Returns the number
    /// of events dropped.
    pub fn discard_pending(&mut self) -> usize {
        self.rx.close();
        let mut discarded = 0;
        while let Ok(envelope) = self.rx.try_recv() {
            if matches!(envelope, Envelope::Event(_)) {
                discarded += 1;
            }
        }
        discarded
    }
}
