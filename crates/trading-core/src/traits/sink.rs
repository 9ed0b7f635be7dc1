//! Producer-side hooks: publishing events and receiving ticks.

use async_trait::async_trait;

use crate::error::BusError;
use crate::types::{Event, Tick};

/// Destination for events produced outside the director.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Enqueue `event`, waiting while the queue is full.
    async fn publish(&self, event: Event) -> Result<(), BusError>;
}

/// Receives every tick a feed produces.
pub trait TickListener: Send + Sync {
    fn on_tick(&self, tick: &Tick);
}
