//! Broker-facing boundaries: order execution and portfolio state.

use async_trait::async_trait;

use crate::error::ExecutionError;
use crate::types::{OrderRequest, PortfolioSnapshot, Side, Ticket, UpdateRequest};

/// Gateway that turns approved requests into broker actions.
///
/// This is the only potentially slow, network-bound call in the pipeline;
/// callers bound it with a timeout.
#[async_trait]
pub trait OrderExecutor: Send + Sync {
    /// Submit a new market or pending order.
    ///
    /// Returns the ticket of the resulting position or pending order.
    async fn submit_order(&self, request: OrderRequest) -> Result<Ticket, ExecutionError>;

    /// Change the stop-loss/take-profit of an open position in place.
    async fn modify_order(&self, request: UpdateRequest) -> Result<(), ExecutionError>;

    /// Close every position on `symbol` and `side` tagged with `magic_number`.
    async fn close_positions(
        &self,
        symbol: &str,
        side: Side,
        magic_number: u64,
    ) -> Result<Vec<Ticket>, ExecutionError>;

    /// Get the executor name.
    fn name(&self) -> &str;
}

/// Source of portfolio snapshots.
///
/// Every call returns a fresh, internally consistent copy; nothing handed
/// out is shared with the writer.
pub trait PortfolioSource: Send + Sync {
    fn snapshot(&self) -> PortfolioSnapshot;

    /// Magic number tagging this instance's positions.
    fn magic_number(&self) -> u64 {
        self.snapshot().magic_number
    }
}
