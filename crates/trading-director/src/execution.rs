//! Bounded, retried calls into the order executor.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use trading_core::error::ExecutionError;
use trading_core::traits::MarketDataProvider;
use trading_core::TradingError;

use crate::panic_message;

/// Timeout and retry settings for executor calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionPolicy {
    /// Upper bound on a single executor call
    pub timeout_ms: u64,
    /// Retries after the first attempt, transient failures only
    pub max_retries: u32,
    /// Base delay, doubled on every retry
    pub backoff_ms: u64,
    /// Give up retrying once the mid price has moved this many points
    pub max_deviation_points: u32,
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            max_retries: 2,
            backoff_ms: 250,
            max_deviation_points: 20,
        }
    }
}

impl ExecutionPolicy {
    pub fn validate(&self) -> Result<(), TradingError> {
        if self.timeout_ms == 0 {
            return Err(TradingError::InvalidConfiguration(
                "execution timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay before retry number `attempt` (zero-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt.min(16)).unwrap_or(u64::MAX);
        Duration::from_millis(self.backoff_ms.saturating_mul(factor))
    }

    /// Run `call` under the timeout, retrying transient failures.
    ///
    /// Before each retry the quote for `symbol` is compared with the one seen
    /// before the first attempt; when it has moved more than
    /// `max_deviation_points` the call is abandoned with
    /// [`ExecutionError::PriceContextChanged`]. Without a quote the check is
    /// skipped.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &str,
        symbol: &str,
        market_data: &dyn MarketDataProvider,
        mut call: F,
    ) -> Result<T, ExecutionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ExecutionError>>,
    {
        let reference = market_data.get_latest_tick(symbol).ok().map(|t| t.mid());
        let point = market_data.symbol_info(symbol).ok().map(|i| i.point);
        let mut attempt = 0;

        loop {
            let guarded = AssertUnwindSafe(call()).catch_unwind();
            let outcome = tokio::time::timeout(self.timeout(), guarded).await;
            let result = match outcome {
                Ok(Ok(result)) => result,
                Ok(Err(payload)) => Err(ExecutionError::Connection(format!(
                    "executor panicked: {}",
                    panic_message(payload.as_ref())
                ))),
                Err(_) => Err(ExecutionError::Timeout(self.timeout())),
            };

            let err = match result {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.max_retries => err,
                Err(err) => return Err(err),
            };

            if let (Some(reference), Some(point)) = (reference, point) {
                let moved = self.deviation(market_data, symbol, reference, point);
                if moved > Decimal::from(self.max_deviation_points) {
                    warn!(operation, symbol, %moved, "price moved during retries, giving up");
                    return Err(ExecutionError::PriceContextChanged { moved });
                }
            }

            let delay = match err {
                ExecutionError::RateLimited { retry_after_ms } => {
                    self.backoff(attempt).max(Duration::from_millis(retry_after_ms))
                }
                _ => self.backoff(attempt),
            };
            attempt += 1;
            warn!(
                operation,
                symbol,
                attempt,
                error = %err,
                delay_ms = delay.as_millis() as u64,
                "executor call failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn deviation(
        &self,
        market_data: &dyn MarketDataProvider,
        symbol: &str,
        reference: Decimal,
        point: Decimal,
    ) -> Decimal {
        if point <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        match market_data.get_latest_tick(symbol) {
            Ok(tick) => ((tick.mid() - reference) / point).abs(),
            Err(e) => {
                debug!(symbol, error = %e, "no quote for deviation check");
                Decimal::ZERO
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeMarket;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> ExecutionPolicy {
        ExecutionPolicy {
            timeout_ms: 50,
            max_retries: 3,
            backoff_ms: 1,
            max_deviation_points: 20,
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = ExecutionPolicy {
            backoff_ms: 100,
            ..ExecutionPolicy::default()
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(800));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let policy = ExecutionPolicy {
            timeout_ms: 0,
            ..ExecutionPolicy::default()
        };
        assert!(policy.validate().is_err());
        assert!(ExecutionPolicy::default().validate().is_ok());
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let market = FakeMarket::eurusd();
        let counter = AtomicU32::new(0);
        let attempts = &counter;

        let result = fast_policy()
            .run("submit", "EURUSD", &market, move || async move {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ExecutionError::Connection("reset".into()))
                } else {
                    Ok(7u64)
                }
            })
            .await;

        assert_eq!(result, Ok(7));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rejections_are_not_retried() {
        let market = FakeMarket::eurusd();
        let counter = AtomicU32::new(0);
        let attempts = &counter;

        let result: Result<u64, _> = fast_policy()
            .run("submit", "EURUSD", &market, move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(ExecutionError::Rejected("no money".into()))
            })
            .await;

        assert_eq!(result, Err(ExecutionError::Rejected("no money".into())));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_run_out() {
        let market = FakeMarket::eurusd();
        let counter = AtomicU32::new(0);
        let attempts = &counter;
        let policy = ExecutionPolicy {
            max_retries: 1,
            ..fast_policy()
        };

        let result: Result<u64, _> = policy
            .run("submit", "EURUSD", &market, move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(ExecutionError::Connection("down".into()))
            })
            .await;

        assert!(matches!(result, Err(ExecutionError::Connection(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_slow_call_times_out() {
        let market = FakeMarket::eurusd();
        let policy = ExecutionPolicy {
            max_retries: 0,
            ..fast_policy()
        };

        let result: Result<u64, _> = policy
            .run("submit", "EURUSD", &market, || async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok(1)
            })
            .await;

        assert!(matches!(result, Err(ExecutionError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_price_move_abandons_retry() {
        let market = FakeMarket::eurusd();

        let result: Result<u64, _> = fast_policy()
            .run("submit", "EURUSD", &market, || {
                // mid moves from 1.1001 to 1.1051
                market.set_quote(dec!(1.1050), dec!(1.1052));
                async { Err(ExecutionError::Connection("reset".into())) }
            })
            .await;

        assert!(matches!(
            result,
            Err(ExecutionError::PriceContextChanged { moved }) if moved == dec!(50)
        ));
    }

    #[tokio::test]
    async fn test_panicking_call_is_contained() {
        let market = FakeMarket::eurusd();
        let policy = ExecutionPolicy {
            max_retries: 0,
            ..fast_policy()
        };

        let result: Result<u64, _> = policy
            .run("submit", "EURUSD", &market, || async {
                let filled: Option<u64> = None;
                Ok(filled.expect("executor bug"))
            })
            .await;

        assert!(matches!(result, Err(ExecutionError::Connection(msg)) if msg.contains("executor bug")));
    }
}
