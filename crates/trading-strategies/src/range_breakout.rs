//! Range breakout generator with trailing-stop management.
//!
//! Builds a reference range from the bars of a fixed daily window, then
//! fades breakouts of that range during the operational window: a close
//! above the range sells back toward its low, a close below buys back
//! toward its high. Open positions are trailed with [`trailing_stop`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use trading_core::{
    error::{DataError, StrategyError},
    traits::{GeneratorConfig, SignalContext, SignalGenerator},
    types::{
        EntrySignal, Event, MarketUpdate, OrderKind, PortfolioSnapshot, PositionUpdate, Side,
        Tick, Timeframe,
    },
};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::gate::DailyEntryGate;
use crate::trailing_stop::trailing_stop;
use crate::window::TimeWindow;

/// Configuration for the range breakout generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeBreakoutConfig {
    /// Symbols to trade
    pub symbols: Vec<String>,
    /// Bar timeframe
    pub timeframe: Timeframe,
    /// Window whose bars define the range
    pub reference: TimeWindow,
    /// Window in which entries are allowed
    pub operational: TimeWindow,
    /// Stop-loss distance in points from the entry price, 0 for none
    pub sl_pips: u32,
}

impl Default for RangeBreakoutConfig {
    fn default() -> Self {
        let window = |start, end| {
            TimeWindow::from_hm(start, end)
                .unwrap_or(TimeWindow::new(NaiveTime::MIN, NaiveTime::MIN))
        };
        Self {
            symbols: vec![],
            timeframe: Timeframe::default(),
            reference: window((0, 0), (8, 0)),
            operational: window((8, 0), (20, 0)),
            sl_pips: 0,
        }
    }
}

impl GeneratorConfig for RangeBreakoutConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if self.symbols.is_empty() {
            return Err(StrategyError::InvalidConfig(
                "At least one symbol required".into(),
            ));
        }
        if self.reference.start == self.reference.end {
            return Err(StrategyError::InvalidConfig(
                "Reference window must not be empty".into(),
            ));
        }
        if self.operational.start == self.operational.end {
            return Err(StrategyError::InvalidConfig(
                "Operational window must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Range breakout generator.
pub struct RangeBreakoutStrategy {
    config: RangeBreakoutConfig,
    gate: DailyEntryGate,
}

impl RangeBreakoutStrategy {
    /// Create a new range breakout generator.
    pub fn new(config: RangeBreakoutConfig) -> Result<Self, StrategyError> {
        config.validate()?;
        Ok(Self {
            config,
            gate: DailyEntryGate::new(),
        })
    }

    /// Lowest low and highest high of the reference window ending on `date`.
    fn reference_range(
        &self,
        symbol: &str,
        date: NaiveDate,
        ctx: &SignalContext<'_>,
    ) -> Result<(Decimal, Decimal), DataError> {
        let (start, end) = self.config.reference.span_ending_on(date);
        let end_ms = end.timestamp_millis();
        let bars: Vec<_> = ctx
            .market_data
            .get_bars_from_range(symbol, self.config.timeframe, start, end)?
            .into_iter()
            .filter(|b| b.timestamp < end_ms)
            .collect();

        if bars.is_empty() {
            return Err(DataError::NoBars {
                symbol: symbol.to_string(),
                timeframe: self.config.timeframe,
            });
        }

        let low = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let high = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        Ok((to_decimal(low)?, to_decimal(high)?))
    }

    /// First stop move owed to one of this instance's positions on `symbol`.
    fn trail_positions(
        &self,
        symbol: &str,
        tick: &Tick,
        portfolio: &PortfolioSnapshot,
    ) -> Option<PositionUpdate> {
        portfolio
            .strategy_positions_for(symbol)
            .find_map(|position| {
                let target = position.take_profit?;
                let price = tick.exit_price(position.side);
                let new_stop = trailing_stop(
                    position.side,
                    position.entry_price,
                    target,
                    price,
                    position.stop_loss,
                )?;
                debug!(
                    symbol,
                    ticket = position.ticket,
                    %price,
                    old_stop = ?position.stop_loss,
                    %new_stop,
                    "trailing stop moved"
                );
                Some(PositionUpdate {
                    symbol: symbol.to_string(),
                    ticket: position.ticket,
                    magic_number: portfolio.magic_number,
                    new_stop_loss: new_stop,
                    take_profit: Some(target),
                })
            })
    }

    fn evaluate_entry(
        &mut self,
        symbol: &str,
        now: DateTime<Utc>,
        tick: &Tick,
        ctx: &SignalContext<'_>,
    ) -> Result<Option<EntrySignal>, DataError> {
        let today = now.date_naive();
        if !self.gate.is_open(symbol, today)
            || !self.config.operational.contains(now.time())
            || ctx.portfolio.get_number_of_open_positions_by_symbol(symbol) > 0
        {
            return Ok(None);
        }

        let (range_low, range_high) = self.reference_range(symbol, today, ctx)?;
        let last = ctx
            .market_data
            .get_latest_closed_bar(symbol, self.config.timeframe)?;
        let close = to_decimal(last.close)?;

        let (side, take_profit) = if close > range_high {
            (Side::Sell, range_low)
        } else if close < range_low {
            (Side::Buy, range_high)
        } else {
            return Ok(None);
        };

        let entry = tick.entry_price(side);
        let stop_loss = if self.config.sl_pips > 0 {
            let info = ctx.market_data.symbol_info(symbol)?;
            Some(entry - Decimal::from(self.config.sl_pips) * info.point * side.sign())
        } else {
            None
        };

        info!(
            symbol,
            %side,
            %close,
            %range_low,
            %range_high,
            "range breakout entry"
        );

        Ok(Some(EntrySignal {
            symbol: symbol.to_string(),
            side,
            order_kind: OrderKind::Market,
            target_price: None,
            magic_number: ctx.portfolio.magic_number,
            stop_loss,
            take_profit: Some(take_profit),
            close_opposite: false,
            generator: self.name().to_string(),
        }))
    }
}

/// Decimal places kept when converting bar prices.
const PRICE_DP: u32 = 10;

fn to_decimal(value: f64) -> Result<Decimal, DataError> {
    Decimal::try_from(value)
        .map(|d| d.round_dp(PRICE_DP))
        .map_err(|e| DataError::ParseError(format!("price {value}: {e}")))
}

impl SignalGenerator for RangeBreakoutStrategy {
    fn name(&self) -> &str {
        "range_breakout"
    }

    fn description(&self) -> &str {
        "Fades breakouts of a daily reference range and trails the stop toward the target"
    }

    fn on_market_update(
        &mut self,
        update: &MarketUpdate,
        ctx: &SignalContext<'_>,
    ) -> Result<Option<Event>, StrategyError> {
        let symbol = update.symbol.as_str();
        let tick = ctx.market_data.get_latest_tick(symbol)?;

        if let Some(position_update) = self.trail_positions(symbol, &tick, ctx.portfolio) {
            return Ok(Some(position_update.into()));
        }

        let Some(signal) = self.evaluate_entry(symbol, update.timestamp, &tick, ctx)? else {
            return Ok(None);
        };
        self.gate.record(symbol, update.timestamp.date_naive());
        Ok(Some(signal.into()))
    }

    fn symbols(&self) -> &[String] {
        &self.config.symbols
    }

    fn timeframe(&self) -> Timeframe {
        self.config.timeframe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, empty_portfolio, position, update, FakeMarket, MAGIC};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use trading_core::types::Bar;

    fn config() -> RangeBreakoutConfig {
        RangeBreakoutConfig {
            symbols: vec!["EURUSD".to_string()],
            timeframe: Timeframe::Hour1,
            reference: TimeWindow::from_hm((0, 0), (8, 0)).unwrap(),
            operational: TimeWindow::from_hm((8, 0), (20, 0)).unwrap(),
            sl_pips: 20,
        }
    }

    /// Reference bars between 1.1000 and 1.1050, then `last_close` at 09:00.
    fn market(last_close: f64) -> FakeMarket {
        let mut market = FakeMarket::new().with_tick(dec!(1.1060), dec!(1.1062));
        for hour in 0..8 {
            let ts = at(2024, 3, 4, hour, 0).timestamp_millis();
            market.bars.push(Bar::new(ts, 1.102, 1.105, 1.1, 1.103, 10.0));
        }
        // bar opening at the window's end belongs to the operational session
        let ts = at(2024, 3, 4, 8, 0).timestamp_millis();
        market.bars.push(Bar::new(ts, 1.103, 1.2, 1.0, last_close, 10.0));
        market
    }

    fn evaluate(
        strategy: &mut RangeBreakoutStrategy,
        market: &FakeMarket,
        portfolio: &PortfolioSnapshot,
        hour: u32,
        minute: u32,
    ) -> Result<Option<Event>, StrategyError> {
        let ctx = SignalContext {
            market_data: market,
            portfolio,
        };
        strategy.on_market_update(
            &update(at(2024, 3, 4, hour, minute), Timeframe::Hour1),
            &ctx,
        )
    }

    #[test]
    fn test_config_validation() {
        assert!(config().validate().is_ok());
        let mut bad = config();
        bad.operational = TimeWindow::from_hm((9, 0), (9, 0)).unwrap();
        assert!(RangeBreakoutStrategy::new(bad).is_err());
    }

    #[test]
    fn test_close_above_range_sells_to_range_low() {
        let mut strategy = RangeBreakoutStrategy::new(config()).unwrap();
        let event = evaluate(&mut strategy, &market(1.1080), &empty_portfolio(), 9, 0)
            .unwrap()
            .unwrap();

        let Event::EntrySignal(signal) = event else {
            panic!("expected entry signal");
        };
        assert_eq!(signal.side, Side::Sell);
        assert_eq!(signal.take_profit, Some(dec!(1.1)));
        // bid + 20 points
        assert_eq!(signal.stop_loss, Some(dec!(1.1080)));
        assert_eq!(signal.magic_number, MAGIC);
        assert!(!signal.close_opposite);
    }

    #[test]
    fn test_close_below_range_buys_to_range_high() {
        let mut strategy = RangeBreakoutStrategy::new(config()).unwrap();
        let market = market(1.0990).with_tick(dec!(1.0990), dec!(1.0992));
        let Some(Event::EntrySignal(signal)) =
            evaluate(&mut strategy, &market, &empty_portfolio(), 9, 0).unwrap()
        else {
            panic!("expected entry signal");
        };
        assert_eq!(signal.side, Side::Buy);
        assert_eq!(signal.take_profit, Some(dec!(1.105)));
        assert_eq!(signal.stop_loss, Some(dec!(1.0972)));
    }

    #[test]
    fn test_inside_range_or_outside_window_is_quiet() {
        let mut strategy = RangeBreakoutStrategy::new(config()).unwrap();
        assert!(evaluate(&mut strategy, &market(1.1020), &empty_portfolio(), 9, 0)
            .unwrap()
            .is_none());
        assert!(evaluate(&mut strategy, &market(1.1080), &empty_portfolio(), 20, 1)
            .unwrap()
            .is_none());
        // window bounds are inclusive
        assert!(evaluate(&mut strategy, &market(1.1080), &empty_portfolio(), 20, 0)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_one_entry_per_day() {
        let mut strategy = RangeBreakoutStrategy::new(config()).unwrap();
        let market = market(1.1080);
        assert!(evaluate(&mut strategy, &market, &empty_portfolio(), 9, 0)
            .unwrap()
            .is_some());
        assert!(evaluate(&mut strategy, &market, &empty_portfolio(), 10, 0)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_trailing_runs_after_daily_entry() {
        let mut strategy = RangeBreakoutStrategy::new(config()).unwrap();
        assert!(evaluate(&mut strategy, &market(1.1080), &empty_portfolio(), 9, 0)
            .unwrap()
            .is_some());

        // short from 1.2000 targeting 1.1000; ask 1.1400 is 0.6 of the way
        let mut portfolio = empty_portfolio();
        portfolio.positions.push(position(
            7,
            Side::Sell,
            dec!(1.2000),
            Some(dec!(1.2100)),
            Some(dec!(1.1000)),
        ));
        let market = market(1.1080).with_tick(dec!(1.1398), dec!(1.1400));

        let Some(Event::PositionUpdate(update)) =
            evaluate(&mut strategy, &market, &portfolio, 11, 0).unwrap()
        else {
            panic!("expected position update");
        };
        assert_eq!(update.ticket, 7);
        assert_eq!(update.magic_number, MAGIC);
        assert_eq!(update.new_stop_loss, dec!(1.1950));
        assert_eq!(update.take_profit, Some(dec!(1.1000)));
    }

    #[test]
    fn test_update_takes_priority_and_entry_is_not_recorded() {
        let mut strategy = RangeBreakoutStrategy::new(config()).unwrap();
        let mut portfolio = empty_portfolio();
        portfolio.positions.push(position(
            3,
            Side::Buy,
            dec!(1.0000),
            None,
            Some(dec!(1.2000)),
        ));
        let market = market(1.1080);

        let event = evaluate(&mut strategy, &market, &portfolio, 9, 0).unwrap();
        assert!(matches!(event, Some(Event::PositionUpdate(_))));
        assert!(strategy.gate.is_open("EURUSD", at(2024, 3, 4, 9, 0).date_naive()));
    }

    #[test]
    fn test_foreign_positions_are_not_trailed() {
        let mut strategy = RangeBreakoutStrategy::new(config()).unwrap();
        let mut portfolio = empty_portfolio();
        let mut foreign = position(9, Side::Buy, dec!(1.0000), None, Some(dec!(1.2000)));
        foreign.magic_number = MAGIC + 1;
        portfolio.positions.push(foreign);

        // outside the operational window, so only trailing could fire
        assert!(evaluate(&mut strategy, &market(1.1080), &portfolio, 21, 0)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_missing_reference_bars_is_data_error() {
        let mut strategy = RangeBreakoutStrategy::new(config()).unwrap();
        let market = FakeMarket::new().with_tick(dec!(1.1), dec!(1.1002));
        let err = evaluate(&mut strategy, &market, &empty_portfolio(), 9, 0).unwrap_err();
        assert!(matches!(err, StrategyError::Data(DataError::NoBars { .. })));
    }

    #[test]
    fn test_wrapping_reference_window() {
        let mut cfg = config();
        cfg.reference = TimeWindow::from_hm((22, 0), (2, 0)).unwrap();
        cfg.operational = TimeWindow::from_hm((2, 0), (6, 0)).unwrap();
        let mut strategy = RangeBreakoutStrategy::new(cfg).unwrap();

        let mut market = FakeMarket::new().with_tick(dec!(1.2990), dec!(1.2992));
        for (day, hour) in [(3, 22), (3, 23), (4, 0), (4, 1)] {
            let ts = at(2024, 3, day, hour, 0).timestamp_millis();
            market.bars.push(Bar::new(ts, 1.3, 1.31, 1.3, 1.305, 1.0));
        }
        let ts = at(2024, 3, 4, 2, 0).timestamp_millis();
        market.bars.push(Bar::new(ts, 1.3, 1.3, 1.29, 1.295, 1.0));

        let Some(Event::EntrySignal(signal)) =
            evaluate(&mut strategy, &market, &empty_portfolio(), 3, 0).unwrap()
        else {
            panic!("expected entry signal");
        };
        assert_eq!(signal.side, Side::Buy);
        assert_eq!(signal.take_profit, Some(dec!(1.31)));
    }

    proptest! {
        #[test]
        fn at_most_one_entry_across_a_day(
            steps in prop::collection::vec((0u32..=720, any::<bool>(), any::<bool>()), 1..80),
        ) {
            let mut strategy = RangeBreakoutStrategy::new(config()).unwrap();
            let (above, below) = (market(1.1080), market(1.0990));

            // long from 1.0000 toward 1.2000 is past break-even at bid 1.1060
            let mut trailing = empty_portfolio();
            trailing.positions.push(position(
                3,
                Side::Buy,
                dec!(1.0000),
                None,
                Some(dec!(1.2000)),
            ));
            let flat = empty_portfolio();

            let mut entries = 0;
            for &(offset, breaks_up, with_position) in &steps {
                let market = if breaks_up { &above } else { &below };
                let portfolio = if with_position { &trailing } else { &flat };
                let event = evaluate(
                    &mut strategy,
                    market,
                    portfolio,
                    8 + offset / 60,
                    offset % 60,
                )
                .unwrap();
                match event {
                    Some(Event::EntrySignal(_)) => entries += 1,
                    Some(Event::PositionUpdate(_)) => prop_assert!(with_position),
                    _ => prop_assert!(with_position || entries > 0),
                }
            }

            let any_flat_cycle = steps.iter().any(|&(_, _, with_position)| !with_position);
            prop_assert_eq!(entries, usize::from(any_flat_cycle));
        }
    }
}
