//! Break-even and trailing stop rule shared by the generators.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use trading_core::types::Side;

/// Fraction of the profit range the price must cover before the stop moves.
const BREAK_EVEN_TRIGGER: Decimal = dec!(0.5);
/// Share of the movement past the trigger that is locked in.
const TRAIL_RATIO: Decimal = dec!(0.5);
/// Cap on the locked-in profit, as a fraction of the profit range.
const MAX_LOCK: Decimal = dec!(0.3);

/// Stop a position should move to, if any.
///
/// With `entry` E, `target` T and range R = |T - E|, nothing happens until
/// the price has moved 0.5·R in the position's favour. From there the stop
/// sits at break-even plus half of the movement beyond 0.5·R, capped at
/// 0.3·R. A stop is only ever tightened: a candidate at or behind
/// `current_stop` yields `None`.
pub fn trailing_stop(
    side: Side,
    entry: Decimal,
    target: Decimal,
    price: Decimal,
    current_stop: Option<Decimal>,
) -> Option<Decimal> {
    let sign = side.sign();
    let profit_range = (target - entry) * sign;
    if profit_range <= Decimal::ZERO {
        return None;
    }

    let movement = (price - entry) * sign;
    let trigger = profit_range * BREAK_EVEN_TRIGGER;
    if movement < trigger {
        return None;
    }

    let locked = ((movement - trigger) * TRAIL_RATIO).min(profit_range * MAX_LOCK);
    let candidate = entry + locked * sign;

    match current_stop {
        Some(stop) if (candidate - stop) * sign <= Decimal::ZERO => None,
        _ => Some(candidate),
    }
}
