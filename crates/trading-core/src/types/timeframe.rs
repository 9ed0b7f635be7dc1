//! Bar timeframes.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timeframe for bars/candles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Timeframe {
    #[serde(rename = "1min", alias = "1m")]
    Minute1,
    #[default]
    #[serde(rename = "5min", alias = "5m")]
    Minute5,
    #[serde(rename = "15min", alias = "15m")]
    Minute15,
    #[serde(rename = "30min", alias = "30m")]
    Minute30,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1d")]
    Daily,
}

impl Timeframe {
    /// Length of one bar in seconds.
    pub fn as_secs(&self) -> i64 {
        match self {
            Timeframe::Minute1 => 60,
            Timeframe::Minute5 => 300,
            Timeframe::Minute15 => 900,
            Timeframe::Minute30 => 1800,
            Timeframe::Hour1 => 3600,
            Timeframe::Hour4 => 14400,
            Timeframe::Daily => 86400,
        }
    }

    /// Length of one bar.
    pub fn duration(&self) -> TimeDelta {
        TimeDelta::seconds(self.as_secs())
    }

    /// Open time of the bar containing `at`.
    pub fn bar_open(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        let secs = self.as_secs();
        let floored = at.timestamp().div_euclid(secs) * secs;
        DateTime::from_timestamp(floored, 0).unwrap_or(at)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::Minute1 => "1min",
            Timeframe::Minute5 => "5min",
            Timeframe::Minute15 => "15min",
            Timeframe::Minute30 => "30min",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Daily => "1d",
        };
        f.write_str(s)
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1m" | "1min" => Ok(Timeframe::Minute1),
            "5m" | "5min" => Ok(Timeframe::Minute5),
            "15m" | "15min" => Ok(Timeframe::Minute15),
            "30m" | "30min" => Ok(Timeframe::Minute30),
            "1h" | "60min" => Ok(Timeframe::Hour1),
            "4h" => Ok(Timeframe::Hour4),
            "1d" | "daily" => Ok(Timeframe::Daily),
            _ => Err(format!("Invalid timeframe: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timeframe_parse_and_display() {
        assert_eq!(Timeframe::from_str("5min").unwrap(), Timeframe::Minute5);
        assert_eq!(Timeframe::from_str("1H").unwrap(), Timeframe::Hour1);
        assert!(Timeframe::from_str("7min").is_err());
        assert_eq!(Timeframe::Minute15.to_string(), "15min");
    }

    #[test]
    fn test_bar_open_floors_to_boundary() {
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 8, 53, 17).unwrap();
        let open = Timeframe::Minute5.bar_open(at);
        assert_eq!(open, Utc.with_ymd_and_hms(2024, 3, 4, 8, 50, 0).unwrap());

        let open = Timeframe::Hour1.bar_open(at);
        assert_eq!(open, Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap());
    }
}
