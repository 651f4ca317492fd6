//! Bar interval.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Minute,
    #[default]
    Hour,
    Day,
    Week,
    Month,
}

impl Timeframe {
    /// Query-string value understood by the Alpaca market data API.
    pub fn as_alpaca(&self) -> &'static str {
        match self {
            Timeframe::Minute => "1Min",
            Timeframe::Hour => "1Hour",
            Timeframe::Day => "1Day",
            Timeframe::Week => "1Week",
            Timeframe::Month => "1Month",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Timeframe::Minute => "minute",
            Timeframe::Hour => "hour",
            Timeframe::Day => "day",
            Timeframe::Week => "week",
            Timeframe::Month => "month",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minute" | "min" | "1min" => Ok(Timeframe::Minute),
            "hour" | "1hour" => Ok(Timeframe::Hour),
            "day" | "1day" => Ok(Timeframe::Day),
            "week" | "1week" => Ok(Timeframe::Week),
            "month" | "1month" => Ok(Timeframe::Month),
            other => Err(format!(
                "unknown timeframe '{other}'. Valid: minute, hour, day, week, month"
            )),
        }
    }
}
