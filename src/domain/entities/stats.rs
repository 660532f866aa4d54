use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Selectable window for the call trend chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeRange {
    OneHour,
    EightHours,
    #[default]
    TwentyFourHours,
}

impl TimeRange {
    pub const ALL: [TimeRange; 3] = [
        TimeRange::OneHour,
        TimeRange::EightHours,
        TimeRange::TwentyFourHours,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::OneHour => "1h",
            TimeRange::EightHours => "8h",
            TimeRange::TwentyFourHours => "24h",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1h" => Ok(TimeRange::OneHour),
            "8h" => Ok(TimeRange::EightHours),
            "24h" => Ok(TimeRange::TwentyFourHours),
            other => Err(format!("unknown time range: {}", other)),
        }
    }
}

/// `period` query parameter of `/api/stats/details`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsPeriod {
    All,
    Range(TimeRange),
}

impl StatsPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatsPeriod::All => "all",
            StatsPeriod::Range(range) => range.as_str(),
        }
    }
}

/// Call count for one window. The breakdown is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallCounter {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub success: Option<u64>,
    #[serde(default)]
    pub failure: Option<u64>,
}

/// Aggregate counters, replaced wholesale on each fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    #[serde(default)]
    pub calls_1m: CallCounter,
    #[serde(default)]
    pub calls_1h: CallCounter,
    #[serde(default)]
    pub calls_24h: CallCounter,
    #[serde(default)]
    pub calls_month: CallCounter,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub time: String,
    #[serde(default)]
    pub success: u64,
    #[serde(default)]
    pub failure: u64,
}

/// Body of `/api/stats/details`: the shared payload of both stats read paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsDetails {
    #[serde(flatten)]
    pub snapshot: StatsSnapshot,
    #[serde(default)]
    pub timeline: Vec<TrendPoint>,
}

/// Trend buckets for one range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendSeries {
    pub range: TimeRange,
    pub points: Vec<TrendPoint>,
}
