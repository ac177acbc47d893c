use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analytics::Analytics;
use crate::errors::MarketDataError;

/// One daily close in a price series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub close_price: f64,
}

impl HistoryPoint {
    pub fn new(date: NaiveDate, close_price: f64) -> Self {
        Self { date, close_price }
    }
}

/// Requested history window for stocks.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum HistoryRange {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "7d")]
    SevenDays,
    #[default]
    #[serde(rename = "30d")]
    ThirtyDays,
    #[serde(rename = "365d")]
    OneYear,
}

impl HistoryRange {
    pub const ALL: [HistoryRange; 4] = [
        HistoryRange::OneDay,
        HistoryRange::SevenDays,
        HistoryRange::ThirtyDays,
        HistoryRange::OneYear,
    ];

    /// Parse an optional query parameter; a missing value means `30d`.
    pub fn parse_opt(raw: Option<&str>) -> Result<Self, MarketDataError> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(token) => token.parse(),
            None => Ok(Self::default()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::SevenDays => "7d",
            Self::ThirtyDays => "30d",
            Self::OneYear => "365d",
        }
    }

    /// Number of points kept after slicing.
    ///
    /// `1d` keeps two closes so a one-day move can be shown.
    pub fn points(&self) -> usize {
        match self {
            Self::OneDay => 2,
            Self::SevenDays => 7,
            Self::ThirtyDays => 30,
            Self::OneYear => 365,
        }
    }

    /// Calendar days to request upstream so that `points()` trading days fit.
    pub fn lookback_days(&self) -> i64 {
        match self {
            Self::OneDay => 5,
            Self::SevenDays => 12,
            Self::ThirtyDays => 45,
            Self::OneYear => 370,
        }
    }

    /// Keep the earliest `points()` entries of an ascending series.
    ///
    /// A shorter series is returned whole.
    pub fn slice<'a>(&self, series: &'a [HistoryPoint]) -> &'a [HistoryPoint] {
        &series[..series.len().min(self.points())]
    }
}

impl fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryRange {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                MarketDataError::InvalidInput(format!(
                    "Invalid range '{}', expected one of 1d, 7d, 30d, 365d",
                    s
                ))
            })
    }
}

/// Sliced series plus the analytics computed over it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryReport {
    pub history: Vec<HistoryPoint>,
    pub analytics: Analytics,
}

impl HistoryReport {
    pub fn from_series(history: Vec<HistoryPoint>) -> Self {
        let closes: Vec<f64> = history.iter().map(|p| p.close_price).collect();
        Self {
            analytics: Analytics::from_series(&closes),
            history,
        }
    }
}
