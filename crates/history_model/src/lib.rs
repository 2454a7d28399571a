use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub trade_date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Daily bars in ascending `trade_date` order, one bar per date.
///
/// Dates do not have to be contiguous, exchanges skip weekends and holidays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    bars: Vec<DailyBar>,
}

impl Session {
    /// Sorts by date. For repeated dates the first occurrence is kept.
    pub fn from_unordered(mut bars: Vec<DailyBar>) -> Self {
        // stable sort keeps input order among equal dates
        bars.sort_by_key(|bar| bar.trade_date);
        bars.dedup_by_key(|bar| bar.trade_date);
        return Session { bars };
    }

    pub fn bars(&self) -> &[DailyBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&DailyBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&DailyBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }
}
