use crate::sma::simple_moving_average;
use history_model::{DailyBar, Session};
use log::debug;
use std::error::Error;
use std::fmt;

pub const DEFAULT_SMA_PERIOD: usize = 20;
pub const DEFAULT_DISPLAY_WINDOW: usize = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisParams {
    pub sma_period: usize,
    /// Number of most recent rows kept for display.
    pub display_window: usize,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        AnalysisParams {
            sma_period: DEFAULT_SMA_PERIOD,
            display_window: DEFAULT_DISPLAY_WINDOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedBar {
    pub bar: DailyBar,
    pub sma: Option<f64>,
}

/// The display slice of a session together with its moving average.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    sma_period: usize,
    rows: Vec<AnalyzedBar>,
}

impl Analysis {
    pub fn rows(&self) -> &[AnalyzedBar] {
        &self.rows
    }

    pub fn sma_period(&self) -> usize {
        self.sma_period
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// False when the session was shorter than the SMA period.
    pub fn has_sma(&self) -> bool {
        self.rows.iter().any(|row| row.sma.is_some())
    }

    pub fn latest(&self) -> Option<&AnalyzedBar> {
        self.rows.last()
    }

    pub fn tail(&self, n: usize) -> &[AnalyzedBar] {
        &self.rows[self.rows.len().saturating_sub(n)..]
    }
}

/// Computes the moving average over the whole session, then keeps the last
/// `display_window` rows. The session itself is left untouched.
pub fn analyze(session: &Session, params: AnalysisParams) -> Result<Analysis, AnalysisError> {
    if params.sma_period == 0 {
        return Err(AnalysisError::InvalidWindow("sma_period"));
    }
    if params.display_window == 0 {
        return Err(AnalysisError::InvalidWindow("display_window"));
    }

    let sma = simple_moving_average(&session.closes(), params.sma_period);
    let skip = session.len().saturating_sub(params.display_window);

    let rows: Vec<AnalyzedBar> = session
        .bars()
        .iter()
        .zip(sma)
        .skip(skip)
        .map(|(bar, sma)| AnalyzedBar {
            bar: bar.clone(),
            sma,
        })
        .collect();

    debug!(
        "analyze | input: {} | output: {} | sma period: {}",
        session.len(),
        rows.len(),
        params.sma_period
    );

    Ok(Analysis {
        sma_period: params.sma_period,
        rows,
    })
}

#[derive(Debug, PartialEq, Eq)]
pub enum AnalysisError {
    InvalidWindow(&'static str),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AnalysisError::InvalidWindow(name) => write!(f, "{} must be at least 1", name),
        }
    }
}

impl Error for AnalysisError {}
