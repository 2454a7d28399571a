use chrono::NaiveDate;
use history_model::{DailyBar, Session};
use log::{debug, warn};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::str::FromStr;

pub const ALPHAVANTAGE_BASE_API_URL: &str = "https://www.alphavantage.co";
const DAILY_FUNCTION: &str = "TIME_SERIES_DAILY";

#[derive(Debug, Deserialize)]
struct DailySeriesJSON {
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<HashMap<String, DailyEntryJSON>>,
}

#[derive(Debug, Deserialize)]
struct DailyEntryJSON {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

impl DailyEntryJSON {
    fn to_bar(&self, date: &str) -> Result<DailyBar, Box<dyn Error>> {
        Ok(DailyBar {
            trade_date: NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")?,
            open: parse_price(&self.open)?,
            high: parse_price(&self.high)?,
            low: parse_price(&self.low)?,
            close: parse_price(&self.close)?,
            volume: self.volume.trim().parse()?,
        })
    }
}

fn parse_price(raw: &str) -> Result<f64, Box<dyn Error>> {
    let price: f64 = raw.trim().parse()?;
    if !price.is_finite() {
        return Err(format!("non-finite price {}", raw).into());
    }
    Ok(price)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputSize {
    /// Latest 100 bars.
    Compact,
    #[default]
    Full,
}

impl OutputSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

impl FromStr for OutputSize {
    type Err = InvalidOutputSize;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compact" => Ok(OutputSize::Compact),
            "full" => Ok(OutputSize::Full),
            _ => Err(InvalidOutputSize(s.to_string())),
        }
    }
}

#[derive(Debug)]
pub struct InvalidOutputSize(pub String);

impl fmt::Display for InvalidOutputSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Invalid output size '{}', expected compact or full", self.0)
    }
}

impl Error for InvalidOutputSize {}

pub struct AlphaVantageAPI {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl AlphaVantageAPI {
    pub fn new(api_key: &str) -> Self {
        return AlphaVantageAPI::with_base_url(api_key, ALPHAVANTAGE_BASE_API_URL);
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        return AlphaVantageAPI::with_client(api_key, base_url, reqwest::blocking::Client::new());
    }

    pub fn with_client(api_key: &str, base_url: &str, client: reqwest::blocking::Client) -> Self {
        return AlphaVantageAPI {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        };
    }

    /// Request url as it may appear in logs, with the api key hidden.
    fn masked_url(&self, ticker: &str, output_size: OutputSize) -> String {
        format!(
            "{}/query?function={}&symbol={}&outputsize={}&apikey=***",
            self.base_url,
            DAILY_FUNCTION,
            ticker,
            output_size.as_str()
        )
    }

    /// Fetches the daily series for `ticker` with a single blocking request.
    pub fn get_ticker(
        &self,
        ticker: &str,
        output_size: OutputSize,
    ) -> Result<Session, CustomError> {
        let url = format!("{}/query", self.base_url);

        debug!("get_ticker | url: {}", self.masked_url(ticker, output_size));

        let response = self
            .client
            .get(&url)
            .query(&[
                ("function", DAILY_FUNCTION),
                ("symbol", ticker),
                ("outputsize", output_size.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()?;

        let status = response.status();
        let body = response.text()?;

        debug!("get_ticker | status: {} | body bytes: {}", status, body.len());

        parse_daily_response(status, &body)
    }
}

/// Decodes a `TIME_SERIES_DAILY` response into a date-ordered session.
///
/// Rows with an unparseable date or number are skipped. Any other problem,
/// including an empty result, is reported as [`CustomError::DataUnavailable`].
pub fn parse_daily_response(status: StatusCode, body: &str) -> Result<Session, CustomError> {
    if status != StatusCode::OK {
        return Err(CustomError::DataUnavailable(format!("unexpected status {}", status)));
    }

    let json: DailySeriesJSON = serde_json::from_str(body)?;

    if let Some(message) = json.error_message {
        return Err(CustomError::DataUnavailable(format!("api error: {}", message)));
    }

    let notice = json.note.or(json.information);

    let time_series = match json.time_series {
        Some(time_series) => time_series,
        None => {
            let reason = match notice {
                Some(notice) => format!("api notice: {}", notice),
                None => "missing 'Time Series (Daily)' in response".to_string(),
            };
            return Err(CustomError::DataUnavailable(reason));
        }
    };

    if let Some(notice) = notice {
        warn!("parse_daily_response | api notice: {}", notice);
    }

    let mut bars = Vec::with_capacity(time_series.len());
    for (date, entry) in &time_series {
        match entry.to_bar(date) {
            Ok(bar) => bars.push(bar),
            Err(e) => debug!("parse_daily_response | dropping row {}: {}", date, e),
        }
    }

    if bars.is_empty() {
        return Err(CustomError::DataUnavailable("no usable rows in response".to_string()));
    }

    Ok(Session::from_unordered(bars))
}

#[derive(Debug)]
pub enum CustomError {
    DataUnavailable(String),
}

impl fmt::Display for CustomError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CustomError::DataUnavailable(reason) => write!(f, "Data unavailable: {}", reason),
        }
    }
}

impl Error for CustomError {}

impl From<reqwest::Error> for CustomError {
    fn from(err: reqwest::Error) -> CustomError {
        // the request url carries the api key
        CustomError::DataUnavailable(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for CustomError {
    fn from(err: serde_json::Error) -> CustomError {
        CustomError::DataUnavailable(format!("malformed payload: {}", err))
    }
}
