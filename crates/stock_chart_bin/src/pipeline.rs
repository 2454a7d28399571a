use alphavantage_api::api::AlphaVantageAPI;
use chart_render::chart::render_chart;
use history_analysis::analysis::{Analysis, analyze};
use log::{info, warn};
use std::error::Error;

use crate::config::Config;

/// fetch → analyze → render. Any failure stops before a chart is written.
pub fn run(config: &Config, api: &AlphaVantageAPI) -> Result<Analysis, Box<dyn Error>> {
    info!("Fetching data for {}...", config.symbol);
    let session = api.get_ticker(&config.symbol, config.output_size)?;
    info!("Data fetched successfully | bars: {}", session.len());

    let analysis = analyze(&session, config.analysis)?;
    if !analysis.has_sma() {
        warn!(
            "{} has {} bars, fewer than the {}-day SMA period; charting price only",
            config.symbol,
            session.len(),
            config.analysis.sma_period
        );
    }
    info!("Data prepared | rows for display: {}", analysis.len());

    info!("Generating visualization...");
    render_chart(&analysis, &config.symbol, &config.output_path, &config.render)?;
    info!("Chart written to {}", config.output_path.display());

    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alphavantage_api::api::OutputSize;
    use chart_render::chart::RenderOptions;
    use chrono::{Days, NaiveDate};
    use history_analysis::analysis::AnalysisParams;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use tempfile::TempDir;

    fn serve_once(status_line: &'static str, body: String) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
        });
        (format!("http://{}", addr), handle)
    }

    fn daily_payload(closes: &[f64]) -> String {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut series = serde_json::Map::new();
        for (i, close) in closes.iter().enumerate() {
            let date = start + Days::new(i as u64);
            series.insert(
                date.format("%Y-%m-%d").to_string(),
                serde_json::json!({
                    "1. open": format!("{:.4}", close),
                    "2. high": format!("{:.4}", close + 1.0),
                    "3. low": format!("{:.4}", close - 1.0),
                    "4. close": format!("{:.4}", close),
                    "5. volume": (1000 + i).to_string(),
                }),
            );
        }
        serde_json::json!({ "Time Series (Daily)": series }).to_string()
    }

    // the returned dir must outlive the config that points into it
    fn test_config(base_url: &str) -> (TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("chart.svg");

        let config = Config {
            api_key: "demo-key".to_string(),
            symbol: "IBM".to_string(),
            output_size: OutputSize::Compact,
            analysis: AnalysisParams::default(),
            output_path,
            base_url: base_url.to_string(),
            render: RenderOptions::default(),
        };
        (dir, config)
    }

    fn local_api(config: &Config) -> AlphaVantageAPI {
        let client = reqwest::blocking::Client::builder().no_proxy().build().unwrap();
        AlphaVantageAPI::with_client(&config.api_key, &config.base_url, client)
    }

    #[test]
    fn run_pass_writes_chart() {
        let closes: Vec<f64> = (10..30).map(f64::from).collect();
        let (base_url, server) = serve_once("HTTP/1.1 200 OK", daily_payload(&closes));
        let (_dir, config) = test_config(&base_url);

        let analysis = run(&config, &local_api(&config)).unwrap();
        server.join().unwrap();

        assert_eq!(analysis.len(), 20);
        assert_eq!(analysis.latest().unwrap().sma, Some(19.5));
        assert!(config.output_path.exists());
    }

    #[test]
    fn run_pass_short_series_price_only() {
        let (base_url, server) = serve_once("HTTP/1.1 200 OK", daily_payload(&[5.0, 6.0, 7.0]));
        let (_dir, config) = test_config(&base_url);

        let analysis = run(&config, &local_api(&config)).unwrap();
        server.join().unwrap();

        assert!(!analysis.has_sma());
        assert!(config.output_path.exists());
    }

    #[test]
    fn run_fail_non_200_writes_nothing() {
        let (base_url, server) = serve_once("HTTP/1.1 500 Internal Server Error", "{}".to_string());
        let (_dir, config) = test_config(&base_url);

        let result = run(&config, &local_api(&config));
        server.join().unwrap();

        assert!(result.is_err());
        assert!(!config.output_path.exists());
    }

    #[test]
    fn run_fail_api_error_writes_nothing() {
        let body = r#"{"Error Message": "Invalid API call."}"#.to_string();
        let (base_url, server) = serve_once("HTTP/1.1 200 OK", body);
        let (_dir, config) = test_config(&base_url);

        let result = run(&config, &local_api(&config));
        server.join().unwrap();

        assert!(result.unwrap_err().to_string().contains("Data unavailable"));
        assert!(!config.output_path.exists());
    }
}
