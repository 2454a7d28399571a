use alphavantage_api::api::{ALPHAVANTAGE_BASE_API_URL, AlphaVantageAPI};
use log::{error, info};
use std::process::exit;

use crate::config::Config;

mod config;
mod pipeline;
mod report;
mod utils;

fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let config = match Config::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Could not create config: {}", e);
            exit(1);
        }
    };

    let api = if config.base_url == ALPHAVANTAGE_BASE_API_URL {
        AlphaVantageAPI::new(&config.api_key)
    } else {
        AlphaVantageAPI::with_base_url(&config.api_key, &config.base_url)
    };

    let analysis = match pipeline::run(&config, &api) {
        Ok(analysis) => analysis,
        Err(e) => {
            error!("Execution failed: {}", e);
            exit(1);
        }
    };

    println!("{}", report::summary(&config.symbol, &analysis));
    println!("{}", report::recent_table(&analysis, report::RECENT_ROWS));
    info!("Analysis complete");
}
