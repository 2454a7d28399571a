use history_analysis::analysis::Analysis;
use std::fmt::Write;

pub const RECENT_ROWS: usize = 30;

pub fn summary(symbol: &str, analysis: &Analysis) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- Summary for {} ---", symbol);

    let Some(latest) = analysis.latest() else {
        let _ = writeln!(out, "No data");
        return out;
    };

    let sma = match latest.sma {
        Some(sma) => format!("${:.2}", sma),
        None => "n/a".to_string(),
    };

    let _ = writeln!(out, "Stock: {}", symbol);
    let _ = writeln!(out, "Analysis Period End Date: {}", latest.bar.trade_date.format("%Y-%m-%d"));
    let _ = writeln!(out, "Latest Closing Price: ${:.2}", latest.bar.close);
    let _ = writeln!(out, "Latest {}-day SMA: {}", analysis.sma_period(), sma);
    out
}

pub fn recent_table(analysis: &Analysis, rows: usize) -> String {
    let mut out = String::new();
    let sma_header = format!("SMA{}", analysis.sma_period());
    let _ = writeln!(
        out,
        "{:<10} {:>10} {:>10} {:>10} {:>10} {:>12} {:>10}",
        "Date", "Open", "High", "Low", "Close", "Volume", sma_header
    );

    for row in analysis.tail(rows) {
        let sma = row.sma.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<10} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>12} {:>10}",
            row.bar.trade_date.format("%Y-%m-%d").to_string(),
            row.bar.open,
            row.bar.high,
            row.bar.low,
            row.bar.close,
            row.bar.volume,
            sma
        );
    }
    out
}
