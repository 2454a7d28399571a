use ta::Next;
use ta::indicators::SimpleMovingAverage;

/// Trailing simple moving average.
///
/// The output has one entry per input value. Entry `i` is the mean of
/// `values[i + 1 - window..=i]`, or `None` while fewer than `window` values
/// have been seen. A zero window yields all `None`.
pub fn simple_moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut sma = match SimpleMovingAverage::new(window) {
        Ok(sma) => sma,
        Err(_) => return vec![None; values.len()],
    };

    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let mean = sma.next(*value);
            // warm-up outputs average over fewer than `window` values
            if i + 1 >= window { Some(mean) } else { None }
        })
        .collect()
}
