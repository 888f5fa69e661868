use std::time::{Duration, Instant};

/// Logs how long the step since `last` took and returns the new checkpoint.
pub(crate) fn trace(l_step: &str, detect: Instant, last: Duration) -> Duration {
    let now = detect.elapsed();
    log::trace!("TIME | Total={:.2?} | {}={:.2?}", now, l_step, now.saturating_sub(last));
    now
}

pub(crate) fn human_bytes(size: f64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = size;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}
