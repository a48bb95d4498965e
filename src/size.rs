//! Human-readable sizes

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
const STEP: u64 = 1024;

/// Formats a byte count with binary multiples and at most two decimals,
/// e.g. `0 Bytes`, `1.5 KB`, `100 MB`. Anything past gigabytes stays in GB.
pub fn format_file_size(bytes: u64) -> String {
    let mut unit = 0;
    let mut divisor = 1u64;
    while unit + 1 < UNITS.len() && bytes >= divisor * STEP {
        divisor *= STEP;
        unit += 1;
    }

    let value = format!("{:.2}", bytes as f64 / divisor as f64);
    let value = value.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", value, UNITS[unit])
}
