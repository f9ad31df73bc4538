//! Utility functions.

const SUFFIXES: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];

/// Formats a byte count with decimal units, e.g. `50 MB` or `513.2 MB`.
pub fn pretty_bytes(bytes: u64) -> String {
    let mut count = bytes as f64;
    let mut suffix = 0;
    while count >= 1000.0 && suffix < SUFFIXES.len() - 1 {
        suffix += 1;
        count /= 1000.0;
    }
    if count.fract() == 0.0 {
        format!("{} {}", count as u64, SUFFIXES[suffix])
    } else {
        format!("{:.1} {}", count, SUFFIXES[suffix])
    }
}
