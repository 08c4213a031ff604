//! Terminal-width detection.
//!
//! Deliberately out of scope per the spec: this is a named plumbing
//! contract, not part of the walk-path engine. Error-context rendering
//! ([`crate::json::error::render_excerpt`]) consumes whatever this returns
//! and bounds its output to it; the detection strategy itself is not load
//! bearing for correctness.

/// Read the controlling terminal's width once, falling back to 80 columns
/// when not attached to a terminal (the `COLUMNS` environment variable is
/// honored first, matching common shell conventions).
pub fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|w| *w > 0)
        .unwrap_or(80)
}
