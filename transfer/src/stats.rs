//! Transfer count extraction from captured rclone output
//!
//! rclone re-emits its statistics while it runs, so the last recognizable
//! value wins. Lines are either JSON log records (`--use-json-log`) carrying a
//! `stats.transfers` counter, or plain text stats such as
//! `Transferred:            3 / 10, 30%`.

use std::sync::LazyLock;

static TRANSFERRED_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"Transferred:\s+(\d+)\s+/\s+(\d+)").unwrap());

/// Number of files rclone reported as transferred, 0 if nothing was recognized
pub fn parse_transferred(output: &str) -> u64 {
    let mut transferred = 0;
    for line in output.lines() {
        if let Some(count) = json_transfers(line).or_else(|| text_transfers(line)) {
            transferred = count;
        }
    }
    transferred
}

fn json_transfers(line: &str) -> Option<u64> {
    let record: serde_json::Value = serde_json::from_str(line).ok()?;
    let counter = record.get("stats")?.get("transfers")?;
    counter.as_u64().or_else(|| {
        counter
            .as_f64()
            .filter(|value| value.is_finite() && *value >= 0.0)
            .map(|value| value as u64)
    })
}

fn text_transfers(line: &str) -> Option<u64> {
    TRANSFERRED_RE
        .captures(line)
        .and_then(|captures| captures.get(1))
        .and_then(|done| done.as_str().parse().ok())
}
