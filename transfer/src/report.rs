//! Run-level aggregation of per-source outcomes
//!
//! Sums transferred files, decides overall success and renders the itemized
//! failure listing reported when any source failed.

use crate::request::TransferOutcome;

/// Aggregate view over the outcomes of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub outcomes: Vec<TransferOutcome>,
}

impl RunReport {
    pub fn new(outcomes: Vec<TransferOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn total_files(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|outcome| outcome.files_transferred)
            .sum()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(TransferOutcome::success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &TransferOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.success())
    }

    /// Itemized `source: error` listing, `None` when every source succeeded
    pub fn failure_summary(&self) -> Option<String> {
        let failed: Vec<_> = self.failures().collect();
        if failed.is_empty() {
            return None;
        }
        let items = failed
            .iter()
            .map(|outcome| {
                format!(
                    "  - {}: {}",
                    outcome.source,
                    outcome.error.as_deref().unwrap_or_default()
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        Some(format!(
            "{} of {} transfer(s) failed:\n{}",
            failed.len(),
            self.outcomes.len(),
            items
        ))
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.failure_summary() {
            Some(summary) => write!(f, "{summary}"),
            None => write!(
                f,
                "All {} transfer(s) completed successfully. {} file(s) transferred.",
                self.outcomes.len(),
                self.total_files()
            ),
        }
    }
}
