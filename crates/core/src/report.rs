//! Batch run reports.
//!
//! Every batch stage returns a [`BatchReport`] so no single item's failure
//! disappears silently: the report carries explicit lists of the items that
//! succeeded, were skipped, or failed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An item that was deliberately not processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSkip {
    pub item: String,
    pub reason: String,
}

/// An item whose processing failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub item: String,
    pub error: String,
}

/// Summary of one batch stage run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: String,
    pub stage: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub succeeded: Vec<String>,
    pub skipped: Vec<ItemSkip>,
    pub failed: Vec<ItemFailure>,
    /// Set when the batch stopped early on a cancellation request
    #[serde(default)]
    pub cancelled: bool,
}

impl BatchReport {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            stage: stage.into(),
            started_at: Utc::now(),
            finished_at: None,
            succeeded: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            cancelled: false,
        }
    }

    pub fn succeed(&mut self, item: impl Into<String>) {
        self.succeeded.push(item.into());
    }

    pub fn skip(&mut self, item: impl Into<String>, reason: impl Into<String>) {
        self.skipped.push(ItemSkip {
            item: item.into(),
            reason: reason.into(),
        });
    }

    pub fn fail(&mut self, item: impl Into<String>, error: impl ToString) {
        self.failed.push(ItemFailure {
            item: item.into(),
            error: error.to_string(),
        });
    }

    /// Stamp the finish time.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.skipped.len() + self.failed.len()
    }

    /// True when nothing failed.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// One-line human summary, e.g. `compose: 12 succeeded, 1 skipped, 0 failed`.
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "{}: {} succeeded, {} skipped, {} failed",
            self.stage,
            self.succeeded.len(),
            self.skipped.len(),
            self.failed.len()
        );
        if self.cancelled {
            line.push_str(" (cancelled)");
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_every_outcome() {
        let mut report = BatchReport::new("compose");
        report.succeed("a.md");
        report.skip("b.md", "no command marker");
        report.fail("c.md", "permission denied");
        report.finish();

        assert_eq!(report.total(), 3);
        assert!(!report.is_clean());
        assert!(report.finished_at.is_some());
        assert_eq!(
            report.summary_line(),
            "compose: 1 succeeded, 1 skipped, 1 failed"
        );
    }

    #[test]
    fn cancelled_runs_say_so() {
        let mut report = BatchReport::new("assemble");
        report.cancelled = true;
        assert!(report.summary_line().ends_with("(cancelled)"));
        assert!(report.is_clean());
    }

    #[test]
    fn serializes_item_lists() {
        let mut report = BatchReport::new("fragments");
        report.fail("x", "boom");
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"stage\":\"fragments\""));
        assert!(json.contains("boom"));
    }
}
