//! Per-item outcomes and the aggregated batch report.

/// How many failure reasons the user-facing summary includes.
pub const SUMMARY_FAILURE_LIMIT: usize = 5;

/// Result of processing one batch item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The item was processed fully.
    Succeeded,
    /// The item failed with the given reason.
    Failed(String),
}

/// One failed item with its reason, kept in batch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// Name of the item that failed.
    pub name: String,
    /// Failure reason text.
    pub reason: String,
}

/// Aggregated result of a batch operation.
///
/// Per-item failures never abort the remaining items, so a report always
/// accounts for every item the batch was asked to process.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    succeeded: usize,
    failures: Vec<ItemFailure>,
}

impl BatchReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one successfully processed item.
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    /// Records one failed item with its reason.
    pub fn record_failure(&mut self, name: impl Into<String>, reason: impl Into<String>) {
        self.failures.push(ItemFailure {
            name: name.into(),
            reason: reason.into(),
        });
    }

    /// Records a [`TransferOutcome`] for the named item.
    pub fn record(&mut self, name: &str, outcome: TransferOutcome) {
        match outcome {
            TransferOutcome::Succeeded => self.record_success(),
            TransferOutcome::Failed(reason) => self.record_failure(name, reason),
        }
    }

    /// Number of items that succeeded.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    /// Number of items that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Total number of items accounted for.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    /// Every failure, in batch order.
    #[must_use]
    pub fn failures(&self) -> &[ItemFailure] {
        &self.failures
    }

    /// Whether every item succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary: counts plus the first few failure reasons.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut text = format!("Succeeded: {}, failed: {}", self.succeeded(), self.failed());
        if !self.failures.is_empty() {
            text.push_str("\nFirst errors:");
            for failure in self.failures.iter().take(SUMMARY_FAILURE_LIMIT) {
                text.push_str(&format!("\n  {}: {}", failure.name, failure.reason));
            }
        }
        text
    }
}
