/*
 * Scan summary aggregation
 */

use crate::scanner::{PermutationStatus, ScanReport, ScanStage};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub permutations: usize,
    pub built: usize,
    pub executed: usize,
    pub transactions: usize,
    pub quote_failures: usize,
    pub build_failures: usize,
    pub execution_failures: usize,
    pub duration_ms: i64,
}

impl ScanSummary {
    #[must_use]
    pub fn from_report(report: &ScanReport) -> Self {
        let mut summary = ScanSummary {
            permutations: report.outcomes.len(),
            duration_ms: (report.finished_at - report.started_at).num_milliseconds(),
            ..Default::default()
        };

        for outcome in &report.outcomes {
            match &outcome.status {
                PermutationStatus::Built { transactions } => {
                    summary.built += 1;
                    summary.transactions += transactions;
                }
                PermutationStatus::Executed { confirmations } => {
                    summary.executed += 1;
                    summary.transactions += confirmations.len();
                }
                PermutationStatus::Failed {
                    stage, completed, ..
                } => {
                    summary.transactions += completed.len();
                    match stage {
                        ScanStage::Quote => summary.quote_failures += 1,
                        ScanStage::Build => summary.build_failures += 1,
                        ScanStage::Execute => summary.execution_failures += 1,
                    }
                }
            }
        }

        summary
    }

    #[must_use]
    pub fn failures(&self) -> usize {
        self.quote_failures + self.build_failures + self.execution_failures
    }

    pub fn log(&self) {
        info!(
            permutations = self.permutations,
            built = self.built,
            executed = self.executed,
            transactions = self.transactions,
            duration_ms = self.duration_ms,
            "Scan completed"
        );
        if self.failures() > 0 {
            warn!(
                quote = self.quote_failures,
                build = self.build_failures,
                execute = self.execution_failures,
                "Some permutations failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConfirmationResult, ConfirmationStatus, Permutation, ScannerError, Token};
    use crate::scanner::PermutationOutcome;
    use chrono::{Duration as ChronoDuration, Utc};
    use std::time::Duration;

    fn outcome(status: PermutationStatus) -> PermutationOutcome {
        let token = |s: &str| Token {
            symbol: s.to_string(),
            mint: format!("{s}-mint"),
        };
        PermutationOutcome {
            permutation: Permutation {
                from: token("A"),
                to: token("B"),
            },
            route: None,
            status,
            elapsed: Duration::from_millis(5),
        }
    }

    #[test]
    fn counts_outcomes_by_kind_and_stage() {
        let started_at = Utc::now();
        let report = ScanReport {
            started_at,
            finished_at: started_at + ChronoDuration::milliseconds(1500),
            outcomes: vec![
                outcome(PermutationStatus::Built { transactions: 3 }),
                outcome(PermutationStatus::Built { transactions: 1 }),
                outcome(PermutationStatus::Executed {
                    confirmations: vec![ConfirmationResult {
                        signature: "sig".to_string(),
                        status: ConfirmationStatus::Confirmed,
                        attempts: 2,
                    }],
                }),
                outcome(PermutationStatus::Failed {
                    stage: ScanStage::Quote,
                    error: ScannerError::QuoteUnavailable("x".to_string()),
                    completed: vec![],
                }),
                outcome(PermutationStatus::Failed {
                    stage: ScanStage::Execute,
                    error: ScannerError::ConfirmationTimeout("swap-sig".to_string()),
                    completed: vec![ConfirmationResult {
                        signature: "setup-sig".to_string(),
                        status: ConfirmationStatus::Confirmed,
                        attempts: 1,
                    }],
                }),
            ],
        };

        let summary = ScanSummary::from_report(&report);

        assert_eq!(summary.permutations, 5);
        assert_eq!(summary.built, 2);
        assert_eq!(summary.executed, 1);
        // landed setup of the failed execution counts too
        assert_eq!(summary.transactions, 6);
        assert_eq!(summary.quote_failures, 1);
        assert_eq!(summary.build_failures, 0);
        assert_eq!(summary.execution_failures, 1);
        assert_eq!(summary.failures(), 2);
        assert_eq!(summary.duration_ms, 1500);
    }

    #[test]
    fn empty_report_summarizes_to_zero() {
        let now = Utc::now();
        let summary = ScanSummary::from_report(&ScanReport {
            started_at: now,
            finished_at: now,
            outcomes: vec![],
        });
        assert_eq!(summary, ScanSummary::default());
    }
}
