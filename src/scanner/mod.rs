/*
 * Scan orchestrator: quote -> build -> (submit + confirm) for every
 * directional token pair
 */

use crate::aggregator::{QuoteClient, TransactionBuilder};
use crate::config::ScanConfig;
use crate::execution::SwapExecutor;
use crate::models::{
    ConfirmationResult, Permutation, QuoteRequest, Result, Route, ScannerError, TokenTable,
};
use crate::pairs;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub amount: u64,
    pub slippage: Decimal,
    pub direct_routes_only: bool,
    pub max_concurrency: usize,
}

impl From<&ScanConfig> for ScanSettings {
    fn from(config: &ScanConfig) -> Self {
        Self {
            amount: config.amount,
            slippage: config.slippage,
            direct_routes_only: config.direct_routes_only,
            max_concurrency: config.max_concurrency,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanStage {
    Quote,
    Build,
    Execute,
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanStage::Quote => write!(f, "quote"),
            ScanStage::Build => write!(f, "build"),
            ScanStage::Execute => write!(f, "execute"),
        }
    }
}

/// The top-ranked route, reduced to what the report needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSummary {
    pub candidates: usize,
    pub in_amount: Option<u64>,
    pub out_amount: Option<u64>,
    pub hops: Option<usize>,
}

#[derive(Debug)]
pub enum PermutationStatus {
    Built { transactions: usize },
    Executed { confirmations: Vec<ConfirmationResult> },
    /// `completed` lists transactions that confirmed before the failing
    /// step; it is only non-empty for execution failures.
    Failed {
        stage: ScanStage,
        error: ScannerError,
        completed: Vec<ConfirmationResult>,
    },
}

#[derive(Debug)]
pub struct PermutationOutcome {
    pub permutation: Permutation,
    pub route: Option<RouteSummary>,
    pub status: PermutationStatus,
    pub elapsed: Duration,
}

impl PermutationOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        !matches!(self.status, PermutationStatus::Failed { .. })
    }
}

#[derive(Debug)]
pub struct ScanReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One entry per permutation, in generation order.
    pub outcomes: Vec<PermutationOutcome>,
}

pub struct ScanOrchestrator {
    quotes: Arc<dyn QuoteClient>,
    builder: Arc<dyn TransactionBuilder>,
    wallet_address: String,
    settings: ScanSettings,
    executor: Option<Arc<SwapExecutor>>,
}

impl ScanOrchestrator {
    #[must_use]
    pub fn new(
        quotes: Arc<dyn QuoteClient>,
        builder: Arc<dyn TransactionBuilder>,
        wallet_address: impl Into<String>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            quotes,
            builder,
            wallet_address: wallet_address.into(),
            settings,
            executor: None,
        }
    }

    /// Submits and confirms every built transaction set instead of only
    /// logging it.
    #[must_use]
    pub fn with_executor(mut self, executor: Arc<SwapExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Scans every permutation of `tokens`. Pipelines run concurrently on the
    /// current task, at most `max_concurrency` at a time; a failing
    /// permutation never affects the others.
    pub async fn run(&self, tokens: &TokenTable) -> ScanReport {
        let started_at = Utc::now();
        let permutations = pairs::permutations(tokens);
        let concurrency = self.settings.max_concurrency.max(1);

        info!(
            tokens = tokens.len(),
            permutations = permutations.len(),
            concurrency,
            submit = self.executor.is_some(),
            "Starting scan"
        );

        let mut indexed: Vec<(usize, PermutationOutcome)> =
            stream::iter(permutations.into_iter().enumerate())
                .map(|(index, permutation)| async move {
                    (index, self.scan_permutation(permutation).await)
                })
                .buffer_unordered(concurrency)
                .collect()
                .await;
        indexed.sort_by_key(|(index, _)| *index);

        ScanReport {
            started_at,
            finished_at: Utc::now(),
            outcomes: indexed.into_iter().map(|(_, outcome)| outcome).collect(),
        }
    }

    pub async fn scan_permutation(&self, permutation: Permutation) -> PermutationOutcome {
        let started = Instant::now();
        let mut route_summary = None;
        let status = match self.run_pipeline(&permutation, &mut route_summary).await {
            Ok(status) | Err(status) => status,
        };

        let outcome = PermutationOutcome {
            permutation,
            route: route_summary,
            status,
            elapsed: started.elapsed(),
        };
        log_outcome(&outcome);
        outcome
    }

    async fn run_pipeline(
        &self,
        permutation: &Permutation,
        route_summary: &mut Option<RouteSummary>,
    ) -> std::result::Result<PermutationStatus, PermutationStatus> {
        let request = self
            .quote_request(permutation)
            .map_err(failed_at(ScanStage::Quote))?;

        let routes = self
            .quotes
            .get_quote(&request)
            .await
            .map_err(failed_at(ScanStage::Quote))?;

        let best = select_best(&routes).ok_or_else(|| {
            failed_at(ScanStage::Quote)(ScannerError::QuoteUnavailable(
                "No routes returned".to_string(),
            ))
        })?;
        *route_summary = Some(RouteSummary {
            candidates: routes.len(),
            in_amount: best.in_amount(),
            out_amount: best.out_amount(),
            hops: best.hops(),
        });

        let set = self
            .builder
            .build_transaction(best, &self.wallet_address)
            .await
            .map_err(failed_at(ScanStage::Build))?;

        match &self.executor {
            None => Ok(PermutationStatus::Built {
                transactions: set.len(),
            }),
            Some(executor) => executor
                .execute(&set)
                .await
                .map(|confirmations| PermutationStatus::Executed { confirmations })
                .map_err(|failure| PermutationStatus::Failed {
                    stage: ScanStage::Execute,
                    error: failure.error,
                    completed: failure.completed,
                }),
        }
    }

    fn quote_request(&self, permutation: &Permutation) -> Result<QuoteRequest> {
        QuoteRequest::new(
            permutation.from.mint.clone(),
            permutation.to.mint.clone(),
            self.settings.amount,
            self.settings.slippage,
            self.settings.direct_routes_only,
        )
    }
}

fn failed_at(stage: ScanStage) -> impl FnOnce(ScannerError) -> PermutationStatus {
    move |error| PermutationStatus::Failed {
        stage,
        error,
        completed: Vec::new(),
    }
}

/// The aggregator ranks routes itself; the first one is taken as-is.
fn select_best(routes: &[Route]) -> Option<&Route> {
    routes.first()
}

fn signatures(confirmations: &[ConfirmationResult]) -> Vec<&str> {
    confirmations.iter().map(|c| c.signature.as_str()).collect()
}

fn log_outcome(outcome: &PermutationOutcome) {
    let from = outcome.permutation.from.symbol.as_str();
    let to = outcome.permutation.to.symbol.as_str();
    let elapsed_ms = u64::try_from(outcome.elapsed.as_millis()).unwrap_or(u64::MAX);
    let out_amount = outcome.route.as_ref().and_then(|r| r.out_amount);
    let routes = outcome.route.as_ref().map_or(0, |r| r.candidates);

    match &outcome.status {
        PermutationStatus::Built { transactions } => {
            info!(from, to, routes, ?out_amount, transactions, elapsed_ms, "Swap built");
        }
        PermutationStatus::Executed { confirmations } => {
            let signatures = signatures(confirmations);
            info!(from, to, routes, ?out_amount, ?signatures, elapsed_ms, "Swap executed");
        }
        PermutationStatus::Failed {
            stage,
            error,
            completed,
        } => {
            let landed = signatures(completed);
            warn!(from, to, routes, %stage, %error, ?landed, elapsed_ms, "Permutation failed");
        }
    }
}
