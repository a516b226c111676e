/*
 * Jupiter aggregator client implementation
 */

use crate::aggregator::{QuoteClient, TransactionBuilder};
use crate::config::AggregatorConfig;
use crate::models::{QuoteRequest, Result, Route, ScannerError, TransactionSet};
use crate::utils::truncate_body;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub struct JupiterClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuoteResponse {
    Routes { data: Vec<Route> },
    Failure { error: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SwapRequest<'a> {
    route: &'a Route,
    user_public_key: &'a str,
    #[serde(rename = "wrapUnwrapSOL")]
    wrap_unwrap_sol: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapResponse {
    setup_transaction: Option<String>,
    swap_transaction: Option<String>,
    cleanup_transaction: Option<String>,
}

impl JupiterClient {
    pub fn new(config: &AggregatorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    // The quote API takes slippage in percent.
    fn slippage_percent(fraction: Decimal) -> String {
        (fraction * Decimal::ONE_HUNDRED).normalize().to_string()
    }
}

#[async_trait]
impl QuoteClient for JupiterClient {
    async fn get_quote(&self, request: &QuoteRequest) -> Result<Vec<Route>> {
        let url = format!("{}/quote", self.base_url);
        let amount = request.amount().to_string();
        let slippage = Self::slippage_percent(request.slippage());
        let direct = request.direct_routes_only().to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("inputMint", request.input_mint()),
                ("outputMint", request.output_mint()),
                ("amount", amount.as_str()),
                ("slippage", slippage.as_str()),
                ("onlyDirectRoutes", direct.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ScannerError::QuoteUnavailable(format!("Request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ScannerError::QuoteUnavailable(format!("Failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(ScannerError::QuoteUnavailable(format!("HTTP {status}: {body}")));
        }

        let parsed: QuoteResponse = serde_json::from_str(&body).map_err(|e| {
            ScannerError::QuoteUnavailable(format!(
                "Malformed quote response ({e}): {}",
                truncate_body(&body)
            ))
        })?;

        match parsed {
            QuoteResponse::Routes { data } if data.is_empty() => Err(
                ScannerError::QuoteUnavailable("No routes returned".to_string()),
            ),
            QuoteResponse::Routes { data } => {
                debug!(
                    input = request.input_mint(),
                    output = request.output_mint(),
                    routes = data.len(),
                    "Quote received"
                );
                Ok(data)
            }
            QuoteResponse::Failure { error } => Err(ScannerError::QuoteUnavailable(error)),
        }
    }
}

#[async_trait]
impl TransactionBuilder for JupiterClient {
    async fn build_transaction(&self, route: &Route, wallet_address: &str) -> Result<TransactionSet> {
        let url = format!("{}/swap", self.base_url);
        let payload = SwapRequest {
            route,
            user_public_key: wallet_address,
            wrap_unwrap_sol: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ScannerError::BuildFailed(format!("Request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ScannerError::BuildFailed(format!("Failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(ScannerError::BuildFailed(format!("HTTP {status}: {body}")));
        }

        let parsed: SwapResponse = serde_json::from_str(&body).map_err(|e| {
            ScannerError::BuildFailed(format!(
                "Malformed swap response ({e}): {}",
                truncate_body(&body)
            ))
        })?;

        let swap = parsed
            .swap_transaction
            .filter(|tx| !tx.is_empty())
            .ok_or_else(|| ScannerError::BuildFailed("No swap transaction in response".to_string()))?;

        Ok(TransactionSet {
            setup: parsed.setup_transaction.filter(|tx| !tx.is_empty()),
            swap,
            cleanup: parsed.cleanup_transaction.filter(|tx| !tx.is_empty()),
        })
    }
}
