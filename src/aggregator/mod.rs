/*
 * DEX aggregator integration: quotes and swap transaction building
 */

mod jupiter;

use async_trait::async_trait;
use crate::models::{QuoteRequest, Result, Route, TransactionSet};

pub use jupiter::JupiterClient;

/// Fetches ranked routes for a swap. Routes come back best-first; an empty
/// answer is reported as `QuoteUnavailable`, never as `Ok(vec![])`.
#[async_trait]
pub trait QuoteClient: Send + Sync {
    async fn get_quote(&self, request: &QuoteRequest) -> Result<Vec<Route>>;
}

/// Turns a chosen route into serialized transactions for `wallet_address`.
#[async_trait]
pub trait TransactionBuilder: Send + Sync {
    async fn build_transaction(&self, route: &Route, wallet_address: &str) -> Result<TransactionSet>;
}
