/*
 * RPC client module for the ledger JSON-RPC endpoint
 */

use crate::confirmation::{LedgerStatus, StatusLookup};
use crate::config::{Commitment, RpcConfig};
use crate::execution::TransactionSubmitter;
use crate::models::{Result, ScannerError};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub struct RpcClient {
    client: Client,
    url: String,
    commitment: Commitment,
    request_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct TransactionResult {
    meta: Option<TransactionMeta>,
}

#[derive(Debug, Deserialize)]
struct TransactionMeta {
    err: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ValueWrapper<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
pub struct TokenAccount {
    pub pubkey: String,
}

impl RpcClient {
    pub fn new(config: &RpcConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            commitment: config.commitment,
            request_id: AtomicU64::new(1),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<Option<T>> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ScannerError::RpcError(format!("{method} request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ScannerError::RpcError(format!(
                "{method} returned HTTP {status}: {text}"
            )));
        }

        let parsed: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| ScannerError::RpcError(format!("Failed to parse {method} response: {e}")))?;

        if let Some(err) = parsed.error {
            return Err(ScannerError::RpcError(format!(
                "{method} failed ({}): {}",
                err.code, err.message
            )));
        }

        Ok(parsed.result)
    }

    /// Looks up a transaction by signature. `None` means the ledger does not
    /// show it yet at the configured commitment.
    pub async fn get_transaction(&self, signature: &str) -> Result<Option<LedgerStatus>> {
        let result: Option<TransactionResult> = self
            .call(
                "getTransaction",
                json!([
                    signature,
                    {
                        "commitment": self.commitment.as_str(),
                        "encoding": "json",
                        "maxSupportedTransactionVersion": 0
                    }
                ]),
            )
            .await?;

        // A result without meta is not yet usable for a verdict.
        Ok(result
            .and_then(|tx| tx.meta)
            .map(|meta| LedgerStatus { err: meta.err }))
    }

    /// Sends a signed, base64-encoded transaction and returns its signature.
    pub async fn send_raw_transaction(&self, signed_tx: &str) -> Result<String> {
        self.call::<String>(
            "sendTransaction",
            json!([
                signed_tx,
                {
                    "encoding": "base64",
                    "preflightCommitment": self.commitment.as_str()
                }
            ]),
        )
        .await?
        .ok_or_else(|| ScannerError::RpcError("sendTransaction returned no signature".to_string()))
    }

    pub async fn get_token_accounts_by_owner(
        &self,
        owner: &str,
        mint: &str,
    ) -> Result<Vec<TokenAccount>> {
        let wrapped: Option<ValueWrapper<Vec<TokenAccount>>> = self
            .call(
                "getTokenAccountsByOwner",
                json!([
                    owner,
                    { "mint": mint },
                    { "encoding": "jsonParsed", "commitment": self.commitment.as_str() }
                ]),
            )
            .await?;

        Ok(wrapped.map(|w| w.value).unwrap_or_default())
    }
}

#[async_trait]
impl StatusLookup for RpcClient {
    async fn transaction_status(&self, signature: &str) -> Result<Option<LedgerStatus>> {
        self.get_transaction(signature).await
    }
}

#[async_trait]
impl TransactionSubmitter for RpcClient {
    async fn submit(&self, signed_tx: &str) -> Result<String> {
        self.send_raw_transaction(signed_tx).await
    }
}
