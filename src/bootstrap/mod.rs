/*
 * Pre-flight check for the wrapped native asset account
 */

use crate::config::NATIVE_MINT;
use crate::models::{Result, ScannerError, TokenTable};
use crate::rpc::RpcClient;
use tracing::{info, warn};

/// Verifies that `owner` holds a token account for the wrapped native mint
/// when any scanned pair touches it. Swaps through the native asset fail
/// on chain without one, so submission must not start.
///
/// Returns the account address, or `None` when the check does not apply.
pub async fn ensure_wrapped_native_account(
    rpc: &RpcClient,
    owner: &str,
    tokens: &TokenTable,
) -> Result<Option<String>> {
    if !tokens.contains_mint(NATIVE_MINT) {
        return Ok(None);
    }

    let accounts = rpc.get_token_accounts_by_owner(owner, NATIVE_MINT).await?;
    match accounts.into_iter().next() {
        Some(account) => {
            info!(owner, account = %account.pubkey, "Wrapped native account found");
            Ok(Some(account.pubkey))
        }
        None => {
            warn!(owner, "No wrapped native account");
            Err(ScannerError::ConfigError(format!(
                "Wallet {owner} has no wrapped native ({NATIVE_MINT}) token account; create and fund one before submitting"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{parse_token_list, Commitment, RpcConfig};
    use mockito::Matcher;
    use serde_json::json;

    const OWNER: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

    fn rpc(url: &str) -> RpcClient {
        RpcClient::new(&RpcConfig {
            url: url.to_string(),
            commitment: Commitment::Confirmed,
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn with_native() -> TokenTable {
        parse_token_list(&format!(
            "USDC=EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v,SOL={NATIVE_MINT}"
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn skips_when_native_mint_is_not_scanned() {
        let server = mockito::Server::new_async().await;
        let tokens = parse_token_list(
            "USDC=EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v,OXY=z3dn17yLaGMKffVogeFHQ9zWVcXgqgf3PQnDsNs2g6M",
        )
        .unwrap();

        let found = ensure_wrapped_native_account(&rpc(&server.url()), OWNER, &tokens)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn finds_existing_account() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({
                "method": "getTokenAccountsByOwner",
                "params": [OWNER, {"mint": NATIVE_MINT}]
            })))
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":{"context":{"slot":1},"value":[{"pubkey":"wsol1","account":{}}]}}"#)
            .create_async()
            .await;

        let found = ensure_wrapped_native_account(&rpc(&server.url()), OWNER, &with_native())
            .await
            .unwrap();
        assert_eq!(found.as_deref(), Some("wsol1"));
    }

    #[tokio::test]
    async fn missing_account_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":{"context":{"slot":1},"value":[]}}"#)
            .create_async()
            .await;

        let err = ensure_wrapped_native_account(&rpc(&server.url()), OWNER, &with_native())
            .await
            .unwrap_err();
        assert!(matches!(err, ScannerError::ConfigError(_)));
    }
}
