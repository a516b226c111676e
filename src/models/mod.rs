/*
 * Data models and types for the route scanner
 */

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A tradable asset: display symbol plus its on-chain mint address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub symbol: String,
    pub mint: String,
}

/// Read-only symbol -> mint table, kept in insertion order so scans log
/// permutations in a stable order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenTable {
    tokens: Vec<Token>,
}

impl TokenTable {
    /// Builds a table, rejecting duplicate symbols and duplicate mints.
    pub fn new(tokens: Vec<Token>) -> Result<Self> {
        for (i, token) in tokens.iter().enumerate() {
            if tokens[..i].iter().any(|t| t.symbol == token.symbol) {
                return Err(ScannerError::ConfigError(format!(
                    "Duplicate token symbol: {}",
                    token.symbol
                )));
            }
            if tokens[..i].iter().any(|t| t.mint == token.mint) {
                return Err(ScannerError::ConfigError(format!(
                    "Duplicate mint for {}: {}",
                    token.symbol, token.mint
                )));
            }
        }
        Ok(Self { tokens })
    }

    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<&Token> {
        self.tokens.iter().find(|t| t.symbol == symbol)
    }

    #[must_use]
    pub fn contains_mint(&self, mint: &str) -> bool {
        self.tokens.iter().any(|t| t.mint == mint)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// One directional swap intent, `from` -> `to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permutation {
    pub from: Token,
    pub to: Token,
}

impl Permutation {
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

impl fmt::Display for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from.symbol, self.to.symbol)
    }
}

/// Parameters of a single quote request. Construct through [`QuoteRequest::new`]
/// so the amount and slippage invariants always hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    input_mint: String,
    output_mint: String,
    amount: u64,
    slippage: Decimal,
    direct_routes_only: bool,
}

impl QuoteRequest {
    pub fn new(
        input_mint: impl Into<String>,
        output_mint: impl Into<String>,
        amount: u64,
        slippage: Decimal,
        direct_routes_only: bool,
    ) -> Result<Self> {
        let input_mint = input_mint.into();
        let output_mint = output_mint.into();

        if input_mint == output_mint {
            return Err(ScannerError::InvalidRequest(format!(
                "Input and output mint are identical: {input_mint}"
            )));
        }
        if amount == 0 {
            return Err(ScannerError::InvalidRequest(
                "Amount must be positive".to_string(),
            ));
        }
        validate_slippage(slippage)?;

        Ok(Self {
            input_mint,
            output_mint,
            amount,
            slippage,
            direct_routes_only,
        })
    }

    #[must_use]
    pub fn input_mint(&self) -> &str {
        &self.input_mint
    }

    #[must_use]
    pub fn output_mint(&self) -> &str {
        &self.output_mint
    }

    #[must_use]
    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// Slippage tolerance as a fraction, e.g. `0.002` for 0.2%.
    #[must_use]
    pub fn slippage(&self) -> Decimal {
        self.slippage
    }

    #[must_use]
    pub fn direct_routes_only(&self) -> bool {
        self.direct_routes_only
    }
}

pub fn validate_slippage(slippage: Decimal) -> Result<()> {
    if slippage <= Decimal::ZERO || slippage > Decimal::ONE {
        return Err(ScannerError::InvalidRequest(format!(
            "Slippage must be within (0, 1], got {slippage}"
        )));
    }
    Ok(())
}

/// A candidate route as returned by the aggregator. The payload is passed
/// back verbatim when building transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route(serde_json::Value);

impl Route {
    #[must_use]
    pub fn new(raw: serde_json::Value) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn raw(&self) -> &serde_json::Value {
        &self.0
    }

    #[must_use]
    pub fn out_amount(&self) -> Option<u64> {
        amount_field(&self.0, "outAmount")
    }

    #[must_use]
    pub fn in_amount(&self) -> Option<u64> {
        amount_field(&self.0, "inAmount")
    }

    /// Number of hops, when the aggregator reports its market list.
    #[must_use]
    pub fn hops(&self) -> Option<usize> {
        self.0.get("marketInfos").and_then(|m| m.as_array()).map(Vec::len)
    }
}

// Amounts arrive either as JSON numbers or as decimal strings.
fn amount_field(value: &serde_json::Value, key: &str) -> Option<u64> {
    match value.get(key)? {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Setup,
    Swap,
    Cleanup,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Setup => write!(f, "setup"),
            TransactionKind::Swap => write!(f, "swap"),
            TransactionKind::Cleanup => write!(f, "cleanup"),
        }
    }
}

/// Serialized (base64) transactions realizing one route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSet {
    pub setup: Option<String>,
    pub swap: String,
    pub cleanup: Option<String>,
}

impl TransactionSet {
    /// Transactions in submission order: setup, swap, cleanup.
    #[must_use]
    pub fn ordered(&self) -> Vec<(TransactionKind, &str)> {
        let mut txs = Vec::with_capacity(3);
        if let Some(setup) = &self.setup {
            txs.push((TransactionKind::Setup, setup.as_str()));
        }
        txs.push((TransactionKind::Swap, self.swap.as_str()));
        if let Some(cleanup) = &self.cleanup {
            txs.push((TransactionKind::Cleanup, cleanup.as_str()));
        }
        txs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        1 + usize::from(self.setup.is_some()) + usize::from(self.cleanup.is_some())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfirmationStatus {
    Confirmed,
    FailedOnChain { error: serde_json::Value },
    /// Carries the last status-lookup error when the final polls failed,
    /// which tells an unreachable RPC apart from a slow ledger.
    TimedOut { last_error: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationResult {
    pub signature: String,
    pub status: ConfirmationStatus,
    pub attempts: u32,
}

impl ConfirmationResult {
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        matches!(self.status, ConfirmationStatus::Confirmed)
    }

    /// Maps the terminal state onto the error taxonomy: only `Confirmed`
    /// is a success.
    pub fn into_result(self) -> Result<Self> {
        match &self.status {
            ConfirmationStatus::Confirmed => Ok(self),
            ConfirmationStatus::FailedOnChain { error } => {
                Err(ScannerError::TransactionExecutionError {
                    signature: self.signature.clone(),
                    details: error.to_string(),
                })
            }
            ConfirmationStatus::TimedOut { .. } => {
                Err(ScannerError::ConfirmationTimeout(self.signature.clone()))
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ScannerError {
    #[error("Quote unavailable: {0}")]
    QuoteUnavailable(String),

    #[error("Transaction build failed: {0}")]
    BuildFailed(String),

    #[error("Transaction {signature} failed on chain: {details}")]
    TransactionExecutionError { signature: String, details: String },

    #[error("Transaction {0} was not confirmed in time")]
    ConfirmationTimeout(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Signing error: {0}")]
    SigningError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ScannerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn token(symbol: &str, mint: &str) -> Token {
        Token {
            symbol: symbol.to_string(),
            mint: mint.to_string(),
        }
    }

    #[test]
    fn quote_request_rejects_zero_amount() {
        let err = QuoteRequest::new("a", "b", 0, Decimal::from_str("0.01").unwrap(), true)
            .unwrap_err();
        assert!(matches!(err, ScannerError::InvalidRequest(_)));
    }

    #[test]
    fn quote_request_rejects_out_of_range_slippage() {
        for raw in ["0", "-0.1", "1.5"] {
            let slippage = Decimal::from_str(raw).unwrap();
            assert!(QuoteRequest::new("a", "b", 10, slippage, true).is_err(), "{raw}");
        }
        assert!(QuoteRequest::new("a", "b", 10, Decimal::ONE, false).is_ok());
    }

    #[test]
    fn quote_request_rejects_self_pair() {
        let slippage = Decimal::from_str("0.01").unwrap();
        assert!(QuoteRequest::new("a", "a", 10, slippage, true).is_err());
    }

    #[test]
    fn token_table_rejects_duplicates() {
        let dup_symbol = TokenTable::new(vec![token("A", "m1"), token("A", "m2")]);
        assert!(dup_symbol.is_err());

        let dup_mint = TokenTable::new(vec![token("A", "m1"), token("B", "m1")]);
        assert!(dup_mint.is_err());

        let table = TokenTable::new(vec![token("A", "m1"), token("B", "m2")]).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("B").map(|t| t.mint.as_str()), Some("m2"));
        assert!(table.contains_mint("m1"));
    }

    #[test]
    fn route_reads_amounts_from_strings_or_numbers() {
        let route = Route::new(json!({
            "inAmount": 10_000_000,
            "outAmount": "250000",
            "marketInfos": [{}, {}]
        }));
        assert_eq!(route.in_amount(), Some(10_000_000));
        assert_eq!(route.out_amount(), Some(250_000));
        assert_eq!(route.hops(), Some(2));
    }

    #[test]
    fn transaction_set_orders_setup_swap_cleanup() {
        let set = TransactionSet {
            setup: Some("s".to_string()),
            swap: "w".to_string(),
            cleanup: Some("c".to_string()),
        };
        let kinds: Vec<_> = set.ordered().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            kinds,
            vec![TransactionKind::Setup, TransactionKind::Swap, TransactionKind::Cleanup]
        );
        assert_eq!(set.len(), 3);

        let swap_only = TransactionSet {
            setup: None,
            swap: "w".to_string(),
            cleanup: None,
        };
        assert_eq!(swap_only.ordered(), vec![(TransactionKind::Swap, "w")]);
    }

    #[test]
    fn confirmation_result_maps_to_error_taxonomy() {
        let failed = ConfirmationResult {
            signature: "sig".to_string(),
            status: ConfirmationStatus::FailedOnChain {
                error: json!({"InstructionError": [0, "Custom"]}),
            },
            attempts: 1,
        };
        assert!(matches!(
            failed.into_result(),
            Err(ScannerError::TransactionExecutionError { .. })
        ));

        let timed_out = ConfirmationResult {
            signature: "sig".to_string(),
            status: ConfirmationStatus::TimedOut { last_error: None },
            attempts: 40,
        };
        assert!(matches!(
            timed_out.into_result(),
            Err(ScannerError::ConfirmationTimeout(s)) if s == "sig"
        ));
    }
}
