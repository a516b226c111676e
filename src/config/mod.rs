/*
 * Configuration management for the route scanner
 */

use crate::models::{validate_slippage, ScannerError, Result, Token, TokenTable};
use crate::utils::validate_address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

pub const NATIVE_MINT: &str = "So11111111111111111111111111111111111111112";

const DEFAULT_TOKENS: &[(&str, &str)] = &[
    ("USDC", "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"),
    ("SOL", NATIVE_MINT),
    ("NANA", "6uZ7MRGGf3FJhzk9TUk3QRMR2fz83WY9BEVBukRvMRVX"),
    ("TULIP", "TuLipcqtGVXP9XR62wM8WWCm6a9vhLs7T1uoWBk6FDs"),
    ("OXY", "z3dn17yLaGMKffVogeFHQ9zWVcXgqgf3PQnDsNs2g6M"),
];

#[derive(Debug, Clone)]
pub struct Config {
    pub aggregator: AggregatorConfig,
    pub rpc: RpcConfig,
    pub scan: ScanConfig,
    pub confirmation: ConfirmationConfig,
    pub wallet: WalletConfig,
    pub tokens: TokenTable,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AggregatorConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RpcConfig {
    pub url: String,
    pub commitment: Commitment,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    pub amount: u64,
    pub slippage: Decimal,
    pub direct_routes_only: bool,
    pub max_concurrency: usize,
    pub submit: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConfirmationConfig {
    pub max_attempts: u32,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Clone, Default)]
pub struct WalletConfig {
    pub private_key: Option<String>,
    pub public_key: Option<String>,
}

impl fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConfig")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("public_key", &self.public_key)
            .finish()
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            amount: 10_000_000,
            slippage: Decimal::new(2, 3),
            direct_routes_only: true,
            max_concurrency: 8,
            submit: false,
        }
    }
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 40,
            min_delay_ms: 500,
            max_delay_ms: 1000,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let http_timeout = parse_var("HTTP_TIMEOUT_SECS", 10u64)?;

        let scan = ScanConfig {
            amount: parse_var("SCAN_AMOUNT", ScanConfig::default().amount)?,
            slippage: parse_var("SCAN_SLIPPAGE", ScanConfig::default().slippage)?,
            direct_routes_only: parse_var("SCAN_DIRECT_ROUTES_ONLY", true)?,
            max_concurrency: parse_var("SCAN_MAX_CONCURRENCY", 8usize)?,
            submit: parse_var("SCAN_SUBMIT", false)?,
        };

        let confirmation = ConfirmationConfig {
            max_attempts: parse_var("CONFIRM_MAX_ATTEMPTS", 40u32)?,
            min_delay_ms: parse_var("CONFIRM_MIN_DELAY_MS", 500u64)?,
            max_delay_ms: parse_var("CONFIRM_MAX_DELAY_MS", 1000u64)?,
        };

        let tokens = match env::var("SCAN_TOKENS") {
            Ok(raw) => parse_token_list(&raw)?,
            Err(_) => default_tokens()?,
        };

        let config = Config {
            aggregator: AggregatorConfig {
                base_url: env::var("AGGREGATOR_URL")
                    .unwrap_or_else(|_| "https://quote-api.jup.ag/v1".to_string()),
                timeout_secs: http_timeout,
            },
            rpc: RpcConfig {
                url: env::var("RPC_URL")
                    .unwrap_or_else(|_| "https://solana-api.projectserum.com".to_string()),
                commitment: parse_var("RPC_COMMITMENT", Commitment::Confirmed)?,
                timeout_secs: http_timeout,
            },
            scan,
            confirmation,
            wallet: WalletConfig {
                private_key: env::var("PRIVATE_KEY").ok().filter(|k| !k.is_empty()),
                public_key: env::var("WALLET_PUBLIC_KEY").ok().filter(|k| !k.is_empty()),
            },
            tokens,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scan.amount == 0 {
            return Err(ScannerError::ConfigError("SCAN_AMOUNT must be positive".to_string()));
        }
        validate_slippage(self.scan.slippage)
            .map_err(|e| ScannerError::ConfigError(format!("SCAN_SLIPPAGE: {e}")))?;
        if self.scan.max_concurrency == 0 {
            return Err(ScannerError::ConfigError(
                "SCAN_MAX_CONCURRENCY must be at least 1".to_string(),
            ));
        }
        if self.confirmation.max_attempts == 0 {
            return Err(ScannerError::ConfigError(
                "CONFIRM_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }
        if self.confirmation.min_delay_ms == 0 {
            return Err(ScannerError::ConfigError(
                "CONFIRM_MIN_DELAY_MS must be at least 1".to_string(),
            ));
        }
        if self.confirmation.min_delay_ms > self.confirmation.max_delay_ms {
            return Err(ScannerError::ConfigError(format!(
                "CONFIRM_MIN_DELAY_MS ({}) exceeds CONFIRM_MAX_DELAY_MS ({})",
                self.confirmation.min_delay_ms, self.confirmation.max_delay_ms
            )));
        }
        if self.tokens.len() < 2 {
            return Err(ScannerError::ConfigError(
                "At least two tokens are required to scan pairs".to_string(),
            ));
        }
        if self.scan.submit && self.wallet.private_key.is_none() {
            return Err(ScannerError::ConfigError(
                "SCAN_SUBMIT requires PRIVATE_KEY".to_string(),
            ));
        }
        if self.wallet.private_key.is_none() && self.wallet.public_key.is_none() {
            return Err(ScannerError::ConfigError(
                "Either PRIVATE_KEY or WALLET_PUBLIC_KEY must be set".to_string(),
            ));
        }
        Ok(())
    }
}

impl Commitment {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

impl FromStr for Commitment {
    type Err = ScannerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "processed" => Ok(Commitment::Processed),
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            _ => Err(ScannerError::ConfigError(format!(
                "Unknown commitment level: {s}"
            ))),
        }
    }
}

/// Parses `SYM=mint,SYM=mint` into a token table.
pub fn parse_token_list(raw: &str) -> Result<TokenTable> {
    let mut tokens = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (symbol, mint) = entry.split_once('=').ok_or_else(|| {
            ScannerError::ConfigError(format!("Token entry must be SYMBOL=MINT: {entry}"))
        })?;
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(ScannerError::ConfigError(format!(
                "Empty token symbol in entry: {entry}"
            )));
        }
        tokens.push(Token {
            symbol: symbol.to_uppercase(),
            mint: validate_address(mint.trim())?,
        });
    }
    TokenTable::new(tokens)
}

pub fn default_tokens() -> Result<TokenTable> {
    TokenTable::new(
        DEFAULT_TOKENS
            .iter()
            .map(|(symbol, mint)| Token {
                symbol: (*symbol).to_string(),
                mint: (*mint).to_string(),
            })
            .collect(),
    )
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ScannerError::ConfigError(format!("Invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}
