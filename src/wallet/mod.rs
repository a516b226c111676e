/*
 * Wallet identity and transaction signing
 */

use crate::config::WalletConfig;
use crate::models::{Result, ScannerError};
use crate::utils::validate_address;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey};
use std::sync::Arc;

const SIGNATURE_LEN: usize = 64;
const PUBKEY_LEN: usize = 32;
const VERSION_PREFIX_MASK: u8 = 0x80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Base64 wire encoding, ready for `sendTransaction`.
    pub encoded: String,
    /// Base58 of the fee payer's signature, which is the transaction id.
    pub signature: String,
}

pub trait Wallet: Send + Sync {
    fn public_key(&self) -> &str;

    fn sign_transaction(&self, serialized: &str) -> Result<SignedTransaction>;
}

/// Loads the wallet described by the configuration: a signing keypair when
/// a private key is present, otherwise a watch-only public key.
pub fn from_config(config: &WalletConfig) -> Result<Arc<dyn Wallet>> {
    if let Some(secret) = &config.private_key {
        let wallet = KeypairWallet::from_base58(secret)?;
        if let Some(expected) = &config.public_key {
            if expected != wallet.public_key() {
                return Err(ScannerError::ConfigError(format!(
                    "WALLET_PUBLIC_KEY {expected} does not match PRIVATE_KEY ({})",
                    wallet.public_key()
                )));
            }
        }
        return Ok(Arc::new(wallet));
    }

    match &config.public_key {
        Some(public_key) => Ok(Arc::new(WatchOnlyWallet::new(public_key)?)),
        None => Err(ScannerError::ConfigError(
            "No wallet configured".to_string(),
        )),
    }
}

/// Address-only wallet: transactions can be built for it but not signed.
pub struct WatchOnlyWallet {
    public_key: String,
}

impl WatchOnlyWallet {
    pub fn new(public_key: &str) -> Result<Self> {
        Ok(Self {
            public_key: validate_address(public_key)?,
        })
    }
}

impl Wallet for WatchOnlyWallet {
    fn public_key(&self) -> &str {
        &self.public_key
    }

    fn sign_transaction(&self, _serialized: &str) -> Result<SignedTransaction> {
        Err(ScannerError::SigningError(format!(
            "Wallet {} is watch-only",
            self.public_key
        )))
    }
}

pub struct KeypairWallet {
    signing_key: SigningKey,
    public_key: String,
}

impl KeypairWallet {
    /// Accepts the 64-byte secret+public keypair encoding in base58.
    pub fn from_base58(secret: &str) -> Result<Self> {
        let bytes = bs58::decode(secret.trim())
            .into_vec()
            .map_err(|e| ScannerError::ConfigError(format!("PRIVATE_KEY is not base58: {e}")))?;

        let keypair: [u8; 64] = bytes.as_slice().try_into().map_err(|_| {
            ScannerError::ConfigError(format!(
                "PRIVATE_KEY must decode to 64 bytes, got {}",
                bytes.len()
            ))
        })?;

        let signing_key = SigningKey::from_keypair_bytes(&keypair)
            .map_err(|e| ScannerError::ConfigError(format!("Invalid keypair: {e}")))?;

        Ok(Self::from_signing_key(signing_key))
    }

    #[must_use]
    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        let public_key = bs58::encode(signing_key.verifying_key().to_bytes()).into_string();
        Self {
            signing_key,
            public_key,
        }
    }
}

impl Wallet for KeypairWallet {
    fn public_key(&self) -> &str {
        &self.public_key
    }

    fn sign_transaction(&self, serialized: &str) -> Result<SignedTransaction> {
        let mut tx = BASE64
            .decode(serialized)
            .map_err(|e| ScannerError::SigningError(format!("Transaction is not base64: {e}")))?;

        let layout = TransactionLayout::parse(&tx)?;
        let own_key = self.signing_key.verifying_key().to_bytes();
        let slot = layout.signer_slot(&tx, &own_key).ok_or_else(|| {
            ScannerError::SigningError(format!(
                "{} is not a required signer of this transaction",
                self.public_key
            ))
        })?;

        let signature = self.signing_key.sign(&tx[layout.message_offset..]).to_bytes();
        let start = layout.signatures_offset + slot * SIGNATURE_LEN;
        tx[start..start + SIGNATURE_LEN].copy_from_slice(&signature);

        let payer_signature = &tx[layout.signatures_offset..layout.signatures_offset + SIGNATURE_LEN];

        Ok(SignedTransaction {
            signature: bs58::encode(payer_signature).into_string(),
            encoded: BASE64.encode(&tx),
        })
    }
}

/// Byte offsets of the parts of a serialized transaction that signing touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TransactionLayout {
    signatures_offset: usize,
    message_offset: usize,
    required_signers: usize,
    keys_offset: usize,
}

impl TransactionLayout {
    fn parse(tx: &[u8]) -> Result<Self> {
        let (signature_count, signatures_offset) = decode_compact_u16(tx, 0)?;
        let message_offset = signatures_offset + signature_count * SIGNATURE_LEN;

        let mut cursor = message_offset;
        let first = *tx.get(cursor).ok_or_else(|| truncated("message header"))?;
        if first & VERSION_PREFIX_MASK != 0 {
            cursor += 1;
        }

        let required_signers = usize::from(*tx.get(cursor).ok_or_else(|| truncated("message header"))?);
        // header: required signers, readonly signed, readonly unsigned
        cursor += 3;
        let (key_count, keys_offset) = decode_compact_u16(tx, cursor)?;

        if signature_count == 0 || signature_count != required_signers {
            return Err(ScannerError::SigningError(format!(
                "Signature slots ({signature_count}) do not match required signers ({required_signers})"
            )));
        }
        if key_count < required_signers || tx.len() < keys_offset + key_count * PUBKEY_LEN {
            return Err(truncated("account keys"));
        }

        Ok(Self {
            signatures_offset,
            message_offset,
            required_signers,
            keys_offset,
        })
    }

    fn signer_slot(&self, tx: &[u8], key: &[u8; PUBKEY_LEN]) -> Option<usize> {
        (0..self.required_signers).find(|i| {
            let start = self.keys_offset + i * PUBKEY_LEN;
            &tx[start..start + PUBKEY_LEN] == key
        })
    }
}

fn truncated(part: &str) -> ScannerError {
    ScannerError::SigningError(format!("Transaction truncated in {part}"))
}

// Solana "shortvec": little-endian base-128, at most three bytes.
fn decode_compact_u16(bytes: &[u8], offset: usize) -> Result<(usize, usize)> {
    let mut value = 0usize;
    for i in 0..3 {
        let byte = *bytes
            .get(offset + i)
            .ok_or_else(|| truncated("length prefix"))?;
        value |= usize::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, offset + i + 1));
        }
    }
    Err(ScannerError::SigningError("Invalid length prefix".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier};
    use tokio_test::{assert_err, assert_ok};

    fn signing_key(seed: u8) -> SigningKey {
        SigningKey::from_bytes(&[seed; 32])
    }

    // One-signer transfer-like message: header, two keys, blockhash, no instructions.
    fn unsigned_tx(payer: &[u8; 32], versioned: bool) -> Vec<u8> {
        let mut tx = vec![1u8];
        tx.extend_from_slice(&[0u8; SIGNATURE_LEN]);
        if versioned {
            tx.push(0x80);
        }
        tx.extend_from_slice(&[1, 0, 1]);
        tx.push(2);
        tx.extend_from_slice(payer);
        tx.extend_from_slice(&[9u8; 32]);
        tx.extend_from_slice(&[3u8; 32]);
        tx.push(0);
        tx
    }

    #[test]
    fn decodes_compact_u16() {
        assert_eq!(decode_compact_u16(&[0x05], 0).unwrap(), (5, 1));
        assert_eq!(decode_compact_u16(&[0x80, 0x01], 0).unwrap(), (128, 2));
        assert_eq!(decode_compact_u16(&[0xff, 0xff, 0x03], 0).unwrap(), (0xffff, 3));
        assert!(decode_compact_u16(&[0x80], 0).is_err());
    }

    #[test]
    fn signs_legacy_and_versioned_messages() {
        let key = signing_key(7);
        let wallet = KeypairWallet::from_signing_key(key.clone());
        let payer = key.verifying_key().to_bytes();

        for versioned in [false, true] {
            let raw = unsigned_tx(&payer, versioned);
            let signed = wallet.sign_transaction(&BASE64.encode(&raw)).unwrap();

            let bytes = BASE64.decode(&signed.encoded).unwrap();
            let sig_bytes: [u8; 64] = bytes[1..65].try_into().unwrap();
            let signature = Signature::from_bytes(&sig_bytes);

            assert_ok!(key.verifying_key().verify(&bytes[65..], &signature));
            assert_eq!(&bytes[65..], &raw[65..]);
            assert_eq!(signed.signature, bs58::encode(sig_bytes).into_string());
        }
    }

    #[test]
    fn refuses_transactions_for_other_signers() {
        let wallet = KeypairWallet::from_signing_key(signing_key(7));
        let other = signing_key(8).verifying_key().to_bytes();
        let raw = unsigned_tx(&other, false);
        let err = wallet.sign_transaction(&BASE64.encode(raw)).unwrap_err();
        assert!(matches!(err, ScannerError::SigningError(_)));
    }

    #[test]
    fn rejects_garbage_payloads() {
        let wallet = KeypairWallet::from_signing_key(signing_key(7));
        assert_err!(wallet.sign_transaction("not base64!"));
        assert_err!(wallet.sign_transaction(&BASE64.encode([1u8, 2, 3])));
    }

    #[test]
    fn loads_base58_keypair() {
        let key = signing_key(11);
        let encoded = bs58::encode(key.to_keypair_bytes()).into_string();
        let wallet = KeypairWallet::from_base58(&encoded).unwrap();
        assert_eq!(
            wallet.public_key(),
            bs58::encode(key.verifying_key().to_bytes()).into_string()
        );

        assert!(KeypairWallet::from_base58("abc").is_err());
    }

    #[test]
    fn watch_only_wallet_cannot_sign() {
        let wallet = WatchOnlyWallet::new("9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM").unwrap();
        assert_eq!(wallet.public_key(), "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM");
        assert!(matches!(
            wallet.sign_transaction("AQ=="),
            Err(ScannerError::SigningError(_))
        ));
    }

    #[test]
    fn from_config_checks_key_consistency() {
        let key = signing_key(3);
        let secret = bs58::encode(key.to_keypair_bytes()).into_string();

        let mismatched = WalletConfig {
            private_key: Some(secret.clone()),
            public_key: Some("9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM".to_string()),
        };
        assert!(from_config(&mismatched).is_err());

        let keyed = WalletConfig {
            private_key: Some(secret),
            public_key: None,
        };
        assert_ok!(from_config(&keyed));

        assert!(from_config(&WalletConfig::default()).is_err());
    }
}
