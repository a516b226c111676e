/*
 * Sequential submission of built swap transactions
 */

use crate::confirmation::ConfirmationWatcher;
use crate::models::{ConfirmationResult, Result, ScannerError, TransactionKind, TransactionSet};
use crate::wallet::Wallet;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Broadcasts a signed transaction and returns the signature the ledger
/// will index it under.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    async fn submit(&self, signed_tx: &str) -> Result<String>;
}

/// A step that did not confirm, together with the steps before it that did.
/// Those earlier transactions are on the ledger and must stay visible.
#[derive(Debug)]
pub struct ExecutionFailure {
    pub completed: Vec<ConfirmationResult>,
    pub error: ScannerError,
}

pub struct SwapExecutor {
    wallet: Arc<dyn Wallet>,
    submitter: Arc<dyn TransactionSubmitter>,
    watcher: ConfirmationWatcher,
}

impl SwapExecutor {
    #[must_use]
    pub fn new(
        wallet: Arc<dyn Wallet>,
        submitter: Arc<dyn TransactionSubmitter>,
        watcher: ConfirmationWatcher,
    ) -> Self {
        Self {
            wallet,
            submitter,
            watcher,
        }
    }

    /// Signs, sends and confirms setup, swap and cleanup in that order.
    /// The first step that does not confirm aborts the remaining ones.
    pub async fn execute(
        &self,
        set: &TransactionSet,
    ) -> std::result::Result<Vec<ConfirmationResult>, ExecutionFailure> {
        let mut completed = Vec::with_capacity(set.len());

        for (kind, payload) in set.ordered() {
            match self.execute_step(kind, payload).await {
                Ok(confirmation) => completed.push(confirmation),
                Err(error) => return Err(ExecutionFailure { completed, error }),
            }
        }

        Ok(completed)
    }

    async fn execute_step(&self, kind: TransactionKind, payload: &str) -> Result<ConfirmationResult> {
        let signed = self.wallet.sign_transaction(payload)?;
        let accepted = self.submitter.submit(&signed.encoded).await?;
        if accepted != signed.signature {
            warn!(%kind, expected = %signed.signature, %accepted, "Ledger returned an unexpected signature");
        }
        info!(%kind, signature = %signed.signature, "Transaction submitted");

        self.watcher.confirm(&signed.signature).await.into_result()
    }
}
