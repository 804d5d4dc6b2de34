use alloy::primitives::{Address, TxHash};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::chains::ChainDescriptor;

/// Terminal state of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Success,
    Reverted,
    /// The endpoint reported something other than success or revert.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Success,
    Reverted,
}

/// Outcome of a completed ownership transfer attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub status: TransferStatus,
    pub message: &'static str,
    pub hash: TxHash,
}

impl TransferOutcome {
    fn confirmed(hash: TxHash) -> Self {
        Self {
            status: TransferStatus::Success,
            message: "Transaction made successfully.",
            hash,
        }
    }

    fn reverted(hash: TxHash) -> Self {
        Self {
            status: TransferStatus::Reverted,
            message: "Execution reverted.",
            hash,
        }
    }
}

/// Progress channel carrying the hash of the transaction currently awaiting
/// its receipt, or `None` when nothing is pending. Observers (a spinner, a
/// log line) subscribe to the receiver side.
pub type PendingTxSender = watch::Sender<Option<TxHash>>;

pub fn pending_tx_channel() -> (PendingTxSender, watch::Receiver<Option<TxHash>>) {
    watch::channel(None)
}

/// The ownership contract operations the transfer sequence relies on.
/// Submissions return the transaction hash when the signer produced one.
#[async_trait]
pub trait OwnershipContract {
    async fn is_admin(&self, account: Address) -> Result<bool>;
    async fn add_admin(&self, account: Address) -> Result<Option<TxHash>>;
    async fn transfer_ownership(&self, new_owner: Address) -> Result<Option<TxHash>>;
    async fn receipt_status(&self, hash: TxHash) -> Result<ReceiptStatus>;
}

/// Make `target` the owner of the contract, granting it admin rights first
/// if it has none.
///
/// The two steps are strictly ordered: the ownership transfer is not
/// submitted until the admin grant's receipt has resolved. A grant failure
/// whose message contains "Admin already exists" is a benign race with a
/// concurrent grant and the sequence proceeds; any other failure aborts.
///
/// Returns `Ok(None)` when nothing happened: the wallet-backed contract
/// client or the chain context is missing, the signer produced no
/// transaction handle, or the receipt carried an unknown status. Errors are
/// returned as values and never panic.
pub async fn transfer_owner<C>(
    contract: Option<&C>,
    chain: Option<&ChainDescriptor>,
    target: Address,
    pending: &PendingTxSender,
) -> Result<Option<TransferOutcome>>
where
    C: OwnershipContract + Sync,
{
    let (Some(contract), Some(chain)) = (contract, chain) else {
        debug!("wallet client or chain context missing, ownership transfer skipped");
        return Ok(None);
    };
    debug!(chain_id = chain.id, target = %target, "starting ownership transfer");

    if !contract.is_admin(target).await.context("isAdmin query failed")? {
        if let Err(e) = grant_admin(contract, target).await {
            if e.to_string().contains("Admin already exists") {
                warn!("admin grant raced with an existing grant: {e:#}");
            } else {
                return Err(e.context("admin grant failed"));
            }
        }
    }

    let submitted = contract
        .transfer_ownership(target)
        .await
        .context("transferOwnership submission failed")?;
    let Some(hash) = submitted else {
        return Ok(None);
    };

    let _ = pending.send(Some(hash));
    let status = contract.receipt_status(hash).await;
    let _ = pending.send(None);

    match status.context("transferOwnership receipt wait failed")? {
        ReceiptStatus::Success => Ok(Some(TransferOutcome::confirmed(hash))),
        ReceiptStatus::Reverted => Ok(Some(TransferOutcome::reverted(hash))),
        ReceiptStatus::Unknown => Ok(None),
    }
}

/// Submit `addAdmin` and wait for its receipt. The receipt's status is not
/// inspected; only the ownership-transfer receipt decides the outcome.
async fn grant_admin<C>(contract: &C, account: Address) -> Result<()>
where
    C: OwnershipContract + Sync,
{
    if let Some(hash) = contract.add_admin(account).await? {
        contract.receipt_status(hash).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;

    struct MockContract {
        admin: bool,
        add_admin_error: Option<String>,
        transfer_hash: Option<TxHash>,
        receipt: ReceiptStatus,
        calls: Mutex<Vec<String>>,
    }

    impl MockContract {
        fn new() -> Self {
            Self {
                admin: false,
                add_admin_error: None,
                transfer_hash: Some(tx_hash(1)),
                receipt: ReceiptStatus::Success,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OwnershipContract for MockContract {
        async fn is_admin(&self, _account: Address) -> Result<bool> {
            self.record("isAdmin");
            Ok(self.admin)
        }

        async fn add_admin(&self, _account: Address) -> Result<Option<TxHash>> {
            self.record("addAdmin");
            match &self.add_admin_error {
                Some(message) => Err(anyhow!(message.clone())),
                None => Ok(Some(tx_hash(2))),
            }
        }

        async fn transfer_ownership(&self, _new_owner: Address) -> Result<Option<TxHash>> {
            self.record("transferOwnership");
            Ok(self.transfer_hash)
        }

        async fn receipt_status(&self, _hash: TxHash) -> Result<ReceiptStatus> {
            self.record("receipt");
            Ok(self.receipt)
        }
    }

    fn tx_hash(byte: u8) -> TxHash {
        TxHash::repeat_byte(byte)
    }

    fn target() -> Address {
        Address::repeat_byte(0x42)
    }

    fn chain() -> ChainDescriptor {
        ChainDescriptor::custom(1, "https://cloudflare-eth.com")
    }

    #[tokio::test]
    async fn skips_admin_grant_when_target_is_already_admin() {
        let mock = MockContract {
            admin: true,
            ..MockContract::new()
        };
        let (pending, _rx) = pending_tx_channel();

        let outcome = transfer_owner(Some(&mock), Some(&chain()), target(), &pending)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.status, TransferStatus::Success);
        assert_eq!(outcome.message, "Transaction made successfully.");
        assert_eq!(outcome.hash, tx_hash(1));
        assert_eq!(mock.calls(), ["isAdmin", "transferOwnership", "receipt"]);
    }

    #[tokio::test]
    async fn grants_admin_and_waits_before_transferring() {
        let mock = MockContract::new();
        let (pending, _rx) = pending_tx_channel();

        let outcome = transfer_owner(Some(&mock), Some(&chain()), target(), &pending)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.status, TransferStatus::Success);
        assert_eq!(
            mock.calls(),
            ["isAdmin", "addAdmin", "receipt", "transferOwnership", "receipt"]
        );
    }

    #[tokio::test]
    async fn reverted_transfer_maps_to_reverted_and_clears_pending() {
        let mock = MockContract {
            admin: true,
            receipt: ReceiptStatus::Reverted,
            ..MockContract::new()
        };
        let (pending, rx) = pending_tx_channel();

        let outcome = transfer_owner(Some(&mock), Some(&chain()), target(), &pending)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.status, TransferStatus::Reverted);
        assert_eq!(outcome.message, "Execution reverted.");
        assert_eq!(outcome.hash, tx_hash(1));
        assert!(rx.borrow().is_none());
    }

    #[tokio::test]
    async fn missing_wallet_or_chain_skips_without_network_calls() {
        let mock = MockContract::new();
        let (pending, _rx) = pending_tx_channel();

        let no_wallet =
            transfer_owner(None::<&MockContract>, Some(&chain()), target(), &pending)
                .await
                .unwrap();
        assert!(no_wallet.is_none());

        let no_chain = transfer_owner(Some(&mock), None, target(), &pending)
            .await
            .unwrap();
        assert!(no_chain.is_none());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn tolerates_a_raced_admin_grant() {
        let mock = MockContract {
            add_admin_error: Some("execution reverted: Admin already exists".to_string()),
            ..MockContract::new()
        };
        let (pending, _rx) = pending_tx_channel();

        let outcome = transfer_owner(Some(&mock), Some(&chain()), target(), &pending)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.status, TransferStatus::Success);
        assert_eq!(
            mock.calls(),
            ["isAdmin", "addAdmin", "transferOwnership", "receipt"]
        );
    }

    #[tokio::test]
    async fn aborts_on_any_other_admin_grant_failure() {
        let mock = MockContract {
            add_admin_error: Some("insufficient funds for gas".to_string()),
            ..MockContract::new()
        };
        let (pending, rx) = pending_tx_channel();

        let result = transfer_owner(Some(&mock), Some(&chain()), target(), &pending).await;

        assert!(result.is_err());
        assert!(!mock.calls().iter().any(|call| call == "transferOwnership"));
        assert!(rx.borrow().is_none());
    }

    #[tokio::test]
    async fn missing_transaction_handle_yields_no_outcome() {
        let mock = MockContract {
            admin: true,
            transfer_hash: None,
            ..MockContract::new()
        };
        let (pending, rx) = pending_tx_channel();

        let outcome = transfer_owner(Some(&mock), Some(&chain()), target(), &pending)
            .await
            .unwrap();

        assert!(outcome.is_none());
        assert!(rx.borrow().is_none());
    }

    #[tokio::test]
    async fn unknown_receipt_status_yields_no_outcome() {
        let mock = MockContract {
            admin: true,
            receipt: ReceiptStatus::Unknown,
            ..MockContract::new()
        };
        let (pending, rx) = pending_tx_channel();

        let outcome = transfer_owner(Some(&mock), Some(&chain()), target(), &pending)
            .await
            .unwrap();

        assert!(outcome.is_none());
        assert!(rx.borrow().is_none());
    }
}
