//! Contract execution across wallets.
//!
//! `ContractExecutor` owns the RPC client, builder, waiter and view caller
//! for one endpoint. Its three entry points are `build_and_submit`,
//! `view_call` and `wait_for_confirmation`; `run_on_wallets` drives them
//! for a wallet list.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tracing::Instrument;

use crate::blockchain::client::RpcClient;
use crate::blockchain::confirmation::ConfirmationWaiter;
use crate::blockchain::contract::{ContractMethod, MethodKind};
use crate::blockchain::transaction::{Clock, SystemClock, TxBuilder};
use crate::blockchain::types::{ClientError, ClientResult, WaitOutcome};
use crate::blockchain::view::ViewCaller;
use crate::blockchain::wallet::Wallet;
use crate::config::ClientConfig;
use crate::lifecycle::Shutdown;

/// What happened for one wallet.
#[derive(Debug)]
pub enum WalletOutcome {
    /// View call result (`None` when the ledger reported no result).
    Viewed(Option<String>),
    /// Transaction accepted by the RPC.
    Submitted {
        tx_hash: String,
        /// `None` when confirmation was not requested.
        confirmation: Option<WaitOutcome>,
    },
    Failed(ClientError),
    /// Not attempted (unknown method kind, shutdown in progress).
    Skipped(String),
}

#[derive(Debug)]
pub struct WalletReport {
    pub address: String,
    pub outcome: WalletOutcome,
}

/// Whether a call waits for confirmation after submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmMode {
    Skip,
    Wait,
}

#[derive(Clone)]
pub struct ContractExecutor {
    client: RpcClient,
    builder: TxBuilder,
    waiter: ConfirmationWaiter,
    viewer: ViewCaller,
    confirmation_timeout: Duration,
    max_concurrent_wallets: usize,
}

impl ContractExecutor {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = RpcClient::new(&config.rpc, &config.retries)?;
        Ok(Self::from_parts(
            client,
            Arc::new(SystemClock),
            Duration::from_secs(config.confirmation.poll_interval_secs),
            Duration::from_secs(config.confirmation.timeout_secs),
            config.execution.max_concurrent_wallets,
        ))
    }

    pub fn from_parts(
        client: RpcClient,
        clock: Arc<dyn Clock>,
        poll_interval: Duration,
        confirmation_timeout: Duration,
        max_concurrent_wallets: usize,
    ) -> Self {
        Self {
            builder: TxBuilder::with_clock(client.clone(), clock),
            waiter: ConfirmationWaiter::new(client.clone(), poll_interval),
            viewer: ViewCaller::new(client.clone()),
            client,
            confirmation_timeout,
            max_concurrent_wallets: max_concurrent_wallets.max(1),
        }
    }

    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    /// Fetch nonce, sign and submit one contract call for `wallet`.
    ///
    /// The wallet's submission lock is held from the nonce fetch until the
    /// RPC has answered, so no other submission for the same wallet can
    /// observe the same nonce in between.
    pub async fn build_and_submit(
        &self,
        wallet: &Wallet,
        contract: &str,
        method: &str,
        params: &[String],
    ) -> ClientResult<String> {
        let _guard = wallet.lock_submissions().await;

        let payload = self.builder.build(wallet, contract, method, params).await?;
        let nonce = payload.transaction.nonce;

        let tx_hash = self
            .builder
            .submit(&payload)
            .await
            .map_err(|e| ClientError::Submission {
                address: wallet.address().to_string(),
                source: Box::new(e),
            })?;

        wallet.record_submitted_nonce(nonce);
        tracing::info!(address = %wallet.address(), nonce, tx_hash = %tx_hash, method, "Transaction submitted");
        Ok(tx_hash)
    }

    pub async fn view_call(
        &self,
        contract: &str,
        method: &str,
        params: &[String],
        caller: &str,
    ) -> ClientResult<Option<String>> {
        self.viewer.call(contract, method, params, caller).await
    }

    /// Wait for confirmation with the configured deadline.
    pub async fn wait_for_confirmation(&self, tx_hash: &str) -> bool {
        self.waiter.wait(tx_hash, self.confirmation_timeout).await
    }

    pub async fn wait_for_confirmation_cancellable(
        &self,
        tx_hash: &str,
        shutdown: &Shutdown,
    ) -> WaitOutcome {
        self.waiter
            .wait_cancellable(tx_hash, self.confirmation_timeout, shutdown)
            .await
    }

    /// Run `method` for every wallet, reporting in wallet order.
    ///
    /// Up to `max_concurrent_wallets` wallets run at once; each wallet's own
    /// steps stay sequential. A failing wallet does not stop the others.
    pub async fn run_on_wallets(
        &self,
        wallets: &[Wallet],
        contract: &str,
        method: &ContractMethod,
        params: &[String],
        confirm: ConfirmMode,
        shutdown: &Shutdown,
    ) -> Vec<WalletReport> {
        stream::iter(wallets)
            .map(|wallet| {
                let span = tracing::info_span!("wallet", address = %wallet.short_address());
                async move {
                    let outcome = self
                        .run_for_wallet(wallet, contract, method, params, confirm, shutdown)
                        .await;
                    WalletReport {
                        address: wallet.address().to_string(),
                        outcome,
                    }
                }
                .instrument(span)
            })
            .buffered(self.max_concurrent_wallets)
            .collect::<Vec<_>>()
            .await
    }

    async fn run_for_wallet(
        &self,
        wallet: &Wallet,
        contract: &str,
        method: &ContractMethod,
        params: &[String],
        confirm: ConfirmMode,
        shutdown: &Shutdown,
    ) -> WalletOutcome {
        if shutdown.is_triggered() {
            return WalletOutcome::Skipped("shutdown in progress".to_string());
        }

        match &method.kind {
            MethodKind::View => {
                match self.view_call(contract, &method.name, params, wallet.address()).await {
                    Ok(result) => WalletOutcome::Viewed(result),
                    Err(e) => {
                        tracing::warn!(address = %wallet.address(), error = %e, "View call failed");
                        WalletOutcome::Failed(e)
                    }
                }
            }
            MethodKind::Call => {
                let tx_hash = match self.build_and_submit(wallet, contract, &method.name, params).await {
                    Ok(tx_hash) => tx_hash,
                    Err(e) => {
                        tracing::error!(address = %wallet.address(), error = %e, "Contract call failed");
                        return WalletOutcome::Failed(e);
                    }
                };

                let confirmation = match confirm {
                    ConfirmMode::Skip => None,
                    ConfirmMode::Wait => {
                        Some(self.wait_for_confirmation_cancellable(&tx_hash, shutdown).await)
                    }
                };
                WalletOutcome::Submitted {
                    tx_hash,
                    confirmation,
                }
            }
            MethodKind::Unknown(kind) => {
                tracing::warn!(method = %method.name, kind = %kind, "Unknown method type");
                WalletOutcome::Skipped(format!("unknown method type '{}'", kind))
            }
        }
    }
}
