//! Alloy-backed connection context
//!
//! Pairs a provider (HTTP, WebSocket or IPC) with the account that signs
//! commands. The provider is type-erased so the wallet and node-account
//! flavours share one concrete type.

use std::path::PathBuf;

use alloy::network::{EthereumWallet, ReceiptResponse};
use alloy::primitives::{Address, Bytes, B256};
use alloy::providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};

use crate::infrastructure::ethereum::transport::{
    Command, Confirmation, ContractTransport, PendingCommand, Query, TransportError,
};

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    /// HTTP JSON-RPC endpoint
    Http(String),
    /// WebSocket endpoint
    WebSocket(String),
    /// IPC socket path (Unix only)
    #[cfg(unix)]
    Ipc(PathBuf),
}

impl ProviderConfig {
    /// Get display name for this endpoint
    pub fn display(&self) -> String {
        match self {
            ProviderConfig::Http(url) => url.clone(),
            ProviderConfig::WebSocket(url) => url.clone(),
            #[cfg(unix)]
            ProviderConfig::Ipc(path) => path.display().to_string(),
        }
    }

    /// Pick HTTP or WebSocket from the URL scheme
    pub fn from_url(url: &str) -> Self {
        let url = url.trim().to_string();
        if url.starts_with("ws://") || url.starts_with("wss://") {
            ProviderConfig::WebSocket(url)
        } else {
            ProviderConfig::Http(url)
        }
    }
}

/// Who signs commands
#[derive(Clone)]
pub enum SignerConfig {
    /// Account managed by the node (`eth_sendTransaction`), e.g. an unlocked
    /// Anvil/Hardhat account
    Node { account: Address },
    /// Local key; transactions are signed client-side and sent raw
    PrivateKey(PrivateKeySigner),
}

impl SignerConfig {
    /// Read a hex private key from the named environment variable
    pub fn from_env(var: &str) -> Result<Self> {
        let raw = std::env::var(var).with_context(|| format!("{var} is not set"))?;
        let signer: PrivateKeySigner = raw
            .trim()
            .parse()
            .with_context(|| format!("{var} does not hold a valid private key"))?;
        Ok(SignerConfig::PrivateKey(signer))
    }

    pub fn address(&self) -> Address {
        match self {
            SignerConfig::Node { account } => *account,
            SignerConfig::PrivateKey(signer) => signer.address(),
        }
    }
}

impl std::fmt::Debug for SignerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        match self {
            SignerConfig::Node { account } => write!(f, "Node({account})"),
            SignerConfig::PrivateKey(signer) => write!(f, "PrivateKey({})", signer.address()),
        }
    }
}

/// A provider bound to a signing account for one session
pub struct ConnectionContext {
    provider: DynProvider,
    caller: Address,
    endpoint: String,
    confirmations: u64,
}

impl ConnectionContext {
    /// Connect to `config` with `signer` as the calling account
    pub async fn connect(
        config: ProviderConfig,
        signer: SignerConfig,
        confirmations: u64,
    ) -> Result<Self> {
        let caller = signer.address();
        let endpoint = config.display();

        let provider = match signer {
            SignerConfig::Node { .. } => connect_plain(config).await?,
            SignerConfig::PrivateKey(key) => {
                connect_with_wallet(config, EthereumWallet::from(key)).await?
            }
        };

        tracing::info!(%endpoint, %caller, "connection context ready");

        Ok(Self {
            provider,
            caller,
            endpoint,
            confirmations: confirmations.max(1),
        })
    }

    /// Accounts exposed by the node, used when no signer was configured
    pub async fn node_accounts(config: ProviderConfig) -> Result<Vec<Address>> {
        let provider = connect_plain(config).await?;
        provider
            .get_accounts()
            .await
            .context("eth_accounts failed")
    }

    /// Wrap an already-built provider
    #[cfg(test)]
    fn from_provider(provider: DynProvider, caller: Address) -> Self {
        Self {
            provider,
            caller,
            endpoint: "mock".to_string(),
            confirmations: 1,
        }
    }

    fn request(&self, to: Address, calldata: Bytes) -> TransactionRequest {
        TransactionRequest::default()
            .from(self.caller)
            .to(to)
            .input(calldata.into())
    }
}

async fn connect_plain(config: ProviderConfig) -> Result<DynProvider> {
    match config {
        ProviderConfig::Http(url) => {
            let rpc_url = url.parse().context("Invalid HTTP URL")?;
            Ok(ProviderBuilder::new().connect_http(rpc_url).erased())
        }
        ProviderConfig::WebSocket(url) => {
            let provider = ProviderBuilder::new()
                .connect(&url)
                .await
                .context("Failed to create WebSocket provider")?;
            Ok(provider.erased())
        }
        #[cfg(unix)]
        ProviderConfig::Ipc(path) => {
            use alloy::providers::IpcConnect;
            let ipc = IpcConnect::new(path.to_string_lossy().to_string());
            let provider = ProviderBuilder::new()
                .connect_ipc(ipc)
                .await
                .context("Failed to create IPC provider")?;
            Ok(provider.erased())
        }
    }
}

async fn connect_with_wallet(config: ProviderConfig, wallet: EthereumWallet) -> Result<DynProvider> {
    match config {
        ProviderConfig::Http(url) => {
            let rpc_url = url.parse().context("Invalid HTTP URL")?;
            Ok(ProviderBuilder::new()
                .wallet(wallet)
                .connect_http(rpc_url)
                .erased())
        }
        ProviderConfig::WebSocket(url) => {
            let provider = ProviderBuilder::new()
                .wallet(wallet)
                .connect(&url)
                .await
                .context("Failed to create WebSocket provider")?;
            Ok(provider.erased())
        }
        #[cfg(unix)]
        ProviderConfig::Ipc(path) => {
            use alloy::providers::IpcConnect;
            let ipc = IpcConnect::new(path.to_string_lossy().to_string());
            let provider = ProviderBuilder::new()
                .wallet(wallet)
                .connect_ipc(ipc)
                .await
                .context("Failed to create IPC provider")?;
            Ok(provider.erased())
        }
    }
}

#[async_trait::async_trait]
impl ContractTransport for ConnectionContext {
    fn caller(&self) -> Address {
        self.caller
    }

    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    async fn query(&self, query: Query) -> Result<Bytes, TransportError> {
        let request = self.request(query.to, query.calldata);
        self.provider
            .call(request)
            .await
            .map_err(|err| TransportError::Rpc(err.to_string()))
    }

    async fn submit(&self, command: Command) -> Result<PendingCommand, TransportError> {
        let request = self.request(command.to, command.calldata);
        let pending = self
            .provider
            .send_transaction(request)
            .await
            .map_err(|err| TransportError::Rejected(err.to_string()))?;
        let tx_hash = *pending.tx_hash();
        tracing::debug!(%tx_hash, "command submitted");
        Ok(PendingCommand { tx_hash })
    }

    async fn confirm(&self, pending: PendingCommand) -> Result<Confirmation, TransportError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), pending.tx_hash)
            .with_required_confirmations(self.confirmations)
            .get_receipt()
            .await
            .map_err(|err| TransportError::Confirmation {
                tx_hash: pending.tx_hash,
                reason: err.to_string(),
            })?;
        Ok(confirmation_from(&receipt))
    }

    async fn receipt(&self, tx_hash: B256) -> Result<Option<Confirmation>, TransportError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|err| TransportError::Rpc(err.to_string()))?;
        Ok(receipt.as_ref().map(confirmation_from))
    }
}

fn confirmation_from(receipt: &TransactionReceipt) -> Confirmation {
    let logs = receipt
        .inner
        .logs()
        .iter()
        .map(|log| log.inner.clone())
        .collect();

    Confirmation {
        tx_hash: receipt.transaction_hash,
        success: receipt.status(),
        logs,
    }
}
