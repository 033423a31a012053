//! Contract transport abstraction
//!
//! The gateway speaks two request shapes. A [`Query`] is a read-only
//! `eth_call` answered in one round trip. A [`Command`] changes state: it is
//! submitted, which yields a [`PendingCommand`], and then confirmed, which
//! waits for the ledger to include it and yields a [`Confirmation`].
//! [`ContractTransport::receipt`] looks an already-mined transaction up
//! once, without waiting.

use alloy::primitives::{Address, Bytes, Log, B256};
use thiserror::Error;

/// Read-only contract call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub to: Address,
    pub calldata: Bytes,
}

/// State-changing contract call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub to: Address,
    pub calldata: Bytes,
}

/// A command accepted by the endpoint but not yet confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCommand {
    pub tx_hash: B256,
}

/// Outcome of a confirmed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: B256,
    /// Receipt status; `false` means the call reverted on chain
    pub success: bool,
    pub logs: Vec<Log>,
}

/// Transport layer errors
#[derive(Debug, Error)]
pub enum TransportError {
    /// Endpoint unreachable, RPC error, or `eth_call` revert
    #[error("rpc error: {0}")]
    Rpc(String),

    /// The endpoint refused the command (estimation revert, signer refusal, ...)
    #[error("command rejected: {0}")]
    Rejected(String),

    /// Waiting for the receipt failed
    #[error("confirmation failed for {tx_hash}: {reason}")]
    Confirmation { tx_hash: B256, reason: String },

    /// No receipt exists for the hash (never sent, still pending, or dropped)
    #[error("no receipt for transaction {0}")]
    UnknownTransaction(B256),
}

/// The query/command interface a connection context provides.
///
/// One implementation talks to a live node; tests provide an in-memory
/// ledger.
#[async_trait::async_trait]
pub trait ContractTransport: Send + Sync + 'static {
    /// Address that signs commands and is used as `from` for queries
    fn caller(&self) -> Address;

    /// Endpoint display name
    fn endpoint(&self) -> String;

    async fn query(&self, query: Query) -> Result<Bytes, TransportError>;

    async fn submit(&self, command: Command) -> Result<PendingCommand, TransportError>;

    async fn confirm(&self, pending: PendingCommand) -> Result<Confirmation, TransportError>;

    /// Receipt of a mined transaction; `None` when the endpoint does not
    /// know the hash
    async fn receipt(&self, tx_hash: B256) -> Result<Option<Confirmation>, TransportError>;
}
