//! Ethereum infrastructure - contract bindings, transport, Alloy provider

pub mod abi;
pub mod contracts;
mod provider;
pub mod transport;
pub(crate) mod types;

pub use abi::BalanceEvent;
pub use provider::{ConnectionContext, ProviderConfig, SignerConfig};
pub use transport::{
    Command, Confirmation, ContractTransport, PendingCommand, Query, TransportError,
};
