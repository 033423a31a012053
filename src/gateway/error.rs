use alloy::primitives::B256;
use thiserror::Error;

use crate::domain::duel::{AmountError, KeyError};
use crate::infrastructure::ethereum::TransportError;

/// Checks done locally before anything is sent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("{operation} amount must be greater than zero")]
    ZeroAmount { operation: &'static str },

    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error(transparent)]
    Key(#[from] KeyError),
}

/// Gateway operation errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Rejected by the endpoint or the transport failed
    #[error("{method} failed: {source}")]
    RemoteCall {
        method: &'static str,
        source: TransportError,
    },

    /// Included on chain but the receipt reports failure
    #[error("{method} reverted (tx {tx_hash})")]
    Reverted { method: &'static str, tx_hash: B256 },

    /// The call succeeded but its output is not what the ABI promises
    #[error("malformed response from {method}: {detail}")]
    MalformedResponse { method: &'static str, detail: String },

    #[error(transparent)]
    CallerPrecondition(#[from] PreconditionError),
}

impl GatewayError {
    /// Rejections, reverts and transport failures
    pub fn is_remote_call(&self) -> bool {
        matches!(
            self,
            GatewayError::RemoteCall { .. } | GatewayError::Reverted { .. }
        )
    }

    pub fn is_malformed_response(&self) -> bool {
        matches!(self, GatewayError::MalformedResponse { .. })
    }

    pub fn is_caller_precondition(&self) -> bool {
        matches!(self, GatewayError::CallerPrecondition(_))
    }
}

impl From<AmountError> for GatewayError {
    fn from(err: AmountError) -> Self {
        GatewayError::CallerPrecondition(err.into())
    }
}

impl From<KeyError> for GatewayError {
    fn from(err: KeyError) -> Self {
        GatewayError::CallerPrecondition(err.into())
    }
}
