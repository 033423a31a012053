//! Game room keys and address text

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{keccak256, Address, B256};
use alloy_sol_types::SolValue;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("game room key must be 32 bytes of hex (got {0} bytes)")]
    Length(usize),

    #[error("invalid hex: {0}")]
    Hex(String),

    #[error("invalid address: {0}")]
    Address(String),
}

/// `bytes32` identifier of a game room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameRoomKey(B256);

impl GameRoomKey {
    pub fn new(bytes: B256) -> Self {
        Self(bytes)
    }

    /// The key the duel contract assigns to a room opened for this pair:
    /// `keccak256(abi.encode(duelist1, duelist2))`. Order matters.
    pub fn for_duelists(duelist1: Address, duelist2: Address) -> Self {
        Self(keccak256((duelist1, duelist2).abi_encode()))
    }

    pub fn as_b256(&self) -> B256 {
        self.0
    }
}

impl FromStr for GameRoomKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let payload = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes = hex::decode(payload).map_err(|err| KeyError::Hex(err.to_string()))?;
        if bytes.len() != 32 {
            return Err(KeyError::Length(bytes.len()));
        }
        Ok(Self(B256::from_slice(&bytes)))
    }
}

impl fmt::Display for GameRoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Parse a hex address; checksum casing is not enforced
pub fn parse_address(s: &str) -> Result<Address, KeyError> {
    let trimmed = s.trim();
    let normalized = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if normalized.len() != 40 {
        return Err(KeyError::Address(trimmed.to_string()));
    }
    let bytes = hex::decode(normalized).map_err(|_| KeyError::Address(trimmed.to_string()))?;
    Ok(Address::from_slice(&bytes))
}
