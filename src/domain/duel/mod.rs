//! EnigmaDuel domain types
//!
//! Snapshots of contract state as the client sees them. Nothing here is
//! mutated locally; values are fetched, displayed and dropped.

mod amount;
mod key;

use std::fmt;

use alloy_primitives::{Address, U256};
use serde::{Serialize, Serializer};

pub use amount::{format_edt, parse_amount, AmountError, EDT_DECIMALS};
pub use key::{parse_address, GameRoomKey, KeyError};

/// Deposited EDT held by the duel contract on behalf of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Balance {
    #[serde(serialize_with = "decimal")]
    pub total: U256,
    #[serde(serialize_with = "decimal")]
    pub locked: U256,
    #[serde(serialize_with = "decimal")]
    pub available: U256,
}

impl Balance {
    /// `total == locked + available`, as the contract maintains it
    pub fn is_consistent(&self) -> bool {
        self.locked.checked_add(self.available) == Some(self.total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum GameRoomStatus {
    #[default]
    InActive,
    Finished,
    Active,
}

impl GameRoomStatus {
    pub fn title(&self) -> &'static str {
        match self {
            GameRoomStatus::InActive => "InActive",
            GameRoomStatus::Finished => "Finished",
            GameRoomStatus::Active => "Active",
        }
    }
}

impl TryFrom<u8> for GameRoomStatus {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GameRoomStatus::InActive),
            1 => Ok(GameRoomStatus::Finished),
            2 => Ok(GameRoomStatus::Active),
            other => Err(other),
        }
    }
}

impl fmt::Display for GameRoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// How a finished game was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameRoomResultStatus {
    Draw,
    Victory,
}

impl TryFrom<u8> for GameRoomResultStatus {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GameRoomResultStatus::Draw),
            1 => Ok(GameRoomResultStatus::Victory),
            other => Err(other),
        }
    }
}

impl fmt::Display for GameRoomResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameRoomResultStatus::Draw => f.write_str("Draw"),
            GameRoomResultStatus::Victory => f.write_str("Victory"),
        }
    }
}

/// A game room as stored by the duel contract.
///
/// Keys that were never used read back as the zero room: both duelists are
/// the zero address and the status is `InActive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRoom {
    pub duelist1: Address,
    pub duelist2: Address,
    #[serde(serialize_with = "decimal")]
    pub prize_pool: U256,
    pub status: GameRoomStatus,
}

impl GameRoom {
    pub fn is_vacant(&self) -> bool {
        self.duelist1 == Address::ZERO
            && self.duelist2 == Address::ZERO
            && self.status == GameRoomStatus::InActive
    }
}

/// One side of a settled game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Payout {
    pub duelist: Address,
    #[serde(serialize_with = "decimal")]
    pub received: U256,
}

/// Decoded `GameFinished` event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameSettlement {
    pub result: GameRoomResultStatus,
    #[serde(serialize_with = "decimal")]
    pub fee: U256,
    pub duelist1: Payout,
    pub duelist2: Payout,
}

/// Fee schedule and token address, read together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Overview {
    #[serde(serialize_with = "decimal")]
    pub fee: U256,
    #[serde(serialize_with = "decimal")]
    pub draw_fee: U256,
    pub token: Address,
}

// U256 serializes as hex by default; balances read better in base-10.
fn decimal<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}
