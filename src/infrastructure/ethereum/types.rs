//! Type conversions between contract bindings and domain types

use crate::domain::duel::{
    Balance, GameRoom, GameRoomResultStatus, GameRoomStatus, GameSettlement, Payout,
};
use crate::infrastructure::ethereum::contracts::IEnigmaDuel;

impl From<IEnigmaDuel::Balance> for Balance {
    fn from(raw: IEnigmaDuel::Balance) -> Self {
        Balance {
            total: raw.total,
            locked: raw.locked,
            available: raw.available,
        }
    }
}

/// Convert a raw room; `Err` carries an out-of-range status byte
pub fn convert_game_room(raw: IEnigmaDuel::GameRoom) -> Result<GameRoom, u8> {
    Ok(GameRoom {
        duelist1: raw.duelist1,
        duelist2: raw.duelist2,
        prize_pool: raw.prizePool,
        status: GameRoomStatus::try_from(raw.status)?,
    })
}

/// Convert a decoded `GameFinished` event; `Err` carries an out-of-range status byte
pub fn convert_game_finished(event: IEnigmaDuel::GameFinished) -> Result<GameSettlement, u8> {
    Ok(GameSettlement {
        result: GameRoomResultStatus::try_from(event.status)?,
        fee: event.fee,
        duelist1: Payout {
            duelist: event.duelist1,
            received: event.duelist1_received,
        },
        duelist2: Payout {
            duelist: event.duelist2,
            received: event.duelist2_received,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, U256};

    #[test]
    fn test_convert_game_room() {
        let raw = IEnigmaDuel::GameRoom {
            duelist1: Address::repeat_byte(1),
            duelist2: Address::repeat_byte(2),
            prizePool: U256::from(500u64),
            status: 2,
        };
        let room = convert_game_room(raw).unwrap();
        assert_eq!(room.status, GameRoomStatus::Active);
        assert_eq!(room.prize_pool, U256::from(500u64));

        let bad = IEnigmaDuel::GameRoom {
            duelist1: Address::ZERO,
            duelist2: Address::ZERO,
            prizePool: U256::ZERO,
            status: 9,
        };
        assert_eq!(convert_game_room(bad), Err(9));
    }

    #[test]
    fn test_convert_game_finished() {
        let event = IEnigmaDuel::GameFinished {
            status: 0,
            fee: U256::from(10u64),
            duelist1: Address::repeat_byte(1),
            duelist1_received: U256::from(45u64),
            duelist2: Address::repeat_byte(2),
            duelist2_received: U256::from(45u64),
        };
        let settlement = convert_game_finished(event).unwrap();
        assert_eq!(settlement.result, GameRoomResultStatus::Draw);
        assert_eq!(settlement.duelist2.received, U256::from(45u64));
    }
}
