//! Client for the EnigmaDuel contracts
//!
//! [`gateway::DuelGateway`] wraps the duel and EDT token contracts behind
//! typed operations. Everything chain-specific stays behind
//! [`infrastructure::ethereum::ContractTransport`].

pub mod config;
pub mod domain;
pub mod gateway;
pub mod infrastructure;

pub use domain::duel::{Balance, GameRoom, GameRoomKey, GameRoomResultStatus, GameRoomStatus};
pub use gateway::{Deployment, DuelGateway, GatewayError};
