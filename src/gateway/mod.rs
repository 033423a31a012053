//! Remote contract gateway
//!
//! [`DuelGateway`] is the only place that knows how EnigmaDuel operations map
//! onto contract calls. It binds two handles, one for the duel proxy and one
//! for the EDT token, to a single connection context. Build one gateway per
//! signer; handles are plain owned values, so any number of gateways can
//! coexist.
//!
//! State-changing operations return only after their commands are confirmed.
//! Nothing is retried here: a failed round trip is reported to the caller
//! as-is.

mod error;

use std::sync::Arc;

use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::{SolCall, SolEvent};

use crate::domain::duel::{Balance, GameRoom, GameRoomKey, GameSettlement, Overview};
use crate::infrastructure::ethereum::contracts::{IEnigmaDuel, IEDT};
use crate::infrastructure::ethereum::types::{convert_game_finished, convert_game_room};
use crate::infrastructure::ethereum::{
    BalanceEvent, Command, Confirmation, ContractTransport, Query, TransportError,
};

pub use error::{GatewayError, PreconditionError};

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Deployed contract addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    /// EnigmaDuel proxy
    pub duel: Address,
    /// EDT token
    pub token: Address,
}

/// A contract address bound to a transport
pub struct ContractHandle<T: ?Sized> {
    address: Address,
    transport: Arc<T>,
}

impl<T: ContractTransport + ?Sized> ContractHandle<T> {
    pub fn new(address: Address, transport: Arc<T>) -> Self {
        Self { address, transport }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Read-only call, decoded into the method's return type
    pub async fn query<C: SolCall>(&self, call: C) -> Result<C::Return> {
        let method = C::SIGNATURE;
        tracing::debug!(method, to = %self.address, "query");

        let data = self
            .transport
            .query(Query {
                to: self.address,
                calldata: call.abi_encode().into(),
            })
            .await
            .map_err(|source| GatewayError::RemoteCall { method, source })?;

        C::abi_decode_returns(&data).map_err(|err| GatewayError::MalformedResponse {
            method,
            detail: err.to_string(),
        })
    }

    /// Submit a command and wait until it is confirmed successfully
    pub async fn execute<C: SolCall>(&self, call: C) -> Result<Confirmation> {
        let method = C::SIGNATURE;

        let pending = self
            .transport
            .submit(Command {
                to: self.address,
                calldata: call.abi_encode().into(),
            })
            .await
            .map_err(|source| GatewayError::RemoteCall { method, source })?;
        tracing::debug!(method, tx_hash = %pending.tx_hash, "submitted");

        let confirmation = self
            .transport
            .confirm(pending)
            .await
            .map_err(|source| GatewayError::RemoteCall { method, source })?;

        if !confirmation.success {
            return Err(GatewayError::Reverted {
                method,
                tx_hash: confirmation.tx_hash,
            });
        }
        tracing::debug!(method, tx_hash = %confirmation.tx_hash, "confirmed");
        Ok(confirmation)
    }

    /// First event of type `E` emitted by this contract
    fn find_event<E: SolEvent>(&self, confirmation: &Confirmation) -> Option<E> {
        confirmation
            .logs
            .iter()
            .filter(|log| log.address == self.address)
            .find_map(|log| E::decode_log_data(&log.data).ok())
    }
}

/// Typed access to the EnigmaDuel contracts for one signer
pub struct DuelGateway<T: ?Sized> {
    transport: Arc<T>,
    duel: ContractHandle<T>,
    token: ContractHandle<T>,
    withdrawal: BalanceEvent,
}

impl<T: ContractTransport + ?Sized> DuelGateway<T> {
    pub fn new(transport: Arc<T>, deployment: Deployment) -> Self {
        Self {
            duel: ContractHandle::new(deployment.duel, Arc::clone(&transport)),
            token: ContractHandle::new(deployment.token, Arc::clone(&transport)),
            transport,
            withdrawal: BalanceEvent::default(),
        }
    }

    /// Read withdrawal results from `event` instead of `EDTWithdrawn`
    pub fn with_withdrawal_event(mut self, event: BalanceEvent) -> Self {
        self.withdrawal = event;
        self
    }

    /// The signing account
    pub fn caller(&self) -> Address {
        self.transport.caller()
    }

    pub fn endpoint(&self) -> String {
        self.transport.endpoint()
    }

    pub fn withdrawal_event(&self) -> &BalanceEvent {
        &self.withdrawal
    }

    pub fn deployment(&self) -> Deployment {
        Deployment {
            duel: self.duel.address(),
            token: self.token.address(),
        }
    }

    /// Approve the duel contract for `amount`, deposit it, and return the
    /// caller's new available balance.
    ///
    /// If the deposit fails after the approval was confirmed, the approval
    /// stays granted and the operation still fails. Calling again is safe.
    pub async fn deposit_edt(&self, amount: U256) -> Result<U256> {
        require_positive(amount, "deposit")?;
        tracing::info!(%amount, caller = %self.caller(), "depositing EDT");

        self.token
            .execute(IEDT::approveCall {
                spender: self.duel.address(),
                amount,
            })
            .await?;
        tracing::info!(%amount, spender = %self.duel.address(), "approval confirmed");

        self.duel
            .execute(IEnigmaDuel::depositEDTCall { _amount: amount })
            .await?;

        let balance = self.caller_balance().await?;
        tracing::info!(available = %balance.available, "deposit confirmed");
        Ok(balance.available)
    }

    /// Withdraw `amount` and return the new balance reported by the
    /// contract's withdrawal event
    pub async fn withdraw_edt(&self, amount: U256) -> Result<U256> {
        require_positive(amount, "withdraw")?;
        tracing::info!(%amount, caller = %self.caller(), "withdrawing EDT");

        let confirmation = self
            .duel
            .execute(IEnigmaDuel::withdrawEDTCall { _amount: amount })
            .await?;

        let new_balance = self
            .withdrawal
            .find(&confirmation, self.duel.address())
            .ok_or_else(|| GatewayError::MalformedResponse {
                method: IEnigmaDuel::withdrawEDTCall::SIGNATURE,
                detail: format!(
                    "no {} event in tx {}",
                    self.withdrawal.signature(),
                    confirmation.tx_hash
                ),
            })?;

        tracing::info!(%new_balance, "withdrawal confirmed");
        Ok(new_balance)
    }

    pub async fn user_balance(&self, user: Address) -> Result<Balance> {
        let raw = self
            .duel
            .query(IEnigmaDuel::getUserbalanceCall { _user: user })
            .await?;
        Ok(raw.into())
    }

    pub async fn caller_balance(&self) -> Result<Balance> {
        self.user_balance(self.caller()).await
    }

    /// EDT held in the owner's wallet, outside the duel contract
    pub async fn token_balance(&self, owner: Address) -> Result<U256> {
        self.token.query(IEDT::balanceOfCall { account: owner }).await
    }

    /// Unknown keys return the zero room rather than an error
    pub async fn game_room(&self, key: GameRoomKey) -> Result<GameRoom> {
        let raw = self
            .duel
            .query(IEnigmaDuel::getGameRoomCall {
                _gameRoomKey: key.as_b256(),
            })
            .await?;
        convert_game_room(raw).map_err(|status| GatewayError::MalformedResponse {
            method: IEnigmaDuel::getGameRoomCall::SIGNATURE,
            detail: format!("unknown game room status {status}"),
        })
    }

    /// Victory fee
    pub async fn fee(&self) -> Result<U256> {
        self.duel.query(IEnigmaDuel::getFEECall {}).await
    }

    pub async fn draw_fee(&self) -> Result<U256> {
        self.duel.query(IEnigmaDuel::getDRAW_FEECall {}).await
    }

    /// Address of the EDT token the duel contract accepts
    pub async fn edt(&self) -> Result<Address> {
        self.duel.query(IEnigmaDuel::getEDTCall {}).await
    }

    /// Fees and token address, fetched concurrently
    pub async fn overview(&self) -> Result<Overview> {
        let (fee, draw_fee, token) = futures::try_join!(self.fee(), self.draw_fee(), self.edt())?;
        Ok(Overview {
            fee,
            draw_fee,
            token,
        })
    }

    /// Outcome of a game-finishing transaction sent by the game server
    pub async fn settlement(&self, tx_hash: B256) -> Result<GameSettlement> {
        const METHOD: &str = "finishGameRoom";

        let confirmation = self
            .transport
            .receipt(tx_hash)
            .await
            .and_then(|receipt| receipt.ok_or(TransportError::UnknownTransaction(tx_hash)))
            .map_err(|source| GatewayError::RemoteCall {
                method: METHOD,
                source,
            })?;
        if !confirmation.success {
            return Err(GatewayError::Reverted {
                method: METHOD,
                tx_hash,
            });
        }

        let event = self
            .duel
            .find_event::<IEnigmaDuel::GameFinished>(&confirmation)
            .ok_or_else(|| GatewayError::MalformedResponse {
                method: METHOD,
                detail: format!("no GameFinished event in tx {tx_hash}"),
            })?;
        convert_game_finished(event).map_err(|status| GatewayError::MalformedResponse {
            method: METHOD,
            detail: format!("unknown result status {status}"),
        })
    }
}

fn require_positive(amount: U256, operation: &'static str) -> Result<()> {
    if amount.is_zero() {
        return Err(PreconditionError::ZeroAmount { operation }.into());
    }
    Ok(())
}
