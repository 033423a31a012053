//! In-memory EnigmaDuel ledger used as a contract transport in tests
//!
//! It understands just enough of the duel proxy and the EDT token to model
//! approve/deposit/withdraw accounting, fee reads and game rooms. Several
//! transports (one per caller) can share one ledger.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::{keccak256, Address, Bytes, Log, LogData, B256, U256};
use alloy::sol_types::{SolEvent, SolInterface, SolValue};

use enigma_duel::infrastructure::ethereum::contracts::{
    IEnigmaDuel::{self, IEnigmaDuelCalls},
    IEDT::IEDTCalls,
};
use enigma_duel::infrastructure::ethereum::{
    Command, Confirmation, ContractTransport, PendingCommand, Query, TransportError,
};
use enigma_duel::{Deployment, DuelGateway};

pub const DUEL: Address = Address::new([0xd0; 20]);
pub const TOKEN: Address = Address::new([0xed; 20]);
pub const ALICE: Address = Address::new([0xa1; 20]);
pub const BOB: Address = Address::new([0xb0; 20]);

/// One EDT in base units
pub fn edt(units: u64) -> U256 {
    U256::from(units) * U256::from(10u64).pow(U256::from(18u64))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Faults {
    /// Every round trip fails at the transport
    pub offline: bool,
    /// `depositEDT` is mined but reverts
    pub revert_deposit: bool,
    /// Withdrawals succeed without emitting `EDTWithdrawn`
    pub omit_withdraw_event: bool,
    /// Queries answer with a truncated payload
    pub garble_queries: bool,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Deposit {
    pub total: U256,
    pub locked: U256,
    pub available: U256,
}

#[derive(Default)]
pub struct LedgerState {
    pub wallets: HashMap<Address, U256>,
    pub allowances: HashMap<(Address, Address), U256>,
    pub deposits: HashMap<Address, Deposit>,
    pub rooms: HashMap<B256, IEnigmaDuel::GameRoom>,
    pub fee: U256,
    pub draw_fee: U256,
    pub faults: Faults,
    /// Withdrawals emit `Withdrawn` with the same fields instead of `EDTWithdrawn`
    pub renamed_withdraw_event: bool,
    pub queries: usize,
    pub submissions: usize,
    nonce: u64,
    receipts: HashMap<B256, Confirmation>,
}

/// Shared ledger state
#[derive(Clone)]
pub struct MockLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl MockLedger {
    pub fn new() -> Self {
        let ledger = Self {
            state: Arc::new(Mutex::new(LedgerState::default())),
        };
        {
            let mut state = ledger.state();
            state.fee = U256::from(500u64);
            state.draw_fee = U256::from(250u64);
        }
        ledger
    }

    pub fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap()
    }

    pub fn mint(&self, owner: Address, amount: U256) {
        *self.state().wallets.entry(owner).or_default() += amount;
    }

    pub fn wallet(&self, owner: Address) -> U256 {
        self.state().wallets.get(&owner).copied().unwrap_or_default()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.state()
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn deposit_of(&self, owner: Address) -> Deposit {
        self.state().deposits.get(&owner).copied().unwrap_or_default()
    }

    pub fn lock(&self, owner: Address, amount: U256) {
        let mut state = self.state();
        let deposit = state.deposits.entry(owner).or_default();
        deposit.available -= amount;
        deposit.locked += amount;
    }

    pub fn set_faults(&self, faults: Faults) {
        self.state().faults = faults;
    }

    pub fn rename_withdraw_event(&self) {
        self.state().renamed_withdraw_event = true;
    }

    pub fn insert_room(&self, key: B256, room: IEnigmaDuel::GameRoom) {
        self.state().rooms.insert(key, room);
    }

    /// Record a mined transaction carrying a `GameFinished` event
    pub fn record_game_finished(&self, event: IEnigmaDuel::GameFinished) -> B256 {
        let mut state = self.state();
        let tx_hash = next_hash(&mut state);
        let confirmation = Confirmation {
            tx_hash,
            success: true,
            logs: vec![Log {
                address: DUEL,
                data: event.encode_log_data(),
            }],
        };
        state.receipts.insert(tx_hash, confirmation);
        tx_hash
    }

    /// Round trips seen so far (queries plus submissions)
    pub fn round_trips(&self) -> usize {
        let state = self.state();
        state.queries + state.submissions
    }

    pub fn transport(&self, caller: Address) -> Arc<MockTransport> {
        Arc::new(MockTransport {
            caller,
            ledger: self.clone(),
        })
    }

    pub fn gateway(&self, caller: Address) -> DuelGateway<MockTransport> {
        DuelGateway::new(
            self.transport(caller),
            Deployment {
                duel: DUEL,
                token: TOKEN,
            },
        )
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// A caller's view of the ledger
pub struct MockTransport {
    caller: Address,
    ledger: MockLedger,
}

fn next_hash(state: &mut LedgerState) -> B256 {
    state.nonce += 1;
    keccak256(state.nonce.to_be_bytes())
}

fn revert(reason: &str) -> TransportError {
    TransportError::Rejected(format!("execution reverted: {reason}"))
}

impl MockTransport {
    fn answer_duel(&self, state: &LedgerState, calldata: &[u8]) -> Result<Vec<u8>, TransportError> {
        let call = IEnigmaDuelCalls::abi_decode(calldata)
            .map_err(|err| TransportError::Rpc(format!("bad calldata: {err}")))?;
        let encoded = match call {
            IEnigmaDuelCalls::getUserbalance(call) => {
                let deposit = state.deposits.get(&call._user).copied().unwrap_or_default();
                IEnigmaDuel::Balance {
                    total: deposit.total,
                    locked: deposit.locked,
                    available: deposit.available,
                }
                .abi_encode()
            }
            IEnigmaDuelCalls::getGameRoom(call) => state
                .rooms
                .get(&call._gameRoomKey)
                .cloned()
                .unwrap_or(IEnigmaDuel::GameRoom {
                    duelist1: Address::ZERO,
                    duelist2: Address::ZERO,
                    prizePool: U256::ZERO,
                    status: 0,
                })
                .abi_encode(),
            IEnigmaDuelCalls::getFEE(_) => state.fee.abi_encode(),
            IEnigmaDuelCalls::getDRAW_FEE(_) => state.draw_fee.abi_encode(),
            IEnigmaDuelCalls::getEDT(_) => TOKEN.abi_encode(),
            _ => return Err(TransportError::Rpc("not a view function".into())),
        };
        Ok(encoded)
    }

    fn answer_token(&self, state: &LedgerState, calldata: &[u8]) -> Result<Vec<u8>, TransportError> {
        match IEDTCalls::abi_decode(calldata) {
            Ok(IEDTCalls::balanceOf(call)) => Ok(state
                .wallets
                .get(&call.account)
                .copied()
                .unwrap_or_default()
                .abi_encode()),
            _ => Err(TransportError::Rpc("not a view function".into())),
        }
    }

    /// Apply a command; `Ok(None)` means mined but reverted
    fn apply(&self, state: &mut LedgerState, command: &Command) -> Result<Option<Vec<Log>>, TransportError> {
        let caller = self.caller;
        if command.to == TOKEN {
            return match IEDTCalls::abi_decode(&command.calldata) {
                Ok(IEDTCalls::approve(call)) => {
                    state.allowances.insert((caller, call.spender), call.amount);
                    Ok(Some(Vec::new()))
                }
                _ => Err(TransportError::Rejected("unknown token method".into())),
            };
        }
        if command.to != DUEL {
            return Err(TransportError::Rejected(format!("no contract at {}", command.to)));
        }

        match IEnigmaDuelCalls::abi_decode(&command.calldata) {
            Ok(IEnigmaDuelCalls::depositEDT(call)) => {
                if state.faults.revert_deposit {
                    return Ok(None);
                }
                let amount = call._amount;
                let allowance = state.allowances.get(&(caller, DUEL)).copied().unwrap_or_default();
                let wallet = state.wallets.get(&caller).copied().unwrap_or_default();
                if allowance < amount {
                    return Err(revert("ERC20: insufficient allowance"));
                }
                if wallet < amount {
                    return Err(revert("ERC20: transfer amount exceeds balance"));
                }
                state.allowances.insert((caller, DUEL), allowance - amount);
                state.wallets.insert(caller, wallet - amount);
                let deposit = state.deposits.entry(caller).or_default();
                deposit.total += amount;
                deposit.available += amount;
                Ok(Some(Vec::new()))
            }
            Ok(IEnigmaDuelCalls::withdrawEDT(call)) => {
                let amount = call._amount;
                let deposit = state.deposits.entry(caller).or_default();
                if deposit.available < amount {
                    return Err(revert("insufficient available balance"));
                }
                deposit.available -= amount;
                deposit.total -= amount;
                let new_balance = deposit.available;
                *state.wallets.entry(caller).or_default() += amount;

                let mut logs = Vec::new();
                if state.faults.omit_withdraw_event {
                    return Ok(Some(logs));
                }
                let data = if state.renamed_withdraw_event {
                    LogData::new_unchecked(
                        vec![
                            keccak256("Withdrawn(address,uint256,uint256)"),
                            caller.into_word(),
                        ],
                        (amount, new_balance).abi_encode().into(),
                    )
                } else {
                    IEnigmaDuel::EDTWithdrawn {
                        _user: caller,
                        _amount: amount,
                        _new_balance: new_balance,
                    }
                    .encode_log_data()
                };
                logs.push(Log {
                    address: DUEL,
                    data,
                });
                Ok(Some(logs))
            }
            _ => Err(TransportError::Rejected("unknown duel method".into())),
        }
    }
}

#[async_trait::async_trait]
impl ContractTransport for MockTransport {
    fn caller(&self) -> Address {
        self.caller
    }

    fn endpoint(&self) -> String {
        "mock://ledger".to_string()
    }

    async fn query(&self, query: Query) -> Result<Bytes, TransportError> {
        let mut state = self.ledger.state();
        state.queries += 1;
        if state.faults.offline {
            return Err(TransportError::Rpc("connection refused".into()));
        }

        let mut encoded = if query.to == DUEL {
            self.answer_duel(&state, &query.calldata)?
        } else if query.to == TOKEN {
            self.answer_token(&state, &query.calldata)?
        } else {
            Vec::new()
        };
        if state.faults.garble_queries {
            encoded.truncate(encoded.len() / 2);
        }
        Ok(encoded.into())
    }

    async fn submit(&self, command: Command) -> Result<PendingCommand, TransportError> {
        let mut state = self.ledger.state();
        state.submissions += 1;
        if state.faults.offline {
            return Err(TransportError::Rpc("connection refused".into()));
        }

        let outcome = self.apply(&mut state, &command)?;
        let tx_hash = next_hash(&mut state);
        let confirmation = match outcome {
            Some(logs) => Confirmation {
                tx_hash,
                success: true,
                logs,
            },
            None => Confirmation {
                tx_hash,
                success: false,
                logs: Vec::new(),
            },
        };
        state.receipts.insert(tx_hash, confirmation);
        Ok(PendingCommand { tx_hash })
    }

    async fn confirm(&self, pending: PendingCommand) -> Result<Confirmation, TransportError> {
        let known = {
            let state = self.ledger.state();
            if state.faults.offline {
                return Err(TransportError::Rpc("connection refused".into()));
            }
            state.receipts.get(&pending.tx_hash).cloned()
        };
        match known {
            Some(confirmation) => Ok(confirmation),
            // A node keeps polling for a hash it has never seen
            None => futures::future::pending().await,
        }
    }

    async fn receipt(&self, tx_hash: B256) -> Result<Option<Confirmation>, TransportError> {
        let mut state = self.ledger.state();
        state.queries += 1;
        if state.faults.offline {
            return Err(TransportError::Rpc("connection refused".into()));
        }
        Ok(state.receipts.get(&tx_hash).cloned())
    }
}
