//! Runtime bridge - connects sync TUI thread with async Tokio runtime
//!
//! The TUI thread never awaits. It sends [`RuntimeCommand`]s to a worker
//! thread that owns a Tokio runtime and the gateway, and polls for
//! [`RuntimeEvent`]s on each frame.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use alloy::primitives::{Address, U256};
use tokio::runtime::Runtime;

use crate::config::Settings;
use crate::domain::duel::{Balance, GameRoom, GameRoomKey, Overview};
use crate::infrastructure::runtime::worker::run_async_worker;

/// Gateway operations the TUI can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Deposit,
    Withdraw,
    Balance,
    GameRoom,
    VictoryFee,
    DrawFee,
    TokenAddress,
    Overview,
}

impl Operation {
    /// Generic failure text shown to the user
    pub fn failure_message(&self) -> &'static str {
        match self {
            Operation::Deposit => "Error during deposit.",
            Operation::Withdraw => "Error during withdrawal.",
            Operation::Balance => "Error fetching user balance.",
            Operation::GameRoom => "Error fetching game room.",
            Operation::VictoryFee => "Error fetching fee.",
            Operation::DrawFee => "Error fetching draw fee.",
            Operation::TokenAddress => "Error fetching EDT token address.",
            Operation::Overview => "Error fetching contract overview.",
        }
    }
}

/// A single gateway request with its already-validated inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Deposit { amount: U256 },
    Withdraw { amount: U256 },
    /// `None` means the connected signer
    Balance { user: Option<Address> },
    GameRoom { key: GameRoomKey },
    VictoryFee,
    DrawFee,
    TokenAddress,
    Overview,
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Request::Deposit { .. } => Operation::Deposit,
            Request::Withdraw { .. } => Operation::Withdraw,
            Request::Balance { .. } => Operation::Balance,
            Request::GameRoom { .. } => Operation::GameRoom,
            Request::VictoryFee => Operation::VictoryFee,
            Request::DrawFee => Operation::DrawFee,
            Request::TokenAddress => Operation::TokenAddress,
            Request::Overview => Operation::Overview,
        }
    }

    pub fn changes_state(&self) -> bool {
        matches!(self, Request::Deposit { .. } | Request::Withdraw { .. })
    }
}

/// Commands sent from the TUI to the async worker
#[derive(Debug, Clone)]
pub enum RuntimeCommand {
    Run(Request),
    /// Shutdown the worker
    Shutdown,
}

/// Successful results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Deposited { available: U256 },
    Withdrawn { new_balance: U256 },
    Balance { user: Address, balance: Balance },
    GameRoom { key: GameRoomKey, room: GameRoom },
    VictoryFee(U256),
    DrawFee(U256),
    TokenAddress(Address),
    Overview(Overview),
}

/// Events sent from the async worker to the TUI
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Gateway bound and ready
    Connected { endpoint: String, caller: Address },
    Completed {
        operation: Operation,
        outcome: Outcome,
    },
    Failed {
        operation: Operation,
        message: String,
    },
    /// Worker-level error (connection, shutdown)
    Error { message: String },
}

/// Bridge between sync TUI thread and async Tokio runtime
pub struct RuntimeBridge {
    cmd_tx: Sender<RuntimeCommand>,
    evt_rx: Receiver<RuntimeEvent>,
    worker: Option<JoinHandle<()>>,
}

impl RuntimeBridge {
    /// Spawn the worker thread for a session
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RuntimeCommand>();
        let (evt_tx, evt_rx) = mpsc::channel::<RuntimeEvent>();
        let runtime = Runtime::new()?;

        // The worker thread owns its own Tokio runtime
        let worker = thread::Builder::new()
            .name("enigma-duel-runtime".into())
            .spawn(move || {
                runtime.block_on(async {
                    if let Err(err) = run_async_worker(settings, cmd_rx, evt_tx.clone()).await {
                        tracing::error!("worker exited: {err:#}");
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Worker exited: {:#}", err),
                        });
                    }
                });
            })?;

        Ok(Self {
            cmd_tx,
            evt_rx,
            worker: Some(worker),
        })
    }

    /// Send a command to the async worker
    pub fn send(&self, cmd: RuntimeCommand) -> anyhow::Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| anyhow::anyhow!("Worker channel closed"))
    }

    /// Poll for events (non-blocking)
    pub fn poll_events(&self) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.evt_rx.try_recv() {
            events.push(evt);
        }
        events
    }

    /// Stop the worker and wait for it to exit
    ///
    /// The worker finishes the request it is running before it reads the
    /// shutdown, so a submitted transaction is still confirmed.
    pub fn shutdown(mut self) {
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("runtime worker panicked");
            }
        }
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown);
    }
}
