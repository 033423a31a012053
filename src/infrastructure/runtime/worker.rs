//! Async worker - runs in Tokio runtime and serves gateway requests
//!
//! Requests are handled strictly one at a time, which keeps state-changing
//! calls from the session's signer in submission order.

use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::time::Duration;

use anyhow::Result;

use crate::config::Settings;
use crate::gateway::{DuelGateway, GatewayError};
use crate::infrastructure::ethereum::ContractTransport;
use crate::infrastructure::runtime::bridge::{Outcome, Request, RuntimeCommand, RuntimeEvent};
use crate::infrastructure::session::open_gateway;

const COMMAND_POLL: Duration = Duration::from_millis(50);

/// Run the async worker loop
pub async fn run_async_worker(
    settings: Settings,
    cmd_rx: Receiver<RuntimeCommand>,
    evt_tx: Sender<RuntimeEvent>,
) -> Result<()> {
    let gateway = open_gateway(&settings).await?;
    let _ = evt_tx.send(RuntimeEvent::Connected {
        endpoint: gateway.endpoint(),
        caller: gateway.caller(),
    });

    dispatch(&gateway, Request::Overview, &evt_tx).await;

    loop {
        // Drain pending commands, one request at a time
        loop {
            match cmd_rx.try_recv() {
                Ok(RuntimeCommand::Shutdown) => return Ok(()),
                Ok(RuntimeCommand::Run(request)) => dispatch(&gateway, request, &evt_tx).await,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }

        tokio::time::sleep(COMMAND_POLL).await;
    }
}

/// Run one request against the gateway
pub async fn execute<T: ContractTransport + ?Sized>(
    gateway: &DuelGateway<T>,
    request: Request,
) -> Result<Outcome, GatewayError> {
    let outcome = match request {
        Request::Deposit { amount } => Outcome::Deposited {
            available: gateway.deposit_edt(amount).await?,
        },
        Request::Withdraw { amount } => Outcome::Withdrawn {
            new_balance: gateway.withdraw_edt(amount).await?,
        },
        Request::Balance { user } => {
            let user = user.unwrap_or_else(|| gateway.caller());
            Outcome::Balance {
                user,
                balance: gateway.user_balance(user).await?,
            }
        }
        Request::GameRoom { key } => Outcome::GameRoom {
            key,
            room: gateway.game_room(key).await?,
        },
        Request::VictoryFee => Outcome::VictoryFee(gateway.fee().await?),
        Request::DrawFee => Outcome::DrawFee(gateway.draw_fee().await?),
        Request::TokenAddress => Outcome::TokenAddress(gateway.edt().await?),
        Request::Overview => Outcome::Overview(gateway.overview().await?),
    };
    Ok(outcome)
}

async fn dispatch<T: ContractTransport + ?Sized>(
    gateway: &DuelGateway<T>,
    request: Request,
    evt_tx: &Sender<RuntimeEvent>,
) {
    let operation = request.operation();
    let event = match execute(gateway, request).await {
        Ok(outcome) => RuntimeEvent::Completed { operation, outcome },
        Err(err) => {
            tracing::warn!(?operation, "request failed: {err}");
            RuntimeEvent::Failed {
                operation,
                message: err.to_string(),
            }
        }
    };
    let _ = evt_tx.send(event);
}
