//! Opening a gateway for one session

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::{Settings, SignerChoice};
use crate::gateway::DuelGateway;
use crate::infrastructure::ethereum::{ConnectionContext, SignerConfig};

/// Resolve the signer, connect, and bind the gateway to the deployment
pub async fn open_gateway(settings: &Settings) -> Result<DuelGateway<ConnectionContext>> {
    let signer = match &settings.signer {
        SignerChoice::Account(account) => SignerConfig::Node { account: *account },
        SignerChoice::KeyEnv(var) => SignerConfig::from_env(var)?,
        SignerChoice::FirstNodeAccount => {
            let accounts = ConnectionContext::node_accounts(settings.endpoint.clone())
                .await
                .with_context(|| format!("Cannot reach {}", settings.endpoint.display()))?;
            let account = accounts.first().copied().context(
                "Node exposes no accounts; configure [signer] or pass --from / --private-key-env",
            )?;
            tracing::info!(%account, "using first node account as signer");
            SignerConfig::Node { account }
        }
    };

    let context = ConnectionContext::connect(
        settings.endpoint.clone(),
        signer,
        settings.confirmations,
    )
    .await
    .with_context(|| format!("Connection failed ({})", settings.endpoint.display()))?;

    if !settings.withdrawal_event.is_builtin() {
        tracing::info!(
            event = %settings.withdrawal_event.signature(),
            "withdrawal event read from ABI"
        );
    }
    Ok(DuelGateway::new(Arc::new(context), settings.deployment)
        .with_withdrawal_event(settings.withdrawal_event.clone()))
}
