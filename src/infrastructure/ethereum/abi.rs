//! Layout of the event that reports a new balance after a withdrawal
//!
//! `withdrawEDT` returns nothing; the caller learns its new balance from the
//! `_new_balance` field of the event the duel contract emits. The built-in
//! layout mirrors [`IEnigmaDuel::EDTWithdrawn`]. A deployment whose ABI
//! artifact (`EnigmaDuelABI.json`) names the event differently can supply
//! that file instead, and the layout is read from it.

use std::fs;
use std::path::Path;

use alloy::primitives::{Address, LogData, U256};
use alloy::sol_types::SolEvent;
use alloy_dyn_abi::EventExt;
use alloy_json_abi::{Event, EventParam, JsonAbi};
use anyhow::{anyhow, bail, Context, Result};

use crate::infrastructure::ethereum::contracts::IEnigmaDuel;
use crate::infrastructure::ethereum::Confirmation;

const NEW_BALANCE: &str = "_new_balance";

/// Where `_new_balance` sits in a withdrawal event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceEvent {
    event: Event,
    indexed: bool,
    position: usize,
}

impl Default for BalanceEvent {
    fn default() -> Self {
        Self::builtin()
    }
}

impl BalanceEvent {
    /// `EDTWithdrawn(address indexed _user, uint256 _amount, uint256 _new_balance)`
    pub fn builtin() -> Self {
        let param = |ty: &str, name: &str, indexed: bool| EventParam {
            ty: ty.to_string(),
            name: name.to_string(),
            indexed,
            components: Vec::new(),
            internal_type: None,
        };
        Self {
            event: Event {
                name: "EDTWithdrawn".to_string(),
                inputs: vec![
                    param("address", "_user", true),
                    param("uint256", "_amount", false),
                    param("uint256", NEW_BALANCE, false),
                ],
                anonymous: false,
            },
            indexed: false,
            position: 1,
        }
    }

    /// From a human-readable signature, e.g.
    /// `event Withdrawn(address indexed _user, uint256 _amount, uint256 _new_balance)`
    pub fn parse(signature: &str) -> Result<Self> {
        let event = Event::parse(signature)
            .map_err(|err| anyhow!("Invalid event signature `{signature}`: {err}"))?;
        Self::from_event(event)
    }

    /// Pick the withdrawal event out of a contract ABI.
    ///
    /// Accepts a bare ABI array or a build artifact with an `abi` field. When
    /// several events carry `_new_balance`, one whose name mentions
    /// "withdraw" wins.
    pub fn from_abi_json(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content).context("ABI is not JSON")?;
        let abi_value = if value.is_array() {
            value
        } else if let Some(abi) = value.get("abi") {
            abi.clone()
        } else {
            bail!("No ABI array found");
        };
        let abi: JsonAbi = serde_json::from_value(abi_value).context("Invalid ABI")?;

        let mut candidates: Vec<&Event> = abi
            .events()
            .filter(|event| event.inputs.iter().any(|input| input.name == NEW_BALANCE))
            .collect();
        candidates.sort_by_key(|event| !event.name.to_lowercase().contains("withdraw"));
        let event = candidates
            .first()
            .copied()
            .ok_or_else(|| anyhow!("ABI has no event with a `{NEW_BALANCE}` field"))?;
        Self::from_event(event.clone())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read ABI {}", path.display()))?;
        Self::from_abi_json(&content).with_context(|| format!("ABI {}", path.display()))
    }

    fn from_event(event: Event) -> Result<Self> {
        let field = event
            .inputs
            .iter()
            .find(|input| input.name == NEW_BALANCE)
            .ok_or_else(|| anyhow!("{} has no `{NEW_BALANCE}` field", event.name))?;
        if !field.ty.starts_with("uint") {
            bail!("{}.{NEW_BALANCE} is {}, expected an unsigned integer", event.name, field.ty);
        }

        // Indexed and body values are decoded into separate lists
        let indexed = field.indexed;
        let position = event
            .inputs
            .iter()
            .take_while(|input| input.name != NEW_BALANCE)
            .filter(|input| input.indexed == indexed)
            .count();

        Ok(Self {
            event,
            indexed,
            position,
        })
    }

    /// Canonical signature, e.g. `EDTWithdrawn(address,uint256,uint256)`
    pub fn signature(&self) -> String {
        self.event.signature()
    }

    pub fn is_builtin(&self) -> bool {
        self.signature() == IEnigmaDuel::EDTWithdrawn::SIGNATURE
    }

    /// `_new_balance` of one log, if the log is this event
    pub fn decode(&self, log: &LogData) -> Option<U256> {
        let decoded = self.event.decode_log(log).ok()?;
        let values = if self.indexed {
            decoded.indexed
        } else {
            decoded.body
        };
        values
            .get(self.position)
            .and_then(|value| value.as_uint())
            .map(|(value, _)| value)
    }

    /// First matching event emitted by `emitter` in a confirmed command
    pub fn find(&self, confirmation: &Confirmation, emitter: Address) -> Option<U256> {
        confirmation
            .logs
            .iter()
            .filter(|log| log.address == emitter)
            .find_map(|log| self.decode(&log.data))
    }
}
