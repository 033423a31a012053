//! Configuration: TOML file, deployment address book, CLI overrides
//!
//! ```toml
//! confirmations = 1
//! address_book = "~/enigma-duel/data/constants/addresses.json"
//! abi = "~/enigma-duel/data/build/EnigmaDuelABI.json" # optional
//!
//! [[endpoints]]
//! name = "anvil"
//! rpc = "http://localhost:8545"
//!
//! [contracts]
//! enigma_duel = "0x..."
//! token = "0x..."
//!
//! [signer]
//! account = "0x..."            # node-managed account
//! private_key_env = "PRIV_KEY" # or a local key read from this variable
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use alloy::primitives::Address;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::domain::duel::parse_address;
use crate::gateway::Deployment;
use crate::infrastructure::ethereum::{BalanceEvent, ProviderConfig};

const APP_NAME: &str = "enigma-duel";
const DEFAULT_ENDPOINT: &str = "localhost:8545";

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub name: Option<String>,
    pub rpc: Option<String>,
    pub ipc: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractsConfig {
    pub enigma_duel: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignerSpec {
    pub account: Option<String>,
    pub private_key_env: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,

    #[serde(default)]
    pub contracts: ContractsConfig,

    #[serde(default)]
    pub signer: SignerSpec,

    pub confirmations: Option<u64>,

    pub address_book: Option<String>,

    /// Contract ABI the withdrawal event layout is read from
    pub abi: Option<String>,
}

/// Deployment addresses as written by the contract deployment scripts
#[derive(Debug, Clone, Deserialize)]
pub struct AddressBook {
    #[serde(rename = "EnigmaDuelProxy")]
    pub enigma_duel_proxy: String,
    #[serde(rename = "EnigmaDuelToken")]
    pub enigma_duel_token: String,
    #[serde(rename = "EnigmaDuel", default)]
    pub enigma_duel: Option<String>,
    #[serde(rename = "EnigmaDuelState", default)]
    pub enigma_duel_state: Option<String>,
    #[serde(rename = "EnigmaDuelProxyAdmin", default)]
    pub enigma_duel_proxy_admin: Option<String>,
}

impl AddressBook {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read address book {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Invalid address book {}", path.display()))
    }
}

/// Values given on the command line; they win over the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub rpc: Option<String>,
    pub ws: Option<String>,
    pub ipc: Option<PathBuf>,
    pub address_book: Option<PathBuf>,
    pub abi: Option<PathBuf>,
    pub duel: Option<String>,
    pub token: Option<String>,
    pub from: Option<String>,
    pub private_key_env: Option<String>,
    pub confirmations: Option<u64>,
}

/// How the signing account is chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerChoice {
    /// Node-managed account
    Account(Address),
    /// Local key held in this environment variable
    KeyEnv(String),
    /// First account reported by `eth_accounts`
    FirstNodeAccount,
}

/// Fully merged settings for one session
#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoint: ProviderConfig,
    pub deployment: Deployment,
    pub signer: SignerChoice,
    pub confirmations: u64,
    pub withdrawal_event: BalanceEvent,
}

impl Config {
    /// Merge config file values with CLI overrides
    pub fn resolve(&self, overrides: &Overrides) -> Result<Settings> {
        let endpoint = self.resolve_endpoint(overrides)?;
        let deployment = self.resolve_deployment(overrides)?;
        let signer = self.resolve_signer(overrides)?;
        let confirmations = overrides
            .confirmations
            .or(self.confirmations)
            .unwrap_or(1)
            .max(1);
        let withdrawal_event = self.resolve_withdrawal_event(overrides)?;

        Ok(Settings {
            endpoint,
            deployment,
            signer,
            confirmations,
            withdrawal_event,
        })
    }

    fn resolve_withdrawal_event(&self, overrides: &Overrides) -> Result<BalanceEvent> {
        let path = overrides
            .abi
            .clone()
            .or_else(|| non_empty(self.abi.as_deref()).and_then(expand_path));
        match path {
            Some(path) => BalanceEvent::load(&path),
            None => Ok(BalanceEvent::default()),
        }
    }

    fn resolve_endpoint(&self, overrides: &Overrides) -> Result<ProviderConfig> {
        // CLI arguments take precedence
        if let Some(ipc) = overrides.ipc.clone() {
            #[cfg(unix)]
            {
                return Ok(ProviderConfig::Ipc(ipc));
            }
            #[cfg(not(unix))]
            {
                let _ = ipc;
                return Err(anyhow!("IPC is not supported on this platform"));
            }
        }
        if let Some(ws) = non_empty(overrides.ws.as_deref()) {
            return Ok(ProviderConfig::WebSocket(ws.to_string()));
        }
        if let Some(rpc) = non_empty(overrides.rpc.as_deref()) {
            return Ok(ProviderConfig::from_url(&normalize_endpoint(rpc)));
        }

        // First usable config file endpoint
        for entry in &self.endpoints {
            if let Some(rpc) = non_empty(entry.rpc.as_deref()) {
                return Ok(ProviderConfig::from_url(&normalize_endpoint(rpc)));
            }
            #[cfg(unix)]
            {
                if let Some(path) = non_empty(entry.ipc.as_deref()).and_then(expand_path) {
                    return Ok(ProviderConfig::Ipc(path));
                }
            }
        }

        Ok(ProviderConfig::Http(normalize_endpoint(DEFAULT_ENDPOINT)))
    }

    fn resolve_deployment(&self, overrides: &Overrides) -> Result<Deployment> {
        let book_path = overrides
            .address_book
            .clone()
            .or_else(|| non_empty(self.address_book.as_deref()).and_then(expand_path));
        let book = match book_path {
            Some(path) => Some(AddressBook::load(&path)?),
            None => None,
        };

        let duel = overrides
            .duel
            .clone()
            .or_else(|| self.contracts.enigma_duel.clone())
            .or_else(|| book.as_ref().map(|b| b.enigma_duel_proxy.clone()))
            .ok_or_else(|| anyhow!("EnigmaDuel address not configured (use --duel or [contracts].enigma_duel)"))?;
        let token = overrides
            .token
            .clone()
            .or_else(|| self.contracts.token.clone())
            .or_else(|| book.as_ref().map(|b| b.enigma_duel_token.clone()))
            .ok_or_else(|| anyhow!("EDT token address not configured (use --token or [contracts].token)"))?;

        Ok(Deployment {
            duel: parse_address(&duel).context("EnigmaDuel address")?,
            token: parse_address(&token).context("EDT token address")?,
        })
    }

    fn resolve_signer(&self, overrides: &Overrides) -> Result<SignerChoice> {
        if let Some(var) = non_empty(overrides.private_key_env.as_deref()) {
            return Ok(SignerChoice::KeyEnv(var.to_string()));
        }
        if let Some(from) = non_empty(overrides.from.as_deref()) {
            return Ok(SignerChoice::Account(
                parse_address(from).context("--from")?,
            ));
        }
        if let Some(var) = non_empty(self.signer.private_key_env.as_deref()) {
            return Ok(SignerChoice::KeyEnv(var.to_string()));
        }
        if let Some(account) = non_empty(self.signer.account.as_deref()) {
            return Ok(SignerChoice::Account(
                parse_address(account).context("[signer].account")?,
            ));
        }
        Ok(SignerChoice::FirstNodeAccount)
    }
}

pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    load_from(&path)
}

/// Missing or unparsable files fall back to defaults
pub fn load_from(path: &Path) -> Config {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    match toml::from_str::<Config>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(path = %path.display(), "ignoring invalid config: {err}");
            Config::default()
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("ENIGMA_DUEL_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join(APP_NAME).join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join(APP_NAME).join("config.toml"));
    }

    directories::ProjectDirs::from("io", APP_NAME, APP_NAME)
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Where the terminal UI writes its log file
pub fn log_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CACHE_HOME").map(PathBuf::from) {
        return xdg.join(APP_NAME).join("logs");
    }
    directories::ProjectDirs::from("io", APP_NAME, APP_NAME)
        .map(|dirs| dirs.cache_dir().join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME).join("logs"))
}

fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    if ["http://", "https://", "ws://", "wss://"]
        .iter()
        .any(|scheme| trimmed.starts_with(scheme))
    {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn expand_path(raw: &str) -> Option<PathBuf> {
    if let Some(rest) = raw.strip_prefix("~/") {
        let home = std::env::var_os("HOME")?;
        return Some(PathBuf::from(home).join(rest));
    }
    Some(PathBuf::from(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUEL: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const TOKEN: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";

    fn parse(content: &str) -> Config {
        toml::from_str(content).unwrap()
    }

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("enigma-duel-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file() {
        let config = load_from(Path::new("/definitely/not/here.toml"));
        assert!(config.endpoints.is_empty());
        let err = config.resolve(&Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("EnigmaDuel address not configured"));
    }

    #[test]
    fn test_invalid_toml_falls_back() {
        let path = temp_file("broken.toml", "endpoints = 5");
        let config = load_from(&path);
        assert!(config.endpoints.is_empty());
    }

    #[test]
    fn test_resolve_from_config() {
        let config = parse(&format!(
            r#"
            confirmations = 3

            [[endpoints]]
            name = "anvil"
            rpc = "127.0.0.1:8545"

            [contracts]
            enigma_duel = "{DUEL}"
            token = "{TOKEN}"

            [signer]
            account = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
            "#
        ));
        let settings = config.resolve(&Overrides::default()).unwrap();
        assert_eq!(
            settings.endpoint,
            ProviderConfig::Http("http://127.0.0.1:8545".into())
        );
        assert_eq!(settings.deployment.duel, parse_address(DUEL).unwrap());
        assert_eq!(settings.deployment.token, parse_address(TOKEN).unwrap());
        assert_eq!(settings.confirmations, 3);
        assert!(matches!(settings.signer, SignerChoice::Account(_)));
    }

    #[test]
    fn test_overrides_win() {
        let config = parse(&format!(
            r#"
            [contracts]
            enigma_duel = "{DUEL}"
            token = "{TOKEN}"

            [signer]
            private_key_env = "CONFIG_KEY"
            "#
        ));
        let overrides = Overrides {
            ws: Some("ws://node:8546".into()),
            rpc: Some("http://ignored:8545".into()),
            token: Some(DUEL.into()),
            private_key_env: Some("CLI_KEY".into()),
            confirmations: Some(0),
            ..Overrides::default()
        };
        let settings = config.resolve(&overrides).unwrap();
        assert_eq!(
            settings.endpoint,
            ProviderConfig::WebSocket("ws://node:8546".into())
        );
        assert_eq!(settings.deployment.token, parse_address(DUEL).unwrap());
        assert_eq!(settings.signer, SignerChoice::KeyEnv("CLI_KEY".into()));
        assert_eq!(settings.confirmations, 1);
    }

    #[test]
    fn test_address_book() {
        let book = temp_file(
            "addresses.json",
            &format!(
                r#"{{
                    "EnigmaDuel": "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0",
                    "EnigmaDuelProxy": "{DUEL}",
                    "EnigmaDuelToken": "{TOKEN}"
                }}"#
            ),
        );
        let overrides = Overrides {
            address_book: Some(book),
            ..Overrides::default()
        };
        let settings = Config::default().resolve(&overrides).unwrap();
        assert_eq!(settings.deployment.duel, parse_address(DUEL).unwrap());
        assert_eq!(settings.signer, SignerChoice::FirstNodeAccount);
        assert_eq!(
            settings.endpoint,
            ProviderConfig::Http("http://localhost:8545".into())
        );
    }

    #[test]
    fn test_withdrawal_event_from_abi_file() {
        let abi = temp_file(
            "EnigmaDuelABI.json",
            r#"[{"type": "event", "name": "Withdrawn", "anonymous": false, "inputs": [
                {"name": "_user", "type": "address", "indexed": true},
                {"name": "_amount", "type": "uint256", "indexed": false},
                {"name": "_new_balance", "type": "uint256", "indexed": false}]}]"#,
        );
        let config = parse(&format!(
            r#"
            abi = "{}"

            [contracts]
            enigma_duel = "{DUEL}"
            token = "{TOKEN}"
            "#,
            abi.display()
        ));
        let settings = config.resolve(&Overrides::default()).unwrap();
        assert_eq!(
            settings.withdrawal_event.signature(),
            "Withdrawn(address,uint256,uint256)"
        );

        let err = config
            .resolve(&Overrides {
                abi: Some(PathBuf::from("/definitely/not/EnigmaDuelABI.json")),
                ..Overrides::default()
            })
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read ABI"));

        let settings = Config {
            abi: None,
            ..config
        }
        .resolve(&Overrides::default())
        .unwrap();
        assert!(settings.withdrawal_event.is_builtin());
    }

    #[test]
    fn test_bad_address_is_an_error() {
        let config = parse(
            r#"
            [contracts]
            enigma_duel = "0x1234"
            token = "0x1234"
            "#,
        );
        assert!(config.resolve(&Overrides::default()).is_err());
    }
}
