//! Distribution policy and secret loading shared by chain backends.
//!
//! A chain's configuration is assembled from two places: a static policy
//! file (token contracts, drip amounts, caps, explorer link) and secrets
//! taken from the environment (RPC endpoint, signing key, signer address).

use crate::error::{ChainError, ChainResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Distribution policy for a single token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPolicy {
    /// On-chain token contract address
    pub contract_address: String,

    /// Amount granted per faucet request, as a decimal string ("0.01")
    pub drip_amount: String,

    /// Maximum tokens distributed per hour
    #[serde(default)]
    pub max_per_hour: f64,

    /// Maximum tokens distributed per day
    #[serde(default)]
    pub max_per_day: f64,

    /// Token decimals, 18 when unset
    #[serde(default)]
    pub decimals: Option<u8>,
}

/// Static per-network policy record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainPolicy {
    /// Network name, e.g. "sepolia" or "mainnet"
    #[serde(default = "default_network")]
    pub chain_id: String,

    /// Token symbol to policy
    #[serde(default)]
    pub tokens: BTreeMap<String, TokenPolicy>,

    /// Stop distributing once the faucet balance falls to this share of a
    /// day's cap
    #[serde(default)]
    pub min_balance_protect_pct: u8,

    /// Base URL that transaction hashes are appended to
    #[serde(default)]
    pub explorer_url: String,

    /// Timeout applied to each balance or transfer round trip
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Interval between receipt lookups while waiting for confirmation
    #[serde(default = "default_confirmation_poll_secs")]
    pub confirmation_poll_secs: u64,
}

fn default_network() -> String {
    "sepolia".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_confirmation_poll_secs() -> u64 {
    5
}

impl ChainPolicy {
    /// Load the policy file named by `source`. JSON and TOML are accepted,
    /// picked by file extension.
    pub fn load(source: &PolicySource) -> ChainResult<Self> {
        let path = source.resolve()?;
        debug!("Loading chain policy from {}", path.display());

        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_path()))
            .build()
            .map_err(|e| {
                ChainError::Config(format!("failed to load policy {}: {}", path.display(), e))
            })?;

        settings.try_deserialize().map_err(|e| {
            ChainError::Config(format!("failed to parse policy {}: {}", path.display(), e))
        })
    }

    /// Look up a token's policy, ignoring the case of the symbol.
    pub fn token(&self, symbol: &str) -> Option<&TokenPolicy> {
        find_token(&self.tokens, symbol)
    }
}

/// Case-insensitive lookup in a symbol-keyed token table.
pub(crate) fn find_token<'a>(
    tokens: &'a BTreeMap<String, TokenPolicy>,
    symbol: &str,
) -> Option<&'a TokenPolicy> {
    tokens
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(symbol))
        .map(|(_, policy)| policy)
}

/// Where the policy file comes from.
#[derive(Debug, Clone)]
pub enum PolicySource {
    /// A single explicit file
    Path(PathBuf),

    /// Candidate files tried in order; the first one that exists wins
    Search(Vec<PathBuf>),
}

impl PolicySource {
    pub fn resolve(&self) -> ChainResult<PathBuf> {
        match self {
            PolicySource::Path(path) => {
                if path.is_file() {
                    Ok(path.clone())
                } else {
                    Err(ChainError::Config(format!(
                        "policy file '{}' not found",
                        path.display()
                    )))
                }
            }
            PolicySource::Search(candidates) => candidates
                .iter()
                .find(|candidate| candidate.is_file())
                .cloned()
                .ok_or_else(|| {
                    let tried: Vec<String> =
                        candidates.iter().map(|c| c.display().to_string()).collect();
                    ChainError::Config(format!(
                        "no policy file found, tried: {}",
                        tried.join(", ")
                    ))
                }),
        }
    }
}

impl From<&Path> for PolicySource {
    fn from(path: &Path) -> Self {
        PolicySource::Path(path.to_path_buf())
    }
}

/// Where secrets come from.
#[derive(Debug, Clone, Default)]
pub enum SecretSource {
    /// The process environment
    #[default]
    Env,

    /// An explicit variable map, keyed by environment variable name
    Map(config::Map<String, String>),
}

impl SecretSource {
    /// Read every variable carrying `prefix` (e.g. `STARKNET_RPC_URL` under
    /// prefix `STARKNET` becomes key `rpc_url`).
    pub fn read(&self, prefix: &str) -> ChainResult<Secrets> {
        let environment = config::Environment::with_prefix(prefix);
        let environment = match self {
            SecretSource::Env => environment,
            SecretSource::Map(vars) => environment.source(Some(vars.clone())),
        };

        let settings = config::Config::builder().add_source(environment).build()?;
        Ok(Secrets {
            prefix: prefix.to_string(),
            settings,
        })
    }
}

/// Secrets read from a [`SecretSource`].
pub struct Secrets {
    prefix: String,
    settings: config::Config,
}

impl Secrets {
    /// Fetch a required secret, failing with the variable name when it is
    /// absent or blank.
    pub fn require(&self, key: &str) -> ChainResult<String> {
        match self.settings.get_string(key) {
            Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            _ => Err(ChainError::Config(format!(
                "{}_{} is required",
                self.prefix,
                key.to_ascii_uppercase()
            ))),
        }
    }
}
