//! Network profiles
//!
//! A profile is one entry under `networks` in the project config. The entry
//! named [`LOCAL_NETWORK`] is the local simulated chain: it has no endpoint,
//! may fork a live network, and owns the hardfork/base-fee knobs. Every other
//! entry is a remote JSON-RPC endpoint.

use crate::error::{ConfigError, ConfigResult};
use crate::secret::{EnvSource, SecretValue};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Name of the local simulated network
pub const LOCAL_NETWORK: &str = "hardhat";
/// Built-in profile pointing at a node on this machine
pub const LOCALHOST_NETWORK: &str = "localhost";
pub const LOCALHOST_URL: &str = "http://127.0.0.1:8545";
pub const LOCAL_CHAIN_ID: u64 = 31337;

pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 20_000;
pub const DEFAULT_GENERATED_ACCOUNTS: u32 = 20;
pub const DEFAULT_HD_PATH: &str = "m/44'/60'/0'/0";
/// Intrinsic gas of a plain transfer; no block can be smaller
pub const MIN_BLOCK_GAS_LIMIT: u64 = 21_000;

/// Chain id for network names everyone agrees on
pub fn well_known_chain_id(name: &str) -> Option<u64> {
    match name {
        "mainnet" => Some(1),
        "ropsten" => Some(3),
        "rinkeby" => Some(4),
        "goerli" => Some(5),
        "kovan" => Some(42),
        "sepolia" => Some(11_155_111),
        "holesky" => Some(17_000),
        LOCAL_NETWORK | LOCALHOST_NETWORK => Some(LOCAL_CHAIN_ID),
        _ => None,
    }
}

/// Whether a profile runs in-process or talks to an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkKind {
    Local,
    Remote,
}

impl NetworkKind {
    pub fn of(name: &str) -> Self {
        if name == LOCAL_NETWORK {
            NetworkKind::Local
        } else {
            NetworkKind::Remote
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkKind::Local => "local",
            NetworkKind::Remote => "remote",
        }
    }
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// EVM hardforks the local network can emulate, oldest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Hardfork {
    Byzantium,
    Constantinople,
    Petersburg,
    Istanbul,
    MuirGlacier,
    Berlin,
    London,
    ArrowGlacier,
    GrayGlacier,
    Merge,
    Shanghai,
    Cancun,
    Prague,
}

impl Hardfork {
    /// Used by the local network when no hardfork is configured
    pub const DEFAULT: Hardfork = Hardfork::Cancun;

    pub const ALL: [Hardfork; 13] = [
        Hardfork::Byzantium,
        Hardfork::Constantinople,
        Hardfork::Petersburg,
        Hardfork::Istanbul,
        Hardfork::MuirGlacier,
        Hardfork::Berlin,
        Hardfork::London,
        Hardfork::ArrowGlacier,
        Hardfork::GrayGlacier,
        Hardfork::Merge,
        Hardfork::Shanghai,
        Hardfork::Cancun,
        Hardfork::Prague,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Hardfork::Byzantium => "byzantium",
            Hardfork::Constantinople => "constantinople",
            Hardfork::Petersburg => "petersburg",
            Hardfork::Istanbul => "istanbul",
            Hardfork::MuirGlacier => "muirGlacier",
            Hardfork::Berlin => "berlin",
            Hardfork::London => "london",
            Hardfork::ArrowGlacier => "arrowGlacier",
            Hardfork::GrayGlacier => "grayGlacier",
            Hardfork::Merge => "merge",
            Hardfork::Shanghai => "shanghai",
            Hardfork::Cancun => "cancun",
            Hardfork::Prague => "prague",
        }
    }

    /// EIP-1559 base fee exists from london on
    pub fn supports_base_fee(&self) -> bool {
        *self >= Hardfork::London
    }
}

impl FromStr for Hardfork {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hardfork::ALL
            .iter()
            .copied()
            .find(|h| h.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::ValidationError(format!("unknown hardfork: {}", s)))
    }
}

impl fmt::Display for Hardfork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `gasPrice`: either `"auto"` or a fixed amount in wei
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GasPrice {
    #[default]
    Auto,
    Wei(u64),
}

impl fmt::Display for GasPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GasPrice::Auto => write!(f, "auto"),
            GasPrice::Wei(wei) => write!(f, "{} wei", wei),
        }
    }
}

impl Serialize for GasPrice {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            GasPrice::Auto => serializer.serialize_str("auto"),
            GasPrice::Wei(wei) => serializer.serialize_u64(*wei),
        }
    }
}

impl<'de> Deserialize<'de> for GasPrice {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct GasPriceVisitor;

        impl<'de> Visitor<'de> for GasPriceVisitor {
            type Value = GasPrice;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("\"auto\" or a non-negative integer amount of wei")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<GasPrice, E> {
                if v == "auto" {
                    Ok(GasPrice::Auto)
                } else {
                    v.parse::<u64>()
                        .map(GasPrice::Wei)
                        .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<GasPrice, E> {
                Ok(GasPrice::Wei(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<GasPrice, E> {
                u64::try_from(v)
                    .map(GasPrice::Wei)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            // JSON producers often write `65e9`
            fn visit_f64<E: de::Error>(self, v: f64) -> Result<GasPrice, E> {
                if v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 {
                    Ok(GasPrice::Wei(v as u64))
                } else {
                    Err(E::invalid_value(de::Unexpected::Float(v), &self))
                }
            }
        }

        deserializer.deserialize_any(GasPriceVisitor)
    }
}

/// The literal `"remote"`: accounts are managed by the node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteAccounts {
    #[serde(rename = "remote")]
    Remote,
}

/// Accounts derived from a mnemonic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HdAccounts {
    pub mnemonic: SecretValue,
    #[serde(default = "default_hd_path")]
    pub path: String,
    #[serde(default)]
    pub initial_index: u32,
    #[serde(default = "default_account_count")]
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<SecretValue>,
}

fn default_hd_path() -> String {
    DEFAULT_HD_PATH.to_string()
}

fn default_account_count() -> u32 {
    DEFAULT_GENERATED_ACCOUNTS
}

/// `accounts` entry of a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NetworkAccounts {
    Remote(RemoteAccounts),
    PrivateKeys(Vec<SecretValue>),
    Hd(HdAccounts),
}

/// Local network state seeded from a live chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkingConfig {
    pub url: SecretValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// One entry under `networks`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<SecretValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts: Option<NetworkAccounts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forking: Option<ForkingConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardfork: Option<Hardfork>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_base_fee_per_gas: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<GasPrice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_gas_limit: Option<u64>,
    /// RPC timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl NetworkProfile {
    /// Profile used when the config does not define `name` itself
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            LOCAL_NETWORK => Some(NetworkProfile::default()),
            LOCALHOST_NETWORK => Some(NetworkProfile {
                url: Some(SecretValue::new(LOCALHOST_URL)),
                ..NetworkProfile::default()
            }),
            _ => None,
        }
    }

    /// Check the shape of the profile without touching the environment
    pub fn validate(&self, name: &str) -> ConfigResult<()> {
        let kind = NetworkKind::of(name);

        match (kind, &self.url) {
            (NetworkKind::Local, Some(_)) => {
                return Err(ConfigError::LocalOnlyViolation {
                    network: name.to_string(),
                    field: "url",
                })
            }
            (NetworkKind::Remote, None) => return Err(ConfigError::MissingUrl(name.to_string())),
            (NetworkKind::Remote, Some(url)) if url.is_empty() => {
                return Err(ConfigError::MissingUrl(name.to_string()))
            }
            _ => {}
        }

        if kind == NetworkKind::Remote {
            let local_only = [
                ("forking", self.forking.is_some()),
                ("hardfork", self.hardfork.is_some()),
                ("initialBaseFeePerGas", self.initial_base_fee_per_gas.is_some()),
            ];
            if let Some((field, _)) = local_only.iter().find(|(_, set)| *set) {
                return Err(ConfigError::RemoteOnlyViolation {
                    network: name.to_string(),
                    field: *field,
                });
            }
        }

        if matches!(self.accounts, Some(NetworkAccounts::Remote(_))) && kind == NetworkKind::Local {
            return Err(ConfigError::LocalOnlyViolation {
                network: name.to_string(),
                field: "accounts = \"remote\"",
            });
        }

        if let Some(forking) = &self.forking {
            if forking.url.is_empty() {
                return Err(ConfigError::MissingField(format!(
                    "networks.{}.forking.url",
                    name
                )));
            }
        }

        if self.initial_base_fee_per_gas.is_some() {
            let hardfork = self.hardfork.unwrap_or(Hardfork::DEFAULT);
            if !hardfork.supports_base_fee() {
                return Err(ConfigError::BaseFeeBeforeLondon {
                    network: name.to_string(),
                    hardfork: hardfork.to_string(),
                });
            }
        }

        if let Some(GasPrice::Wei(0)) = self.gas_price {
            return Err(ConfigError::NonPositive {
                name: format!("networks.{}.gasPrice", name),
                value: 0,
            });
        }

        if let Some(limit) = self.block_gas_limit {
            if limit < MIN_BLOCK_GAS_LIMIT {
                return Err(ConfigError::InvalidGasLimit {
                    network: name.to_string(),
                    value: limit,
                });
            }
        }

        for (field, value) in [("timeout", self.timeout), ("chainId", self.chain_id)] {
            if value == Some(0) {
                return Err(ConfigError::NonPositive {
                    name: format!("networks.{}.{}", name, field),
                    value: 0,
                });
            }
        }

        match &self.accounts {
            Some(NetworkAccounts::Hd(hd)) => {
                if hd.count == 0 {
                    return Err(ConfigError::NonPositive {
                        name: format!("networks.{}.accounts.count", name),
                        value: 0,
                    });
                }
                if hd.mnemonic.is_empty() {
                    return Err(ConfigError::MissingField(format!(
                        "networks.{}.accounts.mnemonic",
                        name
                    )));
                }
            }
            Some(NetworkAccounts::PrivateKeys(keys)) => {
                if keys.iter().any(SecretValue::is_empty) {
                    return Err(ConfigError::MissingField(format!(
                        "networks.{}.accounts",
                        name
                    )));
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Chain id from the profile, falling back to the well-known table
    pub fn effective_chain_id(&self, name: &str) -> Option<u64> {
        self.chain_id.or_else(|| well_known_chain_id(name))
    }

    /// Substitute secrets and fill in defaults
    pub fn resolve(&self, name: &str, env: &dyn EnvSource) -> ConfigResult<ResolvedNetwork> {
        self.validate(name)?;
        let kind = NetworkKind::of(name);
        debug!(network = name, kind = %kind, "resolving network profile");

        let url = match &self.url {
            Some(url) => {
                let field = format!("networks.{}.url", name);
                let value = url.resolve(&field, env)?;
                validate_endpoint(&field, &value)?;
                Some(value)
            }
            None => None,
        };

        let accounts = match &self.accounts {
            None if kind == NetworkKind::Local => ResolvedAccounts::Generated {
                count: DEFAULT_GENERATED_ACCOUNTS,
            },
            None => ResolvedAccounts::Remote,
            Some(NetworkAccounts::Remote(_)) => ResolvedAccounts::Remote,
            Some(NetworkAccounts::PrivateKeys(keys)) => {
                let mut resolved = Vec::with_capacity(keys.len());
                for (index, key) in keys.iter().enumerate() {
                    let value = key.resolve(&format!("networks.{}.accounts[{}]", name, index), env)?;
                    let value = normalize_private_key(&value).ok_or_else(|| {
                        ConfigError::InvalidPrivateKey {
                            network: name.to_string(),
                            index,
                        }
                    })?;
                    resolved.push(value);
                }
                ResolvedAccounts::PrivateKeys(resolved)
            }
            Some(NetworkAccounts::Hd(hd)) => ResolvedAccounts::Hd {
                mnemonic: hd
                    .mnemonic
                    .resolve(&format!("networks.{}.accounts.mnemonic", name), env)?,
                path: hd.path.clone(),
                initial_index: hd.initial_index,
                count: hd.count,
                passphrase: match &hd.passphrase {
                    Some(p) => Some(p.resolve(&format!("networks.{}.accounts.passphrase", name), env)?),
                    None => None,
                },
            },
        };

        let fork = match &self.forking {
            Some(forking) if forking.enabled => {
                let field = format!("networks.{}.forking.url", name);
                let value = forking.url.resolve(&field, env)?;
                validate_endpoint(&field, &value)?;
                Some(ResolvedFork {
                    url: value,
                    block_number: forking.block_number,
                })
            }
            _ => None,
        };

        Ok(ResolvedNetwork {
            name: name.to_string(),
            kind,
            chain_id: self.effective_chain_id(name),
            url,
            accounts,
            fork,
            hardfork: match kind {
                NetworkKind::Local => Some(self.hardfork.unwrap_or(Hardfork::DEFAULT)),
                NetworkKind::Remote => None,
            },
            initial_base_fee_per_gas: self.initial_base_fee_per_gas,
            gas_price: self.gas_price.unwrap_or_default(),
            block_gas_limit: self.block_gas_limit,
            timeout: Duration::from_millis(self.timeout.unwrap_or(DEFAULT_RPC_TIMEOUT_MS)),
        })
    }
}

/// Accounts of the active network after secret substitution
#[derive(Clone, PartialEq, Eq)]
pub enum ResolvedAccounts {
    /// Local network default: deterministic test accounts
    Generated { count: u32 },
    PrivateKeys(Vec<String>),
    Hd {
        mnemonic: String,
        path: String,
        initial_index: u32,
        count: u32,
        passphrase: Option<String>,
    },
    Remote,
}

impl ResolvedAccounts {
    /// Number of usable signers, if the config determines it
    pub fn known_count(&self) -> Option<usize> {
        match self {
            ResolvedAccounts::Generated { count } => Some(*count as usize),
            ResolvedAccounts::PrivateKeys(keys) => Some(keys.len()),
            ResolvedAccounts::Hd { count, .. } => Some(*count as usize),
            ResolvedAccounts::Remote => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ResolvedAccounts::Generated { count } => format!("{} generated", count),
            ResolvedAccounts::PrivateKeys(keys) => format!("{} private key(s)", keys.len()),
            ResolvedAccounts::Hd {
                path,
                initial_index,
                count,
                ..
            } => format!("{} from mnemonic at {}/{}+", count, path, initial_index),
            ResolvedAccounts::Remote => "remote".to_string(),
        }
    }
}

impl fmt::Debug for ResolvedAccounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResolvedAccounts({})", self.describe())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFork {
    pub url: String,
    pub block_number: Option<u64>,
}

/// The active network with every value it needs filled in
#[derive(Debug, Clone)]
pub struct ResolvedNetwork {
    pub name: String,
    pub kind: NetworkKind,
    pub chain_id: Option<u64>,
    pub url: Option<String>,
    pub accounts: ResolvedAccounts,
    pub fork: Option<ResolvedFork>,
    pub hardfork: Option<Hardfork>,
    pub initial_base_fee_per_gas: Option<u64>,
    pub gas_price: GasPrice,
    pub block_gas_limit: Option<u64>,
    pub timeout: Duration,
}

impl ResolvedNetwork {
    /// Endpoint to talk to: the node url, or the fork source for the local network
    pub fn endpoint(&self) -> Option<&str> {
        self.url
            .as_deref()
            .or_else(|| self.fork.as_ref().map(|f| f.url.as_str()))
    }
}

fn validate_endpoint(field: &str, value: &str) -> ConfigResult<()> {
    let invalid = || ConfigError::InvalidUrl {
        field: field.to_string(),
        value: mask_url(value),
    };
    let parsed = Url::parse(value).map_err(|_| invalid())?;
    match parsed.scheme() {
        "http" | "https" | "ws" | "wss" if parsed.host().is_some() => Ok(()),
        _ => Err(invalid()),
    }
}

/// Scheme, host and port only; paths and queries often carry API keys
pub fn mask_url(value: &str) -> String {
    match Url::parse(value) {
        Ok(url) => match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}://{}:{}", url.scheme(), host, port),
            (Some(host), None) => format!("{}://{}", url.scheme(), host),
            _ => "***".to_string(),
        },
        Err(_) => "***".to_string(),
    }
}

/// `0x`-prefixed lowercase form of a 32-byte hex key
fn normalize_private_key(value: &str) -> Option<String> {
    let hex = value.strip_prefix("0x").unwrap_or(value);
    if hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(format!("0x{}", hex.to_ascii_lowercase()))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn remote(url: &str) -> NetworkProfile {
        NetworkProfile {
            url: Some(SecretValue::new(url)),
            ..NetworkProfile::default()
        }
    }

    #[test]
    fn test_hardfork_ordering_and_names() {
        assert!(Hardfork::London.supports_base_fee());
        assert!(Hardfork::Shanghai.supports_base_fee());
        assert!(!Hardfork::Berlin.supports_base_fee());
        assert_eq!("muirGlacier".parse::<Hardfork>().unwrap(), Hardfork::MuirGlacier);
        assert_eq!("LONDON".parse::<Hardfork>().unwrap(), Hardfork::London);
        assert!("homestead".parse::<Hardfork>().is_err());
    }

    #[test]
    fn test_well_known_chain_ids() {
        assert_eq!(well_known_chain_id("mainnet"), Some(1));
        assert_eq!(well_known_chain_id("rinkeby"), Some(4));
        assert_eq!(well_known_chain_id("hardhat"), Some(31337));
        assert_eq!(well_known_chain_id("my-l2"), None);
    }

    #[test]
    fn test_remote_requires_url() {
        let profile = NetworkProfile::default();
        assert!(matches!(
            profile.validate("mainnet"),
            Err(ConfigError::MissingUrl(_))
        ));
        assert!(matches!(
            remote("  ").validate("mainnet"),
            Err(ConfigError::MissingUrl(_))
        ));
        assert!(remote("https://eth.example.org").validate("mainnet").is_ok());
    }

    #[test]
    fn test_local_network_rejects_url() {
        assert!(matches!(
            remote("http://127.0.0.1:8545").validate(LOCAL_NETWORK),
            Err(ConfigError::LocalOnlyViolation { field: "url", .. })
        ));
        assert!(NetworkProfile::default().validate(LOCAL_NETWORK).is_ok());
    }

    #[test]
    fn test_fork_settings_are_local_only() {
        let mut profile = remote("https://eth.example.org");
        profile.hardfork = Some(Hardfork::London);
        assert!(matches!(
            profile.validate("mainnet"),
            Err(ConfigError::RemoteOnlyViolation {
                field: "hardfork",
                ..
            })
        ));
    }

    #[test]
    fn test_base_fee_needs_london() {
        let profile = NetworkProfile {
            hardfork: Some(Hardfork::Berlin),
            initial_base_fee_per_gas: Some(0),
            ..NetworkProfile::default()
        };
        assert!(matches!(
            profile.validate(LOCAL_NETWORK),
            Err(ConfigError::BaseFeeBeforeLondon { .. })
        ));

        let profile = NetworkProfile {
            hardfork: Some(Hardfork::London),
            initial_base_fee_per_gas: Some(0),
            ..NetworkProfile::default()
        };
        assert!(profile.validate(LOCAL_NETWORK).is_ok());
    }

    #[test]
    fn test_gas_limits() {
        let mut profile = remote("https://eth.example.org");
        profile.block_gas_limit = Some(20_000);
        assert!(matches!(
            profile.validate("mainnet"),
            Err(ConfigError::InvalidGasLimit { value: 20_000, .. })
        ));
        profile.block_gas_limit = Some(12_487_794);
        profile.gas_price = Some(GasPrice::Wei(0));
        assert!(matches!(
            profile.validate("mainnet"),
            Err(ConfigError::NonPositive { .. })
        ));
    }

    #[test]
    fn test_gas_price_forms() {
        let auto: GasPrice = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(auto, GasPrice::Auto);
        let fixed: GasPrice = serde_json::from_str("65000000000").unwrap();
        assert_eq!(fixed, GasPrice::Wei(65_000_000_000));
        let scientific: GasPrice = serde_json::from_str("65e9").unwrap();
        assert_eq!(scientific, GasPrice::Wei(65_000_000_000));
        assert!(serde_json::from_str::<GasPrice>("-1").is_err());
        assert!(serde_json::from_str::<GasPrice>("\"fast\"").is_err());
    }

    #[test]
    fn test_accounts_shapes() {
        let remote: NetworkAccounts = serde_json::from_str("\"remote\"").unwrap();
        assert_eq!(remote, NetworkAccounts::Remote(RemoteAccounts::Remote));

        let keys: NetworkAccounts = serde_json::from_str("[\"${PK}\"]").unwrap();
        assert_eq!(
            keys,
            NetworkAccounts::PrivateKeys(vec![SecretValue::from_env("PK")])
        );

        let hd: NetworkAccounts = serde_json::from_str("{\"mnemonic\": \"${MNEMONIC}\"}").unwrap();
        match hd {
            NetworkAccounts::Hd(hd) => {
                assert_eq!(hd.path, DEFAULT_HD_PATH);
                assert_eq!(hd.count, DEFAULT_GENERATED_ACCOUNTS);
                assert_eq!(hd.initial_index, 0);
            }
            other => panic!("unexpected accounts: {:?}", other),
        }
    }

    #[test]
    fn test_resolve_remote_profile() {
        let profile = NetworkProfile {
            url: Some(SecretValue::new("https://eth.example.org/v2/${RPC_KEY}")),
            accounts: Some(NetworkAccounts::PrivateKeys(vec![SecretValue::from_env(
                "DEPLOYER_KEY",
            )])),
            gas_price: Some(GasPrice::Wei(65_000_000_000)),
            ..NetworkProfile::default()
        };
        let upper = KEY.to_uppercase();
        let resolved = profile
            .resolve(
                "mainnet",
                &env(&[("RPC_KEY", "k"), ("DEPLOYER_KEY", upper.as_str())]),
            )
            .unwrap();

        assert_eq!(resolved.kind, NetworkKind::Remote);
        assert_eq!(resolved.chain_id, Some(1));
        assert_eq!(resolved.url.as_deref(), Some("https://eth.example.org/v2/k"));
        assert_eq!(
            resolved.accounts,
            ResolvedAccounts::PrivateKeys(vec![format!("0x{}", KEY)])
        );
        assert_eq!(resolved.timeout, Duration::from_millis(DEFAULT_RPC_TIMEOUT_MS));
        assert!(resolved.hardfork.is_none());
    }

    #[test]
    fn test_resolve_rejects_bad_key_and_url() {
        let profile = NetworkProfile {
            url: Some(SecretValue::new("https://eth.example.org")),
            accounts: Some(NetworkAccounts::PrivateKeys(vec![SecretValue::new("0x1234")])),
            ..NetworkProfile::default()
        };
        assert!(matches!(
            profile.resolve("mainnet", &env(&[])),
            Err(ConfigError::InvalidPrivateKey { index: 0, .. })
        ));

        assert!(matches!(
            remote("ftp://eth.example.org").resolve("mainnet", &env(&[])),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            remote("MAINNET PROVIDER URL").resolve("mainnet", &env(&[])),
            Err(ConfigError::UnresolvedPlaceholder { .. })
        ));
    }

    #[test]
    fn test_resolve_local_fork() {
        let profile = NetworkProfile {
            hardfork: Some(Hardfork::London),
            initial_base_fee_per_gas: Some(0),
            forking: Some(ForkingConfig {
                url: SecretValue::from_env("MAINNET_RPC_URL"),
                block_number: Some(13_124_004),
                enabled: true,
            }),
            ..NetworkProfile::default()
        };
        let resolved = profile
            .resolve(
                LOCAL_NETWORK,
                &env(&[("MAINNET_RPC_URL", "https://eth.example.org")]),
            )
            .unwrap();

        assert_eq!(resolved.kind, NetworkKind::Local);
        assert_eq!(resolved.chain_id, Some(LOCAL_CHAIN_ID));
        assert_eq!(resolved.hardfork, Some(Hardfork::London));
        assert_eq!(
            resolved.accounts,
            ResolvedAccounts::Generated {
                count: DEFAULT_GENERATED_ACCOUNTS
            }
        );
        let fork = resolved.fork.as_ref().unwrap();
        assert_eq!(fork.block_number, Some(13_124_004));
        assert_eq!(resolved.endpoint(), Some("https://eth.example.org"));
    }

    #[test]
    fn test_disabled_fork_skips_secret() {
        let profile = NetworkProfile {
            forking: Some(ForkingConfig {
                url: SecretValue::from_env("UNSET_FORK_URL"),
                block_number: None,
                enabled: false,
            }),
            ..NetworkProfile::default()
        };
        let resolved = profile.resolve(LOCAL_NETWORK, &env(&[])).unwrap();
        assert!(resolved.fork.is_none());
        assert_eq!(resolved.endpoint(), None);
    }

    #[test]
    fn test_mask_url_hides_credentials() {
        assert_eq!(
            mask_url("https://eth-mainnet.example.org/v2/secret"),
            "https://eth-mainnet.example.org"
        );
        assert_eq!(mask_url("http://127.0.0.1:8545"), "http://127.0.0.1:8545");
        assert_eq!(mask_url("not a url"), "***");
    }

    #[test]
    fn test_resolved_accounts_debug_is_redacted() {
        let accounts = ResolvedAccounts::PrivateKeys(vec![format!("0x{}", KEY)]);
        let printed = format!("{:?}", accounts);
        assert!(!printed.contains(KEY));
        assert_eq!(accounts.known_count(), Some(1));
        assert_eq!(ResolvedAccounts::Remote.known_count(), None);
    }
}
