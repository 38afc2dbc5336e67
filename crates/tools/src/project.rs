//! Project layout, test runner, named accounts and explorer credentials

use crate::error::{ConfigError, ConfigResult};
use crate::secret::{EnvSource, SecretValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_TEST_TIMEOUT_MS: u64 = 40_000;

/// Directory layout, relative to `root`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPaths {
    #[serde(default = "default_root")]
    pub root: String,
    #[serde(default = "default_sources")]
    pub sources: String,
    #[serde(default = "default_tests")]
    pub tests: String,
    #[serde(default = "default_cache")]
    pub cache: String,
    #[serde(default = "default_artifacts")]
    pub artifacts: String,
}

fn default_root() -> String {
    ".".to_string()
}

fn default_sources() -> String {
    "contracts".to_string()
}

fn default_tests() -> String {
    "test".to_string()
}

fn default_cache() -> String {
    "cache".to_string()
}

fn default_artifacts() -> String {
    "artifacts".to_string()
}

impl Default for ProjectPaths {
    fn default() -> Self {
        ProjectPaths {
            root: default_root(),
            sources: default_sources(),
            tests: default_tests(),
            cache: default_cache(),
            artifacts: default_artifacts(),
        }
    }
}

/// Project directories anchored at the config file's directory.
///
/// Absolute whenever that directory is, which [`crate::config::ConfigLoader`]
/// guarantees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub root: PathBuf,
    pub sources: PathBuf,
    pub tests: PathBuf,
    pub cache: PathBuf,
    pub artifacts: PathBuf,
}

impl ResolvedPaths {
    /// Build output must not land in the source directory
    pub fn ensure_distinct(&self) -> ConfigResult<()> {
        for (name, path) in [("paths.cache", &self.cache), ("paths.artifacts", &self.artifacts)] {
            if *path == self.sources {
                return Err(ConfigError::InvalidPath {
                    name,
                    reason: format!("resolves to paths.sources ({})", path.display()),
                });
            }
        }
        Ok(())
    }
}

impl ProjectPaths {
    fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("paths.root", self.root.as_str()),
            ("paths.sources", self.sources.as_str()),
            ("paths.tests", self.tests.as_str()),
            ("paths.cache", self.cache.as_str()),
            ("paths.artifacts", self.artifacts.as_str()),
        ]
    }

    pub fn validate(&self) -> ConfigResult<()> {
        for (name, value) in self.entries() {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidPath {
                    name,
                    reason: "must not be empty".to_string(),
                });
            }
        }

        // Without the config location, compare as if the project sat at `/`.
        // Absolute entries get checked again by `DevkitToml::resolve`.
        self.resolve(Path::new("/")).ensure_distinct()
    }

    /// Anchor every path at `base` (the directory holding the config file)
    pub fn resolve(&self, base: &Path) -> ResolvedPaths {
        let root = clean(&base.join(&self.root));
        ResolvedPaths {
            sources: clean(&root.join(&self.sources)),
            tests: clean(&root.join(&self.tests)),
            cache: clean(&root.join(&self.cache)),
            artifacts: clean(&root.join(&self.artifacts)),
            root,
        }
    }
}

/// Lexical cleanup: drops `.` and folds `..` where possible
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `mocha` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunnerConfig {
    /// Per-test timeout in milliseconds
    #[serde(default = "default_test_timeout")]
    pub timeout: u64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bail: bool,
}

fn default_test_timeout() -> u64 {
    DEFAULT_TEST_TIMEOUT_MS
}

impl Default for TestRunnerConfig {
    fn default() -> Self {
        TestRunnerConfig {
            timeout: DEFAULT_TEST_TIMEOUT_MS,
            bail: false,
        }
    }
}

impl TestRunnerConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.timeout == 0 {
            return Err(ConfigError::NonPositive {
                name: "mocha.timeout".to_string(),
                value: 0,
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }
}

/// Which signer a role uses: an index into the network's accounts, or a fixed address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccountRef {
    Index(u32),
    Address(String),
}

impl AccountRef {
    fn validate(&self, role: &str, selector: &str) -> ConfigResult<()> {
        match self {
            AccountRef::Index(_) => Ok(()),
            AccountRef::Address(address) if is_address(address) => Ok(()),
            AccountRef::Address(address) => Err(ConfigError::InvalidAddress {
                field: format!("namedAccounts.{}.{}", role, selector),
                value: address.clone(),
            }),
        }
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountRef::Index(index) => write!(f, "account #{}", index),
            AccountRef::Address(address) => write!(f, "{}", address),
        }
    }
}

fn is_address(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Selector key that applies when nothing more specific matches
pub const DEFAULT_SELECTOR: &str = "default";

/// Accounts for one role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleAccounts {
    /// Same account on every network
    Everywhere(AccountRef),
    /// Keyed by network name, chain id, or `default`
    PerNetwork(BTreeMap<String, AccountRef>),
}

/// `namedAccounts`: role name → account per network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamedAccounts(pub BTreeMap<String, RoleAccounts>);

impl NamedAccounts {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Account for `role` on a network.
    ///
    /// Precedence: the network's name, then its chain id, then `default`.
    pub fn lookup(&self, role: &str, network: &str, chain_id: Option<u64>) -> Option<&AccountRef> {
        match self.0.get(role)? {
            RoleAccounts::Everywhere(account) => Some(account),
            RoleAccounts::PerNetwork(map) => map
                .get(network)
                .or_else(|| chain_id.and_then(|id| map.get(&id.to_string())))
                .or_else(|| map.get(DEFAULT_SELECTOR)),
        }
    }

    /// Selectors must be `default`, a decimal chain id, or a configured network
    pub fn validate(&self, networks: &[&str]) -> ConfigResult<()> {
        for (role, accounts) in &self.0 {
            match accounts {
                RoleAccounts::Everywhere(account) => account.validate(role, DEFAULT_SELECTOR)?,
                RoleAccounts::PerNetwork(map) => {
                    for (selector, account) in map {
                        let known = selector == DEFAULT_SELECTOR
                            || (!selector.is_empty() && selector.chars().all(|c| c.is_ascii_digit()))
                            || networks.contains(&selector.as_str());
                        if !known {
                            return Err(ConfigError::UnknownAccountSelector {
                                role: role.clone(),
                                selector: selector.clone(),
                            });
                        }
                        account.validate(role, selector)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// `etherscan.apiKey`: one key for all networks, or one per network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiKey {
    Single(SecretValue),
    PerNetwork(BTreeMap<String, SecretValue>),
}

/// `etherscan` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<ApiKey>,
}

impl ExplorerConfig {
    pub fn validate(&self, networks: &[&str]) -> ConfigResult<()> {
        if let Some(ApiKey::PerNetwork(keys)) = &self.api_key {
            if let Some(unknown) = keys.keys().find(|k| !networks.contains(&k.as_str())) {
                return Err(ConfigError::UnknownNetwork(format!("etherscan.apiKey.{}", unknown)));
            }
        }
        Ok(())
    }

    /// Key for `network`.
    ///
    /// Verification is optional, so an unset variable or leftover placeholder
    /// yields `None` with a warning instead of failing the whole load.
    pub fn resolve_for(&self, network: &str, env: &dyn EnvSource) -> ConfigResult<Option<String>> {
        let (field, secret) = match &self.api_key {
            None => return Ok(None),
            Some(ApiKey::Single(secret)) => ("etherscan.apiKey".to_string(), secret),
            Some(ApiKey::PerNetwork(keys)) => match keys.get(network) {
                Some(secret) => (format!("etherscan.apiKey.{}", network), secret),
                None => return Ok(None),
            },
        };

        match secret.resolve(&field, env) {
            Ok(key) => Ok(Some(key)),
            Err(e @ ConfigError::MissingEnvVar { .. })
            | Err(e @ ConfigError::UnresolvedPlaceholder { .. }) => {
                warn!("{}; contract verification is unavailable", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
