//! Project configuration for contract development
//!
//! A project is described by one `devkit.toml` (or `devkit.json`) document:
//! networks, compiler settings, directory layout, test-runner timeout, named
//! accounts and explorer credentials. [`DevkitToml`] is that document as
//! written. [`Config`] is the same document resolved for one active network,
//! with secrets pulled from the environment.
//!
//! Configuration is resolved in priority order:
//!
//! 1. `.env` file, loaded into the process environment (non-fatal)
//! 2. Config path from `--config`, then `DEVKIT_CONFIG`, then `devkit.toml`
//!    or `devkit.json` in the working directory
//! 3. Active network from `--network`, then `DEVKIT_NETWORK`, then
//!    `defaultNetwork` in the document
//! 4. Validation of the whole document
//! 5. Secret substitution for the active network only
//!
//! # Examples
//!
//! ```rust,no_run
//! use devkit_tools::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! println!("Network: {}", config.network.name);
//! println!("Optimizer runs: {:?}", config.solidity.primary().map(|c| c.settings.optimizer.runs));
//! # Ok(())
//! # }
//! ```

use crate::compiler::SolidityConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::network::{
    mask_url, NetworkProfile, ResolvedNetwork, LOCALHOST_NETWORK, LOCAL_NETWORK,
};
use crate::project::{
    AccountRef, ExplorerConfig, NamedAccounts, ProjectPaths, ResolvedPaths, TestRunnerConfig,
};
use crate::secret::{EnvSource, ProcessEnv};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// File names probed in the working directory, in order
pub const CONFIG_FILE_NAMES: [&str; 2] = ["devkit.toml", "devkit.json"];
pub const ENV_CONFIG_PATH: &str = "DEVKIT_CONFIG";
pub const ENV_NETWORK: &str = "DEVKIT_NETWORK";

/// On-disk format of a config document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Json,
}

impl Format {
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(Format::Toml),
            Some("json") => Ok(Format::Json),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// The project config document as written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevkitToml {
    #[serde(default = "default_network")]
    pub default_network: String,
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkProfile>,
    #[serde(default)]
    pub solidity: SolidityConfig,
    #[serde(default)]
    pub paths: ProjectPaths,
    #[serde(default)]
    pub mocha: TestRunnerConfig,
    #[serde(default, skip_serializing_if = "NamedAccounts::is_empty")]
    pub named_accounts: NamedAccounts,
    #[serde(default)]
    pub etherscan: ExplorerConfig,
}

fn default_network() -> String {
    LOCAL_NETWORK.to_string()
}

impl Default for DevkitToml {
    fn default() -> Self {
        DevkitToml {
            default_network: default_network(),
            networks: BTreeMap::new(),
            solidity: SolidityConfig::default(),
            paths: ProjectPaths::default(),
            mocha: TestRunnerConfig::default(),
            named_accounts: NamedAccounts::default(),
            etherscan: ExplorerConfig::default(),
        }
    }
}

impl DevkitToml {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: DevkitToml = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let config: DevkitToml = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a document, picking the format from the file extension
    pub fn load(path: &Path) -> ConfigResult<Self> {
        info!("Loading configuration from {:?}", path);
        let format = Format::from_path(path)?;

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config = match format {
            Format::Toml => Self::from_toml_str(&content)?,
            Format::Json => Self::from_json_str(&content)?,
        };

        debug!(
            networks = config.networks.len(),
            default_network = %config.default_network,
            "configuration parsed and validated"
        );
        Ok(config)
    }

    /// First `devkit.toml` / `devkit.json` in `dir`
    pub fn discover(dir: &Path) -> ConfigResult<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| ConfigError::MissingConfigFile(dir.to_path_buf()))
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn to_json_string(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_string_as(&self, format: Format) -> ConfigResult<String> {
        match format {
            Format::Toml => self.to_toml_string(),
            Format::Json => self.to_json_string(),
        }
    }

    /// Write the document back out, format chosen by extension
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = self.to_string_as(Format::from_path(path)?)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Configured networks plus the built-in local ones, sorted
    pub fn network_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.networks.keys().map(String::as_str).collect();
        for builtin in [LOCAL_NETWORK, LOCALHOST_NETWORK] {
            if !names.contains(&builtin) {
                names.push(builtin);
            }
        }
        names.sort_unstable();
        names
    }

    /// Profile for `name`, falling back to the built-in defaults
    pub fn profile(&self, name: &str) -> ConfigResult<Cow<'_, NetworkProfile>> {
        match self.networks.get(name) {
            Some(profile) => Ok(Cow::Borrowed(profile)),
            None => NetworkProfile::builtin(name)
                .map(Cow::Owned)
                .ok_or_else(|| ConfigError::UnknownNetwork(name.to_string())),
        }
    }

    /// Validate the configuration.
    ///
    /// Checks every section without consulting the environment, so a
    /// document can be checked on a machine that holds none of its secrets.
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, profile) in &self.networks {
            profile.validate(name)?;
        }

        let names = self.network_names();
        if !names.contains(&self.default_network.as_str()) {
            return Err(ConfigError::UnknownNetwork(self.default_network.clone()));
        }

        self.solidity.validate()?;
        self.paths.validate()?;
        self.mocha.validate()?;
        self.named_accounts.validate(&names)?;
        self.etherscan.validate(&names)?;

        Ok(())
    }

    /// Resolve for one network.
    ///
    /// `network` defaults to `defaultNetwork`; `base_dir` anchors relative
    /// paths and is normally the directory of the config file.
    pub fn resolve(
        &self,
        network: Option<&str>,
        base_dir: &Path,
        env: &dyn EnvSource,
    ) -> ConfigResult<Config> {
        let name = network.unwrap_or(&self.default_network);
        let profile = self.profile(name)?;
        let network = profile.resolve(name, env)?;
        let explorer_api_key = self.etherscan.resolve_for(name, env)?;
        let paths = self.paths.resolve(base_dir);
        paths.ensure_distinct()?;

        info!(
            network = %network.name,
            kind = %network.kind,
            chain_id = ?network.chain_id,
            "configuration resolved"
        );

        Ok(Config {
            network,
            solidity: self.solidity.clone(),
            paths,
            test_timeout: self.mocha.timeout(),
            bail: self.mocha.bail,
            named_accounts: self.named_accounts.clone(),
            explorer_api_key,
            source: None,
        })
    }
}

/// Resolved runtime configuration for the active network
#[derive(Debug, Clone)]
pub struct Config {
    /// Active network, secrets substituted
    pub network: ResolvedNetwork,
    pub solidity: SolidityConfig,
    pub paths: ResolvedPaths,
    /// Per-test timeout for the test runner
    pub test_timeout: Duration,
    pub bail: bool,
    pub named_accounts: NamedAccounts,
    /// Block-explorer key for the active network, if available
    pub explorer_api_key: Option<String>,
    /// File the configuration came from
    pub source: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the environment and the project config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - No config file can be found
    /// - The document fails validation
    /// - The active network is unknown
    /// - A secret the active network needs is not set
    pub fn load() -> ConfigResult<Self> {
        // Load .env file if it exists (non-fatal)
        let _ = dotenvy::dotenv();
        ConfigLoader::new().load()
    }

    /// Signer for `role` on the active network
    pub fn named_account(&self, role: &str) -> ConfigResult<AccountRef> {
        let account = self
            .named_accounts
            .lookup(role, &self.network.name, self.network.chain_id)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownNamedAccount(role.to_string()))?;

        if let (AccountRef::Index(index), Some(available)) =
            (&account, self.network.accounts.known_count())
        {
            if *index as usize >= available {
                return Err(ConfigError::AccountIndexOutOfRange {
                    role: role.to_string(),
                    network: self.network.name.clone(),
                    index: *index,
                    available,
                });
            }
        }

        Ok(account)
    }

    /// Print the resolved configuration
    pub fn print_summary(&self) {
        println!("╔════════════════════════════════════════════════════════════════╗");
        println!("║         DEVKIT PROJECT CONFIGURATION RESOLVED                  ║");
        println!("╚════════════════════════════════════════════════════════════════╝");
        if let Some(ref source) = self.source {
            println!("  Config File:         {}", source.display());
        }
        println!("  Network:             {} ({})", self.network.name, self.network.kind);

        match self.network.chain_id {
            Some(id) => println!("  Chain ID:            {}", id),
            None => println!("  Chain ID:            (from endpoint)"),
        }

        if let Some(ref url) = self.network.url {
            println!("  RPC URL:             {}", mask_url(url));
        }

        if let Some(ref fork) = self.network.fork {
            match fork.block_number {
                Some(block) => println!("  Fork:                {} @ {}", mask_url(&fork.url), block),
                None => println!("  Fork:                {} @ latest", mask_url(&fork.url)),
            }
        }

        if let Some(hardfork) = self.network.hardfork {
            println!("  Hardfork:            {}", hardfork);
        }

        if let Some(fee) = self.network.initial_base_fee_per_gas {
            println!("  Initial Base Fee:    {} wei", fee);
        }

        println!("  Accounts:            {}", self.network.accounts.describe());
        println!("  Gas Price:           {}", self.network.gas_price);

        if let Some(limit) = self.network.block_gas_limit {
            println!("  Block Gas Limit:     {}", limit);
        }

        println!("  RPC Timeout:         {}ms", self.network.timeout.as_millis());

        for compiler in &self.solidity.compilers {
            let optimizer = &compiler.settings.optimizer;
            println!(
                "  Compiler:            solc {} (optimizer {}, runs {})",
                compiler.version,
                if optimizer.enabled { "on" } else { "off" },
                optimizer.runs
            );
        }
        for (source, compiler) in &self.solidity.overrides {
            println!("  Override:            {} → solc {}", source, compiler.version);
        }

        println!("  Sources:             {}", self.paths.sources.display());
        println!("  Tests:               {}", self.paths.tests.display());
        println!("  Cache:               {}", self.paths.cache.display());
        println!("  Artifacts:           {}", self.paths.artifacts.display());
        println!("  Test Timeout:        {}ms", self.test_timeout.as_millis());

        for role in self.named_accounts.roles() {
            match self.named_account(role) {
                Ok(account) => println!("  Named Account:       {} = {}", role, account),
                Err(e) => println!("  Named Account:       {} ({})", role, e),
            }
        }

        if self.explorer_api_key.is_some() {
            println!("  Explorer API Key:    (configured)");
        } else {
            println!("  Explorer API Key:    (not configured)");
        }

        println!("╚════════════════════════════════════════════════════════════════╝");
    }

    /// Get configuration as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

// Manual Serialize impl for Config so resolved secrets never leave the process
impl Serialize for Config {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let named: BTreeMap<&str, String> = self
            .named_accounts
            .roles()
            .filter_map(|role| {
                self.named_account(role)
                    .ok()
                    .map(|account| (role, account.to_string()))
            })
            .collect();

        let mut map = serializer.serialize_map(Some(17))?;
        map.serialize_entry("network", &self.network.name)?;
        map.serialize_entry("kind", self.network.kind.as_str())?;
        map.serialize_entry("chainId", &self.network.chain_id)?;
        map.serialize_entry("url", &self.network.url.as_deref().map(mask_url))?;
        map.serialize_entry(
            "fork",
            &self
                .network
                .fork
                .as_ref()
                .map(|f| (mask_url(&f.url), f.block_number)),
        )?;
        map.serialize_entry("hardfork", &self.network.hardfork)?;
        map.serialize_entry(
            "initialBaseFeePerGas",
            &self.network.initial_base_fee_per_gas,
        )?;
        map.serialize_entry("accounts", &self.network.accounts.describe())?;
        map.serialize_entry("gasPrice", &self.network.gas_price)?;
        map.serialize_entry("blockGasLimit", &self.network.block_gas_limit)?;
        map.serialize_entry("timeoutMs", &(self.network.timeout.as_millis() as u64))?;
        map.serialize_entry("solidity", &self.solidity)?;
        map.serialize_entry(
            "paths",
            &[
                ("sources", &self.paths.sources),
                ("tests", &self.paths.tests),
                ("cache", &self.paths.cache),
                ("artifacts", &self.paths.artifacts),
            ]
            .into_iter()
            .collect::<BTreeMap<_, _>>(),
        )?;
        map.serialize_entry("testTimeoutMs", &(self.test_timeout.as_millis() as u64))?;
        map.serialize_entry("bail", &self.bail)?;
        map.serialize_entry("namedAccounts", &named)?;
        map.serialize_entry("explorerApiKey", &self.explorer_api_key.is_some())?;
        map.end()
    }
}

/// Step-by-step loader behind [`Config::load`].
///
/// Every input the resolution order consults can be overridden, which is
/// how the CLI applies its flags and how tests avoid the process env.
pub struct ConfigLoader {
    path: Option<PathBuf>,
    network: Option<String>,
    dir: Option<PathBuf>,
    env: Box<dyn EnvSource>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        ConfigLoader {
            path: None,
            network: None,
            dir: None,
            env: Box::new(ProcessEnv),
        }
    }

    /// Explicit config file; skips `DEVKIT_CONFIG` and discovery
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Explicit network; skips `DEVKIT_NETWORK` and `defaultNetwork`
    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    /// Directory searched when no path is given; defaults to the working directory
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    /// Locate the config file
    pub fn config_path(&self) -> ConfigResult<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        if let Some(path) = self.env.var(ENV_CONFIG_PATH).filter(|p| !p.is_empty()) {
            debug!("Using {} from {}", path, ENV_CONFIG_PATH);
            return Ok(PathBuf::from(path));
        }
        let dir = match &self.dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        DevkitToml::discover(&dir)
    }

    /// Load and validate the document without resolving secrets
    pub fn load_document(&self) -> ConfigResult<(PathBuf, DevkitToml)> {
        let path = self.config_path()?;
        let document = DevkitToml::load(&path)?;
        Ok((path, document))
    }

    /// Network that [`ConfigLoader::load`] will resolve
    pub fn active_network(&self, document: &DevkitToml) -> String {
        self.network
            .clone()
            .or_else(|| self.env.var(ENV_NETWORK).filter(|n| !n.is_empty()))
            .unwrap_or_else(|| document.default_network.clone())
    }

    pub fn load(&self) -> ConfigResult<Config> {
        let (path, document) = self.load_document()?;
        let network = self.active_network(&document);
        let path = if path.is_relative() {
            std::env::current_dir()?.join(path)
        } else {
            path
        };
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut config = document.resolve(Some(&network), &base_dir, self.env.as_ref())?;
        config.source = Some(path);
        Ok(config)
    }
}
