//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, validating or resolving a project config
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to read configuration file
    #[error("Failed to read config file at {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unsupported config file format: {0}. Expected .toml or .json")]
    UnsupportedFormat(PathBuf),

    #[error("No devkit.toml or devkit.json found in {0}")]
    MissingConfigFile(PathBuf),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    /// Remote network profile without an endpoint
    #[error("Network '{0}' has no url")]
    MissingUrl(String),

    #[error("Network '{network}' is the local simulated network and cannot set {field}")]
    LocalOnlyViolation { network: String, field: &'static str },

    #[error("Network '{network}' is remote and cannot set {field}")]
    RemoteOnlyViolation { network: String, field: &'static str },

    #[error("Invalid url for {field}: {value}")]
    InvalidUrl { field: String, value: String },

    #[error("Invalid private key #{index} for network '{network}'")]
    InvalidPrivateKey { network: String, index: usize },

    #[error("Invalid address for {field}: {value}")]
    InvalidAddress { field: String, value: String },

    #[error("Environment variable {var} referenced by {field} is not set")]
    MissingEnvVar { var: String, field: String },

    #[error("Malformed variable reference in {field}: {template}")]
    MalformedReference { field: String, template: String },

    /// A literal placeholder such as `MAINNET PROVIDER URL` was never replaced
    #[error("{field} still holds placeholder text")]
    UnresolvedPlaceholder { field: String },

    #[error("Invalid compiler version '{version}': {reason}")]
    InvalidCompilerVersion { version: String, reason: String },

    #[error("Invalid {name}: must be positive, got {value}")]
    NonPositive { name: String, value: u64 },

    #[error("Invalid block gas limit for '{network}': must be at least 21000, got {value}")]
    InvalidGasLimit { network: String, value: u64 },

    #[error("Network '{network}' sets initialBaseFeePerGas but hardfork {hardfork} predates london")]
    BaseFeeBeforeLondon { network: String, hardfork: String },

    #[error("Invalid path for {name}: {reason}")]
    InvalidPath { name: &'static str, reason: String },

    #[error("Named account '{role}' uses unknown selector '{selector}'")]
    UnknownAccountSelector { role: String, selector: String },

    #[error("Named account '{0}' is not configured for this network")]
    UnknownNamedAccount(String),

    #[error("Named account '{role}' points at index {index}, but network '{network}' has {available} accounts")]
    AccountIndexOutOfRange {
        role: String,
        network: String,
        index: u32,
        available: usize,
    },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
