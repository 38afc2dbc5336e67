//! Devkit Tools Library
//!
//! Typed configuration for a smart-contract development project: network
//! profiles, compiler settings, directory layout, test runner, named
//! accounts and explorer credentials, plus an RPC probe for the active
//! network.

pub mod compiler;
pub mod config;
pub mod error;
pub mod logging;
pub mod network;
pub mod project;
pub mod rpc;
pub mod secret;

pub use compiler::{CompilerConfig, OptimizerSettings, SolidityConfig};
pub use config::{Config, ConfigLoader, DevkitToml, Format};
pub use error::{ConfigError, ConfigResult};
pub use network::{GasPrice, Hardfork, NetworkKind, NetworkProfile, ResolvedNetwork};
pub use project::{AccountRef, NamedAccounts, ProjectPaths, TestRunnerConfig};
pub use secret::{EnvSource, ProcessEnv, SecretValue};
