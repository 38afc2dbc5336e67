//! Solidity compiler settings
//!
//! `solidity` accepts three shapes:
//!
//! ```toml
//! solidity = "0.8.4"
//! ```
//!
//! ```toml
//! [solidity]
//! version = "0.8.4"
//! settings = { optimizer = { enabled = true, runs = 10000 } }
//! ```
//!
//! ```toml
//! [[solidity.compilers]]
//! version = "0.8.4"
//! [[solidity.compilers]]
//! version = "0.7.6"
//! [solidity.overrides."contracts/Legacy.sol"]
//! version = "0.6.12"
//! ```
//!
//! All three normalize to [`SolidityConfig`].

use crate::error::{ConfigError, ConfigResult};
use semver::{Version, VersionReq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

pub const DEFAULT_SOLC_VERSION: &str = "0.8.24";
pub const DEFAULT_OPTIMIZER_RUNS: u32 = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizerSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_runs")]
    pub runs: u32,
}

fn default_runs() -> u32 {
    DEFAULT_OPTIMIZER_RUNS
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        OptimizerSettings {
            enabled: false,
            runs: DEFAULT_OPTIMIZER_RUNS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerSettings {
    #[serde(default)]
    pub optimizer: OptimizerSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evm_version: Option<String>,
}

/// One compiler job: a solc version and its settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    pub version: String,
    #[serde(default)]
    pub settings: CompilerSettings,
}

impl CompilerConfig {
    pub fn new(version: impl Into<String>) -> Self {
        CompilerConfig {
            version: version.into(),
            settings: CompilerSettings::default(),
        }
    }

    /// Parsed solc version
    pub fn semver(&self) -> ConfigResult<Version> {
        Version::parse(&self.version).map_err(|e| ConfigError::InvalidCompilerVersion {
            version: self.version.clone(),
            reason: e.to_string(),
        })
    }

    /// `field` is where this compiler sits in the document, e.g. `solidity.compilers[1]`
    pub fn validate(&self, field: &str) -> ConfigResult<()> {
        self.semver()?;
        if self.settings.optimizer.runs == 0 {
            return Err(ConfigError::NonPositive {
                name: format!("{}.settings.optimizer.runs", field),
                value: 0,
            });
        }
        Ok(())
    }
}

/// Normalized `solidity` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolidityConfig {
    pub compilers: Vec<CompilerConfig>,
    /// Source path → compiler used for that file only
    pub overrides: BTreeMap<String, CompilerConfig>,
}

impl Default for SolidityConfig {
    fn default() -> Self {
        SolidityConfig::single(CompilerConfig::new(DEFAULT_SOLC_VERSION))
    }
}

impl SolidityConfig {
    pub fn single(compiler: CompilerConfig) -> Self {
        SolidityConfig {
            compilers: vec![compiler],
            overrides: BTreeMap::new(),
        }
    }

    /// The compiler of a single-compiler config, or the first listed
    pub fn primary(&self) -> Option<&CompilerConfig> {
        self.compilers.first()
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.compilers.is_empty() {
            return Err(ConfigError::MissingField("solidity.version".to_string()));
        }
        match self.compilers.as_slice() {
            [only] if self.overrides.is_empty() => only.validate("solidity")?,
            compilers => {
                for (index, compiler) in compilers.iter().enumerate() {
                    compiler.validate(&format!("solidity.compilers[{}]", index))?;
                }
            }
        }
        for (source, compiler) in &self.overrides {
            compiler.validate(&format!("solidity.overrides.\"{}\"", source))?;
        }
        if self.overrides.keys().any(|path| path.trim().is_empty()) {
            return Err(ConfigError::InvalidPath {
                name: "solidity.overrides",
                reason: "override key must be a source path".to_string(),
            });
        }
        Ok(())
    }

    /// Pick the compiler for `source`.
    ///
    /// A per-file override wins. Otherwise the newest configured compiler
    /// satisfying the file's `pragma solidity` requirement, or the newest
    /// overall when no pragma is given.
    pub fn compiler_for(&self, source: &str, pragma: Option<&str>) -> ConfigResult<&CompilerConfig> {
        if let Some(compiler) = self.overrides.get(source) {
            return Ok(compiler);
        }

        let reqs = match pragma {
            Some(pragma) => Some(pragma_to_reqs(pragma)?),
            None => None,
        };

        let mut best: Option<(Version, &CompilerConfig)> = None;
        for compiler in &self.compilers {
            let version = compiler.semver()?;
            if reqs
                .as_ref()
                .is_some_and(|reqs| !reqs.iter().any(|r| r.matches(&version)))
            {
                continue;
            }
            if best.as_ref().map_or(true, |(v, _)| version > *v) {
                best = Some((version, compiler));
            }
        }

        best.map(|(_, c)| c).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "no configured compiler satisfies {} for {}",
                pragma.unwrap_or("*"),
                source
            ))
        })
    }
}

/// Translate a `pragma solidity` expression into semver requirements.
///
/// Each `||` alternative becomes one requirement. Solidity allows a space
/// between an operator and its version (`>= 0.8.0 < 0.9.0`), and a bare
/// version means exactly that version, where semver would read it as `^`.
fn pragma_to_reqs(pragma: &str) -> ConfigResult<Vec<VersionReq>> {
    pragma
        .split("||")
        .map(|alternative| alternative_to_req(pragma, alternative))
        .collect()
}

fn alternative_to_req(pragma: &str, alternative: &str) -> ConfigResult<VersionReq> {
    let invalid = |reason: String| ConfigError::InvalidCompilerVersion {
        version: pragma.to_string(),
        reason,
    };

    let mut comparators = Vec::new();
    let mut op = String::new();
    for token in alternative.split_whitespace() {
        let split = token
            .find(|c: char| !matches!(c, '<' | '>' | '=' | '^' | '~'))
            .unwrap_or(token.len());
        let (token_op, version) = token.split_at(split);
        op.push_str(token_op);
        if version.is_empty() {
            continue;
        }
        let wildcard = version.contains(['*', 'x', 'X']);
        if op.is_empty() && !wildcard {
            op.push('=');
        }
        comparators.push(format!("{}{}", op, version));
        op.clear();
    }

    if !op.is_empty() {
        return Err(invalid(format!("operator '{}' has no version", op)));
    }
    if comparators.is_empty() {
        return Err(invalid("empty version requirement".to_string()));
    }

    VersionReq::parse(&comparators.join(", ")).map_err(|e| invalid(e.to_string()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SolidityInput {
    Version(String),
    Multi {
        compilers: Vec<CompilerConfig>,
        #[serde(default)]
        overrides: BTreeMap<String, CompilerConfig>,
    },
    Single(CompilerConfig),
}

#[derive(Serialize)]
#[serde(untagged)]
enum SolidityOutput<'a> {
    Single(&'a CompilerConfig),
    Multi {
        compilers: &'a [CompilerConfig],
        #[serde(skip_serializing_if = "BTreeMap::is_empty")]
        overrides: &'a BTreeMap<String, CompilerConfig>,
    },
}

impl<'de> Deserialize<'de> for SolidityConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match SolidityInput::deserialize(deserializer)? {
            SolidityInput::Version(version) => SolidityConfig::single(CompilerConfig::new(version)),
            SolidityInput::Single(compiler) => SolidityConfig::single(compiler),
            SolidityInput::Multi {
                compilers,
                overrides,
            } => SolidityConfig {
                compilers,
                overrides,
            },
        })
    }
}

impl Serialize for SolidityConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.compilers.as_slice() {
            [only] if self.overrides.is_empty() => SolidityOutput::Single(only).serialize(serializer),
            compilers => SolidityOutput::Multi {
                compilers,
                overrides: &self.overrides,
            }
            .serialize(serializer),
        }
    }
}
