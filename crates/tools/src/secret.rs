//! Environment-backed secret values
//!
//! Endpoints, private keys and API keys are never meant to live in the
//! config file itself. Any string field holding one is a [`SecretValue`]:
//! a template that may reference environment variables as `${NAME}` or
//! `${NAME:-fallback}`. References are substituted at resolution time from
//! an [`EnvSource`].

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Lookup of environment variables.
///
/// The process environment is the normal source; tests pass a `HashMap`.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads from `std::env`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// A config string that may reference environment variables.
///
/// Serializes as the raw template so a document round-trips unchanged.
/// `Debug` and `Display` never print literal content.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretValue(String);

enum Segment<'a> {
    Literal(&'a str),
    Reference {
        name: &'a str,
        fallback: Option<&'a str>,
    },
}

impl SecretValue {
    pub fn new(template: impl Into<String>) -> Self {
        SecretValue(template.into())
    }

    /// Shorthand for a template that is exactly `${name}`
    pub fn from_env(name: &str) -> Self {
        SecretValue(format!("${{{}}}", name))
    }

    /// The unresolved template as written in the config file
    pub fn template(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Names of all variables this template references
    pub fn references(&self) -> Vec<String> {
        match self.segments() {
            Some(segments) => segments
                .into_iter()
                .filter_map(|s| match s {
                    Segment::Reference { name, .. } => Some(name.to_string()),
                    Segment::Literal(_) => None,
                })
                .collect(),
            None => Vec::new(),
        }
    }

    /// True when the template has no literal text besides variable references
    pub fn is_reference_only(&self) -> bool {
        match self.segments() {
            Some(segments) => {
                !segments.is_empty()
                    && segments
                        .iter()
                        .all(|s| matches!(s, Segment::Reference { .. }))
            }
            None => false,
        }
    }

    /// Substitute every reference from `env`.
    ///
    /// `field` names the config key in error messages.
    pub fn resolve(&self, field: &str, env: &dyn EnvSource) -> ConfigResult<String> {
        let segments = self.segments().ok_or_else(|| ConfigError::MalformedReference {
            field: field.to_string(),
            template: self.0.clone(),
        })?;

        let mut out = String::with_capacity(self.0.len());
        for segment in segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Reference { name, fallback } => {
                    match (env.var(name).filter(|v| !v.is_empty()), fallback) {
                        (Some(value), _) => out.push_str(&value),
                        (None, Some(fallback)) => out.push_str(fallback),
                        (None, None) => {
                            return Err(ConfigError::MissingEnvVar {
                                var: name.to_string(),
                                field: field.to_string(),
                            })
                        }
                    }
                }
            }
        }

        if looks_like_placeholder(&out) {
            return Err(ConfigError::UnresolvedPlaceholder {
                field: field.to_string(),
            });
        }

        Ok(out)
    }

    /// Form safe to print: references are shown, literal secrets are masked
    pub fn redacted(&self) -> String {
        if self.is_reference_only() {
            self.0.clone()
        } else if self.0.is_empty() {
            String::new()
        } else {
            "***".to_string()
        }
    }

    fn segments(&self) -> Option<Vec<Segment<'_>>> {
        let mut segments = Vec::new();
        let mut rest = self.0.as_str();

        while let Some(start) = rest.find("${") {
            if start > 0 {
                segments.push(Segment::Literal(&rest[..start]));
            }
            let after = &rest[start + 2..];
            let end = after.find('}')?;
            let inner = &after[..end];
            let (name, fallback) = match inner.split_once(":-") {
                Some((name, fallback)) => (name, Some(fallback)),
                None => (inner, None),
            };
            if !is_var_name(name) {
                return None;
            }
            segments.push(Segment::Reference { name, fallback });
            rest = &after[end + 1..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest));
        }
        Some(segments)
    }
}

impl From<&str> for SecretValue {
    fn from(s: &str) -> Self {
        SecretValue::new(s)
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue({})", self.redacted())
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.redacted())
    }
}

fn is_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Detects filler such as `MAINNET PROVIDER URL` or `ACCOUNT GOES HERE`
pub fn looks_like_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.contains(char::is_whitespace)
        && value.chars().any(|c| c.is_ascii_alphabetic())
        && value
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .all(|c| c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_literal_passes_through() {
        let value = SecretValue::new("https://eth.example.org");
        assert_eq!(
            value.resolve("url", &env(&[])).unwrap(),
            "https://eth.example.org"
        );
        assert!(value.references().is_empty());
    }

    #[test]
    fn test_reference_substitution() {
        let value = SecretValue::new("https://eth.example.org/v2/${ALCHEMY_KEY}");
        let resolved = value
            .resolve("url", &env(&[("ALCHEMY_KEY", "abc123")]))
            .unwrap();
        assert_eq!(resolved, "https://eth.example.org/v2/abc123");
        assert_eq!(value.references(), vec!["ALCHEMY_KEY".to_string()]);
    }

    #[test]
    fn test_fallback_used_when_unset_or_empty() {
        let value = SecretValue::new("${RPC_URL:-http://127.0.0.1:8545}");
        assert_eq!(
            value.resolve("url", &env(&[])).unwrap(),
            "http://127.0.0.1:8545"
        );
        assert_eq!(
            value.resolve("url", &env(&[("RPC_URL", "")])).unwrap(),
            "http://127.0.0.1:8545"
        );
    }

    #[test]
    fn test_missing_var_reports_field() {
        let value = SecretValue::from_env("MAINNET_RPC_URL");
        match value.resolve("networks.mainnet.url", &env(&[])) {
            Err(ConfigError::MissingEnvVar { var, field }) => {
                assert_eq!(var, "MAINNET_RPC_URL");
                assert_eq!(field, "networks.mainnet.url");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_reference() {
        assert!(matches!(
            SecretValue::new("${UNCLOSED").resolve("x", &env(&[])),
            Err(ConfigError::MalformedReference { .. })
        ));
        assert!(matches!(
            SecretValue::new("${1BAD}").resolve("x", &env(&[])),
            Err(ConfigError::MalformedReference { .. })
        ));
    }

    #[test]
    fn test_placeholder_rejected() {
        assert!(looks_like_placeholder("MAINNET PROVIDER URL"));
        assert!(looks_like_placeholder("RINKEBY ACCOUNT GOES HERE"));
        assert!(!looks_like_placeholder("https://mainnet.infura.io/v3/abc"));
        assert!(!looks_like_placeholder("test test test junk"));

        let value = SecretValue::new("ETHERSCAN API KEY");
        assert!(matches!(
            value.resolve("etherscan.apiKey", &env(&[])),
            Err(ConfigError::UnresolvedPlaceholder { .. })
        ));
    }

    #[test]
    fn test_redaction() {
        let literal = SecretValue::new("0xdeadbeef");
        assert_eq!(literal.to_string(), "***");
        assert_eq!(format!("{:?}", literal), "SecretValue(***)");

        let reference = SecretValue::from_env("PRIVATE_KEY");
        assert_eq!(reference.to_string(), "${PRIVATE_KEY}");
        assert!(reference.is_reference_only());
    }
}
