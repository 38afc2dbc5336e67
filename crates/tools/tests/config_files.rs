use devkit_tools::config::{ConfigLoader, DevkitToml, ENV_CONFIG_PATH, ENV_NETWORK};
use devkit_tools::network::{GasPrice, Hardfork, NetworkKind};
use devkit_tools::{AccountRef, ConfigError};
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

const SAMPLE: &str = include_str!("../../../devkit.toml");

const KEY: &str = "0x8b3a350cf5c34c9194ca85829a2df0ec3153be0318b5e2d3348e872092edffba";

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn project_env() -> HashMap<String, String> {
    env(&[
        ("MAINNET_RPC_URL", "https://eth-mainnet.example.org/v2/abc"),
        ("RINKEBY_RPC_URL", "https://eth-rinkeby.example.org/v2/abc"),
        ("MAINNET_PRIVATE_KEY", KEY),
        ("RINKEBY_PRIVATE_KEY", KEY),
        ("ETHERSCAN_API_KEY", "ABC123"),
    ])
}

fn project_dir(file: &str, content: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(file), content).unwrap();
    dir
}

#[test]
fn sample_config_carries_project_settings() {
    let doc = DevkitToml::from_toml_str(SAMPLE).unwrap();

    assert_eq!(doc.default_network, "hardhat");
    let local = &doc.networks["hardhat"];
    assert_eq!(local.hardfork, Some(Hardfork::London));
    assert_eq!(local.initial_base_fee_per_gas, Some(0));
    assert_eq!(
        local.forking.as_ref().and_then(|f| f.block_number),
        Some(13_124_004)
    );
    assert_eq!(
        doc.networks["mainnet"].gas_price,
        Some(GasPrice::Wei(65_000_000_000))
    );

    let compiler = doc.solidity.primary().unwrap();
    assert_eq!(compiler.version, "0.8.4");
    assert!(compiler.settings.optimizer.enabled);
    assert!(compiler.settings.optimizer.runs > 0);
    assert!(doc.mocha.timeout > 0);
}

#[test]
fn sample_config_has_no_literal_secrets() {
    let doc = DevkitToml::from_toml_str(SAMPLE).unwrap();
    for (name, profile) in &doc.networks {
        if let Some(url) = &profile.url {
            assert!(url.is_reference_only(), "{} url is not an env reference", name);
        }
    }
}

#[test]
fn loads_discovered_toml() {
    let dir = project_dir("devkit.toml", SAMPLE);
    let config = ConfigLoader::new()
        .with_dir(dir.path())
        .with_env(project_env())
        .load()
        .unwrap();

    assert_eq!(config.network.name, "hardhat");
    assert_eq!(config.network.kind, NetworkKind::Local);
    assert_eq!(config.source.as_deref(), Some(dir.path().join("devkit.toml").as_path()));
    assert_eq!(config.paths.sources, dir.path().join("contracts"));
    assert_eq!(config.named_account("deployer").unwrap(), AccountRef::Index(0));
}

#[test]
fn network_from_env_is_resolved() {
    let dir = project_dir("devkit.toml", SAMPLE);
    let mut vars = project_env();
    vars.insert(ENV_NETWORK.to_string(), "mainnet".to_string());

    let config = ConfigLoader::new()
        .with_dir(dir.path())
        .with_env(vars)
        .load()
        .unwrap();

    assert_eq!(config.network.name, "mainnet");
    assert_eq!(config.network.chain_id, Some(1));
    assert_eq!(config.network.block_gas_limit, Some(12_487_794));
    assert_eq!(config.explorer_api_key.as_deref(), Some("ABC123"));
    assert_eq!(config.named_account("deployer").unwrap(), AccountRef::Index(0));
}

#[test]
fn toml_is_preferred_over_json() {
    let dir = project_dir("devkit.toml", SAMPLE);
    fs::write(dir.path().join("devkit.json"), "{\"defaultNetwork\": \"mainnet\"}").unwrap();

    let path = DevkitToml::discover(dir.path()).unwrap();
    assert_eq!(path, dir.path().join("devkit.toml"));
}

#[test]
fn json_document_and_env_path() {
    let doc = DevkitToml::from_toml_str(SAMPLE).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings").join("devkit.json");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    doc.save(&path).unwrap();

    let mut vars = project_env();
    vars.insert(ENV_CONFIG_PATH.to_string(), path.display().to_string());
    let loader = ConfigLoader::new().with_dir(dir.path()).with_env(vars);

    let (found, reloaded) = loader.load_document().unwrap();
    assert_eq!(found, path);
    assert_eq!(reloaded, doc);

    let config = loader.load().unwrap();
    assert_eq!(config.paths.root, dir.path().join("settings"));
}

#[test]
fn relative_config_path_yields_absolute_paths() {
    // Integration tests run from the crate directory
    let config = ConfigLoader::new()
        .with_path("../../devkit.toml")
        .with_env(project_env())
        .load()
        .unwrap();

    let source = config.source.as_deref().unwrap();
    assert!(source.is_absolute());
    for dir in [
        &config.paths.root,
        &config.paths.sources,
        &config.paths.tests,
        &config.paths.cache,
        &config.paths.artifacts,
    ] {
        assert!(dir.is_absolute(), "{} is relative", dir.display());
    }
    assert!(config.paths.sources.ends_with("contracts"));
    assert!(config.paths.root.join("devkit.toml").is_file());
    assert!(!config
        .paths
        .root
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir)));
}

#[test]
fn save_and_reload_toml() {
    let doc = DevkitToml::from_toml_str(SAMPLE).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("devkit.toml");
    doc.save(&path).unwrap();
    assert_eq!(DevkitToml::load(&path).unwrap(), doc);
}

#[test]
fn missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = ConfigLoader::new()
        .with_dir(dir.path())
        .with_env(env(&[]))
        .load();
    assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));

    let result = ConfigLoader::new()
        .with_path(dir.path().join("absent.toml"))
        .with_env(env(&[]))
        .load();
    assert!(matches!(result, Err(ConfigError::FileRead { .. })));
}

#[test]
fn placeholder_secrets_are_rejected() {
    let legacy = SAMPLE.replace("${RINKEBY_RPC_URL}", "RINKEBY PROVIDER GOES HERE");
    let dir = project_dir("devkit.toml", &legacy);

    let result = ConfigLoader::new()
        .with_dir(dir.path())
        .with_network("rinkeby")
        .with_env(project_env())
        .load();
    assert!(matches!(
        result,
        Err(ConfigError::UnresolvedPlaceholder { .. })
    ));
}

#[test]
fn malformed_documents_fail_to_load() {
    let dir = project_dir("devkit.toml", "[mocha]\ntimeout = \"soon\"\n");
    let result = ConfigLoader::new()
        .with_dir(dir.path())
        .with_env(env(&[]))
        .load();
    assert!(matches!(result, Err(ConfigError::TomlError(_))));

    let dir = project_dir("devkit.json", "{\"networks\": {\"mainnet\": {}}}");
    let result = ConfigLoader::new()
        .with_dir(dir.path())
        .with_env(env(&[]))
        .load();
    assert!(matches!(result, Err(ConfigError::MissingUrl(_))));
}
