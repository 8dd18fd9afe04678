//! Config command implementations

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::output::{print_error, print_info, print_success, print_warning};
use sb_core::config::{self, ClientConfig};

fn resolve(config_path: Option<&PathBuf>) -> PathBuf {
    config_path
        .cloned()
        .unwrap_or_else(config::default_config_path)
}

/// Load the client configuration.
///
/// An explicit path must exist; the default path falls back to built-in
/// defaults when there is no file yet.
pub fn load_or_default(config_path: Option<&PathBuf>) -> Result<ClientConfig> {
    if let Some(path) = config_path {
        return config::load_client_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path));
    }

    let path = config::default_config_path();
    if path.exists() {
        config::load_client_config(&path)
            .with_context(|| format!("Failed to load config from {:?}", path))
    } else {
        tracing::debug!(path = ?path, "No config file, using defaults");
        Ok(ClientConfig::default().validated()?)
    }
}

/// Show current configuration
pub fn config_show(config_path: Option<&PathBuf>) -> Result<()> {
    let path = resolve(config_path);

    if !path.exists() {
        print_warning(&format!("No configuration file found at {:?}", path));
        print_info("Run 'signbridge config init' to create one. Built-in defaults:");
        println!();
        println!("{}", toml::to_string_pretty(&ClientConfig::default())?);
        return Ok(());
    }

    print_info(&format!("Configuration file: {:?}", path));
    println!();

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    println!("{}", content);

    Ok(())
}

/// Write the default configuration
pub fn config_init(config_path: Option<&PathBuf>, force: bool) -> Result<()> {
    let path = resolve(config_path);

    if path.exists() && !force {
        print_error(&format!("Config file already exists: {:?}", path));
        print_info("Use --force to overwrite");
        return Ok(());
    }

    config::save_config(&path, &ClientConfig::default())
        .with_context(|| format!("Failed to write config file: {:?}", path))?;
    print_success(&format!("Created configuration file: {:?}", path));

    Ok(())
}

/// Print where the configuration file lives
pub fn config_path(config_path: Option<&PathBuf>) -> Result<()> {
    let path = resolve(config_path);
    println!("{}", path.display());
    Ok(())
}
