// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Server configuration.
//!
//! Handles loading and merging configuration from multiple sources:
//! - Global config: `<config dir>/calltrace/config.json` (or `config.yaml`)
//! - Workspace config: `calltrace.json`, `.calltrace/config.json`, or `calltrace.yaml`
//! - Environment: `CALLTRACE_LOG_LEVEL`, `CALLTRACE_DATA_DIR`, `CALLTRACE_STORE`
//! - CLI options: command-line arguments
//!
//! Configuration is merged with precedence (CLI > env > workspace > global > defaults).

mod loader;
mod merger;
mod types;

pub use loader::{
    get_global_config_dir, load_config_file, load_global_config, load_workspace_config,
    CONFIG_FILES, GLOBAL_CONFIG_DIR, GLOBAL_CONFIG_FILES,
};

pub use merger::{
    env_layer, load_env_config, merge_config, CliOptions, ENV_DATA_DIR, ENV_LOG_LEVEL, ENV_STORE,
};

pub use types::{
    default_data_dir, ServerConfig, ServerConfigPartial, StoreKind, DEFAULT_DATABASE_FILE,
};

use crate::error::ConfigError;
use std::path::Path;

/// Load and merge all configuration sources for a workspace.
pub fn load_config(
    workspace_root: &Path,
    cli_options: CliOptions,
) -> Result<ServerConfig, ConfigError> {
    let global = load_global_config()?;
    let workspace = load_workspace_config(workspace_root)?;
    let env = load_env_config()?;

    Ok(merge_config(global, workspace, env, cli_options))
}

/// Load configuration from an explicit file, skipping workspace discovery.
pub fn load_config_from(path: &Path, cli_options: CliOptions) -> Result<ServerConfig, ConfigError> {
    let file = load_config_file(path)?;
    let env = load_env_config()?;

    Ok(merge_config(None, Some(file), env, cli_options))
}
