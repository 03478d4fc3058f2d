// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration merging.
//!
//! Handles merging configurations from different sources with proper precedence.

use std::path::PathBuf;

use crate::error::ConfigError;

use super::types::{ServerConfig, ServerConfigPartial, StoreKind};

/// Environment variable overriding the log level.
pub const ENV_LOG_LEVEL: &str = "CALLTRACE_LOG_LEVEL";
/// Environment variable overriding the data directory.
pub const ENV_DATA_DIR: &str = "CALLTRACE_DATA_DIR";
/// Environment variable overriding the store backend.
pub const ENV_STORE: &str = "CALLTRACE_STORE";

/// CLI options that can override configuration.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub log_level: Option<String>,
    pub store: Option<StoreKind>,
    pub database: Option<PathBuf>,
}

/// Build the environment layer from a variable lookup.
pub fn env_layer<F>(lookup: F) -> Result<ServerConfigPartial, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let store = match non_empty(ENV_STORE) {
        Some(value) => Some(value.parse::<StoreKind>()?),
        None => None,
    };

    Ok(ServerConfigPartial {
        log_level: non_empty(ENV_LOG_LEVEL),
        data_dir: non_empty(ENV_DATA_DIR).map(PathBuf::from),
        store,
        ..Default::default()
    })
}

/// Environment layer from the process environment.
pub fn load_env_config() -> Result<ServerConfigPartial, ConfigError> {
    env_layer(|key| std::env::var(key).ok())
}

/// Merge multiple configurations with precedence.
///
/// Precedence (highest to lowest):
/// 1. CLI options
/// 2. Environment variables
/// 3. Workspace config (calltrace.json)
/// 4. Global config (<config dir>/calltrace/config.json)
/// 5. Default values
pub fn merge_config(
    global: Option<ServerConfigPartial>,
    workspace: Option<ServerConfigPartial>,
    env: ServerConfigPartial,
    cli: CliOptions,
) -> ServerConfig {
    let mut result = ServerConfig::default();

    for layer in [global, workspace].into_iter().flatten() {
        result.apply(&layer);
    }
    result.apply(&env);

    apply_cli_options(&mut result, &cli);

    result
}

fn apply_cli_options(result: &mut ServerConfig, cli: &CliOptions) {
    if let Some(ref level) = cli.log_level {
        result.log_level = level.clone();
    }
    if let Some(store) = cli.store {
        result.store = store;
    }
    if let Some(ref database) = cli.database {
        // An explicit path replaces both the directory and the file name.
        match (database.parent(), database.file_name()) {
            (Some(parent), Some(file)) if !parent.as_os_str().is_empty() => {
                result.data_dir = parent.to_path_buf();
                result.database_file = PathBuf::from(file);
            }
            _ => result.database_file = database.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_merge_defaults() {
        let config = merge_config(None, None, ServerConfigPartial::default(), CliOptions::default());
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_merge_precedence() {
        let global = ServerConfigPartial {
            name: Some("global".to_string()),
            log_level: Some("warn".to_string()),
            busy_timeout_ms: Some(10),
            ..Default::default()
        };
        let workspace = ServerConfigPartial {
            log_level: Some("debug".to_string()),
            store: Some(StoreKind::Memory),
            ..Default::default()
        };
        let env = ServerConfigPartial {
            store: Some(StoreKind::Sqlite),
            ..Default::default()
        };
        let cli = CliOptions {
            log_level: Some("trace".to_string()),
            ..Default::default()
        };

        let config = merge_config(Some(global), Some(workspace), env, cli);
        assert_eq!(config.name, "global");
        assert_eq!(config.busy_timeout_ms, 10);
        assert_eq!(config.store, StoreKind::Sqlite);
        assert_eq!(config.log_level, "trace");
    }

    #[test]
    fn test_cli_database_path() {
        let cli = CliOptions {
            database: Some(PathBuf::from("/tmp/traces/calls.db")),
            ..Default::default()
        };
        let config = merge_config(None, None, ServerConfigPartial::default(), cli);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/traces"));
        assert_eq!(config.database_path(), PathBuf::from("/tmp/traces/calls.db"));
    }

    #[test]
    fn test_env_layer() {
        let env = env_layer(lookup(&[
            (ENV_LOG_LEVEL, "debug"),
            (ENV_DATA_DIR, "/srv/calltrace"),
            (ENV_STORE, "memory"),
        ]))
        .unwrap();
        assert_eq!(env.log_level.as_deref(), Some("debug"));
        assert_eq!(env.data_dir, Some(PathBuf::from("/srv/calltrace")));
        assert_eq!(env.store, Some(StoreKind::Memory));
    }

    #[test]
    fn test_env_layer_ignores_blank_and_rejects_unknown_store() {
        let env = env_layer(lookup(&[(ENV_LOG_LEVEL, "  ")])).unwrap();
        assert!(env.log_level.is_none());

        let err = env_layer(lookup(&[(ENV_STORE, "postgres")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
