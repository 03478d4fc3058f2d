// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration loading from JSON and YAML files.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::ServerConfigPartial;

/// Workspace config file names to search for (in order).
pub const CONFIG_FILES: &[&str] = &["calltrace.json", ".calltrace/config.json", "calltrace.yaml"];

/// Global config directory name (under the platform config dir).
pub const GLOBAL_CONFIG_DIR: &str = "calltrace";

/// Global config file names, tried in order.
pub const GLOBAL_CONFIG_FILES: &[&str] = &["config.json", "config.yaml"];

/// Get the global config directory path.
pub fn get_global_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(GLOBAL_CONFIG_DIR))
}

/// Load the global configuration layer, if one exists.
pub fn load_global_config() -> Result<Option<ServerConfigPartial>, ConfigError> {
    let dir = match get_global_config_dir() {
        Some(dir) => dir,
        None => return Ok(None),
    };

    first_existing(&dir, GLOBAL_CONFIG_FILES)
}

/// Load the workspace configuration layer from `workspace_root`.
pub fn load_workspace_config(
    workspace_root: &Path,
) -> Result<Option<ServerConfigPartial>, ConfigError> {
    first_existing(workspace_root, CONFIG_FILES)
}

fn first_existing(
    dir: &Path,
    names: &[&str],
) -> Result<Option<ServerConfigPartial>, ConfigError> {
    for filename in names {
        let path = dir.join(filename);
        if path.exists() {
            return load_config_file(&path).map(Some);
        }
    }
    Ok(None)
}

/// Load a configuration file (JSON or YAML, by extension).
pub fn load_config_file(path: &Path) -> Result<ServerConfigPartial, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(ConfigError::from),
        _ => serde_json::from_str(&content).map_err(ConfigError::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreKind;
    use tempfile::TempDir;

    #[test]
    fn test_load_workspace_config_not_found() {
        let temp = TempDir::new().unwrap();
        assert!(load_workspace_config(temp.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_workspace_config_json() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("calltrace.json"),
            r#"{"name": "demo", "store": "memory"}"#,
        )
        .unwrap();

        let config = load_workspace_config(temp.path()).unwrap().unwrap();
        assert_eq!(config.name.as_deref(), Some("demo"));
        assert_eq!(config.store, Some(StoreKind::Memory));
    }

    #[test]
    fn test_load_workspace_config_yaml() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("calltrace.yaml"),
            "logLevel: debug\ndatabaseFile: logs.db\n",
        )
        .unwrap();

        let config = load_workspace_config(temp.path()).unwrap().unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.database_file, Some(PathBuf::from("logs.db")));
    }

    #[test]
    fn test_json_takes_precedence_over_yaml() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("calltrace.json"), r#"{"name": "json"}"#).unwrap();
        std::fs::write(temp.path().join("calltrace.yaml"), "name: yaml\n").unwrap();

        let config = load_workspace_config(temp.path()).unwrap().unwrap();
        assert_eq!(config.name.as_deref(), Some("json"));
    }

    #[test]
    fn test_load_invalid_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("calltrace.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(load_config_file(&path), Err(ConfigError::JsonError(_))));
    }

    #[test]
    fn test_global_config_dir() {
        if let Some(dir) = get_global_config_dir() {
            assert!(dir.ends_with(GLOBAL_CONFIG_DIR));
        }
    }
}
