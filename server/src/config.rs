//! Configuration for the explorer server.
//!
//! The database location is resolved with the following precedence:
//! 1. `--db` on the command line
//! 2. `EXPLORER_DATA_DIR` environment variable
//! 3. the platform data directory (`directories::ProjectDirs`)
//! 4. `./data` (fallback for development)

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

const DATA_DIR_ENV: &str = "EXPLORER_DATA_DIR";
const MAX_CONNECTIONS_ENV: &str = "EXPLORER_MAX_CONNECTIONS";
const DEV_DATA_DIR: &str = "./data";
const DATABASE_FILE: &str = "explorer.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerConfig {
    pub database_path: PathBuf,
    pub max_connections: u32,
}

impl ExplorerConfig {
    /// Build from the environment, with `db_override` taking precedence.
    pub fn from_env(db_override: Option<&Path>) -> Self {
        let data_dir = std::env::var(DATA_DIR_ENV).ok();
        let max_connections = std::env::var(MAX_CONNECTIONS_ENV).ok();
        Self::resolve(db_override, data_dir.as_deref(), max_connections.as_deref())
    }

    fn resolve(
        db_override: Option<&Path>,
        data_dir: Option<&str>,
        max_connections: Option<&str>,
    ) -> Self {
        let database_path = match db_override {
            Some(path) => path.to_path_buf(),
            None => resolve_data_dir(data_dir).join(DATABASE_FILE),
        };
        Self {
            database_path,
            max_connections: parse_max_connections(max_connections),
        }
    }
}

/// Get the data directory for persistence.
fn resolve_data_dir(env_value: Option<&str>) -> PathBuf {
    if let Some(dir) = env_value.filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }

    if let Some(dirs) = ProjectDirs::from("", "", "chess-explorer") {
        return dirs.data_dir().to_path_buf();
    }

    PathBuf::from(DEV_DATA_DIR)
}

fn parse_max_connections(value: Option<&str>) -> u32 {
    match value.map(str::trim) {
        None | Some("") => DEFAULT_MAX_CONNECTIONS,
        Some(raw) => match raw.parse::<u32>() {
            Ok(n) if n > 0 => n,
            _ => {
                tracing::warn!(value = raw, "Ignoring invalid {MAX_CONNECTIONS_ENV}");
                DEFAULT_MAX_CONNECTIONS
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_flag_wins() {
        let config = ExplorerConfig::resolve(Some(Path::new("/tmp/x.db")), Some("/srv/data"), None);
        assert_eq!(config.database_path, PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_env_data_dir() {
        let config = ExplorerConfig::resolve(None, Some("/srv/data"), None);
        assert_eq!(config.database_path, PathBuf::from("/srv/data/explorer.db"));
    }

    #[test]
    fn test_fallback_data_dir() {
        // Either the platform data dir or ./data, depending on the environment.
        let dir = resolve_data_dir(None);
        assert!(!dir.as_os_str().is_empty());
        assert_eq!(resolve_data_dir(Some("")), dir);
    }

    #[test]
    fn test_max_connections() {
        assert_eq!(parse_max_connections(None), 5);
        assert_eq!(parse_max_connections(Some("12")), 12);
        assert_eq!(parse_max_connections(Some(" 3 ")), 3);
        assert_eq!(parse_max_connections(Some("0")), 5);
        assert_eq!(parse_max_connections(Some("lots")), 5);
    }
}
