//! Configuration for the federation server
//!
//! Every value has a compile-time default and can be overridden at runtime
//! via a dedicated environment variable:
//! - `FEDERATION_DATA_DIR`: data directory (default `~/.config/federation/data`,
//!   or `./data` when `HOME` is unset)
//! - `FEDERATION_DB_PATH`: SQLite database file (default `<data dir>/navbar.db`)
//! - `FEDERATION_LOG_DIR`: directory for daily rolling log files; logs go to
//!   stderr when unset
//! - `FEDERATION_MAX_CONNECTIONS`: SQLite pool size (default 5)

use std::path::PathBuf;

const DEFAULT_CONFIG_DIR: &str = ".config/federation/data";
const DEV_DATA_DIR: &str = "./data";
const DB_FILE_NAME: &str = "navbar.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Get the data directory for persistence.
///
/// Priority:
/// 1. FEDERATION_DATA_DIR env variable if set
/// 2. $HOME/.config/federation/data if HOME is set
/// 3. ./data as fallback
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("FEDERATION_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(DEFAULT_CONFIG_DIR);
    }

    PathBuf::from(DEV_DATA_DIR)
}

/// Get the SQLite database path.
///
/// Priority:
/// 1. FEDERATION_DB_PATH env variable if set
/// 2. `navbar.db` inside [`get_data_dir`]
pub fn get_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("FEDERATION_DB_PATH") {
        return PathBuf::from(path);
    }

    get_data_dir().join(DB_FILE_NAME)
}

/// Directory for rolling log files, if file logging is enabled.
pub fn get_log_dir() -> Option<PathBuf> {
    std::env::var("FEDERATION_LOG_DIR").ok().map(PathBuf::from)
}

/// Get the SQLite pool size. Unparseable values fall back to the default.
pub fn get_max_connections() -> u32 {
    if let Ok(value) = std::env::var("FEDERATION_MAX_CONNECTIONS") {
        return parse_max_connections(&value);
    }

    DEFAULT_MAX_CONNECTIONS
}

fn parse_max_connections(value: &str) -> u32 {
    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => n,
        _ => DEFAULT_MAX_CONNECTIONS,
    }
}
