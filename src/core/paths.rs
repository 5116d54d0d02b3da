use crate::error::{Error, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable that relocates the whole config root.
pub const CONFIG_DIR_ENV: &str = "SHIPNOTE_CONFIG_DIR";

/// Base shipnote config directory (universal ~/.config/shipnote/ on all platforms)
pub fn shipnote() -> Result<PathBuf> {
    if let Ok(dir) = env::var(CONFIG_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected(
                "APPDATA environment variable not set on Windows".to_string(),
            )
        })?;
        Ok(PathBuf::from(appdata).join("shipnote"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected(
                "HOME environment variable not set on Unix-like system".to_string(),
            )
        })?;
        Ok(PathBuf::from(home).join(".config").join("shipnote"))
    }
}

/// Global shipnote.json config file path
pub fn shipnote_json(root: &Path) -> PathBuf {
    root.join("shipnote.json")
}

/// Servers directory
pub fn servers(root: &Path) -> PathBuf {
    root.join("servers")
}

/// Server config file path
pub fn server(root: &Path, id: &str) -> PathBuf {
    servers(root).join(format!("{}.json", id))
}
