//! Configuration directory paths
//!
//! Uses XDG directories via `dirs` crate.
//!
//! Platform-specific locations:
//! - Linux: `~/.config/gh-deploy-board/`
//! - macOS: `~/Library/Application Support/gh-deploy-board/`
//! - Windows: `%APPDATA%\gh-deploy-board\`

use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_NAME: &str = "gh-deploy-board";
const SESSION_STORE_FILE: &str = "sessions.toml";

/// Get the application config directory, creating it if needed
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    let dir = base.join(APP_NAME);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config directory: {:?}", dir))?;
    Ok(dir)
}

/// Get path to the session store file
pub fn session_store_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(SESSION_STORE_FILE))
}
