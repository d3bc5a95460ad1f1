//! Cross-Platform Path Utilities
//!
//! Functions for resolving the application's storage directory.

use std::path::PathBuf;

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the promptchain directory (~/.promptchain/)
pub fn promptchain_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".promptchain"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &PathBuf) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Get the promptchain directory, creating if it doesn't exist
pub fn ensure_promptchain_dir() -> AppResult<PathBuf> {
    let path = promptchain_dir()?;
    ensure_dir(&path)?;
    Ok(path)
}
