//! User identity management.
//!
//! Every task and every stats query is scoped to one user. Resolution order:
//! 1) CLI --user (explicit)
//! 2) TALLY_USER environment variable
//! 3) Persisted value in `<data-dir>/user`
//! 4) Config default (user.default)
//!
//! A user id that resolves to nothing is a caller error, never a silent
//! default: the stats engine treats a missing identifier as a contract
//! violation.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Error, Result};

const USER_FILENAME: &str = "user";

/// Resolve the current user from CLI, environment, persisted value, and config.
pub fn resolve_user(data_dir: &Path, cli_user: Option<&str>, config: &Config) -> Result<String> {
    if let Some(user) = non_empty(cli_user) {
        return Ok(user.to_string());
    }

    if let Ok(env_user) = std::env::var("TALLY_USER") {
        if let Some(user) = non_empty(Some(env_user.as_str())) {
            return Ok(user.to_string());
        }
    }

    if let Some(user) = load_persisted_user(data_dir)? {
        return Ok(user);
    }

    if let Some(user) = non_empty(config.user.default.as_deref()) {
        return Ok(user.to_string());
    }

    Err(Error::MissingUser)
}

/// Persist the user identity in `<data-dir>/user`.
pub fn persist_user(data_dir: &Path, user: &str) -> Result<()> {
    let user = non_empty(Some(user))
        .ok_or_else(|| Error::InvalidArgument("user name cannot be empty".to_string()))?;

    std::fs::create_dir_all(data_dir)?;
    std::fs::write(user_path(data_dir), format!("{user}\n"))?;
    Ok(())
}

/// Load the persisted user identity, if present.
pub fn load_persisted_user(data_dir: &Path) -> Result<Option<String>> {
    let path = user_path(data_dir);
    if !path.exists() {
        return Ok(None);
    }

    let raw = std::fs::read_to_string(path)?;
    let user = raw.trim();
    if user.is_empty() {
        return Ok(None);
    }

    Ok(Some(user.to_string()))
}

fn user_path(data_dir: &Path) -> PathBuf {
    data_dir.join(USER_FILENAME)
}

fn non_empty(input: Option<&str>) -> Option<&str> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
