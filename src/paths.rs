//! Data directory resolution.
//!
//! Resolution order:
//! 1) CLI --data-dir (or TALLY_DATA_DIR, bound to the flag)
//! 2) Platform data directory (e.g. `~/.local/share/tally`)

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::{Error, Result};

/// Resolve the data directory holding the event log, snapshot, and config.
pub fn resolve_data_dir(cli_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = cli_dir {
        return Ok(dir.to_path_buf());
    }

    let dirs = ProjectDirs::from("", "", "tally").ok_or_else(|| {
        Error::OperationFailed(
            "could not determine a platform data directory; pass --data-dir".to_string(),
        )
    })?;
    Ok(dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins() {
        let dir = PathBuf::from("/tmp/tally-test");
        assert_eq!(resolve_data_dir(Some(dir.as_path())).unwrap(), dir);
    }
}
