//! Persistent best score stored as a single JSON number.

use std::{fs, io::ErrorKind, path::Path};

use anyhow::{Context, Result};

/// Reads the stored best score; a missing file counts as zero.
pub(crate) fn load(path: &Path) -> Result<u32> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(0),
        Err(error) => {
            return Err(error)
                .with_context(|| format!("failed to read high score from {}", path.display()))
        }
    };
    serde_json::from_str(&contents)
        .with_context(|| format!("high score file {} is not a number", path.display()))
}

/// Stores `score` if it beats the current best and reports whether it did.
pub(crate) fn record(path: &Path, score: u32) -> Result<bool> {
    let best = load(path)?;
    if score <= best {
        return Ok(false);
    }

    let json = serde_json::to_string(&score).context("failed to encode high score")?;
    fs::write(path, json)
        .with_context(|| format!("failed to write high score to {}", path.display()))?;
    log::info!("new high score {score} (previous {best})");
    Ok(true)
}
