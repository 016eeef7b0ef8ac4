//! `logix.toml` project configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use logix_l5x::ExportProfile;
use logix_sync::PushOptions;

pub const FILE_NAME: &str = "logix.toml";

/// Settings shared by every command. Missing tables and keys take defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogixConfig {
    /// Literals written into generated documents.
    pub export: ExportProfile,
    /// Routine matching used by `logix push`.
    pub push: PushOptions,
}

impl LogixConfig {
    /// Search upward from `start_dir` for a `logix.toml` file, parse and return it
    /// along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(FILE_NAME);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let config: LogixConfig = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((config, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing logix.toml")
    }
}
