//! Schedule file loading.
//!
//! # Responsibilities
//! - Read the YAML schedule file from disk
//! - Reject unknown keys at every level
//! - Turn top-level `Schedules` into a requirement-free block ahead of `ConfigBlocks`

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::model::{Config, ConfigBlock, MetricConfig};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read schedule file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid schedule file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("schedule file is empty")]
    Empty,
}

/// Document layout of the schedule file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "PascalCase")]
struct ScheduleFile {
    #[serde(default)]
    schedules: MetricConfig,

    #[serde(default)]
    config_blocks: Vec<ConfigBlock>,
}

/// Load and validate a schedule file.
pub fn load_schedules(path: &Path) -> Result<Config, LoadError> {
    let content = fs::read_to_string(path)?;
    parse_schedules(&content)
}

/// Parse schedule file content.
pub fn parse_schedules(content: &str) -> Result<Config, LoadError> {
    // A file caught mid-write is usually empty; never mistake it for "no schedules".
    if content.trim().is_empty() {
        return Err(LoadError::Empty);
    }

    let file: ScheduleFile = serde_yaml::from_str(content)?;

    let mut blocks = Vec::with_capacity(file.config_blocks.len() + 1);
    if !file.schedules.is_empty() {
        blocks.push(ConfigBlock::global(file.schedules));
    }
    blocks.extend(file.config_blocks);

    Ok(Config::new(blocks))
}
