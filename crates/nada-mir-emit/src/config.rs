use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Overrides the directory compiled programs are written to.
pub const TARGET_DIR_ENV: &str = "NADA_TARGET_DIR";

pub const DEFAULT_TARGET_DIR: &str = "target";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputStyle {
    Compact,
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitterConfig {
    pub style: OutputStyle,
    pub target_dir: Option<PathBuf>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            style: OutputStyle::Pretty,
            target_dir: None,
        }
    }
}

impl EmitterConfig {
    pub fn compact() -> Self {
        Self {
            style: OutputStyle::Compact,
            ..Self::default()
        }
    }

    pub fn with_target_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.target_dir = Some(dir.into());
        self
    }

    /// Explicit directory, then `NADA_TARGET_DIR`, then `./target`.
    pub fn target_dir(&self) -> std::io::Result<PathBuf> {
        let cwd = std::env::current_dir()?;
        Ok(select_target_dir(
            self.target_dir.as_deref(),
            std::env::var_os(TARGET_DIR_ENV),
            &cwd,
        ))
    }
}

fn select_target_dir(explicit: Option<&Path>, env: Option<OsString>, cwd: &Path) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    match env {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => cwd.join(DEFAULT_TARGET_DIR),
    }
}
