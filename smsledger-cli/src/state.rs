use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$SMSLEDGER_HOME`, or `~/.smsledger`
pub fn smsledger_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("SMSLEDGER_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".smsledger"))
}

pub fn ensure_smsledger_home() -> Result<PathBuf> {
    let dir = smsledger_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn store_path() -> Result<PathBuf> {
    Ok(ensure_smsledger_home()?.join("store.json"))
}

/// Where profile folders live unless the config says otherwise
pub fn default_backup_root() -> Result<PathBuf> {
    Ok(smsledger_home()?.join("backups"))
}
