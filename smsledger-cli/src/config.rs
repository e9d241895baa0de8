use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use smsledger_pipeline::ClassifierConfig;
use std::fs;
use std::path::PathBuf;

use crate::state::{default_backup_root, ensure_smsledger_home};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub user: UserSection,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSection {
    /// Owner key for stored transactions and rules
    pub id: String,
    /// IANA zone used when listing transactions
    pub timezone: String,
    /// Folder holding one sub-folder per profile; defaults to ~/.smsledger/backups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_root: Option<PathBuf>,
}

impl Default for UserSection {
    fn default() -> Self {
        Self {
            id: "local".to_string(),
            timezone: "Asia/Kolkata".to_string(),
            backup_root: None,
        }
    }
}

impl Config {
    pub fn backup_root(&self) -> Result<PathBuf> {
        match &self.user.backup_root {
            Some(p) => Ok(p.clone()),
            None => default_backup_root(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_smsledger_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}
