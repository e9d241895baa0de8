use smsledger_core::RawMessage;
use std::path::PathBuf;

/// Messages read from one backup file.
#[derive(Debug, Clone, PartialEq)]
pub struct Backup {
    /// File the messages came from (used in sync reports)
    pub path: PathBuf,
    pub messages: Vec<RawMessage>,
}

impl Backup {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}
