//! Local backup folders as the message source.
//!
//! Layout mirrors what backup apps write to a synced drive:
//!   <root>/<profile>/sms-20240101120000.xml
//!   <root>/<profile>/sms-20240102120000.xml   <- newest by name wins

use smsledger_core::SyncError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::parsers::sms_backup::parse_sms_backup_xml;
use crate::types::Backup;

/// Supplies the raw messages for one profile.
pub trait MessageSource {
    fn fetch(&self, profile: &str) -> Result<Backup, SyncError>;
}

/// Map an I/O failure to the batch error taxonomy.
///
/// Refused access needs the user to re-grant it; everything else is a plain source failure.
pub fn source_error_from_io(err: std::io::Error, what: &Path) -> SyncError {
    match err.kind() {
        ErrorKind::PermissionDenied => SyncError::ReauthRequired(format!("{}: {err}", what.display())),
        ErrorKind::NotFound => SyncError::NotFound(what.display().to_string()),
        _ => SyncError::Source(format!("{}: {err}", what.display())),
    }
}

fn is_backup_name(name: &str) -> bool {
    name.contains("sms-") && name.ends_with(".xml")
}

/// Newest `sms-*.xml` in `dir`, by descending file name.
pub fn latest_backup(dir: &Path) -> Result<PathBuf, SyncError> {
    let entries = std::fs::read_dir(dir).map_err(|e| source_error_from_io(e, dir))?;

    let mut best: Option<(String, PathBuf)> = None;
    for entry in entries {
        let entry = entry.map_err(|e| source_error_from_io(e, dir))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_backup_name(&name) {
            continue;
        }
        if best.as_ref().is_none_or(|(b, _)| name > *b) {
            best = Some((name, entry.path()));
        }
    }

    best.map(|(_, p)| p).ok_or_else(|| {
        SyncError::NotFound(format!("no SMS backup file found in folder '{}'", dir.display()))
    })
}

/// Reads profile folders under a root directory.
#[derive(Debug, Clone)]
pub struct LocalBackupSource {
    root: PathBuf,
}

impl LocalBackupSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn profile_dir(&self, profile: &str) -> PathBuf {
        self.root.join(profile)
    }
}

impl MessageSource for LocalBackupSource {
    fn fetch(&self, profile: &str) -> Result<Backup, SyncError> {
        let dir = self.profile_dir(profile);
        if !dir.is_dir() {
            return Err(SyncError::NotFound(format!(
                "folder '{profile}' not found under {}",
                self.root.display()
            )));
        }

        let path = latest_backup(&dir)?;
        let xml = std::fs::read_to_string(&path).map_err(|e| source_error_from_io(e, &path))?;
        let messages = parse_sms_backup_xml(&xml)
            .map_err(|e| SyncError::Source(format!("{}: {e:#}", path.display())))?;

        tracing::debug!(path = %path.display(), count = messages.len(), "read backup");
        Ok(Backup { path, messages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const ONE_SMS: &str = r#"<smses count="1"><sms date="1700000000000" body="Rs 10 debited" /></smses>"#;

    #[test]
    fn test_latest_backup_picks_highest_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("sms-20240101.xml"), ONE_SMS).unwrap();
        fs::write(dir.path().join("sms-20240305.xml"), ONE_SMS).unwrap();
        fs::write(dir.path().join("calls-20250101.xml"), ONE_SMS).unwrap();
        fs::write(dir.path().join("sms-20250101.txt"), ONE_SMS).unwrap();

        let p = latest_backup(dir.path()).unwrap();
        assert_eq!(p.file_name().unwrap(), "sms-20240305.xml");
    }

    #[test]
    fn test_latest_backup_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        let err = latest_backup(dir.path()).unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));
    }

    #[test]
    fn test_fetch_reads_profile_folder() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("Mom")).unwrap();
        fs::write(root.path().join("Mom").join("sms-1.xml"), ONE_SMS).unwrap();

        let source = LocalBackupSource::new(root.path());
        let backup = source.fetch("Mom").unwrap();
        assert_eq!(backup.file_name(), "sms-1.xml");
        assert_eq!(backup.messages.len(), 1);

        let missing = source.fetch("Dad").unwrap_err();
        assert!(matches!(missing, SyncError::NotFound(_)));
    }

    #[test]
    fn test_malformed_backup_is_source_error() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("Mom")).unwrap();
        fs::write(root.path().join("Mom").join("sms-1.xml"), "<smses><sms></smses>").unwrap();

        let err = LocalBackupSource::new(root.path()).fetch("Mom").unwrap_err();
        assert!(matches!(err, SyncError::Source(_)));
        assert!(!err.is_reauth());
    }

    #[test]
    fn test_permission_denied_requires_reauth() {
        let err = source_error_from_io(
            std::io::Error::from(ErrorKind::PermissionDenied),
            Path::new("/backups/Mom"),
        );
        assert!(err.is_reauth());
    }
}
