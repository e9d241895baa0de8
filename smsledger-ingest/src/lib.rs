//! smsledger-ingest: SMS backup sources and the backup XML parser.

pub mod parsers;
pub mod source;
pub mod types;

pub use parsers::sms_backup::parse_sms_backup_xml;
pub use source::{latest_backup, source_error_from_io, LocalBackupSource, MessageSource};
pub use types::Backup;
