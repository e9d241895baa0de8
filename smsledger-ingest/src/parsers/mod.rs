pub mod sms_backup;
