pub mod auth;
pub mod backfill;
pub mod directory;
pub mod init;
pub mod navigation;
pub mod profile_sync;
pub mod settings;
pub mod twitter;
