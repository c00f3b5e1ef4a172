//! fids-board specific configuration

use std::path::PathBuf;

/// Flight board service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port
    pub port: u16,
    /// SQLite database path
    pub db_path: PathBuf,
    /// Announcement clip library root
    pub audio_root: PathBuf,
}
