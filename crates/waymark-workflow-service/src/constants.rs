//! Service-wide constants
//!
//! Single source of truth for defaults and environment variable names.

/// Default values for service configuration
pub mod defaults {
    /// Undo snapshots kept per editing session
    pub const HISTORY_DEPTH: usize = 100;
    /// Whether warnings block a save
    pub const REJECT_ON_WARNINGS: bool = false;
    /// Config file name inside a data directory
    pub const CONFIG_FILE: &str = "waymark.json";
}

/// Environment variables that override loaded configuration
pub mod env {
    /// Directory for the file store; selects the file store when set
    pub const STORE_DIR: &str = "WAYMARK_STORE_DIR";
    pub const HISTORY_DEPTH: &str = "WAYMARK_HISTORY_DEPTH";
    pub const REJECT_ON_WARNINGS: &str = "WAYMARK_REJECT_ON_WARNINGS";
}

/// File store layout
pub mod files {
    /// Extension of a stored workflow record
    pub const RECORD_EXTENSION: &str = "json";
    /// Suffix of a record being written
    pub const TEMP_SUFFIX: &str = "tmp";
    /// Lock file serialising writers to one directory
    pub const LOCK_FILE: &str = ".waymark.lock";
}
