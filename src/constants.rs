//! App-wide constants.
//!
//! Centralises the tool name, the well-known directory names, and the
//! derived log filenames so a rename only requires changing this file.

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "cmsload";

/// Well-known app home directory name under the user's home directory.
/// Shared with the cmsweb service.
pub const HOME_DIR_NAME: &str = ".cmsweb";

/// Data directory name under the app home.
pub const DATA_DIR_NAME: &str = "dataload";

/// Config filename inside the data directory.
pub const CONFIG_FILENAME: &str = "cmsload.toml";

/// Derived log filename for the records daemon.
pub const RECORDSD_LOG_FILENAME: &str = "recordsd.log";

/// Derived log filename for the web service.
pub const CMSWEB_LOG_FILENAME: &str = "cmsweb.log";
