//! Attach the offending config file to raw I/O failures.

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Turns `io::Result` from config file access into [`ApplicationError::ConfigFile`].
pub trait ConfigIoExt<T> {
    /// `action` reads as a verb: "read", "open".
    fn config_file_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T> ConfigIoExt<T> for io::Result<T> {
    fn config_file_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|source| ApplicationError::ConfigFile {
            action: action.to_string(),
            path: path.to_path_buf(),
            source,
        })
    }
}
