//! Typed error types for the report reader.

use std::io;
use std::path::PathBuf;

/// Conditions that stop a report from being read.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum CheckerError {
    /// The workspace root does not exist or is not a directory.
    #[error("workspace root not found: {}", path.display())]
    MissingRoot {
        /// The root that was given.
        path: PathBuf,
    },

    /// The workspace root could not be made absolute.
    #[error("cannot resolve workspace root {}", path.display())]
    InvalidRoot {
        /// The root that was given.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },
}
