//! Fatal CLI errors (spec §7): configuration errors and I/O errors. Both are
//! printed to stderr via [`std::fmt::Display`] and exit the process nonzero;
//! neither panics nor retries.

use std::path::PathBuf;

/// Error surfaced by the CLI binary before it can complete a reporting run.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    /// The input file could not be read.
    #[error("failed to read \"{path}\": {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The input was read successfully but is unfit for indexing (spec §3:
    /// `n > s` is required).
    #[error(transparent)]
    Configuration(#[from] rmmt::BuildError),
}
