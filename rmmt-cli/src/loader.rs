//! Byte-file loader (component C6, spec §4.6): reads a file's raw bytes and
//! lowers them into an [`rmmt::BitVector`], mapping `(` to bit `1` and every
//! other byte (including `)`) to bit `0`. One bit is produced per byte; no
//! line handling, no trimming.

use crate::error::CliError;
use rmmt::BitVector;
use std::path::Path;

/// Read `path` and build a bitstring from its bytes, reporting the byte
/// count `n` alongside it. A read failure is a fatal I/O error (spec §7);
/// whether `n` is large enough to index is validated by the builder itself
/// when construction is attempted.
pub(crate) fn load(path: &Path) -> Result<(BitVector, usize), CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let n = bytes.len();
    Ok((BitVector::from_paren_bytes(&bytes), n))
}
