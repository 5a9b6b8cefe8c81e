//! Fatal error types raised at construction time (spec §7, "Configuration
//! error"). Query-time failures are never represented as errors — they
//! surface through the `-1` sentinel per spec §7's "Out-of-domain query"
//! category, which explicitly calls for no exceptions and no logging.

/// Error returned by [`crate::build::build`] when the input cannot be
/// indexed.
#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// The input is not larger than one chunk (`n <= s`), so there is
    /// nothing for the summary tree to summarize over. Spec §3 requires
    /// `n > s`; violating it is a configuration error per spec §7.
    #[error("input size {n} must be greater than the chunk size {chunk_bits}")]
    InputTooSmall { n: usize, chunk_bits: usize },
}
