//! A parallel range min-max tree (rmMt) index over balanced-parentheses
//! bitstrings.
//!
//! Given a bitstring `B` where each bit is an opening (`1`) or closing (`0`)
//! parenthesis, an [`RmMt`] answers tree-navigation primitives — `sum`,
//! `fwd_search`, `bwd_search`, `find_close`, `find_open`, `rank_0`/`rank_1`,
//! `select_0`/`select_1` — in time proportional to the summary tree's height
//! rather than to `n`. Construction is built in parallel over a configurable
//! number of workers; queries are read-only and safe to call concurrently
//! from multiple threads once the index is built.
//!
//! ```
//! use rmmt::{BitVector, build};
//!
//! // One big balanced group wrapping twenty nested sub-groups, long enough
//! // to span more than one summary-tree chunk.
//! let mut text = String::from("(");
//! for _ in 0..20 {
//!     text.push_str("((()()())()(()))");
//! }
//! text.push(')');
//!
//! let bits = BitVector::from_paren_bytes(text.as_bytes());
//! let index = build(bits, 4).unwrap();
//! assert_eq!(index.find_close(0), index.len() as i32 - 1);
//! ```

#![warn(rust_2018_idioms, missing_debug_implementations, unreachable_pub)]

mod bits;
mod build;
mod error;
mod layout;
mod query;
mod tables;

pub use bits::BitVector;
pub use build::build;
pub use error::BuildError;
pub use layout::RmMt;
