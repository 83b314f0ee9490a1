//! SMILES line notation.
//!
//! The parser turns SMILES text into a [`Skeleton`](crate::model::skeleton::Skeleton);
//! the writer ranks atoms by iterative neighbourhood refinement and emits a deterministic
//! string whose traversal rules are chosen by a [`CanonPolicy`].

mod parser;
mod writer;

pub use parser::parse;
pub(crate) use parser::parse_at;
pub use writer::{CanonPolicy, write};
