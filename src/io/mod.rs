//! Molecule file I/O.
//!
//! Format and compression are chosen from the file name: `.sdf`/`.sd`/`.mol` select SD
//! files, `.smi`/`.smiles`/`.ism`/`.can` select SMILES, and a trailing `.gz` adds gzip in
//! either direction. Readers are [`PullStream`](crate::stream::PullStream) sources.

mod format;
mod input;
pub mod molfile;
mod output;

pub use format::{Compression, MolFormat, PathSpec};
pub use input::{MolInputStream, ReadOptions};
pub use output::{MolOutputStream, WriteOptions};
