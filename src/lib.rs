//! # MolForge
//!
//! **MolForge** is a pure-Rust small-molecule record engine that streams SD and SMILES files through lazy pipelines, hides the choice of chemistry toolkit behind one molecule facade, and moves records between flat files and tables. The crate favors explicit configuration, strong typing, and a single error surface so pipelines stay predictable from parsing to output.
//!
//! ## Features
//!
//! - **Toolkit-agnostic facade** – `Mol` and `Atom` expose one capability set over two native engines (`graph`, backed by `petgraph`, and the index-stable `table` engine), selected through an explicit `ChemContext`.
//! - **Property overlay** – Typed per-record properties sit in front of the native SD tag store, so values keep their type in memory and still serialize as SD data items.
//! - **Pull pipelines** – `PullStream` sources and `Transform`/`Lambda`/`Pushback` stages compose by value and process arbitrarily large inputs one record at a time.
//! - **Stream I/O** – SD and SMILES readers and writers detect format and gzip compression from file names and release their handles deterministically.
//! - **Tabular conversion** – `Table` conversion to and from SD files, including base64 fingerprint expansion into bit columns, plus CSV interchange.

mod context;
mod error;
mod model;

pub mod fingerprint;
pub mod io;
pub mod native;
pub mod ops;
pub mod smiles;
pub mod stream;
pub mod table;
pub mod toolkit;

pub use context::{ChemContext, ScopedToolkit};
pub use error::Error;
pub use model::atom::{Atom, AtomMut};
pub use model::mol::Mol;
pub use model::props::{PropValue, format_float};
pub use model::skeleton::{Bond, Skeleton, SkeletonAtom, StereoRef, Tetrahedral, Winding};
pub use model::tags::TagStore;
pub use model::types::{BondOrder, Element, Point};
pub use toolkit::Toolkit;
