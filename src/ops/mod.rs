//! Per-record molecule operations usable as pipeline stages.
//!
//! Each operation is a plain function over `&mut Mol` plus a [`Compute`](crate::stream::Compute)
//! stage wrapping it, so the same logic runs on a single molecule or inside a
//! [`Transform`](crate::stream::Transform) over a whole stream.

mod fields;
mod hydro;

pub use fields::{CountAtoms, FormatArrays, ParseArrays, format_arrays, parse_arrays};

pub use hydro::{HydroConfig, HydroMode, Hydrogens, apply_hydrogens};
