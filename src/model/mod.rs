//! Core data structures modeling small-molecule records.
//!
//! This module defines the toolkit-neutral building blocks (elements, bond orders, the
//! parsed [`skeleton::Skeleton`], per-record tags) and the [`mol::Mol`] facade that wraps
//! a native toolkit object. These types are produced by the SMILES and molfile parsers,
//! flow through stream pipelines, and are consumed by writers and table conversion.

pub mod atom;
pub mod mol;
pub mod props;
pub mod skeleton;
pub mod tags;
pub mod types;

pub(crate) mod valence;
