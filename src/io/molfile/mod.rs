//! MDL V2000 connection tables and SD data items.

mod reader;
mod writer;

pub use reader::read_record;
pub use writer::{write_molfile, write_sd_record};

use crate::model::skeleton::{Skeleton, StereoRef, Winding};

pub(crate) const FORMAT: &str = "SDF";

/// Neighbour ordering that atom parity flags refer to: neighbours by ascending atom
/// number, an implicit hydrogen last.
pub(crate) fn parity_refs(skeleton: &Skeleton, centre: usize) -> Vec<StereoRef> {
    let mut neighbors: Vec<usize> = skeleton.neighbors(centre).map(|(n, _)| n).collect();
    neighbors.sort_unstable();
    let mut refs: Vec<StereoRef> = neighbors.into_iter().map(StereoRef::Atom).collect();
    if skeleton.implicit_hydrogens(centre) == 1 {
        refs.push(StereoRef::ImplicitH);
    }
    refs
}

/// Parity 1 (clockwise with the highest-numbered neighbour pointing away) equals an
/// anticlockwise winding seen from the first reference.
pub(crate) fn winding_from_parity(parity: u8) -> Winding {
    if parity == 1 {
        Winding::Anticlockwise
    } else {
        Winding::Clockwise
    }
}

pub(crate) fn parity_from_winding(winding: Winding) -> u8 {
    match winding {
        Winding::Anticlockwise => 1,
        Winding::Clockwise => 2,
    }
}
