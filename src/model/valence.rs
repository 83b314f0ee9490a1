//! Default valence rules used to derive implicit hydrogen counts.
//!
//! Both toolkits and the SMILES writer share these rules: the graph toolkit recomputes
//! implicit hydrogens every time they are requested, the table toolkit evaluates them once
//! when a molecule is built, and the SMILES writer uses them to decide whether an atom can
//! be written without brackets.

use super::types::Element;

/// Normal valences of the elements that receive implicit hydrogens.
///
/// Elements not listed here (metals, noble gases, hydrogen) never gain implicit hydrogens.
pub fn default_valences(element: Element) -> &'static [u8] {
    match element {
        Element::B => &[3],
        Element::C | Element::Si => &[4],
        Element::N => &[3, 5],
        Element::P | Element::As => &[3, 5],
        Element::O => &[2],
        Element::S | Element::Se => &[2, 4, 6],
        Element::F | Element::Cl | Element::Br | Element::I => &[1],
        _ => &[],
    }
}

/// Elements that SMILES may write without brackets.
pub fn is_organic_subset(element: Element, aromatic: bool) -> bool {
    if aromatic {
        matches!(
            element,
            Element::B | Element::C | Element::N | Element::O | Element::P | Element::S
        )
    } else {
        matches!(
            element,
            Element::B
                | Element::C
                | Element::N
                | Element::O
                | Element::P
                | Element::S
                | Element::F
                | Element::Cl
                | Element::Br
                | Element::I
        )
    }
}

fn shifted_valence(element: Element, valence: u8, charge: i8) -> Option<u8> {
    let shifted = match element {
        // Isoelectronic shifts: B- behaves like C, C+/C- lose a bond.
        Element::B => valence as i16 - charge as i16,
        Element::C | Element::Si => valence as i16 - (charge as i16).abs(),
        _ => valence as i16 + charge as i16,
    };
    u8::try_from(shifted).ok()
}

/// Number of hydrogens an atom needs to reach its smallest admissible valence.
///
/// # Arguments
///
/// * `element` - Atom element.
/// * `charge` - Formal charge, shifting the admissible valences.
/// * `aromatic` - Whether the atom is flagged aromatic; an aromatic atom bonded through
///   aromatic bonds gains one extra unit of explicit valence.
/// * `explicit_valence` - Sum of integer bond contributions (see `BondOrder::valence`),
///   including bonds to explicit hydrogen atoms.
/// * `has_aromatic_bond` - Whether any incident bond is aromatic.
///
/// # Returns
///
/// The implicit hydrogen count, zero when the explicit valence already meets or exceeds
/// every admissible valence.
pub fn implicit_hydrogens(
    element: Element,
    charge: i8,
    aromatic: bool,
    explicit_valence: u8,
    has_aromatic_bond: bool,
) -> u8 {
    let valences = default_valences(element);
    if valences.is_empty() {
        return 0;
    }
    let used = explicit_valence + u8::from(aromatic && has_aromatic_bond);
    valences
        .iter()
        .filter_map(|&v| shifted_valence(element, v, charge))
        .find(|&v| v >= used)
        .map(|v| v - used)
        .unwrap_or(0)
}
