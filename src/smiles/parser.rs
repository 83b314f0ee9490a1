use crate::error::Error;
use crate::model::skeleton::{Skeleton, SkeletonAtom, StereoRef, Tetrahedral, Winding};
use crate::model::types::{BondOrder, Element};
use std::collections::HashMap;

const FORMAT: &str = "SMILES";
const UNRESOLVED: StereoRef = StereoRef::Atom(usize::MAX);

/// Parses a SMILES string into a skeleton.
///
/// Unbracketed atoms get valence-derived hydrogens; bracket atoms carry exactly the
/// hydrogens written inside the brackets. Tetrahedral `@`/`@@` marks are kept, directional
/// bond marks (`/`, `\`) are read as plain single bonds.
pub fn parse(smiles: &str) -> Result<Skeleton, Error> {
    parse_at(smiles, 1)
}

pub(crate) fn parse_at(smiles: &str, line_number: usize) -> Result<Skeleton, Error> {
    Parser::new(smiles, line_number).run()
}

struct RingOpening {
    atom: usize,
    order: Option<BondOrder>,
    slot: usize,
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    line_number: usize,
    skeleton: Skeleton,
    neighbor_order: Vec<Vec<StereoRef>>,
    chirality: Vec<Option<Winding>>,
    prev: Option<usize>,
    branches: Vec<Option<usize>>,
    pending_bond: Option<BondOrder>,
    rings: HashMap<u32, RingOpening>,
}

impl<'a> Parser<'a> {
    fn new(smiles: &'a str, line_number: usize) -> Self {
        Self {
            bytes: smiles.trim().as_bytes(),
            pos: 0,
            line_number,
            skeleton: Skeleton::new(),
            neighbor_order: Vec::new(),
            chirality: Vec::new(),
            prev: None,
            branches: Vec::new(),
            pending_bond: None,
            rings: HashMap::new(),
        }
    }

    fn error(&self, details: impl AsRef<str>) -> Error {
        Error::parse(
            FORMAT,
            None,
            self.line_number,
            format!("{} at position {}", details.as_ref(), self.pos),
        )
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn run(mut self) -> Result<Skeleton, Error> {
        if self.bytes.is_empty() {
            return Err(self.error("empty SMILES string"));
        }

        while let Some(c) = self.peek() {
            match c {
                b'(' => {
                    if self.prev.is_none() {
                        return Err(self.error("branch opened before any atom"));
                    }
                    self.branches.push(self.prev);
                    self.pos += 1;
                }
                b')' => {
                    if self.pending_bond.is_some() {
                        return Err(self.error("bond symbol before ')'"));
                    }
                    self.prev = self
                        .branches
                        .pop()
                        .ok_or_else(|| self.error("unbalanced ')'"))?;
                    self.pos += 1;
                }
                b'.' => {
                    if self.pending_bond.is_some() {
                        return Err(self.error("bond symbol before '.'"));
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                b'-' | b'=' | b'#' | b':' | b'/' | b'\\' => {
                    if self.pending_bond.is_some() {
                        return Err(self.error("two consecutive bond symbols"));
                    }
                    self.pending_bond = Some(match c {
                        b'=' => BondOrder::Double,
                        b'#' => BondOrder::Triple,
                        b':' => BondOrder::Aromatic,
                        _ => BondOrder::Single,
                    });
                    self.pos += 1;
                }
                b'0'..=b'9' | b'%' => self.ring_bond()?,
                b'[' => self.bracket_atom()?,
                _ => self.organic_atom()?,
            }
        }

        if !self.branches.is_empty() {
            return Err(self.error("unclosed branch"));
        }
        if self.pending_bond.is_some() {
            return Err(self.error("dangling bond symbol"));
        }
        if let Some(digit) = self.rings.keys().min() {
            return Err(self.error(format!("unclosed ring bond {digit}")));
        }

        self.finish_stereo();
        Ok(self.skeleton)
    }

    fn organic_atom(&mut self) -> Result<(), Error> {
        let bytes = self.bytes;
        let rest = &bytes[self.pos..];
        let (element, aromatic, len) = match rest {
            [b'C', b'l', ..] => (Element::Cl, false, 2),
            [b'B', b'r', ..] => (Element::Br, false, 2),
            [b'B', ..] => (Element::B, false, 1),
            [b'C', ..] => (Element::C, false, 1),
            [b'N', ..] => (Element::N, false, 1),
            [b'O', ..] => (Element::O, false, 1),
            [b'P', ..] => (Element::P, false, 1),
            [b'S', ..] => (Element::S, false, 1),
            [b'F', ..] => (Element::F, false, 1),
            [b'I', ..] => (Element::I, false, 1),
            [b'b', ..] => (Element::B, true, 1),
            [b'c', ..] => (Element::C, true, 1),
            [b'n', ..] => (Element::N, true, 1),
            [b'o', ..] => (Element::O, true, 1),
            [b'p', ..] => (Element::P, true, 1),
            [b's', ..] => (Element::S, true, 1),
            [b'*', ..] => (Element::Unknown, false, 1),
            [other, ..] => {
                return Err(self.error(format!("unexpected character '{}'", *other as char)));
            }
            [] => return Err(self.error("unexpected end of input")),
        };
        self.pos += len;
        let mut atom = SkeletonAtom::new(element);
        atom.aromatic = aromatic;
        self.attach(atom, None, 0);
        Ok(())
    }

    fn bracket_atom(&mut self) -> Result<(), Error> {
        self.pos += 1;

        let isotope = self.number()?.unwrap_or(0);
        let isotope =
            u16::try_from(isotope).map_err(|_| self.error("isotope out of range"))?;

        let (element, aromatic) = self.bracket_symbol()?;

        let mut chirality = None;
        if self.peek() == Some(b'@') {
            self.pos += 1;
            chirality = Some(if self.peek() == Some(b'@') {
                self.pos += 1;
                Winding::Clockwise
            } else {
                Winding::Anticlockwise
            });
            if matches!(self.peek(), Some(b'T' | b'A' | b'S' | b'O')) {
                return Err(self.error("only tetrahedral @/@@ chirality is supported"));
            }
        }

        let mut hydrogens = 0u32;
        if self.peek() == Some(b'H') {
            self.pos += 1;
            hydrogens = self.number()?.unwrap_or(1);
        }
        let hydrogens =
            u8::try_from(hydrogens).map_err(|_| self.error("hydrogen count out of range"))?;

        let charge = self.charge()?;

        if self.peek() == Some(b':') {
            self.pos += 1;
            if self.number()?.is_none() {
                return Err(self.error("atom class requires a number"));
            }
        }

        if self.peek() != Some(b']') {
            return Err(self.error("expected ']'"));
        }
        self.pos += 1;

        let mut atom = SkeletonAtom::new(element);
        atom.aromatic = aromatic;
        atom.isotope = isotope;
        atom.formal_charge = charge;
        atom.hydrogens = Some(hydrogens);
        self.attach(atom, chirality, hydrogens);
        Ok(())
    }

    fn bracket_symbol(&mut self) -> Result<(Element, bool), Error> {
        let bytes = self.bytes;
        let rest = &bytes[self.pos..];
        match rest {
            [b'*', ..] => {
                self.pos += 1;
                Ok((Element::Unknown, false))
            }
            [first, ..] if first.is_ascii_lowercase() => {
                for (text, element) in [
                    ("se", Element::Se),
                    ("as", Element::As),
                    ("te", Element::Te),
                    ("b", Element::B),
                    ("c", Element::C),
                    ("n", Element::N),
                    ("o", Element::O),
                    ("p", Element::P),
                    ("s", Element::S),
                ] {
                    if rest.starts_with(text.as_bytes()) {
                        self.pos += text.len();
                        return Ok((element, true));
                    }
                }
                Err(self.error("unknown aromatic symbol"))
            }
            [first, second, ..] if first.is_ascii_uppercase() && second.is_ascii_lowercase() => {
                let pair = [*first, *second];
                let two = std::str::from_utf8(&pair).ok().and_then(Element::from_symbol);
                if let Some(element) = two {
                    self.pos += 2;
                    return Ok((element, false));
                }
                self.single_letter_element(*first)
            }
            [first, ..] if first.is_ascii_uppercase() => self.single_letter_element(*first),
            _ => Err(self.error("expected element symbol")),
        }
    }

    fn single_letter_element(&mut self, letter: u8) -> Result<(Element, bool), Error> {
        let text = [letter];
        let element = std::str::from_utf8(&text)
            .ok()
            .and_then(Element::from_symbol)
            .ok_or_else(|| self.error("unknown element symbol"))?;
        self.pos += 1;
        Ok((element, false))
    }

    fn charge(&mut self) -> Result<i8, Error> {
        let sign: i32 = match self.peek() {
            Some(b'+') => 1,
            Some(b'-') => -1,
            _ => return Ok(0),
        };
        let symbol = self.bytes[self.pos];
        self.pos += 1;
        let magnitude = match self.number()? {
            Some(n) => n as i32,
            None => {
                let mut count = 1;
                while self.peek() == Some(symbol) {
                    self.pos += 1;
                    count += 1;
                }
                count
            }
        };
        i8::try_from(sign * magnitude).map_err(|_| self.error("charge out of range"))
    }

    fn number(&mut self) -> Result<Option<u32>, Error> {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if start == self.pos {
            return Ok(None);
        }
        std::str::from_utf8(&self.bytes[start..self.pos])
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .map(Some)
            .ok_or_else(|| self.error("number out of range"))
    }

    fn ring_bond(&mut self) -> Result<(), Error> {
        let current = self
            .prev
            .ok_or_else(|| self.error("ring bond before any atom"))?;
        let digit = if self.peek() == Some(b'%') {
            self.pos += 1;
            let start = self.pos;
            let digits = self.bytes.get(start..start + 2);
            match digits {
                Some([a, b]) if a.is_ascii_digit() && b.is_ascii_digit() => {
                    self.pos += 2;
                    u32::from(a - b'0') * 10 + u32::from(b - b'0')
                }
                _ => return Err(self.error("'%' must be followed by two digits")),
            }
        } else {
            let d = self.bytes[self.pos] - b'0';
            self.pos += 1;
            u32::from(d)
        };
        let bond = self.pending_bond.take();

        match self.rings.remove(&digit) {
            Some(opening) => {
                if opening.atom == current {
                    return Err(self.error("ring bond closes on its own atom"));
                }
                let order = match (opening.order, bond) {
                    (Some(a), Some(b)) if a != b => {
                        return Err(self.error(format!("conflicting ring bond {digit}")));
                    }
                    (Some(a), _) => a,
                    (None, Some(b)) => b,
                    (None, None) => self.default_order(opening.atom, current),
                };
                if !self.skeleton.add_bond(opening.atom, current, order) {
                    return Err(self.error(format!("duplicate bond from ring {digit}")));
                }
                self.neighbor_order[opening.atom][opening.slot] = StereoRef::Atom(current);
                self.neighbor_order[current].push(StereoRef::Atom(opening.atom));
            }
            None => {
                let slot = self.neighbor_order[current].len();
                self.neighbor_order[current].push(UNRESOLVED);
                self.rings.insert(
                    digit,
                    RingOpening {
                        atom: current,
                        order: bond,
                        slot,
                    },
                );
            }
        }
        Ok(())
    }

    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        if self.skeleton.atoms[a].aromatic && self.skeleton.atoms[b].aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn attach(&mut self, atom: SkeletonAtom, chirality: Option<Winding>, hydrogens: u8) {
        let idx = self.skeleton.add_atom(atom);
        self.neighbor_order.push(Vec::new());
        self.chirality.push(chirality);

        if let Some(prev) = self.prev {
            let order = self
                .pending_bond
                .take()
                .unwrap_or_else(|| self.default_order(prev, idx));
            self.skeleton.add_bond(prev, idx, order);
            self.neighbor_order[prev].push(StereoRef::Atom(idx));
            self.neighbor_order[idx].push(StereoRef::Atom(prev));
        }
        if hydrogens > 0 {
            self.neighbor_order[idx].push(StereoRef::ImplicitH);
        }
        self.prev = Some(idx);
    }

    fn finish_stereo(&mut self) {
        for (center, winding) in self.chirality.iter().enumerate() {
            let Some(winding) = winding else { continue };
            let refs = &self.neighbor_order[center];
            if (3..=4).contains(&refs.len()) && !refs.contains(&UNRESOLVED) {
                self.skeleton.stereo.push(Tetrahedral {
                    center,
                    refs: refs.clone(),
                    winding: *winding,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chain_with_branches_and_bond_orders() {
        let skeleton = parse("CC(=O)O").unwrap();
        assert_eq!(skeleton.atoms.len(), 4);
        assert_eq!(skeleton.bonds.len(), 3);
        assert!(
            skeleton
                .bonds
                .iter()
                .any(|b| b.a1_idx == 1 && b.a2_idx == 2 && b.order == BondOrder::Double)
        );
        assert_eq!(skeleton.implicit_hydrogens(0), 3);
        assert_eq!(skeleton.implicit_hydrogens(1), 0);
        assert_eq!(skeleton.implicit_hydrogens(3), 1);
    }

    #[test]
    fn ring_closures_create_bonds() {
        let skeleton = parse("C1CCCCC1").unwrap();
        assert_eq!(skeleton.bonds.len(), 6);
        assert!(skeleton.bonds.iter().any(|b| b.a1_idx == 0 && b.a2_idx == 5));
        assert!((0..6).all(|i| skeleton.implicit_hydrogens(i) == 2));
    }

    #[test]
    fn aromatic_rings_get_aromatic_bonds() {
        let skeleton = parse("c1ccncc1").unwrap();
        assert!(skeleton.bonds.iter().all(|b| b.order == BondOrder::Aromatic));
        assert_eq!(skeleton.implicit_hydrogens(0), 1);
        assert_eq!(skeleton.implicit_hydrogens(3), 0);
    }

    #[test]
    fn bracket_atoms_carry_isotope_charge_and_hydrogens() {
        let skeleton = parse("[13CH3][NH3+]").unwrap();
        assert_eq!(skeleton.atoms[0].isotope, 13);
        assert_eq!(skeleton.atoms[0].hydrogens, Some(3));
        assert_eq!(skeleton.atoms[1].formal_charge, 1);
        assert_eq!(skeleton.atoms[1].hydrogens, Some(3));

        let skeleton = parse("[O--]").unwrap();
        assert_eq!(skeleton.atoms[0].formal_charge, -2);
        let skeleton = parse("[Fe+3]").unwrap();
        assert_eq!(skeleton.atoms[0].formal_charge, 3);
    }

    #[test]
    fn explicit_hydrogen_atoms_are_kept_as_atoms() {
        let skeleton = parse("[H]O[H]").unwrap();
        assert_eq!(skeleton.atoms.len(), 3);
        assert_eq!(skeleton.implicit_hydrogens(1), 0);
        assert_eq!(skeleton.total_hydrogens(1), 2);
    }

    #[test]
    fn chirality_records_neighbor_order_with_implicit_hydrogen() {
        let skeleton = parse("N[C@@H](C)C(=O)O").unwrap();
        let centre = skeleton.stereo_of(1).unwrap();
        assert_eq!(centre.winding, Winding::Clockwise);
        assert_eq!(
            centre.refs,
            vec![
                StereoRef::Atom(0),
                StereoRef::ImplicitH,
                StereoRef::Atom(2),
                StereoRef::Atom(3)
            ]
        );
    }

    #[test]
    fn ring_closure_neighbors_keep_their_digit_position() {
        let skeleton = parse("[C@]1(F)(Cl)Br.I1").unwrap();
        let centre = skeleton.stereo_of(0).unwrap();
        assert_eq!(centre.refs[0], StereoRef::Atom(4));
        assert_eq!(centre.refs[1], StereoRef::Atom(1));
    }

    #[test]
    fn dot_separates_components() {
        let skeleton = parse("[Na+].[Cl-]").unwrap();
        assert_eq!(skeleton.atoms.len(), 2);
        assert!(skeleton.bonds.is_empty());
    }

    #[test]
    fn malformed_input_is_rejected() {
        for bad in ["", "C(", "C)", "C1CC", "C==C", "[C", "X", "C%1", "(C)"] {
            let err = parse(bad).expect_err(bad);
            match err {
                Error::Parse { format, .. } => assert_eq!(format, "SMILES"),
                other => panic!("unexpected error for {bad}: {other:?}"),
            }
        }
    }
}
