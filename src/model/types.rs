use nalgebra::Point3;
use std::fmt;
use std::str::FromStr;

pub type Point = Point3<f64>;

/// Chemical element, discriminant equal to the atomic number.
///
/// `Unknown` stands in for atomic number zero (dummy atoms, `*` in SMILES) and for any
/// number outside the periodic table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Element {
    Unknown = 0,
    H = 1,
    He = 2,
    Li = 3,
    Be = 4,
    B = 5,
    C = 6,
    N = 7,
    O = 8,
    F = 9,
    Ne = 10,
    Na = 11,
    Mg = 12,
    Al = 13,
    Si = 14,
    P = 15,
    S = 16,
    Cl = 17,
    Ar = 18,
    K = 19,
    Ca = 20,
    Sc = 21,
    Ti = 22,
    V = 23,
    Cr = 24,
    Mn = 25,
    Fe = 26,
    Co = 27,
    Ni = 28,
    Cu = 29,
    Zn = 30,
    Ga = 31,
    Ge = 32,
    As = 33,
    Se = 34,
    Br = 35,
    Kr = 36,
    Rb = 37,
    Sr = 38,
    Y = 39,
    Zr = 40,
    Nb = 41,
    Mo = 42,
    Tc = 43,
    Ru = 44,
    Rh = 45,
    Pd = 46,
    Ag = 47,
    Cd = 48,
    In = 49,
    Sn = 50,
    Sb = 51,
    Te = 52,
    I = 53,
    Xe = 54,
    Cs = 55,
    Ba = 56,
    La = 57,
    Ce = 58,
    Pr = 59,
    Nd = 60,
    Pm = 61,
    Sm = 62,
    Eu = 63,
    Gd = 64,
    Tb = 65,
    Dy = 66,
    Ho = 67,
    Er = 68,
    Tm = 69,
    Yb = 70,
    Lu = 71,
    Hf = 72,
    Ta = 73,
    W = 74,
    Re = 75,
    Os = 76,
    Ir = 77,
    Pt = 78,
    Au = 79,
    Hg = 80,
    Tl = 81,
    Pb = 82,
    Bi = 83,
    Po = 84,
    At = 85,
    Rn = 86,
    Fr = 87,
    Ra = 88,
    Ac = 89,
    Th = 90,
    Pa = 91,
    U = 92,
    Np = 93,
    Pu = 94,
    Am = 95,
    Cm = 96,
    Bk = 97,
    Cf = 98,
    Es = 99,
    Fm = 100,
    Md = 101,
    No = 102,
    Lr = 103,
    Rf = 104,
    Db = 105,
    Sg = 106,
    Bh = 107,
    Hs = 108,
    Mt = 109,
    Ds = 110,
    Rg = 111,
    Cn = 112,
    Nh = 113,
    Fl = 114,
    Mc = 115,
    Lv = 116,
    Ts = 117,
    Og = 118,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

use Element as E;

const ELEMENTS: [Element; 119] = [
    E::Unknown, E::H, E::He, E::Li, E::Be, E::B, E::C, E::N, E::O, E::F,
    E::Ne, E::Na, E::Mg, E::Al, E::Si, E::P, E::S, E::Cl, E::Ar, E::K,
    E::Ca, E::Sc, E::Ti, E::V, E::Cr, E::Mn, E::Fe, E::Co, E::Ni, E::Cu,
    E::Zn, E::Ga, E::Ge, E::As, E::Se, E::Br, E::Kr, E::Rb, E::Sr, E::Y,
    E::Zr, E::Nb, E::Mo, E::Tc, E::Ru, E::Rh, E::Pd, E::Ag, E::Cd, E::In,
    E::Sn, E::Sb, E::Te, E::I, E::Xe, E::Cs, E::Ba, E::La, E::Ce, E::Pr,
    E::Nd, E::Pm, E::Sm, E::Eu, E::Gd, E::Tb, E::Dy, E::Ho, E::Er, E::Tm,
    E::Yb, E::Lu, E::Hf, E::Ta, E::W, E::Re, E::Os, E::Ir, E::Pt, E::Au,
    E::Hg, E::Tl, E::Pb, E::Bi, E::Po, E::At, E::Rn, E::Fr, E::Ra, E::Ac,
    E::Th, E::Pa, E::U, E::Np, E::Pu, E::Am, E::Cm, E::Bk, E::Cf, E::Es,
    E::Fm, E::Md, E::No, E::Lr, E::Rf, E::Db, E::Sg, E::Bh, E::Hs, E::Mt,
    E::Ds, E::Rg, E::Cn, E::Nh, E::Fl, E::Mc, E::Lv, E::Ts, E::Og,
];

const SYMBOLS: [&str; 119] = [
    "*", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al",
    "Si", "P", "S", "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co",
    "Ni", "Cu", "Zn", "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb",
    "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn", "Sb", "Te", "I", "Xe", "Cs",
    "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm",
    "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl", "Pb", "Bi",
    "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg",
    "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

impl Element {
    /// Maps an atomic number onto its element; numbers past oganesson map to `Unknown`.
    pub fn from_atomic_num(num: u8) -> Self {
        ELEMENTS.get(num as usize).copied().unwrap_or(Element::Unknown)
    }

    /// Looks up an element by its case-sensitive symbol (`"Cl"`, not `"CL"`).
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        if symbol == "*" {
            return Some(Element::Unknown);
        }
        SYMBOLS
            .iter()
            .position(|s| *s == symbol)
            .map(|idx| ELEMENTS[idx])
    }

    pub fn atomic_num(&self) -> u8 {
        *self as u8
    }

    pub fn symbol(&self) -> &'static str {
        SYMBOLS[*self as usize]
    }

    pub fn is_heavy_atom(&self) -> bool {
        !matches!(self, Element::H)
    }

    pub fn is_hydrogen(&self) -> bool {
        matches!(self, Element::H)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Element {
    type Err = String;

    /// Accepts an atomic number or a symbol in any letter case (`"CL"`, `"cl"`, `"Cl"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(num) = trimmed.parse::<u8>() {
            return Ok(Element::from_atomic_num(num));
        }
        let mut chars = trimmed.chars();
        let normalized: String = match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.flat_map(|c| c.to_lowercase()))
                .collect(),
            None => return Err("Empty element symbol".to_string()),
        };
        Element::from_symbol(&normalized).ok_or_else(|| format!("Invalid element: {}", s))
    }
}

impl BondOrder {
    pub fn value(&self) -> f64 {
        match self {
            BondOrder::Single => 1.0,
            BondOrder::Double => 2.0,
            BondOrder::Triple => 3.0,
            BondOrder::Aromatic => 1.5,
        }
    }

    /// Integer valence contribution; an aromatic bond counts as one, the missing half is
    /// credited to the aromatic atom itself.
    pub fn valence(&self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }

    /// Bond type code of the MDL connection table.
    pub fn molfile_code(&self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Aromatic => 4,
        }
    }

    pub fn from_molfile_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(BondOrder::Single),
            2 => Some(BondOrder::Double),
            3 => Some(BondOrder::Triple),
            4 => Some(BondOrder::Aromatic),
            _ => None,
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl FromStr for BondOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" | "1.0" | "Single" => Ok(BondOrder::Single),
            "2" | "2.0" | "Double" => Ok(BondOrder::Double),
            "3" | "3.0" | "Triple" => Ok(BondOrder::Triple),
            "1.5" | "4" | "Aromatic" => Ok(BondOrder::Aromatic),
            _ => Err(format!("Invalid bond order: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_symbol_and_atomic_number_agree() {
        assert_eq!(Element::H.symbol(), "H");
        assert_eq!(Element::C.symbol(), "C");
        assert_eq!(Element::Cl.symbol(), "Cl");
        assert_eq!(Element::Og.symbol(), "Og");
        assert_eq!(Element::Unknown.symbol(), "*");
        assert_eq!(Element::Fe.atomic_num(), 26);
        assert_eq!(Element::Og.atomic_num(), 118);
    }

    #[test]
    fn element_from_atomic_num_covers_table_and_out_of_range() {
        assert_eq!(Element::from_atomic_num(1), Element::H);
        assert_eq!(Element::from_atomic_num(2), Element::He);
        assert_eq!(Element::from_atomic_num(53), Element::I);
        assert_eq!(Element::from_atomic_num(0), Element::Unknown);
        assert_eq!(Element::from_atomic_num(119), Element::Unknown);
        for num in 0..=118u8 {
            assert_eq!(Element::from_atomic_num(num).atomic_num(), num);
        }
    }

    #[test]
    fn element_from_symbol_is_case_sensitive() {
        assert_eq!(Element::from_symbol("Br"), Some(Element::Br));
        assert_eq!(Element::from_symbol("*"), Some(Element::Unknown));
        assert_eq!(Element::from_symbol("BR"), None);
        assert_eq!(Element::from_symbol("Zz"), None);
    }

    #[test]
    fn element_from_str_normalizes_case_and_numbers() {
        assert_eq!(Element::from_str("CL").unwrap(), Element::Cl);
        assert_eq!(Element::from_str("fe").unwrap(), Element::Fe);
        assert_eq!(Element::from_str("8").unwrap(), Element::O);
        assert!(Element::from_str("Xx").is_err());
        assert!(Element::from_str("").is_err());
    }

    #[test]
    fn element_display_formats_symbol() {
        assert_eq!(format!("{}", Element::N), "N");
        assert_eq!(format!("{}", Element::Se), "Se");
    }

    #[test]
    fn bond_order_valence_counts_aromatic_as_one() {
        assert_eq!(BondOrder::Single.valence(), 1);
        assert_eq!(BondOrder::Double.valence(), 2);
        assert_eq!(BondOrder::Triple.valence(), 3);
        assert_eq!(BondOrder::Aromatic.valence(), 1);
        assert_eq!(BondOrder::Aromatic.value(), 1.5);
    }

    #[test]
    fn bond_order_molfile_codes_round_trip() {
        for order in [
            BondOrder::Single,
            BondOrder::Double,
            BondOrder::Triple,
            BondOrder::Aromatic,
        ] {
            assert_eq!(BondOrder::from_molfile_code(order.molfile_code()), Some(order));
        }
        assert_eq!(BondOrder::from_molfile_code(8), None);
    }

    #[test]
    fn bond_order_from_str_parses_valid_input() {
        assert_eq!(BondOrder::from_str("2").unwrap(), BondOrder::Double);
        assert_eq!(BondOrder::from_str("Aromatic").unwrap(), BondOrder::Aromatic);
        assert!(BondOrder::from_str("5").is_err());
    }
}
