use crate::model::skeleton::Skeleton;
use crate::model::types::Point;
use std::fmt::Write as _;

use super::{parity_from_winding, parity_refs};

const PROPERTY_ENTRIES_PER_LINE: usize = 8;

/// Serializes the connection table of `skeleton` as a V2000 molfile ending in `M  END\n`.
///
/// Atoms without coordinates are written at the origin and the header declares `2D`.
/// Tetrahedral centres are written as atom parity flags. A fixed hydrogen count below the
/// valence default becomes an `M  RAD` entry; one above it (`[nH]` in pyrrole) goes into
/// the atom block's hydrogen-count field as `count + 1`.
pub fn write_molfile(skeleton: &Skeleton) -> String {
    let mut out = String::new();
    let dimension = if skeleton.coordinates.is_some() { "3D" } else { "2D" };

    let _ = writeln!(out, "{}", skeleton.title);
    let _ = writeln!(out, "  MolForge{:10}{}", "", dimension);
    out.push('\n');

    let chiral = u8::from(!skeleton.stereo.is_empty());
    let _ = writeln!(
        out,
        "{:>3}{:>3}  0  0{:>3}  0  0  0  0  0999 V2000",
        skeleton.atoms.len(),
        skeleton.bonds.len(),
        chiral
    );

    let origin = Point::origin();
    let mut charges = Vec::new();
    let mut isotopes = Vec::new();
    let mut radicals = Vec::new();
    for (idx, atom) in skeleton.atoms.iter().enumerate() {
        let pos = skeleton
            .coordinates
            .as_ref()
            .and_then(|c| c.get(idx))
            .unwrap_or(&origin);
        let charge_code = match atom.formal_charge {
            3 => 1,
            2 => 2,
            1 => 3,
            -1 => 5,
            -2 => 6,
            -3 => 7,
            _ => 0,
        };
        let parity = skeleton
            .stereo_of(idx)
            .and_then(|centre| centre.winding_for(&parity_refs(skeleton, idx)))
            .map(parity_from_winding)
            .unwrap_or(0);
        let default = skeleton.default_hydrogens(idx);
        let hydrogen_code = match atom.hydrogens {
            Some(fixed) if fixed > default => fixed.saturating_add(1),
            _ => 0,
        };
        let _ = writeln!(
            out,
            "{:>10.4}{:>10.4}{:>10.4} {:<3} 0{:>3}{:>3}{:>3}{}",
            pos.x,
            pos.y,
            pos.z,
            atom.element.symbol(),
            charge_code,
            parity,
            hydrogen_code,
            "  0".repeat(8)
        );

        if atom.formal_charge != 0 {
            charges.push((idx + 1, i32::from(atom.formal_charge)));
        }
        if atom.isotope != 0 {
            isotopes.push((idx + 1, i32::from(atom.isotope)));
        }
        if let Some(fixed) = atom.hydrogens {
            let deficit = default.saturating_sub(fixed);
            if deficit > 0 {
                radicals.push((idx + 1, if deficit == 1 { 2 } else { 3 }));
            }
        }
    }

    for bond in &skeleton.bonds {
        let _ = writeln!(
            out,
            "{:>3}{:>3}{:>3}  0",
            bond.a1_idx + 1,
            bond.a2_idx + 1,
            bond.order.molfile_code()
        );
    }

    write_property_lines(&mut out, "CHG", &charges);
    write_property_lines(&mut out, "ISO", &isotopes);
    write_property_lines(&mut out, "RAD", &radicals);
    out.push_str("M  END\n");
    out
}

/// Serializes a full SD record: molfile, one data item per tag, and the `$$$$` terminator.
///
/// Values have trailing whitespace stripped.
pub fn write_sd_record<'a, I>(molfile: &str, items: I) -> String
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    let mut out = String::from(molfile);
    for (tag, value) in items {
        let _ = write!(out, "> <{}>\n{}\n\n", tag, value.trim_end());
    }
    out.push_str("$$$$\n");
    out
}

fn write_property_lines(out: &mut String, kind: &str, entries: &[(usize, i32)]) {
    for chunk in entries.chunks(PROPERTY_ENTRIES_PER_LINE) {
        let _ = write!(out, "M  {}{:>3}", kind, chunk.len());
        for (atom, value) in chunk {
            let _ = write!(out, " {:>3} {:>3}", atom, value);
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::molfile::read_record;
    use crate::smiles;

    #[test]
    fn molfile_has_header_counts_atoms_bonds_and_end() {
        let skeleton = smiles::parse("C1CCN[C@@H]1(O)").unwrap();
        let block = write_molfile(&skeleton);
        let lines: Vec<&str> = block.split('\n').collect();

        assert_eq!(lines.len(), 18);
        assert_eq!(lines[3], "  6  6  0  0  1  0  0  0  0  0999 V2000");
        assert_eq!(lines[16], "M  END");
        assert_eq!(lines[17], "");
        assert_eq!(
            lines[4],
            "    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0"
        );
    }

    #[test]
    fn sd_record_appends_items_and_terminator() {
        let record = write_sd_record(
            "mol\nM  END\n",
            vec![("test", "foo\nbar\n".to_string()), ("n", "3".to_string())],
        );
        assert_eq!(
            record,
            "mol\nM  END\n> <test>\nfoo\nbar\n\n> <n>\n3\n\n$$$$\n"
        );
    }

    #[test]
    fn charges_isotopes_radicals_and_stereo_survive_a_round_trip() {
        let mut skeleton = smiles::parse("[15NH3+]C[C@H](F)Cl").unwrap();
        skeleton.atoms[1].hydrogens = Some(1);
        skeleton.title = "round trip".to_string();

        let block = write_molfile(&skeleton);
        let back = read_record(&block, 1).unwrap();

        assert_eq!(back.title, "round trip");
        assert_eq!(back.atoms[0].formal_charge, 1);
        assert_eq!(back.atoms[0].isotope, 15);
        assert_eq!(back.implicit_hydrogens(1), 1);
        assert_eq!(
            smiles::write(&back, true, smiles::CanonPolicy::LowestRankFirst),
            smiles::write(&skeleton, true, smiles::CanonPolicy::LowestRankFirst)
        );
    }

    #[test]
    fn aromatic_nh_is_written_to_the_hydrogen_count_field() {
        let skeleton = smiles::parse("c1cc[nH]c1").unwrap();
        let block = write_molfile(&skeleton);
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(
            lines[7],
            "    0.0000    0.0000    0.0000 N   0  0  0  2  0  0  0  0  0  0  0  0"
        );
        assert!(!block.contains("M  RAD"));

        let back = read_record(&block, 1).unwrap();
        assert_eq!(back.implicit_hydrogens(3), 1);
        assert_eq!(
            smiles::write(&back, true, smiles::CanonPolicy::LowestRankFirst),
            smiles::write(&skeleton, true, smiles::CanonPolicy::LowestRankFirst)
        );
    }
}
