use crate::error::Error;
use crate::model::skeleton::{Skeleton, SkeletonAtom, Tetrahedral};
use crate::model::types::{BondOrder, Element, Point};

use super::{FORMAT, parity_refs, winding_from_parity};

/// Parses one SD record (molfile block plus data items, without the `$$$$` terminator).
///
/// # Arguments
///
/// * `block` - Text of the record.
/// * `first_line` - Line number of the block's first line in the enclosing file, used for
///   diagnostics.
///
/// # Errors
///
/// Returns [`Error::Parse`] for malformed counts, atom, bond, property, or data-item lines
/// and for V3000 connection tables.
pub fn read_record(block: &str, first_line: usize) -> Result<Skeleton, Error> {
    let lines: Vec<&str> = block.lines().collect();
    let line_no = |idx: usize| first_line + idx;

    if lines.len() < 4 {
        return Err(Error::parse(
            FORMAT,
            None,
            line_no(lines.len()),
            "record ends before the counts line",
        ));
    }

    let mut skeleton = Skeleton::new();
    skeleton.title = lines[0].trim_end().to_string();

    let counts = lines[3];
    if counts.contains("V3000") {
        return Err(Error::parse(
            FORMAT,
            None,
            line_no(3),
            "V3000 connection tables are not supported",
        ));
    }
    let atom_count = parse_count(counts, 0, line_no(3), "atom count")?;
    let bond_count = parse_count(counts, 3, line_no(3), "bond count")?;

    let atom_start = 4;
    let bond_start = atom_start + atom_count;
    let props_start = bond_start + bond_count;
    if lines.len() < props_start {
        return Err(Error::parse(
            FORMAT,
            None,
            line_no(lines.len()),
            format!("expected {atom_count} atom and {bond_count} bond lines"),
        ));
    }

    let mut positions = Vec::with_capacity(atom_count);
    let mut parities = Vec::new();
    for (offset, line) in lines[atom_start..bond_start].iter().enumerate() {
        let number = line_no(atom_start + offset);
        let coord = |start: usize, name: &str| -> Result<f64, Error> {
            field(line, start, start + 10)
                .parse::<f64>()
                .map_err(|_| Error::parse(FORMAT, None, number, format!("invalid {name} coordinate")))
        };
        positions.push(Point::new(coord(0, "x")?, coord(10, "y")?, coord(20, "z")?));

        let symbol = field(line, 31, 34);
        let element = Element::from_symbol(symbol)
            .or_else(|| (symbol == "A" || symbol == "Q" || symbol == "R").then_some(Element::Unknown))
            .ok_or_else(|| {
                Error::parse(FORMAT, None, number, format!("unknown element symbol '{symbol}'"))
            })?;
        let mut atom = SkeletonAtom::new(element);

        let mass_diff = optional_int(line, 34, 36, number, "mass difference")?;
        if mass_diff != 0 {
            log::debug!("ignoring mass difference {mass_diff} on line {number}");
        }
        atom.formal_charge = match optional_int(line, 36, 39, number, "charge code")? {
            1 => 3,
            2 => 2,
            3 => 1,
            5 => -1,
            6 => -2,
            7 => -3,
            _ => 0,
        };
        let parity = optional_int(line, 39, 42, number, "stereo parity")?;
        if parity == 1 || parity == 2 {
            parities.push((offset, parity as u8));
        }
        let hydrogen_code = optional_int(line, 42, 45, number, "hydrogen count")?;
        if hydrogen_code > 0 {
            atom.hydrogens = Some(
                u8::try_from(hydrogen_code - 1)
                    .map_err(|_| Error::parse(FORMAT, None, number, "hydrogen count out of range"))?,
            );
        }
        skeleton.add_atom(atom);
    }
    skeleton.coordinates = Some(positions);

    for (offset, line) in lines[bond_start..props_start].iter().enumerate() {
        let number = line_no(bond_start + offset);
        let a = parse_index(field(line, 0, 3), atom_count, number)?;
        let b = parse_index(field(line, 3, 6), atom_count, number)?;
        let code = field(line, 6, 9)
            .parse::<u8>()
            .ok()
            .and_then(BondOrder::from_molfile_code)
            .ok_or_else(|| Error::parse(FORMAT, None, number, "unsupported bond type"))?;
        if code == BondOrder::Aromatic {
            skeleton.atoms[a].aromatic = true;
            skeleton.atoms[b].aromatic = true;
        }
        if !skeleton.add_bond(a, b, code) {
            return Err(Error::parse(
                FORMAT,
                None,
                number,
                format!("duplicate or self bond {}-{}", a + 1, b + 1),
            ));
        }
    }

    let mut idx = props_start;
    let mut charges_reset = false;
    let mut radicals = Vec::new();
    let mut saw_end = false;
    while idx < lines.len() {
        let line = lines[idx];
        let number = line_no(idx);
        idx += 1;
        if line.starts_with("M  END") {
            saw_end = true;
            break;
        }
        if let Some(rest) = line.strip_prefix("M  CHG") {
            if !charges_reset {
                skeleton.atoms.iter_mut().for_each(|a| a.formal_charge = 0);
                charges_reset = true;
            }
            for (atom, value) in property_pairs(rest, atom_count, number)? {
                skeleton.atoms[atom].formal_charge = i8::try_from(value)
                    .map_err(|_| Error::parse(FORMAT, None, number, "charge out of range"))?;
            }
        } else if let Some(rest) = line.strip_prefix("M  ISO") {
            for (atom, value) in property_pairs(rest, atom_count, number)? {
                skeleton.atoms[atom].isotope = u16::try_from(value)
                    .map_err(|_| Error::parse(FORMAT, None, number, "isotope out of range"))?;
            }
        } else if let Some(rest) = line.strip_prefix("M  RAD") {
            radicals.extend(property_pairs(rest, atom_count, number)?);
        }
    }
    if !saw_end {
        return Err(Error::parse(FORMAT, None, line_no(idx), "missing 'M  END' line"));
    }

    for (atom, multiplicity) in radicals {
        if skeleton.atoms[atom].hydrogens.is_some() {
            continue;
        }
        let unpaired = if multiplicity == 2 { 1 } else { 2 };
        let default = skeleton.default_hydrogens(atom);
        skeleton.atoms[atom].hydrogens = Some(default.saturating_sub(unpaired));
    }

    for (centre, parity) in parities {
        let refs = parity_refs(&skeleton, centre);
        if refs.len() == 4 {
            skeleton.stereo.push(Tetrahedral {
                center: centre,
                refs,
                winding: winding_from_parity(parity),
            });
        }
    }

    read_data_items(&lines[idx..], first_line + idx, &mut skeleton)?;
    Ok(skeleton)
}

/// Reads `> <tag>` data items. A value runs until a blank line followed by the next item
/// header (or the end of the record), so values may contain blank lines of their own;
/// trailing blank lines are dropped. A value line that looks like a header and follows a
/// blank line starts a new item.
fn read_data_items(lines: &[&str], first_line: usize, skeleton: &mut Skeleton) -> Result<(), Error> {
    let mut idx = 0;
    while idx < lines.len() {
        let header = lines[idx];
        let number = first_line + idx;
        idx += 1;
        if header.trim().is_empty() {
            continue;
        }
        if !header.starts_with('>') {
            return Err(Error::parse(
                FORMAT,
                None,
                number,
                "expected a data item header starting with '>'",
            ));
        }
        let tag = match (header.find('<'), header.rfind('>')) {
            (Some(open), Some(close)) if close > open => &header[open + 1..close],
            _ => {
                return Err(Error::parse(
                    FORMAT,
                    None,
                    number,
                    "data item header has no <tag>",
                ));
            }
        };

        let mut value_lines: Vec<&str> = Vec::new();
        while idx < lines.len() {
            let line = lines[idx];
            let after_blank = value_lines.last().is_some_and(|l| l.trim().is_empty());
            if after_blank && is_item_header(line) {
                break;
            }
            value_lines.push(line);
            idx += 1;
        }
        while value_lines.last().is_some_and(|l| l.trim().is_empty()) {
            value_lines.pop();
        }
        skeleton.tags.set(tag, value_lines.join("\n"));
    }
    Ok(())
}

fn is_item_header(line: &str) -> bool {
    line.starts_with('>') && line.contains('<')
}

fn field(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    line.get(start..end).map(str::trim).unwrap_or("")
}

fn optional_int(
    line: &str,
    start: usize,
    end: usize,
    line_number: usize,
    what: &str,
) -> Result<i32, Error> {
    let text = field(line, start, end);
    if text.is_empty() {
        return Ok(0);
    }
    text.parse::<i32>()
        .map_err(|_| Error::parse(FORMAT, None, line_number, format!("invalid {what} '{text}'")))
}

fn parse_count(line: &str, start: usize, line_number: usize, what: &str) -> Result<usize, Error> {
    field(line, start, start + 3)
        .parse::<usize>()
        .map_err(|_| Error::parse(FORMAT, None, line_number, format!("invalid {what}")))
}

fn parse_index(text: &str, atom_count: usize, line_number: usize) -> Result<usize, Error> {
    match text.parse::<usize>() {
        Ok(n) if (1..=atom_count).contains(&n) => Ok(n - 1),
        _ => Err(Error::parse(
            FORMAT,
            None,
            line_number,
            format!("atom reference '{text}' out of range"),
        )),
    }
}

fn property_pairs(
    rest: &str,
    atom_count: usize,
    line_number: usize,
) -> Result<Vec<(usize, i32)>, Error> {
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let Some((count, entries)) = tokens.split_first() else {
        return Err(Error::parse(FORMAT, None, line_number, "empty property line"));
    };
    let count = count
        .parse::<usize>()
        .map_err(|_| Error::parse(FORMAT, None, line_number, "invalid property entry count"))?;
    if entries.len() < count * 2 {
        return Err(Error::parse(
            FORMAT,
            None,
            line_number,
            format!("property line declares {count} entries"),
        ));
    }
    entries
        .chunks(2)
        .take(count)
        .map(|pair| {
            let atom = parse_index(pair[0], atom_count, line_number)?;
            let value = pair[1].parse::<i32>().map_err(|_| {
                Error::parse(FORMAT, None, line_number, format!("invalid value '{}'", pair[1]))
            })?;
            Ok((atom, value))
        })
        .collect()
}
