use super::{Cell, ColumnType, Table, TypePolicy};
use crate::context::ChemContext;
use crate::error::Error;
use crate::fingerprint;
use crate::io::{MolInputStream, MolOutputStream, ReadOptions, WriteOptions};
use crate::model::mol::Mol;
use crate::stream::PullStream;
use std::collections::HashSet;
use std::path::Path;

/// Fingerprint stored as one encoded SD property and as one table column per bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintColumns {
    /// SD property holding the base64 text.
    pub field_name: String,
    /// Prefix of the per-bit columns (`{prefix}0000`, `{prefix}0001`, ...).
    pub column_prefix: String,
}

impl FingerprintColumns {
    pub fn new(field_name: impl Into<String>, column_prefix: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            column_prefix: column_prefix.into(),
        }
    }

    fn bit_column(&self, bit: usize) -> String {
        format!("{}{:04}", self.column_prefix, bit)
    }
}

/// What to do when a later record lacks a column fixed by the first record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingColumns {
    /// Fail with [`Error::SchemaMismatch`].
    #[default]
    Fail,
    /// Leave a missing cell.
    Allow,
}

/// Options for [`flat_file_to_table`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableReadOptions {
    pub smiles_column: String,
    /// Position of the SMILES column among the property columns.
    pub smiles_index: usize,
    pub id_column: Option<String>,
    /// Position of the id column, counted after the SMILES column is inserted.
    pub id_index: usize,
    /// Property holding the identifier; the record title is used when unset.
    pub id_field: Option<String>,
    pub fingerprint: Option<FingerprintColumns>,
    /// Explicit numeric kinds for named columns.
    pub column_types: Vec<(String, ColumnType)>,
    pub missing: MissingColumns,
    pub type_policy: TypePolicy,
}

impl Default for TableReadOptions {
    fn default() -> Self {
        Self {
            smiles_column: "smiles".to_string(),
            smiles_index: 0,
            id_column: None,
            id_index: 1,
            id_field: None,
            fingerprint: None,
            column_types: Vec::new(),
            missing: MissingColumns::default(),
            type_policy: TypePolicy::default(),
        }
    }
}

impl TableReadOptions {
    pub fn new(smiles_column: impl Into<String>, smiles_index: usize) -> Self {
        Self {
            smiles_column: smiles_column.into(),
            smiles_index,
            ..Self::default()
        }
    }

    pub fn with_id_column(mut self, name: impl Into<String>, index: usize) -> Self {
        self.id_column = Some(name.into());
        self.id_index = index;
        self
    }

    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = Some(field.into());
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: FingerprintColumns) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }

    pub fn with_column_type(mut self, column: impl Into<String>, kind: ColumnType) -> Self {
        self.column_types.push((column.into(), kind));
        self
    }

    pub fn with_missing(mut self, missing: MissingColumns) -> Self {
        self.missing = missing;
        self
    }

    pub fn with_type_policy(mut self, policy: TypePolicy) -> Self {
        self.type_policy = policy;
        self
    }
}

/// Where the cells of one column come from.
enum Source {
    Smiles,
    Id,
    Bit(usize),
    Property(String),
}

struct Layout {
    names: Vec<String>,
    sources: Vec<Source>,
    fingerprint_len: usize,
}

impl Layout {
    fn from_first_record(
        mol: &Mol,
        bits: Option<&[Cell]>,
        options: &TableReadOptions,
    ) -> Result<Self, Error> {
        let mut names = mol.keys();
        let smiles_at = options.smiles_index.min(names.len());
        names.insert(smiles_at, options.smiles_column.clone());
        if let Some(id_column) = &options.id_column {
            let id_at = options.id_index.min(names.len());
            names.insert(id_at, id_column.clone());
        }

        let mut fingerprint_len = 0;
        if let (Some(fp), Some(bits)) = (&options.fingerprint, bits) {
            let at = names
                .iter()
                .position(|name| *name == fp.field_name)
                .ok_or_else(|| {
                    Error::schema_mismatch(1, &fp.field_name, "is required for the fingerprint")
                })?;
            fingerprint_len = bits.len();
            names.splice(at..=at, (0..bits.len()).map(|bit| fp.bit_column(bit)));
        }

        let mut seen = HashSet::new();
        names.retain(|name| seen.insert(name.clone()));

        let sources = names
            .iter()
            .map(|name| {
                let bit = options.fingerprint.as_ref().and_then(|fp| {
                    (0..fingerprint_len).find(|&bit| fp.bit_column(bit) == *name)
                });
                if let Some(bit) = bit {
                    Source::Bit(bit)
                } else if options.id_column.as_deref() == Some(name.as_str()) {
                    Source::Id
                } else if *name == options.smiles_column {
                    Source::Smiles
                } else {
                    Source::Property(name.clone())
                }
            })
            .collect();

        Ok(Self {
            names,
            sources,
            fingerprint_len,
        })
    }
}

fn missing_or_fail(
    options: &TableReadOptions,
    record: usize,
    column: &str,
    details: &str,
) -> Result<Cell, Error> {
    match options.missing {
        MissingColumns::Allow => Ok(Cell::Missing),
        MissingColumns::Fail => Err(Error::schema_mismatch(record, column, details)),
    }
}

fn decode_fingerprint(
    mol: &Mol,
    record: usize,
    fp: &FingerprintColumns,
) -> Result<Vec<Cell>, Error> {
    let text = mol
        .get(&fp.field_name)
        .map_err(|_| Error::schema_mismatch(record, &fp.field_name, "is missing"))?;
    fingerprint::decode(&text.to_string())
}

/// Collects every record of `stream` into a [`Table`].
///
/// The column layout is fixed by the first record; later records fill the same columns.
/// Property values become numbers where they parse as one, otherwise text. Once all rows
/// are in, the type policy settles each column and explicit column types are applied last.
///
/// # Errors
///
/// Returns [`Error::SchemaMismatch`] when a later record lacks a column (unless
/// [`MissingColumns::Allow`] is set) or carries a fingerprint of a different length, and
/// propagates stream and fingerprint decoding errors.
pub fn flat_file_to_table<S>(mut stream: S, options: &TableReadOptions) -> Result<Table, Error>
where
    S: PullStream<Item = Mol>,
{
    let mut layout: Option<Layout> = None;
    let mut table = Table::default();
    let mut record = 0;

    while stream.has_next()? {
        let mol = stream.advance()?;
        record += 1;

        let bits = match &options.fingerprint {
            Some(fp) => Some(decode_fingerprint(&mol, record, fp)?),
            None => None,
        };

        let layout = match &mut layout {
            Some(layout) => layout,
            None => {
                let first = Layout::from_first_record(&mol, bits.as_deref(), options)?;
                table = Table::new(first.names.clone());
                layout.insert(first)
            }
        };

        if let (Some(fp), Some(bits)) = (&options.fingerprint, &bits)
            && bits.len() != layout.fingerprint_len
        {
            return Err(Error::schema_mismatch(
                record,
                &fp.field_name,
                format!(
                    "holds {} bits where the first record holds {}",
                    bits.len(),
                    layout.fingerprint_len
                ),
            ));
        }

        let mut row = Vec::with_capacity(layout.names.len());
        for (name, source) in layout.names.iter().zip(&layout.sources) {
            let cell = match source {
                Source::Smiles => Cell::Text(mol.canonical_smiles()),
                Source::Id => match &options.id_field {
                    None => Cell::Text(mol.title().to_string()),
                    Some(field) => match mol.get(field) {
                        Ok(value) => Cell::Text(value.to_string()),
                        Err(_) => missing_or_fail(options, record, field, "is missing")?,
                    },
                },
                Source::Bit(bit) => bits
                    .as_ref()
                    .and_then(|bits| bits.get(*bit))
                    .cloned()
                    .unwrap_or_default(),
                Source::Property(key) => match mol.get(key) {
                    Ok(value) => Cell::infer(&value.to_string()),
                    Err(_) => missing_or_fail(options, record, name, "is missing")?,
                },
            };
            row.push(cell);
        }
        log::trace!("Tabulated record {} '{}'", record, mol.title());
        table.push_row(row)?;
    }
    stream.close()?;

    table.apply_type_policy(&options.type_policy);
    for (column, kind) in &options.column_types {
        table.coerce_column(column, *kind);
    }

    log::info!(
        "Collected {} records into {} columns",
        table.num_rows(),
        table.num_columns()
    );
    Ok(table)
}

/// Opens an SD (or SMILES) file and collects it with [`flat_file_to_table`].
pub fn read_sd_table(
    path: impl AsRef<Path>,
    ctx: &ChemContext,
    options: &TableReadOptions,
) -> Result<Table, Error> {
    let input = MolInputStream::open(path, ctx, ReadOptions::default())?;
    flat_file_to_table(input, options)
}

/// Options for [`write_table`] and [`table_to_flat_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableWriteOptions {
    pub smiles_column: String,
    /// Column supplying the record title; it is also written as a property.
    pub id_column: Option<String>,
    pub fingerprint: Option<FingerprintColumns>,
}

impl TableWriteOptions {
    pub fn new(smiles_column: impl Into<String>) -> Self {
        Self {
            smiles_column: smiles_column.into(),
            id_column: None,
            fingerprint: None,
        }
    }

    pub fn with_id_column(mut self, name: impl Into<String>) -> Self {
        self.id_column = Some(name.into());
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: FingerprintColumns) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }
}

/// Writes one record per table row to `output`, returning the number written.
///
/// The fingerprint is taken from the column range between the first and the last column
/// whose name starts with the prefix, and is stored where the first of those columns
/// stood.
///
/// # Errors
///
/// Returns [`Error::SchemaMismatch`] when the SMILES or id column is absent and propagates
/// SMILES parsing and output errors.
pub fn write_table(
    table: &Table,
    options: &TableWriteOptions,
    ctx: &ChemContext,
    output: &mut MolOutputStream,
) -> Result<usize, Error> {
    let smiles_idx = table
        .column_index(&options.smiles_column)
        .ok_or_else(|| Error::schema_mismatch(0, &options.smiles_column, "is not in the table"))?;
    let id_idx = match &options.id_column {
        Some(name) => Some(
            table
                .column_index(name)
                .ok_or_else(|| Error::schema_mismatch(0, name, "is not in the table"))?,
        ),
        None => None,
    };
    let fp_range = options.fingerprint.as_ref().and_then(|fp| {
        let columns = table.columns();
        let first = columns.iter().position(|c| c.starts_with(&fp.column_prefix))?;
        let last = columns.iter().rposition(|c| c.starts_with(&fp.column_prefix))?;
        Some((fp, first..=last))
    });

    for (row_idx, row) in table.rows().iter().enumerate() {
        let mut mol = ctx.mol_from_smiles(&row[smiles_idx].to_string())?;
        if let Some(idx) = id_idx {
            mol.set_title(&row[idx].to_string());
        }

        for (col_idx, name) in table.columns().iter().enumerate() {
            if col_idx == smiles_idx {
                continue;
            }
            if let Some((fp, range)) = &fp_range {
                if col_idx == *range.start() {
                    mol.set(&fp.field_name, fingerprint::encode(&row[range.clone()]));
                }
                if range.contains(&col_idx) {
                    continue;
                }
            }
            mol.set(name, row[col_idx].to_string());
        }

        log::trace!("Writing table row {}", row_idx + 1);
        output.write(&mol)?;
    }
    Ok(table.num_rows())
}

/// Writes `table` to a new molecule file at `path`.
pub fn table_to_flat_file(
    table: &Table,
    options: &TableWriteOptions,
    ctx: &ChemContext,
    path: impl AsRef<Path>,
) -> Result<usize, Error> {
    let path = path.as_ref();
    let mut output = MolOutputStream::create(path, WriteOptions::default())?;
    let written = write_table(table, options, ctx, &mut output)?;
    output.close()?;
    log::info!("Wrote {} records to '{}'", written, path.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{Compression, MolFormat};
    use crate::stream::MemStream;
    use crate::toolkit::Toolkit;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    fn record(smiles: &str, title: &str, props: &[(&str, &str)]) -> Mol {
        let mut mol = Mol::from_smiles(Toolkit::Table, smiles).unwrap();
        mol.set_title(title);
        for (key, value) in props {
            mol.set(key, *value);
        }
        mol
    }

    fn ctx() -> ChemContext {
        ChemContext::new(Toolkit::Table)
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn columns_follow_the_first_record_with_spliced_smiles_and_id() {
        let stream = MemStream::from(vec![
            record("CCO", "ethanol", &[("mw", "46.07"), ("class", "alcohol")]),
            record("C", "methane", &[("mw", "16.04"), ("class", "alkane")]),
        ]);
        let options = TableReadOptions::new("smiles", 1).with_id_column("id", 0);
        let table = flat_file_to_table(stream, &options).unwrap();

        assert_eq!(table.columns(), ["id", "mw", "smiles", "class"]);
        assert_eq!(table.cell(0, "id"), Some(&Cell::Text("ethanol".into())));
        assert_eq!(table.cell(1, "mw"), Some(&Cell::Float(16.04)));
        assert_eq!(table.cell(1, "smiles"), Some(&Cell::Text("C".into())));
    }

    #[test]
    fn fingerprint_field_expands_into_bit_columns() {
        let stream = MemStream::from(vec![
            record("C", "a", &[("fp", "UY5lpg=="), ("n", "1")]),
            record("N", "b", &[("fp", "AAAAAA=="), ("n", "2")]),
        ]);
        let options = TableReadOptions::new("smiles", 0)
            .with_fingerprint(FingerprintColumns::new("fp", "bit_"));
        let table = flat_file_to_table(stream, &options).unwrap();

        assert_eq!(table.num_columns(), 1 + 32 + 1);
        assert_eq!(table.columns()[1], "bit_0000");
        assert_eq!(table.columns()[32], "bit_0031");
        assert_eq!(table.columns()[33], "n");
        assert_eq!(table.cell(0, "bit_0001"), Some(&Cell::Int(1)));
        assert_eq!(table.cell(1, "bit_0001"), Some(&Cell::Int(0)));
        assert_eq!(table.cell(1, "n"), Some(&Cell::Int(2)));
    }

    #[test]
    fn fingerprint_length_must_not_change() {
        let stream = MemStream::from(vec![
            record("C", "a", &[("fp", "UY5lpg==")]),
            record("N", "b", &[("fp", "AA==")]),
        ]);
        let options = TableReadOptions::new("smiles", 0)
            .with_fingerprint(FingerprintColumns::new("fp", "fp_"));
        let err = flat_file_to_table(stream, &options).expect_err("8 bits after 32");
        assert!(matches!(err, Error::SchemaMismatch { record: 2, .. }));
    }

    #[test]
    fn missing_columns_fail_unless_allowed() {
        let records = || {
            MemStream::from(vec![
                record("C", "a", &[("x", "1"), ("y", "2")]),
                record("N", "b", &[("x", "3")]),
            ])
        };

        let err = flat_file_to_table(records(), &TableReadOptions::default())
            .expect_err("second record has no 'y'");
        match err {
            Error::SchemaMismatch { record, column, .. } => {
                assert_eq!(record, 2);
                assert_eq!(column, "y");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let options = TableReadOptions::default().with_missing(MissingColumns::Allow);
        let table = flat_file_to_table(records(), &options).unwrap();
        assert_eq!(table.cell(1, "y"), Some(&Cell::Missing));
    }

    #[test]
    fn explicit_column_types_coerce_values() {
        let stream = MemStream::from(vec![
            record("C", "a", &[("ic50", "12.5")]),
            record("N", "b", &[("ic50", ">100")]),
        ]);
        let options =
            TableReadOptions::default().with_column_type("ic50", ColumnType::Float);
        let table = flat_file_to_table(stream, &options).unwrap();
        assert_eq!(
            table.column("ic50").unwrap(),
            vec![&Cell::Float(12.5), &Cell::Missing]
        );
    }

    #[test]
    fn id_can_come_from_a_property() {
        let stream = MemStream::from(vec![record("C", "title", &[("reg", "CMP-1")])]);
        let options = TableReadOptions::default()
            .with_id_column("id", 0)
            .with_id_field("reg");
        let table = flat_file_to_table(stream, &options).unwrap();
        assert_eq!(table.cell(0, "id"), Some(&Cell::Text("CMP-1".into())));
    }

    #[test]
    fn rows_become_sd_records_with_an_encoded_fingerprint() {
        let mut table = Table::new(
            ["id", "smiles", "fp_0000", "fp_0001", "fp_0002", "note"]
                .map(String::from)
                .to_vec(),
        );
        table
            .push_row(vec![
                Cell::Text("m1".into()),
                Cell::Text("CC".into()),
                Cell::Int(1),
                Cell::Int(1),
                Cell::Int(1),
                Cell::Missing,
            ])
            .unwrap();

        let buffer = SharedBuffer::default();
        let mut output =
            MolOutputStream::from_writer(buffer.clone(), MolFormat::Sdf, Compression::None);
        let options = TableWriteOptions::new("smiles")
            .with_id_column("id")
            .with_fingerprint(FingerprintColumns::new("fp", "fp_"));
        let written = write_table(&table, &options, &ctx(), &mut output).unwrap();
        output.close().unwrap();

        assert_eq!(written, 1);
        let text = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(text.starts_with("m1\n"));
        assert!(text.contains("> <id>\nm1\n\n> <fp>\n4A==\n\n> <note>\n\n\n"));
        assert!(text.trim_end().ends_with("$$$$"));
    }

    #[test]
    fn writing_requires_the_smiles_column() {
        let table = Table::new(vec!["id".to_string()]);
        let mut output = MolOutputStream::from_writer(
            SharedBuffer::default(),
            MolFormat::Sdf,
            Compression::None,
        );
        let err = write_table(&table, &TableWriteOptions::new("smiles"), &ctx(), &mut output)
            .expect_err("no smiles column");
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }
}
