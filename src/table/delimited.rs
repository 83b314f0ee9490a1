use super::{Cell, Table, TypePolicy};
use crate::error::Error;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

const CSV_FORMAT: &str = "CSV";

fn csv_error(error: csv::Error, path: Option<&Path>) -> Error {
    let path = path.map(Path::to_path_buf);
    let line = error.position().map_or(0, |pos| pos.line() as usize);
    match error.into_kind() {
        csv::ErrorKind::Io(source) => Error::from_io(source, path),
        csv::ErrorKind::UnequalLengths { expected_len, len, .. } => Error::inconsistent_data(
            CSV_FORMAT,
            path,
            format!("line {line} has {len} fields where the header has {expected_len}"),
        ),
        other => Error::parse(CSV_FORMAT, path, line, format!("{other:?}")),
    }
}

impl Table {
    /// Reads a CSV file with a header row. Empty fields become missing cells, numbers are
    /// inferred, and `policy` settles the column types.
    pub fn read_csv(path: impl AsRef<Path>, policy: &TypePolicy) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::from_io(e, Some(path.to_path_buf())))?;
        Self::read_csv_from(file, policy, Some(path))
    }

    pub fn from_csv_reader<R: Read>(reader: R, policy: &TypePolicy) -> Result<Self, Error> {
        Self::read_csv_from(reader, policy, None)
    }

    fn read_csv_from<R: Read>(
        reader: R,
        policy: &TypePolicy,
        path: Option<&Path>,
    ) -> Result<Self, Error> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let columns = reader
            .headers()
            .map_err(|e| csv_error(e, path))?
            .iter()
            .map(str::to_string)
            .collect();
        let mut table = Table::new(columns);
        for record in reader.records() {
            let record = record.map_err(|e| csv_error(e, path))?;
            table.push_row(record.iter().map(Cell::infer).collect())?;
        }
        table.apply_type_policy(policy);
        log::debug!(
            "Read {} rows x {} columns of CSV",
            table.num_rows(),
            table.num_columns()
        );
        Ok(table)
    }

    /// Writes the table as CSV with a header row; missing cells are written empty.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::from_io(e, Some(path.to_path_buf())))?;
        self.write_csv_to(file, Some(path))
    }

    pub fn to_csv_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        self.write_csv_to(writer, None)
    }

    fn write_csv_to<W: Write>(&self, writer: W, path: Option<&Path>) -> Result<(), Error> {
        let mut writer = csv::Writer::from_writer(writer);
        writer
            .write_record(self.columns())
            .map_err(|e| csv_error(e, path))?;
        for row in self.rows() {
            writer
                .write_record(row.iter().map(Cell::to_string))
                .map_err(|e| csv_error(e, path))?;
        }
        writer
            .flush()
            .map_err(|e| Error::from_io(e, path.map(Path::to_path_buf)))
    }
}
