use super::format::{Compression, MolFormat, PathSpec};
use super::molfile;
use crate::context::ChemContext;
use crate::error::Error;
use crate::model::mol::Mol;
use crate::native::NativeMol;
use crate::smiles;
use crate::stream::PullStream;
use crate::toolkit::Toolkit;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// Options for [`MolInputStream`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Overrides the format implied by the file name.
    pub format: Option<MolFormat>,
    /// Overrides the compression implied by the file name.
    pub compression: Option<Compression>,
    /// Folds explicit hydrogens into their parents after each record is parsed.
    pub remove_hydrogens: bool,
}

/// Pull stream of molecules read from an SD or SMILES source.
///
/// Records are parsed lazily, one per `has_next`/`advance` cycle. The underlying file (and
/// gzip decoder) is released on [`close`](PullStream::close) or when the stream is dropped.
pub struct MolInputStream {
    path: Option<PathBuf>,
    format: MolFormat,
    toolkit: Toolkit,
    remove_hydrogens: bool,
    reader: Option<Box<dyn BufRead>>,
    next_mol: Option<Mol>,
    line: String,
    line_number: usize,
    records_read: usize,
}

impl MolInputStream {
    /// Opens `path`, selecting format and compression from its name unless `options`
    /// override them. A bare extension such as `.sdf` reads standard input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFormat`] when no format can be determined and
    /// [`Error::Io`] when the file cannot be opened.
    pub fn open(
        path: impl AsRef<Path>,
        ctx: &ChemContext,
        options: ReadOptions,
    ) -> Result<Self, Error> {
        let path = path.as_ref();
        let spec = PathSpec::inspect(path);
        let format = match options.format {
            Some(format) => format,
            None => spec.require_format(path)?,
        };
        let compression = options.compression.unwrap_or(spec.compression);

        let raw: Box<dyn Read> = if spec.console {
            Box::new(io::stdin())
        } else {
            let file =
                File::open(path).map_err(|e| Error::from_io(e, Some(path.to_path_buf())))?;
            Box::new(file)
        };
        let reader: Box<dyn BufRead> = match compression {
            Compression::Gzip => Box::new(BufReader::new(MultiGzDecoder::new(raw))),
            Compression::None => Box::new(BufReader::new(raw)),
        };
        log::debug!(
            "Opened {} input '{}' ({:?})",
            format,
            path.display(),
            compression
        );

        let mut stream = Self::from_boxed(reader, format, ctx, options);
        stream.path = (!spec.console).then(|| path.to_path_buf());
        Ok(stream)
    }

    /// Reads already-decompressed records from `reader`.
    pub fn from_reader<R: BufRead + 'static>(
        reader: R,
        format: MolFormat,
        ctx: &ChemContext,
        options: ReadOptions,
    ) -> Self {
        Self::from_boxed(Box::new(reader), format, ctx, options)
    }

    fn from_boxed(
        reader: Box<dyn BufRead>,
        format: MolFormat,
        ctx: &ChemContext,
        options: ReadOptions,
    ) -> Self {
        Self {
            path: None,
            format,
            toolkit: ctx.toolkit(),
            remove_hydrogens: options.remove_hydrogens,
            reader: Some(reader),
            next_mol: None,
            line: String::with_capacity(128),
            line_number: 0,
            records_read: 0,
        }
    }

    pub fn format(&self) -> MolFormat {
        self.format
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Reads one line into `self.line`; returns `false` at end of input.
    fn read_line(&mut self) -> Result<bool, Error> {
        self.line.clear();
        let Some(reader) = self.reader.as_mut() else {
            return Ok(false);
        };
        let n = reader
            .read_line(&mut self.line)
            .map_err(|e| Error::from_io(e, self.path.clone()))?;
        if n > 0 {
            self.line_number += 1;
        }
        Ok(n > 0)
    }

    fn read_sdf_record(&mut self) -> Result<Option<Mol>, Error> {
        let mut block = String::new();
        let first_line = self.line_number + 1;
        let mut terminated = false;
        while self.read_line()? {
            if self.line.trim_end() == "$$$$" {
                terminated = true;
                break;
            }
            block.push_str(&self.line);
        }
        if !terminated && block.trim().is_empty() {
            return Ok(None);
        }
        let skeleton = molfile::read_record(&block, first_line)
            .map_err(|e| e.with_path(self.path.clone()))?;
        Mol::from_skeleton(self.toolkit, skeleton).map(Some)
    }

    fn read_smiles_record(&mut self) -> Result<Option<Mol>, Error> {
        loop {
            if !self.read_line()? {
                return Ok(None);
            }
            let text = self.line.trim();
            if text.is_empty() {
                continue;
            }
            let (smiles_text, title) = match text.split_once(char::is_whitespace) {
                Some((smiles_text, title)) => (smiles_text, title.trim()),
                None => (text, ""),
            };
            let mut skeleton = smiles::parse_at(smiles_text, self.line_number)
                .map_err(|e| e.with_path(self.path.clone()))?;
            skeleton.title = title.to_string();
            let native = NativeMol::from_smiles_skeleton(self.toolkit, skeleton)?;
            return Ok(Some(Mol::from_native(native)));
        }
    }

    fn read_next(&mut self) -> Result<Option<Mol>, Error> {
        let mol = match self.format {
            MolFormat::Sdf => self.read_sdf_record()?,
            MolFormat::Smiles => self.read_smiles_record()?,
        };
        Ok(mol.map(|mut mol| {
            if self.remove_hydrogens {
                mol.remove_hydrogens();
            }
            self.records_read += 1;
            log::trace!("Read record {} ({} atoms)", self.records_read, mol.num_atoms());
            mol
        }))
    }
}

impl PullStream for MolInputStream {
    type Item = Mol;

    fn has_next(&mut self) -> Result<bool, Error> {
        if self.next_mol.is_some() {
            return Ok(true);
        }
        if self.reader.is_none() {
            return Ok(false);
        }
        self.next_mol = self.read_next()?;
        Ok(self.next_mol.is_some())
    }

    fn advance(&mut self) -> Result<Mol, Error> {
        if self.has_next()? {
            self.next_mol.take().ok_or(Error::Exhausted)
        } else {
            Err(Error::Exhausted)
        }
    }

    fn close(&mut self) -> Result<(), Error> {
        if self.reader.take().is_some() {
            log::debug!(
                "Closed {} input after {} records",
                self.format,
                self.records_read
            );
        }
        self.next_mol = None;
        Ok(())
    }
}

impl Drop for MolInputStream {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::props::PropValue;
    use std::io::Cursor;

    const TWO_RECORDS: &str = "\
first
  MolForge          2D

  2  1  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.5000    0.0000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
M  END
> <source>
vendor

$$$$
second
  MolForge          2D

  1  0  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 N   0  0  0  0  0  0  0  0  0  0  0  0
M  END
$$$$
";

    fn stream(text: &'static str, format: MolFormat) -> MolInputStream {
        MolInputStream::from_reader(
            Cursor::new(text),
            format,
            &ChemContext::new(Toolkit::Table),
            ReadOptions::default(),
        )
    }

    #[test]
    fn sdf_records_are_read_in_order_with_their_tags() {
        let mut input = stream(TWO_RECORDS, MolFormat::Sdf);

        let first = input.advance().unwrap();
        assert_eq!(first.title(), "first");
        assert_eq!(first.atom_symbols(), vec!["C", "O"]);
        assert_eq!(first.get("source").unwrap(), PropValue::Text("vendor".into()));

        let second = input.advance().unwrap();
        assert_eq!(second.title(), "second");
        assert!(!input.has_next().unwrap());
        assert_eq!(input.records_read(), 2);
    }

    #[test]
    fn has_next_does_not_skip_records() {
        let mut input = stream(TWO_RECORDS, MolFormat::Sdf);
        assert!(input.has_next().unwrap());
        assert!(input.has_next().unwrap());
        assert_eq!(input.advance().unwrap().title(), "first");
    }

    #[test]
    fn smiles_lines_carry_titles_and_skip_blanks() {
        let input = stream("CCO ethanol\n\nc1ccccc1 benzene ring\n", MolFormat::Smiles);
        let records: Vec<Mol> = input.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title(), "ethanol");
        assert_eq!(records[1].title(), "benzene ring");
        assert_eq!(records[1].num_atoms(), 6);
    }

    #[test]
    fn bad_smiles_reports_the_line_number() {
        let mut input = stream("CC\nC1CC\n", MolFormat::Smiles);
        input.advance().unwrap();
        let err = input.advance().expect_err("unclosed ring");
        match err {
            Error::Parse { line_number, .. } => assert_eq!(line_number, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn closed_stream_reports_no_more_records() {
        let mut input = stream(TWO_RECORDS, MolFormat::Sdf);
        input.close().unwrap();
        input.close().unwrap();
        assert!(!input.has_next().unwrap());
        assert!(input.advance().unwrap_err().is_exhausted());
    }
}
