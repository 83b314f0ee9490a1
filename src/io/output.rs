use super::format::{Compression, MolFormat, PathSpec};
use crate::error::Error;
use crate::model::mol::Mol;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Options for [`MolOutputStream`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Overrides the format implied by the file name.
    pub format: Option<MolFormat>,
    /// Overrides the compression implied by the file name.
    pub compression: Option<Compression>,
}

enum Sink {
    Plain(BufWriter<Box<dyn Write>>),
    Gzip(GzEncoder<BufWriter<Box<dyn Write>>>),
}

impl Sink {
    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Sink::Plain(w) => w,
            Sink::Gzip(w) => w,
        }
    }

    /// Finishes the gzip member (if any), then flushes the byte sink.
    fn finish(self) -> io::Result<()> {
        match self {
            Sink::Plain(mut w) => w.flush(),
            Sink::Gzip(encoder) => encoder.finish()?.flush(),
        }
    }
}

/// Sink writing molecules as SD records or SMILES lines.
///
/// Output is buffered; [`close`](Self::close) (or dropping the stream) finishes the gzip
/// layer before flushing the file, so a compressed file is complete once the stream is
/// closed.
pub struct MolOutputStream {
    path: Option<PathBuf>,
    format: MolFormat,
    sink: Option<Sink>,
    records_written: usize,
}

impl MolOutputStream {
    /// Creates `path`, selecting format and compression from its name unless `options`
    /// override them. A bare extension such as `.smi` writes to standard output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFormat`] when no format can be determined and
    /// [`Error::Io`] when the file cannot be created.
    pub fn create(path: impl AsRef<Path>, options: WriteOptions) -> Result<Self, Error> {
        let path = path.as_ref();
        let spec = PathSpec::inspect(path);
        let format = match options.format {
            Some(format) => format,
            None => spec.require_format(path)?,
        };
        let compression = options.compression.unwrap_or(spec.compression);

        let raw: Box<dyn Write> = if spec.console {
            Box::new(io::stdout())
        } else {
            let file =
                File::create(path).map_err(|e| Error::from_io(e, Some(path.to_path_buf())))?;
            Box::new(file)
        };
        log::debug!(
            "Opened {} output '{}' ({:?})",
            format,
            path.display(),
            compression
        );

        let mut stream = Self::from_boxed(raw, format, compression);
        stream.path = (!spec.console).then(|| path.to_path_buf());
        Ok(stream)
    }

    /// Writes records to `writer`, compressing them when `compression` asks for it.
    pub fn from_writer<W: Write + 'static>(
        writer: W,
        format: MolFormat,
        compression: Compression,
    ) -> Self {
        Self::from_boxed(Box::new(writer), format, compression)
    }

    fn from_boxed(raw: Box<dyn Write>, format: MolFormat, compression: Compression) -> Self {
        let buffered = BufWriter::new(raw);
        let sink = match compression {
            Compression::None => Sink::Plain(buffered),
            Compression::Gzip => Sink::Gzip(GzEncoder::new(
                buffered,
                flate2::Compression::default(),
            )),
        };
        Self {
            path: None,
            format,
            sink: Some(sink),
            records_written: 0,
        }
    }

    pub fn format(&self) -> MolFormat {
        self.format
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Appends one molecule.
    ///
    /// SD output is the molecule's full record including its properties; SMILES output is
    /// `canonical-smiles title`.
    pub fn write(&mut self, mol: &Mol) -> Result<(), Error> {
        let text = match self.format {
            MolFormat::Sdf => mol.sdf_record(),
            MolFormat::Smiles => format!("{} {}\n", mol.canonical_smiles(), mol.title()),
        };
        let sink = self.sink.as_mut().ok_or_else(|| {
            Error::from_io(io::Error::other("output stream is closed"), self.path.clone())
        })?;
        sink.writer()
            .write_all(text.as_bytes())
            .map_err(|e| Error::from_io(e, self.path.clone()))?;
        self.records_written += 1;
        Ok(())
    }

    /// Writes every molecule of an iterator, stopping at the first error.
    pub fn write_all<'a>(&mut self, mols: impl IntoIterator<Item = &'a Mol>) -> Result<(), Error> {
        for mol in mols {
            self.write(mol)?;
        }
        Ok(())
    }

    /// Finishes compression and flushes the destination. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<(), Error> {
        if let Some(sink) = self.sink.take() {
            sink.finish()
                .map_err(|e| Error::from_io(e, self.path.clone()))?;
            log::debug!(
                "Closed {} output after {} records",
                self.format,
                self.records_written
            );
        }
        Ok(())
    }
}

impl Drop for MolOutputStream {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Failed to close molecule output: {}", e);
        }
    }
}
