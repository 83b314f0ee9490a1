use crate::error::Error;
use std::fmt;
use std::path::Path;

/// Molecule file formats the streams can read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MolFormat {
    /// MDL SD file: V2000 connection tables with data items, `$$$$`-terminated.
    Sdf,
    /// One `SMILES title` pair per line.
    Smiles,
}

impl MolFormat {
    pub fn name(&self) -> &'static str {
        match self {
            MolFormat::Sdf => "SDF",
            MolFormat::Smiles => "SMILES",
        }
    }

    /// Format for a (lowercase) file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "sdf" | "sd" | "mol" => Some(MolFormat::Sdf),
            "smi" | "smiles" | "ism" | "can" => Some(MolFormat::Smiles),
            _ => None,
        }
    }
}

impl fmt::Display for MolFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Compression {
    #[default]
    None,
    Gzip,
}

/// What a file name says about the data behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathSpec {
    pub format: Option<MolFormat>,
    pub compression: Compression,
    /// Bare extension names such as `.sdf` select standard input or output.
    pub console: bool,
}

impl PathSpec {
    /// Inspects the file name: a case-insensitive `.gz` suffix selects gzip, the remaining
    /// extension selects the format.
    pub fn inspect(path: &Path) -> Self {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let (bare, compression) = match name.strip_suffix(".gz") {
            Some(bare) => (bare, Compression::Gzip),
            None => (name.as_str(), Compression::None),
        };
        let (stem, format) = match bare.rsplit_once('.') {
            Some((stem, ext)) => (stem, MolFormat::from_extension(ext)),
            None => (bare, None),
        };
        let no_directory = path.parent().is_none_or(|p| p.as_os_str().is_empty());
        Self {
            format,
            compression,
            console: format.is_some() && stem.is_empty() && no_directory,
        }
    }

    /// Resolves the format, failing for names without a known extension.
    pub fn require_format(&self, path: &Path) -> Result<MolFormat, Error> {
        self.format
            .ok_or_else(|| Error::unknown_format(Some(path.to_path_buf())))
    }
}
