use crate::toolkit::Toolkit;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("stream exhausted: no records remain")]
    Exhausted,

    #[error(
        "unknown molecule file format for {path_desc}",
        path_desc = PathDisplay(path)
    )]
    UnknownFormat { path: Option<PathBuf> },

    #[error("unrecognized toolkit '{name}' (expected 'graph' or 'table')")]
    UnrecognizedToolkit { name: String },

    #[error("toolkit '{toolkit}' is not available in this build")]
    ToolkitUnavailable { toolkit: Toolkit },

    #[error("schema mismatch in record {record}: column '{column}' {details}")]
    SchemaMismatch {
        record: usize,
        column: String,
        details: String,
    },

    #[error("Mol has no key '{key}'")]
    KeyNotFound { key: String },

    #[error(
        "I/O error for {path_desc}: {source}",
        path_desc = PathDisplay(path)
    )]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "failed to parse {format} {path_desc}: {details} (line {line_number})",
        path_desc = PathDisplay(path)
    )]
    Parse {
        format: &'static str,
        path: Option<PathBuf>,
        line_number: usize,
        details: String,
    },

    #[error(
        "inconsistent data in {format} {path_desc}: {details}",
        path_desc = PathDisplay(path)
    )]
    InconsistentData {
        format: &'static str,
        path: Option<PathBuf>,
        details: String,
    },

    #[error("atom {index} does not exist in this molecule")]
    InvalidAtom { index: usize },

    #[error("molecule is read-only; call make_read_write() before {operation}")]
    ReadOnly { operation: &'static str },

    #[error("invalid fingerprint encoding: {details}")]
    InvalidFingerprint { details: String },

    #[error("invalid value '{value}' for '{field}': {details}")]
    InvalidValue {
        field: String,
        value: String,
        details: String,
    },

    #[error("pipeline stage '{stage}' failed: {details}")]
    Stage { stage: String, details: String },
}

impl Error {
    pub fn from_io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { path, source }
    }

    pub fn parse(
        format: &'static str,
        path: Option<PathBuf>,
        line_number: usize,
        details: impl Into<String>,
    ) -> Self {
        Self::Parse {
            format,
            path,
            line_number,
            details: details.into(),
        }
    }

    pub fn inconsistent_data(
        format: &'static str,
        path: Option<PathBuf>,
        details: impl Into<String>,
    ) -> Self {
        Self::InconsistentData {
            format,
            path,
            details: details.into(),
        }
    }

    pub fn unknown_format(path: Option<PathBuf>) -> Self {
        Self::UnknownFormat { path }
    }

    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    pub fn schema_mismatch(
        record: usize,
        column: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::SchemaMismatch {
            record,
            column: column.into(),
            details: details.into(),
        }
    }

    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            details: details.into(),
        }
    }

    pub fn stage(stage: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            details: details.into(),
        }
    }

    /// Returns `true` for the terminal end-of-stream condition.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    /// Attaches a path to errors raised while the source was still anonymous.
    pub(crate) fn with_path(self, path: Option<PathBuf>) -> Self {
        match self {
            Self::Parse {
                format,
                path: None,
                line_number,
                details,
            } => Self::Parse {
                format,
                path,
                line_number,
                details,
            },
            Self::InconsistentData {
                format,
                path: None,
                details,
            } => Self::InconsistentData {
                format,
                path,
                details,
            },
            Self::Io { path: None, source } => Self::Io { path, source },
            other => other,
        }
    }
}

struct PathDisplay<'a>(&'a Option<PathBuf>);

impl<'a> fmt::Display for PathDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(p) => write!(f, "file '{}'", p.display()),
            None => write!(f, "stream source"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_not_found_message_names_the_key() {
        let err = Error::key_not_found("logP");
        assert_eq!(err.to_string(), "Mol has no key 'logP'");
    }

    #[test]
    fn parse_error_message_includes_path_and_line() {
        let err = Error::parse("SDF", Some(PathBuf::from("in.sdf")), 4, "bad counts line");
        let message = err.to_string();
        assert!(message.contains("file 'in.sdf'"));
        assert!(message.contains("line 4"));
        assert!(message.contains("bad counts line"));
    }

    #[test]
    fn anonymous_sources_render_as_stream_source() {
        let err = Error::unknown_format(None);
        assert!(err.to_string().contains("stream source"));
    }

    #[test]
    fn with_path_fills_missing_path_only() {
        let err = Error::parse("SMILES", None, 2, "unexpected ')'")
            .with_path(Some(PathBuf::from("a.smi")));
        match err {
            Error::Parse { path, .. } => assert_eq!(path, Some(PathBuf::from("a.smi"))),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = Error::parse("SMILES", Some(PathBuf::from("first.smi")), 2, "x")
            .with_path(Some(PathBuf::from("second.smi")));
        match err {
            Error::Parse { path, .. } => assert_eq!(path, Some(PathBuf::from("first.smi"))),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn exhausted_is_detected() {
        assert!(Error::Exhausted.is_exhausted());
        assert!(!Error::key_not_found("x").is_exhausted());
    }
}
