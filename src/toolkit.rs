//! Toolkit identifiers and process-wide default selection.
//!
//! The default toolkit is resolved once, in order: an explicit override, the
//! `MOLFORGE_TOOLKIT` environment variable, then an availability probe that prefers the
//! graph engine. Library code should take the toolkit from a
//! [`ChemContext`](crate::ChemContext) and leave the process default to entry points.

use crate::error::Error;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

/// Environment variable naming the default toolkit (`graph` or `table`).
pub const TOOLKIT_ENV_VAR: &str = "MOLFORGE_TOOLKIT";

/// Identifier of a native molecule engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toolkit {
    /// Graph engine: contiguous atom indices, re-saturating edits, read-only by default.
    Graph,
    /// Slot-table engine: stable atom ids, stored hydrogen counts.
    Table,
}

impl Toolkit {
    pub const ALL: [Toolkit; 2] = [Toolkit::Graph, Toolkit::Table];

    pub fn name(&self) -> &'static str {
        match self {
            Toolkit::Graph => "graph",
            Toolkit::Table => "table",
        }
    }

    pub fn is_available(&self) -> bool {
        match self {
            Toolkit::Graph => cfg!(feature = "graph"),
            Toolkit::Table => true,
        }
    }

    /// First available toolkit in preference order.
    pub fn probe() -> Toolkit {
        if Toolkit::Graph.is_available() {
            Toolkit::Graph
        } else {
            Toolkit::Table
        }
    }
}

impl fmt::Display for Toolkit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Toolkit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "graph" => Ok(Toolkit::Graph),
            "table" => Ok(Toolkit::Table),
            _ => Err(Error::UnrecognizedToolkit {
                name: s.to_string(),
            }),
        }
    }
}

/// Resolves a toolkit from an explicit override and the raw environment value.
///
/// An unset or blank environment value falls through to [`Toolkit::probe`].
///
/// # Errors
///
/// Returns [`Error::UnrecognizedToolkit`] for an unknown name and
/// [`Error::ToolkitUnavailable`] when the named toolkit was compiled out.
pub fn resolve(explicit: Option<Toolkit>, env_value: Option<&str>) -> Result<Toolkit, Error> {
    let toolkit = match (explicit, env_value.map(str::trim)) {
        (Some(toolkit), _) => toolkit,
        (None, Some(name)) if !name.is_empty() => name.parse()?,
        _ => return Ok(Toolkit::probe()),
    };
    if toolkit.is_available() {
        Ok(toolkit)
    } else {
        Err(Error::ToolkitUnavailable { toolkit })
    }
}

static DEFAULT_TOOLKIT: Mutex<Option<Toolkit>> = Mutex::new(None);

fn default_slot() -> MutexGuard<'static, Option<Toolkit>> {
    DEFAULT_TOOLKIT
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Process-wide default toolkit, resolved from the environment on first use.
pub fn default_toolkit() -> Result<Toolkit, Error> {
    let mut slot = default_slot();
    if let Some(toolkit) = *slot {
        return Ok(toolkit);
    }
    let env_value = std::env::var(TOOLKIT_ENV_VAR).ok();
    let toolkit = resolve(None, env_value.as_deref())?;
    log::debug!("Default toolkit resolved to '{}'", toolkit);
    *slot = Some(toolkit);
    Ok(toolkit)
}

/// Sets the process-wide default, returning the previously resolved value.
pub fn set_default_toolkit(toolkit: Toolkit) -> Option<Toolkit> {
    default_slot().replace(toolkit)
}

/// Restores the previous process default when dropped.
#[must_use = "the override is reverted as soon as the guard is dropped"]
#[derive(Debug)]
pub struct DefaultToolkitGuard {
    previous: Option<Toolkit>,
}

impl Drop for DefaultToolkitGuard {
    fn drop(&mut self) {
        *default_slot() = self.previous;
    }
}

/// Overrides the process default until the returned guard is dropped.
pub fn override_default_toolkit(toolkit: Toolkit) -> DefaultToolkitGuard {
    DefaultToolkitGuard {
        previous: set_default_toolkit(toolkit),
    }
}

/// Runs `f` with the process default set to `toolkit`, restoring it afterwards even if
/// `f` panics.
pub fn with_default_toolkit<T>(toolkit: Toolkit, f: impl FnOnce() -> T) -> T {
    let _guard = override_default_toolkit(toolkit);
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("graph".parse::<Toolkit>().unwrap(), Toolkit::Graph);
        assert_eq!(" TABLE ".parse::<Toolkit>().unwrap(), Toolkit::Table);
        assert_eq!(Toolkit::Table.to_string(), "table");
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = "openeye".parse::<Toolkit>().expect_err("unknown toolkit name");
        match err {
            Error::UnrecognizedToolkit { name } => assert_eq!(name, "openeye"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn resolve_prefers_override_then_environment_then_probe() {
        assert_eq!(
            resolve(Some(Toolkit::Table), Some("graph")).unwrap(),
            Toolkit::Table
        );
        assert_eq!(resolve(None, Some("table")).unwrap(), Toolkit::Table);
        assert_eq!(resolve(None, Some("  ")).unwrap(), Toolkit::probe());
        assert_eq!(resolve(None, None).unwrap(), Toolkit::probe());
        assert!(resolve(None, Some("bogus")).is_err());
    }

    #[test]
    fn override_guard_restores_previous_default() {
        with_default_toolkit(Toolkit::Table, || {
            assert_eq!(default_toolkit().unwrap(), Toolkit::Table);
            {
                let _inner = override_default_toolkit(Toolkit::Graph);
                assert_eq!(default_toolkit().unwrap(), Toolkit::Graph);
            }
            assert_eq!(default_toolkit().unwrap(), Toolkit::Table);
        });
    }
}
