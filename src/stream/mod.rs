//! Pull-based record streams.
//!
//! A [`PullStream`] answers `has_next` without consuming anything and hands out records
//! one at a time through `advance`. Stages compose by value: a stage owns its upstream,
//! closing a stage closes everything above it, and any stream converts into a standard
//! [`Iterator`] of `Result`s through [`PullStream::records`].

mod memory;
mod pushback;
mod transform;

pub use memory::{IterSource, MemStream};
pub use pushback::Pushback;
pub use transform::{Compute, Lambda, MapFn, Transform, lambda, map};

use crate::error::Error;

/// Pull-iterator contract shared by sources, stages, and sinks.
///
/// `has_next` is idempotent: calling it repeatedly without `advance` never skips a record.
/// After `close`, `has_next` reports `false`.
pub trait PullStream {
    type Item;

    /// Whether another record is available, pulling from upstream if needed.
    fn has_next(&mut self) -> Result<bool, Error>;

    /// Takes the next record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Exhausted`] when no record remains.
    fn advance(&mut self) -> Result<Self::Item, Error>;

    /// Releases resources held by this stream and everything upstream of it. Closing is
    /// idempotent.
    fn close(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// Adapts the stream into an [`Iterator`] that stops after the first error.
    fn records(self) -> Records<Self>
    where
        Self: Sized,
    {
        Records {
            stream: self,
            done: false,
        }
    }
}

impl<S: PullStream + ?Sized> PullStream for &mut S {
    type Item = S::Item;

    fn has_next(&mut self) -> Result<bool, Error> {
        (**self).has_next()
    }

    fn advance(&mut self) -> Result<Self::Item, Error> {
        (**self).advance()
    }

    fn close(&mut self) -> Result<(), Error> {
        (**self).close()
    }
}

impl<S: PullStream + ?Sized> PullStream for Box<S> {
    type Item = S::Item;

    fn has_next(&mut self) -> Result<bool, Error> {
        (**self).has_next()
    }

    fn advance(&mut self) -> Result<Self::Item, Error> {
        (**self).advance()
    }

    fn close(&mut self) -> Result<(), Error> {
        (**self).close()
    }
}

/// Iterator over the records of a [`PullStream`].
pub struct Records<S> {
    stream: S,
    done: bool,
}

impl<S> Records<S> {
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: PullStream> Iterator for Records<S> {
    type Item = Result<S::Item, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = match self.stream.has_next() {
            Ok(true) => self.stream.advance(),
            Ok(false) => {
                self.done = true;
                return None;
            }
            Err(e) => Err(e),
        };
        if result.is_err() {
            self.done = true;
        }
        Some(result)
    }
}

impl<S: PullStream> std::iter::FusedIterator for Records<S> {}
