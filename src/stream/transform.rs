use super::PullStream;
use crate::error::Error;

/// Per-record computation applied by a [`Transform`] stage.
///
/// Returning `Ok(None)` drops the record; the stage then pulls the next one.
pub trait Compute<I> {
    type Output;

    fn compute(&mut self, item: I) -> Result<Option<Self::Output>, Error>;
}

impl<I, O, F> Compute<I> for F
where
    F: FnMut(I) -> Result<Option<O>, Error>,
{
    type Output = O;

    fn compute(&mut self, item: I) -> Result<Option<O>, Error> {
        self(item)
    }
}

/// Infallible one-to-one computation, see [`map`].
pub struct MapFn<F>(pub F);

impl<I, O, F> Compute<I> for MapFn<F>
where
    F: FnMut(I) -> O,
{
    type Output = O;

    fn compute(&mut self, item: I) -> Result<Option<O>, Error> {
        Ok(Some((self.0)(item)))
    }
}

/// Stage applying a [`Compute`] to every upstream record, skipping dropped ones.
///
/// `has_next` computes ahead and buffers one result, so a filtered-out tail of the
/// upstream correctly reports the end of the stream.
pub struct Transform<S, C>
where
    S: PullStream,
    C: Compute<S::Item>,
{
    upstream: S,
    compute: C,
    buffered: Option<C::Output>,
}

/// A [`Transform`] driven by a closure.
pub type Lambda<S, F> = Transform<S, F>;

impl<S, C> Transform<S, C>
where
    S: PullStream,
    C: Compute<S::Item>,
{
    pub fn new(upstream: S, compute: C) -> Self {
        Self {
            upstream,
            compute,
            buffered: None,
        }
    }

    pub fn inner(&self) -> &S {
        &self.upstream
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.upstream
    }

    pub fn compute_ref(&self) -> &C {
        &self.compute
    }
}

impl<S, F, O> Transform<S, MapFn<F>>
where
    S: PullStream,
    F: FnMut(S::Item) -> O,
{
    /// Stage mapping every record through an infallible closure.
    pub fn map(upstream: S, f: F) -> Self {
        Self::new(upstream, MapFn(f))
    }
}

impl<S, C> PullStream for Transform<S, C>
where
    S: PullStream,
    C: Compute<S::Item>,
{
    type Item = C::Output;

    fn has_next(&mut self) -> Result<bool, Error> {
        while self.buffered.is_none() {
            if !self.upstream.has_next()? {
                return Ok(false);
            }
            let item = self.upstream.advance()?;
            self.buffered = self.compute.compute(item)?;
        }
        Ok(true)
    }

    fn advance(&mut self) -> Result<C::Output, Error> {
        if self.has_next()? {
            self.buffered.take().ok_or(Error::Exhausted)
        } else {
            Err(Error::Exhausted)
        }
    }

    fn close(&mut self) -> Result<(), Error> {
        self.buffered = None;
        self.upstream.close()
    }
}

/// Wraps `upstream` in a stage running a fallible, filtering closure.
pub fn lambda<S, F, O>(upstream: S, f: F) -> Lambda<S, F>
where
    S: PullStream,
    F: FnMut(S::Item) -> Result<Option<O>, Error>,
{
    Transform::new(upstream, f)
}

/// Wraps `upstream` in a stage mapping every record through `f`.
pub fn map<S, F, O>(upstream: S, f: F) -> Transform<S, MapFn<F>>
where
    S: PullStream,
    F: FnMut(S::Item) -> O,
{
    Transform::map(upstream, f)
}
