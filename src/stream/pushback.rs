use super::PullStream;
use crate::error::Error;

/// Stage that lets consumers return records to the front of the stream.
///
/// Pushed-back records come out again in last-in, first-out order before anything new is
/// pulled from upstream.
pub struct Pushback<S: PullStream> {
    upstream: S,
    stack: Vec<S::Item>,
}

impl<S: PullStream> Pushback<S> {
    pub fn new(upstream: S) -> Self {
        Self {
            upstream,
            stack: Vec::new(),
        }
    }

    pub fn pushback(&mut self, item: S::Item) {
        self.stack.push(item);
    }

    pub fn inner(&self) -> &S {
        &self.upstream
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.upstream
    }

    /// Returns the upstream stream; pushed-back records are dropped.
    pub fn into_inner(self) -> S {
        self.upstream
    }
}

impl<S: PullStream> PullStream for Pushback<S> {
    type Item = S::Item;

    fn has_next(&mut self) -> Result<bool, Error> {
        if !self.stack.is_empty() {
            return Ok(true);
        }
        if !self.upstream.has_next()? {
            return Ok(false);
        }
        let item = self.upstream.advance()?;
        self.stack.push(item);
        Ok(true)
    }

    fn advance(&mut self) -> Result<S::Item, Error> {
        if self.has_next()? {
            self.stack.pop().ok_or(Error::Exhausted)
        } else {
            Err(Error::Exhausted)
        }
    }

    fn close(&mut self) -> Result<(), Error> {
        self.stack.clear();
        self.upstream.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::MemStream;

    #[test]
    fn pushed_back_records_are_replayed_first() {
        let mut stream = Pushback::new(MemStream::from(vec![1, 2, 3]));
        let first = stream.advance().unwrap();
        let second = stream.advance().unwrap();
        stream.pushback(second);
        stream.pushback(first);

        let all: Vec<i32> = stream.records().map(Result::unwrap).collect();
        assert_eq!(all, vec![1, 2, 3]);
    }

    #[test]
    fn pushback_after_exhaustion_revives_the_stream() {
        let mut stream = Pushback::new(MemStream::from(vec!["x"]));
        let item = stream.advance().unwrap();
        assert!(!stream.has_next().unwrap());
        stream.pushback(item);
        assert!(stream.has_next().unwrap());
        assert_eq!(stream.advance().unwrap(), "x");
    }

    #[test]
    fn close_reaches_upstream() {
        let mut stream = Pushback::new(MemStream::from(vec![1, 2]));
        stream.pushback(0);
        stream.close().unwrap();
        assert!(!stream.has_next().unwrap());
        assert!(stream.inner().is_empty());
    }
}
