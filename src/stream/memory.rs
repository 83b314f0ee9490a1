use super::PullStream;
use crate::error::Error;
use std::collections::VecDeque;

/// In-memory FIFO stream; records can be pushed while it is being consumed.
#[derive(Debug, Clone, Default)]
pub struct MemStream<T> {
    items: VecDeque<T>,
    closed: bool,
}

impl<T> MemStream<T> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
            closed: false,
        }
    }

    pub fn push(&mut self, item: T) {
        if !self.closed {
            self.items.push_back(item);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> From<Vec<T>> for MemStream<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            items: items.into(),
            closed: false,
        }
    }
}

impl<T> FromIterator<T> for MemStream<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
            closed: false,
        }
    }
}

impl<T> PullStream for MemStream<T> {
    type Item = T;

    fn has_next(&mut self) -> Result<bool, Error> {
        Ok(!self.items.is_empty())
    }

    fn advance(&mut self) -> Result<T, Error> {
        self.items.pop_front().ok_or(Error::Exhausted)
    }

    fn close(&mut self) -> Result<(), Error> {
        self.items.clear();
        self.closed = true;
        Ok(())
    }
}

/// Adapts any [`Iterator`] into a [`PullStream`].
pub struct IterSource<I: Iterator> {
    iter: Option<I>,
    peeked: Option<I::Item>,
}

impl<I: Iterator> IterSource<I> {
    pub fn new(iter: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            iter: Some(iter.into_iter()),
            peeked: None,
        }
    }
}

impl<I: Iterator> PullStream for IterSource<I> {
    type Item = I::Item;

    fn has_next(&mut self) -> Result<bool, Error> {
        if self.peeked.is_none() {
            self.peeked = self.iter.as_mut().and_then(Iterator::next);
        }
        Ok(self.peeked.is_some())
    }

    fn advance(&mut self) -> Result<I::Item, Error> {
        self.has_next()?;
        self.peeked.take().ok_or(Error::Exhausted)
    }

    fn close(&mut self) -> Result<(), Error> {
        self.iter = None;
        self.peeked = None;
        Ok(())
    }
}
