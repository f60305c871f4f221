//! Utilities to move between [`Stream`]s and iterators.

use std::iter::FusedIterator;

use crate::error::StreamError;
use crate::Stream;

/// A set of methods to apply onto iterators to build streams from them.
///
/// These can be accessed by importing this trait.
pub trait StreamItertools: Iterator {
    /// This collector holds the iterator and uses it to build a [`Stream`].
    ///
    /// Unlike [`Iterator::collect`], this does not evaluate every element of the iterator,
    /// but rather pulls new elements once the stream is forced that far.
    ///
    /// As a result, the iterator has to last as long as the resulting `Stream`.
    fn collect_lazy<'a>(self) -> Stream<'a, Self::Item>
        where Self: Sized + 'a,
            Self::Item: 'a
    {
        Stream::from_iter_lazy(self)
    }
}
impl<I: Iterator> StreamItertools for I {}

/// Iterates over the elements of a stream, forcing tails as it goes.
/// Created by [`Stream::iter`].
///
/// A tail is only forced when the element after it is requested.
/// If forcing fails, the error is yielded once and the iterator ends.
pub struct Iter<'r, 'a, T> {
    node: Option<&'r Stream<'a, T>>,
    yielded: bool
}
impl<'r, 'a, T> Iter<'r, 'a, T> {
    pub(crate) fn new(s: &'r Stream<'a, T>) -> Self {
        Iter { node: Some(s), yielded: false }
    }
}
impl<'r, 'a, T> Iterator for Iter<'r, 'a, T> {
    type Item = Result<&'r T, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut s = self.node.take()?;
        if self.yielded {
            s = match s.rest() {
                Ok(rest) => rest,
                Err(e) => return Some(Err(e)),
            };
        }

        let head = s.first()?;
        self.node = Some(s);
        self.yielded = true;
        Some(Ok(head))
    }
}
impl<T> FusedIterator for Iter<'_, '_, T> {}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use crate::{Stream, StreamError};

    use super::StreamItertools;

    #[test]
    fn stream_to_iter() {
        let s = Stream::from([2usize, 1, 0]);

        let mut it = s.iter();
        assert_eq!(it.next().transpose().unwrap(), Some(&2));
        assert_eq!(it.next().transpose().unwrap(), Some(&1));
        assert_eq!(it.next().transpose().unwrap(), Some(&0));
        assert!(it.next().is_none());
        assert!(it.next().is_none());

        let total: usize = (&s).into_iter().map(Result::unwrap).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn iter_forces_on_demand() {
        let s = Stream::iterate(0u32, |t| t + 1);
        let firsts: Vec<u32> = s.iter()
            .take(3)
            .map(|t| t.map(|t| *t))
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(firsts, [0, 1, 2]);
        // the third element was yielded without forcing the tail after it
        assert!(!s.skip(2).unwrap().is_tail_forced());
    }

    #[test]
    fn iter_stops_at_fault() {
        let s = Stream::try_cons(1, || Err(StreamError::callable("broken tail")));

        let mut it = s.iter();
        assert_eq!(it.next().transpose().unwrap(), Some(&1));
        assert!(matches!(it.next(), Some(Err(StreamError::Callable(_)))));
        assert!(it.next().is_none());
    }

    #[test]
    fn collect_lazy() {
        let pulled = Cell::new(0);
        let s = (0..10)
            .inspect(|_| pulled.set(pulled.get() + 1))
            .map(|t| t * 3)
            .collect_lazy();

        assert_eq!(s.at(3).unwrap(), Some(&9));
        assert_eq!(pulled.get(), 4);
        assert_eq!(s.to_vec().unwrap().len(), 10);
    }
}
