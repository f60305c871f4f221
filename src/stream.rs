use std::error::Error;
use std::ops::{Add, Mul};
use std::rc::Rc;

use crate::cell::Deferred;
use crate::error::StreamError;
use crate::iter::Iter;

/// A deferred `Stream` which is computed when the tail is first forced.
type Tail<'a, T> = Deferred<'a, Stream<'a, T>, StreamError>;

enum Node<'a, T> {
    Empty,
    Cons {
        head: T,
        tail: Tail<'a, T>
    }
}

/// A lazy, memoized, possibly infinite sequence.
///
/// A stream is either empty or a head value followed by a deferred tail.
/// The tail is computed the first time it is forced and is shared by every clone
/// of the stream from then on.
///
/// Operations which have to force tails return a `Result`, because a tail
/// computation can fail (see [`StreamError`]).
pub struct Stream<'a, T>(Rc<Node<'a, T>>);

impl<'a, T> Stream<'a, T> {
    /// Creates a new empty stream.
    pub fn empty() -> Self {
        Stream(Rc::new(Node::Empty))
    }
    /// Creates a stream from its head and a computation of its tail.
    ///
    /// The computation runs when the tail is first forced.
    pub fn cons(head: T, mut tail: impl FnMut() -> Stream<'a, T> + 'a) -> Self {
        Stream::try_cons(head, move || Ok(tail()))
    }
    /// Like [`Stream::cons`], but the tail computation may fail.
    ///
    /// A failed computation is run again on the next force.
    pub fn try_cons(head: T, tail: impl FnMut() -> Result<Stream<'a, T>, StreamError> + 'a) -> Self {
        Stream(Rc::new(Node::Cons { head, tail: Deferred::fallible(tail) }))
    }
    /// Creates a stream from its head and an already known tail.
    pub fn prepend(head: T, rest: Stream<'a, T>) -> Self {
        Stream(Rc::new(Node::Cons { head, tail: Deferred::of(rest) }))
    }

    pub fn is_empty(&self) -> bool {
        matches!(*self.0, Node::Empty)
    }
    /// Gets the first element, or `None` if the stream is empty.
    pub fn first(&self) -> Option<&T> {
        match &*self.0 {
            Node::Empty => None,
            Node::Cons { head, .. } => Some(head),
        }
    }
    /// Gets the first element, failing if the stream is empty.
    pub fn head(&self) -> Result<&T, StreamError> {
        self.first().ok_or(StreamError::EmptyAccess { op: "head" })
    }
    /// Forces the tail and returns it, failing if the stream is empty.
    pub fn rest(&self) -> Result<&Stream<'a, T>, StreamError> {
        match &*self.0 {
            Node::Empty => Err(StreamError::EmptyAccess { op: "rest" }),
            Node::Cons { tail, .. } => tail.try_force(),
        }
    }
    /// Whether the tail has already been computed. Empty streams count as forced.
    pub fn is_tail_forced(&self) -> bool {
        match &*self.0 {
            Node::Empty => true,
            Node::Cons { tail, .. } => tail.is_forced(),
        }
    }
    /// Whether both streams are the same node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Gets the element at this index, or `None` if the stream is shorter than that.
    pub fn at(&self, n: usize) -> Result<Option<&T>, StreamError> {
        let mut s = self;
        for _ in 0..n {
            if s.is_empty() {
                return Ok(None);
            }
            s = s.rest()?;
        }
        Ok(s.first())
    }
    /// Drops the first `n` elements. This forces at most `n` tails.
    pub fn skip(&self, n: usize) -> Result<Stream<'a, T>, StreamError> {
        let mut s = self;
        for _ in 0..n {
            if s.is_empty() {
                break;
            }
            s = s.rest()?;
        }
        Ok(s.clone())
    }
    /// Calls `action` on every element in order.
    ///
    /// This will hang if the stream is infinite.
    pub fn each(&self, mut action: impl FnMut(&T)) -> Result<(), StreamError> {
        let mut s = self;
        while let Node::Cons { head, tail } = &*s.0 {
            action(head);
            s = tail.try_force()?;
        }
        Ok(())
    }
    /// Left fold over the stream.
    ///
    /// This will hang if the stream is infinite.
    pub fn reduce<R>(&self, initial: R, mut combine: impl FnMut(R, &T) -> R) -> Result<R, StreamError> {
        let mut acc = initial;
        let mut s = self;
        while let Node::Cons { head, tail } = &*s.0 {
            acc = combine(acc, head);
            s = tail.try_force()?;
        }
        Ok(acc)
    }
    pub fn iter(&self) -> Iter<'_, 'a, T> {
        Iter::new(self)
    }

    /// Removes the forced tail from this node if nothing else refers to the node.
    fn detach_tail(&mut self) -> Option<Stream<'a, T>> {
        match Rc::get_mut(&mut self.0)? {
            Node::Empty => None,
            Node::Cons { tail, .. } => tail.take(),
        }
    }
}

impl<'a, T: Clone + 'a> Stream<'a, T> {
    /// Collects every element into a `Vec`.
    ///
    /// This will hang if the stream is infinite.
    pub fn to_vec(&self) -> Result<Vec<T>, StreamError> {
        self.reduce(Vec::new(), |mut acc, t| {
            acc.push(t.clone());
            acc
        })
    }

    /// Creates a stream of the first `n` elements.
    ///
    /// This is lazy: the source's tails are only forced as the new stream is forced,
    /// and the source tail after the `n`th element is never forced.
    pub fn take(&self, n: usize) -> Stream<'a, T> {
        match &*self.0 {
            Node::Cons { head, .. } if n == 1 => Stream::prepend(head.clone(), Stream::empty()),
            Node::Cons { head, .. } if n > 1 => {
                let this = self.clone();
                Stream::try_cons(head.clone(), move || Ok(this.rest()?.take(n - 1)))
            },
            _ => Stream::empty(),
        }
    }

    /// Creates a stream of the elements accepted by `pred`.
    ///
    /// Rejected elements are skipped eagerly: this forces tails until an accepted element
    /// is found or the stream ends, so it will hang on an infinite stream where
    /// no further element is ever accepted.
    pub fn select(&self, pred: impl Fn(&T) -> bool + 'a) -> Result<Stream<'a, T>, StreamError> {
        self.select_with(Rc::new(pred))
    }
    fn select_with(&self, pred: Rc<dyn Fn(&T) -> bool + 'a>) -> Result<Stream<'a, T>, StreamError> {
        let mut s = self;
        loop {
            match &*s.0 {
                Node::Empty => return Ok(s.clone()),
                Node::Cons { head, .. } if pred(head) => {
                    let this = s.clone();
                    return Ok(Stream::try_cons(head.clone(), move || this.rest()?.select_with(Rc::clone(&pred))));
                },
                Node::Cons { tail, .. } => s = tail.try_force()?,
            }
        }
    }

    /// Creates a stream of running totals, starting from `initial + head`.
    ///
    /// The stream must not be empty. On a finite stream, forcing the tail after
    /// the last total fails with [`StreamError::EmptyAccess`].
    pub fn partial_sums(&self, initial: T) -> Result<Stream<'a, T>, StreamError>
        where T: Add<Output = T>
    {
        let head = self.first().ok_or(StreamError::EmptyAccess { op: "partial_sums" })?;
        let sum = initial + head.clone();

        let this = self.clone();
        let total = sum.clone();
        Ok(Stream::try_cons(sum, move || this.rest()?.partial_sums(total.clone())))
    }

    /// Multiplies every element by `factor`.
    pub fn scale(&self, factor: T) -> Stream<'a, T>
        where T: Mul<Output = T>
    {
        self.map(move |t| t.clone() * factor.clone())
    }

    /// Creates the infinite stream `seed, step(seed), step(step(seed)), ...`.
    pub fn iterate(seed: T, step: impl Fn(&T) -> T + 'a) -> Stream<'a, T> {
        Stream::iterate_with(seed, Rc::new(step))
    }
    fn iterate_with(seed: T, step: Rc<dyn Fn(&T) -> T + 'a>) -> Stream<'a, T> {
        let next = seed.clone();
        Stream::cons(seed, move || Stream::iterate_with(step(&next), Rc::clone(&step)))
    }
    /// Creates an infinite stream of the same value.
    pub fn repeat(value: T) -> Stream<'a, T> {
        Stream::iterate(value, T::clone)
    }
}

impl<'a, T: 'a> Stream<'a, T> {
    /// Applies `f` to every element.
    ///
    /// This is lazy: `f` is only applied to an element once that element is reached.
    pub fn map<U: 'a>(&self, f: impl Fn(&T) -> U + 'a) -> Stream<'a, U> {
        self.map_with(Rc::new(f))
    }
    fn map_with<U: 'a>(&self, f: Rc<dyn Fn(&T) -> U + 'a>) -> Stream<'a, U> {
        match &*self.0 {
            Node::Empty => Stream::empty(),
            Node::Cons { head, .. } => {
                let this = self.clone();
                Stream::try_cons(f(head), move || Ok(this.rest()?.map_with(Rc::clone(&f))))
            },
        }
    }

    /// Like [`Stream::map`], but `f` may fail.
    ///
    /// A failure surfaces as [`StreamError::Callable`] from whichever call reached
    /// the failing element (this call for the first element, a tail force for the others).
    pub fn try_map<U: 'a, E>(&self, f: impl Fn(&T) -> Result<U, E> + 'a) -> Result<Stream<'a, U>, StreamError>
        where E: Into<Box<dyn Error>>
    {
        self.try_map_with(Rc::new(move |t: &T| f(t).map_err(StreamError::callable)))
    }
    fn try_map_with<U: 'a>(&self, f: Rc<dyn Fn(&T) -> Result<U, StreamError> + 'a>) -> Result<Stream<'a, U>, StreamError> {
        match &*self.0 {
            Node::Empty => Ok(Stream::empty()),
            Node::Cons { head, .. } => {
                let value = f(head)?;
                let this = self.clone();
                Ok(Stream::try_cons(value, move || this.rest()?.try_map_with(Rc::clone(&f))))
            },
        }
    }

    /// Combines each pair of elements `(0, 1), (2, 3), ...` with `combine`.
    ///
    /// An odd trailing element is dropped. Creating the stream forces one tail.
    pub fn map_successive_pairs<U: 'a>(&self, combine: impl Fn(&T, &T) -> U + 'a) -> Result<Stream<'a, U>, StreamError> {
        self.map_pairs_with(Rc::new(combine))
    }
    fn map_pairs_with<U: 'a>(&self, combine: Rc<dyn Fn(&T, &T) -> U + 'a>) -> Result<Stream<'a, U>, StreamError> {
        let Node::Cons { head: a, tail } = &*self.0 else { return Ok(Stream::empty()) };
        let rest = tail.try_force()?;
        let Some(b) = rest.first() else { return Ok(Stream::empty()) };

        let value = combine(a, b);
        let rest = rest.clone();
        Ok(Stream::try_cons(value, move || rest.rest()?.map_pairs_with(Rc::clone(&combine))))
    }

    /// Creates a stream which pulls its elements from an iterator as the stream is forced.
    ///
    /// The first element is pulled immediately, to know whether the stream is empty.
    pub fn from_iter_lazy<I>(iter: I) -> Stream<'a, T>
        where I: IntoIterator<Item = T>,
            I::IntoIter: 'a
    {
        let mut it = iter.into_iter();
        let Some(head) = it.next() else { return Stream::empty() };

        Stream::from_pulled(head, it)
    }
    fn from_pulled<It>(head: T, it: It) -> Stream<'a, T>
        where It: Iterator<Item = T> + 'a
    {
        let mut rest = Some(it);
        Stream::try_cons(head, move || {
            // Pull before moving the iterator out, so a pull which panics can be retried.
            let it = rest.as_mut().ok_or(StreamError::EmptyAccess { op: "from_iter_lazy" })?;
            let Some(next) = it.next() else { return Ok(Stream::empty()) };

            let it = rest.take().ok_or(StreamError::EmptyAccess { op: "from_iter_lazy" })?;
            Ok(Stream::from_pulled(next, it))
        })
    }
}

impl<T> Default for Stream<'_, T> {
    fn default() -> Self {
        Self::empty()
    }
}
impl<T> Clone for Stream<'_, T> {
    fn clone(&self) -> Self {
        Stream(Rc::clone(&self.0))
    }
}
impl<T> Drop for Stream<'_, T> {
    fn drop(&mut self) {
        // Pop uniquely owned nodes one at a time, so a long forced chain
        // is not dropped recursively.
        let mut next = self.detach_tail();
        while let Some(mut s) = next {
            next = s.detach_tail();
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Stream<'_, T> {
    /// Prints the forced part of the stream. This never forces a tail.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        let mut s = self;
        while let Node::Cons { head, tail } = &*s.0 {
            list.entry(head);
            match tail.get() {
                Some(rest) => s = rest,
                None => {
                    list.entry(&format_args!(".."));
                    break;
                },
            }
        }
        list.finish()
    }
}

impl<'a, T> FromIterator<T> for Stream<'a, T> {
    /// Builds a fully forced stream.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter()
            .collect::<Vec<_>>()
            .into_iter()
            .rfold(Stream::empty(), |rest, t| Stream::prepend(t, rest))
    }
}
impl<T, const N: usize> From<[T; N]> for Stream<'_, T> {
    fn from(value: [T; N]) -> Self {
        Stream::from_iter(value)
    }
}
impl<'r, 'a, T> IntoIterator for &'r Stream<'a, T> {
    type Item = Result<&'r T, StreamError>;
    type IntoIter = Iter<'r, 'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
