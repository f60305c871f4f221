//! Combinators which walk several streams at once.

use std::iter::Sum;
use std::rc::Rc;

use crate::error::StreamError;
use crate::Stream;

/// Walks `streams` in lockstep, combining one element from each with `combine`.
///
/// The result ends when the *first* stream ends. The other streams must be at least
/// as long as the first: reaching the end of one of them fails with
/// [`StreamError::EmptyAccess`]. Zipping no streams gives an empty stream.
pub fn zip_map<'a, T, U, F>(streams: Vec<Stream<'a, T>>, combine: F) -> Result<Stream<'a, U>, StreamError>
    where T: 'a,
        U: 'a,
        F: Fn(&[&T]) -> U + 'a
{
    zip_map_with(streams, Rc::new(combine))
}
fn zip_map_with<'a, T: 'a, U: 'a>(
    streams: Vec<Stream<'a, T>>,
    combine: Rc<dyn Fn(&[&T]) -> U + 'a>
) -> Result<Stream<'a, U>, StreamError> {
    match streams.first() {
        Some(s) if !s.is_empty() => {},
        _ => return Ok(Stream::empty()),
    }

    let heads = streams.iter()
        .enumerate()
        .map(|(i, s)| s.first().ok_or_else(|| {
            log::debug!("zip_map: stream {i} ended before the first stream");
            StreamError::EmptyAccess { op: "zip_map" }
        }))
        .collect::<Result<Vec<_>, _>>()?;
    let value = combine(&heads);

    Ok(Stream::try_cons(value, move || {
        let rests = streams.iter()
            .map(|s| s.rest().cloned())
            .collect::<Result<Vec<_>, _>>()?;

        zip_map_with(rests, Rc::clone(&combine))
    }))
}

/// Adds the streams together element by element.
///
/// This has the same length rules as [`zip_map`].
pub fn add<'a, T>(streams: Vec<Stream<'a, T>>) -> Result<Stream<'a, T>, StreamError>
    where T: for<'t> Sum<&'t T> + 'a
{
    zip_map(streams, |heads| heads.iter().copied().sum())
}

/// Alternates the elements of two streams, starting with `s1`.
///
/// Once one of the streams ends, the rest of the other follows.
pub fn interleave<'a, T: Clone + 'a>(s1: Stream<'a, T>, s2: Stream<'a, T>) -> Stream<'a, T> {
    let Some(head) = s1.first().cloned() else { return s2 };

    Stream::try_cons(head, move || Ok(interleave(s2.clone(), s1.rest()?.clone())))
}
