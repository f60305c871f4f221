//! Lazy, memoized, possibly infinite streams.
//!
//! A [`Stream`] is either empty or a head value followed by a deferred tail. Tails are
//! computed at most once (see [`Deferred`]) and shared by every holder of the stream,
//! so streams can be defined corecursively:
//!
//! ```
//! use lazy_stream::Stream;
//!
//! fn integers_from<'a>(k: u64) -> Stream<'a, u64> {
//!     Stream::cons(k, move || integers_from(k + 1))
//! }
//!
//! let evens = integers_from(0).select(|t| t % 2 == 0).unwrap();
//! assert_eq!(evens.take(4).to_vec().unwrap(), [0, 2, 4, 6]);
//! ```
//!
//! Operations which only build a new stream (`map`, `take`, `scale`, ...) never
//! walk the source. Operations which consume a stream (`each`, `reduce`, `to_vec`)
//! walk all of it and will hang if it is infinite.

pub mod cell;
pub mod error;
pub mod iter;
pub mod stream;
pub mod transform;

pub use cell::Deferred;
pub use error::StreamError;
pub use iter::StreamItertools;
pub use stream::Stream;
pub use transform::{add, interleave, zip_map};
