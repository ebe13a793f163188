//! Bounded parallel map over vectors and channel streams.
//!
//! This crate runs a function over many inputs on a fixed number of worker
//! threads. The first failure, or cancellation of the caller's [`Context`],
//! stops the remaining work, and no operation returns while one of its
//! workers is still running.
//!
//! Streams are crossbeam channels wrapped in [`Stream`], each paired with a
//! [`Terminal`] that reports how its producer finished.
//!
//! # Examples
//!
//! Parallel map over a vector, keeping input order:
//! ```
//! use parflow::{par_map, Context, Options};
//!
//! let ctx = Context::background();
//! let squares = par_map(&ctx, vec![0, 1, 2, 3, 4], |x: i32| x * x, Options::new().concurrency(2));
//! assert_eq!(squares.unwrap(), vec![0, 1, 4, 9, 16]);
//! ```
//!
//! Fail fast on the first error:
//! ```
//! use parflow::{Context, Error, Options, ParallelExt};
//!
//! let ctx = Context::background();
//! let got = vec![1, 2, 3, 4].par_try(
//!     &ctx,
//!     |x: i32| if x == 3 { Err(Error::msg("three")) } else { Ok(x) },
//!     Options::new().concurrency(4),
//! );
//! assert_eq!(got.get().unwrap_err().to_string(), "three");
//! ```
//!
//! Map a live stream and wait for both stages:
//! ```
//! use parflow::{join_err, must, par_map_stream, stream, Context, Options};
//!
//! let ctx = Context::background();
//! let (numbers, source) = stream::range_n(&ctx, 100, Options::new());
//! let opts = Options::new().concurrency(5);
//! let (doubled, mapper) = par_map_stream(&ctx, numbers, |x: i64| x * 2, opts);
//! let total: i64 = doubled.sum();
//! assert_eq!(total, 9900);
//! must(join_err([source, mapper]));
//! ```
//!
//! Map with your own type instead of a closure:
//! ```
//! use parflow::{par_map, Context, Mapper, Options};
//!
//! // The type must support clone as each worker thread gets a copy.
//! #[derive(Clone)]
//! struct Scale(i64);
//!
//! impl Mapper<i32> for Scale {
//!     type Out = i64;
//!     fn apply(&mut self, x: i32) -> i64 {
//!         x as i64 * self.0
//!     }
//! }
//!
//! let ctx = Context::background();
//! let got = par_map(&ctx, vec![1, 2, 3], Scale(10), Options::new()).unwrap();
//! assert_eq!(got, vec![10, 20, 30]);
//! ```

mod context;
mod error;
mod group;
mod join;
mod mapper;
mod options;
mod outcome;
mod parallel;
pub mod stream;

pub use context::Context;
pub use error::{Error, Result, StdErrorShared};
pub use join::{join_err, must};
pub use mapper::Mapper;
pub use options::Options;
pub use outcome::{bind, map, try_map, Outcome};
pub use parallel::*;
pub use stream::{Stream, Terminal};
