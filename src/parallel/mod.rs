//! Bounded parallel map and try over vectors and streams.
//!
//! Every operation here runs the user function on at most `concurrency`
//! worker threads fed through a rendezvous dispatch channel. Workers are
//! scoped, so an operation never returns (or reports on its terminal) while
//! one of its workers is still running.
//!
//! The try variants are fail-fast: the first error observed cancels the
//! operation and is the only error reported. When several elements fail at
//! about the same time, which of them wins is not specified.

use std::{any::Any, panic};

use crossbeam_channel::select;

use crate::{
    context::Context,
    error::{Error, Result},
    group::{Group, PanicGuard},
    mapper::Mapper,
    options::Options,
    outcome::Outcome,
};

mod channel;
mod ordered;
mod unordered;

pub use channel::*;
pub use ordered::*;
pub use unordered::*;

/// Runs `mapper` over everything `feed` yields on `workers` scoped threads.
///
/// `feed` is called on the dispatching (current) thread and hands out
/// `(key, item)` pairs until it returns `Ok(None)`. Each result is passed,
/// with its key, to `sink` on the worker that produced it. Any error from
/// `feed`, the mapper or `sink` fails `group`. Returns `Err` with the panic
/// payload if a worker panicked.
pub(crate) fn run<K, T, U, E, M, F, S>(
    group: &Group,
    workers: usize,
    mapper: M,
    mut feed: F,
    sink: S,
) -> std::thread::Result<()>
where
    K: Send,
    T: Send,
    E: Into<Error>,
    M: Mapper<T, Out = std::result::Result<U, E>> + Clone + Send,
    F: FnMut(&Context) -> Result<Option<(K, T)>>,
    S: Fn(K, U) -> Result<()> + Sync,
{
    let ctx = group.context();
    let (dispatch, dispatch_rx) = crossbeam_channel::bounded::<(K, T)>(0);
    log::debug!("starting {} workers", workers);

    crossbeam_utils::thread::scope(|s| {
        for id in 0..workers {
            let mut mapper = mapper.clone();
            let dispatch_rx = dispatch_rx.clone();
            let sink = &sink;
            s.spawn(move |_| {
                let _guard = PanicGuard::new(group);
                while let Ok((key, item)) = dispatch_rx.recv() {
                    if !group.checkpoint() {
                        break;
                    }
                    let out = match mapper.apply(item) {
                        Ok(out) => out,
                        Err(err) => {
                            group.fail(err.into());
                            break;
                        }
                    };
                    // A sibling may have failed while we were busy.
                    if !group.checkpoint() {
                        break;
                    }
                    if let Err(err) = sink(key, out) {
                        group.fail(err);
                        break;
                    }
                }
                log::trace!("worker {} exiting", id);
            });
        }
        drop(dispatch_rx);

        while group.checkpoint() {
            let next = match feed(ctx) {
                Ok(Some(next)) => next,
                Ok(None) => break,
                Err(err) => {
                    group.fail(err);
                    break;
                }
            };
            let sent = select! {
                recv(ctx.done()) -> _ => false,
                send(dispatch, next) -> res => res.is_ok(),
            };
            if !sent {
                break;
            }
        }
        // Latch the cause if we stopped because of cancellation.
        group.checkpoint();
        drop(dispatch);
    })
}

/// Re-raises a worker panic reported by [`run`] on the calling thread.
pub(crate) fn resume_worker_panic(payload: Box<dyn Any + Send + 'static>) -> ! {
    // The scope hands back every worker's payload; the first one is enough.
    match payload.downcast::<Vec<Box<dyn Any + Send + 'static>>>() {
        Ok(mut panics) if !panics.is_empty() => panic::resume_unwind(panics.swap_remove(0)),
        Ok(_) => panic!("parallel worker panicked"),
        Err(payload) => panic::resume_unwind(payload),
    }
}

/// ParallelExt can be imported to add the slice based parallel operations
/// to vectors.
pub trait ParallelExt<T: Send> {
    fn par_map<M>(self, ctx: &Context, f: M, opts: Options) -> Outcome<Vec<M::Out>>
    where
        M: Mapper<T> + Clone + Send,
        M::Out: Send;

    fn par_try<U, E, M>(self, ctx: &Context, f: M, opts: Options) -> Outcome<Vec<U>>
    where
        U: Send,
        E: Into<Error>,
        M: Mapper<T, Out = std::result::Result<U, E>> + Clone + Send;

    fn par_map_unordered<M>(self, ctx: &Context, f: M, opts: Options) -> Outcome<Vec<M::Out>>
    where
        M: Mapper<T> + Clone + Send,
        M::Out: Send;

    fn par_try_unordered<U, E, M>(self, ctx: &Context, f: M, opts: Options) -> Outcome<Vec<U>>
    where
        U: Send,
        E: Into<Error>,
        M: Mapper<T, Out = std::result::Result<U, E>> + Clone + Send;
}

impl<T: Send> ParallelExt<T> for Vec<T> {
    fn par_map<M>(self, ctx: &Context, f: M, opts: Options) -> Outcome<Vec<M::Out>>
    where
        M: Mapper<T> + Clone + Send,
        M::Out: Send,
    {
        par_map(ctx, self, f, opts)
    }

    fn par_try<U, E, M>(self, ctx: &Context, f: M, opts: Options) -> Outcome<Vec<U>>
    where
        U: Send,
        E: Into<Error>,
        M: Mapper<T, Out = std::result::Result<U, E>> + Clone + Send,
    {
        par_try(ctx, self, f, opts)
    }

    fn par_map_unordered<M>(self, ctx: &Context, f: M, opts: Options) -> Outcome<Vec<M::Out>>
    where
        M: Mapper<T> + Clone + Send,
        M::Out: Send,
    {
        par_map_unordered(ctx, self, f, opts)
    }

    fn par_try_unordered<U, E, M>(self, ctx: &Context, f: M, opts: Options) -> Outcome<Vec<U>>
    where
        U: Send,
        E: Into<Error>,
        M: Mapper<T, Out = std::result::Result<U, E>> + Clone + Send,
    {
        par_try_unordered(ctx, self, f, opts)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Tracks how many calls are in flight and the highest count seen.
    #[derive(Default)]
    pub(crate) struct InFlight {
        now: AtomicUsize,
        max: AtomicUsize,
    }

    impl InFlight {
        pub(crate) fn enter(&self) {
            let n = self.now.fetch_add(1, Ordering::SeqCst) + 1;
            self.max.fetch_max(n, Ordering::SeqCst);
        }

        pub(crate) fn exit(&self) {
            self.now.fetch_sub(1, Ordering::SeqCst);
        }

        pub(crate) fn max(&self) -> usize {
            self.max.load(Ordering::SeqCst)
        }

        pub(crate) fn now(&self) -> usize {
            self.now.load(Ordering::SeqCst)
        }
    }
}
