use std::sync::Mutex;

use super::{resume_worker_panic, run};
use crate::{
    context::{lock, Context},
    error::Error,
    group::Group,
    mapper::{Infallible, Mapper},
    options::Options,
    outcome::Outcome,
};

/// Like [`par_map`](crate::par_map), but results are gathered in the order
/// they complete rather than in input order.
pub fn par_map_unordered<T, M>(
    ctx: &Context,
    items: Vec<T>,
    f: M,
    opts: Options,
) -> Outcome<Vec<M::Out>>
where
    T: Send,
    M: Mapper<T> + Clone + Send,
    M::Out: Send,
{
    par_try_unordered(ctx, items, Infallible(f), opts)
}

/// Like [`par_try`](crate::par_try), but results are gathered in the order
/// they complete rather than in input order.
pub fn par_try_unordered<T, U, E, M>(
    ctx: &Context,
    items: Vec<T>,
    f: M,
    opts: Options,
) -> Outcome<Vec<U>>
where
    T: Send,
    U: Send,
    E: Into<Error>,
    M: Mapper<T, Out = std::result::Result<U, E>> + Clone + Send,
{
    if let Err(err) = opts.validate() {
        return Outcome::error(err);
    }
    if items.is_empty() {
        return Outcome::ok(Vec::new());
    }
    if let Err(err) = ctx.check() {
        return Outcome::error(err);
    }

    let len = items.len();
    let out = Mutex::new(Vec::with_capacity(len));
    let group = Group::new(ctx);
    let mut items = items.into_iter();
    let joined = run(
        &group,
        opts.max_workers().min(len),
        f,
        move |_| Ok(items.next().map(|item| ((), item))),
        |(), value| {
            lock(&out).push(value);
            Ok(())
        },
    );
    if let Err(panic) = joined {
        resume_worker_panic(panic);
    }

    match group.finish() {
        Ok(()) => Outcome::ok(out.into_inner().unwrap_or_else(|e| e.into_inner())),
        Err(err) => Outcome::error(err),
    }
}
