use super::{emit, spawn_stream, Stream, Terminal};
use crate::{context::Context, error::Result, options::Options};

/// Emits `start..end`. Empty when `end <= start`.
pub fn range(ctx: &Context, start: i64, end: i64, opts: Options) -> (Stream<i64>, Terminal) {
    let ctx = ctx.clone();
    spawn_stream("range", &opts, move |tx| {
        for i in start..end {
            emit(&ctx, tx, i)?;
        }
        Ok(())
    })
}

/// Emits `0..n`.
pub fn range_n(ctx: &Context, n: i64, opts: Options) -> (Stream<i64>, Terminal) {
    range(ctx, 0, n, opts)
}

/// Emits every item of `items` in order.
pub fn from_iter<I>(ctx: &Context, items: I, opts: Options) -> (Stream<I::Item>, Terminal)
where
    I: IntoIterator,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    let ctx = ctx.clone();
    let items = items.into_iter();
    spawn_stream("from_iter", &opts, move |tx| {
        for item in items {
            emit(&ctx, tx, item)?;
        }
        Ok(())
    })
}

pub fn from_vec<T>(ctx: &Context, items: Vec<T>, opts: Options) -> (Stream<T>, Terminal)
where
    T: Send + 'static,
{
    from_iter(ctx, items, opts)
}

/// Emits `value` until the context is canceled or the stream is dropped.
/// The terminal therefore never reports success.
pub fn repeat<T>(ctx: &Context, value: T, opts: Options) -> (Stream<T>, Terminal)
where
    T: Clone + Send + 'static,
{
    let ctx = ctx.clone();
    spawn_stream("repeat", &opts, move |tx| loop {
        emit(&ctx, tx, value.clone())?;
    })
}

/// Emits `value` exactly `n` times.
pub fn repeat_n<T>(ctx: &Context, value: T, n: usize, opts: Options) -> (Stream<T>, Terminal)
where
    T: Clone + Send + 'static,
{
    let ctx = ctx.clone();
    spawn_stream("repeat_n", &opts, move |tx| {
        for _ in 0..n {
            emit(&ctx, tx, value.clone())?;
        }
        Ok(())
    })
}

/// Emits values produced by `generator` until it returns `Ok(None)` (success)
/// or an error (reported on the terminal).
pub fn generate<T, G>(ctx: &Context, mut generator: G, opts: Options) -> (Stream<T>, Terminal)
where
    T: Send + 'static,
    G: FnMut(&Context) -> Result<Option<T>> + Send + 'static,
{
    let ctx = ctx.clone();
    spawn_stream("generate", &opts, move |tx| loop {
        ctx.check()?;
        match generator(&ctx)? {
            Some(value) => emit(&ctx, tx, value)?,
            None => return Ok(()),
        }
    })
}
