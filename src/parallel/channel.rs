use super::run;
use crate::{
    context::Context,
    error::Error,
    group::Group,
    mapper::{Infallible, Mapper},
    options::Options,
    stream::{emit, receive, spawn_producer, Stream, Terminal},
};

/// Maps a live stream on at most `opts.max_workers()` threads.
///
/// Results are emitted as they complete, so the output order is unspecified.
/// The terminal reports once every worker has returned.
pub fn par_map_stream<T, M>(
    ctx: &Context,
    input: Stream<T>,
    f: M,
    opts: Options,
) -> (Stream<M::Out>, Terminal)
where
    T: Send + 'static,
    M: Mapper<T> + Clone + Send + 'static,
    M::Out: Send + 'static,
{
    par_try_stream(ctx, input, Infallible(f), opts)
}

/// Like [`par_map_stream`], but `f` may fail.
///
/// On the first failure, or when `ctx` is canceled, no more input is
/// admitted, in-flight calls are waited for, the output is closed and the
/// terminal reports that one error.
pub fn par_try_stream<T, U, E, M>(
    ctx: &Context,
    input: Stream<T>,
    f: M,
    opts: Options,
) -> (Stream<U>, Terminal)
where
    T: Send + 'static,
    U: Send + 'static,
    E: Into<Error>,
    M: Mapper<T, Out = std::result::Result<U, E>> + Clone + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded(opts.buffer_size());
    let ctx = ctx.clone();

    let terminal = spawn_producer("par_try_stream", move || {
        opts.validate()?;
        let group = Group::new(&ctx);
        let joined = run(
            &group,
            opts.max_workers(),
            f,
            |ctx| Ok(receive(ctx, input.receiver())?.map(|item| ((), item))),
            |(), value| emit(group.context(), &tx, value),
        );
        if joined.is_err() {
            // The panic guard has already failed the group; the payload has
            // nowhere to go from this thread.
            group.fail(Error::WorkerPanicked);
        }
        group.finish()
    });

    (Stream::from(rx), terminal)
}
