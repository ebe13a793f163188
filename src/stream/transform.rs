use super::{emit, failed, forward, receive, spawn_producer, spawn_stream, Stream, Terminal};
use crate::{context::Context, error::Error, options::Options, outcome::Outcome};

/// Forwards at most the first `n` values of `input`.
///
/// The output closes after `n` values even if `input` has more; `input` is
/// dropped at that point, so its own producer observes
/// [`Error::ReceiverDropped`] on its terminal.
pub fn take<T>(ctx: &Context, input: Stream<T>, n: usize, opts: Options) -> (Stream<T>, Terminal)
where
    T: Send + 'static,
{
    let ctx = ctx.clone();
    spawn_stream("take", &opts, move |tx| {
        for _ in 0..n {
            match receive(&ctx, input.receiver())? {
                Some(value) => emit(&ctx, tx, value)?,
                None => break,
            }
        }
        Ok(())
    })
}

/// Discards the first `n` values of `input` and forwards the rest.
pub fn skip<T>(ctx: &Context, input: Stream<T>, n: usize, opts: Options) -> (Stream<T>, Terminal)
where
    T: Send + 'static,
{
    let ctx = ctx.clone();
    spawn_stream("skip", &opts, move |tx| {
        for _ in 0..n {
            if receive(&ctx, input.receiver())?.is_none() {
                return Ok(());
            }
        }
        forward(&ctx, input.receiver(), tx)
    })
}

/// Takes the first value of `input` eagerly.
///
/// Returns that value together with a stream that replays it before
/// forwarding the rest of `input`. An exhausted input yields
/// [`Error::Exhausted`] as the value, an empty stream, and the same error on
/// the terminal; a canceled context does the same with its cause.
pub fn peek<T>(ctx: &Context, input: Stream<T>, opts: Options) -> (Outcome<T>, Stream<T>, Terminal)
where
    T: Clone + Send + 'static,
{
    let first = match receive(ctx, input.receiver()) {
        Ok(Some(first)) => first,
        Ok(None) => return peek_failed(Error::Exhausted),
        Err(err) => return peek_failed(err),
    };

    let (tx, rx) = crossbeam_channel::bounded(opts.buffer_size().max(1));
    // The channel is fresh, has room for one and `rx` is alive.
    let _ = tx.try_send(first.clone());

    let ctx = ctx.clone();
    let terminal = spawn_producer("peek", move || forward(&ctx, input.receiver(), &tx));
    (Outcome::ok(first), Stream::from(rx), terminal)
}

fn peek_failed<T>(err: Error) -> (Outcome<T>, Stream<T>, Terminal) {
    let (stream, terminal) = failed(err.clone());
    (Outcome::error(err), stream, terminal)
}

/// Splits `input` into two streams that both see every value in order.
///
/// A value is handed to the first output and then the second, so the pair
/// advances at the pace of the slower consumer.
pub fn tee<T>(ctx: &Context, input: Stream<T>, opts: Options) -> (Stream<T>, Stream<T>, Terminal)
where
    T: Clone + Send + 'static,
{
    let (a_tx, a_rx) = crossbeam_channel::bounded(opts.buffer_size());
    let (b_tx, b_rx) = crossbeam_channel::bounded(opts.buffer_size());

    let ctx = ctx.clone();
    let terminal = spawn_producer("tee", move || {
        while let Some(value) = receive(&ctx, input.receiver())? {
            emit(&ctx, &a_tx, value.clone())?;
            emit(&ctx, &b_tx, value)?;
        }
        Ok(())
    });
    (Stream::from(a_rx), Stream::from(b_rx), terminal)
}
