//! Channel backed streams.
//!
//! Every producer in this module returns a [`Stream`] of elements paired with
//! a [`Terminal`] that reports, exactly once, how the producer finished. The
//! producer always closes its data channel before reporting, so a consumer
//! that drained the stream can wait on the terminal without blocking.
//!
//! All blocking sends and receives race against the [`Context`] passed in;
//! cancellation always wins over further emission.

use std::thread;

use crossbeam_channel::{select, Receiver, Sender};

use crate::{
    context::Context,
    error::{Error, Result},
    options::Options,
};

mod sink;
mod source;
mod transform;

pub use sink::*;
pub use source::*;
pub use transform::*;

/// A live sequence of values read from a channel.
///
/// Iterating a stream blocks until the next value arrives and ends when the
/// producer closes the channel. Dropping a stream early makes its producer
/// stop with [`Error::ReceiverDropped`].
pub struct Stream<T> {
    rx: Receiver<T>,
}

impl<T> Stream<T> {
    /// A stream that is already closed.
    pub fn empty() -> Stream<T> {
        let (_, rx) = crossbeam_channel::bounded(0);
        Stream { rx }
    }

    /// Blocks for the next value. `None` once the producer has closed the stream.
    pub fn recv(&self) -> Option<T> {
        self.rx.recv().ok()
    }

    pub fn receiver(&self) -> &Receiver<T> {
        &self.rx
    }

    pub fn into_receiver(self) -> Receiver<T> {
        self.rx
    }
}

impl<T> From<Receiver<T>> for Stream<T> {
    fn from(rx: Receiver<T>) -> Self {
        Stream { rx }
    }
}

impl<T> Iterator for Stream<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.recv()
    }
}

impl<T> std::fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream").field("len", &self.rx.len()).finish()
    }
}

/// The one-shot completion status of a stream producer.
#[must_use = "a terminal carries the only report of a stream failure"]
pub struct Terminal(Receiver<Result<()>>);

/// Producer side of a [`Terminal`].
pub(crate) struct Status(Sender<Result<()>>);

impl Terminal {
    pub(crate) fn channel() -> (Status, Terminal) {
        let (tx, rx) = crossbeam_channel::bounded(1);
        (Status(tx), Terminal(rx))
    }

    /// A terminal that already holds `result`.
    pub fn ready(result: Result<()>) -> Terminal {
        let (status, terminal) = Terminal::channel();
        status.report(result);
        terminal
    }

    /// Blocks until the producer reports.
    ///
    /// A producer that went away without reporting (for example because a
    /// worker panicked) yields [`Error::MissingChannel`].
    pub fn wait(self) -> Result<()> {
        self.0.recv().unwrap_or(Err(Error::MissingChannel))
    }

    /// Returns `true` once the producer has reported.
    ///
    /// A producer that went away without reporting is not detected here;
    /// [`wait`](Terminal::wait) still returns at once in that case.
    pub fn is_ready(&self) -> bool {
        !self.0.is_empty()
    }
}

impl std::fmt::Debug for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terminal")
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl Status {
    pub(crate) fn report(self, result: Result<()>) {
        // Capacity one and a single report: this never blocks. A dropped
        // terminal just means nobody asked.
        let _ = self.0.send(result);
    }
}

/// A stream that is closed, with a terminal already holding `err`.
pub(crate) fn failed<T>(err: Error) -> (Stream<T>, Terminal) {
    (Stream::empty(), Terminal::ready(Err(err)))
}

/// Sends `value` unless `ctx` is canceled first.
pub(crate) fn emit<T>(ctx: &Context, tx: &Sender<T>, value: T) -> Result<()> {
    ctx.check()?;
    select! {
        recv(ctx.done()) -> _ => Err(ctx.err()),
        send(tx, value) -> res => res.map_err(|_| Error::ReceiverDropped),
    }
}

/// Receives the next value unless `ctx` is canceled first. `Ok(None)` means
/// the sending side closed.
pub(crate) fn receive<T>(ctx: &Context, rx: &Receiver<T>) -> Result<Option<T>> {
    ctx.check()?;
    select! {
        recv(ctx.done()) -> _ => Err(ctx.err()),
        recv(rx) -> msg => Ok(msg.ok()),
    }
}

/// Forwards everything left in `rx` to `tx`.
pub(crate) fn forward<T>(ctx: &Context, rx: &Receiver<T>, tx: &Sender<T>) -> Result<()> {
    while let Some(value) = receive(ctx, rx)? {
        emit(ctx, tx, value)?;
    }
    Ok(())
}

/// Runs `body` on its own thread and reports its result on the returned
/// terminal. Everything `body` captured, output senders included, is dropped
/// before the report goes out.
pub(crate) fn spawn_producer<F>(name: &'static str, body: F) -> Terminal
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    let (status, terminal) = Terminal::channel();
    thread::spawn(move || {
        let result = body();
        log::trace!("{} finished: {:?}", name, result);
        status.report(result);
    });
    terminal
}

/// Creates an output channel sized by `opts` and runs `body` as its producer.
pub(crate) fn spawn_stream<T, F>(
    name: &'static str,
    opts: &Options,
    body: F,
) -> (Stream<T>, Terminal)
where
    T: Send + 'static,
    F: FnOnce(&Sender<T>) -> Result<()> + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded(opts.buffer_size());
    let terminal = spawn_producer(name, move || body(&tx));
    (Stream { rx }, terminal)
}
