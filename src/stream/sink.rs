use super::{receive, Stream};
use crate::{context::Context, error::Result, outcome::Outcome};

/// Drains `input` into a vector.
///
/// If `ctx` is canceled first, whatever was gathered so far is discarded and
/// the cancellation error is returned.
pub fn collect<T>(ctx: &Context, input: Stream<T>) -> Outcome<Vec<T>> {
    let mut out = Vec::new();
    loop {
        match receive(ctx, input.receiver()) {
            Ok(Some(value)) => out.push(value),
            Ok(None) => return Outcome::ok(out),
            Err(err) => return Outcome::error(err),
        }
    }
}

/// Consumes and discards `input` until it closes or `ctx` is canceled.
pub fn drain<T>(ctx: &Context, input: Stream<T>) -> Result<()> {
    while receive(ctx, input.receiver())?.is_some() {}
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::Error,
        options::Options,
        stream::{from_vec, repeat},
    };
    use std::time::Duration;

    #[test]
    fn test_drain_after_terminal() {
        let ctx = Context::background();
        let (s, t) = from_vec(&ctx, vec![1, 2, 3], Options::new().buffer(3));
        assert!(t.wait().is_ok());
        assert!(drain(&ctx, s).is_ok());
    }

    #[test]
    fn test_collect_abandons_on_cancel() {
        let ctx = Context::background().with_timeout(Duration::from_millis(20));
        let (s, t) = repeat(&Context::background(), 1u8, Options::new());
        let got = collect(&ctx, s);
        assert!(matches!(got.err(), Some(Error::DeadlineExceeded)));
        // The source sees its consumer go away.
        assert!(matches!(t.wait(), Err(Error::ReceiverDropped)));
    }

    #[test]
    fn test_drain_canceled() {
        let ctx = Context::background().child();
        let (_tx, rx) = crossbeam_channel::bounded::<i32>(0);
        ctx.cancel();
        assert!(matches!(drain(&ctx, Stream::from(rx)), Err(Error::Canceled)));
    }
}
