use std::{sync::OnceLock, thread};

use crate::{
    context::Context,
    error::{Error, Result},
};

/// Fail-fast coordination for one parallel operation.
///
/// The group runs under a child of the caller's context. The first error
/// handed to [`fail`](Group::fail) is latched and cancels that child, which
/// stops dispatch and lets in-flight workers bail out at their next
/// checkpoint. Later errors, including the cancellation errors those workers
/// report, are ignored.
pub(crate) struct Group {
    ctx: Context,
    first: OnceLock<Error>,
}

impl Group {
    pub(crate) fn new(parent: &Context) -> Group {
        Group {
            ctx: parent.child(),
            first: OnceLock::new(),
        }
    }

    pub(crate) fn context(&self) -> &Context {
        &self.ctx
    }

    pub(crate) fn fail(&self, err: Error) {
        if self.first.set(err).is_ok() {
            if let Some(err) = self.first.get() {
                log::debug!("parallel group failed: {}", err);
            }
            self.ctx.cancel();
        }
    }

    /// Returns `false` once the group is canceled, latching the cancellation
    /// cause if nothing failed before.
    pub(crate) fn checkpoint(&self) -> bool {
        match self.ctx.cause() {
            Some(cause) => {
                self.fail(cause);
                false
            }
            None => true,
        }
    }

    pub(crate) fn finish(self) -> Result<()> {
        match self.first.into_inner() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Fails the group if the owning worker unwinds, so siblings stop instead of
/// draining the rest of the input.
pub(crate) struct PanicGuard<'a> {
    group: &'a Group,
}

impl<'a> PanicGuard<'a> {
    pub(crate) fn new(group: &'a Group) -> Self {
        PanicGuard { group }
    }
}

impl Drop for PanicGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.group.fail(Error::WorkerPanicked);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_error_wins_and_cancels() {
        let g = Group::new(&Context::background());
        assert!(g.checkpoint());
        g.fail(Error::msg("first"));
        g.fail(Error::msg("second"));
        assert!(g.context().is_canceled());
        assert!(!g.checkpoint());
        assert_eq!(g.finish().unwrap_err().to_string(), "first");
    }

    #[test]
    fn test_parent_cancellation_latched_by_checkpoint() {
        let parent = Context::background().child();
        let g = Group::new(&parent);
        parent.cancel();
        assert!(!g.checkpoint());
        assert!(matches!(g.finish(), Err(Error::Canceled)));
    }

    #[test]
    fn test_group_cancel_does_not_reach_parent() {
        let parent = Context::background().child();
        let g = Group::new(&parent);
        g.fail(Error::Exhausted);
        assert!(!parent.is_canceled());
    }

    #[test]
    fn test_panic_guard_fails_group() {
        let g = Group::new(&Context::background());
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = PanicGuard::new(&g);
            panic!("worker blew up");
        }));
        assert!(res.is_err());
        assert!(matches!(g.finish(), Err(Error::WorkerPanicked)));
    }
}
