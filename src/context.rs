//! Hierarchical cancellation shared by every blocking point in the crate.
//!
//! A [`Context`] is a cheap handle that can be cloned into worker threads. It
//! becomes *done* once canceled, either explicitly, through an ancestor, or
//! because its deadline passed. Blocking code waits on [`Context::done`]
//! inside a `select!` next to the channel operation it performs.

use std::{
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak},
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{select, Receiver, Sender};

use crate::error::{Error, Result};

#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

struct Inner {
    // Dropping the sender is what makes `done_rx` ready.
    done_tx: Mutex<Option<Sender<()>>>,
    done_rx: Receiver<()>,
    cause: OnceLock<Error>,
    children: Mutex<Vec<Weak<Inner>>>,
    deadline: Option<Instant>,
    cancelable: bool,
}

impl Context {
    /// The root context. It is never canceled and has no deadline.
    pub fn background() -> Context {
        Context {
            inner: Arc::new(Inner {
                done_tx: Mutex::new(None),
                done_rx: crossbeam_channel::never(),
                cause: OnceLock::new(),
                children: Mutex::new(Vec::new()),
                deadline: None,
                cancelable: false,
            }),
        }
    }

    /// Derives a context that is canceled when this one is, or when
    /// [`cancel`](Context::cancel) is called on it.
    pub fn child(&self) -> Context {
        self.derive(self.inner.deadline)
    }

    pub fn with_timeout(&self, timeout: Duration) -> Context {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derives a context that cancels itself with
    /// [`Error::DeadlineExceeded`] at `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Context {
        let effective = match self.inner.deadline {
            Some(parent) if parent <= deadline => parent,
            _ => deadline,
        };
        let ctx = self.derive(Some(effective));
        if ctx.is_canceled() {
            return ctx;
        }

        // The timer only holds a weak handle: once every clone of the
        // context is gone the done channel disconnects and the thread exits.
        let weak = Arc::downgrade(&ctx.inner);
        let done = ctx.inner.done_rx.clone();
        let timer = crossbeam_channel::at(effective);
        thread::spawn(move || {
            select! {
                recv(done) -> _ => {}
                recv(timer) -> _ => {
                    if let Some(inner) = weak.upgrade() {
                        inner.cancel_with(Error::DeadlineExceeded);
                    }
                }
            }
        });
        ctx
    }

    /// Cancels this context and all of its descendants. Only the first
    /// cancellation is recorded; calling this on the background context has
    /// no effect.
    pub fn cancel(&self) {
        self.inner.cancel_with(Error::Canceled);
    }

    pub fn is_canceled(&self) -> bool {
        self.inner.cause.get().is_some()
    }

    /// Why the context was canceled, if it was.
    pub fn cause(&self) -> Option<Error> {
        self.inner.cause.get().cloned()
    }

    /// Cancellation checkpoint for long running user functions.
    pub fn check(&self) -> Result<()> {
        match self.inner.cause.get() {
            Some(cause) => Err(cause.clone()),
            None => Ok(()),
        }
    }

    /// A receiver that becomes ready (disconnected) once the context is
    /// canceled. Intended for use inside `crossbeam_channel::select!`.
    pub fn done(&self) -> &Receiver<()> {
        &self.inner.done_rx
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// The cancellation error to report after `done` fired.
    pub(crate) fn err(&self) -> Error {
        self.cause().unwrap_or(Error::Canceled)
    }

    fn derive(&self, deadline: Option<Instant>) -> Context {
        let (done_tx, done_rx) = crossbeam_channel::bounded(0);
        let inner = Arc::new(Inner {
            done_tx: Mutex::new(Some(done_tx)),
            done_rx,
            cause: OnceLock::new(),
            children: Mutex::new(Vec::new()),
            deadline,
            cancelable: true,
        });

        {
            let mut children = lock(&self.inner.children);
            children.retain(|c| c.strong_count() > 0);
            children.push(Arc::downgrade(&inner));
        }
        // The parent may have been canceled before it saw the new child.
        if let Some(cause) = self.inner.cause.get() {
            inner.cancel_with(cause.clone());
        }

        Context { inner }
    }
}

impl Inner {
    fn cancel_with(&self, cause: Error) {
        if !self.cancelable || self.cause.set(cause.clone()).is_err() {
            return;
        }
        log::debug!("context canceled: {}", cause);
        lock(&self.done_tx).take();

        let children = std::mem::take(&mut *lock(&self.children));
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel_with(cause.clone());
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::background()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("canceled", &self.is_canceled())
            .field("deadline", &self.inner.deadline)
            .finish()
    }
}

pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_never_cancels() {
        let ctx = Context::background();
        ctx.cancel();
        assert!(!ctx.is_canceled());
        assert!(ctx.check().is_ok());
        assert!(ctx.done().try_recv().is_err());
    }

    #[test]
    fn test_cancel_propagates_down_not_up() {
        let parent = Context::background().child();
        let child = parent.child();
        let grandchild = child.child();

        child.cancel();
        assert!(!parent.is_canceled());
        assert!(child.is_canceled());
        assert!(grandchild.is_canceled());

        let sibling = parent.child();
        parent.cancel();
        assert!(sibling.is_canceled());
        assert!(matches!(sibling.cause(), Some(Error::Canceled)));
    }

    #[test]
    fn test_done_fires_on_cancel() {
        let ctx = Context::background().child();
        let done = ctx.done().clone();
        let h = thread::spawn(move || done.recv().is_err());
        ctx.cancel();
        assert!(h.join().unwrap());
    }

    #[test]
    fn test_child_of_canceled_parent_is_canceled() {
        let parent = Context::background().child();
        parent.cancel();
        let child = parent.child();
        assert!(child.is_canceled());
        assert!(child.check().is_err());
    }

    #[test]
    fn test_deadline_exceeded() {
        let ctx = Context::background().with_timeout(Duration::from_millis(10));
        assert!(ctx.deadline().is_some());
        let _ = ctx.done().recv();
        assert!(matches!(ctx.cause(), Some(Error::DeadlineExceeded)));

        let child = ctx.child();
        assert!(matches!(child.cause(), Some(Error::DeadlineExceeded)));
    }

    #[test]
    fn test_explicit_cancel_beats_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_secs(60));
        ctx.cancel();
        assert!(matches!(ctx.check(), Err(Error::Canceled)));
    }
}
