//! The state machine shared by both editor flavours.
//!
//! A [Dispatcher] owns the receiver of an edit and forwards every operation
//! to it, after polling the cancellation hook and checking the call is legal
//! at this point of the session.
use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{instrument, trace};

use crate::Error;

/// Polled before every operation. Returning an error, usually
/// [Error::Cancelled], stops the operation before it reaches the receiver.
pub type CancelHook = Box<dyn Fn() -> Result<(), Error>>;

/// Builds a [CancelHook] reporting [Error::Cancelled] once `flag` is set.
pub fn cancel_on(flag: Arc<AtomicBool>) -> CancelHook {
    Box::new(move || {
        if flag.load(Ordering::Relaxed) {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    })
}

/// Where an edit session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Ready to accept the next operation.
    Active,
    /// An operation is being handled by the receiver.
    InCallback,
    /// `complete` or `abort` was called, nothing else may follow.
    Finished,
}

/// Enforces the calling conventions of an edit session and forwards
/// operations to a receiver `R`.
///
/// Calls must not overlap: a receiver calling back into the dispatcher it is
/// driven by panics, as does any call after the session finished. These are
/// bugs in the driver or the receiver, not conditions to recover from.
pub struct Dispatcher<R: ?Sized> {
    receiver: RefCell<Box<R>>,
    cancel: Option<CancelHook>,
    state: Cell<State>,
}

impl<R: ?Sized> Dispatcher<R> {
    pub fn new(receiver: Box<R>, cancel: Option<CancelHook>) -> Self {
        Self {
            receiver: RefCell::new(receiver),
            cancel,
            state: Cell::new(State::Active),
        }
    }

    pub fn state(&self) -> State {
        self.state.get()
    }

    pub fn is_finished(&self) -> bool {
        self.state.get() == State::Finished
    }

    /// Consumes the dispatcher, returning the receiver.
    pub fn into_receiver(self) -> Box<R> {
        self.receiver.into_inner()
    }

    fn check_cancel(&self) -> Result<(), Error> {
        match &self.cancel {
            Some(cancel) => cancel(),
            None => Ok(()),
        }
    }

    fn assert_callable(&self, op: &str) {
        match self.state.get() {
            State::Active => {}
            State::InCallback => {
                panic!("editor re-entered by {} while a callback is running", op)
            }
            State::Finished => panic!("editor {} called after the edit finished", op),
        }
    }

    fn call<T>(&self, op: &str, f: impl FnOnce(&mut R) -> Result<T, Error>) -> Result<T, Error> {
        self.check_cancel()?;
        self.assert_callable(op);

        self.state.set(State::InCallback);
        let res = {
            let mut receiver = self.receiver.borrow_mut();
            f(&mut **receiver)
        };
        self.state.set(State::Active);

        res
    }

    /// Forwards a single operation to the receiver.
    ///
    /// The cancellation hook is polled first; if it fails, `f` is not run.
    /// The result of `f` is passed through unchanged. Facades validate
    /// arguments inside `f`, so a call after the edit finished panics even
    /// if its arguments are bad.
    #[instrument(level = "trace", skip(self, f), err)]
    pub fn dispatch<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut R) -> Result<T, Error>,
    ) -> Result<T, Error> {
        self.call(op, f)
    }

    /// Forwards `complete` or `abort` to the receiver.
    ///
    /// The session is finished afterwards, no matter whether the receiver,
    /// or the cancellation hook, failed.
    #[instrument(level = "trace", skip(self, f), err)]
    pub fn finish(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut R) -> Result<(), Error>,
    ) -> Result<(), Error> {
        assert!(
            !self.is_finished(),
            "editor {} called after the edit finished",
            op
        );

        let res = self.call(op, f);
        self.state.set(State::Finished);
        trace!(op, ok = res.is_ok(), "edit finished");

        res
    }
}
