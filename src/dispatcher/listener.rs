//! Listener records and the callback handle they wrap.
//!
//! A `Callback` is the unit of identity for removal: clones of one `Callback`
//! share an allocation and compare equal, two callbacks built separately never
//! do. Register the same handle on several topics (or several times on one
//! topic) and `unsubscribe` with that handle removes every occurrence.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;

use crate::dispatcher::engine::Dispatcher;
use crate::utils::error::ListenerError;

/// Receiver object bound to a subscription.
pub type Context = Arc<dyn Any + Send + Sync>;

type CallbackFn = dyn Fn(Receiver<'_>, &[Value]) -> Result<Outcome, ListenerError> + Send + Sync;

/// What a callback executes against: its bound context, or the dispatcher
/// that delivered the event when no context was bound.
#[derive(Clone, Copy)]
pub enum Receiver<'a> {
    Bound(&'a (dyn Any + Send + Sync)),
    Dispatcher(&'a Dispatcher),
}

impl<'a> Receiver<'a> {
    /// The delivering dispatcher, if no context was bound.
    pub fn dispatcher(&self) -> Option<&'a Dispatcher> {
        match *self {
            Receiver::Dispatcher(d) => Some(d),
            Receiver::Bound(_) => None,
        }
    }

    /// The bound context downcast to `T`.
    pub fn context<T: Any>(&self) -> Option<&'a T> {
        match *self {
            Receiver::Bound(ctx) => ctx.downcast_ref::<T>(),
            Receiver::Dispatcher(_) => None,
        }
    }
}

impl fmt::Debug for Receiver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Receiver::Bound(_) => f.write_str("Receiver::Bound"),
            Receiver::Dispatcher(d) => write!(f, "Receiver::Dispatcher({})", d.id()),
        }
    }
}

/// Result of a successful listener invocation.
///
/// Only `Declined` keeps a `once` listener subscribed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Handled,
    Declined,
}

/// Conversion from a listener's return value into an outcome.
pub trait IntoOutcome {
    fn into_outcome(self) -> Result<Outcome, ListenerError>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<Outcome, ListenerError> {
        Ok(Outcome::Handled)
    }
}

impl IntoOutcome for bool {
    fn into_outcome(self) -> Result<Outcome, ListenerError> {
        Ok(if self {
            Outcome::Handled
        } else {
            Outcome::Declined
        })
    }
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Result<Outcome, ListenerError> {
        Ok(self)
    }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: Into<ListenerError>,
{
    fn into_outcome(self) -> Result<Outcome, ListenerError> {
        self.map_err(Into::into)?.into_outcome()
    }
}

/// Shared handle to a listener function.
#[derive(Clone)]
pub struct Callback(Arc<CallbackFn>);

impl Callback {
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn(Receiver<'_>, &[Value]) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        Callback(Arc::new(move |receiver: Receiver<'_>, args: &[Value]| {
            f(receiver, args).into_outcome()
        }))
    }

    /// True when both handles point at the same registered function.
    pub fn same(&self, other: &Callback) -> bool {
        // Compare data addresses only; vtable pointers may differ per codegen unit.
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }

    pub(crate) fn call(
        &self,
        receiver: Receiver<'_>,
        args: &[Value],
    ) -> Result<Outcome, ListenerError> {
        (self.0)(receiver, args)
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Callback {}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback({:p})", Arc::as_ptr(&self.0).cast::<()>())
    }
}

/// One subscription: a callback, the receiver it runs against, and whether
/// it removes itself after a handled delivery.
///
/// Clones share the `claimed` flag, so a `once` listener copied into several
/// delivery snapshots is still invoked by at most one of them at a time.
#[derive(Clone, Debug)]
pub struct Listener {
    pub callback: Callback,
    pub context: Option<Context>,
    pub once: bool,
    claimed: Arc<AtomicBool>,
}

impl Listener {
    pub fn new(callback: Callback, context: Option<Context>, once: bool) -> Self {
        Self {
            callback,
            context,
            once,
            claimed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Reserves a live delivery. Always succeeds for ordinary listeners; a
    /// `once` listener succeeds only if no other delivery holds it.
    pub(crate) fn try_claim(&self) -> bool {
        !self.once
            || self
                .claimed
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
    }

    /// Gives back a claim after a declined or failed delivery.
    pub(crate) fn release(&self) {
        if self.once {
            self.claimed.store(false, Ordering::Release);
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }

    /// Calls the listener against its bound context, or `dispatcher` if none.
    pub(crate) fn invoke(
        &self,
        dispatcher: &Dispatcher,
        args: &[Value],
    ) -> Result<Outcome, ListenerError> {
        let receiver = match &self.context {
            Some(ctx) => Receiver::Bound(&**ctx),
            None => Receiver::Dispatcher(dispatcher),
        };
        self.callback.call(receiver, args)
    }
}
