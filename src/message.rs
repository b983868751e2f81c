//! Unit of work exchanged through a message queue.


use core::any::Any;
use core::fmt;
use std::sync::{Arc, Weak};
use std::time::Instant;

use crate::{handler::Handler, runnable::Runnable, send_to_target_error::SendToTargetError};

/// A message or task delivered to a [`Handler`] through its looper's queue.
///
/// A message carries a user-defined `code` discriminator, two optional integer
/// arguments, an optional dynamically typed payload, and optionally a
/// [`Runnable`]. When a runnable is present the loop executes it directly and
/// the `code` is not interpreted.
///
/// The dispatch deadline is assigned by the enqueue path, never by
/// construction. The target handler is kept as a weak back-reference: a
/// message whose handler has been released is silently dropped at dispatch.
pub struct Message {
  code:     i32,
  arg1:     i32,
  arg2:     i32,
  payload:  Option<Arc<dyn Any + Send + Sync + 'static>>,
  callback: Option<Runnable>,
  target:   Option<Weak<Handler>>,
  deadline: Option<Instant>,
}

impl Message {
  /// Creates a message with the given code and no arguments or payload.
  #[must_use]
  pub fn new(code: i32) -> Self {
    Self { code, arg1: 0, arg2: 0, payload: None, callback: None, target: None, deadline: None }
  }

  /// Creates a callback message wrapping the given runnable.
  #[must_use]
  pub fn from_runnable(runnable: impl FnOnce() + Send + 'static) -> Self {
    let mut message = Self::new(0);
    message.callback = Some(Box::new(runnable));
    message
  }

  /// Sets both integer arguments and returns the updated message.
  #[must_use]
  pub fn with_args(mut self, arg1: i32, arg2: i32) -> Self {
    self.arg1 = arg1;
    self.arg2 = arg2;
    self
  }

  /// Attaches a dynamically typed payload and returns the updated message.
  #[must_use]
  pub fn with_payload<T>(mut self, payload: T) -> Self
  where
    T: Any + Send + Sync + 'static, {
    self.payload = Some(Arc::new(payload));
    self
  }

  /// Returns the user-defined message code.
  #[must_use]
  pub const fn code(&self) -> i32 {
    self.code
  }

  /// Returns the first integer argument.
  #[must_use]
  pub const fn arg1(&self) -> i32 {
    self.arg1
  }

  /// Returns the second integer argument.
  #[must_use]
  pub const fn arg2(&self) -> i32 {
    self.arg2
  }

  /// Returns `true` when a payload is attached.
  #[must_use]
  pub const fn has_payload(&self) -> bool {
    self.payload.is_some()
  }

  /// Returns `true` when this is a callback message.
  #[must_use]
  pub const fn has_callback(&self) -> bool {
    self.callback.is_some()
  }

  /// Returns the payload downcast to `T`, if present and of that type.
  #[must_use]
  pub fn payload_ref<T: Any>(&self) -> Option<&T> {
    self.payload.as_deref().and_then(<dyn Any + Send + Sync>::downcast_ref)
  }

  /// Returns a shared handle to the payload downcast to `T`.
  #[must_use]
  pub fn payload_arc<T>(&self) -> Option<Arc<T>>
  where
    T: Any + Send + Sync + 'static, {
    self.payload.clone().and_then(|payload| payload.downcast::<T>().ok())
  }

  /// Enqueues this message on its target handler with an immediate deadline.
  ///
  /// # Errors
  ///
  /// Returns [`SendToTargetError::NoTarget`] when no live target handler is
  /// attached, or [`SendToTargetError::Rejected`] when the target's queue is
  /// quitting. Both variants hand the message back.
  pub fn send_to_target(self) -> Result<(), SendToTargetError> {
    let Some(target) = self.target.as_ref().and_then(Weak::upgrade) else {
      return Err(SendToTargetError::NoTarget(self));
    };
    target
      .enqueue_at(self, Instant::now())
      .map_err(|rejected| SendToTargetError::Rejected(rejected.into_message()))
  }

  pub(crate) fn set_target(&mut self, target: Weak<Handler>) {
    self.target = Some(target);
  }

  pub(crate) fn set_deadline(&mut self, deadline: Instant) {
    self.deadline = Some(deadline);
  }

  pub(crate) const fn deadline(&self) -> Option<Instant> {
    self.deadline
  }

  pub(crate) fn take_callback(&mut self) -> Option<Runnable> {
    self.callback.take()
  }

  pub(crate) fn upgrade_target(&self) -> Option<Arc<Handler>> {
    self.target.as_ref().and_then(Weak::upgrade)
  }

  /// Whether this message is targeted at the given handler instance.
  pub(crate) fn targets(&self, handler: &Handler) -> bool {
    self.target.as_ref().is_some_and(|target| std::ptr::eq(target.as_ptr(), handler))
  }
}

impl fmt::Debug for Message {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Message")
      .field("code", &self.code)
      .field("arg1", &self.arg1)
      .field("arg2", &self.arg2)
      .field("has_payload", &self.payload.is_some())
      .field("has_callback", &self.callback.is_some())
      .field("deadline", &self.deadline)
      .finish()
  }
}
