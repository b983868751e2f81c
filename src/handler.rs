//! Posting API bound to one looper.


use core::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use tracing::warn;

use crate::{
  enqueue_error::EnqueueError, looper::Looper, looper_error::LooperError, message::Message,
  message_handler::MessageHandler,
};

/// Sends messages and runnables into a [`Looper`]'s queue from any thread.
///
/// A handler is always held as `Arc<Handler>`: in-flight messages keep a weak
/// back-reference to their target, upgraded just before dispatch, so dropping
/// the last strong handle silently retires the handler's pending messages.
/// The message-processing behavior is supplied at construction as a
/// [`MessageHandler`].
pub struct Handler {
  this:     Weak<Handler>,
  looper:   Arc<Looper>,
  behavior: Box<dyn MessageHandler>,
}

impl Handler {
  /// Creates a handler bound to the given looper.
  #[must_use]
  pub fn new(looper: Arc<Looper>, behavior: impl MessageHandler) -> Arc<Self> {
    Arc::new_cyclic(|this| Self { this: this.clone(), looper, behavior: Box::new(behavior) })
  }

  /// Creates a handler bound to the calling thread's looper.
  ///
  /// # Errors
  ///
  /// Returns [`LooperError::NoLooper`] when the calling thread has not
  /// prepared a looper.
  pub fn current(behavior: impl MessageHandler) -> Result<Arc<Self>, LooperError> {
    Ok(Self::new(Looper::my_looper().ok_or(LooperError::NoLooper)?, behavior))
  }

  /// Enqueues a message for immediate dispatch.
  ///
  /// Returns `false` when the queue is quitting.
  pub fn send_message(&self, message: Message) -> bool {
    self.send_message_at_time(message, Instant::now())
  }

  /// Enqueues a message after the given delay in milliseconds; negative delays
  /// are clamped to zero.
  pub fn send_message_delayed(&self, message: Message, delay_millis: i64) -> bool {
    self.send_message_at_time(message, deadline_after(delay_millis))
  }

  /// Enqueues a message to dispatch no earlier than `deadline`.
  ///
  /// The message's target is set to this handler before enqueue.
  pub fn send_message_at_time(&self, message: Message, deadline: Instant) -> bool {
    match self.enqueue_at(message, deadline) {
      | Ok(()) => true,
      | Err(rejected) => {
        warn!(code = rejected.message().code(), "send dropped: queue is quitting");
        false
      },
    }
  }

  /// Posts a runnable for immediate execution on the looper's thread.
  pub fn post(&self, runnable: impl FnOnce() + Send + 'static) -> bool {
    self.post_at_time(runnable, Instant::now())
  }

  /// Posts a runnable after the given delay in milliseconds; negative delays
  /// are clamped to zero.
  pub fn post_delayed(&self, runnable: impl FnOnce() + Send + 'static, delay_millis: i64) -> bool {
    self.post_at_time(runnable, deadline_after(delay_millis))
  }

  /// Posts a runnable to execute no earlier than `deadline`.
  pub fn post_at_time(&self, runnable: impl FnOnce() + Send + 'static, deadline: Instant) -> bool {
    self.send_message_at_time(Message::from_runnable(runnable), deadline)
  }

  /// Creates a message with the given code and this handler preset as target,
  /// ready for [`Message::send_to_target`]. Arguments and payload attach via
  /// the [`Message`] builders.
  #[must_use]
  pub fn obtain_message(&self, code: i32) -> Message {
    let mut message = Message::new(code);
    message.set_target(self.this.clone());
    message
  }

  /// Removes pending non-callback messages with the given code targeted at
  /// this handler. Best-effort; dispatched work is never revoked.
  pub fn remove_messages(&self, code: i32) {
    self.looper.queue().remove_messages(self, code);
  }

  /// Removes all pending runnables posted through this handler.
  pub fn remove_callbacks(&self) {
    self.looper.queue().remove_callbacks(self);
  }

  /// Returns the looper this handler posts to.
  #[must_use]
  pub fn looper(&self) -> &Arc<Looper> {
    &self.looper
  }

  /// Entry point used by the dispatch loop; delegates to the behavior's
  /// [`handle_message`](MessageHandler::handle_message). Panics are contained
  /// by the loop, not here.
  pub fn dispatch_message(&self, message: &Message) {
    self.behavior.handle_message(message);
  }

  pub(crate) fn enqueue_at(&self, mut message: Message, deadline: Instant) -> Result<(), EnqueueError> {
    message.set_target(self.this.clone());
    self.looper.queue().enqueue(message, deadline)
  }
}

impl fmt::Debug for Handler {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Handler")
      .field("looper_thread", &self.looper.thread_id())
      .finish_non_exhaustive()
  }
}

fn deadline_after(delay_millis: i64) -> Instant {
  Instant::now() + Duration::from_millis(u64::try_from(delay_millis.max(0)).unwrap_or(0))
}
