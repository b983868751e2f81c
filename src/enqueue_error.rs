use core::fmt;

use crate::message::Message;

/// Error raised when a queue rejects an enqueue because it is quitting.
///
/// The rejected message is handed back so the caller can recover its payload.
#[derive(Debug)]
pub struct EnqueueError {
  message: Message,
}

impl EnqueueError {
  /// Creates a rejection carrying the undelivered message.
  #[must_use]
  pub(crate) fn quitting(message: Message) -> Self {
    Self { message }
  }

  /// Returns the rejected message by reference.
  #[must_use]
  pub fn message(&self) -> &Message {
    &self.message
  }

  /// Consumes the error and returns the rejected message.
  #[must_use]
  pub fn into_message(self) -> Message {
    self.message
  }
}

impl fmt::Display for EnqueueError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "message queue is quitting")
  }
}

impl std::error::Error for EnqueueError {}
