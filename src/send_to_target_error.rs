use core::fmt;

use crate::message::Message;

/// Error raised when [`Message::send_to_target`](crate::Message::send_to_target) cannot deliver.
#[derive(Debug)]
pub enum SendToTargetError {
  /// The message has no target handler, or the target has been released.
  NoTarget(Message),
  /// The target's queue is quitting.
  Rejected(Message),
}

impl SendToTargetError {
  /// Consumes the error and returns the undelivered message.
  #[must_use]
  pub fn into_message(self) -> Message {
    match self {
      | Self::NoTarget(message) | Self::Rejected(message) => message,
    }
  }
}

impl fmt::Display for SendToTargetError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::NoTarget(_) => write!(f, "message has no live target handler"),
      | Self::Rejected(_) => write!(f, "target message queue is quitting"),
    }
  }
}

impl std::error::Error for SendToTargetError {}
