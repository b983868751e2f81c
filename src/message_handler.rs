use crate::message::Message;

/// Behavior hook invoked for non-callback messages dispatched to a
/// [`Handler`](crate::Handler).
///
/// `handle_message` runs on the looper's owning thread. The runtime does not
/// synchronize anything the implementation touches; shared state inside the
/// behavior must bring its own synchronization.
pub trait MessageHandler: Send + Sync + 'static {
  /// Handles one dequeued message.
  fn handle_message(&self, message: &Message);
}

impl<F> MessageHandler for F
where
  F: Fn(&Message) + Send + Sync + 'static,
{
  fn handle_message(&self, message: &Message) {
    self(message);
  }
}
