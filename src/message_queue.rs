//! Time-ordered, thread-safe staging area for pending messages.


use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Instant;

use tracing::{debug, warn};

use crate::{enqueue_error::EnqueueError, handler::Handler, message::Message};

/// Hand-off point between any number of posting threads and one consuming
/// looper thread.
///
/// Messages are kept sorted by ascending deadline; messages sharing a deadline
/// dispatch in enqueue order. A single mutex guards the sequence and the
/// quitting flag, and a single condition variable wakes the consumer on
/// enqueue, quit, or deadline expiry.
pub struct MessageQueue {
  state:     Mutex<QueueState>,
  available: Condvar,
}

struct QueueState {
  messages: VecDeque<Message>,
  quitting: bool,
}

impl MessageQueue {
  /// Creates an empty queue.
  #[must_use]
  pub(crate) fn new() -> Self {
    Self {
      state:     Mutex::new(QueueState { messages: VecDeque::new(), quitting: false }),
      available: Condvar::new(),
    }
  }

  /// Inserts a message at its deadline-ordered position and wakes the consumer.
  ///
  /// The deadline is stamped onto the message here; construction never assigns
  /// one. Insertion is stable: among equal deadlines, earlier enqueues stay
  /// ahead.
  ///
  /// # Errors
  ///
  /// Returns [`EnqueueError`] carrying the message back when the queue is
  /// quitting.
  pub fn enqueue(&self, mut message: Message, deadline: Instant) -> Result<(), EnqueueError> {
    let mut state = self.lock_state();
    if state.quitting {
      warn!(code = message.code(), "enqueue rejected: queue is quitting");
      return Err(EnqueueError::quitting(message));
    }
    message.set_deadline(deadline);
    let at = state
      .messages
      .partition_point(|queued| queued.deadline().is_some_and(|when| when <= deadline));
    state.messages.insert(at, message);
    // Always wake; spurious wakeups are benign.
    self.available.notify_one();
    Ok(())
  }

  /// Blocks until the front message is due, then removes and returns it.
  ///
  /// Only the owning looper thread may consume. Returns `None` exactly when
  /// the queue is quitting.
  pub fn next(&self) -> Option<Message> {
    let mut state = self.lock_state();
    loop {
      if state.quitting {
        return None;
      }
      let now = Instant::now();
      match state.messages.front().and_then(Message::deadline) {
        | Some(due) if due <= now => return state.messages.pop_front(),
        | Some(due) => {
          let timeout = due.saturating_duration_since(now);
          state = match self.available.wait_timeout(state, timeout) {
            | Ok((guard, _)) => guard,
            | Err(poisoned) => poisoned.into_inner().0,
          };
        },
        | None => {
          state = match self.available.wait(state) {
            | Ok(guard) => guard,
            | Err(poisoned) => poisoned.into_inner(),
          };
        },
      }
    }
  }

  /// Puts the queue into the quitting state, dropping all pending messages
  /// and waking the consumer. Idempotent; callable from any thread.
  pub fn quit(&self) {
    let mut state = self.lock_state();
    if state.quitting {
      return;
    }
    state.quitting = true;
    let dropped = state.messages.len();
    state.messages.clear();
    self.available.notify_all();
    if dropped > 0 {
      debug!(dropped, "queue quit; pending messages dropped");
    }
  }

  /// Returns `true` once [`quit`](Self::quit) has been called.
  #[must_use]
  pub fn is_quitting(&self) -> bool {
    self.lock_state().quitting
  }

  /// Removes every pending non-callback message with the given code targeted
  /// at `target`. Best-effort: a message already dispatched is unaffected.
  pub fn remove_messages(&self, target: &Handler, code: i32) {
    let mut state = self.lock_state();
    if state.quitting {
      return;
    }
    state
      .messages
      .retain(|message| !(message.targets(target) && message.code() == code && !message.has_callback()));
  }

  /// Removes every pending callback message targeted at `target`.
  pub fn remove_callbacks(&self, target: &Handler) {
    let mut state = self.lock_state();
    if state.quitting {
      return;
    }
    state.messages.retain(|message| !(message.targets(target) && message.has_callback()));
  }

  fn lock_state(&self) -> MutexGuard<'_, QueueState> {
    match self.state.lock() {
      | Ok(guard) => guard,
      | Err(poisoned) => poisoned.into_inner(),
    }
  }
}
