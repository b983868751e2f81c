//! Per-thread owner of one message queue and its dispatch loop.

#[cfg(test)]
mod tests;

use core::cell::RefCell;
use core::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use tracing::{debug, error, warn};

use crate::{looper_error::LooperError, message::Message, message_queue::MessageQueue};

const STATE_PREPARED: u8 = 0;
const STATE_LOOPING: u8 = 1;
const STATE_QUIT: u8 = 2;

thread_local! {
  static CURRENT: RefCell<Option<Arc<Looper>>> = const { RefCell::new(None) };
}

/// Drives the message loop of one thread.
///
/// A looper is created on its owning thread by [`prepare`](Self::prepare),
/// which installs it into a thread-local slot, and exclusively owns its
/// [`MessageQueue`]. [`run`](Self::run) pumps the queue on the owning thread
/// until [`quit`](Self::quit) — callable from anywhere — shuts the queue down.
/// The thread-local slot is cleared when the loop exits, so the thread can be
/// prepared again afterwards.
pub struct Looper {
  queue:     MessageQueue,
  thread_id: ThreadId,
  state:     AtomicU8,
}

impl Looper {
  /// Creates a looper for the calling thread and installs it into the
  /// thread-local slot.
  ///
  /// # Errors
  ///
  /// Returns [`LooperError::AlreadyPrepared`] when the calling thread already
  /// has a looper installed.
  pub fn prepare() -> Result<Arc<Self>, LooperError> {
    CURRENT.with(|slot| {
      let mut slot = slot.borrow_mut();
      if slot.is_some() {
        return Err(LooperError::AlreadyPrepared);
      }
      let looper = Arc::new(Self {
        queue:     MessageQueue::new(),
        thread_id: thread::current().id(),
        state:     AtomicU8::new(STATE_PREPARED),
      });
      *slot = Some(looper.clone());
      Ok(looper)
    })
  }

  /// Returns the looper installed for the calling thread, if any.
  #[must_use]
  pub fn my_looper() -> Option<Arc<Self>> {
    CURRENT.with(|slot| slot.borrow().clone())
  }

  /// Runs the calling thread's looper until it quits.
  ///
  /// # Errors
  ///
  /// Returns [`LooperError::NoLooper`] when [`prepare`](Self::prepare) has not
  /// run on this thread, or any error from [`run`](Self::run).
  pub fn loop_current() -> Result<(), LooperError> {
    Self::my_looper().ok_or(LooperError::NoLooper)?.run()
  }

  /// Pumps the queue until it quits, dispatching each message on this thread.
  ///
  /// Messages carrying a runnable execute it; other messages go to their
  /// target handler, or are dropped with a warning when the target has been
  /// released. A panic inside user code is caught and logged, and the loop
  /// continues.
  ///
  /// # Errors
  ///
  /// Returns [`LooperError::WrongThread`] when called off the owning thread
  /// and [`LooperError::AlreadyLooping`] when the loop was already entered.
  pub fn run(&self) -> Result<(), LooperError> {
    let actual = thread::current().id();
    if actual != self.thread_id {
      return Err(LooperError::WrongThread { expected: self.thread_id, actual });
    }
    if self
      .state
      .compare_exchange(STATE_PREPARED, STATE_LOOPING, Ordering::AcqRel, Ordering::Acquire)
      .is_err()
    {
      return Err(LooperError::AlreadyLooping);
    }

    debug!(thread = ?self.thread_id, "dispatch loop entered");
    while let Some(message) = self.queue.next() {
      Self::dispatch(message);
    }
    self.state.store(STATE_QUIT, Ordering::Release);
    CURRENT.with(|slot| {
      slot.borrow_mut().take();
    });
    debug!(thread = ?self.thread_id, "dispatch loop exited");
    Ok(())
  }

  /// Shuts down the queue, dropping pending work and waking the loop.
  /// Callable from any thread; idempotent.
  pub fn quit(&self) {
    self.queue.quit();
  }

  /// Returns the message queue owned by this looper.
  #[must_use]
  pub fn queue(&self) -> &MessageQueue {
    &self.queue
  }

  /// Returns the identifier of the owning thread.
  #[must_use]
  pub const fn thread_id(&self) -> ThreadId {
    self.thread_id
  }

  fn dispatch(mut message: Message) {
    if let Some(callback) = message.take_callback() {
      if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(callback)) {
        error!(reason = panic_reason(&panic), "posted runnable panicked; loop continues");
      }
    } else if let Some(target) = message.upgrade_target() {
      if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| target.dispatch_message(&message))) {
        error!(code = message.code(), reason = panic_reason(&panic), "message handler panicked; loop continues");
      }
    } else {
      warn!(code = message.code(), "dropping message with no live target handler");
    }
  }
}

impl fmt::Debug for Looper {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Looper")
      .field("thread_id", &self.thread_id)
      .field("quitting", &self.queue.is_quitting())
      .finish()
  }
}

fn panic_reason(panic: &(dyn core::any::Any + Send)) -> &str {
  panic
    .downcast_ref::<&str>()
    .copied()
    .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
    .unwrap_or("opaque panic payload")
}
