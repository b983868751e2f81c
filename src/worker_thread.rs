//! Serial background executor built on a handler thread.

#[cfg(test)]
mod tests;

use core::fmt;
use std::sync::Arc;
use std::thread::ThreadId;

use tracing::error;

use crate::{
  handler::Handler, handler_thread::HandlerThread, looper::Looper, message::Message, message_handler::MessageHandler,
};

/// Runs posted runnables serially on a dedicated background thread.
///
/// A `WorkerThread` wraps a [`HandlerThread`] and an internal handler that
/// only ever carries runnables. Shutdown comes in two flavors:
/// [`finish`](Self::finish) drains work posted so far before stopping, while
/// [`finish_now`](Self::finish_now) stops after the currently executing
/// runnable and discards the rest.
pub struct WorkerThread {
  inner:   HandlerThread,
  handler: Option<Arc<Handler>>,
}

/// Internal behavior for the worker's handler. Every posted task arrives as a
/// callback message, so this hook is never reached in the steady state.
struct RunnableCarrier;

impl MessageHandler for RunnableCarrier {
  fn handle_message(&self, message: &Message) {
    error!(code = message.code(), "worker handler received a plain message; only runnables are expected");
  }
}

impl WorkerThread {
  /// Creates an unstarted worker with the given thread name.
  #[must_use]
  pub fn new(name: impl Into<String>) -> Self {
    Self { inner: HandlerThread::new(name), handler: None }
  }

  /// Spawns the worker and builds its internal handler once the hosted looper
  /// is published. Calling `start` again is a no-op.
  pub fn start(&mut self) {
    if self.handler.is_some() {
      return;
    }
    self.inner.start();
    match self.inner.get_looper() {
      | Some(looper) => self.handler = Some(Handler::new(looper, RunnableCarrier)),
      | None => error!(name = %self.inner.name(), "worker thread failed to start: no looper published"),
    }
  }

  /// Posts a runnable for immediate execution. Returns `false` before
  /// [`start`](Self::start) or once the worker is shutting down.
  pub fn post(&self, runnable: impl FnOnce() + Send + 'static) -> bool {
    self.handler.as_ref().is_some_and(|handler| handler.post(runnable))
  }

  /// Posts a runnable to execute after the given delay in milliseconds;
  /// negative delays are clamped to zero.
  pub fn post_delayed(&self, runnable: impl FnOnce() + Send + 'static, delay_millis: i64) -> bool {
    self.handler.as_ref().is_some_and(|handler| handler.post_delayed(runnable, delay_millis))
  }

  /// Gracefully stops the worker: enqueues a terminal runnable that quits the
  /// looper, so every runnable posted before it (at the same or an earlier
  /// deadline) still executes. Work posted after `finish`, and delayed work
  /// not yet due, is dropped by the quit.
  pub fn finish(&self) -> bool {
    let Some(handler) = self.handler.as_ref() else {
      return false;
    };
    let looper = handler.looper().clone();
    handler.post(move || looper.quit())
  }

  /// Immediately stops the worker, discarding all pending runnables. The
  /// runnable currently executing, if any, completes.
  pub fn finish_now(&self) -> bool {
    match self.handler.as_ref() {
      | Some(handler) => {
        handler.looper().quit();
        true
      },
      | None => false,
    }
  }

  /// Returns the internal handler once the worker has started.
  #[must_use]
  pub fn handler(&self) -> Option<&Arc<Handler>> {
    self.handler.as_ref()
  }

  /// Returns the hosted looper, blocking on first use as
  /// [`HandlerThread::get_looper`] does.
  pub fn get_looper(&self) -> Option<Arc<Looper>> {
    self.inner.get_looper()
  }

  /// Waits for the worker thread to terminate.
  pub fn join(&mut self) {
    self.inner.join();
  }

  /// Returns the worker thread's identifier while it is running.
  #[must_use]
  pub fn thread_id(&self) -> Option<ThreadId> {
    self.inner.thread_id()
  }

  /// Returns the thread name given at construction.
  #[must_use]
  pub fn name(&self) -> &str {
    self.inner.name()
  }
}

impl Drop for WorkerThread {
  fn drop(&mut self) {
    self.finish();
    self.inner.join();
  }
}

impl fmt::Debug for WorkerThread {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("WorkerThread")
      .field("name", &self.inner.name())
      .field("started", &self.handler.is_some())
      .finish()
  }
}
