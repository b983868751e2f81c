//! Managed OS thread hosting a looper.


use core::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle, ThreadId};

use tracing::error;

use crate::{looper::Looper, looper_error::LooperError};

type Publication = Result<Arc<Looper>, LooperError>;

/// Spawns a named OS thread that prepares a looper, publishes it to other
/// threads, and pumps the dispatch loop until quit.
///
/// The looper handle crosses threads through a one-shot channel:
/// [`get_looper`](Self::get_looper) blocks until the hosted thread publishes
/// (or fails to), then caches the handle so later calls return without
/// touching the channel. Dropping a running `HandlerThread` quits the looper
/// and joins the thread.
pub struct HandlerThread {
  name:        String,
  started:     bool,
  join_handle: Option<JoinHandle<()>>,
  slot:        Mutex<PublicationSlot>,
}

#[derive(Default)]
struct PublicationSlot {
  receiver: Option<Receiver<Publication>>,
  looper:   Option<Arc<Looper>>,
  failed:   bool,
}

impl HandlerThread {
  /// Creates an unstarted handler thread with the given name.
  #[must_use]
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name:        name.into(),
      started:     false,
      join_handle: None,
      slot:        Mutex::new(PublicationSlot::default()),
    }
  }

  /// Spawns the hosted thread. Calling `start` again is a no-op.
  pub fn start(&mut self) {
    if self.started {
      return;
    }
    self.started = true;

    let (sender, receiver) = mpsc::channel();
    self.lock_slot().receiver = Some(receiver);
    let spawned = thread::Builder::new().name(self.name.clone()).spawn(move || Self::run(&sender));
    match spawned {
      | Ok(handle) => self.join_handle = Some(handle),
      | Err(io_error) => error!(name = %self.name, error = %io_error, "failed to spawn handler thread"),
    }
  }

  /// Returns the hosted thread's looper.
  ///
  /// Blocks until the hosted thread has published its looper. Returns `None`
  /// without blocking when the thread was never started, and `None` after
  /// logging when the thread failed before publishing.
  pub fn get_looper(&self) -> Option<Arc<Looper>> {
    let mut slot = self.lock_slot();
    if let Some(looper) = &slot.looper {
      return Some(looper.clone());
    }
    if slot.failed {
      return None;
    }
    let receiver = slot.receiver.take()?;
    match receiver.recv() {
      | Ok(Ok(looper)) => {
        slot.looper = Some(looper.clone());
        Some(looper)
      },
      | Ok(Err(prepare_error)) => {
        slot.failed = true;
        error!(name = %self.name, error = %prepare_error, "hosted thread failed to prepare its looper");
        None
      },
      | Err(_) => {
        slot.failed = true;
        error!(name = %self.name, "hosted thread exited before publishing its looper");
        None
      },
    }
  }

  /// Asks the hosted looper to quit. Returns `false` when no looper is
  /// available.
  pub fn quit(&self) -> bool {
    match self.get_looper() {
      | Some(looper) => {
        looper.quit();
        true
      },
      | None => false,
    }
  }

  /// Waits for the hosted thread to terminate.
  pub fn join(&mut self) {
    if let Some(handle) = self.join_handle.take() {
      if handle.join().is_err() {
        error!(name = %self.name, "hosted thread panicked outside the dispatch loop");
      }
    }
  }

  /// Returns the hosted thread's identifier while it is running.
  #[must_use]
  pub fn thread_id(&self) -> Option<ThreadId> {
    self.join_handle.as_ref().map(|handle| handle.thread().id())
  }

  /// Returns the thread name given at construction.
  #[must_use]
  pub fn name(&self) -> &str {
    &self.name
  }

  fn run(sender: &Sender<Publication>) {
    let looper = match Looper::prepare() {
      | Ok(looper) => looper,
      | Err(prepare_error) => {
        error!(error = %prepare_error, "handler thread could not prepare a looper");
        let _ = sender.send(Err(prepare_error));
        return;
      },
    };
    let _ = sender.send(Ok(looper.clone()));
    if let Err(loop_error) = looper.run() {
      error!(error = %loop_error, "handler thread dispatch loop refused to start");
    }
  }

  fn lock_slot(&self) -> MutexGuard<'_, PublicationSlot> {
    match self.slot.lock() {
      | Ok(guard) => guard,
      | Err(poisoned) => poisoned.into_inner(),
    }
  }
}

impl Drop for HandlerThread {
  fn drop(&mut self) {
    if self.join_handle.is_some() {
      self.quit();
      self.join();
    }
  }
}

impl fmt::Debug for HandlerThread {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("HandlerThread")
      .field("name", &self.name)
      .field("running", &self.join_handle.is_some())
      .finish()
  }
}
