use core::fmt;
use std::thread::ThreadId;

/// Errors raised by looper lifecycle operations.
///
/// All variants are programming errors: they indicate a misuse of the loop
/// protocol rather than a runtime condition worth retrying.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LooperError {
  /// `prepare` was called on a thread that already has a looper installed.
  AlreadyPrepared,
  /// The calling thread has no prepared looper.
  NoLooper,
  /// The dispatch loop was entered from a thread other than the owning one.
  WrongThread {
    /// Thread that owns the looper.
    expected: ThreadId,
    /// Thread that attempted to run the loop.
    actual:   ThreadId,
  },
  /// The dispatch loop was entered a second time on the same looper.
  AlreadyLooping,
}

impl fmt::Display for LooperError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      | Self::AlreadyPrepared => write!(f, "a looper is already prepared for this thread"),
      | Self::NoLooper => write!(f, "no looper has been prepared for this thread"),
      | Self::WrongThread { expected, actual } => {
        write!(f, "loop must run on its owning thread {expected:?}, called from {actual:?}")
      },
      | Self::AlreadyLooping => write!(f, "the dispatch loop was already entered on this looper"),
    }
  }
}

impl std::error::Error for LooperError {}
