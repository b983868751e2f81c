#![deny(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::print_stdout)]
#![deny(clippy::dbg_macro)]
#![deny(unreachable_pub)]

//! Per-thread message loop runtime.
//!
//! Each [`Looper`] owns a time-ordered [`MessageQueue`] and pumps it on its
//! owning thread; [`Handler`]s post [`Message`]s and runnables into that queue
//! from any thread. [`HandlerThread`] manages an OS thread that hosts a
//! looper, and [`WorkerThread`] layers a runnable-only API with graceful and
//! immediate shutdown on top of it.

mod enqueue_error;
mod handler;
mod handler_thread;
mod looper;
mod looper_error;
mod message;
mod message_handler;
mod message_queue;
mod runnable;
mod send_to_target_error;
mod worker_thread;

pub use enqueue_error::EnqueueError;
pub use handler::Handler;
pub use handler_thread::HandlerThread;
pub use looper::Looper;
pub use looper_error::LooperError;
pub use message::Message;
pub use message_handler::MessageHandler;
pub use message_queue::MessageQueue;
pub use runnable::Runnable;
pub use send_to_target_error::SendToTargetError;
pub use worker_thread::WorkerThread;
