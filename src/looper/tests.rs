use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Instant;

use super::Looper;
use crate::{looper_error::LooperError, message::Message};

#[test]
fn prepare_installs_and_returns_the_thread_local_looper() {
  let looper = Looper::prepare().expect("prepare");
  let mine = Looper::my_looper().expect("installed");
  assert!(Arc::ptr_eq(&looper, &mine));
  assert_eq!(looper.thread_id(), thread::current().id());
}

#[test]
fn prepare_twice_on_one_thread_fails() {
  let _looper = Looper::prepare().expect("prepare");
  assert_eq!(Looper::prepare().expect_err("second prepare"), LooperError::AlreadyPrepared);
}

#[test]
fn my_looper_is_none_without_prepare() {
  assert!(Looper::my_looper().is_none());
}

#[test]
fn loop_current_without_prepare_is_rejected() {
  assert_eq!(Looper::loop_current().expect_err("no looper"), LooperError::NoLooper);
}

#[test]
fn run_off_the_owning_thread_is_rejected() {
  let (sender, receiver) = mpsc::channel();
  let owner = thread::spawn(move || {
    let looper = Looper::prepare().expect("prepare");
    sender.send(looper.clone()).expect("publish");
    looper.run().expect("loop");
  });
  let looper = receiver.recv().expect("looper");
  assert!(matches!(looper.run(), Err(LooperError::WrongThread { .. })));
  looper.quit();
  owner.join().expect("join");
}

#[test]
fn quit_before_run_makes_the_loop_return_immediately() {
  let looper = Looper::prepare().expect("prepare");
  looper.quit();
  looper.run().expect("run returns");
}

#[test]
fn slot_clears_after_run_so_prepare_succeeds_again() {
  let looper = Looper::prepare().expect("prepare");
  looper.quit();
  looper.run().expect("run");
  assert!(Looper::my_looper().is_none());
  let second = Looper::prepare().expect("prepare again");
  second.quit();
  second.run().expect("run again");
}

#[test]
fn run_twice_on_the_same_looper_is_rejected() {
  let looper = Looper::prepare().expect("prepare");
  looper.quit();
  looper.run().expect("first run");
  assert_eq!(looper.run().expect_err("second run"), LooperError::AlreadyLooping);
}

#[test]
fn targetless_messages_are_dropped_and_the_loop_continues() {
  let looper = Looper::prepare().expect("prepare");
  looper.queue().enqueue(Message::new(42), Instant::now()).expect("enqueue");

  let ran = Arc::new(AtomicBool::new(false));
  let observed = ran.clone();
  let quitter = looper.clone();
  looper
    .queue()
    .enqueue(
      Message::from_runnable(move || {
        observed.store(true, Ordering::SeqCst);
        quitter.quit();
      }),
      Instant::now(),
    )
    .expect("enqueue");

  looper.run().expect("run");
  assert!(ran.load(Ordering::SeqCst));
}

#[test]
fn a_panicking_runnable_does_not_kill_the_loop() {
  let looper = Looper::prepare().expect("prepare");
  looper
    .queue()
    .enqueue(Message::from_runnable(|| panic!("runnable failure")), Instant::now())
    .expect("enqueue");

  let survived = Arc::new(AtomicBool::new(false));
  let observed = survived.clone();
  let quitter = looper.clone();
  looper
    .queue()
    .enqueue(
      Message::from_runnable(move || {
        observed.store(true, Ordering::SeqCst);
        quitter.quit();
      }),
      Instant::now(),
    )
    .expect("enqueue");

  looper.run().expect("run");
  assert!(survived.load(Ordering::SeqCst));
}
