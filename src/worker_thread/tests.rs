use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use super::WorkerThread;

#[test]
fn post_before_start_is_rejected() {
  let worker = WorkerThread::new("idle");
  assert!(!worker.post(|| {}));
  assert!(!worker.post_delayed(|| {}, 10));
  assert!(!worker.finish());
  assert!(!worker.finish_now());
  assert!(worker.handler().is_none());
}

#[test]
fn runs_posted_work_on_its_own_thread() {
  let mut worker = WorkerThread::new("worker");
  worker.start();

  let (sender, receiver) = mpsc::channel();
  assert!(worker.post(move || sender.send(thread::current().id()).expect("send")));

  let executed_on = receiver.recv_timeout(Duration::from_secs(2)).expect("executed");
  assert_eq!(Some(executed_on), worker.thread_id());
  assert_ne!(executed_on, thread::current().id());
}

#[test]
fn exposes_handler_and_looper_after_start() {
  let mut worker = WorkerThread::new("exposed");
  worker.start();
  assert_eq!(worker.name(), "exposed");

  let looper = worker.get_looper().expect("published");
  let handler = worker.handler().expect("built");
  assert_eq!(handler.looper().thread_id(), looper.thread_id());
}

#[test]
fn start_twice_keeps_the_first_handler() {
  let mut worker = WorkerThread::new("restarted");
  worker.start();
  let first = worker.handler().expect("built").clone();
  worker.start();
  let second = worker.handler().expect("still built").clone();
  assert!(std::sync::Arc::ptr_eq(&first, &second));
}
