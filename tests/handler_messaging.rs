//! Cross-thread messaging scenarios driven through a hosted handler thread.

use std::sync::{mpsc, Arc, Mutex};
use std::time::{Duration, Instant};

use spindle_rs::{Handler, HandlerThread, Looper, Message};

fn recording_handler(looper: &Arc<Looper>) -> (Arc<Handler>, Arc<Mutex<Vec<i32>>>) {
  let handled = Arc::new(Mutex::new(Vec::new()));
  let handler = Handler::new(looper.clone(), {
    let handled = handled.clone();
    move |message: &Message| {
      handled.lock().expect("lock").push(message.code());
    }
  });
  (handler, handled)
}

#[test]
fn smaller_deadlines_dispatch_first() {
  let mut handler_thread = HandlerThread::new("ordering");
  handler_thread.start();
  let looper = handler_thread.get_looper().expect("published");
  let (handler, handled) = recording_handler(&looper);

  assert!(handler.send_message_delayed(handler.obtain_message(1), 50));
  assert!(handler.send_message_delayed(handler.obtain_message(2), 10));

  let (sender, receiver) = mpsc::channel();
  assert!(handler.post_delayed(move || sender.send(()).expect("send"), 100));
  receiver.recv_timeout(Duration::from_secs(2)).expect("drained");

  assert_eq!(handled.lock().expect("lock").clone(), vec![2, 1]);

  assert!(handler_thread.quit());
  handler_thread.join();
}

#[test]
fn delayed_posts_honor_the_delay_floor() {
  let mut handler_thread = HandlerThread::new("delay");
  handler_thread.start();
  let looper = handler_thread.get_looper().expect("published");
  let (handler, _handled) = recording_handler(&looper);

  let (sender, receiver) = mpsc::channel();
  let posted_at = Instant::now();
  assert!(handler.post_delayed(move || sender.send(Instant::now()).expect("send"), 200));

  let fired_at = receiver.recv_timeout(Duration::from_secs(2)).expect("fired");
  let elapsed = fired_at.saturating_duration_since(posted_at);
  assert!(elapsed >= Duration::from_millis(200), "fired after {elapsed:?}");
  assert!(elapsed < Duration::from_secs(2), "fired after {elapsed:?}");

  assert!(handler_thread.quit());
  handler_thread.join();
}

#[test]
fn a_panicking_handler_does_not_stop_dispatch() {
  let mut handler_thread = HandlerThread::new("faulty");
  handler_thread.start();
  let looper = handler_thread.get_looper().expect("published");

  let handled = Arc::new(Mutex::new(Vec::new()));
  let handler = Handler::new(looper, {
    let handled = handled.clone();
    move |message: &Message| {
      assert_ne!(message.code(), 13, "unlucky message");
      handled.lock().expect("lock").push(message.code());
    }
  });

  assert!(handler.send_message(handler.obtain_message(13)));
  assert!(handler.send_message(handler.obtain_message(14)));

  let (sender, receiver) = mpsc::channel();
  assert!(handler.post(move || sender.send(()).expect("send")));
  receiver.recv_timeout(Duration::from_secs(2)).expect("loop survived");

  assert_eq!(handled.lock().expect("lock").clone(), vec![14]);

  assert!(handler_thread.quit());
  handler_thread.join();
}

#[test]
fn messages_for_released_handlers_are_dropped() {
  let mut handler_thread = HandlerThread::new("released");
  handler_thread.start();
  let looper = handler_thread.get_looper().expect("published");

  let (released, released_log) = recording_handler(&looper);
  let (survivor, survivor_log) = recording_handler(&looper);

  assert!(released.send_message_delayed(released.obtain_message(1), 50));
  drop(released);
  assert!(survivor.send_message_delayed(survivor.obtain_message(2), 100));

  let (sender, receiver) = mpsc::channel();
  assert!(survivor.post_delayed(move || sender.send(()).expect("send"), 150));
  receiver.recv_timeout(Duration::from_secs(2)).expect("drained");

  assert!(released_log.lock().expect("lock").is_empty());
  assert_eq!(survivor_log.lock().expect("lock").clone(), vec![2]);

  assert!(handler_thread.quit());
  handler_thread.join();
}
