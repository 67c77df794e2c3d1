use super::common::*;
use crate::*;
use rstest::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

#[rstest]
fn test_listener_fires_per_put(setup_log: ()) {
    let _ = setup_log;
    let stop = StopToken::new();
    let chute = ListenableChute::new(BufferingChute::<u32>::new(8));
    let fired = Arc::new(AtomicUsize::new(0));
    {
        let fired = fired.clone();
        chute.add_listener(move || { fired.fetch_add(1, Ordering::SeqCst); }, Arc::new(DirectExecutor));
    }
    for i in 0..3 {
        chute.put(i, &stop).unwrap();
    }
    assert_eq!(fired.load(Ordering::SeqCst), 3);
}

#[rstest]
fn test_close_notifies_only_when_empty(setup_log: ()) {
    let _ = setup_log;
    let stop = StopToken::new();
    let chute = ListenableChute::new(BufferingChute::<u32>::new(8));
    let fired = Arc::new(AtomicUsize::new(0));
    {
        let fired = fired.clone();
        chute.add_listener(move || { fired.fetch_add(1, Ordering::SeqCst); }, Arc::new(DirectExecutor));
    }
    chute.put(1, &stop).unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    // Closing with an element still buffered does not notify; the listener
    // already knows there is data to drain.
    chute.close();
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    assert_eq!(chute.try_take_now(), Some(1));
    assert!(chute.is_closed_and_empty());
    // Draining is the consumer's own doing, still no extra notification.
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    // A repeated close of the now closed-and-empty chute is not a
    // transition either.
    chute.close();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[rstest]
fn test_close_on_empty_notifies_once(setup_log: ()) {
    let _ = setup_log;
    let chute = ListenableChute::new(BufferingChute::<u32>::new(8));
    let fired = Arc::new(AtomicUsize::new(0));
    {
        let fired = fired.clone();
        chute.add_listener(move || { fired.fetch_add(1, Ordering::SeqCst); }, Arc::new(DirectExecutor));
    }
    chute.close();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    chute.close();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[rstest]
fn test_listeners_fire_in_registration_order(setup_log: ()) {
    let _ = setup_log;
    let stop = StopToken::new();
    let chute = ListenableChute::new(BufferingChute::<u32>::new(8));
    let order = Arc::new(Mutex::new(Vec::new()));
    for tag in ["first", "second", "third"] {
        let order = order.clone();
        chute.add_listener(move || order.lock().unwrap().push(tag), Arc::new(DirectExecutor));
    }
    chute.put(1, &stop).unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
}

struct RejectingExecutor;

impl Executor for RejectingExecutor {
    fn execute(&self, _task: Box<dyn FnOnce() + Send>) -> Result<(), RejectedExecution> {
        Err(RejectedExecution)
    }
}

#[rstest]
fn test_rejected_listener_is_skipped(setup_log: ()) {
    let _ = setup_log;
    let stop = StopToken::new();
    let chute = ListenableChute::new(BufferingChute::<u32>::new(8));
    let fired = Arc::new(AtomicUsize::new(0));
    chute.add_listener(|| {}, Arc::new(RejectingExecutor));
    {
        let fired = fired.clone();
        chute.add_listener(move || { fired.fetch_add(1, Ordering::SeqCst); }, Arc::new(DirectExecutor));
    }
    // The rejection neither blocks the put nor suppresses the second listener.
    chute.put(1, &stop).unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

/// Runs submitted tasks one at a time on a dedicated thread.
struct QueueExecutor {
    sender: Mutex<mpsc::Sender<Box<dyn FnOnce() + Send>>>,
}

impl QueueExecutor {
    fn new() -> (Arc<Self>, thread::JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel::<Box<dyn FnOnce() + Send>>();
        let handle = thread::spawn(move || {
            while let Ok(task) = receiver.recv() {
                task();
            }
        });
        (Arc::new(Self { sender: Mutex::new(sender) }), handle)
    }
}

impl Executor for QueueExecutor {
    fn execute(&self, task: Box<dyn FnOnce() + Send>) -> Result<(), RejectedExecution> {
        self.sender.lock().unwrap().send(task).map_err(|_| RejectedExecution)
    }
}

#[rstest]
fn test_one_executor_services_many_chutes(setup_log: ()) {
    let _ = setup_log;
    let stop = StopToken::new();
    let (executor, runner) = QueueExecutor::new();
    let results = Arc::new(Mutex::new(Vec::new()));

    let left = Arc::new(ListenableChute::new(BufferingChute::<u32>::new(8)));
    let right = Arc::new(ListenableChute::new(BufferingChute::<u32>::new(8)));
    for chute in [&left, &right] {
        // Weak, or the chute would hold itself alive through its own
        // listener list and the executor thread would never see its sender
        // drop.
        let weak = Arc::downgrade(chute);
        let results = results.clone();
        chute.add_listener(
            move || {
                if let Some(chute) = weak.upgrade() {
                    while let Some(v) = chute.try_take_now() {
                        results.lock().unwrap().push(v);
                    }
                }
            },
            executor.clone(),
        );
    }

    left.put(1, &stop).unwrap();
    right.put(100, &stop).unwrap();
    left.put(2, &stop).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        {
            let got = results.lock().unwrap();
            if got.len() == 3 {
                let mut sorted = got.clone();
                sorted.sort_unstable();
                assert_eq!(sorted, vec![1, 2, 100]);
                break;
            }
        }
        assert!(Instant::now() < deadline, "listeners never drained all elements");
        thread::sleep(Duration::from_millis(5));
    }

    drop(executor);
    drop(left);
    drop(right);
    runner.join().unwrap();
}
