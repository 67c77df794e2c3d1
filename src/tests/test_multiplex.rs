use super::common::*;
use crate::*;
use rstest::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[rstest]
fn test_output_closes_with_last_handle(setup_log: ()) {
    let _ = setup_log;
    let stop = StopToken::new();
    let output = Arc::new(BufferingChute::<u32>::new(8));
    let mut handles = multiplexer(3, output.clone());
    let third = handles.pop().unwrap();
    let second = handles.pop().unwrap();
    let first = handles.pop().unwrap();

    first.put(1, &stop).unwrap();
    first.close();
    second.close();
    assert!(!output.is_closed());

    // The surviving handle still reaches the shared output.
    third.put(2, &stop).unwrap();
    third.close();
    assert!(output.is_closed());

    assert_eq!(output.take(&stop).unwrap(), Some(1));
    assert_eq!(output.take(&stop).unwrap(), Some(2));
    assert_eq!(output.take(&stop).unwrap(), None);
}

#[rstest]
fn test_put_on_closed_handle_fails_while_output_open(setup_log: ()) {
    let _ = setup_log;
    let stop = StopToken::new();
    let output = Arc::new(BufferingChute::<u32>::new(8));
    let handles = multiplexer(2, output.clone());

    handles[0].close();
    assert!(handles[0].is_closed());
    assert!(!handles[1].is_closed());
    assert_eq!(handles[0].put(1, &stop), Err(PutError::Closed));
    assert!(!output.is_closed());
    handles[1].put(2, &stop).unwrap();
    assert_eq!(output.try_take_now(), Some(2));
}

#[rstest]
fn test_double_close_of_handle_is_noop(setup_log: ()) {
    let _ = setup_log;
    let output = Arc::new(BufferingChute::<u32>::new(8));
    let handles = multiplexer(2, output.clone());

    handles[0].close();
    handles[0].close();
    assert!(!output.is_closed(), "repeat close must not decrement the open count again");
    handles[1].close();
    assert!(output.is_closed());
}

/// A sink that counts how many times it was closed.
struct CountingEntrance {
    closes: AtomicUsize,
}

impl ChuteEntrance<u32> for CountingEntrance {
    fn put(&self, _element: u32, _stop: &StopToken) -> Result<(), PutError> {
        Ok(())
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closes.load(Ordering::SeqCst) > 0
    }
}

#[rstest]
fn test_concurrent_closes_close_output_exactly_once(setup_log: ()) {
    let _ = setup_log;
    for _ in 0..50 {
        let output = Arc::new(CountingEntrance { closes: AtomicUsize::new(0) });
        let handles = multiplexer(8, output.clone());
        let barrier = Arc::new(Barrier::new(handles.len()));
        let threads: Vec<_> = handles
            .into_iter()
            .map(|handle| {
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    handle.close();
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(output.closes.load(Ordering::SeqCst), 1);
    }
}

#[rstest]
fn test_handles_feed_shared_output_concurrently(setup_log: ()) {
    let _ = setup_log;
    let stop = StopToken::new();
    let output = Arc::new(BufferingChute::<usize>::new(4));
    let handles = multiplexer(4, output.clone());

    let producers: Vec<_> = handles
        .into_iter()
        .enumerate()
        .map(|(p, handle)| {
            let stop = stop.clone();
            thread::spawn(move || {
                for i in 0..100 {
                    handle.put(p * 1000 + i, &stop).unwrap();
                    if i % 17 == 0 {
                        thread::sleep(Duration::from_micros(50));
                    }
                }
                handle.close();
            })
        })
        .collect();

    let mut got = Vec::new();
    while let Some(v) = output.take(&stop).unwrap() {
        got.push(v);
    }
    for p in producers {
        p.join().unwrap();
    }
    got.sort_unstable();
    let mut expected: Vec<usize> =
        (0..4).flat_map(|p| (0..100).map(move |i| p * 1000 + i)).collect();
    expected.sort_unstable();
    assert_eq!(got, expected);
}

#[test]
#[should_panic(expected = "inputs must be at least 1")]
fn test_zero_inputs_panics() {
    let output = BufferingChute::<u32>::new(1);
    let _ = multiplexer(0, output);
}
