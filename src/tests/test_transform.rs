use super::common::*;
use crate::*;
use rstest::*;
use std::sync::Arc;
use std::time::Duration;

#[rstest]
fn test_entrance_transforms_then_forwards(setup_log: ()) {
    let _ = setup_log;
    let stop = StopToken::new();
    let sink = Arc::new(BufferingChute::<String>::new(4));
    let entrance = TransformingEntrance::new(sink.clone(), |n: i32| format!("n={}", n));

    entrance.put(1, &stop).unwrap();
    entrance.put(2, &stop).unwrap();
    assert_eq!(sink.take(&stop).unwrap(), Some("n=1".to_string()));
    assert_eq!(sink.take(&stop).unwrap(), Some("n=2".to_string()));
}

#[rstest]
fn test_entrance_forwards_close(setup_log: ()) {
    let _ = setup_log;
    let stop = StopToken::new();
    let sink = Arc::new(BufferingChute::<String>::new(4));
    let entrance = TransformingEntrance::new(sink.clone(), |n: i32| n.to_string());

    assert!(!entrance.is_closed());
    entrance.close();
    assert!(entrance.is_closed());
    assert!(sink.is_closed());
    assert_eq!(entrance.put(3, &stop), Err(PutError::Closed));
    assert_eq!(sink.take(&stop).unwrap(), None);
}

#[rstest]
fn test_exit_transforms_taken_elements(setup_log: ()) {
    let _ = setup_log;
    let stop = StopToken::new();
    let source = Arc::new(BufferingChute::<u32>::new(4));
    let exit = TransformingExit::new(source.clone(), |n: u32| n * 2);

    source.put(1, &stop).unwrap();
    source.put(2, &stop).unwrap();
    source.put(3, &stop).unwrap();

    assert_eq!(exit.take(&stop).unwrap(), Some(2));
    assert_eq!(exit.try_take_now(), Some(4));
    assert_eq!(exit.try_take(Duration::from_secs(5), &stop).unwrap(), Some(6));
    assert_eq!(exit.try_take_now(), None);

    assert!(!exit.is_closed_and_empty());
    source.close();
    assert!(exit.is_closed_and_empty());
    assert_eq!(exit.take(&stop).unwrap(), None);
}

#[rstest]
fn test_exit_changes_element_type(setup_log: ()) {
    let _ = setup_log;
    let stop = StopToken::new();
    let source = Arc::new(BufferingChute::<String>::new(4));
    let exit = TransformingExit::new(source.clone(), |s: String| s.len());

    source.put("abc".to_string(), &stop).unwrap();
    source.put("".to_string(), &stop).unwrap();
    source.close();

    assert_eq!(exit.take(&stop).unwrap(), Some(3));
    assert_eq!(exit.take(&stop).unwrap(), Some(0));
    assert_eq!(exit.take(&stop).unwrap(), None);
}

#[rstest]
fn test_stacked_adapters(setup_log: ()) {
    let _ = setup_log;
    let stop = StopToken::new();
    let chute = Arc::new(BufferingChute::<i64>::new(4));
    let entrance = TransformingEntrance::new(chute.clone(), |n: i32| n as i64 + 100);
    let exit = TransformingExit::new(chute.clone(), |n: i64| n - 100);

    for i in 0..4 {
        entrance.put(i, &stop).unwrap();
    }
    entrance.close();
    for i in 0..4 {
        assert_eq!(exit.take(&stop).unwrap(), Some(i as i64));
    }
    assert_eq!(exit.take(&stop).unwrap(), None);
}
