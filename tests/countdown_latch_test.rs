use std::thread;
use std::time::Duration;

use bounded_blocking_queue::CountdownLatch;

#[test]
fn wait_returns_once_count_reaches_zero() {
    let latch = CountdownLatch::new(3);
    let waiters: Vec<_> = (0..2)
        .map(|_| {
            let latch = latch.clone();
            thread::spawn(move || latch.wait())
        })
        .collect();

    for _ in 0..3 {
        latch.countdown();
    }
    for handle in waiters {
        handle.join().unwrap();
    }
    assert_eq!(latch.count(), 0);
}

#[test]
fn wait_timeout_expires_while_count_is_positive() {
    let latch = CountdownLatch::new(1);
    assert!(!latch.wait_timeout(Duration::from_millis(20)));
    assert_eq!(latch.count(), 1);

    latch.countdown();
    assert!(latch.wait_timeout(Duration::from_millis(20)));
}

#[test]
fn countdown_saturates_at_zero() {
    let latch = CountdownLatch::new(1);
    latch.countdown();
    latch.countdown();
    assert_eq!(latch.count(), 0);
    latch.wait();
}
