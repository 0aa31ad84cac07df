use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::error::QueueError;
use crate::Result;

struct Shared<T> {
    queue: Mutex<VecDeque<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

/// Fixed-capacity FIFO shared by any number of producer and consumer threads.
///
/// `push` blocks while the queue is full and `pop` blocks while it is empty,
/// both bounded by a timeout. Cloning the handle shares the same queue.
pub struct BoundedBlockingQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for BoundedBlockingQueue<T> {
    fn clone(&self) -> Self {
        BoundedBlockingQueue {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> BoundedBlockingQueue<T> {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }
        debug!("bounded queue created, capacity {}", capacity);
        Ok(BoundedBlockingQueue {
            shared: Arc::new(Shared {
                queue: Mutex::new(VecDeque::with_capacity(capacity)),
                not_full: Condvar::new(),
                not_empty: Condvar::new(),
                capacity,
            }),
        })
    }

    /// Inserts `item` at the tail, waiting at most `timeout` in total for the
    /// lock and for a free slot. Returns `false` on timeout, dropping `item`.
    pub fn push(&self, item: T, timeout: Duration) -> bool {
        self.push_timeout(item, timeout).is_ok()
    }

    /// Like [`push`](Self::push), but hands the item back on timeout.
    pub fn push_timeout(&self, item: T, timeout: Duration) -> std::result::Result<(), T> {
        let deadline = Instant::now().checked_add(timeout);
        let shared = &*self.shared;

        let mut queue = match lock_until(&shared.queue, deadline) {
            Some(queue) => queue,
            None => {
                trace!("push timed out waiting for the lock");
                return Err(item);
            }
        };
        while queue.len() >= shared.capacity {
            if wait_until(&shared.not_full, &mut queue, deadline)
                && queue.len() >= shared.capacity
            {
                trace!("push timed out on a full queue");
                return Err(item);
            }
        }
        queue.push_back(item);
        drop(queue);
        shared.not_empty.notify_one();
        Ok(())
    }

    /// Single attempt without waiting for a free slot.
    pub fn try_push(&self, item: T) -> std::result::Result<(), T> {
        self.push_timeout(item, Duration::ZERO)
    }

    /// Removes the head item, waiting at most `timeout` in total for the lock
    /// and for an item. Returns `None` on timeout.
    pub fn pop(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now().checked_add(timeout);
        let shared = &*self.shared;

        let mut queue = match lock_until(&shared.queue, deadline) {
            Some(queue) => queue,
            None => {
                trace!("pop timed out waiting for the lock");
                return None;
            }
        };
        while queue.is_empty() {
            if wait_until(&shared.not_empty, &mut queue, deadline) && queue.is_empty() {
                trace!("pop timed out on an empty queue");
                return None;
            }
        }
        let item = queue.pop_front();
        drop(queue);
        shared.not_full.notify_one();
        item
    }

    pub fn try_pop(&self) -> Option<T> {
        self.pop(Duration::ZERO)
    }

    /// Copy of the head item, left in place.
    pub fn front(&self) -> Result<T>
    where
        T: Clone,
    {
        self.shared
            .queue
            .lock()
            .front()
            .cloned()
            .ok_or(QueueError::Empty)
    }

    /// Advisory: may be stale as soon as it returns.
    pub fn size(&self) -> usize {
        self.shared.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.queue.lock().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.shared.queue.lock().len() >= self.shared.capacity
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }
}

// A `None` deadline means the timeout overflowed `Instant`; wait unbounded.
fn lock_until<T>(mutex: &Mutex<T>, deadline: Option<Instant>) -> Option<MutexGuard<'_, T>> {
    match deadline {
        Some(deadline) => mutex.try_lock_until(deadline),
        None => Some(mutex.lock()),
    }
}

// Returns true once the deadline has passed.
fn wait_until<T>(
    condvar: &Condvar,
    guard: &mut MutexGuard<'_, T>,
    deadline: Option<Instant>,
) -> bool {
    match deadline {
        Some(deadline) => condvar.wait_until(guard, deadline).timed_out(),
        None => {
            condvar.wait(guard);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::{Duration, Instant};

    use super::BoundedBlockingQueue;

    const SLACK: Duration = Duration::from_millis(5);

    #[test]
    fn push_and_pop_time_out_while_lock_is_held() {
        let queue = BoundedBlockingQueue::<i32>::new(4).unwrap();
        let guard = queue.shared.queue.lock();

        let worker = {
            let queue = queue.clone();
            thread::spawn(move || {
                let start = Instant::now();
                let pushed = queue.push(1, Duration::from_millis(50));
                let popped = queue.pop(Duration::from_millis(50));
                (pushed, popped, start.elapsed())
            })
        };
        let (pushed, popped, elapsed) = worker.join().unwrap();
        drop(guard);

        assert!(!pushed);
        assert_eq!(popped, None);
        assert!(elapsed + SLACK >= Duration::from_millis(100), "took {:?}", elapsed);
        assert_eq!(queue.size(), 0);
    }

    #[test]
    fn lock_wait_and_condition_wait_share_one_deadline() {
        let timeout = Duration::from_millis(100);
        let queue = BoundedBlockingQueue::new(1).unwrap();
        assert!(queue.push('x', timeout));
        let guard = queue.shared.queue.lock();

        let producer = {
            let queue = queue.clone();
            thread::spawn(move || {
                let start = Instant::now();
                let pushed = queue.push('y', timeout);
                (pushed, start.elapsed())
            })
        };
        thread::sleep(Duration::from_millis(60));
        drop(guard);

        let (pushed, elapsed) = producer.join().unwrap();
        assert!(!pushed);
        assert!(elapsed + SLACK >= timeout, "took {:?}", elapsed);
        // A deadline restarted after the lock wait would end near 160ms.
        assert!(elapsed < Duration::from_millis(150), "took {:?}", elapsed);
        assert_eq!(queue.size(), 1);
        assert_eq!(queue.front(), Ok('x'));
    }
}
