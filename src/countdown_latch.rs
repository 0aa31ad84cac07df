use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Releases every waiter once `countdown` has been called `count` times.
#[derive(Clone)]
pub struct CountdownLatch {
    pair: Arc<(Mutex<usize>, Condvar)>,
}

impl CountdownLatch {
    pub fn new(count: usize) -> CountdownLatch {
        CountdownLatch {
            pair: Arc::new((Mutex::new(count), Condvar::new())),
        }
    }

    pub fn wait(&self) {
        let (lock, cvar) = &*self.pair;
        let mut count = lock.lock();
        while *count > 0 {
            cvar.wait(&mut count);
        }
    }

    /// Returns false if the count had not reached zero within `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = match Instant::now().checked_add(timeout) {
            Some(deadline) => deadline,
            None => {
                self.wait();
                return true;
            }
        };
        let (lock, cvar) = &*self.pair;
        let mut count = lock.lock();
        while *count > 0 {
            if cvar.wait_until(&mut count, deadline).timed_out() {
                return *count == 0;
            }
        }
        true
    }

    pub fn countdown(&self) {
        let (lock, cvar) = &*self.pair;
        let mut count = lock.lock();
        if *count == 0 {
            return;
        }
        *count -= 1;
        if *count == 0 {
            cvar.notify_all();
        }
    }

    pub fn count(&self) -> usize {
        *self.pair.0.lock()
    }
}
