use core::sync::atomic::{AtomicBool, Ordering};

/// Binary semaphore used to give one caller at a time a direction of the link.
pub trait Semaphore {
    /// Try to take the semaphore, giving up after `timeout` units.
    fn acquire(&self, timeout: u32) -> bool;

    fn release(&self);
}

/// Busy waiting semaphore. `timeout` counts spin iterations.
#[derive(Debug)]
pub struct SpinSemaphore {
    held: AtomicBool,
}

impl SpinSemaphore {
    pub const fn new() -> SpinSemaphore {
        SpinSemaphore {
            held: AtomicBool::new(false),
        }
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Relaxed)
    }
}

impl Default for SpinSemaphore {
    fn default() -> Self {
        Self::new()
    }
}

impl Semaphore for SpinSemaphore {
    fn acquire(&self, timeout: u32) -> bool {
        let mut spins = 0;
        loop {
            if self
                .held
                .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
            if spins >= timeout {
                return false;
            }
            spins += 1;
            core::hint::spin_loop();
        }
    }

    fn release(&self) {
        if !self.held.swap(false, Ordering::Release) {
            log::error!("released a semaphore that was not held");
            panic!("semaphore released twice");
        }
    }
}

/// For links with a single sender and a single receiver that need no locking.
#[derive(Debug, Default)]
pub struct NoLock;

impl Semaphore for NoLock {
    fn acquire(&self, _timeout: u32) -> bool {
        true
    }

    fn release(&self) {}
}

/// Holds a [`Semaphore`] until dropped.
pub struct Guard<'a, S: Semaphore> {
    semaphore: &'a S,
}

impl<'a, S: Semaphore> Guard<'a, S> {
    /// # Panics
    ///
    /// If the semaphore cannot be taken within `timeout`. Callers are
    /// expected to never contend for that long.
    pub fn acquire(semaphore: &'a S, timeout: u32, name: &'static str) -> Guard<'a, S> {
        if !semaphore.acquire(timeout) {
            log::error!("timed out waiting for the {} lock", name);
            panic!("{} lock timeout", name);
        }
        Guard { semaphore }
    }
}

impl<S: Semaphore> Drop for Guard<'_, S> {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_releases_on_drop() {
        let sem = SpinSemaphore::new();
        {
            let _guard = Guard::acquire(&sem, 0, "test");
            assert!(sem.is_held());
        }
        assert!(!sem.is_held());
    }

    #[test]
    fn held_semaphore_times_out() {
        let sem = SpinSemaphore::new();
        assert!(sem.acquire(0));
        assert!(!sem.acquire(100));
        sem.release();
        assert!(sem.acquire(0));
    }

    #[test]
    #[should_panic(expected = "transmit lock timeout")]
    fn guard_timeout_is_fatal() {
        let sem = SpinSemaphore::new();
        let _first = Guard::acquire(&sem, 0, "transmit");
        let _second = Guard::acquire(&sem, 10, "transmit");
    }

    #[test]
    #[should_panic(expected = "released twice")]
    fn double_release_is_fatal() {
        let sem = SpinSemaphore::new();
        sem.release();
    }

    #[test]
    fn no_lock_always_succeeds() {
        let lock = NoLock;
        assert!(lock.acquire(0));
        assert!(lock.acquire(0));
        lock.release();
    }
}
