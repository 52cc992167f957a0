use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Host capability that stops the page from scrolling under an active drag.
pub trait ScrollLock: Send + Sync {
    fn acquire(&self);
    fn release(&self);
}

/// Holds the scroll lock until dropped.
pub struct ScrollLockGuard {
    lock: Arc<dyn ScrollLock>,
}

impl ScrollLockGuard {
    pub fn acquire(lock: Arc<dyn ScrollLock>) -> Self {
        lock.acquire();
        Self { lock }
    }
}

impl Drop for ScrollLockGuard {
    fn drop(&mut self) {
        self.lock.release();
    }
}

impl std::fmt::Debug for ScrollLockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ScrollLockGuard")
    }
}

/// Lock state kept in a flag, for hosts that poll it each frame.
#[derive(Debug, Default)]
pub struct AtomicScrollLock {
    locked: AtomicBool,
}

impl AtomicScrollLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }
}

impl ScrollLock for AtomicScrollLock {
    fn acquire(&self) {
        self.locked.store(true, Ordering::SeqCst);
    }

    fn release(&self) {
        self.locked.store(false, Ordering::SeqCst);
    }
}

/// For hosts without scrolling.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopScrollLock;

impl ScrollLock for NoopScrollLock {
    fn acquire(&self) {}
    fn release(&self) {}
}
