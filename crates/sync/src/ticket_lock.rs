//! 票号锁
//!
//! 基于 `lock_api` 的公平自旋锁：按取号顺序授予锁，避免某个核心
//! 在高争用下饿死。与 [`crate::SpinLock`] 不同，票号锁**不禁用中断**，
//! 适合保护不会被中断路径触达的全局表。

use core::{
    hint,
    sync::atomic::{AtomicUsize, Ordering},
};

/// 票号锁的底层实现（`lock_api::RawMutex`）
pub struct RawTicketLock {
    /// 下一个待发放的票号
    next: AtomicUsize,
    /// 当前正在服务的票号
    serving: AtomicUsize,
}

unsafe impl lock_api::RawMutex for RawTicketLock {
    const INIT: Self = RawTicketLock {
        next: AtomicUsize::new(0),
        serving: AtomicUsize::new(0),
    };

    type GuardMarker = lock_api::GuardSend;

    fn lock(&self) {
        let ticket = self.next.fetch_add(1, Ordering::Relaxed);
        while self.serving.load(Ordering::Acquire) != ticket {
            hint::spin_loop();
        }
    }

    fn try_lock(&self) -> bool {
        let serving = self.serving.load(Ordering::Acquire);
        // 只有队列为空（serving == next）时才能立即拿到锁
        self.next
            .compare_exchange(serving, serving + 1, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    unsafe fn unlock(&self) {
        self.serving.fetch_add(1, Ordering::Release);
    }
}

/// 公平的票号自旋锁
pub type TicketLock<T> = lock_api::Mutex<RawTicketLock, T>;

/// TicketLock 的 RAII 保护器
pub type TicketLockGuard<'a, T> = lock_api::MutexGuard<'a, RawTicketLock, T>;

#[cfg(test)]
mod tests {
    use super::*;

    // 基本互斥与数据访问
    #[test]
    fn test_lock_unlock() {
        let lock: TicketLock<u32> = TicketLock::new(0);
        {
            let mut guard = lock.lock();
            *guard += 1;
        }
        assert_eq!(*lock.lock(), 1);
    }

    // try_lock 在锁被持有时必须失败
    #[test]
    fn test_try_lock_contended() {
        let lock: TicketLock<u32> = TicketLock::new(7);
        let guard = lock.lock();
        assert!(lock.try_lock().is_none());
        drop(guard);
        assert!(lock.try_lock().is_some());
    }
}
