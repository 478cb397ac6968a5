//! 自旋锁实现
//!
//! 基于原子 CAS 实现的跨核心互斥，配合每核心中断嵌套计数：
//! 获取锁前先禁用本地中断（见 [`push_intr_off`]），最外层释放时
//! 恢复原始中断状态。
//!
//! 锁会记录持有者核心，用于诊断两类使用错误（记录日志，不会终止）：
//! - 同一核心在释放前重复获取（必然自死锁，可诊断）
//! - 非持有者核心释放锁

use core::{
    hint,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use klog::pr_warn;

use crate::{arch_ops, pop_intr_off, push_intr_off};

/// 表示「无持有者」的核心 ID
const NO_OWNER: usize = usize::MAX;

/// 自旋锁结构体，提供互斥访问临界区的能力
///
/// 不可重入：同一核心在释放前再次调用 [`RawSpinLock::lock`] 会被诊断，
/// 随后照常自旋（自死锁，但不会被静默授予）。
///
/// # 示例
/// ```ignore
/// let lock = RawSpinLock::new();
/// {
///     let guard = lock.lock(); // 获取锁，禁用中断
///     // 临界区代码
/// } // 离开作用域，自动释放锁并恢复中断状态
/// ```
#[derive(Debug)]
pub struct RawSpinLock {
    lock: AtomicBool,
    /// 持有此锁的核心 ID，未持有时为 NO_OWNER
    owner_core: AtomicUsize,
}

impl RawSpinLock {
    /// 创建一个新的 RawSpinLock 实例
    pub const fn new() -> Self {
        RawSpinLock {
            lock: AtomicBool::new(false),
            owner_core: AtomicUsize::new(NO_OWNER),
        }
    }

    /// 获取自旋锁，并返回一个 RAII 保护器
    ///
    /// 先进入中断禁用区域，再在原子标志上自旋（acquire 语义的 CAS 重试，
    /// 获取循环本身是无锁的）。
    pub fn lock(&self) -> RawSpinLockGuard<'_> {
        push_intr_off();

        if self.is_held_by_current_core() {
            pr_warn!(
                "RawSpinLock: core {} re-locking a lock it already holds",
                arch_ops().cpu_id()
            );
        }

        while self
            .lock
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            hint::spin_loop();
        }

        self.owner_core.store(arch_ops().cpu_id(), Ordering::Relaxed);

        RawSpinLockGuard { lock: self }
    }

    /// 尝试获取自旋锁，如果成功则返回 RAII 保护器，否则返回 None
    ///
    /// 获取失败时立即退出中断禁用区域，恢复嵌套计数。
    pub fn try_lock(&self) -> Option<RawSpinLockGuard<'_>> {
        push_intr_off();

        if self
            .lock
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            self.owner_core.store(arch_ops().cpu_id(), Ordering::Relaxed);
            Some(RawSpinLockGuard { lock: self })
        } else {
            pop_intr_off();
            None
        }
    }

    /// 释放锁
    ///
    /// 非持有者核心的调用会被诊断（编程错误检测，不是安全边界）。
    fn unlock(&self) {
        if !self.is_held_by_current_core() {
            pr_warn!(
                "RawSpinLock: core {} unlocking a lock it does not hold",
                arch_ops().cpu_id()
            );
        }

        self.owner_core.store(NO_OWNER, Ordering::Relaxed);
        self.lock.store(false, Ordering::Release);

        pop_intr_off();
    }

    /// 检查当前核心是否持有此锁
    fn is_held_by_current_core(&self) -> bool {
        self.lock.load(Ordering::Acquire)
            && self.owner_core.load(Ordering::Relaxed) == arch_ops().cpu_id()
    }

    /// 检查锁是否被占用（仅用于调试/测试）
    pub fn is_locked(&self) -> bool {
        self.lock.load(Ordering::Relaxed)
    }
}

impl Default for RawSpinLock {
    fn default() -> Self {
        Self::new()
    }
}

/// 自动释放自旋锁并退出中断禁用区域的 RAII 结构体
pub struct RawSpinLockGuard<'a> {
    lock: &'a RawSpinLock,
}

impl Drop for RawSpinLockGuard<'_> {
    /// 退出作用域时自动执行，顺序如下：
    /// 1. 释放自旋锁标志。
    /// 2. 嵌套计数 -1，最外层时恢复中断状态。
    fn drop(&mut self) {
        self.lock.unlock();
    }
}
