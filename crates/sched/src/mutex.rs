//! 互斥锁（Mutex）
//!
//! 构建在 [`TaskManager`] 的阻塞/唤醒原语之上的阻塞锁：
//!
//! - 锁被占用时，请求任务被阻塞并进入等待队列，而不是忙等
//! - 锁释放时唤醒**所有**等待任务，它们重新竞争 CAS（不保证公平性）
//! - 跟踪所有者并检测递归获取
//!
//! # 使用限制
//!
//! 1. 不可重入：同一任务不能递归获取同一把锁
//! 2. 所有权：必须由获取锁的任务释放
//! 3. 必须在任务上下文中使用：不能在中断处理程序中使用
//!
//! 所有使用错误都通过布尔返回值报告并记录日志，不会升级为故障。

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use klog::{pr_debug, pr_err, pr_warn};

use crate::manager::TaskManager;
use crate::pid::Pid;
use crate::resource_id::{ResourceId, ResourceType};

/// 表示「无持有者」的任务 ID
const NO_OWNER: usize = usize::MAX;

/// 基于任务调度的互斥锁
pub struct Mutex<'a> {
    /// 锁的名称（用于调试）
    name: &'static str,
    /// 锁状态
    locked: AtomicBool,
    /// 持有锁的任务 PID（NO_OWNER 表示未被持有）
    owner: AtomicUsize,
    /// 提供阻塞/唤醒原语的任务管理器
    manager: &'a TaskManager,
}

impl<'a> Mutex<'a> {
    /// 创建一个互斥锁
    pub fn new(name: &'static str, manager: &'a TaskManager) -> Self {
        Self {
            name,
            locked: AtomicBool::new(false),
            owner: AtomicUsize::new(NO_OWNER),
            manager,
        }
    }

    /// 此互斥锁的资源 ID（由锁自身的地址派生）
    pub fn resource_id(&self) -> ResourceId {
        ResourceId::new(ResourceType::Mutex, self as *const Self as usize as u64)
    }

    /// 锁的名称
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 获取锁（阻塞）
    ///
    /// 锁被其他任务持有时，当前任务阻塞在锁的资源 ID 上，被唤醒后
    /// 重新尝试 CAS。在任务上下文之外调用或递归获取都返回 false。
    pub fn lock(&self) -> bool {
        let Some(current) = self.manager.current_task() else {
            pr_err!("Mutex::lock: cannot lock '{}' outside task context", self.name);
            return false;
        };
        let current_pid = current.lock().pid;

        // 检查是否递归获取锁
        if self.is_held_by(current_pid) {
            pr_warn!(
                "Mutex::lock: task {} tried to recursively lock '{}'",
                current_pid,
                self.name
            );
            return false;
        }

        while self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            // 锁被占用：阻塞当前任务，被唤醒后重试
            pr_debug!("Mutex::lock: task {} blocking on '{}'", current_pid, self.name);
            self.manager.block(self.resource_id());
        }

        self.owner.store(current_pid, Ordering::Release);
        pr_debug!("Mutex::lock: task {} acquired '{}'", current_pid, self.name);
        true
    }

    /// 释放锁
    ///
    /// 清除所有者并唤醒所有等待任务。只能由持有锁的任务调用。
    pub fn unlock(&self) -> bool {
        let Some(current) = self.manager.current_task() else {
            pr_err!("Mutex::unlock: cannot unlock '{}' outside task context", self.name);
            return false;
        };
        let current_pid = current.lock().pid;

        if !self.is_held_by(current_pid) {
            pr_warn!(
                "Mutex::unlock: task {} tried to unlock '{}' it doesn't own",
                current_pid,
                self.name
            );
            return false;
        }

        self.owner.store(NO_OWNER, Ordering::Release);
        self.locked.store(false, Ordering::Release);

        pr_debug!("Mutex::unlock: task {} released '{}'", current_pid, self.name);

        // 唤醒所有等待此锁的任务，它们重新竞争 CAS
        self.manager.wakeup(self.resource_id());
        true
    }

    /// 尝试获取锁（非阻塞）：单次 CAS，从不调用阻塞原语
    pub fn try_lock(&self) -> bool {
        let Some(current) = self.manager.current_task() else {
            pr_err!("Mutex::try_lock: cannot trylock '{}' outside task context", self.name);
            return false;
        };
        let current_pid = current.lock().pid;

        if self.is_held_by(current_pid) {
            pr_debug!(
                "Mutex::try_lock: task {} tried to recursively trylock '{}'",
                current_pid,
                self.name
            );
            return false;
        }

        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            self.owner.store(current_pid, Ordering::Release);
            pr_debug!("Mutex::try_lock: task {} acquired '{}'", current_pid, self.name);
            true
        } else {
            pr_debug!("Mutex::try_lock: task {} failed to acquire '{}'", current_pid, self.name);
            false
        }
    }

    /// 检查锁是否被当前任务持有
    pub fn is_locked_by_current_task(&self) -> bool {
        match self.manager.current_task() {
            Some(current) => {
                let pid = current.lock().pid;
                self.is_held_by(pid)
            }
            None => false,
        }
    }

    /// 获取锁并返回 RAII 守卫；获取失败（使用错误）时返回 None
    pub fn lock_guard(&self) -> Option<MutexGuard<'_, 'a>> {
        if self.lock() {
            Some(MutexGuard { mutex: self })
        } else {
            None
        }
    }

    fn is_held_by(&self, pid: Pid) -> bool {
        self.locked.load(Ordering::Acquire) && self.owner.load(Ordering::Acquire) == pid
    }
}

// SAFETY: 所有可变状态都是原子变量，跨核心共享由 CAS 协议约束。
unsafe impl Send for Mutex<'_> {}
unsafe impl Sync for Mutex<'_> {}

/// RAII 风格的互斥锁守卫
///
/// 在构造时已持有锁，在析构时自动释放。
pub struct MutexGuard<'m, 'a> {
    mutex: &'m Mutex<'a>,
}

impl Drop for MutexGuard<'_, '_> {
    fn drop(&mut self) {
        self.mutex.unlock();
    }
}
