//! 每核心任务调度与同步子系统
//!
//! 内核的调度核心：任务生命周期与就绪队列管理、可插拔调度策略、
//! 主动阻塞/睡眠、时钟驱动的抢占，以及构建在阻塞原语之上的互斥锁。
//!
//! # 组件
//!
//! - [`TaskControlBlock`] - 任务实体：身份、状态机、调度元数据、保存的上下文
//! - [`Scheduler`] - 调度策略接口（[`FifoScheduler`]、[`RoundRobinScheduler`] 等），
//!   每个策略对象拥有一条就绪队列
//! - [`TaskManager`] - 编排者：入队/出队、调度决策、阻塞/睡眠/唤醒、
//!   tick 处理和跨核心负载均衡
//! - [`Mutex`] - 构建在 `block`/`wakeup` 之上的阻塞锁
//!
//! # 并发模型
//!
//! 每个物理核心一条独立执行流，调度状态按核心分片，各自由该核心的
//! 自旋锁保护；跨核心只共享少量进程级原子量（PID 分配器、启动 tick）。
//! `schedule`/`block`/`sleep_ms`/`Mutex::lock` 是仅有的挂起点：挂起的是
//! **调用任务**而不是核心，通过同步上下文切换换入同核心的其他就绪任务。
//!
//! # 架构依赖
//!
//! 上下文切换与上下文初始化通过 [`ContextOps`] trait 抽象，
//! 使用前必须调用 [`register_context_ops`] 注册实现；中断控制与
//! CPU 标识复用 `sync` crate 的 `ArchOps` 注册。

#![no_std]

extern crate alloc;
#[cfg(test)]
extern crate std;

pub mod config;
mod context;
mod manager;
mod mutex;
mod per_core;
mod pid;
mod policy;
mod resource_id;
mod tcb;
#[cfg(test)]
mod test_util;

pub use context::TaskContext;
pub use manager::{TaskError, TaskManager};
pub use mutex::{Mutex, MutexGuard};
pub use per_core::CoreStats;
pub use pid::{NO_PARENT, Pid, PidAllocator, idle_pid, is_idle_pid};
pub use policy::{
    FifoScheduler, IdleScheduler, RoundRobinScheduler, Scheduler, SchedulerStats,
};
pub use resource_id::{ResourceId, ResourceType};
pub use tcb::{
    POLICY_COUNT, SchedInfo, SchedPolicy, SharedTask, TaskControlBlock, TaskStatus, ThreadEntry,
};

use core::sync::atomic::{AtomicUsize, Ordering};

/// 上下文切换原语的 trait
///
/// 由内核的架构层实现并注册。`switch_to` 把当前执行流保存进
/// 出让任务的上下文并恢复接任任务的上下文；控制流只有在保存的
/// 任务被再次调度时才会回到 `switch_to` 的调用点。
pub trait ContextOps: Send + Sync {
    /// 保存当前执行流到 `save_into`，恢复 `resume_from` 并转移控制流
    ///
    /// # Safety
    /// 两个指针必须指向有效的 [`TaskContext`]，且调用期间没有其他
    /// 代码读写它们（上下文由 TCB 独占拥有，只有切换原语访问）。
    unsafe fn switch_to(&self, save_into: *mut TaskContext, resume_from: *const TaskContext);

    /// 初始化新任务的上下文：从 `entry(arg)` 开始执行，使用给定栈顶
    fn init_task_context(&self, entry: usize, arg: usize, stack_top: usize, ctx: &mut TaskContext);
}

/// 全局上下文操作实例（存储 fat pointer 的两个部分）
static CONTEXT_OPS_DATA: AtomicUsize = AtomicUsize::new(0);
static CONTEXT_OPS_VTABLE: AtomicUsize = AtomicUsize::new(0);

/// 注册上下文切换原语的实现
///
/// # Safety
/// 必须在单线程环境下调用，且只能调用一次
pub unsafe fn register_context_ops(ops: &'static dyn ContextOps) {
    let ptr = ops as *const dyn ContextOps;
    // SAFETY: fat pointer 的布局是 (data, vtable)
    let (data, vtable) =
        unsafe { core::mem::transmute::<*const dyn ContextOps, (usize, usize)>(ptr) };
    CONTEXT_OPS_DATA.store(data, Ordering::Release);
    CONTEXT_OPS_VTABLE.store(vtable, Ordering::Release);
}

/// 获取上下文操作实例
#[inline]
pub(crate) fn context_ops() -> &'static dyn ContextOps {
    let data = CONTEXT_OPS_DATA.load(Ordering::Acquire);
    let vtable = CONTEXT_OPS_VTABLE.load(Ordering::Acquire);
    if data == 0 {
        panic!("sched: ContextOps not registered, call register_context_ops first");
    }
    // SAFETY: data 和 vtable 是通过 register_context_ops 设置的有效指针
    unsafe { &*core::mem::transmute::<(usize, usize), *const dyn ContextOps>((data, vtable)) }
}

/// 停住当前核心
///
/// 用于已经破坏（或即将破坏）调度器不变量的逻辑错误：继续运行会在
/// 损坏的运行队列上操作，因此记录日志后在这里打转，绝不返回。
pub(crate) fn halt() -> ! {
    loop {
        core::hint::spin_loop();
    }
}
