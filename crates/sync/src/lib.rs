//! 同步原语
//!
//! 向其它内核模块提供基本的锁和同步原语：
//! 带中断嵌套计数的自旋锁、票号锁、无等待 MPMC 环形缓冲区。
//!
//! # 架构依赖
//!
//! 此 crate 通过 [`ArchOps`] trait 抽象架构相关操作（中断控制、CPU 标识）。
//! 使用前必须调用 [`register_arch_ops`] 注册实现。

#![no_std]

extern crate alloc;
#[cfg(test)]
extern crate std;

mod intr_nest;
mod raw_spin_lock;
mod ring_buffer;
mod spin_lock;
mod ticket_lock;

pub use intr_nest::{intr_nest_depth, pop_intr_off, push_intr_off};
pub use raw_spin_lock::{RawSpinLock, RawSpinLockGuard};
pub use ring_buffer::MpmcRingBuffer;
pub use spin_lock::{SpinLock, SpinLockGuard};
pub use ticket_lock::{RawTicketLock, TicketLock, TicketLockGuard};

use core::sync::atomic::{AtomicUsize, Ordering};

/// 每个调度域支持的最大物理核心数
///
/// 注册的 [`ArchOps::max_cpu_count`] 不得超过该值。
pub const MAX_CORE_COUNT: usize = 8;

/// 架构相关操作的 trait
///
/// 由内核的架构层实现并注册，提供中断控制和 CPU 信息。
pub trait ArchOps: Send + Sync {
    /// 读取并禁用本地中断，返回之前的状态字
    ///
    /// # Safety
    /// 调用者必须确保在适当的上下文中调用
    unsafe fn read_and_disable_interrupts(&self) -> usize;

    /// 恢复中断状态
    ///
    /// # Safety
    /// flags 必须是之前 read_and_disable_interrupts 返回的值
    unsafe fn restore_interrupts(&self, flags: usize);

    /// 查询本地中断当前是否处于启用状态
    fn interrupts_enabled(&self) -> bool;

    /// 判断一个保存的状态字是否表示「中断启用」
    fn flags_enabled(&self, flags: usize) -> bool;

    /// 获取当前 CPU ID
    fn cpu_id(&self) -> usize;

    /// 获取最大 CPU 数量
    fn max_cpu_count(&self) -> usize;
}

/// 全局架构操作实例（存储 fat pointer 的两个部分）
static ARCH_OPS_DATA: AtomicUsize = AtomicUsize::new(0);
static ARCH_OPS_VTABLE: AtomicUsize = AtomicUsize::new(0);

/// 注册架构操作实现
///
/// # Safety
/// 必须在单线程环境下调用，且只能调用一次
pub unsafe fn register_arch_ops(ops: &'static dyn ArchOps) {
    let ptr = ops as *const dyn ArchOps;
    // SAFETY: transmute 在这里是安全的，因为 fat pointer 的布局是 (data, vtable)
    let (data, vtable) = unsafe { core::mem::transmute::<*const dyn ArchOps, (usize, usize)>(ptr) };
    ARCH_OPS_DATA.store(data, Ordering::Release);
    ARCH_OPS_VTABLE.store(vtable, Ordering::Release);
}

/// 获取架构操作实例
#[inline]
pub(crate) fn arch_ops() -> &'static dyn ArchOps {
    let data = ARCH_OPS_DATA.load(Ordering::Acquire);
    let vtable = ARCH_OPS_VTABLE.load(Ordering::Acquire);
    if data == 0 {
        panic!("sync: ArchOps not registered, call register_arch_ops first");
    }
    // SAFETY: data 和 vtable 是通过 register_arch_ops 设置的有效指针
    unsafe { &*core::mem::transmute::<(usize, usize), *const dyn ArchOps>((data, vtable)) }
}

/// 当前 CPU ID（转发到已注册的 [`ArchOps`]）
#[inline]
pub fn cpu_id() -> usize {
    arch_ops().cpu_id()
}

/// 最大 CPU 数量（转发到已注册的 [`ArchOps`]）
#[inline]
pub fn max_cpu_count() -> usize {
    arch_ops().max_cpu_count()
}
