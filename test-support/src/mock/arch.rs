//! 架构相关操作的 Mock 实现

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Mock 架构操作：中断状态和 CPU 标识都是可设置的进程内原子变量
pub struct MockArchOps {
    pub interrupt_state: AtomicBool,
    pub cpu_id: AtomicUsize,
    pub max_cpus: AtomicUsize,
}

impl MockArchOps {
    pub const fn new() -> Self {
        Self {
            interrupt_state: AtomicBool::new(true),
            cpu_id: AtomicUsize::new(0),
            max_cpus: AtomicUsize::new(1),
        }
    }

    /// # Safety
    /// Mock 实现，无真实中断，随时可调用
    pub unsafe fn read_and_disable_interrupts(&self) -> usize {
        self.interrupt_state.swap(false, Ordering::SeqCst) as usize
    }

    /// # Safety
    /// Mock 实现，无真实中断，随时可调用
    pub unsafe fn restore_interrupts(&self, flags: usize) {
        self.interrupt_state.store(flags != 0, Ordering::SeqCst);
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.interrupt_state.load(Ordering::SeqCst)
    }

    pub fn flags_enabled(&self, flags: usize) -> bool {
        flags != 0
    }

    pub fn cpu_id(&self) -> usize {
        self.cpu_id.load(Ordering::Relaxed)
    }

    pub fn max_cpu_count(&self) -> usize {
        self.max_cpus.load(Ordering::Relaxed)
    }

    /// 切换 Mock 的「当前核心」，用于模拟跨核心调用
    pub fn set_cpu_id(&self, id: usize) {
        self.cpu_id.store(id, Ordering::Relaxed);
    }

    /// 设置 Mock 的核心数量
    pub fn set_max_cpus(&self, count: usize) {
        self.max_cpus.store(count, Ordering::Relaxed);
    }
}

/// 全局 Mock 实例
pub static MOCK_ARCH_OPS: MockArchOps = MockArchOps::new();
