//! 上下文切换原语的 Mock 实现
//!
//! 真实的上下文切换会让控制流离开调用者；Mock 只记录调用参数并立即
//! 返回，测试因此可以以「当前核心」的视角继续驱动调度器并断言状态。

use core::sync::atomic::{AtomicUsize, Ordering};

/// Mock 上下文切换记录器
pub struct MockContextOps {
    pub switch_count: AtomicUsize,
    pub init_count: AtomicUsize,
    pub last_save: AtomicUsize,
    pub last_resume: AtomicUsize,
    pub last_entry: AtomicUsize,
    pub last_stack_top: AtomicUsize,
}

impl MockContextOps {
    pub const fn new() -> Self {
        Self {
            switch_count: AtomicUsize::new(0),
            init_count: AtomicUsize::new(0),
            last_save: AtomicUsize::new(0),
            last_resume: AtomicUsize::new(0),
            last_entry: AtomicUsize::new(0),
            last_stack_top: AtomicUsize::new(0),
        }
    }

    /// 记录一次上下文切换（参数为两个上下文的地址）
    pub fn record_switch(&self, save: usize, resume: usize) {
        self.last_save.store(save, Ordering::SeqCst);
        self.last_resume.store(resume, Ordering::SeqCst);
        self.switch_count.fetch_add(1, Ordering::SeqCst);
    }

    /// 记录一次任务上下文初始化
    pub fn record_init(&self, entry: usize, stack_top: usize) {
        self.last_entry.store(entry, Ordering::SeqCst);
        self.last_stack_top.store(stack_top, Ordering::SeqCst);
        self.init_count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn switch_count(&self) -> usize {
        self.switch_count.load(Ordering::SeqCst)
    }

    pub fn init_count(&self) -> usize {
        self.init_count.load(Ordering::SeqCst)
    }

    /// 最近一次切换的 (save, resume) 上下文地址
    pub fn last_switch(&self) -> (usize, usize) {
        (
            self.last_save.load(Ordering::SeqCst),
            self.last_resume.load(Ordering::SeqCst),
        )
    }
}

/// 全局 Mock 实例
pub static MOCK_CONTEXT_OPS: MockContextOps = MockContextOps::new();
