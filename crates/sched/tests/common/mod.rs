//! 共享的测试装置
//!
//! 把 test-support 的 Mock 适配到 sync/sched 的架构抽象上，并提供
//! 构造测试用 TaskManager 的辅助函数。Mock 的 `switch_to` 只记录参数
//! 并立即返回，测试因此可以以「当前核心」的视角继续驱动调度器。

#![allow(dead_code)]

use std::sync::Once;

use sched::{ContextOps, TaskContext, TaskManager};
use test_support::mock::arch::MOCK_ARCH_OPS;
use test_support::mock::context::MOCK_CONTEXT_OPS;

pub struct TestArchOps;

impl sync::ArchOps for TestArchOps {
    unsafe fn read_and_disable_interrupts(&self) -> usize {
        unsafe { MOCK_ARCH_OPS.read_and_disable_interrupts() }
    }

    unsafe fn restore_interrupts(&self, flags: usize) {
        unsafe { MOCK_ARCH_OPS.restore_interrupts(flags) }
    }

    fn interrupts_enabled(&self) -> bool {
        MOCK_ARCH_OPS.interrupts_enabled()
    }

    fn flags_enabled(&self, flags: usize) -> bool {
        MOCK_ARCH_OPS.flags_enabled(flags)
    }

    fn cpu_id(&self) -> usize {
        MOCK_ARCH_OPS.cpu_id()
    }

    fn max_cpu_count(&self) -> usize {
        MOCK_ARCH_OPS.max_cpu_count()
    }
}

pub struct TestContextOps;

impl ContextOps for TestContextOps {
    unsafe fn switch_to(&self, save_into: *mut TaskContext, resume_from: *const TaskContext) {
        MOCK_CONTEXT_OPS.record_switch(save_into as usize, resume_from as usize);
    }

    fn init_task_context(&self, entry: usize, arg: usize, stack_top: usize, ctx: &mut TaskContext) {
        ctx.ra = entry;
        ctx.sp = stack_top;
        ctx.s[0] = arg;
        MOCK_CONTEXT_OPS.record_init(entry, stack_top);
    }
}

static TEST_ARCH_OPS: TestArchOps = TestArchOps;
static TEST_CONTEXT_OPS: TestContextOps = TestContextOps;
static INIT: Once = Once::new();

/// 注册 Mock 实现（每个测试进程一次）
pub fn init_ops() {
    INIT.call_once(|| {
        // SAFETY: Once 保证单次注册，静态实例生命周期为 'static
        unsafe {
            sync::register_arch_ops(&TEST_ARCH_OPS);
            sched::register_context_ops(&TEST_CONTEXT_OPS);
        }
    });
}

/// 空入口函数，测试任务从不真正运行
pub fn noop_entry(_arg: usize) {}

/// 构造一个已初始化当前核心的任务管理器
pub fn new_manager() -> TaskManager {
    init_ops();
    let manager = TaskManager::new();
    manager.init_current_core(noop_entry);
    manager
}
