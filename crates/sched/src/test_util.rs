//! 单元测试共用装置
//!
//! 把 test-support 的 Mock 适配到本 crate 与 sync crate 的架构抽象上。
//! Mock 的 `switch_to` 只记录参数并立即返回，测试因此可以以
//! 「当前核心」的视角继续驱动调度器并断言状态。

use std::sync::Once;

use alloc::sync::Arc;
use sync::SpinLock;
use test_support::mock::arch::MOCK_ARCH_OPS;
use test_support::mock::context::MOCK_CONTEXT_OPS;

use crate::context::TaskContext;
use crate::pid::Pid;
use crate::tcb::{SchedPolicy, SharedTask, TaskControlBlock};

struct TestArchOps;

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

struct TestContextOps;

impl crate::ContextOps for TestContextOps {
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
pub(crate) fn init_test_ops() {
    INIT.call_once(|| {
        // SAFETY: Once 保证单次注册，静态实例生命周期为 'static
        unsafe {
            sync::register_arch_ops(&TEST_ARCH_OPS);
            crate::register_context_ops(&TEST_CONTEXT_OPS);
        }
    });
}

/// 空入口函数，用于不会真正运行的测试任务
pub(crate) fn noop_entry(_arg: usize) {}

/// 直接构造一个指定 PID 的共享任务（绕过任务表，用于队列测试）
pub(crate) fn mk_task(name: &'static str, pid: Pid, policy: SchedPolicy) -> SharedTask {
    Arc::new(SpinLock::new(TaskControlBlock::new_kernel_thread(
        name, pid, noop_entry, 0, policy,
    )))
}
