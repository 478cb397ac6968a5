//! 共享的测试装置：把 test-support 的 Mock 适配到 sync 的 ArchOps 上

use std::sync::Once;

use sync::ArchOps;
use test_support::mock::arch::MOCK_ARCH_OPS;

pub struct TestArchOps;

impl ArchOps for TestArchOps {
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

static TEST_ARCH_OPS: TestArchOps = TestArchOps;
static INIT: Once = Once::new();

/// 注册 Mock 架构操作（每个测试进程一次）
pub fn init_arch() {
    INIT.call_once(|| {
        // SAFETY: Once 保证单次注册，静态实例生命周期为 'static
        unsafe { sync::register_arch_ops(&TEST_ARCH_OPS) };
    });
}
