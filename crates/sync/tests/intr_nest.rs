//! 中断嵌套计数的恢复语义测试
//!
//! 单独放在一个测试二进制中，且只有一个测试函数：这些断言依赖
//! Mock 的全局中断状态，不能和其它并发获取锁的测试共享进程。

mod common;

use std::sync::atomic::Ordering;

use sync::{RawSpinLock, intr_nest_depth};
use test_support::mock::arch::MOCK_ARCH_OPS;

#[test]
fn test_nesting_restores_original_interrupt_state() {
    common::init_arch();

    let outer = RawSpinLock::new();
    let inner = RawSpinLock::new();

    // 初始状态：中断开启，嵌套深度 0
    MOCK_ARCH_OPS.interrupt_state.store(true, Ordering::SeqCst);
    assert_eq!(intr_nest_depth(0), 0);

    {
        let _outer_guard = outer.lock();
        assert!(!MOCK_ARCH_OPS.interrupts_enabled());
        assert_eq!(intr_nest_depth(0), 1);

        {
            let _inner_guard = inner.lock();
            assert_eq!(intr_nest_depth(0), 2);
        }

        // 内层释放后中断必须仍然保持关闭
        assert!(!MOCK_ARCH_OPS.interrupts_enabled());
        assert_eq!(intr_nest_depth(0), 1);
    }

    // 最外层释放后恢复进入前的状态（开启）
    assert!(MOCK_ARCH_OPS.interrupts_enabled());
    assert_eq!(intr_nest_depth(0), 0);

    // 进入前中断本来就是关闭的：释放后不能被无条件打开
    MOCK_ARCH_OPS.interrupt_state.store(false, Ordering::SeqCst);
    {
        let _guard = outer.lock();
        assert!(!MOCK_ARCH_OPS.interrupts_enabled());
    }
    assert!(!MOCK_ARCH_OPS.interrupts_enabled());
    assert_eq!(intr_nest_depth(0), 0);
    MOCK_ARCH_OPS.interrupt_state.store(true, Ordering::SeqCst);

    // try_lock 失败必须退出中断禁用区域，不留下多余的嵌套层
    let held = outer.lock();
    assert_eq!(intr_nest_depth(0), 1);
    assert!(outer.try_lock().is_none());
    assert_eq!(intr_nest_depth(0), 1);
    drop(held);
    assert_eq!(intr_nest_depth(0), 0);
    assert!(!outer.is_locked());
    assert!(inner.try_lock().is_some());
}
