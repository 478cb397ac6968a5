//! 中断禁用区域的每核心嵌套计数
//!
//! 自旋锁可以在一条执行路径上嵌套获取，而中断只允许在**最外层**锁释放时
//! 重新打开，并且要恢复进入最外层临界区之前的原始状态，而不是无条件打开。
//! 这里用一组每核心的计数器记录嵌套深度和最外层保存的状态字。
//!
//! 注意：禁用中断只能阻止**本地 CPU** 的「任务 vs 本地中断」并发，
//! 多核共享数据仍需要配合自旋锁。

use core::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};

use klog::pr_warn;

use crate::{MAX_CORE_COUNT, arch_ops};

/// 单个核心的中断嵌套状态（按缓存行对齐，避免伪共享）
#[repr(align(64))]
struct CoreIntrState {
    /// 当前嵌套深度；0 表示不在任何中断禁用区域内
    depth: AtomicIsize,
    /// 进入最外层区域前保存的中断状态字
    saved_flags: AtomicUsize,
}

impl CoreIntrState {
    const fn new() -> Self {
        Self {
            depth: AtomicIsize::new(0),
            saved_flags: AtomicUsize::new(0),
        }
    }
}

static CORE_INTR: [CoreIntrState; MAX_CORE_COUNT] = [const { CoreIntrState::new() }; MAX_CORE_COUNT];

/// 进入一个中断禁用区域（嵌套 +1）
///
/// 最外层进入时保存当时的中断状态字，供 [`pop_intr_off`] 恢复。
pub fn push_intr_off() {
    let ops = arch_ops();
    // SAFETY: 保存的状态字只会交给同一核心的 pop_intr_off 恢复
    let flags = unsafe { ops.read_and_disable_interrupts() };

    let state = &CORE_INTR[ops.cpu_id()];
    if state.depth.load(Ordering::Relaxed) == 0 {
        state.saved_flags.store(flags, Ordering::Relaxed);
    }
    state.depth.fetch_add(1, Ordering::Relaxed);
}

/// 离开一个中断禁用区域（嵌套 -1）
///
/// 只有最外层离开时才恢复保存的中断状态。不配对的调用会被诊断但不会终止。
pub fn pop_intr_off() {
    let ops = arch_ops();

    if ops.interrupts_enabled() {
        pr_warn!("pop_intr_off: interrupts enabled inside a nested region");
    }

    let state = &CORE_INTR[ops.cpu_id()];
    let prev = state.depth.fetch_sub(1, Ordering::Relaxed);
    if prev < 1 {
        pr_warn!("pop_intr_off: unbalanced call on core {}", ops.cpu_id());
        state.depth.store(0, Ordering::Relaxed);
        return;
    }

    if prev == 1 {
        let flags = state.saved_flags.load(Ordering::Relaxed);
        if ops.flags_enabled(flags) {
            // SAFETY: flags 是本核心最外层 push_intr_off 保存的值
            unsafe { ops.restore_interrupts(flags) };
        }
    }
}

/// 查询指定核心当前的中断嵌套深度（用于调试/测试）
pub fn intr_nest_depth(core_id: usize) -> isize {
    CORE_INTR[core_id].depth.load(Ordering::Relaxed)
}
