//! 睡眠与 tick 驱动唤醒的行为测试
//!
//! TICK_HZ = 100：1 tick = 10ms。

mod common;

use std::sync::Arc;

use sched::{SchedPolicy, TaskStatus};

// 睡眠排序：重复 tick 按非递减的 wake_tick 顺序唤醒，
// 从不唤醒 wake_tick 还在未来的任务
#[test]
fn test_sleep_wake_ordering() {
    let manager = common::new_manager();

    let a = manager
        .create_kernel_thread("a", common::noop_entry, 0, SchedPolicy::Normal)
        .unwrap();
    let b = manager
        .create_kernel_thread("b", common::noop_entry, 0, SchedPolicy::Normal)
        .unwrap();

    // a 睡 30ms (3 ticks)，b 睡 10ms (1 tick)
    manager.schedule(); // a 运行
    assert!(Arc::ptr_eq(&manager.current_task().unwrap(), &a));
    manager.sleep_ms(30);

    assert!(Arc::ptr_eq(&manager.current_task().unwrap(), &b));
    manager.sleep_ms(10);

    assert_eq!(a.lock().status, TaskStatus::Sleeping);
    assert_eq!(b.lock().status, TaskStatus::Sleeping);
    assert_eq!(a.lock().sched_info.wake_tick, 3);
    assert_eq!(b.lock().sched_info.wake_tick, 1);

    // tick 1：只有 b 到期
    manager.tick_update();
    assert_eq!(b.lock().status, TaskStatus::Ready);
    assert_eq!(a.lock().status, TaskStatus::Sleeping);

    // tick 2：无人到期
    manager.tick_update();
    assert_eq!(a.lock().status, TaskStatus::Sleeping);

    // tick 3：a 到期
    manager.tick_update();
    assert_eq!(a.lock().status, TaskStatus::Ready);
    assert_eq!(manager.ready_count(0), 2);
}

// sleep(0) 退化为让出：不进入 Sleeping 状态
#[test]
fn test_sleep_zero_is_yield() {
    let manager = common::new_manager();

    let task = manager
        .create_kernel_thread("t", common::noop_entry, 0, SchedPolicy::Normal)
        .unwrap();
    manager.schedule();
    assert!(Arc::ptr_eq(&manager.current_task().unwrap(), &task));

    manager.sleep_ms(0);

    // 让出后作为唯一的就绪任务立即被再次选中
    assert!(Arc::ptr_eq(&manager.current_task().unwrap(), &task));
    assert_eq!(task.lock().status, TaskStatus::Running);
}

// 非零时长最少睡 1 个 tick（1ms 在 100Hz 下不足 1 tick）
#[test]
fn test_sleep_minimum_one_tick() {
    let manager = common::new_manager();

    let task = manager
        .create_kernel_thread("t", common::noop_entry, 0, SchedPolicy::Normal)
        .unwrap();
    manager.schedule();
    manager.sleep_ms(1);

    assert_eq!(task.lock().status, TaskStatus::Sleeping);
    assert_eq!(task.lock().sched_info.wake_tick, 1);

    manager.tick_update();
    assert_eq!(task.lock().status, TaskStatus::Ready);
}

// tick 计账：idle 运行时间、本地 tick、全局启动 tick
#[test]
fn test_tick_counters() {
    let manager = common::new_manager();

    let stats_before = manager.core_stats(0);
    let boot_before = manager.boot_tick();

    // 只有 idle 在运行
    manager.tick_update();
    manager.tick_update();

    let stats = manager.core_stats(0);
    assert_eq!(stats.local_tick, stats_before.local_tick + 2);
    assert_eq!(stats.idle_time, stats_before.idle_time + 2);
    assert_eq!(manager.boot_tick(), boot_before + 2);
}

// 运行中的任务按 tick 记账：运行时间增加、时间片递减
#[test]
fn test_runtime_accounting() {
    let manager = common::new_manager();

    let task = manager
        .create_kernel_thread("t", common::noop_entry, 0, SchedPolicy::Normal)
        .unwrap();
    manager.schedule();

    let (runtime_before, slice_before) = {
        let t = task.lock();
        (t.sched_info.total_runtime, t.sched_info.time_slice_remaining)
    };

    manager.tick_update();

    let t = task.lock();
    assert_eq!(t.sched_info.total_runtime, runtime_before + 1);
    assert_eq!(t.sched_info.time_slice_remaining, slice_before - 1);
}
