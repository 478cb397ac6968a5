//! 互斥锁的使用契约测试
//!
//! 争用下的完整 lock() 路径需要真实的上下文切换才能推进，
//! 这里用 try_lock 和直接驱动 block/wakeup 来覆盖等价的语义。

mod common;

use std::sync::Arc;

use sched::{Mutex, ResourceType, SchedPolicy, TaskStatus};

// 基本的获取/释放与所有者跟踪
#[test]
fn test_lock_unlock_basic() {
    let manager = common::new_manager();
    let task = manager
        .create_kernel_thread("t", common::noop_entry, 0, SchedPolicy::Normal)
        .unwrap();
    manager.schedule();
    assert!(Arc::ptr_eq(&manager.current_task().unwrap(), &task));

    let mutex = Mutex::new("test_mutex", &manager);

    assert!(mutex.lock());
    assert!(mutex.is_locked_by_current_task());

    // 递归获取是使用错误：报告失败，不会死锁也不会被授予
    assert!(!mutex.lock());
    assert!(!mutex.try_lock());

    assert!(mutex.unlock());
    assert!(!mutex.is_locked_by_current_task());

    // 释放后可以再次获取
    assert!(mutex.try_lock());
    assert!(mutex.unlock());
}

// 任务上下文之外的调用一律失败（日志 + false，不是故障）
#[test]
fn test_outside_task_context() {
    common::init_ops();
    let manager = sched::TaskManager::new(); // 不初始化核心：没有当前任务

    let mutex = Mutex::new("orphan_mutex", &manager);
    assert!(!mutex.lock());
    assert!(!mutex.try_lock());
    assert!(!mutex.unlock());
    assert!(!mutex.is_locked_by_current_task());
}

// 非持有者释放是使用错误
#[test]
fn test_unlock_by_non_owner() {
    let manager = common::new_manager();
    let a = manager
        .create_kernel_thread("a", common::noop_entry, 0, SchedPolicy::Normal)
        .unwrap();
    let _b = manager
        .create_kernel_thread("b", common::noop_entry, 0, SchedPolicy::Normal)
        .unwrap();

    let mutex = Mutex::new("owned_mutex", &manager);

    manager.schedule();
    assert!(Arc::ptr_eq(&manager.current_task().unwrap(), &a));
    assert!(mutex.lock()); // a 持有

    // 驱动 b 上台（a 阻塞在别的资源上）
    let park = sched::ResourceId::new(ResourceType::CondVar, 0x42);
    manager.block(park);

    // 当前任务是 b：不能释放 a 的锁，也抢不到
    assert!(!mutex.unlock());
    assert!(!mutex.try_lock());

    // a 回来之后才能正常释放
    manager.wakeup(park);
    manager.block(sched::ResourceId::new(ResourceType::CondVar, 0x43)); // b 下台，a 上台
    assert!(Arc::ptr_eq(&manager.current_task().unwrap(), &a));
    assert!(mutex.unlock());
}

// 释放唤醒所有等待者：它们重新竞争，不保证顺序
#[test]
fn test_unlock_wakes_waiters() {
    let manager = common::new_manager();
    let a = manager
        .create_kernel_thread("holder", common::noop_entry, 0, SchedPolicy::Normal)
        .unwrap();
    let b = manager
        .create_kernel_thread("waiter", common::noop_entry, 0, SchedPolicy::Normal)
        .unwrap();

    let mutex = Mutex::new("contended_mutex", &manager);

    manager.schedule();
    assert!(Arc::ptr_eq(&manager.current_task().unwrap(), &a));
    assert!(mutex.lock());

    // a 让出，b 上台，b 对锁的单次尝试失败后挂到锁的资源 ID 上
    // （这正是争用下 Mutex::lock 内部做的事）
    manager.sleep_ms(0);
    assert!(Arc::ptr_eq(&manager.current_task().unwrap(), &b));
    assert!(!mutex.try_lock());
    manager.block(mutex.resource_id());
    assert_eq!(b.lock().status, TaskStatus::Blocked);

    // 回到 a：释放锁必须把 b 唤醒
    assert!(Arc::ptr_eq(&manager.current_task().unwrap(), &a));
    assert!(mutex.unlock());
    assert_eq!(b.lock().status, TaskStatus::Ready);
    assert!(!b.lock().blocked_on.is_valid());

    // b 重新竞争并成功
    manager.sleep_ms(0);
    assert!(Arc::ptr_eq(&manager.current_task().unwrap(), &b));
    assert!(mutex.try_lock());
    assert!(mutex.unlock());
}

// RAII 守卫：离开作用域自动释放
#[test]
fn test_lock_guard() {
    let manager = common::new_manager();
    manager
        .create_kernel_thread("t", common::noop_entry, 0, SchedPolicy::Normal)
        .unwrap();
    manager.schedule();

    let mutex = Mutex::new("guarded_mutex", &manager);
    {
        let guard = mutex.lock_guard();
        assert!(guard.is_some());
        assert!(mutex.is_locked_by_current_task());
    }
    // 守卫析构后锁已释放
    assert!(mutex.try_lock());
    assert!(mutex.unlock());
}
