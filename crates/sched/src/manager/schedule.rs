//! 调度决策与上下文切换
//!
//! [`TaskManager::schedule`] 是唯一的挂起/恢复点：时间片耗尽、主动
//! 让出、阻塞、睡眠和退出最终都走到这里。

use alloc::sync::Arc;

use klog::{pr_emerg, pr_err};

use crate::context::TaskContext;
use crate::context_ops;
use crate::halt;
use crate::manager::TaskManager;
use crate::per_core::CoreSched;
use crate::tcb::{SharedTask, TaskStatus};

impl TaskManager {
    /// 调度函数：选择下一个任务并切换上下文
    ///
    /// 在当前核心的锁保护下：
    ///
    /// 1. 如果当前任务仍然可运行（让出而不是阻塞/退出），把它
    ///    Running→Ready 并放回所属策略的队列；idle 任务从不入队。
    /// 2. 按固定优先级顺序（RealTime > Normal > Idle）扫描策略队列，
    ///    第一个非空结果胜出。
    /// 3. 一无所获时释放锁、尝试跨核心负载均衡、重新加锁再扫描一次。
    /// 4. 仍然没有就绪任务则回退到本核心的 idle 任务（构造即可运行）。
    /// 5. 更新统计信息，释放锁；只有换人时才调用外部切换原语——
    ///    这是控制流离开当前任务的唯一位置。
    pub fn schedule(&self) {
        let core_id = sync::cpu_id();
        let core_lock = &self.cores[core_id];
        let mut core = core_lock.lock();

        let Some(current) = core.running_task.clone() else {
            // 核心尚未初始化：防御性返回，不是致命错误
            pr_err!("schedule: core {} has no running task", core_id);
            return;
        };
        let Some(idle) = core.idle_task.clone() else {
            // 没有 idle 任务的核心无法兜底，继续运行会破坏调度不变量
            pr_emerg!("schedule: core {} has no idle task", core_id);
            drop(core);
            halt();
        };

        let current_is_idle = Arc::ptr_eq(&current, &idle);

        // 1. 让出的任务重新入队（idle 特殊处理，从不入队）
        let requeue_policy = {
            let mut cur = current.lock();
            if cur.status == TaskStatus::Running && !current_is_idle {
                cur.transition_to(TaskStatus::Ready);
                Some(cur.policy)
            } else {
                None
            }
        };
        if let Some(policy) = requeue_policy {
            let scheduler = &mut core.schedulers[policy.index()];
            if scheduler.on_time_slice_expired(&current)
                && scheduler.enqueue(current.clone()).is_err()
            {
                pr_err!(
                    "schedule: core {} failed to requeue task {}",
                    core_id,
                    current.lock().pid
                );
            }
        }

        // 2. 按策略优先级选择下一个任务
        let mut next = pick_from_policies(&mut core);

        // 3. 空则释放锁做一次负载均衡，重试一次
        if next.is_none() {
            drop(core);
            self.balance();
            core = core_lock.lock();
            next = pick_from_policies(&mut core);
        }

        // 4. 仍然没有就绪任务：回退到 idle
        let next = next.unwrap_or_else(|| idle.clone());
        let next_is_idle = Arc::ptr_eq(&next, &idle);
        let switching = !Arc::ptr_eq(&current, &next);

        // 5. 统计与状态更新
        core.total_schedules += 1;
        {
            let mut n = next.lock();
            if n.status == TaskStatus::Ready {
                n.transition_to(TaskStatus::Running);
            } else if !next_is_idle {
                pr_err!(
                    "schedule: next task {} is {} instead of Ready",
                    n.pid,
                    n.status.as_str()
                );
            }
            // 重置时间片（对 RR/FIFO 有效）
            n.sched_info.time_slice_remaining = n.sched_info.time_slice_default;
            if switching {
                n.sched_info.context_switches += 1;
            }
        }
        if switching {
            current.lock().sched_info.context_switches += 1;
        }

        core.running_task = Some(next.clone());

        // 在释放核心锁之前取出两侧的上下文指针
        let save = context_ptr_mut(&current);
        let resume = context_ptr(&next);
        drop(core);

        // 上下文切换：控制流在此离开当前任务，直到它被再次调度
        if switching {
            // SAFETY: 上下文由 TCB 独占拥有且只被切换原语读写；
            // running_task 与就绪结构持有的 Arc 保证两个 TCB 在切换期间存活。
            unsafe { context_ops().switch_to(save, resume) };
        }
    }
}

/// 按固定优先级顺序扫描策略队列，返回第一个非空结果
fn pick_from_policies(core: &mut CoreSched) -> Option<SharedTask> {
    for scheduler in core.schedulers.iter_mut() {
        if let Some(task) = scheduler.pick_next() {
            return Some(task);
        }
    }
    None
}

fn context_ptr_mut(task: &SharedTask) -> *mut TaskContext {
    let mut guard = task.lock();
    &raw mut guard.context
}

fn context_ptr(task: &SharedTask) -> *const TaskContext {
    let guard = task.lock();
    &raw const guard.context
}
