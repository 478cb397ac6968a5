//! 时钟中断处理
//!
//! 每个核心的时钟中断调用一次 [`TaskManager::tick_update`]：
//! 推进本地 tick、给运行中的任务记账并检测时间片耗尽（抢占触发），
//! 然后把睡眠堆里到期的任务全部唤醒。

use alloc::sync::Arc;

use klog::pr_err;

use crate::manager::TaskManager;
use crate::tcb::TaskStatus;

impl TaskManager {
    /// 更新本核心的 tick
    ///
    /// 时间片耗尽时把剩余片重置为默认值并触发 [`TaskManager::schedule`]
    /// （重新入队在 `schedule()` 内完成，不在这里）。运行的是 idle 任务
    /// 时只累计空闲时间。睡眠堆按唤醒时间有序，弹到第一个未到期的
    /// 条目即可停止，不会跳过任何任务。
    pub fn tick_update(&self) {
        let core_id = sync::cpu_id();
        let mut need_resched = false;

        {
            let mut core = self.cores[core_id].lock();
            core.local_tick += 1;
            if core_id == 0 {
                self.bump_boot_tick();
            }

            // 给当前任务记账
            if let (Some(current), Some(idle)) = (core.running_task.clone(), core.idle_task.clone())
            {
                if Arc::ptr_eq(&current, &idle) {
                    core.idle_time += 1;
                } else {
                    let mut cur = current.lock();
                    if cur.status == TaskStatus::Running {
                        cur.sched_info.total_runtime += 1;
                        if cur.sched_info.time_slice_remaining > 0 {
                            cur.sched_info.time_slice_remaining -= 1;
                        }
                        if cur.sched_info.time_slice_remaining == 0 {
                            // 抢占触发：重置时间片，调度在锁外进行
                            cur.sched_info.time_slice_remaining = cur.sched_info.time_slice_default;
                            need_resched = true;
                        }
                    }
                }
            }

            // 唤醒到期的睡眠任务（堆顶就是最早到期者）
            let local_tick = core.local_tick;
            loop {
                match core.sleeping_tasks.peek() {
                    Some(entry) if entry.wake_tick <= local_tick => {}
                    _ => break,
                }
                // peek 确认到期，pop 必然成功
                let Some(entry) = core.sleeping_tasks.pop() else {
                    break;
                };

                let (policy, pid) = {
                    let mut t = entry.task.lock();
                    t.transition_to(TaskStatus::Ready);
                    (t.policy, t.pid)
                };
                if core.schedulers[policy.index()].enqueue(entry.task).is_err() {
                    pr_err!("tick_update: core {} failed to enqueue woken task {}", core_id, pid);
                }
            }
        }

        // 如果需要抢占，触发调度
        if need_resched {
            self.schedule();
        }
    }
}
