//! 定时睡眠
//!
//! 毫秒时长换算为 tick：`ticks = ms × TICK_HZ / 1000`，非零时长至少
//! 睡 1 个 tick；`ms == 0` 退化为单纯的让出，不进入 Sleeping 状态。

use alloc::sync::Arc;

use klog::pr_err;

use crate::config::TICK_HZ;
use crate::manager::TaskManager;
use crate::per_core::SleepEntry;
use crate::tcb::TaskStatus;

/// 每秒的毫秒数
const MILLISECONDS_PER_SECOND: u64 = 1000;

impl TaskManager {
    /// 当前任务睡眠指定毫秒数
    ///
    /// 设置 `wake_tick = local_tick + ticks`，标记 Sleeping 并插入
    /// 本核心的睡眠堆（按唤醒时间排序），随后调度到其他任务。
    /// 到期唤醒由 [`TaskManager::tick_update`] 完成。
    pub fn sleep_ms(&self, ms: u64) {
        // 睡眠时间为 0：仅让出 CPU
        if ms == 0 {
            self.schedule();
            return;
        }

        let core_id = sync::cpu_id();
        {
            let mut core = self.cores[core_id].lock();

            let Some(current) = core.running_task.clone() else {
                pr_err!("sleep: no current task to sleep on core {}", core_id);
                return;
            };
            if let Some(idle) = &core.idle_task {
                if Arc::ptr_eq(&current, idle) {
                    pr_err!("sleep: refusing to put the idle task of core {} to sleep", core_id);
                    return;
                }
            }

            let sleep_ticks = (ms * TICK_HZ / MILLISECONDS_PER_SECOND).max(1);
            let wake_tick = core.local_tick + sleep_ticks;

            {
                let mut cur = current.lock();
                cur.transition_to(TaskStatus::Sleeping);
                cur.sched_info.wake_tick = wake_tick;
            }

            core.sleeping_tasks.push(SleepEntry {
                wake_tick,
                task: current,
            });
        }

        // 调度到其他任务；到期被唤醒后从这里继续执行
        self.schedule();
    }
}
