//! 阻塞与唤醒
//!
//! 任务按资源 ID 分组挂在本核心的阻塞桶里；一次唤醒弹空整个桶。

use alloc::sync::Arc;

use klog::{pr_debug, pr_err, pr_warn};

use crate::manager::TaskManager;
use crate::resource_id::ResourceId;
use crate::tcb::TaskStatus;

impl TaskManager {
    /// 阻塞当前任务，等待指定资源
    ///
    /// 当前任务被标记为 Blocked、记录 `blocked_on`、挂入本核心的
    /// 阻塞桶，随后调度到其他任务。没有当前任务时记录日志并返回
    /// （防御性无操作，不是致命错误）。
    pub fn block(&self, resource_id: ResourceId) {
        let core_id = sync::cpu_id();
        {
            let mut core = self.cores[core_id].lock();

            let Some(current) = core.running_task.clone() else {
                pr_err!("block: no current task to block on core {}", core_id);
                return;
            };
            if let Some(idle) = &core.idle_task {
                if Arc::ptr_eq(&current, idle) {
                    // idle 必须始终可运行
                    pr_err!("block: refusing to block the idle task of core {}", core_id);
                    return;
                }
            }

            {
                let mut cur = current.lock();
                cur.transition_to(TaskStatus::Blocked);
                cur.blocked_on = resource_id;
                pr_debug!(
                    "block: pid={} blocked on resource={}, data={:#x}",
                    cur.pid,
                    resource_id.type_name(),
                    resource_id.data()
                );
            }

            core.blocked_tasks
                .entry(resource_id)
                .or_default()
                .push_back(current);
        }

        // 调度到其他任务；被唤醒后从这里继续执行
        self.schedule();
    }

    /// 唤醒等待指定资源的所有任务
    ///
    /// 弹空本核心该资源的整个阻塞桶：每个任务标记 Ready、清除
    /// `blocked_on`、放回所属策略的就绪队列。桶不存在时无操作。
    pub fn wakeup(&self, resource_id: ResourceId) {
        let core_id = sync::cpu_id();
        let mut core = self.cores[core_id].lock();

        let Some(mut waiters) = core.blocked_tasks.remove(&resource_id) else {
            pr_debug!(
                "wakeup: no tasks waiting on resource={}, data={:#x}",
                resource_id.type_name(),
                resource_id.data()
            );
            return;
        };

        let mut wakeup_count = 0usize;
        while let Some(task) = waiters.pop_front() {
            let (policy, pid) = {
                let mut t = task.lock();
                if t.status != TaskStatus::Blocked {
                    pr_warn!("wakeup: task {} is {} instead of Blocked", t.pid, t.status.as_str());
                }
                if t.blocked_on != resource_id {
                    pr_warn!("wakeup: task {} blocked_on does not match", t.pid);
                }
                t.transition_to(TaskStatus::Ready);
                t.blocked_on = ResourceId::none();
                (t.policy, t.pid)
            };

            if core.schedulers[policy.index()].enqueue(task).is_err() {
                pr_err!("wakeup: core {} failed to requeue task {}", core_id, pid);
            }
            wakeup_count += 1;
        }

        pr_debug!(
            "wakeup: woke {} tasks from resource={}, data={:#x}",
            wakeup_count,
            resource_id.type_name(),
            resource_id.data()
        );
    }
}
