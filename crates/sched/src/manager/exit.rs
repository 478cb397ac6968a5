//! 任务退出
//!
//! 有父进程的任务进入 Zombie 等待回收；孤儿直接进入 Exited 并立即
//! 释放资源。控制流离开后不允许再回到退出的任务。

use alloc::sync::Arc;
use alloc::vec::Vec;

use hashbrown::HashMap;
use klog::{pr_debug, pr_emerg, pr_warn};

use crate::halt;
use crate::manager::TaskManager;
use crate::pid::{NO_PARENT, Pid};
use crate::tcb::{SharedTask, TaskStatus};

impl TaskManager {
    /// 退出当前任务
    ///
    /// 记录退出码、脱离线程组、把子进程转为孤儿；有父进程则进入
    /// Zombie（等待回收），没有则直接 Exited 并从任务表中移除
    /// （内核栈和 TCB 存储随最后一个 `Arc` 引用消失归还分配器）。
    /// 随后调度到其他任务，且**不得返回**：控制流回到这里说明
    /// 调度器不变量已被破坏，记录日志后停机。
    pub fn exit(&self, exit_code: i32) -> ! {
        let core_id = sync::cpu_id();

        // 锁顺序：任务表 -> 核心调度锁 -> 任务锁
        let mut table = self.task_table.lock();
        let core = self.cores[core_id].lock();

        let Some(current) = core.running_task.clone() else {
            pr_emerg!("exit: no current task on core {}", core_id);
            drop(core);
            drop(table);
            halt();
        };
        let current_is_idle = core
            .idle_task
            .as_ref()
            .is_some_and(|idle| Arc::ptr_eq(&current, idle));
        if current_is_idle {
            pr_emerg!("exit: idle task of core {} tried to exit", core_id);
            drop(core);
            drop(table);
            halt();
        }

        let (pid, parent_pid, tgid, is_leader) = {
            let mut cur = current.lock();
            cur.exit_code = exit_code;
            (cur.pid, cur.parent_pid, cur.tgid, cur.is_thread_group_leader())
        };

        // 组长先退出而组内还有其他线程：记录下来，等信号机制实现后处理
        if is_leader {
            let survivors = table
                .values()
                .filter(|t| {
                    let t = t.lock();
                    t.tgid == tgid && t.pid != pid
                })
                .count();
            if survivors > 0 {
                pr_warn!(
                    "exit: group leader pid={} exiting with {} threads still in group {}",
                    pid,
                    survivors,
                    tgid
                );
                // TODO: 实现信号机制后，向线程组中的所有线程发送 SIGKILL
            }
        }

        Self::unlink_from_group(&table, &current);

        // 将子进程转为孤儿，避免其退出后无人处置
        if is_leader {
            orphan_children(&table, pid);
        }

        if parent_pid != NO_PARENT {
            // 有父进程：进入僵尸状态等待回收
            current.lock().transition_to(TaskStatus::Zombie);
            // TODO: 通知父进程 (发送 SIGCHLD)
            pr_debug!("exit: pid={} -> Zombie, parent={}", pid, parent_pid);
        } else {
            // 没有父进程：直接退出并回收
            current.lock().transition_to(TaskStatus::Exited);
            table.remove(&pid);
            pr_debug!("exit: pid={} -> Exited (orphan, reaped)", pid);
        }

        drop(core);
        drop(table);
        self.schedule();

        // 退出后不应执行到这里
        pr_emerg!("exit: task {} returned from schedule", pid);
        halt();
    }
}

/// 把退出进程的所有子进程标记为孤儿（`parent_pid = 0`）
///
/// 调用方必须持有任务表锁。
fn orphan_children(table: &HashMap<Pid, SharedTask>, parent_pid: Pid) {
    let children: Vec<_> = table
        .values()
        .filter(|t| t.lock().parent_pid == parent_pid)
        .cloned()
        .collect();
    for child in children {
        child.lock().parent_pid = NO_PARENT;
    }
}
