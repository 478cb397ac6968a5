//! 跨核心负载均衡
//!
//! 空闲核心从最繁忙的核心窃取就绪任务。为了避免跨核心的循环等待，
//! 同时持有两把核心锁时必须按核心编号递增的顺序获取。

use klog::pr_debug;

use crate::config::{BALANCE_MAX_MIGRATIONS, MAX_CORE_COUNT};
use crate::manager::TaskManager;
use crate::tcb::SchedPolicy;

/// 参与迁移的策略类（idle 类的后台任务不值得搬运）
const MIGRATABLE_POLICIES: [SchedPolicy; 2] = [SchedPolicy::RealTime, SchedPolicy::Normal];

impl TaskManager {
    /// 负载均衡：从最繁忙的其他核心迁移有限数量的任务到本核心
    ///
    /// 先逐核心（一次一把锁）快照就绪队列长度选出受害者，再按
    /// 核心编号递增的顺序同时锁住受害者和本核心，从受害者的队列
    /// 弹出至多 [`BALANCE_MAX_MIGRATIONS`] 个亲和性允许的任务，
    /// 放进本核心同策略的队列。返回迁移的任务数。
    pub fn balance(&self) -> usize {
        let my_core = sync::cpu_id();
        let core_count = sync::max_cpu_count().min(MAX_CORE_COUNT);
        if core_count <= 1 {
            return 0;
        }

        // 快照各核心的就绪任务数，挑最繁忙者
        let mut victim_core = None;
        let mut victim_len = 0;
        for i in 0..core_count {
            if i == my_core {
                continue;
            }
            let len = self.cores[i].lock().ready_count();
            if len > victim_len {
                victim_len = len;
                victim_core = Some(i);
            }
        }

        let Some(victim_core) = victim_core else {
            return 0;
        };
        // 只有一个就绪任务时不值得迁移
        if victim_len < 2 {
            return 0;
        }

        // 两把核心锁按编号递增获取
        let (low, high) = if my_core < victim_core {
            (my_core, victim_core)
        } else {
            (victim_core, my_core)
        };
        let mut low_guard = self.cores[low].lock();
        let mut high_guard = self.cores[high].lock();
        let (mine, victim) = if my_core < victim_core {
            (&mut *low_guard, &mut *high_guard)
        } else {
            (&mut *high_guard, &mut *low_guard)
        };

        let mut migrated = 0;
        'policies: for policy in MIGRATABLE_POLICIES {
            let idx = policy.index();
            while migrated < BALANCE_MAX_MIGRATIONS {
                let Some(task) = victim.schedulers[idx].pick_next() else {
                    break;
                };

                let affinity_allows = {
                    let t = task.lock();
                    t.cpu_affinity & (1 << my_core) != 0
                };
                if !affinity_allows {
                    // 亲和性不允许迁移：放回受害者，换下一个策略类
                    let _ = victim.schedulers[idx].enqueue(task);
                    continue 'policies;
                }

                match mine.schedulers[idx].enqueue(task) {
                    Ok(()) => migrated += 1,
                    Err(task) => {
                        // 本核心队列已满：物归原主，均衡到此为止
                        let _ = victim.schedulers[idx].enqueue(task);
                        break 'policies;
                    }
                }
            }
            if migrated >= BALANCE_MAX_MIGRATIONS {
                break;
            }
        }

        if migrated > 0 {
            pr_debug!(
                "balance: core {} stole {} tasks from core {}",
                my_core,
                migrated,
                victim_core
            );
        }
        migrated
    }
}
