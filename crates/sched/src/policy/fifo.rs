//! 先来先服务 (FIFO) 调度器
//!
//! 严格按到达顺序排队，适合对延迟敏感的实时任务。
//! 任务运行到主动让出 CPU；时间片耗尽后由调用方重新入队到队尾，
//! 跨调度周期才表现出类似轮转的行为。

use alloc::collections::VecDeque;
use alloc::sync::Arc;

use crate::policy::{Scheduler, SchedulerStats};
use crate::tcb::SharedTask;

/// FIFO 调度器
pub struct FifoScheduler {
    /// 就绪队列（先进先出）
    ready_queue: VecDeque<SharedTask>,
    stats: SchedulerStats,
}

impl FifoScheduler {
    /// 创建一个空的 FIFO 调度器
    pub fn new() -> Self {
        Self {
            ready_queue: VecDeque::new(),
            stats: SchedulerStats::default(),
        }
    }
}

impl Default for FifoScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for FifoScheduler {
    fn name(&self) -> &'static str {
        "FIFO"
    }

    fn enqueue(&mut self, task: SharedTask) -> Result<(), SharedTask> {
        self.ready_queue.push_back(task);
        self.stats.total_enqueues += 1;
        Ok(())
    }

    fn dequeue(&mut self, task: &SharedTask) {
        if let Some(pos) = self.ready_queue.iter().position(|t| Arc::ptr_eq(t, task)) {
            self.ready_queue.remove(pos);
            self.stats.total_dequeues += 1;
        }
    }

    fn pick_next(&mut self) -> Option<SharedTask> {
        let next = self.ready_queue.pop_front();
        if next.is_some() {
            self.stats.total_picks += 1;
        }
        next
    }

    fn queue_size(&self) -> usize {
        self.ready_queue.len()
    }

    fn stats(&self) -> SchedulerStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tcb::SchedPolicy;
    use crate::test_util;

    // FIFO 顺序：无交错 pick 的一串 enqueue 必须按原序弹出
    #[test]
    fn test_fifo_order() {
        test_util::init_test_ops();

        let mut sched = FifoScheduler::new();
        let tasks: alloc::vec::Vec<_> = (1..=4)
            .map(|pid| test_util::mk_task("t", pid, SchedPolicy::RealTime))
            .collect();

        for task in &tasks {
            assert!(sched.enqueue(task.clone()).is_ok());
        }
        assert_eq!(sched.queue_size(), 4);

        for task in &tasks {
            let picked = sched.pick_next().unwrap();
            assert!(Arc::ptr_eq(&picked, task));
        }
        assert!(sched.pick_next().is_none());
        assert!(sched.is_empty());

        let stats = sched.stats();
        assert_eq!(stats.total_enqueues, 4);
        assert_eq!(stats.total_picks, 4);
    }

    // dequeue：移除队列中间的任务，其余顺序不变；移除不存在的任务无操作
    #[test]
    fn test_dequeue_best_effort() {
        test_util::init_test_ops();

        let mut sched = FifoScheduler::new();
        let a = test_util::mk_task("a", 1, SchedPolicy::RealTime);
        let b = test_util::mk_task("b", 2, SchedPolicy::RealTime);
        let c = test_util::mk_task("c", 3, SchedPolicy::RealTime);
        let stranger = test_util::mk_task("x", 4, SchedPolicy::RealTime);

        assert!(sched.enqueue(a.clone()).is_ok());
        assert!(sched.enqueue(b.clone()).is_ok());
        assert!(sched.enqueue(c.clone()).is_ok());

        sched.dequeue(&b);
        sched.dequeue(&stranger); // 不在队列中：无操作
        assert_eq!(sched.queue_size(), 2);

        assert!(Arc::ptr_eq(&sched.pick_next().unwrap(), &a));
        assert!(Arc::ptr_eq(&sched.pick_next().unwrap(), &c));
    }
}
