//! Idle 调度器
//!
//! 管理 Idle 策略的后台任务：只有在 RealTime 和 Normal 队列都为空时
//! 才会被扫描到。每核心的 idle 任务本身不进入这条队列，它由每核心
//! 状态直接持有，作为调度决策的最终回退。

use alloc::collections::VecDeque;
use alloc::sync::Arc;

use crate::policy::{Scheduler, SchedulerStats};
use crate::tcb::SharedTask;

/// Idle 调度器
pub struct IdleScheduler {
    ready_queue: VecDeque<SharedTask>,
    stats: SchedulerStats,
}

impl IdleScheduler {
    /// 创建一个空的 Idle 调度器
    pub fn new() -> Self {
        Self {
            ready_queue: VecDeque::new(),
            stats: SchedulerStats::default(),
        }
    }
}

impl Default for IdleScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for IdleScheduler {
    fn name(&self) -> &'static str {
        "Idle"
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
