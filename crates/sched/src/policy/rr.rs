//! Round-Robin 调度器
//!
//! 时间片轮转调度器，就绪队列是固定容量的无等待 MPMC 环形缓冲区
//! （见 [`sync::MpmcRingBuffer`]），入队和选取都可以在中断上下文中
//! 调用而不会阻塞：队列满时入队失败，队列空时选取返回 `None`。
//!
//! 入队时重置任务的时间片，实现公平的轮转。

use alloc::sync::Arc;

use klog::pr_warn;
use sync::MpmcRingBuffer;

use crate::config::READY_QUEUE_CAPACITY;
use crate::policy::{Scheduler, SchedulerStats};
use crate::tcb::SharedTask;

/// Round-Robin 调度器
pub struct RoundRobinScheduler {
    /// 就绪队列（无等待环形缓冲区）
    ready_queue: MpmcRingBuffer<SharedTask>,
    stats: SchedulerStats,
}

impl RoundRobinScheduler {
    /// 创建一个容量为 [`READY_QUEUE_CAPACITY`] 的 Round-Robin 调度器
    pub fn new() -> Self {
        Self::with_capacity(READY_QUEUE_CAPACITY)
    }

    /// 创建指定容量（2 的幂）的 Round-Robin 调度器
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ready_queue: MpmcRingBuffer::with_capacity(capacity),
            stats: SchedulerStats::default(),
        }
    }
}

impl Default for RoundRobinScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for RoundRobinScheduler {
    fn name(&self) -> &'static str {
        "RoundRobin"
    }

    fn enqueue(&mut self, task: SharedTask) -> Result<(), SharedTask> {
        {
            // 重新分配时间片
            let mut t = task.lock();
            t.sched_info.time_slice_remaining = t.sched_info.time_slice_default;
        }

        match self.ready_queue.push(task) {
            Ok(()) => {
                self.stats.total_enqueues += 1;
                Ok(())
            }
            Err(task) => {
                pr_warn!(
                    "RoundRobin: ready queue full, rejecting task {}",
                    task.lock().pid
                );
                Err(task)
            }
        }
    }

    fn dequeue(&mut self, task: &SharedTask) {
        // 环形缓冲区不支持中间移除：旋转一圈，丢弃目标任务
        let mut removed = false;
        for _ in 0..self.ready_queue.len() {
            match self.ready_queue.pop() {
                Some(t) if !removed && Arc::ptr_eq(&t, task) => {
                    removed = true;
                }
                Some(t) => {
                    // 其余任务按原顺序放回
                    if self.ready_queue.push(t).is_err() {
                        pr_warn!("RoundRobin: lost a task while rotating the ready queue");
                    }
                }
                None => break,
            }
        }
        if removed {
            self.stats.total_dequeues += 1;
        }
    }

    fn pick_next(&mut self) -> Option<SharedTask> {
        let next = self.ready_queue.pop();
        if next.is_some() {
            self.stats.total_picks += 1;
        }
        next
    }

    fn queue_size(&self) -> usize {
        self.ready_queue.len()
    }

    fn on_time_slice_expired(&mut self, task: &SharedTask) -> bool {
        // 重新分配时间片并要求重新入队
        let mut t = task.lock();
        t.sched_info.time_slice_remaining = t.sched_info.time_slice_default;
        true
    }

    fn stats(&self) -> SchedulerStats {
        self.stats
    }
}
