//! 调度策略接口
//!
//! 每个策略对象拥有一条就绪队列。调度器通过统一的 [`Scheduler`] trait
//! 操作它们；每核心的策略数组按 [`crate::SchedPolicy`] 的固定优先级
//! 顺序排列（RealTime > Normal > Idle），这也是调度决策的平局规则。

mod fifo;
mod idle;
mod rr;

pub use fifo::FifoScheduler;
pub use idle::IdleScheduler;
pub use rr::RoundRobinScheduler;

use crate::tcb::SharedTask;

/// 调度器统计信息
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulerStats {
    /// 总入队次数
    pub total_enqueues: usize,
    /// 总出队（移除）次数
    pub total_dequeues: usize,
    /// 总选择次数
    pub total_picks: usize,
}

/// 调度策略的统一接口
///
/// 实现者管理一条就绪队列：入队、尽力而为的移除、选出下一个任务。
/// `dequeue` 对不在队列中的任务是无操作（中断路径调用方的防御性契约）。
pub trait Scheduler: Send {
    /// 调度器名称
    fn name(&self) -> &'static str;

    /// 将任务加入就绪队列；队列满时通过 `Err` 归还任务，由调用方处置
    fn enqueue(&mut self, task: SharedTask) -> Result<(), SharedTask>;

    /// 从就绪队列移除指定任务；任务不在队列中时无操作
    fn dequeue(&mut self, task: &SharedTask);

    /// 选择下一个要运行的任务并将其移出队列；队列为空返回 None，不会阻塞
    fn pick_next(&mut self) -> Option<SharedTask>;

    /// 就绪队列中的任务数量（用于负载均衡）
    fn queue_size(&self) -> usize;

    /// 判断队列是否为空
    fn is_empty(&self) -> bool {
        self.queue_size() == 0
    }

    /// 时间片耗尽处理；返回 true 表示任务需要重新入队
    fn on_time_slice_expired(&mut self, _task: &SharedTask) -> bool {
        true
    }

    /// 获取统计信息
    fn stats(&self) -> SchedulerStats;
}
