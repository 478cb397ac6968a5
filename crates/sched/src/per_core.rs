//! 每核心调度数据
//!
//! 每个物理核心独占一份 [`CoreSched`]，由该核心的自旋锁保护；
//! 跨核心访问（亲和性投放、负载均衡）只能通过目标核心的锁进行。

use alloc::boxed::Box;
use alloc::collections::{BinaryHeap, VecDeque};
use core::cmp::Ordering;

use hashbrown::HashMap;

use crate::policy::{FifoScheduler, IdleScheduler, RoundRobinScheduler, Scheduler};
use crate::resource_id::ResourceId;
use crate::tcb::{POLICY_COUNT, SharedTask};

/// 睡眠队列条目，按唤醒时间构成最小堆
pub(crate) struct SleepEntry {
    /// 唤醒时间（绝对 tick）
    pub wake_tick: u64,
    /// 睡眠中的任务
    pub task: SharedTask,
}

impl PartialEq for SleepEntry {
    fn eq(&self, other: &Self) -> bool {
        self.wake_tick == other.wake_tick
    }
}

impl Eq for SleepEntry {}

impl PartialOrd for SleepEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SleepEntry {
    /// 反转比较方向：BinaryHeap 是最大堆，这里让唤醒时间最早的条目在堆顶
    fn cmp(&self, other: &Self) -> Ordering {
        other.wake_tick.cmp(&self.wake_tick)
    }
}

/// 每个核心的调度数据 (RunQueue)
///
/// 核心启动时创建一次，生命周期与核心相同，从不销毁。
pub(crate) struct CoreSched {
    /// 调度器数组（按策略优先级顺序索引：RealTime, Normal, Idle）
    pub schedulers: [Box<dyn Scheduler>; POLICY_COUNT],

    /// 阻塞队列（按资源 ID 分组）
    pub blocked_tasks: HashMap<ResourceId, VecDeque<SharedTask>>,

    /// 睡眠队列（最小堆，按唤醒时间排序）
    pub sleeping_tasks: BinaryHeap<SleepEntry>,

    /// 当前正在运行的任务
    pub running_task: Option<SharedTask>,

    /// 本核心的 idle 任务（构造即可运行，从不入队）
    pub idle_task: Option<SharedTask>,

    /// Per-CPU tick 计数（每个核心独立计时）
    pub local_tick: u64,

    /// 本核心的空闲时间（单位: ticks）
    pub idle_time: u64,

    /// 本核心的总调度次数
    pub total_schedules: u64,
}

impl CoreSched {
    pub(crate) fn new() -> Self {
        Self {
            schedulers: [
                Box::new(FifoScheduler::new()),
                Box::new(RoundRobinScheduler::new()),
                Box::new(IdleScheduler::new()),
            ],
            blocked_tasks: HashMap::new(),
            sleeping_tasks: BinaryHeap::new(),
            running_task: None,
            idle_task: None,
            local_tick: 0,
            idle_time: 0,
            total_schedules: 0,
        }
    }

    /// 就绪任务总数（所有策略队列之和，用于负载均衡）
    pub(crate) fn ready_count(&self) -> usize {
        self.schedulers.iter().map(|s| s.queue_size()).sum()
    }
}

/// 每核心统计信息快照
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreStats {
    /// 本核心的 tick 计数
    pub local_tick: u64,
    /// 本核心的空闲时间 (ticks)
    pub idle_time: u64,
    /// 本核心的总调度次数
    pub total_schedules: u64,
}
