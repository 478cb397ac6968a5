//! 任务管理器
//!
//! 负责整个调度子系统的编排：任务的创建与投放、调度决策、
//! 阻塞/睡眠/唤醒、tick 处理和跨核心负载均衡。
//!
//! 结构上没有隐藏的全局状态：每核心调度槽位数组、任务表、PID
//! 分配器和启动 tick 计数都是 [`TaskManager`] 实例的字段，
//! 由内核在启动时构造一次并注入使用方（测试可以构造自己的实例）。
//!
//! # 锁顺序
//!
//! 同一路径上需要嵌套加锁时必须按以下层级从高到低获取，避免循环等待：
//!
//! | 层级（高→低） | 锁 |
//! |---|---|
//! | 1 | `task_table`（全局任务表，票号锁） |
//! | 2 | 每核心调度锁（`cores[i]`；跨核心时按核心编号递增获取） |
//! | 3 | 单个任务实例锁（`task.lock()`） |

mod balance;
mod block;
mod exit;
mod schedule;
mod sleep;
mod tick;

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashMap;
use klog::{pr_err, pr_info};
use sync::{SpinLock, TicketLock};

use crate::config::{MAX_CORE_COUNT, MAX_TASK_COUNT};
use crate::per_core::{CoreSched, CoreStats};
use crate::pid::{Pid, PidAllocator};
use crate::tcb::{SchedPolicy, SharedTask, TaskControlBlock, TaskStatus, ThreadEntry};

/// 任务管理操作的错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskError {
    /// 任务表已满，没有空位容纳新任务
    TableFull,
    /// 指定的线程组不存在
    NoSuchGroup,
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::TableFull => write!(f, "task table is full"),
            TaskError::NoSuchGroup => write!(f, "no such thread group"),
        }
    }
}

/// 任务管理器
///
/// 拥有所有每核心调度状态和全局任务表。进程内通常只有一个实例，
/// 但单实例语义由构造方保证，而不是由隐藏的全局变量保证。
pub struct TaskManager {
    /// 每个核心的调度数据，各自由自己的锁保护
    pub(crate) cores: [SpinLock<CoreSched>; MAX_CORE_COUNT],

    /// 全局任务表 (PID -> TCB)，用于按 PID 查找、线程组遍历等
    task_table: TicketLock<HashMap<Pid, SharedTask>>,

    /// PID 分配器
    pid_allocator: PidAllocator,

    /// 全局启动 tick 计数（由核心 0 的 tick 驱动）
    boot_tick: AtomicU64,
}

impl TaskManager {
    /// 创建一个任务管理器实例
    pub fn new() -> Self {
        Self {
            cores: core::array::from_fn(|_| SpinLock::new(CoreSched::new())),
            task_table: TicketLock::new(HashMap::new()),
            pid_allocator: PidAllocator::new(),
            boot_tick: AtomicU64::new(0),
        }
    }

    /// 初始化当前核心的调度数据，创建该核心的 idle 任务
    ///
    /// idle 任务立即成为当前核心的运行任务。它从不进入就绪队列，
    /// 调度决策在所有队列为空时回退到它。
    pub fn init_current_core(&self, idle_entry: ThreadEntry) {
        let core_id = sync::cpu_id();
        let idle = Arc::new(SpinLock::new(TaskControlBlock::new_idle(idle_entry, core_id)));

        let mut core = self.cores[core_id].lock();
        core.idle_task = Some(idle.clone());
        core.running_task = Some(idle);

        pr_info!("sched: core {} initialized", core_id);
    }

    /// 创建并投放一个内核线程
    ///
    /// 分配 PID 和内核栈，登记到任务表，再按调度策略入队。
    /// 任务表满时报告资源耗尽，不会创建任务。
    pub fn create_kernel_thread(
        &self,
        name: &'static str,
        entry: ThreadEntry,
        arg: usize,
        policy: SchedPolicy,
    ) -> Result<SharedTask, TaskError> {
        let task = {
            let mut table = self.task_table.lock();
            if table.len() >= MAX_TASK_COUNT {
                pr_err!("create_kernel_thread: task table full ({} tasks)", table.len());
                return Err(TaskError::TableFull);
            }

            let pid = self.pid_allocator.allocate();
            let task = Arc::new(SpinLock::new(TaskControlBlock::new_kernel_thread(
                name, pid, entry, arg, policy,
            )));
            table.insert(pid, task.clone());
            task
        };

        self.add_task(task.clone());
        Ok(task)
    }

    /// 在已有线程组中创建一个线程
    ///
    /// 新线程共享组长的 `tgid`/`pgid`/`sid`，并通过 PID 链接
    /// 插入组长之后的线程组链表。
    pub fn create_thread_in_group(
        &self,
        name: &'static str,
        entry: ThreadEntry,
        arg: usize,
        policy: SchedPolicy,
        tgid: Pid,
    ) -> Result<SharedTask, TaskError> {
        let task = {
            let mut table = self.task_table.lock();
            if table.len() >= MAX_TASK_COUNT {
                pr_err!("create_thread_in_group: task table full");
                return Err(TaskError::TableFull);
            }
            if !table.contains_key(&tgid) {
                pr_err!("create_thread_in_group: no leader with tgid {}", tgid);
                return Err(TaskError::NoSuchGroup);
            }

            let pid = self.pid_allocator.allocate();
            let mut tcb = TaskControlBlock::new_kernel_thread(name, pid, entry, arg, policy);

            // 插入组长之后：leader -> new -> old_next
            let old_next = {
                let leader = &table[&tgid];
                let mut l = leader.lock();
                tcb.tgid = l.tgid;
                tcb.pgid = l.pgid;
                tcb.sid = l.sid;
                tcb.group_prev = Some(l.pid);
                tcb.group_next = l.group_next;
                l.group_next = Some(pid);
                tcb.group_next
            };
            if let Some(next_pid) = old_next {
                if let Some(next) = table.get(&next_pid) {
                    next.lock().group_prev = Some(pid);
                }
            }

            let task = Arc::new(SpinLock::new(tcb));
            table.insert(pid, task.clone());
            task
        };

        self.add_task(task.clone());
        Ok(task)
    }

    /// 添加任务到就绪队列
    ///
    /// 按任务的亲和性掩码选择目标核心（默认当前核心），
    /// 加的是**目标**核心的锁而不是调用方核心的锁。
    pub fn add_task(&self, task: SharedTask) {
        let (policy, affinity, pid) = {
            let mut t = task.lock();
            if t.status == TaskStatus::UnInit {
                t.transition_to(TaskStatus::Ready);
            }
            (t.policy, t.cpu_affinity, t.pid)
        };

        let mut target_core = sync::cpu_id();
        if affinity != u64::MAX {
            // 寻找第一个允许的核心
            for i in 0..sync::max_cpu_count().min(MAX_CORE_COUNT) {
                if affinity & (1 << i) != 0 {
                    target_core = i;
                    break;
                }
            }
        }

        let mut core = self.cores[target_core].lock();
        if core.schedulers[policy.index()].enqueue(task).is_err() {
            pr_err!(
                "add_task: core {} {} queue rejected task {}",
                target_core,
                policy.as_str(),
                pid
            );
        }
    }

    /// 获取当前核心正在运行的任务
    pub fn current_task(&self) -> Option<SharedTask> {
        self.cores[sync::cpu_id()].lock().running_task.clone()
    }

    /// 按 PID 查找任务
    pub fn find_task(&self, pid: Pid) -> Option<SharedTask> {
        self.task_table.lock().get(&pid).cloned()
    }

    /// 获取线程组的所有线程的 PID
    ///
    /// 优先沿组长的 PID 链表遍历；组长不在表中时退化为全表扫描。
    pub fn thread_group(&self, tgid: Pid) -> Vec<Pid> {
        let table = self.task_table.lock();
        let mut members = Vec::new();

        if table.contains_key(&tgid) {
            let mut cursor = Some(tgid);
            while let Some(pid) = cursor {
                members.push(pid);
                cursor = table.get(&pid).and_then(|t| t.lock().group_next);
            }
        } else {
            for (pid, task) in table.iter() {
                if task.lock().tgid == tgid {
                    members.push(*pid);
                }
            }
        }
        members
    }

    /// 当前登记在任务表中的任务数量
    pub fn task_count(&self) -> usize {
        self.task_table.lock().len()
    }

    /// 指定核心就绪队列中的任务总数（所有策略队列之和）
    pub fn ready_count(&self, core_id: usize) -> usize {
        self.cores[core_id].lock().ready_count()
    }

    /// 获取指定核心的统计信息快照
    pub fn core_stats(&self, core_id: usize) -> CoreStats {
        let core = self.cores[core_id].lock();
        CoreStats {
            local_tick: core.local_tick,
            idle_time: core.idle_time,
            total_schedules: core.total_schedules,
        }
    }

    /// 全局启动 tick 计数
    pub fn boot_tick(&self) -> u64 {
        self.boot_tick.load(Ordering::Relaxed)
    }

    /// 把任务从线程组链表中摘除，并修复邻居的链接
    ///
    /// 调用方必须持有任务表锁。
    pub(crate) fn unlink_from_group(table: &HashMap<Pid, SharedTask>, task: &SharedTask) {
        let (prev, next) = {
            let mut t = task.lock();
            (t.group_prev.take(), t.group_next.take())
        };

        if let Some(prev_pid) = prev {
            if let Some(prev_task) = table.get(&prev_pid) {
                prev_task.lock().group_next = next;
            }
        }
        if let Some(next_pid) = next {
            if let Some(next_task) = table.get(&next_pid) {
                next_task.lock().group_prev = prev;
            }
        }
    }

    pub(crate) fn bump_boot_tick(&self) {
        self.boot_tick.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}
