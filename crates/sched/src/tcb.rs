//! 任务控制块
//!
//! 管理进程/线程的核心数据结构：身份信息、状态机、调度元数据和
//! 保存的执行上下文。任务在整个子系统中以
//! [`SharedTask`]（`Arc<SpinLock<TaskControlBlock>>`）的形式流动，
//! `status` 字段是「任务当前位于哪个队列结构」的唯一事实来源。

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use klog::pr_warn;
use sync::SpinLock;

use crate::config::{DEFAULT_TIME_SLICE, KERNEL_STACK_SIZE};
use crate::context::TaskContext;
use crate::context_ops;
use crate::pid::{NO_PARENT, Pid, idle_pid};
use crate::resource_id::ResourceId;

/// 线程入口函数类型
pub type ThreadEntry = fn(usize);

/// 任务状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskStatus {
    /// 未初始化
    UnInit,
    /// 就绪
    Ready,
    /// 正在运行
    Running,
    /// 睡眠中
    Sleeping,
    /// 阻塞
    Blocked,
    /// 已退出（终态，无人回收）
    Exited,
    /// 僵尸状态（终态，等待父进程回收）
    Zombie,
}

impl TaskStatus {
    /// 状态的字符串表示
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::UnInit => "UnInit",
            TaskStatus::Ready => "Ready",
            TaskStatus::Running => "Running",
            TaskStatus::Sleeping => "Sleeping",
            TaskStatus::Blocked => "Blocked",
            TaskStatus::Exited => "Exited",
            TaskStatus::Zombie => "Zombie",
        }
    }

    /// 状态机允许的迁移
    ///
    /// `Ready → Running`，`Running → {Ready, Blocked, Sleeping, Zombie, Exited}`，
    /// `Blocked/Sleeping → Ready`，`UnInit → Ready`，`Zombie → Exited`（回收）。
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::UnInit, TaskStatus::Ready)
                | (TaskStatus::Ready, TaskStatus::Running)
                | (TaskStatus::Running, TaskStatus::Ready)
                | (TaskStatus::Running, TaskStatus::Blocked)
                | (TaskStatus::Running, TaskStatus::Sleeping)
                | (TaskStatus::Running, TaskStatus::Zombie)
                | (TaskStatus::Running, TaskStatus::Exited)
                | (TaskStatus::Blocked, TaskStatus::Ready)
                | (TaskStatus::Sleeping, TaskStatus::Ready)
                | (TaskStatus::Zombie, TaskStatus::Exited)
        )
    }
}

/// 调度策略（固定优先级顺序：RealTime > Normal > Idle）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum SchedPolicy {
    /// 实时任务（最高优先级）
    RealTime = 0,
    /// 普通任务
    Normal = 1,
    /// 空闲任务（最低优先级）
    Idle = 2,
}

/// 调度策略数量
pub const POLICY_COUNT: usize = 3;

impl SchedPolicy {
    /// 策略在每核心调度器数组中的下标
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// 策略的字符串表示
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedPolicy::RealTime => "RealTime",
            SchedPolicy::Normal => "Normal",
            SchedPolicy::Idle => "Idle",
        }
    }
}

/// 基础调度信息
#[derive(Debug, Clone)]
pub struct SchedInfo {
    /// 唤醒时间（绝对 tick）
    pub wake_tick: u64,
    /// 剩余时间片 (ticks)
    pub time_slice_remaining: u64,
    /// 默认时间片 (ticks)
    pub time_slice_default: u64,
    /// 总运行时间 (ticks)
    pub total_runtime: u64,
    /// 上下文切换次数
    pub context_switches: u64,
}

impl SchedInfo {
    const fn new() -> Self {
        Self {
            wake_tick: 0,
            time_slice_remaining: DEFAULT_TIME_SLICE,
            time_slice_default: DEFAULT_TIME_SLICE,
            total_runtime: 0,
            context_switches: 0,
        }
    }
}

/// 任务控制块
#[derive(Debug)]
pub struct TaskControlBlock {
    /// 任务名称（用于诊断）
    pub name: &'static str,
    /// 进程 ID
    pub pid: Pid,
    /// 线程组 ID（组长的 PID）
    pub tgid: Pid,
    /// 进程组 ID
    pub pgid: Pid,
    /// 会话 ID
    pub sid: Pid,
    /// 父进程 ID，0 表示没有父进程
    pub parent_pid: Pid,
    /// 任务状态
    pub status: TaskStatus,
    /// 调度策略，创建时固定
    pub policy: SchedPolicy,
    /// 调度元数据
    pub sched_info: SchedInfo,
    /// 退出码
    pub exit_code: i32,
    /// 阻塞时等待的资源 ID
    pub blocked_on: ResourceId,
    /// CPU 亲和性位掩码（bit i 允许在核心 i 上运行）
    pub cpu_affinity: u64,
    /// 线程组链表：前一个线程的 PID
    pub group_prev: Option<Pid>,
    /// 线程组链表：后一个线程的 PID
    pub group_next: Option<Pid>,
    /// 内核栈（由外部分配器提供存储）
    kernel_stack: Vec<u8>,
    /// 保存的执行上下文，只由架构层切换原语读写
    pub context: TaskContext,
}

impl TaskControlBlock {
    /// 创建一个内核线程的任务控制块
    ///
    /// 分配内核栈并通过已注册的 [`crate::ContextOps`] 初始化上下文，
    /// 使任务从 `entry(arg)` 开始执行。初始状态为 UnInit，
    /// 经 [`crate::TaskManager::add_task`] 入队后变为 Ready。
    pub fn new_kernel_thread(
        name: &'static str,
        pid: Pid,
        entry: ThreadEntry,
        arg: usize,
        policy: SchedPolicy,
    ) -> Self {
        let kernel_stack = vec![0u8; KERNEL_STACK_SIZE];
        let stack_top = stack_top_of(&kernel_stack);

        let mut context = TaskContext::zeroed();
        context_ops().init_task_context(entry as usize, arg, stack_top, &mut context);

        Self {
            name,
            pid,
            tgid: pid,
            pgid: pid,
            sid: pid,
            parent_pid: NO_PARENT,
            status: TaskStatus::UnInit,
            policy,
            sched_info: SchedInfo::new(),
            exit_code: 0,
            blocked_on: ResourceId::none(),
            cpu_affinity: u64::MAX,
            group_prev: None,
            group_next: None,
            kernel_stack,
            context,
        }
    }

    /// 创建某个核心的 idle 任务
    ///
    /// idle 任务使用保留 PID，策略为 Idle，不进入任何就绪队列，
    /// 由每核心状态直接持有。
    pub fn new_idle(entry: ThreadEntry, core_id: usize) -> Self {
        let mut task = Self::new_kernel_thread("idle", idle_pid(core_id), entry, core_id, SchedPolicy::Idle);
        // idle 不走状态机的常规入口，构造即视为在运行
        task.status = TaskStatus::Running;
        task
    }

    /// 状态迁移；非法迁移记录日志并保持原状态
    pub fn transition_to(&mut self, next: TaskStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            pr_warn!(
                "task {}: invalid transition {} -> {}",
                self.pid,
                self.status.as_str(),
                next.as_str()
            );
            false
        }
    }

    /// 内核栈顶（16 字节对齐）
    pub fn stack_top(&self) -> usize {
        stack_top_of(&self.kernel_stack)
    }

    /// 是否为线程组的组长
    pub fn is_thread_group_leader(&self) -> bool {
        self.pid == self.tgid
    }
}

fn stack_top_of(stack: &[u8]) -> usize {
    (stack.as_ptr() as usize + stack.len()) & !0xF
}

/// 共享的任务句柄：队列、睡眠堆和阻塞桶都持有它的克隆
pub type SharedTask = Arc<SpinLock<TaskControlBlock>>;
