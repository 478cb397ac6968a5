//! 调度子系统配置常量

/// 每个调度域支持的最大物理核心数（与 sync crate 保持一致）
pub const MAX_CORE_COUNT: usize = sync::MAX_CORE_COUNT;

/// 时钟中断频率 (Hz)，即每个核心每秒的 tick 数
pub const TICK_HZ: u64 = 100;

/// 新任务的默认时间片 (ticks)
pub const DEFAULT_TIME_SLICE: u64 = 10;

/// 内核栈大小 (16 KB)
pub const KERNEL_STACK_SIZE: usize = 16 * 1024;

/// 任务表容量上限，超出后创建任务报告资源耗尽
pub const MAX_TASK_COUNT: usize = 256;

/// Round-Robin 就绪队列容量（必须是 2 的幂）
pub const READY_QUEUE_CAPACITY: usize = 64;

/// 一次负载均衡最多迁移的任务数
pub const BALANCE_MAX_MIGRATIONS: usize = 2;
