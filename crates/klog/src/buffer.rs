//! 日志存储的无锁环形缓冲区
//!
//! 多生产者/多消费者，固定容量。缓冲区满时丢弃**新**日志并计数
//! （保留较早的日志，便于事后分析启动期间发生了什么）。
//!
//! 每个槽位带一个发布序号：写者先用 CAS 在 `head` 上认领一个全局
//! 序号，写入条目后把槽位序号推进到「已发布」；读者确认已发布后用
//! CAS 认领 `tail`，克隆条目，再把槽位序号推进到「可复用」。写者在
//! 槽位回到「可复用」之前不会触碰它，因此条目从不被并发读写。
//!
//! 序号按槽位下标取了偏移（存储 `seq - index`），使全零初始化就是
//! 合法的初始状态，缓冲区可以放进 `static`。

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::config::GLOBAL_LOG_BUFFER_SIZE;
use crate::entry::LogEntry;

const SIZE: usize = GLOBAL_LOG_BUFFER_SIZE;
const LAP_MASK: usize = !(SIZE - 1);

/// 单个槽位：条目存储加相对发布序号
///
/// 对全局序号 `pos`（槽位 `i = pos % SIZE`，圈起点 `lap = pos & LAP_MASK`）：
/// - `seq == lap`     槽位空闲，写者可以认领
/// - `seq == lap + 1` 条目已发布，读者可以认领
/// - `seq == lap + SIZE` 条目已消费，等同于下一圈的空闲
struct Slot {
    seq: AtomicUsize,
    entry: UnsafeCell<LogEntry>,
}

impl Slot {
    const fn new() -> Self {
        Self {
            seq: AtomicUsize::new(0),
            entry: UnsafeCell::new(LogEntry::empty()),
        }
    }
}

/// 全局日志环形缓冲区
pub(crate) struct GlobalLogBuffer {
    slots: [Slot; SIZE],
    /// 写游标（单调递增的全局序号）
    head: AtomicUsize,
    /// 读游标（单调递增的全局序号）
    tail: AtomicUsize,
    /// 因缓冲区满而丢弃的条目计数
    dropped: AtomicUsize,
}

impl GlobalLogBuffer {
    pub(crate) const fn new() -> Self {
        Self {
            slots: [const { Slot::new() }; SIZE],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
        }
    }

    /// 写入一个条目；缓冲区满时返回 false 并递增丢弃计数
    pub(crate) fn write(&self, entry: &LogEntry) -> bool {
        let mut pos = self.head.load(Ordering::Relaxed);
        loop {
            let slot = &self.slots[pos % SIZE];
            let lap = pos & LAP_MASK;
            let diff = slot.seq.load(Ordering::Acquire) as isize - lap as isize;

            if diff == 0 {
                match self.head.compare_exchange_weak(
                    pos,
                    pos + 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: head 的 CAS 成功意味着本写者独占认领了该槽位，
                        // 且槽位序号表明上一圈的读者已经离开。
                        unsafe {
                            *slot.entry.get() = entry.clone();
                        }
                        slot.seq.store(lap + 1, Ordering::Release);
                        return true;
                    }
                    Err(actual) => pos = actual,
                }
            } else if diff < 0 {
                // 上一圈的条目还没被消费：缓冲区满，丢弃新日志
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            } else {
                // 本圈已有写者抢先（已发布/已消费）：追上 head 重试
                pos = self.head.load(Ordering::Relaxed);
            }
        }
    }

    /// 读取最旧的未读条目；无可读条目时返回 None
    pub(crate) fn read(&self) -> Option<LogEntry> {
        let mut pos = self.tail.load(Ordering::Relaxed);
        loop {
            let slot = &self.slots[pos % SIZE];
            let lap = pos & LAP_MASK;
            let diff = slot.seq.load(Ordering::Acquire) as isize - (lap + 1) as isize;

            if diff == 0 {
                match self.tail.compare_exchange_weak(
                    pos,
                    pos + 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: tail 的 CAS 成功意味着本读者独占认领了该已发布
                        // 槽位；在序号推进到 lap + SIZE 之前写者不会复用它。
                        let entry = unsafe { (*slot.entry.get()).clone() };
                        slot.seq.store(lap + SIZE, Ordering::Release);
                        return Some(entry);
                    }
                    Err(actual) => pos = actual,
                }
            } else if diff < 0 {
                // 槽位还没有已发布的条目：缓冲区空（或写者正在写入）
                return None;
            } else {
                // 其他读者抢先消费了该槽位：追上 tail 重试
                pos = self.tail.load(Ordering::Relaxed);
            }
        }
    }

    /// 未读条目数量
    pub(crate) fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        head.saturating_sub(tail)
    }

    /// 已丢弃条目计数
    pub(crate) fn dropped_count(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

// SAFETY: 槽位的所有权转移完全由 head/tail 与槽位序号上的原子协议约束，
// 条目本身从不被并发读写。
unsafe impl Sync for GlobalLogBuffer {}
unsafe impl Send for GlobalLogBuffer {}
