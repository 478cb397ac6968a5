//! 无等待 MPMC 环形缓冲区
//!
//! 固定容量（2 的幂）、槽位带序号的多生产者/多消费者队列。
//! 入队和出队都不会阻塞，因此可以在中断上下文中安全调用：
//! 队列满时入队立即失败并归还元素，队列空时出队返回 `None`。
//!
//! 每个槽位带一个序号：序号等于入队游标表示槽位空闲可写，
//! 等于「入队游标 + 1」表示元素已发布可读。游标只认领槽位，
//! 元素的可见性由槽位序号的 release/acquire 配对保证。

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicUsize, Ordering};

/// 单个槽位：序号加元素存储
struct Slot<T> {
    seq: AtomicUsize,
    value: UnsafeCell<MaybeUninit<T>>,
}

/// 固定容量的无等待 MPMC 环形缓冲区
pub struct MpmcRingBuffer<T> {
    slots: Box<[Slot<T>]>,
    /// capacity - 1，用于游标到槽位下标的映射
    mask: usize,
    /// 入队游标（单调递增）
    enqueue_pos: AtomicUsize,
    /// 出队游标（单调递增）
    dequeue_pos: AtomicUsize,
}

impl<T> MpmcRingBuffer<T> {
    /// 创建指定容量的缓冲区
    ///
    /// # Panics
    /// 容量必须是大于零的 2 的幂。
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(
            capacity > 0 && capacity.is_power_of_two(),
            "MpmcRingBuffer capacity must be a non-zero power of two"
        );

        let mut slots = Vec::with_capacity(capacity);
        for i in 0..capacity {
            slots.push(Slot {
                seq: AtomicUsize::new(i),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            });
        }

        Self {
            slots: slots.into_boxed_slice(),
            mask: capacity - 1,
            enqueue_pos: AtomicUsize::new(0),
            dequeue_pos: AtomicUsize::new(0),
        }
    }

    /// 入队；队列满时返回 `Err` 归还元素
    pub fn push(&self, value: T) -> Result<(), T> {
        let mut pos = self.enqueue_pos.load(Ordering::Relaxed);
        loop {
            let slot = &self.slots[pos & self.mask];
            let seq = slot.seq.load(Ordering::Acquire);
            let diff = seq as isize - pos as isize;

            if diff == 0 {
                match self.enqueue_pos.compare_exchange_weak(
                    pos,
                    pos + 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: CAS 成功意味着本生产者独占认领了该槽位
                        unsafe { (*slot.value.get()).write(value) };
                        slot.seq.store(pos + 1, Ordering::Release);
                        return Ok(());
                    }
                    Err(actual) => pos = actual,
                }
            } else if diff < 0 {
                // 槽位还没被消费者回收：队列满
                return Err(value);
            } else {
                pos = self.enqueue_pos.load(Ordering::Relaxed);
            }
        }
    }

    /// 出队；队列空时返回 `None`
    pub fn pop(&self) -> Option<T> {
        let mut pos = self.dequeue_pos.load(Ordering::Relaxed);
        loop {
            let slot = &self.slots[pos & self.mask];
            let seq = slot.seq.load(Ordering::Acquire);
            let diff = seq as isize - (pos + 1) as isize;

            if diff == 0 {
                match self.dequeue_pos.compare_exchange_weak(
                    pos,
                    pos + 1,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: CAS 成功意味着本消费者独占认领了该已发布槽位
                        let value = unsafe { (*slot.value.get()).assume_init_read() };
                        slot.seq.store(pos + self.mask + 1, Ordering::Release);
                        return Some(value);
                    }
                    Err(actual) => pos = actual,
                }
            } else if diff < 0 {
                // 槽位还没有已发布的元素：队列空
                return None;
            } else {
                pos = self.dequeue_pos.load(Ordering::Relaxed);
            }
        }
    }

    /// 当前元素个数（并发下是一个快照近似值）
    pub fn len(&self) -> usize {
        let enq = self.enqueue_pos.load(Ordering::Acquire);
        let deq = self.dequeue_pos.load(Ordering::Acquire);
        enq.saturating_sub(deq)
    }

    /// 队列是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 队列容量
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }
}

impl<T> Drop for MpmcRingBuffer<T> {
    fn drop(&mut self) {
        // 丢弃尚未出队的元素
        while self.pop().is_some() {}
    }
}

// SAFETY: 槽位所有权的转移完全由序号协议约束，元素从不被并发访问。
unsafe impl<T: Send> Send for MpmcRingBuffer<T> {}
unsafe impl<T: Send> Sync for MpmcRingBuffer<T> {}
