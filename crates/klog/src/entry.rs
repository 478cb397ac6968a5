//! 日志条目结构
//!
//! 条目是定长的栈上结构，不依赖堆分配，可以在缓冲区槽位中就地存储。

use core::fmt;

use crate::config::MAX_LOG_MESSAGE_LENGTH;
use crate::level::LogLevel;

/// 一条日志记录：级别、上下文（CPU/任务/时间戳）和定长消息体
#[derive(Clone)]
pub struct LogEntry {
    level: LogLevel,
    cpu_id: usize,
    task_id: u32,
    timestamp: usize,
    len: usize,
    msg: [u8; MAX_LOG_MESSAGE_LENGTH],
}

impl LogEntry {
    /// 空条目，用于缓冲区槽位的编译期初始化
    pub const fn empty() -> Self {
        Self {
            level: LogLevel::Debug,
            cpu_id: 0,
            task_id: 0,
            timestamp: 0,
            len: 0,
            msg: [0; MAX_LOG_MESSAGE_LENGTH],
        }
    }

    /// 由 `format_args!` 的结果就地构造条目
    ///
    /// 消息超过 [`MAX_LOG_MESSAGE_LENGTH`] 时在 UTF-8 字符边界截断，
    /// 保证 [`Self::message`] 始终返回合法字符串。
    pub fn from_args(
        level: LogLevel,
        cpu_id: usize,
        task_id: u32,
        timestamp: usize,
        args: fmt::Arguments,
    ) -> Self {
        let mut entry = Self {
            level,
            cpu_id,
            task_id,
            timestamp,
            len: 0,
            msg: [0; MAX_LOG_MESSAGE_LENGTH],
        };

        let mut writer = TruncatingWriter {
            buf: &mut entry.msg,
            len: 0,
        };
        // TruncatingWriter 从不报错，超长内容直接丢弃
        let _ = fmt::write(&mut writer, args);
        entry.len = writer.len;
        entry
    }

    /// 日志级别
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// 记录时所在的 CPU ID
    pub fn cpu_id(&self) -> usize {
        self.cpu_id
    }

    /// 记录时的当前任务 ID（无任务时为 0）
    pub fn task_id(&self) -> u32 {
        self.task_id
    }

    /// 记录时的时间戳
    pub fn timestamp(&self) -> usize {
        self.timestamp
    }

    /// 消息体
    pub fn message(&self) -> &str {
        // from_args 按字符边界写入，这里不会失败
        core::str::from_utf8(&self.msg[..self.len]).unwrap_or("<invalid utf8>")
    }
}

/// 向定长缓冲区写入并在字符边界截断的 fmt 适配器
struct TruncatingWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl fmt::Write for TruncatingWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for ch in s.chars() {
            let ch_len = ch.len_utf8();
            if self.len + ch_len > self.buf.len() {
                break;
            }
            ch.encode_utf8(&mut self.buf[self.len..self.len + ch_len]);
            self.len += ch_len;
        }
        Ok(())
    }
}
