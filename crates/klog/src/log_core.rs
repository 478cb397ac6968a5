//! 日志系统核心实现
//!
//! 将所有日志状态封装到一个 `LogCore` 结构体中，既可以作为全局单例
//! 使用，也可以独立实例化用于测试。

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

use crate::buffer::GlobalLogBuffer;
use crate::config::{DEFAULT_CONSOLE_LEVEL, DEFAULT_LOG_LEVEL};
use crate::entry::LogEntry;
use crate::level::LogLevel;

/// 核心日志系统：环形缓冲区加两级过滤阈值
///
/// 所有方法都通过原子操作同步，无需外部加锁。
pub struct LogCore {
    /// 日志存储的无锁环形缓冲区
    buffer: GlobalLogBuffer,

    /// 全局日志级别阈值（控制日志是否进入缓冲区）
    global_level: AtomicU8,

    /// 控制台输出级别阈值（控制是否立即打印）
    console_level: AtomicU8,
}

impl LogCore {
    /// 使用默认级别创建实例；`const fn`，可用于 static 初始化
    pub const fn default() -> Self {
        Self {
            buffer: GlobalLogBuffer::new(),
            global_level: AtomicU8::new(DEFAULT_LOG_LEVEL as u8),
            console_level: AtomicU8::new(DEFAULT_CONSOLE_LEVEL as u8),
        }
    }

    /// 使用自定义级别创建实例（主要用于测试）
    pub fn new(global_level: LogLevel, console_level: LogLevel) -> Self {
        Self {
            buffer: GlobalLogBuffer::new(),
            global_level: AtomicU8::new(global_level as u8),
            console_level: AtomicU8::new(console_level as u8),
        }
    }

    /// 核心日志记录实现
    ///
    /// 1. 按全局级别过滤
    /// 2. 通过已注册的 [`crate::LogContextProvider`] 收集上下文
    /// 3. 栈上构造条目并写入缓冲区
    /// 4. 达到控制台级别时立即打印
    pub fn _log(&self, level: LogLevel, args: fmt::Arguments) {
        if !self.is_level_enabled(level) {
            return;
        }

        let (cpu_id, task_id, timestamp) = if let Some(provider) = crate::get_context_provider() {
            (provider.cpu_id(), provider.task_id(), provider.timestamp())
        } else {
            // 未注册 provider 时使用默认上下文
            (0, 0, 0)
        };

        let entry = LogEntry::from_args(level, cpu_id, task_id, timestamp, args);

        self.buffer.write(&entry);

        if self.is_console_level(level) {
            self.direct_print_entry(&entry);
        }
    }

    /// 从缓冲区读取下一个日志条目，无可读条目时返回 `None`
    pub fn _read_log(&self) -> Option<LogEntry> {
        self.buffer.read()
    }

    /// 未读日志条目数量
    pub fn _log_len(&self) -> usize {
        self.buffer.len()
    }

    /// 因缓冲区溢出被丢弃的日志计数
    pub fn _log_dropped_count(&self) -> usize {
        self.buffer.dropped_count()
    }

    /// 设置全局日志级别阈值
    pub fn _set_global_level(&self, level: LogLevel) {
        self.global_level.store(level as u8, Ordering::Release);
    }

    /// 获取当前全局日志级别
    pub fn _get_global_level(&self) -> LogLevel {
        LogLevel::from_u8(self.global_level.load(Ordering::Acquire))
    }

    /// 设置控制台输出级别阈值
    pub fn _set_console_level(&self, level: LogLevel) {
        self.console_level.store(level as u8, Ordering::Release);
    }

    /// 获取当前控制台输出级别
    pub fn _get_console_level(&self) -> LogLevel {
        LogLevel::from_u8(self.console_level.load(Ordering::Acquire))
    }

    #[inline(always)]
    fn is_level_enabled(&self, level: LogLevel) -> bool {
        level as u8 <= self.global_level.load(Ordering::Acquire)
    }

    #[inline(always)]
    fn is_console_level(&self, level: LogLevel) -> bool {
        level as u8 <= self.console_level.load(Ordering::Acquire)
    }

    /// 将日志条目带 ANSI 颜色直接打印到已注册的控制台输出
    fn direct_print_entry(&self, entry: &LogEntry) {
        if let Some(output) = crate::get_log_output() {
            let formatted = format_log_entry(entry);
            output.write_str(&formatted);
            output.write_str("\n");
        }
    }
}

/// 格式化日志条目为字符串（带 ANSI 颜色和上下文信息）
///
/// # 格式
/// ```text
/// <color>[LEVEL] [timestamp] [CPU<id>/T<tid>] message<reset>
/// ```
pub fn format_log_entry(entry: &LogEntry) -> alloc::string::String {
    use alloc::format;

    format!(
        "{}{} [{:12}] [CPU{}/T{:3}] {}{}",
        entry.level().color_code(),
        entry.level().as_str(),
        entry.timestamp(),
        entry.cpu_id(),
        entry.task_id(),
        entry.message(),
        entry.level().reset_color_code()
    )
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use super::*;

    /// Test-only logging helper (mirrors production macro behavior, but targets a local `LogCore`).
    macro_rules! test_log {
        ($logger:expr, $level:expr, $($arg:tt)*) => {
            $logger._log($level, format_args!($($arg)*))
        };
    }

    #[test]
    fn test_write_and_read() {
        let log = LogCore::new(LogLevel::Debug, LogLevel::Warning);

        test_log!(log, LogLevel::Info, "test message");

        assert_eq!(log._log_len(), 1);

        let entry = log._read_log().unwrap();
        assert_eq!(entry.message(), "test message");
        assert_eq!(entry.level(), LogLevel::Info);

        assert_eq!(log._log_len(), 0);
    }

    #[test]
    fn test_format_arguments() {
        let log = LogCore::new(LogLevel::Debug, LogLevel::Warning);

        test_log!(log, LogLevel::Info, "value: {}", 42);
        test_log!(log, LogLevel::Debug, "hex: {:#x}", 0xDEAD);

        assert_eq!(log._read_log().unwrap().message(), "value: 42");
        assert_eq!(log._read_log().unwrap().message(), "hex: 0xdead");
    }

    #[test]
    fn test_fifo_order() {
        let log = LogCore::new(LogLevel::Debug, LogLevel::Warning);

        for i in 0..5 {
            test_log!(log, LogLevel::Debug, "message {}", i);
        }

        assert_eq!(log._log_len(), 5);

        for i in 0..5 {
            let entry = log._read_log().unwrap();
            let expected = alloc::format!("message {}", i);
            assert_eq!(entry.message(), expected.as_str());
        }
    }

    #[test]
    fn test_empty_buffer_read() {
        let log = LogCore::new(LogLevel::Debug, LogLevel::Warning);

        assert_eq!(log._log_len(), 0);
        assert!(log._read_log().is_none());
        assert!(log._read_log().is_none());
    }

    #[test]
    fn test_message_truncation() {
        let log = LogCore::new(LogLevel::Debug, LogLevel::Warning);

        let long_msg = "a".repeat(300);
        test_log!(log, LogLevel::Info, "{}", long_msg);

        let entry = log._read_log().unwrap();
        assert!(entry.message().len() <= crate::MAX_LOG_MESSAGE_LENGTH);
    }

    #[test]
    fn test_utf8_message() {
        let log = LogCore::new(LogLevel::Debug, LogLevel::Warning);

        // Non-ASCII strings are intentional here to validate UTF-8 handling.
        test_log!(log, LogLevel::Info, "你好，世界！");

        assert_eq!(log._read_log().unwrap().message(), "你好，世界！");
    }

    #[test]
    fn test_global_level_filtering() {
        let log = LogCore::new(LogLevel::Warning, LogLevel::Warning);

        test_log!(log, LogLevel::Emergency, "emergency");
        test_log!(log, LogLevel::Error, "error");
        test_log!(log, LogLevel::Warning, "warning");
        test_log!(log, LogLevel::Info, "info");
        test_log!(log, LogLevel::Debug, "debug");

        assert_eq!(log._log_len(), 3);
        assert_eq!(log._read_log().unwrap().message(), "emergency");
        assert_eq!(log._read_log().unwrap().message(), "error");
        assert_eq!(log._read_log().unwrap().message(), "warning");
    }

    #[test]
    fn test_dynamic_level_change() {
        let log = LogCore::new(LogLevel::Info, LogLevel::Warning);

        test_log!(log, LogLevel::Debug, "debug1");
        test_log!(log, LogLevel::Info, "info1");

        assert_eq!(log._log_len(), 1);

        log._set_global_level(LogLevel::Debug);

        test_log!(log, LogLevel::Debug, "debug2");

        assert_eq!(log._log_len(), 2);
        assert_eq!(log._read_log().unwrap().message(), "info1");
        assert_eq!(log._read_log().unwrap().message(), "debug2");
    }

    #[test]
    fn test_buffer_overflow() {
        let log = LogCore::new(LogLevel::Debug, LogLevel::Warning);

        const TOTAL: usize = 100;
        for i in 0..TOTAL {
            test_log!(log, LogLevel::Info, "log {}", i);
        }

        let buffered = log._log_len();
        let dropped = log._log_dropped_count();

        assert!(dropped > 0);
        assert_eq!(buffered + dropped, TOTAL);
    }

    #[test]
    fn test_write_after_overflow() {
        let log = LogCore::new(LogLevel::Debug, LogLevel::Warning);

        for i in 0..100 {
            test_log!(log, LogLevel::Info, "overflow {}", i);
        }
        assert!(log._log_dropped_count() > 0);

        while log._read_log().is_some() {}

        test_log!(log, LogLevel::Info, "after overflow");

        assert_eq!(log._log_len(), 1);
        assert_eq!(log._read_log().unwrap().message(), "after overflow");
    }
}
