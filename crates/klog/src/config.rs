//! 日志系统配置常量

use crate::level::LogLevel;

/// 环形缓冲区可容纳的日志条目数（必须是 2 的幂）
pub const GLOBAL_LOG_BUFFER_SIZE: usize = 64;

/// 单条日志消息的最大字节数，超出部分在字符边界截断
pub const MAX_LOG_MESSAGE_LENGTH: usize = 224;

/// 默认全局日志级别：低于该级别（数值更大）的日志不进入缓冲区
pub const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Info;

/// 默认控制台输出级别：达到该级别的日志立即打印到控制台
pub const DEFAULT_CONSOLE_LEVEL: LogLevel = LogLevel::Warning;
