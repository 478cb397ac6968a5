//! 日志级别定义
//!
//! 级别数值越小，严重程度越高（与 Linux 内核 printk 级别一致）。

/// 日志级别（从 Emergency 到 Debug）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    /// 系统不可用
    Emergency = 0,
    /// 必须立即处理
    Alert = 1,
    /// 严重错误
    Critical = 2,
    /// 错误
    Error = 3,
    /// 警告
    Warning = 4,
    /// 正常但值得注意
    Notice = 5,
    /// 信息
    Info = 6,
    /// 调试
    Debug = 7,
}

impl LogLevel {
    /// 从 u8 转换为 LogLevel，越界值按 Debug 处理
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Emergency,
            1 => LogLevel::Alert,
            2 => LogLevel::Critical,
            3 => LogLevel::Error,
            4 => LogLevel::Warning,
            5 => LogLevel::Notice,
            6 => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }

    /// 级别的固定宽度字符串表示（用于格式化输出）
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Emergency => "EMERG",
            LogLevel::Alert => "ALERT",
            LogLevel::Critical => "CRIT",
            LogLevel::Error => "ERR",
            LogLevel::Warning => "WARN",
            LogLevel::Notice => "NOTICE",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// 该级别对应的 ANSI 颜色码
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Emergency | LogLevel::Alert | LogLevel::Critical => "\x1b[1;31m",
            LogLevel::Error => "\x1b[31m",
            LogLevel::Warning => "\x1b[33m",
            LogLevel::Notice => "\x1b[36m",
            LogLevel::Info => "\x1b[37m",
            LogLevel::Debug => "\x1b[90m",
        }
    }

    /// ANSI 颜色复位码
    pub fn reset_color_code(&self) -> &'static str {
        "\x1b[0m"
    }
}
