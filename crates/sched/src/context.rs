//! 任务执行上下文
//!
//! 保存内核线程切换时的被调用者保存寄存器。结构体本身只是存储，
//! 读写它的只有架构层的切换原语（通过 [`crate::ContextOps`]）。

/// 任务上下文：切换时保存的内核栈指针与 Callee-Saved 寄存器
#[repr(C)]
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// 返回地址（任务恢复执行的位置）
    pub ra: usize,
    /// 内核栈指针
    pub sp: usize,
    /// 被调用者保存寄存器 s0..s11
    pub s: [usize; 12],
}

impl TaskContext {
    /// 全零上下文，由架构层在任务创建时填充
    pub const fn zeroed() -> Self {
        Self {
            ra: 0,
            sp: 0,
            s: [0; 12],
        }
    }
}

impl Default for TaskContext {
    fn default() -> Self {
        Self::zeroed()
    }
}
