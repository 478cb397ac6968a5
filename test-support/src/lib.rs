//! 测试支持 crate
//!
//! 提供架构层的 Mock 实现，供各 crate 的测试把它们适配到
//! 自己的架构抽象 trait 上。

#![no_std]

pub mod mock;
