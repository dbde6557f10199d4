//! # Infrastructure Common
//!
//! 这个 crate 提供了依赖注入容器共用的数据模型和错误类型。
//!
//! ## 核心类型
//!
//! - [`ServiceKey`] - 服务标识
//! - [`TypeDescriptor`] - 候选实现类型的描述
//! - [`Lifetime`] - 实例生命周期
//! - [`ComponentConventions`] - 按命名约定选择生命周期
//! - [`DependencyError`] - 解析错误
//!
//! ## 设计原则
//!
//! - 用显式的类型描述代替运行时反射
//! - 没有进程级的全局状态，每个容器独立拥有自己的注册表
//! - 约定优于配置

pub mod component;
pub mod conventions;
pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use component::*;
pub use conventions::*;
pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
