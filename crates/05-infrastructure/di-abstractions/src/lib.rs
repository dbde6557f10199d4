//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义服务注册和依赖解析的核心接口。
//!
//! ## 核心接口
//!
//! - [`ServiceRegistry`] - 服务注册表接口
//! - [`ServiceResolver`] - 服务解析器接口
//! - [`ConventionScanner`] - 约定扫描器接口
//! - [`DiContainer`] - 容器接口
//! - [`Factory`] - 组件工厂

pub mod container;
pub mod factory;
pub mod registry;
pub mod resolver;
pub mod scanner;

pub use container::*;
pub use factory::*;
pub use registry::*;
pub use resolver::*;
pub use scanner::*;
