//! # 依赖注入具体实现
//!
//! 提供具体的依赖注入容器、服务注册表、解析器、单例缓存和约定扫描器实现。
//!
//! ```ignore
//! let container = DiContainerBuilder::new()
//!     .scan(candidates, &ScanRules::new().with_lifetime(Lifetime::Singleton))
//!     .build();
//! let dispenser = container.resolve::<dyn JellybeanDispenser>()?;
//! ```

pub mod cache;
pub mod container;
pub mod registry;
pub mod resolver;
pub mod scanner;

pub use cache::LifetimeCache;
pub use container::{DiContainerBuilder, DiContainerImpl, TypeRegistration};
pub use registry::ServiceRegistryImpl;
pub use resolver::ServiceResolverImpl;
pub use scanner::ConventionScannerImpl;
