//! 依赖注入容器抽象接口
//!
//! 提供依赖注入容器的核心抽象

use crate::resolver::ResolveOptions;
use infrastructure_common::{
    downcast_instance, DependencyError, DependencyResult, Instance, ServiceKey,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 依赖注入容器 trait
///
/// 类型化的解析方法建立在按服务标识解析的方法之上。
pub trait DiContainer: Send + Sync {
    /// 按服务标识解析（最后一条注册）
    fn resolve_key(&self, service_key: ServiceKey) -> DependencyResult<Instance>;

    /// 按服务标识解析全部注册
    fn resolve_all_key(&self, service_key: ServiceKey) -> DependencyResult<Vec<Instance>>;

    /// 按服务标识和名称解析
    fn resolve_named_key(&self, service_key: ServiceKey, name: &str) -> DependencyResult<Instance>;

    /// 检查是否已注册服务
    fn is_registered(&self, service_key: ServiceKey) -> bool;

    /// 获取所有已注册的服务标识
    fn registered_services(&self) -> Vec<ServiceKey>;

    /// 获取容器统计信息
    fn stats(&self) -> ContainerStats;

    /// 验证容器状态
    fn validate(&self) -> Result<(), Vec<DependencyError>>;

    /// 解析服务
    fn resolve<T>(&self) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
        Self: Sized,
    {
        let instance = self.resolve_key(ServiceKey::of::<T>())?;
        downcast_instance::<T>(&instance)
    }

    /// 解析服务的全部实现（按注册顺序）
    fn resolve_all<T>(&self) -> DependencyResult<Vec<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
        Self: Sized,
    {
        self.resolve_all_key(ServiceKey::of::<T>())?
            .iter()
            .map(downcast_instance::<T>)
            .collect()
    }

    /// 解析指定名称的服务
    fn resolve_named<T>(&self, name: &str) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
        Self: Sized,
    {
        let instance = self.resolve_named_key(ServiceKey::of::<T>(), name)?;
        downcast_instance::<T>(&instance)
    }

    /// 检查类型是否已注册
    fn is_registered_type<T>(&self) -> bool
    where
        T: ?Sized + 'static,
        Self: Sized,
    {
        self.is_registered(ServiceKey::of::<T>())
    }
}

/// 容器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 是否启用循环依赖检测
    pub enable_circular_dependency_detection: bool,
    /// 最大解析深度
    pub max_resolution_depth: usize,
    /// 是否为未注册的具体类型隐式创建瞬时实例
    pub enable_implicit_registration: bool,
}

impl ContainerConfig {
    /// 严格模式：只解析显式注册的服务
    pub fn strict() -> Self {
        Self {
            enable_implicit_registration: false,
            ..Self::default()
        }
    }

    /// 设置最大解析深度
    pub fn with_max_resolution_depth(mut self, depth: usize) -> Self {
        self.max_resolution_depth = depth;
        self
    }

    /// 设置是否启用循环依赖检测
    pub fn with_circular_dependency_detection(mut self, enabled: bool) -> Self {
        self.enable_circular_dependency_detection = enabled;
        self
    }

    /// 设置是否启用隐式注册
    pub fn with_implicit_registration(mut self, enabled: bool) -> Self {
        self.enable_implicit_registration = enabled;
        self
    }

    /// 转换为解析选项
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            detect_cycles: self.enable_circular_dependency_detection,
            max_depth: self.max_resolution_depth,
        }
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            enable_circular_dependency_detection: true,
            max_resolution_depth: 100,
            enable_implicit_registration: true,
        }
    }
}

/// 容器统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContainerStats {
    /// 注册总数
    pub registrations: usize,
    /// 已注册服务数量
    pub registered_services: usize,
    /// 活跃单例数量
    pub active_singletons: usize,
    /// 顶层解析次数
    pub resolutions: u64,
    /// 解析错误数量
    pub resolution_errors: u64,
    /// 扫描警告数量
    pub scan_warnings: usize,
}
