//! 服务解析器抽象接口
//!
//! 提供依赖解析和组件实例化的能力

use crate::registry::RegistrationId;
use infrastructure_common::{
    downcast_instance, DependencyError, DependencyResult, Instance, ServiceKey,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_RESOLUTION_ID: AtomicU64 = AtomicU64::new(1);

/// 服务解析器 trait
///
/// 负责按服务标识选择注册、解析依赖并创建实例。
/// 所有方法都在调用方线程上同步执行。
pub trait ServiceResolver: Send + Sync {
    /// 解析服务的最后一条注册
    fn resolve_one(
        &self,
        service_key: ServiceKey,
        context: &mut ResolveContext,
    ) -> DependencyResult<Instance>;

    /// 解析服务的全部注册（按注册顺序）
    fn resolve_all(
        &self,
        service_key: ServiceKey,
        context: &mut ResolveContext,
    ) -> DependencyResult<Vec<Instance>>;

    /// 解析指定名称的注册
    fn resolve_named(
        &self,
        service_key: ServiceKey,
        name: &str,
        context: &mut ResolveContext,
    ) -> DependencyResult<Instance>;

    /// 检查是否可以解析指定服务
    fn can_resolve(&self, service_key: ServiceKey) -> bool;
}

/// 解析上下文
///
/// 每次顶层解析调用创建一个，沿依赖链向下传递。
#[derive(Debug)]
pub struct ResolveContext {
    /// 解析标识，在进程内唯一
    resolution_id: u64,
    /// 当前解析链，用于检测循环依赖
    resolution_chain: Vec<ServiceKey>,
    /// 正在创建的单例注册
    pending_singletons: Vec<RegistrationId>,
    /// 解析选项
    options: ResolveOptions,
}

impl ResolveContext {
    /// 创建新的解析上下文
    pub fn new(options: ResolveOptions) -> Self {
        Self {
            resolution_id: NEXT_RESOLUTION_ID.fetch_add(1, Ordering::Relaxed),
            resolution_chain: Vec::new(),
            pending_singletons: Vec::new(),
            options,
        }
    }

    /// 解析标识
    ///
    /// 单例缓存用它记录哪个解析正在创建哪个单例。
    pub fn resolution_id(&self) -> u64 {
        self.resolution_id
    }

    /// 添加服务到解析链
    pub fn push_key(&mut self, service_key: ServiceKey) -> DependencyResult<()> {
        if self.options.detect_cycles && self.resolution_chain.contains(&service_key) {
            return Err(DependencyError::CyclicDependency {
                chain: self.describe_chain(service_key),
            });
        }

        if self.resolution_chain.len() >= self.options.max_depth {
            return Err(DependencyError::ResolutionDepthExceeded {
                depth: self.options.max_depth,
                chain: self.describe_chain(service_key),
            });
        }

        self.resolution_chain.push(service_key);
        Ok(())
    }

    /// 从解析链中移除服务
    pub fn pop_key(&mut self) {
        self.resolution_chain.pop();
    }

    /// 标记单例开始创建
    ///
    /// 同一单例在自身创建过程中再次被请求时总是报告循环依赖，
    /// 与是否启用循环检测无关。
    pub fn begin_singleton(&mut self, id: RegistrationId) -> DependencyResult<()> {
        if self.pending_singletons.contains(&id) {
            return Err(DependencyError::CyclicDependency {
                chain: self.describe_chain(id.service_key),
            });
        }
        self.pending_singletons.push(id);
        Ok(())
    }

    /// 标记单例创建结束
    pub fn end_singleton(&mut self) {
        self.pending_singletons.pop();
    }

    /// 当前解析深度
    pub fn depth(&self) -> usize {
        self.resolution_chain.len()
    }

    /// 当前解析链
    pub fn chain(&self) -> &[ServiceKey] {
        &self.resolution_chain
    }

    /// 解析选项
    pub fn options(&self) -> ResolveOptions {
        self.options
    }

    /// 描述解析链，格式为 `A -> B -> A`
    pub fn describe_chain(&self, next: ServiceKey) -> String {
        self.resolution_chain
            .iter()
            .chain(std::iter::once(&next))
            .map(|key| key.type_name())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

impl Default for ResolveContext {
    fn default() -> Self {
        Self::new(ResolveOptions::default())
    }
}

/// 解析选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// 是否检测循环依赖
    pub detect_cycles: bool,
    /// 最大递归深度
    pub max_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            detect_cycles: true,
            max_depth: 100,
        }
    }
}

/// 注入器
///
/// 传给 lambda 工厂，工厂通过它解析自己的依赖，
/// 依赖链和循环检测因此能够跨越工厂边界。
pub struct Injector<'a> {
    resolver: &'a dyn ServiceResolver,
    context: &'a mut ResolveContext,
}

impl<'a> Injector<'a> {
    /// 创建注入器
    pub fn new(resolver: &'a dyn ServiceResolver, context: &'a mut ResolveContext) -> Self {
        Self { resolver, context }
    }

    /// 解析服务
    pub fn resolve<T>(&mut self) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let instance = self.resolve_key(ServiceKey::of::<T>())?;
        downcast_instance::<T>(&instance)
    }

    /// 解析服务的全部实现
    pub fn resolve_all<T>(&mut self) -> DependencyResult<Vec<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolver
            .resolve_all(ServiceKey::of::<T>(), self.context)?
            .iter()
            .map(downcast_instance::<T>)
            .collect()
    }

    /// 解析指定名称的服务
    pub fn resolve_named<T>(&mut self, name: &str) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let instance = self
            .resolver
            .resolve_named(ServiceKey::of::<T>(), name, self.context)?;
        downcast_instance::<T>(&instance)
    }

    /// 按服务标识解析
    pub fn resolve_key(&mut self, service_key: ServiceKey) -> DependencyResult<Instance> {
        self.resolver.resolve_one(service_key, self.context)
    }

    /// 当前解析深度
    pub fn depth(&self) -> usize {
        self.context.depth()
    }
}
