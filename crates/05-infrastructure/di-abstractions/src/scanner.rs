//! 约定扫描器抽象接口

use crate::registry::{Registration, ServiceRegistry};
use infrastructure_common::{
    ComponentConventions, Lifetime, NamingConventions, ScanWarning, ServiceKey, TypeDescriptor,
};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// 约定扫描器 trait
///
/// 把候选类型按规则表转换为注册信息。单个候选的问题只产生警告，不会中断扫描。
pub trait ConventionScanner: Send + Sync {
    /// 扫描候选类型
    fn scan(&self, candidates: Vec<ScanCandidate>, rules: &ScanRules) -> ScanReport;

    /// 获取扫描器名称
    fn name(&self) -> &str;
}

/// 扫描候选
#[derive(Debug, Clone)]
pub enum ScanCandidate {
    /// 可读取的类型描述
    Descriptor(TypeDescriptor),
    /// 无法读取的类型
    Unreadable {
        /// 类型名称
        type_name: String,
        /// 无法读取的原因
        reason: String,
    },
}

impl ScanCandidate {
    /// 创建无法读取的候选
    pub fn unreadable(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unreadable {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// 候选类型名称
    pub fn type_name(&self) -> &str {
        match self {
            Self::Descriptor(descriptor) => descriptor.identity().type_name(),
            Self::Unreadable { type_name, .. } => type_name,
        }
    }
}

impl From<TypeDescriptor> for ScanCandidate {
    fn from(descriptor: TypeDescriptor) -> Self {
        Self::Descriptor(descriptor)
    }
}

/// 描述符谓词
pub type DescriptorPredicate = Arc<dyn Fn(&TypeDescriptor) -> bool + Send + Sync>;

/// 生命周期选择器
pub type LifetimeSelector = Arc<dyn Fn(&TypeDescriptor) -> Lifetime + Send + Sync>;

/// 接口过滤器，返回 `true` 表示该接口不参与绑定
pub type InterfaceFilter = Arc<dyn Fn(&ServiceKey) -> bool + Send + Sync>;

/// 扫描规则表
///
/// 包含条件全部满足且排除条件都不满足的候选才会被注册。
#[derive(Clone)]
pub struct ScanRules {
    includes: Vec<DescriptorPredicate>,
    excludes: Vec<DescriptorPredicate>,
    lifetime_selector: LifetimeSelector,
    system_interface_filter: InterfaceFilter,
    singleton_services: HashSet<ServiceKey>,
    bind_self: bool,
}

impl ScanRules {
    /// 创建默认规则：全部包含、瞬时生命周期、过滤标准库接口
    pub fn new() -> Self {
        Self {
            includes: Vec::new(),
            excludes: Vec::new(),
            lifetime_selector: Arc::new(|_: &TypeDescriptor| Lifetime::Transient),
            system_interface_filter: Arc::new(NamingConventions::is_system_interface),
            singleton_services: HashSet::new(),
            bind_self: false,
        }
    }

    /// 添加包含条件
    pub fn include<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&TypeDescriptor) -> bool + Send + Sync + 'static,
    {
        self.includes.push(Arc::new(predicate));
        self
    }

    /// 添加排除条件
    pub fn exclude<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&TypeDescriptor) -> bool + Send + Sync + 'static,
    {
        self.excludes.push(Arc::new(predicate));
        self
    }

    /// 排除指定类型
    pub fn exclude_type<T: ?Sized + 'static>(self) -> Self {
        let excluded = ServiceKey::of::<T>();
        self.exclude(move |descriptor| descriptor.identity() == excluded)
    }

    /// 所有注册使用同一生命周期
    pub fn with_lifetime(self, lifetime: Lifetime) -> Self {
        self.lifetime_selector(move |_| lifetime)
    }

    /// 设置生命周期选择器
    pub fn lifetime_selector<F>(mut self, selector: F) -> Self
    where
        F: Fn(&TypeDescriptor) -> Lifetime + Send + Sync + 'static,
    {
        self.lifetime_selector = Arc::new(selector);
        self
    }

    /// 按命名约定选择生命周期
    pub fn with_conventions(self, conventions: ComponentConventions) -> Self {
        self.lifetime_selector(move |descriptor| conventions.lifetime_for(descriptor))
    }

    /// 设置系统接口过滤器
    pub fn system_interface_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&ServiceKey) -> bool + Send + Sync + 'static,
    {
        self.system_interface_filter = Arc::new(filter);
        self
    }

    /// 指定服务的注册强制为单例
    pub fn with_singleton<S: ?Sized + 'static>(mut self) -> Self {
        self.singleton_services.insert(ServiceKey::of::<S>());
        self
    }

    /// 实现了接口的类型同时注册为自身
    pub fn also_bind_self(mut self) -> Self {
        self.bind_self = true;
        self
    }

    /// 候选是否通过包含和排除条件
    pub fn accepts(&self, descriptor: &TypeDescriptor) -> bool {
        self.includes.iter().all(|include| include(descriptor))
            && !self.excludes.iter().any(|exclude| exclude(descriptor))
    }

    /// 接口是否为系统接口
    pub fn is_system_interface(&self, service_key: &ServiceKey) -> bool {
        (self.system_interface_filter)(service_key)
    }

    /// 确定注册的生命周期
    pub fn lifetime_for(&self, descriptor: &TypeDescriptor, service_key: ServiceKey) -> Lifetime {
        if self.singleton_services.contains(&service_key)
            || self.singleton_services.contains(&descriptor.identity())
        {
            return Lifetime::Singleton;
        }
        (self.lifetime_selector)(descriptor)
    }

    /// 是否同时注册为自身
    pub fn binds_self(&self) -> bool {
        self.bind_self
    }
}

impl Default for ScanRules {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ScanRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanRules")
            .field("includes", &self.includes.len())
            .field("excludes", &self.excludes.len())
            .field("singleton_services", &self.singleton_services)
            .field("bind_self", &self.bind_self)
            .finish_non_exhaustive()
    }
}

/// 扫描结果
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// 产生的注册信息
    pub registrations: Vec<Registration>,
    /// 被接受的描述符
    pub accepted: Vec<Arc<TypeDescriptor>>,
    /// 扫描警告
    pub warnings: Vec<ScanWarning>,
}

impl ScanReport {
    /// 把注册信息写入注册表，返回写入数量
    pub fn register_into(&self, registry: &mut dyn ServiceRegistry) -> usize {
        for registration in &self.registrations {
            registry.add(registration.clone());
        }
        self.registrations.len()
    }

    /// 是否没有任何警告
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
