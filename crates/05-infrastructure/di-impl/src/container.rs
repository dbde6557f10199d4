//! 依赖注入容器实现

use crate::registry::ServiceRegistryImpl;
use crate::resolver::ServiceResolverImpl;
use crate::scanner::ConventionScannerImpl;
use di_abstractions::{
    ContainerConfig, ContainerStats, ConventionScanner, DiContainer, Factory, Injector,
    Registration, ResolveContext, ScanCandidate, ScanRules, ServiceRegistry, ServiceResolver,
};
use infrastructure_common::{
    erase, DependencyError, DependencyResult, Instance, Lifetime, NamingConventions,
    ScanWarning, ServiceKey, TypeDescriptor,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 具体的依赖注入容器实现
pub struct DiContainerImpl {
    /// 容器标识
    id: Uuid,
    resolver: ServiceResolverImpl,
    scan_warnings: RwLock<Vec<ScanWarning>>,
    resolutions: AtomicU64,
    resolution_errors: AtomicU64,
}

impl DiContainerImpl {
    /// 创建容器构建器
    pub fn builder() -> DiContainerBuilder {
        DiContainerBuilder::new()
    }

    /// 容器标识
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        self.resolver.config()
    }

    /// 构建和更新过程中收集的扫描警告
    pub fn scan_warnings(&self) -> Vec<ScanWarning> {
        self.scan_warnings.read().clone()
    }

    /// 合并另一个构建器中的注册
    ///
    /// 新注册追加在现有注册之后，已创建的单例不受影响。
    /// 返回合并的注册数量。构建器自身的配置和扫描器被忽略。
    pub fn update(&self, builder: DiContainerBuilder) -> usize {
        let DiContainerBuilder {
            registry,
            descriptors,
            scan_warnings,
            ..
        } = builder;

        let merged = registry.len();
        self.resolver.extend(registry, descriptors);
        self.scan_warnings.write().extend(scan_warnings);

        info!(
            "容器已更新: {} (新增 {} 条注册, 共 {} 条)",
            self.id,
            merged,
            self.resolver.registration_count()
        );
        merged
    }

    fn context(&self) -> ResolveContext {
        ResolveContext::new(self.config().resolve_options())
    }

    fn track<T>(&self, service_key: ServiceKey, result: DependencyResult<T>) -> DependencyResult<T> {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        if let Err(error) = &result {
            self.resolution_errors.fetch_add(1, Ordering::Relaxed);
            debug!("解析失败: {} ({})", service_key, error);
        }
        result
    }
}

impl DiContainer for DiContainerImpl {
    fn resolve_key(&self, service_key: ServiceKey) -> DependencyResult<Instance> {
        let mut context = self.context();
        let result = self.resolver.resolve_one(service_key, &mut context);
        self.track(service_key, result)
    }

    fn resolve_all_key(&self, service_key: ServiceKey) -> DependencyResult<Vec<Instance>> {
        let mut context = self.context();
        let result = self.resolver.resolve_all(service_key, &mut context);
        self.track(service_key, result)
    }

    fn resolve_named_key(&self, service_key: ServiceKey, name: &str) -> DependencyResult<Instance> {
        let mut context = self.context();
        let result = self.resolver.resolve_named(service_key, name, &mut context);
        self.track(service_key, result)
    }

    fn is_registered(&self, service_key: ServiceKey) -> bool {
        self.resolver.is_registered(service_key)
    }

    fn registered_services(&self) -> Vec<ServiceKey> {
        self.resolver.registered_services()
    }

    fn stats(&self) -> ContainerStats {
        ContainerStats {
            registrations: self.resolver.registration_count(),
            registered_services: self.resolver.registered_services().len(),
            active_singletons: self.resolver.active_singletons(),
            resolutions: self.resolutions.load(Ordering::Relaxed),
            resolution_errors: self.resolution_errors.load(Ordering::Relaxed),
            scan_warnings: self.scan_warnings.read().len(),
        }
    }

    fn validate(&self) -> Result<(), Vec<DependencyError>> {
        let errors = self.resolver.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            warn!("容器验证失败: {} ({} 个问题)", self.id, errors.len());
            Err(errors)
        }
    }
}

impl std::fmt::Debug for DiContainerImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiContainerImpl")
            .field("id", &self.id)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// 容器构建器
pub struct DiContainerBuilder {
    registry: ServiceRegistryImpl,
    descriptors: Vec<Arc<TypeDescriptor>>,
    scan_warnings: Vec<ScanWarning>,
    config: ContainerConfig,
    scanner: Box<dyn ConventionScanner>,
}

impl DiContainerBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            registry: ServiceRegistryImpl::new(),
            descriptors: Vec::new(),
            scan_warnings: Vec::new(),
            config: ContainerConfig::default(),
            scanner: Box::new(ConventionScannerImpl::new()),
        }
    }

    /// 添加原始注册
    pub fn register(mut self, registration: Registration) -> Self {
        self.registry.add(registration);
        self
    }

    /// 注册工厂函数
    pub fn register_factory<S, F>(self, lifetime: Lifetime, factory: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&mut Injector<'_>) -> DependencyResult<Arc<S>> + Send + Sync + 'static,
    {
        info!("注册工厂: {} ({})", std::any::type_name::<S>(), lifetime);
        self.register(Registration::new(
            ServiceKey::of::<S>(),
            Factory::lambda(factory),
            lifetime,
        ))
    }

    /// 注册单例实例
    pub fn register_instance<S>(self, instance: Arc<S>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        info!("注册单例实例: {}", std::any::type_name::<S>());
        self.register(Registration::new(
            ServiceKey::of::<S>(),
            Factory::instance(instance),
            Lifetime::Singleton,
        ))
    }

    /// 注册类型描述符
    ///
    /// `configure` 决定绑定的服务、生命周期、名称和常量参数，默认注册为自身、瞬时。
    pub fn register_type<C>(mut self, descriptor: TypeDescriptor, configure: C) -> Self
    where
        C: FnOnce(TypeRegistration) -> TypeRegistration,
    {
        let descriptor = Arc::new(descriptor);
        if !descriptor.is_constructible() {
            warn!("注册的类型无法构造: {}", descriptor.identity());
        }

        let registration = configure(TypeRegistration::new(descriptor.clone()));
        for registration in registration.into_registrations() {
            info!(
                "注册类型: {} -> {} ({})",
                registration.service_key,
                registration.implementation_name(),
                registration.lifetime
            );
            self.registry.add(registration);
        }
        self.descriptors.push(descriptor);
        self
    }

    /// 登记已知类型，不产生注册
    ///
    /// 启用隐式注册时，这些具体类型在未注册的情况下也能被解析为瞬时实例。
    pub fn with_known_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.descriptors.push(Arc::new(descriptor));
        self
    }

    /// 按约定扫描候选类型
    pub fn scan<I>(mut self, candidates: I, rules: &ScanRules) -> Self
    where
        I: IntoIterator<Item = ScanCandidate>,
    {
        let report = self.scanner.scan(candidates.into_iter().collect(), rules);
        report.register_into(&mut self.registry);
        self.descriptors.extend(report.accepted);
        self.scan_warnings.extend(report.warnings);
        self
    }

    /// 设置容器配置
    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// 设置约定扫描器
    pub fn with_scanner(mut self, scanner: Box<dyn ConventionScanner>) -> Self {
        self.scanner = scanner;
        self
    }

    /// 构建容器
    pub fn build(self) -> DiContainerImpl {
        let id = Uuid::new_v4();
        let registrations = self.registry.len();
        let warnings = self.scan_warnings.len();
        let scanner = self.scanner.name().to_string();

        let container = DiContainerImpl {
            id,
            resolver: ServiceResolverImpl::new(self.registry, self.descriptors, self.config),
            scan_warnings: RwLock::new(self.scan_warnings),
            resolutions: AtomicU64::new(0),
            resolution_errors: AtomicU64::new(0),
        };

        info!(
            "容器构建完成: {} ({} 条注册, {} 条扫描警告, 扫描器 {})",
            id,
            registrations,
            warnings,
            scanner
        );
        container
    }
}

impl Default for DiContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 类型注册配置
///
/// 由 [`DiContainerBuilder::register_type`] 使用。
pub struct TypeRegistration {
    descriptor: Arc<TypeDescriptor>,
    services: Vec<ServiceKey>,
    arguments: HashMap<String, Instance>,
    lifetime: Lifetime,
    name: Option<String>,
}

impl TypeRegistration {
    fn new(descriptor: Arc<TypeDescriptor>) -> Self {
        Self {
            descriptor,
            services: Vec::new(),
            arguments: HashMap::new(),
            lifetime: Lifetime::Transient,
            name: None,
        }
    }

    fn bind(mut self, service_key: ServiceKey) -> Self {
        if !self.services.contains(&service_key) {
            self.services.push(service_key);
        }
        self
    }

    /// 注册为自身
    pub fn as_self(self) -> Self {
        let identity = self.descriptor.identity();
        self.bind(identity)
    }

    /// 注册为指定服务
    pub fn as_service<S: ?Sized + 'static>(self) -> Self {
        let service_key = ServiceKey::of::<S>();
        if service_key != self.descriptor.identity() && !self.descriptor.implements(service_key) {
            warn!(
                "类型 {} 没有声明实现 {}，解析时将失败",
                self.descriptor.identity(),
                service_key
            );
        }
        self.bind(service_key)
    }

    /// 注册为实现的全部接口（系统接口除外）
    pub fn as_implemented_interfaces(self) -> Self {
        let interfaces: Vec<ServiceKey> = self
            .descriptor
            .interfaces()
            .filter(|service_key| !NamingConventions::is_system_interface(service_key))
            .collect();
        interfaces
            .into_iter()
            .fold(self, |registration, service_key| registration.bind(service_key))
    }

    /// 绑定构造参数
    ///
    /// 值按具体类型 `V` 保存，适用于标量参数和具体类型的依赖。
    pub fn with_argument<V>(mut self, name: impl Into<String>, value: V) -> Self
    where
        V: Send + Sync + 'static,
    {
        self.arguments.insert(name.into(), erase(Arc::new(value)));
        self
    }

    /// 以现成实例绑定依赖参数，不再从容器解析
    ///
    /// `S` 可以是 trait 对象，参数按 `Arc<S>` 读取。
    pub fn with_dependency<S>(mut self, name: impl Into<String>, dependency: Arc<S>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.arguments.insert(name.into(), erase(dependency));
        self
    }

    /// 设置注册名称
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 单例生命周期
    pub fn singleton(self) -> Self {
        self.with_lifetime(Lifetime::Singleton)
    }

    /// 瞬时生命周期
    pub fn transient(self) -> Self {
        self.with_lifetime(Lifetime::Transient)
    }

    /// 设置生命周期
    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    fn into_registrations(self) -> Vec<Registration> {
        let services = if self.services.is_empty() {
            vec![self.descriptor.identity()]
        } else {
            self.services
        };

        let factory = Factory::Constructor {
            descriptor: self.descriptor,
            arguments: Arc::new(self.arguments),
        };

        services
            .into_iter()
            .map(|service_key| {
                let registration = Registration::new(service_key, factory.clone(), self.lifetime);
                match &self.name {
                    Some(name) => registration.named(name.clone()),
                    None => registration,
                }
            })
            .collect()
    }
}
