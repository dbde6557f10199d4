//! 服务解析器实现

use crate::cache::LifetimeCache;
use crate::registry::ServiceRegistryImpl;
use di_abstractions::{
    CircularDependencyDetector, ContainerConfig, DefaultCircularDependencyDetector, Factory,
    Injector, Registration, ResolveContext, ServiceRegistry, ServiceResolver,
};
use infrastructure_common::{
    DependencyError, DependencyResult, Instance, Lifetime, ParameterKind, ResolvedArgument,
    ResolvedArguments, ServiceKey, TypeDescriptor,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// 默认服务解析器
///
/// 持有注册表、已知类型目录和单例缓存。注册信息在执行任何工厂之前
/// 从锁中克隆出来，工厂执行期间不持有注册表锁。
#[derive(Debug)]
pub struct ServiceResolverImpl {
    registry: RwLock<ServiceRegistryImpl>,
    catalog: RwLock<HashMap<ServiceKey, Arc<TypeDescriptor>>>,
    cache: LifetimeCache,
    config: ContainerConfig,
}

impl ServiceResolverImpl {
    /// 创建解析器
    pub fn new(
        registry: ServiceRegistryImpl,
        descriptors: Vec<Arc<TypeDescriptor>>,
        config: ContainerConfig,
    ) -> Self {
        let resolver = Self {
            registry: RwLock::new(registry),
            catalog: RwLock::new(HashMap::new()),
            cache: LifetimeCache::new(),
            config,
        };
        resolver.remember(descriptors);
        resolver
    }

    /// 合并新的注册和已知类型
    ///
    /// 只追加，已创建的单例保持不变。
    pub fn extend(&self, registry: ServiceRegistryImpl, descriptors: Vec<Arc<TypeDescriptor>>) {
        self.registry.write().merge(registry);
        self.remember(descriptors);
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// 注册总数
    pub fn registration_count(&self) -> usize {
        self.registry.read().len()
    }

    /// 已注册的服务标识
    pub fn registered_services(&self) -> Vec<ServiceKey> {
        self.registry.read().registered_services()
    }

    /// 检查服务是否有显式注册
    pub fn is_registered(&self, service_key: ServiceKey) -> bool {
        self.registry.read().contains(service_key)
    }

    /// 已创建的单例数量
    pub fn active_singletons(&self) -> usize {
        self.cache.len()
    }

    /// 静态验证基于构造函数的注册
    pub fn validate(&self) -> Vec<DependencyError> {
        let registrations = self.registry.read().registrations();
        let mut errors = Vec::new();

        let detector = DefaultCircularDependencyDetector;
        let graph = detector.build_dependency_graph(&registrations);
        if let Err(error) = detector.detect_circular_dependencies(&graph) {
            errors.push(error);
        }

        for registration in &registrations {
            let Factory::Constructor {
                descriptor,
                arguments,
            } = &registration.factory
            else {
                continue;
            };

            for parameter in descriptor.constructor().parameters() {
                if arguments.contains_key(&parameter.name) {
                    continue;
                }
                match parameter.kind {
                    ParameterKind::Scalar => errors.push(DependencyError::MissingArgument {
                        type_name: descriptor.identity().type_name().to_string(),
                        parameter: parameter.name.clone(),
                    }),
                    ParameterKind::SingleDependency if !self.can_resolve(parameter.service_key) => {
                        errors.push(DependencyError::unregistered(
                            parameter.service_key.type_name(),
                        ));
                    }
                    _ => {}
                }
            }
        }

        errors
    }

    fn remember(&self, descriptors: Vec<Arc<TypeDescriptor>>) {
        let mut catalog = self.catalog.write();
        for descriptor in descriptors {
            catalog.insert(descriptor.identity(), descriptor);
        }
    }

    /// 按注册的生命周期获取实例
    fn instantiate(
        &self,
        registration: &Registration,
        context: &mut ResolveContext,
    ) -> DependencyResult<Instance> {
        context.push_key(registration.service_key)?;

        let result = match registration.lifetime {
            Lifetime::Singleton => self.instantiate_singleton(registration, context),
            Lifetime::Transient => self.create(registration, context),
        };

        context.pop_key();
        result
    }

    fn instantiate_singleton(
        &self,
        registration: &Registration,
        context: &mut ResolveContext,
    ) -> DependencyResult<Instance> {
        let id = registration.id();
        if let Some(instance) = self.cache.get(&id) {
            return Ok(instance);
        }

        context.begin_singleton(id)?;
        let owner = context.resolution_id();
        let result = self
            .cache
            .get_or_create(id, owner, || self.create(registration, context));
        context.end_singleton();

        if result.is_ok() {
            debug!(
                "单例已创建: {} (实现: {})",
                registration.service_key,
                registration.implementation_name()
            );
        }
        result
    }

    /// 调用注册的工厂创建实例
    fn create(
        &self,
        registration: &Registration,
        context: &mut ResolveContext,
    ) -> DependencyResult<Instance> {
        match &registration.factory {
            Factory::Instance(instance) => Ok(instance.clone()),
            Factory::Lambda(factory) => {
                let mut injector = Injector::new(self, context);
                factory(&mut injector)
            }
            Factory::Constructor {
                descriptor,
                arguments,
            } => {
                let concrete = self.construct(descriptor, arguments, context)?;
                descriptor.cast(&concrete, registration.service_key)
            }
        }
    }

    /// 解析构造参数并激活具体类型
    fn construct(
        &self,
        descriptor: &TypeDescriptor,
        arguments: &HashMap<String, Instance>,
        context: &mut ResolveContext,
    ) -> DependencyResult<Instance> {
        let mut resolved = ResolvedArguments::new(descriptor.identity());

        for parameter in descriptor.constructor().parameters() {
            if let Some(value) = arguments.get(&parameter.name) {
                resolved.push(parameter.name.clone(), ResolvedArgument::Value(value.clone()));
                continue;
            }

            let argument = match parameter.kind {
                ParameterKind::Scalar => {
                    return Err(DependencyError::MissingArgument {
                        type_name: descriptor.identity().type_name().to_string(),
                        parameter: parameter.name.clone(),
                    })
                }
                ParameterKind::SingleDependency => {
                    ResolvedArgument::Single(self.resolve_one(parameter.service_key, context)?)
                }
                ParameterKind::MultiDependency => {
                    ResolvedArgument::Many(self.resolve_all(parameter.service_key, context)?)
                }
            };
            resolved.push(parameter.name.clone(), argument);
        }

        descriptor.activate(&resolved)
    }

    /// 为未注册的具体类型创建瞬时实例
    fn resolve_implicit(
        &self,
        service_key: ServiceKey,
        context: &mut ResolveContext,
    ) -> DependencyResult<Instance> {
        if !self.config.enable_implicit_registration {
            return Err(DependencyError::unregistered(service_key.type_name()));
        }

        let descriptor = self
            .catalog
            .read()
            .get(&service_key)
            .filter(|descriptor| descriptor.is_constructible())
            .cloned()
            .ok_or_else(|| DependencyError::unregistered(service_key.type_name()))?;

        warn!("服务未注册，按具体类型隐式创建瞬时实例: {}", service_key);

        context.push_key(service_key)?;
        let result = self.construct(&descriptor, &HashMap::new(), context);
        context.pop_key();
        result
    }
}

impl ServiceResolver for ServiceResolverImpl {
    fn resolve_one(
        &self,
        service_key: ServiceKey,
        context: &mut ResolveContext,
    ) -> DependencyResult<Instance> {
        let registration = self.registry.read().last(service_key);

        match registration {
            Some(registration) => {
                debug!(
                    "解析服务: {} ({}, 序号 {})",
                    service_key, registration.lifetime, registration.ordinal
                );
                self.instantiate(&registration, context)
            }
            None => self.resolve_implicit(service_key, context),
        }
    }

    fn resolve_all(
        &self,
        service_key: ServiceKey,
        context: &mut ResolveContext,
    ) -> DependencyResult<Vec<Instance>> {
        let registrations = self
            .registry
            .read()
            .lookup(service_key)
            .unwrap_or_default();

        debug!("解析全部实现: {} ({} 个)", service_key, registrations.len());

        registrations
            .iter()
            .map(|registration| self.instantiate(registration, context))
            .collect()
    }

    fn resolve_named(
        &self,
        service_key: ServiceKey,
        name: &str,
        context: &mut ResolveContext,
    ) -> DependencyResult<Instance> {
        let registration = self
            .registry
            .read()
            .last_named(service_key, name)
            .ok_or_else(|| {
                DependencyError::unregistered(format!("{}[{}]", service_key, name))
            })?;

        debug!("解析命名服务: {} [{}]", service_key, name);
        self.instantiate(&registration, context)
    }

    fn can_resolve(&self, service_key: ServiceKey) -> bool {
        if self.is_registered(service_key) {
            return true;
        }

        self.config.enable_implicit_registration
            && self
                .catalog
                .read()
                .get(&service_key)
                .is_some_and(|descriptor| descriptor.is_constructible())
    }
}
