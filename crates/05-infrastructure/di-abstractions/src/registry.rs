//! 服务注册表抽象接口

use crate::factory::Factory;
use infrastructure_common::{
    DependencyError, DependencyResult, Lifetime, ParameterKind, ServiceKey,
};
use std::collections::{HashMap, HashSet};

/// 注册标识
///
/// 服务标识加序号唯一确定一条注册，单例缓存以此为键。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId {
    /// 服务标识
    pub service_key: ServiceKey,
    /// 注册序号
    pub ordinal: u64,
}

/// 服务注册信息
#[derive(Clone)]
pub struct Registration {
    /// 服务标识
    pub service_key: ServiceKey,
    /// 实现类型（如果已知）
    pub implementation: Option<ServiceKey>,
    /// 实例工厂
    pub factory: Factory,
    /// 生命周期
    pub lifetime: Lifetime,
    /// 注册序号，由注册表在插入时分配
    pub ordinal: u64,
    /// 注册名称
    pub name: Option<String>,
}

impl Registration {
    /// 创建新的注册信息
    pub fn new(service_key: ServiceKey, factory: Factory, lifetime: Lifetime) -> Self {
        Self {
            service_key,
            implementation: factory.implementation(),
            factory,
            lifetime,
            ordinal: 0,
            name: None,
        }
    }

    /// 设置注册名称
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 注册标识
    pub fn id(&self) -> RegistrationId {
        RegistrationId {
            service_key: self.service_key,
            ordinal: self.ordinal,
        }
    }

    /// 用于日志和错误信息的实现名称
    pub fn implementation_name(&self) -> &'static str {
        self.implementation
            .unwrap_or(self.service_key)
            .type_name()
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("service_key", &self.service_key)
            .field("implementation", &self.implementation)
            .field("lifetime", &self.lifetime)
            .field("ordinal", &self.ordinal)
            .field("name", &self.name)
            .field("factory", &self.factory)
            .finish()
    }
}

/// 服务注册表 trait
///
/// 按服务标识保存注册信息，保留插入顺序。同一标识下的多条注册即多重绑定。
pub trait ServiceRegistry: Send + Sync {
    /// 追加注册，返回分配的序号
    fn add(&mut self, registration: Registration) -> u64;

    /// 查找服务标识下的全部注册（按注册顺序）
    fn lookup(&self, service_key: ServiceKey) -> DependencyResult<Vec<Registration>>;

    /// 最后一条注册
    fn last(&self, service_key: ServiceKey) -> Option<Registration>;

    /// 指定名称的最后一条注册
    fn last_named(&self, service_key: ServiceKey, name: &str) -> Option<Registration>;

    /// 检查服务是否已注册
    fn contains(&self, service_key: ServiceKey) -> bool;

    /// 所有已注册的服务标识（按首次注册顺序）
    fn registered_services(&self) -> Vec<ServiceKey>;

    /// 注册总数
    fn len(&self) -> usize;

    /// 注册表是否为空
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 合并另一个注册表，追加到现有注册之后
    fn merge(&mut self, other: Self)
    where
        Self: Sized;
}

/// 依赖图节点
#[derive(Debug, Clone)]
pub struct DependencyGraphNode {
    /// 服务标识
    pub service_key: ServiceKey,
    /// 依赖的服务标识列表
    pub dependencies: Vec<ServiceKey>,
}

/// 循环依赖检测器
pub trait CircularDependencyDetector: Send + Sync {
    /// 检测循环依赖
    fn detect_circular_dependencies(&self, graph: &[DependencyGraphNode]) -> DependencyResult<()>;

    /// 构建依赖图
    fn build_dependency_graph(&self, registrations: &[Registration]) -> Vec<DependencyGraphNode>;
}

/// 默认循环依赖检测器
///
/// 只能看到基于构造函数签名的注册，lambda 工厂的依赖在解析时才会暴露。
#[derive(Debug, Default)]
pub struct DefaultCircularDependencyDetector;

impl CircularDependencyDetector for DefaultCircularDependencyDetector {
    fn detect_circular_dependencies(&self, graph: &[DependencyGraphNode]) -> DependencyResult<()> {
        // 使用深度优先搜索检测循环依赖
        let edges: HashMap<ServiceKey, &[ServiceKey]> = graph
            .iter()
            .map(|node| (node.service_key, node.dependencies.as_slice()))
            .collect();
        let mut visited = HashSet::new();
        let mut path = Vec::new();

        for node in graph {
            if !visited.contains(&node.service_key) {
                self.dfs_check(node.service_key, &edges, &mut visited, &mut path)?;
            }
        }

        Ok(())
    }

    fn build_dependency_graph(&self, registrations: &[Registration]) -> Vec<DependencyGraphNode> {
        let mut nodes: Vec<DependencyGraphNode> = Vec::new();

        for registration in registrations {
            let dependencies = match &registration.factory {
                Factory::Constructor {
                    descriptor,
                    arguments,
                } => descriptor
                    .constructor()
                    .parameters()
                    .iter()
                    .filter(|parameter| parameter.kind != ParameterKind::Scalar)
                    .filter(|parameter| !arguments.contains_key(&parameter.name))
                    .map(|parameter| parameter.service_key)
                    .collect::<Vec<_>>(),
                _ => Vec::new(),
            };

            // 同一服务的多条注册合并为一个节点
            match nodes
                .iter_mut()
                .find(|node| node.service_key == registration.service_key)
            {
                Some(node) => {
                    for dependency in dependencies {
                        if !node.dependencies.contains(&dependency) {
                            node.dependencies.push(dependency);
                        }
                    }
                }
                None => nodes.push(DependencyGraphNode {
                    service_key: registration.service_key,
                    dependencies,
                }),
            }
        }

        nodes
    }
}

impl DefaultCircularDependencyDetector {
    fn dfs_check(
        &self,
        current: ServiceKey,
        edges: &HashMap<ServiceKey, &[ServiceKey]>,
        visited: &mut HashSet<ServiceKey>,
        path: &mut Vec<ServiceKey>,
    ) -> DependencyResult<()> {
        if path.contains(&current) {
            // 检测到循环依赖
            let chain = path
                .iter()
                .chain(std::iter::once(&current))
                .map(|key| key.type_name())
                .collect::<Vec<_>>()
                .join(" -> ");

            return Err(DependencyError::CyclicDependency { chain });
        }

        if visited.contains(&current) {
            return Ok(());
        }

        path.push(current);

        if let Some(dependencies) = edges.get(&current) {
            for dependency in dependencies.iter() {
                self.dfs_check(*dependency, edges, visited, path)?;
            }
        }

        path.pop();
        visited.insert(current);

        Ok(())
    }
}
