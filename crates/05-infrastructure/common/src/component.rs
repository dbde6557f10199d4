//! 组件类型描述
//!
//! 提供候选实现类型的描述信息：标识、实现的接口集合以及构造函数签名。
//! 容器和扫描器只通过这些描述与具体类型打交道，不依赖运行时反射。

use crate::errors::{DependencyError, DependencyResult};
use crate::metadata::{downcast_instance, erase, Instance, ServiceKey};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 激活函数：根据解析好的构造参数创建具体实例
pub type Activator = Arc<dyn Fn(&ResolvedArguments) -> DependencyResult<Instance> + Send + Sync>;

/// 向上转换函数：把具体实例转换为某个接口的实例
pub type Upcast = Arc<dyn Fn(&Instance) -> DependencyResult<Instance> + Send + Sync>;

/// 构造参数类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// 直接传入的常量值（例如枚举值），必须通过注册时的参数绑定提供
    Scalar,
    /// 单个依赖
    SingleDependency,
    /// 某个服务的全部实现
    MultiDependency,
}

/// 构造参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// 参数名称
    pub name: String,
    /// 参数对应的服务标识
    pub service_key: ServiceKey,
    /// 参数类型
    pub kind: ParameterKind,
}

/// 构造函数签名
#[derive(Debug, Clone, Default)]
pub struct ConstructorSignature {
    parameters: Vec<Parameter>,
}

impl ConstructorSignature {
    /// 创建空签名
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加参数
    pub fn push(&mut self, name: impl Into<String>, service_key: ServiceKey, kind: ParameterKind) {
        self.parameters.push(Parameter {
            name: name.into(),
            service_key,
            kind,
        });
    }

    /// 所有参数（按声明顺序）
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// 构造参数数量
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// 是否没有构造参数
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

/// 接口绑定信息
#[derive(Clone)]
pub struct InterfaceBinding {
    /// 接口服务标识
    pub service_key: ServiceKey,
    upcast: Upcast,
}

impl fmt::Debug for InterfaceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceBinding")
            .field("service_key", &self.service_key)
            .field("upcast", &"<function>")
            .finish()
    }
}

/// 类型描述符
///
/// 描述一个候选实现类型。只有具体类型（非接口、非抽象）才能被自动注册。
#[derive(Clone)]
pub struct TypeDescriptor {
    identity: ServiceKey,
    interfaces: Vec<InterfaceBinding>,
    constructor: ConstructorSignature,
    is_concrete: bool,
    activator: Option<Activator>,
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("identity", &self.identity)
            .field("interfaces", &self.interfaces().collect::<Vec<_>>())
            .field("constructor", &self.constructor)
            .field("is_concrete", &self.is_concrete)
            .field("activator", &self.activator.as_ref().map(|_| "<function>"))
            .finish()
    }
}

impl TypeDescriptor {
    /// 为具体类型创建描述符构建器
    pub fn builder<T>() -> DescriptorBuilder<T>
    where
        T: Send + Sync + 'static,
    {
        DescriptorBuilder::new()
    }

    /// 为接口或抽象类型创建描述符
    ///
    /// 这类描述符永远不会被注册为实现。
    pub fn abstract_of<T: ?Sized + 'static>() -> Self {
        Self {
            identity: ServiceKey::of::<T>(),
            interfaces: Vec::new(),
            constructor: ConstructorSignature::new(),
            is_concrete: false,
            activator: None,
        }
    }

    /// 类型自身的服务标识
    pub fn identity(&self) -> ServiceKey {
        self.identity
    }

    /// 实现的接口（按声明顺序）
    pub fn interfaces(&self) -> impl Iterator<Item = ServiceKey> + '_ {
        self.interfaces.iter().map(|binding| binding.service_key)
    }

    /// 是否实现了任何接口
    pub fn has_interfaces(&self) -> bool {
        !self.interfaces.is_empty()
    }

    /// 是否实现了指定接口
    pub fn implements(&self, service_key: ServiceKey) -> bool {
        self.interfaces.iter().any(|binding| binding.service_key == service_key)
    }

    /// 构造函数签名
    pub fn constructor(&self) -> &ConstructorSignature {
        &self.constructor
    }

    /// 是否为具体类型
    pub fn is_concrete(&self) -> bool {
        self.is_concrete
    }

    /// 是否可以由容器构造
    pub fn is_constructible(&self) -> bool {
        self.is_concrete && self.activator.is_some()
    }

    /// 使用解析好的参数创建具体实例
    pub fn activate(&self, arguments: &ResolvedArguments) -> DependencyResult<Instance> {
        let activator = self.activator.as_ref().ok_or_else(|| {
            DependencyError::creation_failed(self.identity.type_name(), "类型没有可用的构造函数")
        })?;
        activator(arguments)
    }

    /// 把具体实例转换为指定服务标识下的实例
    pub fn cast(&self, instance: &Instance, service_key: ServiceKey) -> DependencyResult<Instance> {
        if service_key == self.identity {
            return Ok(instance.clone());
        }

        let binding = self
            .interfaces
            .iter()
            .find(|binding| binding.service_key == service_key)
            .ok_or_else(|| {
                DependencyError::creation_failed(
                    self.identity.type_name(),
                    format!("类型没有实现 {}", service_key),
                )
            })?;
        (binding.upcast)(instance)
    }
}

/// 类型描述符构建器
pub struct DescriptorBuilder<T> {
    interfaces: Vec<InterfaceBinding>,
    constructor: ConstructorSignature,
    is_concrete: bool,
    activator: Option<Activator>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> DescriptorBuilder<T>
where
    T: Send + Sync + 'static,
{
    fn new() -> Self {
        Self {
            interfaces: Vec::new(),
            constructor: ConstructorSignature::new(),
            is_concrete: true,
            activator: None,
            _marker: PhantomData,
        }
    }

    /// 声明实现的接口
    ///
    /// `upcast` 负责把 `Arc<T>` 转换为 `Arc<I>`，通常写作 `|c| c as Arc<dyn Trait>`。
    pub fn implements<I>(mut self, upcast: fn(Arc<T>) -> Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let service_key = ServiceKey::of::<I>();
        let upcast: Upcast = Arc::new(move |instance: &Instance| {
            let concrete = downcast_instance::<T>(instance)?;
            Ok(erase(upcast(concrete)))
        });

        self.interfaces.retain(|binding| binding.service_key != service_key);
        self.interfaces.push(InterfaceBinding {
            service_key,
            upcast,
        });
        self
    }

    /// 声明单个依赖参数
    pub fn dependency<D: ?Sized + 'static>(mut self, name: impl Into<String>) -> Self {
        self.constructor
            .push(name, ServiceKey::of::<D>(), ParameterKind::SingleDependency);
        self
    }

    /// 声明多实现依赖参数
    pub fn dependencies<D: ?Sized + 'static>(mut self, name: impl Into<String>) -> Self {
        self.constructor
            .push(name, ServiceKey::of::<D>(), ParameterKind::MultiDependency);
        self
    }

    /// 声明常量参数
    pub fn scalar<V: 'static>(mut self, name: impl Into<String>) -> Self {
        self.constructor
            .push(name, ServiceKey::of::<V>(), ParameterKind::Scalar);
        self
    }

    /// 设置激活函数
    pub fn activator<F>(mut self, activator: F) -> Self
    where
        F: Fn(&ResolvedArguments) -> DependencyResult<T> + Send + Sync + 'static,
    {
        self.activator = Some(Arc::new(move |arguments: &ResolvedArguments| {
            activator(arguments).map(|value| erase(Arc::new(value)))
        }));
        self
    }

    /// 标记为抽象类型
    pub fn abstract_type(mut self) -> Self {
        self.is_concrete = false;
        self
    }

    /// 构建描述符
    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor {
            identity: ServiceKey::of::<T>(),
            interfaces: self.interfaces,
            constructor: self.constructor,
            is_concrete: self.is_concrete,
            activator: self.activator,
        }
    }
}

/// 解析后的构造参数值
#[derive(Clone)]
pub enum ResolvedArgument {
    /// 常量值
    Value(Instance),
    /// 单个依赖实例
    Single(Instance),
    /// 多实现依赖实例
    Many(Vec<Instance>),
}

impl fmt::Debug for ResolvedArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(_) => f.write_str("Value(..)"),
            Self::Single(_) => f.write_str("Single(..)"),
            Self::Many(values) => write!(f, "Many({})", values.len()),
        }
    }
}

/// 解析后的构造参数集合
#[derive(Debug, Clone)]
pub struct ResolvedArguments {
    owner: ServiceKey,
    values: Vec<(String, ResolvedArgument)>,
}

impl ResolvedArguments {
    /// 创建空参数集合
    pub fn new(owner: ServiceKey) -> Self {
        Self {
            owner,
            values: Vec::new(),
        }
    }

    /// 追加参数
    pub fn push(&mut self, name: impl Into<String>, argument: ResolvedArgument) {
        self.values.push((name.into(), argument));
    }

    /// 按名称查找参数
    pub fn get(&self, name: &str) -> Option<&ResolvedArgument> {
        self.values
            .iter()
            .find(|(parameter, _)| parameter == name)
            .map(|(_, argument)| argument)
    }

    /// 已解析的参数数量
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否没有参数
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 获取单个依赖
    pub fn single<D>(&self, name: &str) -> DependencyResult<Arc<D>>
    where
        D: ?Sized + Send + Sync + 'static,
    {
        match self.require(name)? {
            ResolvedArgument::Single(instance) | ResolvedArgument::Value(instance) => {
                downcast_instance::<D>(instance)
            }
            ResolvedArgument::Many(_) => Err(DependencyError::TypeMismatch {
                expected: std::any::type_name::<D>().to_string(),
            }),
        }
    }

    /// 获取多实现依赖
    pub fn many<D>(&self, name: &str) -> DependencyResult<Vec<Arc<D>>>
    where
        D: ?Sized + Send + Sync + 'static,
    {
        match self.require(name)? {
            ResolvedArgument::Many(instances) => {
                instances.iter().map(downcast_instance::<D>).collect()
            }
            ResolvedArgument::Single(instance) | ResolvedArgument::Value(instance) => {
                Ok(vec![downcast_instance::<D>(instance)?])
            }
        }
    }

    /// 获取常量参数
    pub fn scalar<V>(&self, name: &str) -> DependencyResult<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        self.single::<V>(name).map(|value| (*value).clone())
    }

    fn require(&self, name: &str) -> DependencyResult<&ResolvedArgument> {
        self.get(name).ok_or_else(|| DependencyError::MissingArgument {
            type_name: self.owner.type_name().to_string(),
            parameter: name.to_string(),
        })
    }
}
