//! 组件工厂抽象接口

use crate::resolver::Injector;
use infrastructure_common::{erase, DependencyResult, Instance, ServiceKey, TypeDescriptor};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Lambda 工厂函数
///
/// 接收注入器，可以在工厂内部继续解析其他服务。
pub type FactoryFn = Arc<dyn Fn(&mut Injector<'_>) -> DependencyResult<Instance> + Send + Sync>;

/// 组件工厂
///
/// 描述一条注册如何产生实例。
#[derive(Clone)]
pub enum Factory {
    /// 由调用方提供的工厂函数
    Lambda(FactoryFn),
    /// 按类型描述符的构造函数签名解析参数后激活
    Constructor {
        /// 实现类型描述符
        descriptor: Arc<TypeDescriptor>,
        /// 注册时绑定的常量参数
        arguments: Arc<HashMap<String, Instance>>,
    },
    /// 预先创建好的实例
    Instance(Instance),
}

impl Factory {
    /// 创建 lambda 工厂
    pub fn lambda<S, F>(factory: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&mut Injector<'_>) -> DependencyResult<Arc<S>> + Send + Sync + 'static,
    {
        Self::Lambda(Arc::new(move |injector: &mut Injector<'_>| {
            factory(injector).map(erase)
        }))
    }

    /// 创建基于构造函数的工厂
    pub fn constructor(descriptor: Arc<TypeDescriptor>) -> Self {
        Self::Constructor {
            descriptor,
            arguments: Arc::new(HashMap::new()),
        }
    }

    /// 创建实例工厂
    pub fn instance<S>(instance: Arc<S>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        Self::Instance(erase(instance))
    }

    /// 绑定常量参数
    ///
    /// 只对构造函数工厂有效，其他工厂原样返回。
    pub fn with_argument(self, name: impl Into<String>, value: Instance) -> Self {
        match self {
            Self::Constructor {
                descriptor,
                arguments,
            } => {
                let mut arguments = (*arguments).clone();
                arguments.insert(name.into(), value);
                Self::Constructor {
                    descriptor,
                    arguments: Arc::new(arguments),
                }
            }
            other => other,
        }
    }

    /// 实现类型标识（仅构造函数工厂可知）
    pub fn implementation(&self) -> Option<ServiceKey> {
        self.descriptor().map(|descriptor| descriptor.identity())
    }

    /// 实现类型描述符
    pub fn descriptor(&self) -> Option<&Arc<TypeDescriptor>> {
        match self {
            Self::Constructor { descriptor, .. } => Some(descriptor),
            _ => None,
        }
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lambda(_) => f.write_str("Lambda(<function>)"),
            Self::Constructor {
                descriptor,
                arguments,
            } => f
                .debug_struct("Constructor")
                .field("implementation", &descriptor.identity())
                .field("arguments", &arguments.keys().collect::<Vec<_>>())
                .finish(),
            Self::Instance(_) => f.write_str("Instance(..)"),
        }
    }
}
