//! 元数据定义
//!
//! 提供服务标识与类型擦除实例的元数据信息

use crate::errors::{DependencyError, DependencyResult};
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// 服务标识
///
/// 注册和解析时使用的查找键。可以是具体类型，也可以是 `dyn Trait`。
/// 相等性和哈希只依赖 `TypeId`，类型名称仅用于诊断。
#[derive(Clone, Copy)]
pub struct ServiceKey {
    /// 类型ID
    id: TypeId,
    /// 类型名称
    name: &'static str,
}

impl ServiceKey {
    /// 从类型获取服务标识
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// 类型ID
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// 完整的类型名称（包含模块路径）
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// 获取简短的类型名称（不包含模块路径和泛型参数）
    pub fn short_name(&self) -> &'static str {
        let name = self.name.strip_prefix("dyn ").unwrap_or(self.name);
        let name = name.split(" + ").next().unwrap_or(name);
        let name = name.split('<').next().unwrap_or(name);
        name.rsplit("::").next().unwrap_or(name)
    }

    /// 是否为 trait object 标识
    pub fn is_trait_object(&self) -> bool {
        self.name.starts_with("dyn ")
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceKey({})", self.name)
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 类型擦除的服务实例
///
/// 内部总是包装一个 `Arc<T>`，`T` 为请求时使用的类型（可以是 `dyn Trait`）。
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 擦除实例类型
pub fn erase<T>(value: Arc<T>) -> Instance
where
    T: ?Sized + Send + Sync + 'static,
{
    Arc::new(value)
}

/// 还原实例类型
///
/// 返回的 `Arc<T>` 与容器内保存的是同一个分配，单例身份因此得以保持。
pub fn downcast_instance<T>(instance: &Instance) -> DependencyResult<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    instance
        .downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or_else(|| DependencyError::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
        })
}
