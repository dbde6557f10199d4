//! 错误类型定义

use thiserror::Error;

/// 依赖注入错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyError {
    #[error("服务未注册: {type_name}")]
    UnregisteredService { type_name: String },

    #[error("缺少构造参数: {type_name} 的参数 `{parameter}` 没有提供值")]
    MissingArgument { type_name: String, parameter: String },

    #[error("循环依赖检测到: {chain}")]
    CyclicDependency { chain: String },

    #[error("解析深度超过上限 {depth}: {chain}")]
    ResolutionDepthExceeded { depth: usize, chain: String },

    #[error("实例类型不匹配: 期望 {expected}")]
    TypeMismatch { expected: String },

    #[error("组件创建失败: {type_name}, 原因: {message}")]
    ComponentCreationFailed { type_name: String, message: String },
}

impl DependencyError {
    /// 创建组件创建失败错误
    pub fn creation_failed(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ComponentCreationFailed {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// 创建服务未注册错误
    pub fn unregistered(type_name: impl Into<String>) -> Self {
        Self::UnregisteredService {
            type_name: type_name.into(),
        }
    }
}

/// 扫描警告
///
/// 单个候选类型无法被读取或激活时产生，扫描会跳过该类型并继续。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("扫描跳过类型 {type_name}: {reason}")]
pub struct ScanWarning {
    /// 类型名称
    pub type_name: String,
    /// 跳过原因
    pub reason: String,
}

impl ScanWarning {
    /// 创建新的扫描警告
    pub fn new(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}

/// 结果类型别名
pub type DependencyResult<T> = Result<T, DependencyError>;
