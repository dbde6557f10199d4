//! 约定规范定义
//!
//! 提供按命名约定选择生命周期、识别系统接口的规则

use crate::component::TypeDescriptor;
use crate::lifecycle::Lifetime;
use crate::metadata::ServiceKey;

/// 约定规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionRule {
    /// 名称模式，支持单个 `*` 通配符
    pub pattern: String,
    /// 匹配时使用的生命周期
    pub lifetime: Lifetime,
    /// 优先级
    pub priority: i32,
}

impl ConventionRule {
    /// 创建新的约定规则
    pub fn new(pattern: impl Into<String>, lifetime: Lifetime) -> Self {
        Self {
            pattern: pattern.into(),
            lifetime,
            priority: 0,
        }
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 检查服务标识是否匹配此规则
    pub fn matches(&self, service_key: &ServiceKey) -> bool {
        self.pattern_matches(service_key.short_name())
    }

    /// 检查模式是否匹配
    fn pattern_matches(&self, name: &str) -> bool {
        match self.pattern.split_once('*') {
            Some((prefix, suffix)) if !suffix.contains('*') => {
                name.len() >= prefix.len() + suffix.len()
                    && name.starts_with(prefix)
                    && name.ends_with(suffix)
            }
            Some(_) => false,
            None => name == self.pattern,
        }
    }
}

/// 组件约定规范
#[derive(Debug, Clone)]
pub struct ComponentConventions {
    rules: Vec<ConventionRule>,
    fallback: Lifetime,
}

impl ComponentConventions {
    /// 创建带默认约定的规范
    pub fn new() -> Self {
        let mut conventions = Self::empty();
        conventions.register_default_conventions();
        conventions
    }

    /// 创建不含任何规则的规范
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            fallback: Lifetime::Transient,
        }
    }

    /// 注册默认约定
    fn register_default_conventions(&mut self) {
        // 服务和管理器按约定为单例
        self.add_convention(ConventionRule::new("*Service", Lifetime::Singleton).with_priority(90));
        self.add_convention(ConventionRule::new("*Manager", Lifetime::Singleton).with_priority(90));
        self.add_convention(
            ConventionRule::new("*Repository", Lifetime::Singleton).with_priority(80),
        );

        self.add_convention(ConventionRule::new("*Strategy", Lifetime::Transient).with_priority(70));
        self.add_convention(ConventionRule::new("*Validator", Lifetime::Transient).with_priority(70));
    }

    /// 添加约定规则
    pub fn add_convention(&mut self, rule: ConventionRule) {
        self.rules.push(rule);
        // 按优先级排序，稳定排序保证同优先级按添加顺序匹配
        self.rules.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// 设置未匹配任何规则时的生命周期
    pub fn with_fallback(mut self, lifetime: Lifetime) -> Self {
        self.fallback = lifetime;
        self
    }

    /// 获取所有约定规则
    pub fn get_convention_rules(&self) -> &[ConventionRule] {
        &self.rules
    }

    /// 根据服务标识查找匹配的规则
    pub fn find_rule(&self, service_key: &ServiceKey) -> Option<&ConventionRule> {
        self.rules.iter().find(|rule| rule.matches(service_key))
    }

    /// 确定描述符的生命周期
    pub fn lifetime_for(&self, descriptor: &TypeDescriptor) -> Lifetime {
        self.find_rule(&descriptor.identity())
            .map_or(self.fallback, |rule| rule.lifetime)
    }
}

impl Default for ComponentConventions {
    fn default() -> Self {
        Self::new()
    }
}

/// 命名约定规范
#[derive(Debug)]
pub struct NamingConventions;

impl NamingConventions {
    /// 标准库接口的模块前缀
    const SYSTEM_PREFIXES: [&'static str; 3] = ["core::", "alloc::", "std::"];

    /// 检查是否为系统接口
    ///
    /// 标准库 trait（`Debug`、`Any`、`Iterator` 等）几乎每个类型都会实现，
    /// 不是有意义的服务契约，按约定不参与绑定。
    pub fn is_system_interface(service_key: &ServiceKey) -> bool {
        let name = service_key.type_name();
        let name = name.strip_prefix("dyn ").unwrap_or(name);
        Self::SYSTEM_PREFIXES
            .iter()
            .any(|prefix| name.starts_with(prefix))
    }
}
