//! 约定扫描器实现

use di_abstractions::{
    ConventionScanner, Factory, Registration, ScanCandidate, ScanReport, ScanRules,
};
use infrastructure_common::{ScanWarning, ServiceKey};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 默认约定扫描器
///
/// 按输入顺序处理候选类型：
/// 无法读取的类型产生警告；抽象类型和被规则过滤的类型静默跳过；
/// 通过过滤但没有构造函数的类型产生警告；
/// 其余类型为每个非系统接口注册一次，没有接口时注册为自身。
#[derive(Debug, Default)]
pub struct ConventionScannerImpl;

impl ConventionScannerImpl {
    /// 创建扫描器
    pub fn new() -> Self {
        Self
    }
}

impl ConventionScanner for ConventionScannerImpl {
    fn scan(&self, candidates: Vec<ScanCandidate>, rules: &ScanRules) -> ScanReport {
        let total = candidates.len();
        let mut report = ScanReport::default();

        for candidate in candidates {
            let descriptor = match candidate {
                ScanCandidate::Unreadable { type_name, reason } => {
                    let warning = ScanWarning::new(type_name, reason);
                    warn!("{}", warning);
                    report.warnings.push(warning);
                    continue;
                }
                ScanCandidate::Descriptor(descriptor) => descriptor,
            };

            let identity = descriptor.identity();

            if !descriptor.is_concrete() {
                debug!("跳过抽象类型: {}", identity);
                continue;
            }

            if !rules.accepts(&descriptor) {
                debug!("规则过滤类型: {}", identity);
                continue;
            }

            if !descriptor.is_constructible() {
                let warning = ScanWarning::new(identity.type_name(), "具体类型没有可用的构造函数");
                warn!("{}", warning);
                report.warnings.push(warning);
                continue;
            }

            let mut service_keys: Vec<ServiceKey> = descriptor
                .interfaces()
                .filter(|service_key| !rules.is_system_interface(service_key))
                .collect();
            if service_keys.is_empty() || rules.binds_self() {
                service_keys.push(identity);
            }

            let descriptor = Arc::new(descriptor);
            for service_key in service_keys {
                let lifetime = rules.lifetime_for(&descriptor, service_key);
                debug!("约定注册: {} -> {} ({})", service_key, identity, lifetime);
                report.registrations.push(Registration::new(
                    service_key,
                    Factory::constructor(descriptor.clone()),
                    lifetime,
                ));
            }
            report.accepted.push(descriptor);
        }

        info!(
            "约定扫描完成: {} 个候选, 接受 {} 个类型, 产生 {} 条注册, {} 条警告",
            total,
            report.accepted.len(),
            report.registrations.len(),
            report.warnings.len()
        );

        report
    }

    fn name(&self) -> &str {
        "convention"
    }
}
