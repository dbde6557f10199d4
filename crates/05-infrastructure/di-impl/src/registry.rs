//! 服务注册表实现

use di_abstractions::{Registration, ServiceRegistry};
use infrastructure_common::{DependencyError, DependencyResult, ServiceKey};
use std::collections::HashMap;

/// 默认服务注册表
///
/// 每个服务标识对应一个按序号递增的注册列表。
#[derive(Debug, Default)]
pub struct ServiceRegistryImpl {
    buckets: HashMap<ServiceKey, Vec<Registration>>,
    order: Vec<ServiceKey>,
    next_ordinal: u64,
    count: usize,
}

impl ServiceRegistryImpl {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 全部注册的快照（按序号排序）
    pub fn registrations(&self) -> Vec<Registration> {
        let mut registrations: Vec<Registration> =
            self.buckets.values().flatten().cloned().collect();
        registrations.sort_by_key(|registration| registration.ordinal);
        registrations
    }
}

impl ServiceRegistry for ServiceRegistryImpl {
    fn add(&mut self, mut registration: Registration) -> u64 {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        registration.ordinal = ordinal;

        let service_key = registration.service_key;
        let bucket = self.buckets.entry(service_key).or_default();
        if bucket.is_empty() {
            self.order.push(service_key);
        }
        bucket.push(registration);
        self.count += 1;

        ordinal
    }

    fn lookup(&self, service_key: ServiceKey) -> DependencyResult<Vec<Registration>> {
        self.buckets
            .get(&service_key)
            .filter(|bucket| !bucket.is_empty())
            .cloned()
            .ok_or_else(|| DependencyError::unregistered(service_key.type_name()))
    }

    fn last(&self, service_key: ServiceKey) -> Option<Registration> {
        self.buckets
            .get(&service_key)
            .and_then(|bucket| bucket.last())
            .cloned()
    }

    fn last_named(&self, service_key: ServiceKey, name: &str) -> Option<Registration> {
        self.buckets.get(&service_key).and_then(|bucket| {
            bucket
                .iter()
                .rev()
                .find(|registration| registration.name.as_deref() == Some(name))
                .cloned()
        })
    }

    fn contains(&self, service_key: ServiceKey) -> bool {
        self.buckets
            .get(&service_key)
            .is_some_and(|bucket| !bucket.is_empty())
    }

    fn registered_services(&self) -> Vec<ServiceKey> {
        self.order.clone()
    }

    fn len(&self) -> usize {
        self.count
    }

    fn merge(&mut self, other: Self) {
        for registration in other.registrations() {
            self.add(registration);
        }
    }
}
