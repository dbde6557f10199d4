//! 单例生命周期缓存

use dashmap::DashMap;
use di_abstractions::RegistrationId;
use infrastructure_common::{DependencyError, DependencyResult, Instance};
use once_cell::sync::OnceCell;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::Arc;

/// 单例缓存
///
/// 每条单例注册对应一个 `OnceCell`，同一注册的并发调用只在该注册上等待，
/// 不同注册互不阻塞。工厂失败时单元保持为空，下次解析会重新尝试。
///
/// 正在创建的单例记录在等待图中：进入等待前检查持有者是否直接或间接
/// 在等待调用方持有的单例，若是则返回循环依赖错误而不是阻塞。
#[derive(Debug, Default)]
pub struct LifetimeCache {
    entries: DashMap<RegistrationId, Arc<OnceCell<Instance>>>,
    graph: Mutex<WaitGraph>,
    released: Condvar,
}

/// 单例创建的等待图
#[derive(Debug, Default)]
struct WaitGraph {
    /// 正在创建的单例及其所属解析
    owners: HashMap<RegistrationId, u64>,
    /// 正在等待的解析及其等待的单例
    waiting: HashMap<u64, RegistrationId>,
}

impl WaitGraph {
    /// 沿等待链查找是否回到调用方，返回链上的单例
    fn cycle_through(&self, caller: u64, wanted: RegistrationId) -> Option<Vec<RegistrationId>> {
        let mut path = vec![wanted];
        let mut holder = *self.owners.get(&wanted)?;

        while holder != caller {
            let next = *self.waiting.get(&holder)?;
            if path.contains(&next) {
                return None;
            }
            path.push(next);
            holder = *self.owners.get(&next)?;
        }

        Some(path)
    }
}

impl LifetimeCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取缓存的实例，不存在时调用工厂创建
    ///
    /// `owner` 是发起调用的解析标识。
    pub fn get_or_create<F>(
        &self,
        id: RegistrationId,
        owner: u64,
        factory: F,
    ) -> DependencyResult<Instance>
    where
        F: FnOnce() -> DependencyResult<Instance>,
    {
        // 先取出单元，避免持有分片锁时执行工厂
        let cell = self.entries.entry(id).or_default().clone();
        if let Some(instance) = cell.get() {
            return Ok(instance.clone());
        }

        if let Some(instance) = self.acquire(id, owner, &cell)? {
            return Ok(instance);
        }

        let result = factory();
        if let Ok(instance) = &result {
            let _ = cell.set(instance.clone());
        }
        self.release(id);
        result
    }

    /// 获取已创建的实例
    pub fn get(&self, id: &RegistrationId) -> Option<Instance> {
        self.entries
            .get(id)
            .and_then(|entry| entry.value().get().cloned())
    }

    /// 已创建的单例数量
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }

    /// 是否还没有创建任何单例
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 取得单例的创建权，其他解析正在创建时等待其完成
    ///
    /// 等待期间实例已被创建时返回该实例，否则调用方获得创建权。
    fn acquire(
        &self,
        id: RegistrationId,
        owner: u64,
        cell: &OnceCell<Instance>,
    ) -> DependencyResult<Option<Instance>> {
        let mut graph = self.graph.lock();

        loop {
            if let Some(instance) = cell.get() {
                return Ok(Some(instance.clone()));
            }

            match graph.owners.get(&id).copied() {
                None => {
                    graph.owners.insert(id, owner);
                    return Ok(None);
                }
                Some(holder) if holder == owner => {
                    return Err(DependencyError::CyclicDependency {
                        chain: describe(&[id, id]),
                    });
                }
                Some(_) => {
                    if let Some(mut path) = graph.cycle_through(owner, id) {
                        path.push(id);
                        return Err(DependencyError::CyclicDependency {
                            chain: describe(&path),
                        });
                    }

                    graph.waiting.insert(owner, id);
                    self.released.wait(&mut graph);
                    graph.waiting.remove(&owner);
                }
            }
        }
    }

    /// 释放创建权并唤醒等待者
    fn release(&self, id: RegistrationId) {
        self.graph.lock().owners.remove(&id);
        self.released.notify_all();
    }
}

fn describe(path: &[RegistrationId]) -> String {
    path.iter()
        .map(|id| id.service_key.type_name())
        .collect::<Vec<_>>()
        .join(" -> ")
}
