//! 并发解析与容器配置的集成测试


use di_abstractions::{ContainerConfig, DiContainer};
use di_impl::{DiContainerBuilder, DiContainerImpl};
use fixtures::*;
use infrastructure_common::{DependencyError, Lifetime};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_singleton_created_once() -> anyhow::Result<()> {
    init_test_logger();

    let constructed = Arc::new(AtomicUsize::new(0));
    let counter = constructed.clone();

    let container = Arc::new(
        DiContainerBuilder::new()
            .register_factory::<dyn JellybeanDispenser, _>(Lifetime::Singleton, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                // 放大竞争窗口
                std::thread::sleep(Duration::from_millis(20));
                let dispenser: Arc<dyn JellybeanDispenser> = Arc::new(VanillaJellybeanDispenser);
                Ok(dispenser)
            })
            .register_type(sweet_vending_machine(), |r| r.as_self())
            .register_type(sweet_shop(), |r| r.as_self())
            .build(),
    );

    let mut handles = Vec::new();
    for _ in 0..16 {
        let container = container.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            container.resolve::<SweetShop>()
        }));
    }

    let mut shops = Vec::new();
    for handle in handles {
        shops.push(handle.await??);
    }

    assert_eq!(constructed.load(Ordering::SeqCst), 1);
    let first = &shops[0].sweet_vending_machine.jellybean_dispenser;
    assert!(shops
        .iter()
        .all(|shop| Arc::ptr_eq(first, &shop.sweet_vending_machine.jellybean_dispenser)));
    assert_eq!(container.stats().resolutions, 16);

    Ok(())
}

struct Hen {
    _egg: Arc<HenEgg>,
}

struct HenEgg {
    _hen: Arc<Hen>,
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_singleton_cycle_fails_instead_of_hanging() -> anyhow::Result<()> {
    init_test_logger();

    // 两个线程都进入各自的单例后才去解析对方
    let inside = Arc::new(Barrier::new(2));
    let hen_calls = Arc::new(AtomicUsize::new(0));
    let egg_calls = Arc::new(AtomicUsize::new(0));

    let container = Arc::new(
        DiContainerBuilder::new()
            .register_factory::<Hen, _>(Lifetime::Singleton, {
                let inside = inside.clone();
                let calls = hen_calls.clone();
                move |injector| {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        inside.wait();
                    }
                    Ok(Arc::new(Hen {
                        _egg: injector.resolve::<HenEgg>()?,
                    }))
                }
            })
            .register_factory::<HenEgg, _>(Lifetime::Singleton, {
                let inside = inside.clone();
                let calls = egg_calls.clone();
                move |injector| {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        inside.wait();
                    }
                    Ok(Arc::new(HenEgg {
                        _hen: injector.resolve::<Hen>()?,
                    }))
                }
            })
            .build(),
    );

    let hen_task = {
        let container = container.clone();
        tokio::task::spawn_blocking(move || container.resolve::<Hen>().map(|_| ()))
    };
    let egg_task = {
        let container = container.clone();
        tokio::task::spawn_blocking(move || container.resolve::<HenEgg>().map(|_| ()))
    };

    let (hen, egg) = tokio::time::timeout(Duration::from_secs(5), async {
        tokio::try_join!(hen_task, egg_task)
    })
    .await??;

    assert!(matches!(hen, Err(DependencyError::CyclicDependency { .. })));
    assert!(matches!(egg, Err(DependencyError::CyclicDependency { .. })));
    assert_eq!(container.stats().active_singletons, 0);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_containers_are_isolated() -> anyhow::Result<()> {
    init_test_logger();

    let build = || -> DiContainerImpl {
        DiContainerBuilder::new()
            .register_type(vanilla_dispenser(), |r| r.as_implemented_interfaces().singleton())
            .build()
    };

    let left = Arc::new(build());
    let right = Arc::new(build());
    assert_ne!(left.id(), right.id());

    let left_task = {
        let left = left.clone();
        tokio::task::spawn_blocking(move || left.resolve::<dyn JellybeanDispenser>())
    };
    let right_task = {
        let right = right.clone();
        tokio::task::spawn_blocking(move || right.resolve::<dyn JellybeanDispenser>())
    };

    let left_dispenser = left_task.await??;
    let right_dispenser = right_task.await??;
    assert!(!Arc::ptr_eq(&left_dispenser, &right_dispenser));

    Ok(())
}

#[test]
fn test_container_config_round_trip() -> anyhow::Result<()> {
    init_test_logger();

    let config = ContainerConfig::strict()
        .with_max_resolution_depth(32)
        .with_circular_dependency_detection(true);

    let json = serde_json::to_string(&config)?;
    let restored: ContainerConfig = serde_json::from_str(&json)?;
    assert_eq!(restored, config);

    let container = DiContainerBuilder::new().with_config(restored).build();
    assert_eq!(container.config().max_resolution_depth, 32);
    assert!(!container.config().enable_implicit_registration);

    let stats = serde_json::to_value(container.stats())?;
    assert_eq!(stats["registrations"], 0);

    Ok(())
}
