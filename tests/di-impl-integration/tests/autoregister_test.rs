//! 约定扫描与自动注册的集成测试


use di_abstractions::{DiContainer, ScanCandidate, ScanRules};
use di_impl::DiContainerBuilder;
use fixtures::*;
use infrastructure_common::{ComponentConventions, DependencyError, Lifetime, TypeDescriptor};
use std::sync::Arc;

fn autoregistered_classes() -> Vec<ScanCandidate> {
    vec![
        TypeDescriptor::abstract_of::<dyn CustomerService>().into(),
        TypeDescriptor::abstract_of::<dyn OrderService>().into(),
        TypeDescriptor::abstract_of::<dyn Validator>().into(),
        customer_service().into(),
        order_service().into(),
        business_process().into(),
        not_null_validator().into(),
        success_validator().into(),
        fail_validator().into(),
    ]
}

#[test]
fn test_can_make_business_process() -> anyhow::Result<()> {
    init_test_logger();

    let container = DiContainerBuilder::new()
        .scan(autoregistered_classes(), &ScanRules::new())
        .build();

    let process = container.resolve::<BusinessProcess>()?;
    assert_eq!(process.customer_service.customer_name(7), "customer-7");
    assert_eq!(process.order_service.order_count(7), 1);
    assert!(container.scan_warnings().is_empty());

    Ok(())
}

#[test]
fn test_can_get_all_validators() -> anyhow::Result<()> {
    init_test_logger();

    let container = DiContainerBuilder::new()
        .scan(autoregistered_classes(), &ScanRules::new())
        .build();

    let validators = container.resolve_all::<dyn Validator>()?;
    assert_eq!(validators.len(), 3);

    let results: Vec<bool> = validators
        .iter()
        .map(|validator| validator.is_valid(None))
        .collect();
    assert_eq!(results, vec![false, true, false]);

    Ok(())
}

#[test]
fn test_system_interfaces_are_not_bound() {
    init_test_logger();

    let container = DiContainerBuilder::new()
        .scan(autoregistered_classes(), &ScanRules::new())
        .build();

    assert!(container.is_registered_type::<dyn CustomerService>());
    assert!(!container.is_registered_type::<dyn std::fmt::Debug + Send + Sync>());
    // 实现了接口的类型不注册为自身
    assert!(!container.is_registered_type::<DefaultCustomerService>());
    // 没有接口的类型注册为自身
    assert!(container.is_registered_type::<BusinessProcess>());
}

#[test]
fn test_self_binding_fallback() -> anyhow::Result<()> {
    init_test_logger();

    let container = DiContainerBuilder::new()
        .scan(vec![sweet_vending_machine().into()], &ScanRules::new())
        .register_instance::<dyn JellybeanDispenser>(Arc::new(VanillaJellybeanDispenser))
        .build();

    let machine = container.resolve::<SweetVendingMachine>()?;
    assert_eq!(
        machine.jellybean_dispenser.dispense_jellybean(),
        Jellybean::Vanilla
    );

    Ok(())
}

#[test]
fn test_also_bind_self() -> anyhow::Result<()> {
    init_test_logger();

    let container = DiContainerBuilder::new()
        .scan(
            autoregistered_classes(),
            &ScanRules::new().also_bind_self(),
        )
        .build();

    assert!(container.is_registered_type::<DefaultCustomerService>());
    assert!(container.is_registered_type::<dyn CustomerService>());
    container.resolve::<DefaultCustomerService>()?;

    Ok(())
}

#[test]
fn test_include_predicate_and_singleton_override() -> anyhow::Result<()> {
    init_test_logger();

    let rules = ScanRules::new()
        .include(|descriptor| descriptor.has_interfaces())
        .exclude_type::<FailValidator>()
        .with_singleton::<dyn OrderService>();

    let container = DiContainerBuilder::new()
        .scan(autoregistered_classes(), &rules)
        .build();

    assert!(!container.is_registered_type::<BusinessProcess>());
    assert_eq!(container.resolve_all::<dyn Validator>()?.len(), 2);

    let first = container.resolve::<dyn OrderService>()?;
    let second = container.resolve::<dyn OrderService>()?;
    assert!(Arc::ptr_eq(&first, &second));

    let first = container.resolve::<dyn CustomerService>()?;
    let second = container.resolve::<dyn CustomerService>()?;
    assert!(!Arc::ptr_eq(&first, &second));

    Ok(())
}

#[test]
fn test_naming_conventions_select_lifetime() -> anyhow::Result<()> {
    init_test_logger();

    let rules = ScanRules::new().with_conventions(ComponentConventions::new());
    let container = DiContainerBuilder::new()
        .scan(autoregistered_classes(), &rules)
        .build();

    // *Service 约定为单例，*Validator 约定为瞬时
    let first = container.resolve::<dyn CustomerService>()?;
    let second = container.resolve::<dyn CustomerService>()?;
    assert!(Arc::ptr_eq(&first, &second));

    let first = container.resolve::<dyn Validator>()?;
    let second = container.resolve::<dyn Validator>()?;
    assert!(!Arc::ptr_eq(&first, &second));

    Ok(())
}

#[test]
fn test_scan_warnings_are_collected() -> anyhow::Result<()> {
    init_test_logger();

    let mut candidates = autoregistered_classes();
    candidates.push(ScanCandidate::unreadable("legacy::BrokenValidator", "类型元数据无法加载"));
    candidates.push(TypeDescriptor::builder::<FailValidator>().build().into());

    let container = DiContainerBuilder::new()
        .scan(candidates, &ScanRules::new().with_lifetime(Lifetime::Transient))
        .build();

    let warnings = container.scan_warnings();
    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].type_name, "legacy::BrokenValidator");
    assert_eq!(container.stats().scan_warnings, 2);

    // 警告不影响其他类型的注册
    assert_eq!(container.resolve_all::<dyn Validator>()?.len(), 3);

    Ok(())
}

#[test]
fn test_cycle_rejection() {
    init_test_logger();

    struct Chicken {
        _egg: Arc<Egg>,
    }

    struct Egg {
        _chicken: Arc<Chicken>,
    }

    let chicken = TypeDescriptor::builder::<Chicken>()
        .dependency::<Egg>("egg")
        .activator(|args| Ok(Chicken { _egg: args.single("egg")? }))
        .build();
    let egg = TypeDescriptor::builder::<Egg>()
        .dependency::<Chicken>("chicken")
        .activator(|args| Ok(Egg { _chicken: args.single("chicken")? }))
        .build();

    let container = DiContainerBuilder::new()
        .scan(vec![chicken.into(), egg.into()], &ScanRules::new())
        .build();

    assert!(matches!(
        container.resolve::<Chicken>(),
        Err(DependencyError::CyclicDependency { .. })
    ));
    assert!(matches!(
        container.resolve::<Egg>(),
        Err(DependencyError::CyclicDependency { .. })
    ));
    assert!(container.validate().is_err());
}

#[test]
fn test_singleton_cycle_without_detection_does_not_hang() {
    init_test_logger();

    struct Chicken {
        _egg: Arc<Egg>,
    }

    struct Egg {
        _chicken: Arc<Chicken>,
    }

    let chicken = TypeDescriptor::builder::<Chicken>()
        .dependency::<Egg>("egg")
        .activator(|args| Ok(Chicken { _egg: args.single("egg")? }))
        .build();
    let egg = TypeDescriptor::builder::<Egg>()
        .dependency::<Chicken>("chicken")
        .activator(|args| Ok(Egg { _chicken: args.single("chicken")? }))
        .build();

    let container = DiContainerBuilder::new()
        .scan(
            vec![chicken.into(), egg.into()],
            &ScanRules::new().with_lifetime(Lifetime::Singleton),
        )
        .with_config(
            di_abstractions::ContainerConfig::default().with_circular_dependency_detection(false),
        )
        .build();

    assert!(matches!(
        container.resolve::<Chicken>(),
        Err(DependencyError::CyclicDependency { .. })
    ));
}

#[test]
fn test_update_monotonicity() -> anyhow::Result<()> {
    init_test_logger();

    let container = DiContainerBuilder::new()
        .scan(
            vec![customer_service().into()],
            &ScanRules::new().with_lifetime(Lifetime::Singleton),
        )
        .build();

    let before = container.resolve::<dyn CustomerService>()?;
    assert!(matches!(
        container.resolve::<dyn OrderService>(),
        Err(DependencyError::UnregisteredService { .. })
    ));

    container.update(
        DiContainerBuilder::new().scan(vec![order_service().into()], &ScanRules::new()),
    );

    container.resolve::<dyn OrderService>()?;
    let after = container.resolve::<dyn CustomerService>()?;
    assert!(Arc::ptr_eq(&before, &after));

    Ok(())
}
