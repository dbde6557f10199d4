//! 生命周期、多重绑定和覆盖语义的集成测试


use di_abstractions::{DiContainer, ScanRules};
use di_impl::DiContainerBuilder;
use fixtures::*;
use infrastructure_common::{DependencyError, Lifetime};
use std::sync::Arc;

fn dispenser_ptr(dispenser: &Arc<dyn JellybeanDispenser>) -> *const () {
    Arc::as_ptr(dispenser).cast::<()>()
}

#[test]
fn test_transient_distinctness() -> anyhow::Result<()> {
    init_test_logger();

    let container = DiContainerBuilder::new()
        .register_type(vanilla_dispenser(), |r| r.as_implemented_interfaces())
        .register_type(sweet_vending_machine(), |r| r.as_self())
        .register_type(sweet_shop(), |r| r.as_self())
        .build();

    let first = container.resolve::<SweetShop>()?;
    let second = container.resolve::<SweetShop>()?;

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(!Arc::ptr_eq(
        &first.sweet_vending_machine,
        &second.sweet_vending_machine
    ));
    assert_ne!(
        dispenser_ptr(&first.sweet_vending_machine.jellybean_dispenser),
        dispenser_ptr(&second.sweet_vending_machine.jellybean_dispenser)
    );
    assert_eq!(first.dispense_jelly_bean(), Jellybean::Vanilla);

    Ok(())
}

#[test]
fn test_singleton_identity_across_roots() -> anyhow::Result<()> {
    init_test_logger();

    let container = DiContainerBuilder::new()
        .register_type(vanilla_dispenser(), |r| r.as_implemented_interfaces().singleton())
        .register_type(sweet_vending_machine(), |r| r.as_self())
        .build();

    let direct = container.resolve::<dyn JellybeanDispenser>()?;
    let machine = container.resolve::<SweetVendingMachine>()?;
    let again = container.resolve::<dyn JellybeanDispenser>()?;

    assert!(Arc::ptr_eq(&direct, &machine.jellybean_dispenser));
    assert!(Arc::ptr_eq(&direct, &again));
    assert_eq!(container.stats().active_singletons, 1);

    Ok(())
}

#[test]
fn test_mixed_lifetime_graph() -> anyhow::Result<()> {
    init_test_logger();

    let container = DiContainerBuilder::new()
        .register_type(vanilla_dispenser(), |r| {
            r.as_service::<dyn JellybeanDispenser>().singleton()
        })
        .register_type(sweet_vending_machine(), |r| r.as_self().transient())
        .register_type(sweet_shop(), |r| r.as_self().transient())
        .build();

    let first = container.resolve::<SweetShop>()?;
    let second = container.resolve::<SweetShop>()?;

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(!Arc::ptr_eq(
        &first.sweet_vending_machine,
        &second.sweet_vending_machine
    ));
    assert!(Arc::ptr_eq(
        &first.sweet_vending_machine.jellybean_dispenser,
        &second.sweet_vending_machine.jellybean_dispenser
    ));

    Ok(())
}

#[test]
fn test_multi_binding_order_and_count() -> anyhow::Result<()> {
    init_test_logger();

    let container = DiContainerBuilder::new()
        .register_type(vanilla_dispenser(), |r| r.as_implemented_interfaces())
        .register_type(strawberry_dispenser(), |r| r.as_implemented_interfaces())
        .build();

    let flavours: Vec<Jellybean> = container
        .resolve_all::<dyn JellybeanDispenser>()?
        .iter()
        .map(|dispenser| dispenser.dispense_jellybean())
        .collect();

    assert_eq!(flavours, vec![Jellybean::Vanilla, Jellybean::Strawberry]);

    Ok(())
}

#[test]
fn test_scan_filter_excludes_third_binding() -> anyhow::Result<()> {
    init_test_logger();

    let rules = ScanRules::new().exclude_type::<AnyJellybeanDispenser>();
    let container = DiContainerBuilder::new()
        .scan(
            vec![
                vanilla_dispenser().into(),
                strawberry_dispenser().into(),
                any_dispenser().into(),
            ],
            &rules,
        )
        .build();

    let dispensers = container.resolve_all::<dyn JellybeanDispenser>()?;
    assert_eq!(dispensers.len(), 2);

    Ok(())
}

#[test]
fn test_last_registration_wins() -> anyhow::Result<()> {
    init_test_logger();

    let container = DiContainerBuilder::new()
        .register_type(vanilla_dispenser(), |r| r.as_implemented_interfaces())
        .register_type(strawberry_dispenser(), |r| r.as_implemented_interfaces())
        .build();
    assert_eq!(
        container.resolve::<dyn JellybeanDispenser>()?.dispense_jellybean(),
        Jellybean::Strawberry
    );

    let container = DiContainerBuilder::new()
        .register_type(vanilla_dispenser(), |r| r.as_implemented_interfaces())
        .register_type(strawberry_dispenser(), |r| r.as_implemented_interfaces())
        .register_type(vanilla_dispenser(), |r| r.as_implemented_interfaces())
        .build();
    assert_eq!(
        container.resolve::<dyn JellybeanDispenser>()?.dispense_jellybean(),
        Jellybean::Vanilla
    );
    assert_eq!(container.resolve_all::<dyn JellybeanDispenser>()?.len(), 3);

    Ok(())
}

#[test]
fn test_constructor_argument_binding() -> anyhow::Result<()> {
    init_test_logger();

    let container = DiContainerBuilder::new()
        .register_type(any_dispenser(), |r| {
            r.as_implemented_interfaces()
                .with_argument("jellybean", Jellybean::Lemon)
        })
        .register_type(sweet_vending_machine(), |r| r.as_self())
        .register_type(sweet_shop(), |r| r.as_self())
        .build();

    let shop = container.resolve::<SweetShop>()?;
    assert_eq!(shop.dispense_jelly_bean(), Jellybean::Lemon);

    Ok(())
}

#[test]
fn test_dependency_argument_overrides_resolution() -> anyhow::Result<()> {
    init_test_logger();

    let strawberry: Arc<dyn JellybeanDispenser> = Arc::new(StrawberryJellybeanDispenser);
    let container = DiContainerBuilder::new()
        .register_type(vanilla_dispenser(), |r| r.as_implemented_interfaces())
        .register_type(sweet_vending_machine(), |r| {
            r.as_self()
                .with_dependency("jellybean_dispenser", strawberry.clone())
        })
        .register_type(sweet_shop(), |r| {
            r.as_self().with_argument(
                "sweet_vending_machine",
                SweetVendingMachine {
                    jellybean_dispenser: Arc::new(VanillaJellybeanDispenser),
                },
            )
        })
        .build();

    let machine = container.resolve::<SweetVendingMachine>()?;
    assert!(Arc::ptr_eq(&machine.jellybean_dispenser, &strawberry));
    assert_eq!(
        machine.jellybean_dispenser.dispense_jellybean(),
        Jellybean::Strawberry
    );

    // 具体类型的依赖可以直接按值绑定
    let shop = container.resolve::<SweetShop>()?;
    assert_eq!(shop.dispense_jelly_bean(), Jellybean::Vanilla);

    Ok(())
}

#[test]
fn test_missing_scalar_argument() {
    init_test_logger();

    let container = DiContainerBuilder::new()
        .register_type(any_dispenser(), |r| r.as_implemented_interfaces())
        .build();

    let result = container.resolve::<dyn JellybeanDispenser>();
    assert!(matches!(
        result,
        Err(DependencyError::MissingArgument { ref parameter, .. }) if parameter == "jellybean"
    ));
}

#[test]
fn test_named_dispensers() -> anyhow::Result<()> {
    init_test_logger();

    let container = DiContainerBuilder::new()
        .register_type(vanilla_dispenser(), |r| {
            r.as_implemented_interfaces().named("vanilla")
        })
        .register_type(strawberry_dispenser(), |r| {
            r.as_implemented_interfaces().named("strawberry")
        })
        .register_type(any_dispenser(), |r| {
            r.as_implemented_interfaces()
                .named("orange")
                .with_argument("jellybean", Jellybean::Orange)
        })
        .build();

    let vanilla = container.resolve_named::<dyn JellybeanDispenser>("vanilla")?;
    let orange = container.resolve_named::<dyn JellybeanDispenser>("orange")?;

    assert_eq!(vanilla.dispense_jellybean(), Jellybean::Vanilla);
    assert_eq!(orange.dispense_jellybean(), Jellybean::Orange);
    assert_eq!(container.resolve_all::<dyn JellybeanDispenser>()?.len(), 3);

    Ok(())
}

#[test]
fn test_unregistered_service() {
    init_test_logger();

    let container = DiContainerBuilder::new().build();

    assert!(matches!(
        container.resolve::<dyn JellybeanDispenser>(),
        Err(DependencyError::UnregisteredService { .. })
    ));
    assert!(container
        .resolve_all::<dyn JellybeanDispenser>()
        .unwrap()
        .is_empty());
}

#[test]
fn test_lambda_factory_registration() -> anyhow::Result<()> {
    init_test_logger();

    let container = DiContainerBuilder::new()
        .register_factory::<dyn JellybeanDispenser, _>(Lifetime::Singleton, |_| {
            let dispenser: Arc<dyn JellybeanDispenser> = Arc::new(CocoaJellybeanDispenser);
            Ok(dispenser)
        })
        .register_factory::<SweetVendingMachine, _>(Lifetime::Transient, |injector| {
            Ok(Arc::new(SweetVendingMachine {
                jellybean_dispenser: injector.resolve::<dyn JellybeanDispenser>()?,
            }))
        })
        .register_type(sweet_shop(), |r| r.as_self())
        .build();

    let first = container.resolve::<SweetShop>()?;
    let second = container.resolve::<SweetShop>()?;

    assert_eq!(first.dispense_jelly_bean(), Jellybean::Cocoa);
    assert!(Arc::ptr_eq(
        &first.sweet_vending_machine.jellybean_dispenser,
        &second.sweet_vending_machine.jellybean_dispenser
    ));

    Ok(())
}

struct CocoaJellybeanDispenser;

impl JellybeanDispenser for CocoaJellybeanDispenser {
    fn dispense_jellybean(&self) -> Jellybean {
        Jellybean::Cocoa
    }
}
