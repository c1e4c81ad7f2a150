//! Scope lifetime: isolation between scopes, visibility of singletons inside
//! a scope, and the error surfaced when there is no active scope.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dicontainer::prototype::AnyArc;
use dicontainer::{ContainerBuilder, DiError};

#[test]
fn scoped_service_is_isolated_between_scopes() {
    let counter = Arc::new(AtomicUsize::new(0));
    let mut builder = ContainerBuilder::default();
    builder.scoped("RequestId").to_factory({
        let counter = counter.clone();
        move |_| Ok(Arc::new(counter.fetch_add(1, Ordering::SeqCst)) as AnyArc)
    });
    let container = builder.seal();

    container.begin_scope();
    let a1 = container.get_by_id("RequestId").unwrap();
    let a2 = container.get_by_id("RequestId").unwrap();
    assert!(Arc::ptr_eq(&a1, &a2));
    container.end_scope().unwrap();

    container.begin_scope();
    let b1 = container.get_by_id("RequestId").unwrap();
    assert_ne!(*a1.downcast_ref::<usize>().unwrap(), *b1.downcast_ref::<usize>().unwrap());
    container.end_scope().unwrap();
}

#[test]
fn singleton_is_visible_from_inside_a_nested_scope() {
    let mut builder = ContainerBuilder::default();
    builder.instance("Config", Arc::new("prod".to_string()));
    let container = builder.seal();

    container.begin_scope();
    let cfg = container.get_by_id("Config").unwrap();
    assert_eq!(*cfg.downcast_ref::<String>().unwrap(), "prod");
    container.end_scope().unwrap();
}

#[test]
fn ending_a_scope_with_none_active_fails() {
    let container = ContainerBuilder::default().seal();
    let err = container.end_scope().unwrap_err();
    assert!(matches!(err, DiError::NoActiveScope));
}

#[test]
fn scopes_nest_and_each_end_scope_pops_exactly_one_frame() {
    let container = ContainerBuilder::default().seal();
    container.begin_scope();
    container.begin_scope();
    container.end_scope().unwrap();
    container.end_scope().unwrap();
    assert!(matches!(container.end_scope().unwrap_err(), DiError::NoActiveScope));
}
