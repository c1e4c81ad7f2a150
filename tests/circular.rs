//! Circular dependency and max-depth detection.

use std::sync::Arc;

use dicontainer::engine::Resolve;
use dicontainer::prototype::AnyArc;
use dicontainer::{ContainerBuilder, DiError};

#[test]
fn direct_cycle_between_two_factories_is_reported() {
    let mut builder = ContainerBuilder::default();
    builder.bind("A").to_factory(|r| r.resolve(&"B".into()));
    builder.bind("B").to_factory(|r| r.resolve(&"A".into()));
    let container = builder.seal();

    let err = container.get_by_id("A").unwrap_err();
    match err {
        DiError::CircularDependency(path) => {
            assert_eq!(path.first(), path.last());
            assert!(path.contains(&"A".to_string()));
            assert!(path.contains(&"B".to_string()));
        }
        other => panic!("expected CircularDependency, got {other:?}"),
    }
}

#[test]
fn self_referential_binding_is_a_cycle_of_length_one() {
    let mut builder = ContainerBuilder::default();
    builder.bind("A").to_factory(|r| r.resolve(&"A".into()));
    let container = builder.seal();

    assert!(matches!(container.get_by_id("A").unwrap_err(), DiError::CircularDependency(_)));
}

#[test]
fn a_long_but_finite_chain_resolves_fine() {
    let mut builder = ContainerBuilder::default();
    builder.bind("A").to_factory(|_| Ok(Arc::new(1i32) as AnyArc));
    builder.bind("B").to_factory(|r| r.resolve(&"A".into()));
    builder.bind("C").to_factory(|r| r.resolve(&"B".into()));
    let container = builder.seal();

    let value = container.get_by_id("C").unwrap();
    assert_eq!(*value.downcast_ref::<i32>().unwrap(), 1);
}
