//! Property and method injection: precedence, ordering, and the inject-once
//! invariant (spec §4.5 PropertyInject/MethodInject, invariant 5).

use std::sync::Arc;

use dicontainer::prototype::AnyArc;
use dicontainer::{Blueprint, ContainerBuilder, DiError, DiResult, LifecycleFlags, MethodPrototype, ParameterPrototype, ServicePrototype};

struct Service {
    logger: Option<String>,
    configured_level: Option<i32>,
    configure_calls: usize,
}

impl Blueprint for Service {
    fn blueprint() -> ServicePrototype {
        ServicePrototype {
            class: "Service".into(),
            is_instantiable: true,
            constructor: Vec::new(),
            injected_properties: vec![ParameterPrototype::required("logger", "Logger")],
            injected_methods: vec![MethodPrototype {
                name: "configure".into(),
                parameters: vec![ParameterPrototype::required("level", "Level")],
            }],
            lifecycle: LifecycleFlags::default(),
        }
    }

    fn construct(_args: Vec<AnyArc>) -> DiResult<Self> {
        Ok(Service {
            logger: None,
            configured_level: None,
            configure_calls: 0,
        })
    }

    fn inject_property(&mut self, name: &str, value: AnyArc) -> DiResult<()> {
        if name == "logger" {
            self.logger = value.downcast_ref::<String>().cloned();
        }
        Ok(())
    }

    fn inject_method(&mut self, name: &str, mut args: Vec<AnyArc>) -> DiResult<()> {
        if name == "configure" {
            self.configure_calls += 1;
            self.configured_level = args.pop().and_then(|v| v.downcast_ref::<i32>().copied());
        }
        Ok(())
    }
}

#[test]
fn property_and_method_injection_run_once_in_order() {
    let mut builder = ContainerBuilder::default();
    builder.instance("Logger", Arc::new("stdout".to_string()));
    builder.instance("Level", Arc::new(3i32));
    builder.singleton("Service").to::<Service>();
    let container = builder.seal();

    let svc = container.get::<Service>("Service").unwrap();
    assert_eq!(svc.logger.as_deref(), Some("stdout"));
    assert_eq!(svc.configured_level, Some(3));
    assert_eq!(svc.configure_calls, 1);

    // Singleton identity: a second `Get` returns the same, already-injected
    // object rather than re-running PropertyInject/MethodInject.
    let svc_again = container.get::<Service>("Service").unwrap();
    assert!(Arc::ptr_eq(&svc, &svc_again));
    assert_eq!(svc_again.configure_calls, 1);
}

struct BadlyConfigured;

impl Blueprint for BadlyConfigured {
    fn blueprint() -> ServicePrototype {
        ServicePrototype {
            class: "BadlyConfigured".into(),
            is_instantiable: true,
            constructor: Vec::new(),
            // Marked for injection but with no resolvable dependency id and
            // no default: a `BadlyConfiguredService` per spec §4.2.
            injected_properties: vec![ParameterPrototype {
                name: "missing".into(),
                dependency: None,
                allows_null: false,
                has_default: false,
                is_variadic: false,
            }],
            injected_methods: Vec::new(),
            lifecycle: LifecycleFlags::default(),
        }
    }

    fn construct(_args: Vec<AnyArc>) -> DiResult<Self> {
        Ok(BadlyConfigured)
    }
}

#[test]
fn badly_configured_injection_point_surfaces_as_container_exception_at_resolution() {
    let mut builder = ContainerBuilder::default();
    builder.singleton("Bad").to::<BadlyConfigured>();
    let container = builder.seal();

    let err = container.get::<BadlyConfigured>("Bad").unwrap_err();
    match err {
        DiError::ContainerException(msg) => assert!(msg.contains("no resolvable type")),
        other => panic!("expected ContainerException, got {other:?}"),
    }
}

struct HasImmutableField;

impl Blueprint for HasImmutableField {
    fn blueprint() -> ServicePrototype {
        ServicePrototype {
            class: "HasImmutableField".into(),
            is_instantiable: true,
            constructor: Vec::new(),
            injected_properties: vec![ParameterPrototype::required("readonly", "Value")],
            injected_methods: Vec::new(),
            lifecycle: LifecycleFlags::default(),
        }
    }

    fn construct(_args: Vec<AnyArc>) -> DiResult<Self> {
        Ok(HasImmutableField)
    }

    fn inject_property(&mut self, name: &str, _value: AnyArc) -> DiResult<()> {
        // Host languages that expose a genuinely immutable/readonly field
        // surface that refusal here rather than silently dropping the value.
        Err(DiError::ImmutablePropertyInjection(name.to_string()))
    }
}

#[test]
fn a_blueprint_refusing_to_write_a_property_surfaces_immutable_property_injection() {
    let mut builder = ContainerBuilder::default();
    builder.instance("Value", Arc::new(1i32));
    builder.bind("HasImmutableField").to::<HasImmutableField>();
    let container = builder.seal();

    let err = container.get::<HasImmutableField>("HasImmutableField").unwrap_err();
    assert!(matches!(err, DiError::ImmutablePropertyInjection(name) if name == "readonly"));
}
