//! Lifecycle capability hooks: `Blueprint::initialize`/`terminate`, run once
//! each per spec §3/§4.2/§4.5's `Initialize` stage and teardown semantics.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dicontainer::prototype::AnyArc;
use dicontainer::{Blueprint, ContainerBuilder, DiResult, LifecycleFlags, ServicePrototype};

static INIT_COUNT: AtomicUsize = AtomicUsize::new(0);
static TERMINATE_COUNT: AtomicUsize = AtomicUsize::new(0);

struct Worker;

impl Blueprint for Worker {
    fn blueprint() -> ServicePrototype {
        ServicePrototype {
            class: "Worker".into(),
            is_instantiable: true,
            constructor: Vec::new(),
            injected_properties: Vec::new(),
            injected_methods: Vec::new(),
            lifecycle: LifecycleFlags {
                has_initializer: true,
                has_terminator: true,
            },
        }
    }

    fn construct(_args: Vec<AnyArc>) -> DiResult<Self> {
        Ok(Worker)
    }

    fn initialize(&mut self) {
        INIT_COUNT.fetch_add(1, Ordering::SeqCst);
    }

    fn terminate(&mut self) {
        TERMINATE_COUNT.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn initializer_runs_exactly_once_for_a_singleton() {
    INIT_COUNT.store(0, Ordering::SeqCst);
    let mut builder = ContainerBuilder::default();
    builder.singleton("Worker").to::<Worker>();
    let container = builder.seal();

    let _a = container.get::<Worker>("Worker").unwrap();
    let _b = container.get::<Worker>("Worker").unwrap();
    assert_eq!(INIT_COUNT.load(Ordering::SeqCst), 1);
}

#[test]
fn initializer_runs_for_every_transient_build() {
    INIT_COUNT.store(0, Ordering::SeqCst);
    let mut builder = ContainerBuilder::default();
    builder.bind("Worker").to::<Worker>();
    let container = builder.seal();

    container.get::<Worker>("Worker").unwrap();
    container.get::<Worker>("Worker").unwrap();
    assert_eq!(INIT_COUNT.load(Ordering::SeqCst), 2);
}

#[test]
fn terminator_runs_on_container_shutdown_for_a_singleton() {
    TERMINATE_COUNT.store(0, Ordering::SeqCst);
    let mut builder = ContainerBuilder::default();
    builder.singleton("Worker").to::<Worker>();
    let container = builder.seal();

    {
        let _worker = container.get::<Worker>("Worker").unwrap();
    }
    assert_eq!(TERMINATE_COUNT.load(Ordering::SeqCst), 0);

    container.shutdown();
    assert_eq!(TERMINATE_COUNT.load(Ordering::SeqCst), 1);
}

#[test]
fn terminator_runs_on_end_scope_for_a_scoped_instance() {
    TERMINATE_COUNT.store(0, Ordering::SeqCst);
    let mut builder = ContainerBuilder::default();
    builder.scoped("Worker").to::<Worker>();
    let container = builder.seal();

    container.begin_scope();
    {
        let _worker = container.get::<Worker>("Worker").unwrap();
    }
    container.end_scope().unwrap();
    assert_eq!(TERMINATE_COUNT.load(Ordering::SeqCst), 1);
}
