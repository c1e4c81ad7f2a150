//! # dicontainer
//!
//! A dynamic, string-keyed dependency injection container: register
//! abstract ids against concrete classes, factories, or instances; resolve
//! them through a autowiring/contextual-rewriting/extender pipeline; and
//! manage singleton, scoped, and transient lifetimes with ordered disposal.
//!
//! Unlike a `TypeId`-keyed container, ids here are caller-chosen strings
//! (`"App\\Contracts\\Logger"`, `"cache"`), so one abstract id can be bound to
//! different concretes depending on the consumer (`when().needs().give()`),
//! the same way a reflection-based container resolves interface bindings.
//!
//! ## Quick start
//!
//! ```rust
//! use dicontainer::{ContainerBuilder, Blueprint, ServicePrototype, ParameterPrototype, LifecycleFlags};
//! use dicontainer::prototype::AnyArc;
//! use dicontainer::DiResult;
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! impl Blueprint for Database {
//!     fn blueprint() -> ServicePrototype {
//!         ServicePrototype {
//!             class: "Database".into(),
//!             is_instantiable: true,
//!             constructor: vec![ParameterPrototype::required("dsn", "Dsn")],
//!             injected_properties: Vec::new(),
//!             injected_methods: Vec::new(),
//!             lifecycle: LifecycleFlags::default(),
//!         }
//!     }
//!
//!     fn construct(mut args: Vec<AnyArc>) -> DiResult<Self> {
//!         let dsn = args.pop().and_then(|v| v.downcast::<String>().ok()).unwrap();
//!         Ok(Database { connection_string: (*dsn).clone() })
//!     }
//! }
//!
//! let mut builder = ContainerBuilder::default();
//! builder.instance("Dsn", Arc::new("postgres://localhost".to_string()));
//! builder.singleton("Database").to::<Database>();
//! let container = builder.seal();
//!
//! let db = container.get::<Database>("Database").unwrap();
//! assert_eq!(db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Lifetimes
//!
//! - **Singleton**: created once, shared for the container's lifetime.
//! - **Scoped**: created once per [`Container::begin_scope`]/[`Container::end_scope`] pair.
//! - **Transient**: created fresh on every `Get`.
//!
//! ## Contextual bindings
//!
//! ```rust
//! use dicontainer::ContainerBuilder;
//! use dicontainer::prototype::AnyArc;
//! use std::sync::Arc;
//!
//! let mut builder = ContainerBuilder::default();
//! builder.bind("FileLogger").to_factory(|_| Ok(Arc::new("file".to_string()) as AnyArc));
//! builder.bind("RequestLogger").to_factory(|_| Ok(Arc::new("request".to_string()) as AnyArc));
//! builder.when("App\\Http\\Controller").needs("Logger").give("RequestLogger");
//! let container = builder.seal();
//! assert!(container.has("FileLogger"));
//! ```
//!
//! ## Scoped services
//!
//! ```rust
//! use dicontainer::ContainerBuilder;
//!
//! let container = ContainerBuilder::default().seal();
//! container.begin_scope();
//! container.end_scope().unwrap();
//! ```

pub mod analyzer;
pub mod config;
pub mod container;
pub mod context;
pub mod definition;
pub mod dispose;
pub mod engine;
pub mod error;
pub mod extender;
pub mod glob;
pub mod id;
pub mod lifetime;
pub mod observer;
pub mod policy;
pub mod prototype;
pub mod scope;
pub mod store;

mod internal;

pub use container::{Callable, CompilerPass, Container, ContainerBuilder};
pub use definition::{Argument, Concrete, DefinitionBuilder, ServiceDefinition};
pub use dispose::{AsyncDispose, Dispose};
pub use error::{DiError, DiResult};
pub use id::ServiceId;
pub use lifetime::Lifetime;
pub use observer::{DiEvent, DiObserver, LoggingObserver, NullObserver};
pub use policy::{AllowlistRule, DenylistRule, PolicyGuard, PolicyRule, StrictRule, Verdict};
pub use prototype::{Blueprint, LifecycleFlags, MethodPrototype, ParameterPrototype, PropertyPrototype, ServicePrototype};
pub use store::{ContextualRule, DefinitionStore};

#[cfg(feature = "config")]
pub use config::JsonConfigSource;
pub use config::{ContainerConfig, ConfigSource, EnvConfigSource, DEFAULT_MAX_RESOLUTION_DEPTH};
