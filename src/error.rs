//! Error types for the dependency injection container.

use std::fmt;

/// Dependency injection errors.
///
/// Represents the various error conditions that can occur during service
/// registration, resolution, or container operations.
///
/// # Examples
///
/// ```rust
/// use dicontainer::DiError;
///
/// let not_found = DiError::ServiceNotFound("App\\Logger".into());
/// let circular = DiError::CircularDependency(vec!["A".into(), "B".into(), "A".into()]);
///
/// println!("{}", not_found);
/// println!("{}", circular);
/// ```
#[derive(Debug, Clone)]
pub enum DiError {
    /// The abstract id is unknown and not autowireable under the current policy.
    ServiceNotFound(String),
    /// A cycle was detected while resolving a dependency chain; carries the full
    /// path, e.g. `["A", "B", "A"]`.
    CircularDependency(Vec<String>),
    /// Generic failure while building an instance (constructor/factory/injection
    /// failed). Wraps the inner cause as a formatted message.
    ResolutionException(String),
    /// A configuration or analysis failure — e.g. a property marked for injection
    /// has no resolvable type and no default value (`BadlyConfiguredService`), or a
    /// user-supplied extender/factory raised an exception.
    ContainerException(String),
    /// The policy guard denied this resolution; carries the human-readable reason.
    PolicyBlocked(String),
    /// A scoped operation (`SetScoped`/`EndScope`) was attempted with only the root
    /// frame present.
    NoActiveScope,
    /// An injected property could not be written to (the target field or language
    /// construct does not permit it).
    ImmutablePropertyInjection(String),
    /// `maxResolutionDepth` was exceeded.
    DepthExceeded(usize),
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::ServiceNotFound(id) => write!(f, "service not found: {id}"),
            DiError::CircularDependency(path) => {
                write!(f, "circular dependency: {}", path.join(" -> "))
            }
            DiError::ResolutionException(msg) => write!(f, "resolution failed: {msg}"),
            DiError::ContainerException(msg) => write!(f, "container error: {msg}"),
            DiError::PolicyBlocked(reason) => write!(f, "blocked by policy: {reason}"),
            DiError::NoActiveScope => write!(f, "no active scope"),
            DiError::ImmutablePropertyInjection(name) => {
                write!(f, "cannot inject into immutable property: {name}")
            }
            DiError::DepthExceeded(depth) => write!(f, "max resolution depth {depth} exceeded"),
        }
    }
}

impl std::error::Error for DiError {}

/// Result type for DI operations.
pub type DiResult<T> = Result<T, DiError>;
