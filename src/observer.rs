//! Diagnostic observers for the resolution pipeline.
//!
//! Spec §9 asks for a single `(event-kind, payload)` observer interface
//! rather than a mandated sink: telemetry, metrics and workflow tracing all
//! sit on top of it if a host application wants them. This collapses the
//! several special-purpose observer traits `ferrous-di` grew over time
//! (`WorkflowObserver`, `MetricsObserver`, ...) down to the one hook the
//! spec actually names; `LoggingObserver` is the default binding, routed
//! through `tracing` rather than a hand-rolled logger.

use std::fmt;

/// One resolution-pipeline event, reported to a [`DiObserver`]. Borrows from
/// the engine's in-flight state, so an observer that wants to retain data
/// must copy it out of the event during `observe`.
#[derive(Debug, Clone)]
pub enum DiEvent<'a> {
    /// The engine entered a pipeline stage (`Guard`, `Analyze`, ...) for
    /// `service_id`, at the given resolution depth.
    Stage {
        service_id: &'a str,
        stage: &'static str,
        depth: usize,
    },
    /// `service_id` was already present in the scope registry; resolution
    /// short-circuited without touching the analyzer or constructor.
    CacheHit { service_id: &'a str },
    /// A fresh instance of `class` was constructed for `service_id`.
    Constructed { service_id: &'a str, class: &'a str },
    /// At least one extender ran for `service_id`.
    ExtenderApplied { service_id: &'a str },
    /// Resolution of `service_id` failed; `error` is the formatted cause.
    Failed { service_id: &'a str, error: &'a str },
}

impl fmt::Display for DiEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiEvent::Stage { service_id, stage, depth } => {
                write!(f, "{stage} {service_id} (depth {depth})")
            }
            DiEvent::CacheHit { service_id } => write!(f, "cache hit: {service_id}"),
            DiEvent::Constructed { service_id, class } => {
                write!(f, "constructed {service_id} as {class}")
            }
            DiEvent::ExtenderApplied { service_id } => write!(f, "extender applied to {service_id}"),
            DiEvent::Failed { service_id, error } => write!(f, "failed to resolve {service_id}: {error}"),
        }
    }
}

/// A single `(event-kind, payload)` observer hook. The core never mandates a
/// sink — a host wires whatever it needs (logs, metrics, a trace UI) behind
/// this one trait.
pub trait DiObserver: Send + Sync {
    fn observe(&self, event: DiEvent<'_>);
}

/// The default observer: discards every event. Cheaper than an `Option` check
/// at every stage transition.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl DiObserver for NullObserver {
    fn observe(&self, _event: DiEvent<'_>) {}
}

/// Routes every event through `tracing`. Stage transitions and cache hits are
/// `trace`-level (high-frequency, only interesting with verbose logging
/// enabled); construction, extender application and failures are
/// `debug`-level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl DiObserver for LoggingObserver {
    fn observe(&self, event: DiEvent<'_>) {
        match &event {
            DiEvent::Stage { .. } | DiEvent::CacheHit { .. } => tracing::trace!(%event),
            DiEvent::Failed { .. } => tracing::warn!(%event),
            _ => tracing::debug!(%event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingObserver(AtomicUsize);

    impl DiObserver for CountingObserver {
        fn observe(&self, _event: DiEvent<'_>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn null_observer_does_nothing() {
        NullObserver.observe(DiEvent::CacheHit { service_id: "x" });
    }

    #[test]
    fn custom_observer_counts_events() {
        let obs = CountingObserver::default();
        obs.observe(DiEvent::Stage {
            service_id: "A",
            stage: "Guard",
            depth: 0,
        });
        obs.observe(DiEvent::Constructed {
            service_id: "A",
            class: "Widget",
        });
        assert_eq!(obs.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn event_display_is_human_readable() {
        let event = DiEvent::Failed {
            service_id: "App\\Logger",
            error: "not found",
        };
        assert_eq!(event.to_string(), "failed to resolve App\\Logger: not found");
    }
}
