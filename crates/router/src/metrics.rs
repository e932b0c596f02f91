use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic counters tracking dispatch outcomes.
///
/// All counters use relaxed ordering. For a consistent point-in-time view,
/// call [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Requests entering the dispatch pipeline.
    pub dispatched: AtomicU64,
    /// Lifecycles that reached `Completed`.
    pub completed: AtomicU64,
    /// Requests whose path matched no route.
    pub not_found: AtomicU64,
    /// Requests whose path matched only under other verbs.
    pub method_not_allowed: AtomicU64,
    /// Requests denied by the permission gate.
    pub forbidden: AtomicU64,
    /// Requests rejected by body parsing or validation.
    pub invalid: AtomicU64,
    /// Lifecycles failed with a caller fault.
    pub caller_faults: AtomicU64,
    /// Lifecycles failed with an internal fault.
    pub internal_faults: AtomicU64,
}

impl DispatchMetrics {
    pub fn increment_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_method_not_allowed(&self) {
        self.method_not_allowed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_forbidden(&self) {
        self.forbidden.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_invalid(&self) {
        self.invalid.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_caller_faults(&self) {
        self.caller_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_internal_faults(&self) {
        self.internal_faults.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            method_not_allowed: self.method_not_allowed.load(Ordering::Relaxed),
            forbidden: self.forbidden.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            caller_faults: self.caller_faults.load(Ordering::Relaxed),
            internal_faults: self.internal_faults.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`DispatchMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub dispatched: u64,
    pub completed: u64,
    pub not_found: u64,
    pub method_not_allowed: u64,
    pub forbidden: u64,
    pub invalid: u64,
    pub caller_faults: u64,
    pub internal_faults: u64,
}
