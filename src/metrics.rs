//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use std::sync::Once;

static INIT: Once = Once::new();

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Authentication Metrics
    pub static ref AUTH_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("inlab_auth_failures_total", "Total number of rejected credentials"),
        &["scheme", "reason"]
    ).expect("metric can be created");
    pub static ref LOGINS_TOTAL: IntCounter = IntCounter::new(
        "inlab_logins_total",
        "Total number of completed GitHub sign-ins"
    ).expect("metric can be created");
    pub static ref USERS_CREATED_TOTAL: IntCounter = IntCounter::new(
        "inlab_users_created_total",
        "Total number of users created on first sign-in"
    ).expect("metric can be created");

    // Attendance Metrics
    pub static ref ATTENDANCE_EVENTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("inlab_attendance_events_total", "Total number of check-ins and check-outs"),
        &["action"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("inlab_errors_total", "Total number of error responses"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Register all instruments with `REGISTRY`.
///
/// Safe to call more than once; only the first call registers.
pub fn init_metrics() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
            .expect("AUTH_FAILURES_TOTAL can be registered");
        REGISTRY
            .register(Box::new(LOGINS_TOTAL.clone()))
            .expect("LOGINS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(USERS_CREATED_TOTAL.clone()))
            .expect("USERS_CREATED_TOTAL can be registered");
        REGISTRY
            .register(Box::new(ATTENDANCE_EVENTS_TOTAL.clone()))
            .expect("ATTENDANCE_EVENTS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(ERRORS_TOTAL.clone()))
            .expect("ERRORS_TOTAL can be registered");

        tracing::info!("Metrics registry initialized");
    });
}
