//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Authentication Metrics
    pub static ref LOGIN_ATTEMPTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("sulabh_auth_login_attempts_total", "Total number of login attempts"),
        &["outcome"]
    ).expect("metric can be created");
    pub static ref REGISTRATIONS_TOTAL: IntCounter = IntCounter::new(
        "sulabh_auth_registrations_total",
        "Total number of successful registrations"
    ).expect("metric can be created");

    // Session Metrics
    pub static ref SESSIONS_CREATED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("sulabh_auth_sessions_created_total", "Total number of sessions created"),
        &["kind"]
    ).expect("metric can be created");
    pub static ref SESSIONS_REMOVED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("sulabh_auth_sessions_removed_total", "Total number of sessions removed"),
        &["reason"]
    ).expect("metric can be created");
    pub static ref SESSION_TOUCHES_TOTAL: IntCounter = IntCounter::new(
        "sulabh_auth_session_touches_total",
        "Total number of session expiry extensions"
    ).expect("metric can be created");
    pub static ref ACTIVE_SESSIONS: IntGauge = IntGauge::new(
        "sulabh_auth_active_sessions",
        "Number of non-expired sessions at last sweep"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("sulabh_auth_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(LOGIN_ATTEMPTS_TOTAL.clone()))
        .expect("LOGIN_ATTEMPTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(REGISTRATIONS_TOTAL.clone()))
        .expect("REGISTRATIONS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(SESSIONS_CREATED_TOTAL.clone()))
        .expect("SESSIONS_CREATED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(SESSIONS_REMOVED_TOTAL.clone()))
        .expect("SESSIONS_REMOVED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(SESSION_TOUCHES_TOTAL.clone()))
        .expect("SESSION_TOUCHES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ACTIVE_SESSIONS.clone()))
        .expect("ACTIVE_SESSIONS can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
