//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Authentication Metrics
    pub static ref AUTH_ATTEMPTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("gatehouse_auth_attempts_total", "Total number of authentication attempts"),
        &["flow", "outcome"]
    ).expect("metric can be created");
    pub static ref TOKENS_ISSUED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("gatehouse_tokens_issued_total", "Total number of access tokens issued"),
        &["flow"]
    ).expect("metric can be created");

    // Cache Metrics
    pub static ref CACHE_HITS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("gatehouse_cache_hits_total", "Total number of cache hits"),
        &["cache_name"]
    ).expect("metric can be created");
    pub static ref CACHE_MISSES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("gatehouse_cache_misses_total", "Total number of cache misses"),
        &["cache_name"]
    ).expect("metric can be created");

    // Rate Limit Metrics
    pub static ref RATE_LIMITED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("gatehouse_rate_limited_total", "Total number of rate-limited requests"),
        &["group"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("gatehouse_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(AUTH_ATTEMPTS_TOTAL.clone()))
        .expect("AUTH_ATTEMPTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(TOKENS_ISSUED_TOTAL.clone()))
        .expect("TOKENS_ISSUED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(CACHE_HITS_TOTAL.clone()))
        .expect("CACHE_HITS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(CACHE_MISSES_TOTAL.clone()))
        .expect("CACHE_MISSES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(RATE_LIMITED_TOTAL.clone()))
        .expect("RATE_LIMITED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}
