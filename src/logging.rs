//! # Structured Logging Module
//!
//! Environment-aware structured logging. Development and test builds get
//! human-readable console output; production emits JSON lines so that
//! topic/partition/offset fields can be indexed.

use std::sync::OnceLock;

use chrono::Utc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));

        let console_layer = if environment == "production" {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // try_init: a test harness may already have installed a subscriber
        if tracing_subscriber::registry()
            .with(console_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already initialized - continuing");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

fn get_environment() -> String {
    std::env::var("APP_ENV")
        .or_else(|_| std::env::var("ENVIRONMENT"))
        .unwrap_or_else(|_| "development".to_string())
}

fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for a consumed or republished kafka record
pub fn log_record_operation(
    operation: &str,
    topic: &str,
    partition: i32,
    offset: i64,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        topic = %topic,
        partition = partition,
        offset = offset,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📨 RECORD_OPERATION"
    );
}

/// Log structured data for an upstream API call
pub fn log_upstream_operation(
    service: &str,
    operation: &str,
    status: &str,
    http_status: Option<u16>,
    details: Option<&str>,
) {
    tracing::info!(
        service = %service,
        operation = %operation,
        status = %status,
        http_status = http_status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "🌐 UPSTREAM_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}
