//! Environment-driven configuration loading.
//!
//! Every variable in [`REQUIRED`](crate::constants::env::REQUIRED) must be
//! present; all missing ones are logged before the load fails so an operator
//! sees the complete list in one start attempt.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use config::{Config as RawConfig, Environment};
use serde::Deserialize;
use tracing::{error, info};

use super::{ApiConfig, KafkaConfig, ProcessorConfig, RetryConfig, TopicConfig};
use crate::constants::{env, DEFAULT_FILING_HISTORY_DESCRIPTIONS_PATH};
use crate::error::{ProcessorError, Result};

const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_POLL_TIMEOUT_MILLIS: u64 = 1000;

/// Flat view of the environment, keyed by lower-cased variable name
#[derive(Debug, Deserialize)]
struct EnvironmentSettings {
    bootstrap_server_url: String,
    group_id: String,
    item_ordered_certified_copy_topic: String,
    sign_digital_document_topic: String,
    invalid_item_ordered_certified_copy_topic: String,
    max_attempts: u32,
    backoff_delay: u64,
    concurrent_listener_instances: usize,
    api_url: String,
    document_api_local_url: String,
    chs_api_key: String,
    filing_history_descriptions_path: Option<String>,
    http_timeout_seconds: Option<u64>,
    poll_timeout_millis: Option<u64>,
}

impl From<EnvironmentSettings> for ProcessorConfig {
    fn from(settings: EnvironmentSettings) -> Self {
        Self {
            kafka: KafkaConfig {
                bootstrap_servers: settings.bootstrap_server_url,
                group_id: settings.group_id,
                concurrency: settings.concurrent_listener_instances,
                poll_timeout: Duration::from_millis(
                    settings
                        .poll_timeout_millis
                        .unwrap_or(DEFAULT_POLL_TIMEOUT_MILLIS),
                ),
            },
            topics: TopicConfig {
                item_ordered_certified_copy: settings.item_ordered_certified_copy_topic,
                sign_digital_document: settings.sign_digital_document_topic,
                invalid_item_ordered_certified_copy: settings
                    .invalid_item_ordered_certified_copy_topic,
            },
            retry: RetryConfig {
                max_attempts: settings.max_attempts,
                backoff_delay: Duration::from_millis(settings.backoff_delay),
            },
            api: ApiConfig {
                api_url: settings.api_url,
                document_api_url: settings.document_api_local_url,
                api_key: settings.chs_api_key,
                request_timeout: Duration::from_secs(
                    settings
                        .http_timeout_seconds
                        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECONDS),
                ),
            },
            filing_history_descriptions_path: PathBuf::from(
                settings
                    .filing_history_descriptions_path
                    .unwrap_or_else(|| DEFAULT_FILING_HISTORY_DESCRIPTIONS_PATH.to_string()),
            ),
        }
    }
}

/// Loaded and validated configuration
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: ProcessorConfig,
    environment: String,
}

impl ConfigManager {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::load(Environment::default())
    }

    /// Load configuration from an explicit variable map instead of the process environment
    pub fn from_map(variables: HashMap<String, String>) -> Result<Self> {
        Self::load(Environment::default().source(Some(variables)))
    }

    fn load(source: Environment) -> Result<Self> {
        let raw = RawConfig::builder().add_source(source).build()?;

        let missing = missing_required_variables(&raw);
        if !missing.is_empty() {
            for name in &missing {
                error!(variable = %name, "Required config item {} missing", name);
            }
            return Err(ProcessorError::configuration(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }
        info!("All required environment variables present");

        let environment = raw
            .get_string("app_env")
            .unwrap_or_else(|_| "development".to_string());

        let settings: EnvironmentSettings = raw.try_deserialize().map_err(|e| {
            ProcessorError::configuration(format!("Failed to parse environment: {e}"))
        })?;
        let config = ProcessorConfig::from(settings);
        config.validate()?;

        Ok(Self {
            config,
            environment,
        })
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Configuration as JSON, with credentials omitted
    pub fn debug_config(&self) -> serde_json::Value {
        serde_json::json!({
            "environment": self.environment,
            "config": serde_json::to_value(&self.config).unwrap_or(serde_json::Value::Null),
        })
    }
}

fn missing_required_variables(raw: &RawConfig) -> Vec<&'static str> {
    env::REQUIRED
        .iter()
        .copied()
        .filter(|name| match raw.get_string(&name.to_lowercase()) {
            Ok(value) => value.trim().is_empty(),
            Err(_) => true,
        })
        .collect()
}
