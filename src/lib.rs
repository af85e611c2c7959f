#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Certified Copy Processor
//!
//! Kafka event processor that turns an "item ordered - certified copy" event
//! into a "sign digital document" request.
//!
//! ## Overview
//!
//! For each order event the processor asks the filing history API for the
//! document metadata of the filing, asks the document API for the document's
//! short-lived public S3 URI, rewrites that into a private `s3://` URI, looks
//! up the display text of the filing description, and publishes the sign
//! request.
//!
//! ## Delivery Reliability
//!
//! Failures are classified as Retryable or NonRetryable. Retryable failures
//! walk a chain of retry topics with a fixed backoff and end on a dead-letter
//! topic; NonRetryable failures and undecodable payloads go to the invalid
//! topic immediately. Offsets are committed per record once the record has
//! been processed or handed to the next topic.
//!
//! ## Module Organization
//!
//! - [`config`] - Environment-driven configuration
//! - [`error`] - Top-level error type
//! - [`messaging`] - Record types, Avro codec, Kafka and in-memory providers
//! - [`services`] - Filing history and document API clients, URI rewrite, descriptions
//! - [`processing`] - Failure taxonomy and the per-message handler
//! - [`retry`] - Retry chain topology, invalid-message routing, worker pool
//! - [`bootstrap`] - Assemble and run the pipeline
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use certified_copy_processor::bootstrap::ProcessorSystem;
//! use certified_copy_processor::config::ConfigManager;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! certified_copy_processor::logging::init_structured_logging();
//!
//! let config_manager = ConfigManager::from_env()?;
//! let system = ProcessorSystem::bootstrap(&config_manager)?;
//! system.start()?;
//!
//! tokio::signal::ctrl_c().await?;
//! system.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod processing;
pub mod retry;
pub mod services;

pub use bootstrap::{ProcessorSystem, SystemStatus};
pub use config::{ConfigManager, ProcessorConfig};
pub use error::{ProcessorError, Result};
pub use models::{CoverSheetData, ItemOrderedCertifiedCopy, SignDigitalDocument};
pub use processing::{FailureKind, ProcessingError, ProcessingResult};
