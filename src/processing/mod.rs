//! # Processing
//!
//! Failure taxonomy, sign request construction, and the handler that turns
//! one order event into one sign request.

pub mod errors;
pub mod processor;
pub mod sign_document;

pub use errors::{FailureKind, ProcessingError, ProcessingResult};
pub use processor::CertifiedCopyProcessor;
pub use sign_document::{DeliveryTask, SignDigitalDocumentFactory, SignDocumentPublisher};
