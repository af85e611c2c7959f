//! # Message Models
//!
//! Value types for the inbound order event and the outbound sign request.
//! Both are plain serde structs; the Avro codec in
//! [`messaging::avro`](crate::messaging::avro) maps them to and from wire bytes.

pub mod item_ordered_certified_copy;
pub mod sign_digital_document;

pub use item_ordered_certified_copy::ItemOrderedCertifiedCopy;
pub use sign_digital_document::{CoverSheetData, SignDigitalDocument};
