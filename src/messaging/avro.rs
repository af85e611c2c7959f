//! Avro binary codec for the inbound and outbound event types.
//!
//! Values are single Avro datums with no container header and no registry
//! framing; both sides of every topic share the schemas below.

use apache_avro::{from_avro_datum, from_value, to_avro_datum, to_value, Schema};
use serde::{de::DeserializeOwned, Serialize};

use super::errors::{MessagingError, MessagingResult};
use crate::models::{ItemOrderedCertifiedCopy, SignDigitalDocument};

pub const ITEM_ORDERED_CERTIFIED_COPY_SCHEMA: &str = r#"
{
  "type": "record",
  "name": "ItemOrderedCertifiedCopy",
  "namespace": "uk.gov.companieshouse.itemorderedcertifiedcopy",
  "fields": [
    {"name": "order_number", "type": "string"},
    {"name": "item_id", "type": "string"},
    {"name": "group_item", "type": "string"},
    {"name": "company_name", "type": "string"},
    {"name": "company_number", "type": "string"},
    {"name": "filing_history_id", "type": "string"},
    {"name": "filing_history_type", "type": "string"},
    {"name": "filing_history_description", "type": "string"},
    {"name": "filing_history_description_values", "type": {"type": "map", "values": "string"}}
  ]
}
"#;

pub const SIGN_DIGITAL_DOCUMENT_SCHEMA: &str = r#"
{
  "type": "record",
  "name": "SignDigitalDocument",
  "namespace": "uk.gov.companieshouse.documentsigning",
  "fields": [
    {"name": "order_number", "type": "string"},
    {"name": "item_id", "type": "string"},
    {"name": "group_item", "type": "string"},
    {"name": "document_type", "type": "string"},
    {"name": "private_s3_location", "type": "string"},
    {"name": "filing_history_description_values", "type": {"type": "map", "values": "string"}},
    {
      "name": "cover_sheet_data",
      "type": {
        "type": "record",
        "name": "CoverSheetDataRecord",
        "fields": [
          {"name": "company_name", "type": "string"},
          {"name": "company_number", "type": "string"},
          {"name": "description", "type": "string"},
          {"name": "type", "type": "string"}
        ]
      }
    }
  ]
}
"#;

/// Parsed schemas, built once at startup and shared by every worker
#[derive(Debug, Clone)]
pub struct AvroCodec {
    item_ordered_certified_copy: Schema,
    sign_digital_document: Schema,
}

impl AvroCodec {
    pub fn new() -> MessagingResult<Self> {
        Ok(Self {
            item_ordered_certified_copy: Schema::parse_str(ITEM_ORDERED_CERTIFIED_COPY_SCHEMA)?,
            sign_digital_document: Schema::parse_str(SIGN_DIGITAL_DOCUMENT_SCHEMA)?,
        })
    }

    pub fn encode_item_ordered_certified_copy(
        &self,
        event: &ItemOrderedCertifiedCopy,
    ) -> MessagingResult<Vec<u8>> {
        encode(&self.item_ordered_certified_copy, event)
    }

    pub fn decode_item_ordered_certified_copy(
        &self,
        bytes: &[u8],
    ) -> MessagingResult<ItemOrderedCertifiedCopy> {
        decode(&self.item_ordered_certified_copy, bytes)
    }

    pub fn encode_sign_digital_document(
        &self,
        request: &SignDigitalDocument,
    ) -> MessagingResult<Vec<u8>> {
        encode(&self.sign_digital_document, request)
    }

    pub fn decode_sign_digital_document(
        &self,
        bytes: &[u8],
    ) -> MessagingResult<SignDigitalDocument> {
        decode(&self.sign_digital_document, bytes)
    }
}

fn encode<T: Serialize>(schema: &Schema, value: &T) -> MessagingResult<Vec<u8>> {
    let value = to_value(value)?.resolve(schema)?;
    Ok(to_avro_datum(schema, value)?)
}

fn decode<T: DeserializeOwned>(schema: &Schema, bytes: &[u8]) -> MessagingResult<T> {
    if bytes.is_empty() {
        return Err(MessagingError::codec("empty datum"));
    }
    let mut reader = bytes;
    let value = from_avro_datum(schema, &mut reader, None)?;
    Ok(from_value(&value)?)
}
