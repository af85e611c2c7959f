use std::collections::BTreeMap;

use proptest::prelude::*;

use certified_copy_processor::ItemOrderedCertifiedCopy;

/// Strategy for S3 bucket names as they appear in the virtual-host label
pub fn bucket_strategy() -> impl Strategy<Value = String> {
    "[a-z]{3}[a-z0-9-]{0,27}[a-z0-9]"
}

/// Strategy for object keys ending in the PDF content suffix
pub fn object_key_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[A-Za-z0-9_-]{1,24}", 1..4)
        .prop_map(|segments| format!("{}/application-pdf", segments.join("/")))
}

/// Strategy for presigned query strings
pub fn signature_query_strategy() -> impl Strategy<Value = String> {
    ("[0-9]{8}T[0-9]{6}Z", "[0-9a-f]{16,64}").prop_map(|(date, signature)| {
        format!("X-Amz-Algorithm=AWS4-HMAC-SHA256&X-Amz-Date={date}&X-Amz-Signature={signature}")
    })
}

/// Strategy for hosts that are not the public document bucket
pub fn foreign_host_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{3,12}\\.example\\.com",
        "[a-z]{3,12}\\.s3\\.us-east-1\\.amazonaws\\.com",
        Just("localhost".to_string()),
    ]
}

/// Strategy for message keys, including absent ones
pub fn key_strategy() -> impl Strategy<Value = Option<String>> {
    prop::option::of("ORD-[0-9]{6}-[0-9]{6}")
}

/// Strategy for arbitrary payload bytes
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..256)
}

/// Strategy for order events
pub fn certified_copy_strategy() -> impl Strategy<Value = ItemOrderedCertifiedCopy> {
    (
        "ORD-[0-9]{6}-[0-9]{6}",
        "CCD-[0-9]{6}-[0-9]{6}",
        "[A-Z][A-Za-z ]{0,40} Limited",
        "[0-9]{8}",
        "[A-Za-z0-9]{24}",
        "[A-Z]{2}[0-9]{2}",
        "[a-z]+(-[a-z]+){0,5}",
        prop::collection::btree_map("[a-z_]{1,16}", "[A-Za-z0-9 ]{0,32}", 0..4),
    )
        .prop_map(
            |(
                order_number,
                item_id,
                company_name,
                company_number,
                filing_history_id,
                filing_history_type,
                filing_history_description,
                values,
            )| ItemOrderedCertifiedCopy {
                group_item: format!("/item-groups/IG-000000-000000/items/{item_id}"),
                order_number,
                item_id,
                company_name,
                company_number,
                filing_history_id,
                filing_history_type,
                filing_history_description,
                filing_history_description_values: values.into_iter().collect::<BTreeMap<_, _>>(),
            },
        )
}
