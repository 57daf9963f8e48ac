//! Byte encoding of the durable catalog.
//!
//! The catalog is stored as a compact JSON array of product objects. An empty
//! (or whitespace-only) buffer is the encoding of an empty catalog, so a
//! freshly created file needs no seeding.

use thiserror::Error;

use crate::domain::catalog::Catalog;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("catalog bytes are not a valid product array: {0}")]
    Corrupt(#[source] serde_json::Error),
    #[error("catalog could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Encodes `catalog` as a JSON array.
///
/// Every field is a string or a JSON value, so this does not fail for any
/// catalog built through the domain types.
pub fn encode(catalog: &Catalog) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(catalog).map_err(CodecError::Encode)
}

pub fn decode(bytes: &[u8]) -> Result<Catalog, CodecError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Catalog::default());
    }

    serde_json::from_slice(bytes).map_err(CodecError::Corrupt)
}
