use serde_json::Value as Json;
use sha2::{Digest, Sha256};
use tppl_core::TpplError;

use crate::codec::to_bytes;

/// Hex SHA-256 of the compact serialization of an encoded document.
///
/// Field order is the encoding order, so equal inputs built the same way hash
/// identically across runs.
pub fn input_digest(document: &Json) -> Result<String, TpplError> {
    let bytes = to_bytes(document)?;
    Ok(hex::encode(Sha256::digest(bytes)))
}
