// 🔑 Row Hashing - content fingerprint per deal record
//
// The fingerprint covers the source fields only, in column order. The hash
// slot itself is never an input, so re-stamping a batch always yields the
// same values instead of hashing the previous hash.

use crate::deal::DealRecord;
use sha2::{Digest, Sha256};

/// Compute the content hash of a record.
///
/// Each field is length-prefixed before it is fed to SHA-256 so that
/// ("ab", "c") and ("a", "bc") hash differently. The first 8 bytes of the
/// digest are returned as a big-endian integer.
pub fn row_hash(record: &DealRecord) -> u64 {
    let mut hasher = Sha256::new();
    for field in record.source_fields() {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    let digest = hasher.finalize();

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

/// Stamp every record with a fresh hash, overwriting any previous one
pub fn stamp_hashes(records: &mut [DealRecord]) {
    for record in records.iter_mut() {
        record.content_hash = Some(row_hash(record));
    }
}
