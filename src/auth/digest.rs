/// One-way digest used for refresh-token-at-rest storage.
///
/// The store holds only this digest, never the signed token, so a store
/// compromise does not yield usable bearer credentials. Not for
/// passwords: those go through `auth::password`.

use sha2::{Digest, Sha256};

/// SHA-256 digest as lowercase hex.
pub fn sha256_hex(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    format!("{:x}", hasher.finalize())
}
