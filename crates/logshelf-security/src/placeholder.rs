//! Deterministic placeholders for redacted spans.
//!
//! A placeholder is `<TAG-hex>` where `hex` is the leading
//! [`HASH_PREFIX_BYTES`] bytes of the BLAKE3 digest of the matched text.
//! No key or salt is mixed in: the same secret must map to the same
//! placeholder on every machine so redaction coverage can be compared.

/// Digest bytes kept in a placeholder (96 bits).
pub const HASH_PREFIX_BYTES: usize = 12;

/// Tag used when an encoded run hides a secret.
pub const BASE64_TAG: &str = "BASE64_SECRET";

/// Prefix of an encoded-secret placeholder. Text that already carries one
/// has been through the encoding bypass.
pub const BASE64_MARKER: &str = "<BASE64_SECRET-";

/// Build the placeholder for `matched` under `tag`.
pub fn placeholder(tag: &str, matched: &str) -> String {
    let digest = blake3::hash(matched.as_bytes());
    let hex = digest.to_hex();
    format!("<{}-{}>", tag, &hex.as_str()[..HASH_PREFIX_BYTES * 2])
}
