//! Redaction engine for logshelf
//!
//! This crate contains:
//! - Pattern registry (ordered secret and PII detectors)
//! - Placeholder generation (`<TAG-hex>`, BLAKE3 based)
//! - Encoding bypass (base64 and percent-encoded secrets)
//! - JSON-aware JSONL line redaction
//! - Redaction statistics

pub mod decode;
pub mod error;
pub mod json;
pub mod normalize;
pub mod patterns;
pub mod placeholder;
pub mod redactor;
pub mod sink;
pub mod stats;

pub use error::{RedactError, Result};
pub use patterns::{BUILTIN, Pattern, PatternDef, PatternRegistry};
pub use placeholder::placeholder;
pub use redactor::{MAX_DECODE_DEPTH, Redactor};
pub use sink::{MatchSink, NoopSink, Tee};
pub use stats::{PatternCount, Stats};
