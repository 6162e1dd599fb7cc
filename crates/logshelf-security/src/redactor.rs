use std::borrow::Cow;

use crate::decode::EncodingProbe;
use crate::normalize;
use crate::patterns::PatternRegistry;
use crate::placeholder::BASE64_MARKER;
use crate::sink::{MatchSink, NoopSink};

/// How many layers of encoding are peeled before matching.
///
/// Decoded text is redacted with the bypass switched off, so a secret hidden
/// under two layers of base64 is only caught if the registry recognizes the
/// inner layer on its own.
pub const MAX_DECODE_DEPTH: usize = 1;

/// Text redaction engine.
///
/// Owns an immutable [`PatternRegistry`]; every method takes `&self`, so one
/// `Redactor` can be shared across threads behind an `Arc`.
pub struct Redactor {
    registry: PatternRegistry,
    probe: EncodingProbe,
}

impl Redactor {
    pub fn new(registry: PatternRegistry) -> Self {
        Self {
            registry,
            probe: EncodingProbe::new(),
        }
    }

    /// Redactor over the built-in catalogue.
    pub fn builtin() -> Self {
        Self::new(PatternRegistry::builtin())
    }

    /// Replace every secret in `text` with its placeholder.
    pub fn redact(&self, text: &str) -> String {
        self.redact_with(text, &mut NoopSink)
    }

    /// Like [`redact`](Self::redact), reporting each replacement to `sink`.
    pub fn redact_with(&self, text: &str, sink: &mut dyn MatchSink) -> String {
        self.redact_at(text, 0, sink)
    }

    fn redact_at(&self, text: &str, depth: usize, sink: &mut dyn MatchSink) -> String {
        let mut current = normalize::nfc(text);

        if depth < MAX_DECODE_DEPTH && !current.contains(BASE64_MARKER) {
            let recurse =
                |decoded: &str, sink: &mut dyn MatchSink| self.redact_at(decoded, depth + 1, sink);
            if let Some(rewritten) = self.probe.rewrite(&current, &recurse, sink) {
                current = Cow::Owned(rewritten);
            }
        }

        for pattern in self.registry.iter() {
            if let Some(next) = pattern.apply(&current, sink) {
                current = Cow::Owned(next);
            }
        }

        current.into_owned()
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::builtin()
    }
}
