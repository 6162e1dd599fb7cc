//! JSON-aware redaction of JSONL records.

use serde_json::Value;

use crate::error::Result;
use crate::redactor::Redactor;
use crate::sink::{MatchSink, NoopSink};

impl Redactor {
    /// Redact every string leaf of `value`.
    ///
    /// Takes ownership and hands back the same value with only its strings
    /// changed. Keys, array order and non-string scalars are untouched.
    /// Clone first if the original is still needed.
    pub fn redact_json(&self, mut value: Value) -> Value {
        self.redact_json_in_place(&mut value, &mut NoopSink);
        value
    }

    /// Borrowing form of [`redact_json`](Self::redact_json).
    pub fn redact_json_in_place(&self, value: &mut Value, sink: &mut dyn MatchSink) {
        match value {
            Value::String(s) => {
                let redacted = self.redact_with(s, sink);
                if redacted != *s {
                    *s = redacted;
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.redact_json_in_place(item, sink);
                }
            }
            Value::Object(map) => {
                for (_, v) in map.iter_mut() {
                    self.redact_json_in_place(v, sink);
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }

    /// Redact one JSONL record, without its line terminator.
    ///
    /// Valid JSON is walked and re-serialized on a single line; anything else
    /// is redacted as plain text. Bytes that are not UTF-8 are replaced with
    /// U+FFFD before redaction.
    pub fn redact_line(&self, line: &[u8], sink: &mut dyn MatchSink) -> Result<Vec<u8>> {
        if line.is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_slice::<Value>(line) {
            Ok(mut value) => {
                self.redact_json_in_place(&mut value, sink);
                Ok(serde_json::to_vec(&value)?)
            }
            Err(_) => {
                let text = String::from_utf8_lossy(line);
                Ok(self.redact_with(&text, sink).into_bytes())
            }
        }
    }
}
