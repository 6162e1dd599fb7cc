use std::io::Write;

use logshelf_security::MatchSink;

/// Destination for per-match debug lines.
///
/// Every line carries the matched secret in clear text. Only hand this a
/// local, trusted writer.
pub type DebugSink = Box<dyn Write + Send>;

/// Writes `[DEBUG] TAG: "matched" → "placeholder"` for every match.
pub struct DebugLog {
    out: DebugSink,
}

impl DebugLog {
    pub fn new(out: DebugSink) -> Self {
        Self { out }
    }
}

impl MatchSink for DebugLog {
    fn on_match(&mut self, tag: &str, matched: &str, placeholder: &str) {
        // Write errors are ignored; debug output never fails a stream.
        let _ = writeln!(
            self.out,
            "[DEBUG] {}: {:?} \u{2192} {:?}",
            tag, matched, placeholder
        );
    }
}
