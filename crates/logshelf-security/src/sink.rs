//! Match callbacks.
//!
//! Every replacement the engine makes is reported to a [`MatchSink`] with the
//! pattern tag, the matched text and the placeholder that replaced it.
//! Counting sinks should only look at the tag.

/// Receives one call per replacement.
pub trait MatchSink {
    fn on_match(&mut self, tag: &str, matched: &str, placeholder: &str);
}

/// Discards every match.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl MatchSink for NoopSink {
    fn on_match(&mut self, _tag: &str, _matched: &str, _placeholder: &str) {}
}

impl<F> MatchSink for F
where
    F: FnMut(&str, &str, &str),
{
    fn on_match(&mut self, tag: &str, matched: &str, placeholder: &str) {
        self(tag, matched, placeholder)
    }
}

/// Forwards every match to two sinks.
pub struct Tee<'a> {
    first: &'a mut dyn MatchSink,
    second: &'a mut dyn MatchSink,
}

impl<'a> Tee<'a> {
    pub fn new(first: &'a mut dyn MatchSink, second: &'a mut dyn MatchSink) -> Self {
        Self { first, second }
    }
}

impl MatchSink for Tee<'_> {
    fn on_match(&mut self, tag: &str, matched: &str, placeholder: &str) {
        self.first.on_match(tag, matched, placeholder);
        self.second.on_match(tag, matched, placeholder);
    }
}

/// Holds matches from a speculative pass until the caller decides whether
/// the pass's output is kept.
#[derive(Debug, Default)]
pub(crate) struct Recorded {
    matches: Vec<(String, String, String)>,
}

impl Recorded {
    pub(crate) fn replay(self, sink: &mut dyn MatchSink) {
        for (tag, matched, placeholder) in &self.matches {
            sink.on_match(tag, matched, placeholder);
        }
    }
}

impl MatchSink for Recorded {
    fn on_match(&mut self, tag: &str, matched: &str, placeholder: &str) {
        self.matches
            .push((tag.to_string(), matched.to_string(), placeholder.to_string()));
    }
}
