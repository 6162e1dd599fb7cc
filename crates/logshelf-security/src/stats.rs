//! Redaction statistics for a file or a batch of files.

use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::sink::MatchSink;

/// Counters for one redaction run.
///
/// Byte totals count one separator byte per line, so they line up with the
/// size of the JSONL file on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Bytes before redaction
    pub original_bytes: u64,
    /// Bytes after redaction
    pub redacted_bytes: u64,
    pub lines_processed: u64,
    pub total_matches: u64,
    /// Match count per pattern tag
    pub by_pattern: BTreeMap<String, u64>,
}

/// A pattern tag with its match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternCount {
    pub pattern: String,
    pub count: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one match for `tag`.
    pub fn record_match(&mut self, tag: &str) {
        self.total_matches += 1;
        match self.by_pattern.get_mut(tag) {
            Some(count) => *count += 1,
            None => {
                self.by_pattern.insert(tag.to_string(), 1);
            }
        }
    }

    /// Count one line of `original` bytes that became `redacted` bytes.
    pub fn record_line(&mut self, original: usize, redacted: usize) {
        self.lines_processed += 1;
        self.original_bytes += original as u64 + 1;
        self.redacted_bytes += redacted as u64 + 1;
    }

    /// Share of bytes removed, in percent.
    ///
    /// Zero for an empty run. Negative when placeholders came out longer
    /// than what they replaced.
    pub fn percent_reduction(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        (self.original_bytes as f64 - self.redacted_bytes as f64) / self.original_bytes as f64
            * 100.0
    }

    /// Fold `other` into `self`. `None` is a no-op.
    pub fn merge<'a>(&mut self, other: impl Into<Option<&'a Stats>>) {
        let Some(other) = other.into() else {
            return;
        };
        self.original_bytes += other.original_bytes;
        self.redacted_bytes += other.redacted_bytes;
        self.lines_processed += other.lines_processed;
        self.total_matches += other.total_matches;
        for (pattern, count) in &other.by_pattern {
            *self.by_pattern.entry(pattern.clone()).or_default() += count;
        }
    }

    /// Pattern counts, highest first, ties by tag.
    pub fn pattern_summary(&self) -> Vec<PatternCount> {
        let mut counts: Vec<PatternCount> = self
            .by_pattern
            .iter()
            .map(|(pattern, &count)| PatternCount {
                pattern: pattern.clone(),
                count,
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.pattern.cmp(&b.pattern)));
        counts
    }
}

impl MatchSink for Stats {
    fn on_match(&mut self, tag: &str, _matched: &str, _placeholder: &str) {
        self.record_match(tag);
    }
}

impl AddAssign<&Stats> for Stats {
    fn add_assign(&mut self, other: &Stats) {
        self.merge(other);
    }
}

impl Add for Stats {
    type Output = Stats;

    fn add(mut self, other: Stats) -> Stats {
        self += &other;
        self
    }
}

impl Sum for Stats {
    fn sum<I: Iterator<Item = Stats>>(iter: I) -> Self {
        iter.fold(Stats::new(), Add::add)
    }
}

impl<'a> Sum<&'a Stats> for Stats {
    fn sum<I: Iterator<Item = &'a Stats>>(iter: I) -> Self {
        iter.fold(Stats::new(), |mut acc, s| {
            acc += s;
            acc
        })
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total_matches == 0 {
            return write!(f, "no redactions");
        }

        write!(f, "{} matches", self.total_matches)?;
        if !self.by_pattern.is_empty() {
            let parts: Vec<String> = self
                .by_pattern
                .iter()
                .map(|(pattern, count)| format!("{}: {}", pattern, count))
                .collect();
            write!(f, " ({})", parts.join(", "))?;
        }
        Ok(())
    }
}
