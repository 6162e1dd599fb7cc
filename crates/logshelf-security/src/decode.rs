//! Encoding bypass: catch secrets hidden behind one layer of base64 or
//! percent-encoding.
//!
//! Decoded content is never emitted. A base64 run whose decoded form
//! contains a secret is replaced wholesale by a `BASE64_SECRET` placeholder.
//! Percent-decoded text is substituted back in only when redacting it found
//! something, and then only in its redacted form.
//!
//! Each pass peels one layer. Percent-decoded text that still carries escapes
//! (`%2540` becomes `%40`) is emitted with those escapes intact, so redacting
//! the output again can find one more secret. The fixed-point property holds
//! for all other input.

use std::borrow::Cow;

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use regex::Regex;

use crate::placeholder::{BASE64_TAG, placeholder};
use crate::sink::{MatchSink, NoopSink, Recorded};

/// Shortest run treated as a base64 candidate.
pub const MIN_BASE64_RUN: usize = 40;

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    Standard,
    UrlSafe,
}

impl Alphabet {
    fn engine(self) -> &'static GeneralPurpose {
        match self {
            Alphabet::Standard => &STANDARD_LENIENT,
            Alphabet::UrlSafe => &URL_SAFE_LENIENT,
        }
    }
}

/// Decode `candidate` and return it only if the result is UTF-8 text.
/// Padding is optional.
pub fn base64_text(candidate: &str, alphabet: Alphabet) -> Option<String> {
    let bytes = alphabet.engine().decode(candidate).ok()?;
    String::from_utf8(bytes).ok()
}

/// One level of percent-decoding. `None` when nothing changed or the result
/// is not UTF-8. `+` stays a `+`.
pub fn percent_decode(text: &str) -> Option<String> {
    if !text.contains('%') {
        return None;
    }
    match urlencoding::decode(text) {
        Ok(Cow::Owned(decoded)) if decoded != text => Some(decoded),
        _ => None,
    }
}

/// Recursive entry point handed to the probe by the redactor.
pub(crate) type RedactFn<'a> = dyn Fn(&str, &mut dyn MatchSink) -> String + 'a;

/// Finds and rewrites encoded runs.
pub(crate) struct EncodingProbe {
    standard: Regex,
    url_safe: Regex,
}

impl EncodingProbe {
    pub(crate) fn new() -> Self {
        Self {
            standard: Regex::new(&format!("[A-Za-z0-9+/]{{{},}}={{0,2}}", MIN_BASE64_RUN))
                .expect("hardcoded regex"),
            url_safe: Regex::new(&format!("[A-Za-z0-9_-]{{{},}}={{0,2}}", MIN_BASE64_RUN))
                .expect("hardcoded regex"),
        }
    }

    /// Rewrite `text`, or `None` if no encoded secret was found.
    ///
    /// `redact` is the full transform, called on decoded content only.
    pub(crate) fn rewrite(
        &self,
        text: &str,
        redact: &RedactFn<'_>,
        sink: &mut dyn MatchSink,
    ) -> Option<String> {
        let mut current = Cow::Borrowed(text);

        if let Some(next) = self.replace_runs(&current, Alphabet::Standard, redact, sink) {
            current = Cow::Owned(next);
        }
        if let Some(next) = self.replace_runs(&current, Alphabet::UrlSafe, redact, sink) {
            current = Cow::Owned(next);
        }

        if let Some(unescaped) = percent_decode(&current) {
            let mut recorded = Recorded::default();
            let redacted = redact(&unescaped, &mut recorded);
            if redacted != unescaped {
                recorded.replay(sink);
                current = Cow::Owned(redacted);
            }
        }

        match current {
            Cow::Owned(rewritten) => Some(rewritten),
            Cow::Borrowed(_) => None,
        }
    }

    fn replace_runs(
        &self,
        text: &str,
        alphabet: Alphabet,
        redact: &RedactFn<'_>,
        sink: &mut dyn MatchSink,
    ) -> Option<String> {
        let regex = match alphabet {
            Alphabet::Standard => &self.standard,
            Alphabet::UrlSafe => &self.url_safe,
        };

        let mut out: Option<String> = None;
        let mut last = 0;

        for m in regex.find_iter(text) {
            let run = m.as_str();
            // Plain alphanumeric runs were already tried as standard base64.
            if alphabet == Alphabet::UrlSafe && !run.contains(['-', '_']) {
                continue;
            }
            let Some(decoded) = base64_text(run, alphabet) else {
                continue;
            };
            if redact(&decoded, &mut NoopSink) == decoded {
                continue;
            }

            let replacement = placeholder(BASE64_TAG, run);
            sink.on_match(BASE64_TAG, run, &replacement);

            let buf = out.get_or_insert_with(|| String::with_capacity(text.len()));
            buf.push_str(&text[last..m.start()]);
            buf.push_str(&replacement);
            last = m.end();
        }

        let mut buf = out?;
        buf.push_str(&text[last..]);
        Some(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};

    fn fake_redact(text: &str, sink: &mut dyn MatchSink) -> String {
        if text.contains("hunter2") {
            let p = placeholder("FAKE", "hunter2");
            sink.on_match("FAKE", "hunter2", &p);
            text.replace("hunter2", &p)
        } else {
            text.to_string()
        }
    }

    #[test]
    fn test_base64_text_accepts_missing_padding() {
        assert_eq!(
            base64_text("aGVsbG8gd29ybGQ", Alphabet::Standard).as_deref(),
            Some("hello world")
        );
        assert_eq!(
            base64_text("aGVsbG8gd29ybGQ=", Alphabet::Standard).as_deref(),
            Some("hello world")
        );
    }

    #[test]
    fn test_base64_text_rejects_binary() {
        let encoded = STANDARD.encode([0xff, 0xfe, 0x00, 0x80]);
        assert_eq!(base64_text(&encoded, Alphabet::Standard), None);
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(
            percent_decode("user%40example.com").as_deref(),
            Some("user@example.com")
        );
        assert_eq!(percent_decode("a+b"), None);
        assert_eq!(percent_decode("no escapes"), None);
        assert_eq!(percent_decode("100%"), None);
    }

    #[test]
    fn test_rewrite_replaces_encoded_secret() {
        let probe = EncodingProbe::new();
        let encoded = STANDARD.encode("the password is hunter2, keep it secret!!");
        assert!(encoded.len() >= MIN_BASE64_RUN);

        let mut tags = Vec::new();
        let mut sink = |tag: &str, _: &str, _: &str| tags.push(tag.to_string());
        let out = probe
            .rewrite(&format!("blob {} end", encoded), &fake_redact, &mut sink)
            .unwrap();

        assert_eq!(out, format!("blob {} end", placeholder(BASE64_TAG, &encoded)));
        // Matches inside the decoded run are not reported.
        assert_eq!(tags, vec![BASE64_TAG]);
    }

    #[test]
    fn test_rewrite_url_safe_run() {
        let probe = EncodingProbe::new();
        let payload = "??>>hunter2??>>hunter2??>>hunter2??>>hunter2";
        let encoded = URL_SAFE_NO_PAD.encode(payload);
        assert!(encoded.contains(['-', '_']));

        let out = probe.rewrite(&encoded, &fake_redact, &mut NoopSink).unwrap();
        assert_eq!(out, placeholder(BASE64_TAG, &encoded));
    }

    #[test]
    fn test_rewrite_leaves_clean_runs() {
        let probe = EncodingProbe::new();
        let encoded = STANDARD.encode("nothing interesting lives in this sentence");
        assert!(probe.rewrite(&encoded, &fake_redact, &mut NoopSink).is_none());
    }

    #[test]
    fn test_rewrite_percent_encoded_secret() {
        let probe = EncodingProbe::new();
        let mut count = 0;
        let mut sink = |_: &str, _: &str, _: &str| count += 1;

        let out = probe
            .rewrite("pw%3Dhunter2%26x%3D1", &fake_redact, &mut sink)
            .unwrap();
        assert_eq!(out, format!("pw={}&x=1", placeholder("FAKE", "hunter2")));
        assert_eq!(count, 1);
    }

    #[test]
    fn test_rewrite_keeps_clean_percent_text() {
        let probe = EncodingProbe::new();
        assert!(
            probe
                .rewrite("path%2Fto%2Ffile", &fake_redact, &mut NoopSink)
                .is_none()
        );
    }
}
