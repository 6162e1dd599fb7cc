//! Unicode canonicalization ahead of matching.

use std::borrow::Cow;

use unicode_normalization::{IsNormalized, UnicodeNormalization, is_nfc_quick};

/// NFC form of `text`, borrowing when it is already normalized.
pub fn nfc(text: &str) -> Cow<'_, str> {
    match is_nfc_quick(text.chars()) {
        IsNormalized::Yes => Cow::Borrowed(text),
        _ => Cow::Owned(text.nfc().collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_is_borrowed() {
        assert!(matches!(nfc("plain ascii"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_decomposed_is_composed() {
        // "e" + combining acute accent
        let decomposed = "caf\u{0065}\u{0301}";
        assert_eq!(nfc(decomposed), "caf\u{00e9}");
    }

    #[test]
    fn test_idempotent() {
        let once = nfc("A\u{030a}ngstr\u{00f6}m").into_owned();
        assert_eq!(nfc(&once), once.as_str());
    }
}
