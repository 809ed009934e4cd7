//! URL-safe base64 transport for free text carried inside a share link.
//!
//! Encoded payloads drop their `=` padding to keep links short. Decoding is
//! lenient about what URL transit tends to do to a payload (lost padding,
//! `+` turned into a space, standard alphabet instead of the URL-safe one) but
//! never returns text it could not decode exactly.

use crate::error::DecodeError;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;

/// Encode UTF-8 text as unpadded URL-safe base64.
pub fn encode(text: &str) -> String {
    URL_SAFE_NO_PAD.encode(text.as_bytes())
}

/// Decode a payload produced by [`encode`], repairing transit damage.
pub fn decode(payload: &str) -> Result<String, DecodeError> {
    if payload.trim().is_empty() {
        return Ok(String::new());
    }

    // Spaces are not trimmed: a trailing `+` arrives as a trailing space.
    let mut normalized: String = payload
        .chars()
        .map(|c| match c {
            ' ' | '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    while normalized.ends_with('=') {
        normalized.pop();
    }
    let pad_len = (4 - normalized.len() % 4) % 4;
    normalized.extend(std::iter::repeat('=').take(pad_len));

    let bytes = URL_SAFE
        .decode(normalized.as_bytes())
        .map_err(|err| DecodeError::Base64(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| DecodeError::Utf8(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const SAMPLES: &[&str] = &[
        "You never listen to me",
        "a",
        "ab",
        "abc",
        "Tu n'écoutes jamais, c'est épuisant !",
        "你从来不听我说话",
        "Ты никогда меня не слушаешь",
        "late again 😤 >>> ??? ~~~",
        "line one\nline two\n\ttabbed",
    ];

    #[test]
    fn round_trips_printable_text() {
        for sample in SAMPLES {
            assert_eq!(decode(&encode(sample)).unwrap(), *sample);
        }
    }

    #[test]
    fn encoded_form_has_no_padding_or_unsafe_chars() {
        for sample in SAMPLES {
            let encoded = encode(sample);
            assert!(!encoded.contains('='), "{encoded}");
            assert!(!encoded.contains('+'), "{encoded}");
            assert!(!encoded.contains('/'), "{encoded}");
        }
    }

    #[test]
    fn empty_payload_decodes_to_empty_text() {
        assert_eq!(decode("").unwrap(), "");
        assert_eq!(decode("   ").unwrap(), "");
    }

    #[test]
    fn accepts_padded_and_standard_alphabet_payloads() {
        let text = "late again 😤 >>> ??? ~~~";
        let standard = base64::engine::general_purpose::STANDARD.encode(text);
        assert!(standard.contains('+') || standard.contains('/'));
        assert_eq!(decode(&standard).unwrap(), text);

        let padded = URL_SAFE.encode("ab");
        assert!(padded.ends_with('='));
        assert_eq!(decode(&padded).unwrap(), "ab");
    }

    #[test]
    fn repairs_space_for_plus_corruption() {
        let text = "late again 😤 >>> ??? ~~~";
        let standard = base64::engine::general_purpose::STANDARD_NO_PAD.encode(text);
        let mangled = standard.replace('+', " ");
        assert_ne!(mangled, standard);
        assert_eq!(decode(&mangled).unwrap(), text);
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(matches!(decode("a"), Err(DecodeError::Base64(_))));
        assert!(matches!(decode("not*base64!"), Err(DecodeError::Base64(_))));
    }

    #[test]
    fn non_utf8_payload_is_an_error() {
        let encoded = URL_SAFE_NO_PAD.encode([0xff, 0xfe, 0xfd]);
        assert!(matches!(decode(&encoded), Err(DecodeError::Utf8(_))));
    }

    proptest! {
        #[test]
        fn proptest_round_trips_any_printable_text(text in "\\PC*") {
            let encoded = encode(&text);
            prop_assert!(!encoded.contains('='));
            prop_assert_eq!(decode(&encoded).unwrap(), text);
        }

        #[test]
        fn proptest_recovers_standard_alphabet_with_spaces_for_plus(text in "\\PC*") {
            let mangled = base64::engine::general_purpose::STANDARD
                .encode(text.as_bytes())
                .replace('+', " ");
            prop_assert_eq!(decode(&mangled).unwrap(), text);
        }
    }
}
