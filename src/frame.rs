//! Bus frame codec.
//!
//! Frames are `"<addressee>:<payload>"`; the first `:` is the only delimiter.
//! Payloads forwarded to the reasoning engine are atomized so they form a
//! valid unquoted atom.

use crate::error::FrameError;

/// Reserved characters and the letter each one is replaced with.
const ATOM_SUBSTITUTIONS: [(char, char); 11] = [
    ('(', 'A'),
    (')', 'B'),
    ('[', 'C'),
    (']', 'D'),
    ('.', 'E'),
    (',', 'F'),
    ('/', 'G'),
    ('\\', 'H'),
    ('\'', 'I'),
    (' ', 'O'),
    (':', 'J'),
];

/// Splits a raw frame at the first `:` into `(addressee, payload)`.
pub fn parse_frame(raw: &str) -> Result<(&str, &str), FrameError> {
    raw.split_once(':').ok_or_else(|| FrameError::Malformed {
        raw: raw.to_string(),
    })
}

/// Builds `"<addressee>:<term>"`. The addressee is not atomized.
pub fn format_outbound(addressee: &str, term: &str) -> String {
    format!("{addressee}:{term}")
}

/// Replaces every reserved character with its placeholder letter.
///
/// One-way: placeholders are indistinguishable from genuine uppercase letters.
pub fn atomize(text: &str) -> String {
    text.chars()
        .map(|c| {
            ATOM_SUBSTITUTIONS
                .iter()
                .find(|(reserved, _)| *reserved == c)
                .map_or(c, |(_, letter)| *letter)
        })
        .collect()
}

/// Returns true if `c` would be rewritten by [`atomize`].
pub fn is_reserved(c: char) -> bool {
    ATOM_SUBSTITUTIONS.iter().any(|(reserved, _)| *reserved == c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_at_first_colon() {
        let (addressee, payload) = parse_frame("7:go:3").expect("valid frame");
        assert_eq!(addressee, "7");
        assert_eq!(payload, "go:3");
    }

    #[test]
    fn parse_rejects_frame_without_delimiter() {
        let err = parse_frame("stop").unwrap_err();
        assert_eq!(
            err,
            FrameError::Malformed {
                raw: "stop".to_string()
            }
        );
    }

    #[test]
    fn parse_allows_empty_parts() {
        assert_eq!(parse_frame(":").unwrap(), ("", ""));
        assert_eq!(parse_frame("turtlebot_3:").unwrap(), ("turtlebot_3", ""));
    }

    #[test]
    fn format_then_parse_recovers_parts() {
        let cases = [
            ("turtlebot_19999", ":- dynamic vision/2. vision(red,left)."),
            ("12", "right:90"),
            ("agent", ""),
        ];
        for (addressee, payload) in cases {
            let frame = format_outbound(addressee, payload);
            assert_eq!(parse_frame(&frame).unwrap(), (addressee, payload));
        }
    }

    #[test]
    fn atomize_replaces_every_reserved_character() {
        assert_eq!(atomize("()[].,/\\' :"), "ABCDEFGHIOJ");
    }

    #[test]
    fn atomize_fact_bundle() {
        let out = atomize("vision(red,center). agentname('5:').");
        assert_eq!(out, "visionAredFcenterBEOagentnameAI5JIBE");
        assert!(!out.chars().any(is_reserved));
    }

    #[test]
    fn atomize_preserves_other_characters_positionally() {
        let input = "a(b) ü_9-Z";
        let out = atomize(input);
        assert_eq!(out.chars().count(), input.chars().count());
        for (before, after) in input.chars().zip(out.chars()) {
            if !is_reserved(before) {
                assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn atomize_is_idempotent() {
        let once = atomize("load(full). depth(near).");
        assert_eq!(atomize(&once), once);
    }

    mod properties {
        use proptest::prelude::*;

        use super::super::*;

        proptest! {
            #[test]
            fn atomized_text_has_no_reserved_characters(text in any::<String>()) {
                let out = atomize(&text);
                prop_assert!(!out.chars().any(is_reserved));
                prop_assert_eq!(out.chars().count(), text.chars().count());
            }

            #[test]
            fn frame_round_trips_when_addressee_has_no_colon(
                addressee in "[^:]*",
                payload in any::<String>(),
            ) {
                let frame = format_outbound(&addressee, &payload);
                prop_assert_eq!(
                    parse_frame(&frame).unwrap(),
                    (addressee.as_str(), payload.as_str())
                );
            }
        }
    }
}
