//! Placeholder decoding: `/uniXXXX` tokens back to the characters they stand for.
//!
//! PDF-to-markdown converters emit glyphs they cannot map (ligatures, math
//! symbols) as `/uni` followed by four hex digits, often padded with a stray
//! space on either side where a line was wrapped: `a /uniFB00 orded`. The
//! padding is consumed together with the token so the word joins back up:
//! `aﬀorded`.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static RE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" ?/uni([0-9A-Fa-f]{4}) ?").unwrap());

/// Replace every `/uniXXXX` token in `text` with its unicode character.
///
/// Tokens whose code point is not a valid `char` (the surrogate range
/// `D800`–`DFFF`) are left exactly as they were, padding included. Text
/// without tokens is returned unchanged; no other normalisation happens.
pub fn decode_placeholders(text: &str) -> String {
    if !text.contains("/uni") {
        return text.to_string();
    }
    RE_PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
