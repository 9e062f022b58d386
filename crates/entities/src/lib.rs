//! HTML5 character reference data and decoding rules.
//!
//! This crate owns the two static data assets the tokenizers need: the named
//! character reference table and the windows-1252 numeric override table.
//! Lookup is grouped by the first two bytes of the reference name so that a
//! miss is rejected after a single map probe.

use lazy_static::lazy_static;
use std::collections::BTreeMap;

mod named;

use named::{LONGEST_NAME, NAMED_REFERENCES};

/// U+FFFD REPLACEMENT CHARACTER
pub const REPLACEMENT_CHARACTER: char = '\u{FFFD}';

lazy_static! {
    /// Reference names grouped by their first two bytes, suffixes sorted
    /// longest-first so the first prefix hit is the longest match.
    static ref PREFIX_GROUPS: BTreeMap<[u8; 2], Vec<(&'static [u8], &'static str, bool)>> = {
        let mut groups: BTreeMap<[u8; 2], Vec<(&'static [u8], &'static str, bool)>> =
            BTreeMap::new();

        for &(name, replacement, is_legacy) in NAMED_REFERENCES {
            let bytes = name.as_bytes();
            let prefix = [bytes[0], bytes[1]];
            groups
                .entry(prefix)
                .or_default()
                .push((&bytes[2..], replacement, is_legacy));
        }

        for suffixes in groups.values_mut() {
            suffixes.sort_by(|(a, _, _), (b, _, _)| b.len().cmp(&a.len()));
        }

        groups
    };
}

/// A successful named character reference match.
#[derive(Debug, PartialEq)]
pub struct NamedMatch {
    /// How many bytes of the candidate were consumed, including the
    /// terminating semicolon when one was present.
    pub len: usize,

    /// The replacement text for the reference.
    pub replacement: &'static str,

    /// Whether the matched name was terminated by a semicolon. A match
    /// without one is only produced for the legacy names and is a parse
    /// error for the caller to report.
    pub has_semicolon: bool,
}

/// Finds the longest named character reference that is a prefix of
/// `candidate`, where `candidate` holds the bytes following an ampersand.
///
/// > Consume the maximum number of characters possible, where the consumed
/// > characters are one of the identifiers in the first column of the named
/// > character references table.
///
/// Names lacking their terminating semicolon match only when they belong to
/// the legacy set inherited from HTML 4.
///
/// @see https://html.spec.whatwg.org/#named-character-reference-state
pub fn lookup_named(candidate: &[u8]) -> Option<NamedMatch> {
    if candidate.len() < 2 {
        return None;
    }

    let prefix = [candidate[0], candidate[1]];
    let suffixes = PREFIX_GROUPS.get(&prefix)?;
    let rest = &candidate[2..];

    for &(suffix, replacement, is_legacy) in suffixes {
        if !rest.starts_with(suffix) {
            continue;
        }

        let name_len = 2 + suffix.len();
        if candidate.get(name_len) == Some(&b';') {
            return Some(NamedMatch {
                len: name_len + 1,
                replacement,
                has_semicolon: true,
            });
        }

        if is_legacy {
            return Some(NamedMatch {
                len: name_len,
                replacement,
                has_semicolon: false,
            });
        }
    }

    None
}

/// Upper bound on the length of a reference name, semicolon excluded.
pub fn longest_name_len() -> usize {
    LONGEST_NAME
}

static CP1252_REPLACEMENTS: [u32; 32] = [
    0x20AC, // 0x80 -> EURO SIGN (€).
    0x81,   // 0x81 -> (no change).
    0x201A, // 0x82 -> SINGLE LOW-9 QUOTATION MARK (‚).
    0x0192, // 0x83 -> LATIN SMALL LETTER F WITH HOOK (ƒ).
    0x201E, // 0x84 -> DOUBLE LOW-9 QUOTATION MARK („).
    0x2026, // 0x85 -> HORIZONTAL ELLIPSIS (…).
    0x2020, // 0x86 -> DAGGER (†).
    0x2021, // 0x87 -> DOUBLE DAGGER (‡).
    0x02C6, // 0x88 -> MODIFIER LETTER CIRCUMFLEX ACCENT (ˆ).
    0x2030, // 0x89 -> PER MILLE SIGN (‰).
    0x0160, // 0x8A -> LATIN CAPITAL LETTER S WITH CARON (Š).
    0x2039, // 0x8B -> SINGLE LEFT-POINTING ANGLE QUOTATION MARK (‹).
    0x0152, // 0x8C -> LATIN CAPITAL LIGATURE OE (Œ).
    0x8D,   // 0x8D -> (no change).
    0x017D, // 0x8E -> LATIN CAPITAL LETTER Z WITH CARON (Ž).
    0x8F,   // 0x8F -> (no change).
    0x90,   // 0x90 -> (no change).
    0x2018, // 0x91 -> LEFT SINGLE QUOTATION MARK (‘).
    0x2019, // 0x92 -> RIGHT SINGLE QUOTATION MARK (’).
    0x201C, // 0x93 -> LEFT DOUBLE QUOTATION MARK (“).
    0x201D, // 0x94 -> RIGHT DOUBLE QUOTATION MARK (”).
    0x2022, // 0x95 -> BULLET (•).
    0x2013, // 0x96 -> EN DASH (–).
    0x2014, // 0x97 -> EM DASH (—).
    0x02DC, // 0x98 -> SMALL TILDE (˜).
    0x2122, // 0x99 -> TRADE MARK SIGN (™).
    0x0161, // 0x9A -> LATIN SMALL LETTER S WITH CARON (š).
    0x203A, // 0x9B -> SINGLE RIGHT-POINTING ANGLE QUOTATION MARK (›).
    0x0153, // 0x9C -> LATIN SMALL LIGATURE OE (œ).
    0x9D,   // 0x9D -> (no change).
    0x017E, // 0x9E -> LATIN SMALL LETTER Z WITH CARON (ž).
    0x0178, // 0x9F -> LATIN CAPITAL LETTER Y WITH DIAERESIS (Ÿ).
];

/// Resolves the code point of a numeric character reference.
///
/// Applies the tokenizer's numeric-character-reference-end rules: NUL,
/// out-of-range values, and surrogates become U+FFFD; the C1 control block
/// maps through the windows-1252 table; noncharacters and controls pass
/// through unchanged. The second field is `false` whenever the reference is
/// a parse error for the caller to report.
///
/// @see https://html.spec.whatwg.org/#numeric-character-reference-end-state
pub fn numeric_replacement(code_point: u32) -> (char, bool) {
    if code_point == 0 || code_point > 0x10FFFF {
        return (REPLACEMENT_CHARACTER, false);
    }

    if (0xD800..=0xDFFF).contains(&code_point) {
        return (REPLACEMENT_CHARACTER, false);
    }

    let (code_point, mut well_formed) = if (0x80..=0x9F).contains(&code_point) {
        (CP1252_REPLACEMENTS[(code_point - 0x80) as usize], false)
    } else {
        (code_point, true)
    };

    /*
     * > A noncharacter is a code point that is in the range U+FDD0 to
     * > U+FDEF, inclusive, or U+FFFE, U+FFFF, U+1FFFE, … U+10FFFF.
     *
     * > A control is a C0 control or a code point in the range U+007F
     * > DELETE to U+009F APPLICATION PROGRAM COMMAND, inclusive.
     *
     * These pass through to the output but still count as parse errors.
     */
    if well_formed
        && (matches!(code_point, 0xFDD0..=0xFDEF)
            || (code_point & 0xFFFE) == 0xFFFE
            || code_point == 0x0D
            || (0x7F..=0x9F).contains(&code_point)
            || (code_point < 0x20 && !matches!(code_point, 0x09 | 0x0A | 0x0C)))
    {
        well_formed = false;
    }

    match char::from_u32(code_point) {
        Some(c) => (c, well_formed),
        None => (REPLACEMENT_CHARACTER, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_with_semicolon() {
        assert_eq!(
            lookup_named(b"amp;"),
            Some(NamedMatch {
                len: 4,
                replacement: "&",
                has_semicolon: true
            })
        );
        assert_eq!(
            lookup_named(b"AElig;"),
            Some(NamedMatch {
                len: 6,
                replacement: "\u{C6}",
                has_semicolon: true
            })
        );
    }

    #[test]
    fn legacy_without_semicolon() {
        assert_eq!(
            lookup_named(b"amp xxx"),
            Some(NamedMatch {
                len: 3,
                replacement: "&",
                has_semicolon: false
            })
        );
        assert_eq!(
            lookup_named(b"nbsp"),
            Some(NamedMatch {
                len: 4,
                replacement: "\u{A0}",
                has_semicolon: false
            })
        );
        assert_eq!(
            lookup_named(b"LT"),
            Some(NamedMatch {
                len: 2,
                replacement: "<",
                has_semicolon: false
            })
        );
    }

    #[test]
    fn longest_name_wins() {
        // "notin;" must not stop at the legacy "not".
        assert_eq!(
            lookup_named(b"notin;"),
            Some(NamedMatch {
                len: 6,
                replacement: "\u{2209}",
                has_semicolon: true
            })
        );
        // "notanentity;" falls back to the legacy "not".
        assert_eq!(
            lookup_named(b"notanentity;"),
            Some(NamedMatch {
                len: 3,
                replacement: "\u{AC}",
                has_semicolon: false
            })
        );
    }

    #[test]
    fn non_legacy_requires_semicolon() {
        assert_eq!(lookup_named(b"alpha"), None);
        assert_eq!(
            lookup_named(b"alpha;"),
            Some(NamedMatch {
                len: 6,
                replacement: "\u{3B1}",
                has_semicolon: true
            })
        );
    }

    #[test]
    fn unknown_names_miss() {
        assert_eq!(lookup_named(b""), None);
        assert_eq!(lookup_named(b"x"), None);
        assert_eq!(lookup_named(b"zz9;"), None);
    }

    #[test]
    fn numeric_plain() {
        assert_eq!(numeric_replacement(0x41), ('A', true));
        assert_eq!(numeric_replacement(0x20AC), ('€', true));
    }

    #[test]
    fn numeric_cp1252_overrides() {
        assert_eq!(numeric_replacement(0x80), ('\u{20AC}', false));
        assert_eq!(numeric_replacement(0x82), ('\u{201A}', false));
        assert_eq!(numeric_replacement(0x9F), ('\u{178}', false));
    }

    #[test]
    fn numeric_rejects_surrogates_and_out_of_range() {
        assert_eq!(numeric_replacement(0xD800), (REPLACEMENT_CHARACTER, false));
        assert_eq!(
            numeric_replacement(0x110000),
            (REPLACEMENT_CHARACTER, false)
        );
        assert_eq!(numeric_replacement(0), (REPLACEMENT_CHARACTER, false));
    }

    #[test]
    fn numeric_noncharacters_pass_through_as_errors() {
        assert_eq!(numeric_replacement(0xFDD0), ('\u{FDD0}', false));
        assert_eq!(numeric_replacement(0xFFFF), ('\u{FFFF}', false));
        assert_eq!(numeric_replacement(0x0D), ('\r', false));
    }
}
