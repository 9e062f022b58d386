//! Encoding detection for the byte-to-scalar boundary.
//!
//! Detection order for HTML: an explicit caller-supplied label, then a byte
//! order mark, then a `<meta>` prescan over the first kilobyte, then UTF-8.
//! For XML the prescan is replaced by the XML declaration. Labels resolve
//! through the WHATWG Encoding names map.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252, X_USER_DEFINED};

/// How many bytes of the document prefix are examined for a BOM, a `<meta>`
/// charset, or an XML declaration.
pub(crate) const PRESCAN_BYTES: usize = 1024;

/// How certain the parser is about the selected encoding.
///
/// While tentative, a `<meta>` seen during tree construction may still
/// force a one-shot re-decode from byte zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Confidence {
    Tentative,
    Certain,
    /// Fragment parsing inherits the caller's scalars; bytes never enter.
    Irrelevant,
}

/// Resolves a WHATWG encoding label, e.g. `"utf8"`, `"  latin1 "`.
pub(crate) fn encoding_from_label(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
}

/// Resolves an encoding declared *within* the document.
///
/// > If the returned encoding is UTF-16BE/LE, change it to UTF-8. A
/// > document cannot declare itself to be in a UTF-16 encoding, because the
/// > declaration itself was decodable as ASCII.
///
/// `x-user-defined` likewise maps to windows-1252 for meta declarations.
///
/// @see https://html.spec.whatwg.org/#character-encodings
pub(crate) fn encoding_from_meta_label(label: &str) -> Option<&'static Encoding> {
    let encoding = encoding_from_label(label)?;
    if encoding == UTF_16BE || encoding == UTF_16LE {
        return Some(UTF_8);
    }
    if encoding == X_USER_DEFINED {
        return Some(WINDOWS_1252);
    }
    Some(encoding)
}

/// The outcome of sniffing the document prefix.
pub(crate) struct Sniff {
    pub encoding: &'static Encoding,
    pub confidence: Confidence,
    /// Length of the byte order mark to discard, if one was found.
    pub bom_length: usize,
}

/// Selects the document encoding from the caller override, the BOM, and the
/// in-document declaration found in `prefix` (at most the first
/// [`PRESCAN_BYTES`] bytes of input).
pub(crate) fn sniff(
    prefix: &[u8],
    caller: Option<&'static Encoding>,
    is_xml: bool,
) -> Sniff {
    // A BOM always wins over an in-document declaration, but an explicit
    // caller encoding still strips a matching BOM.
    let bom = Encoding::for_bom(prefix);

    if let Some(encoding) = caller {
        let bom_length = match bom {
            Some((bom_encoding, length)) if bom_encoding == encoding => length,
            _ => 0,
        };
        return Sniff {
            encoding,
            confidence: Confidence::Certain,
            bom_length,
        };
    }

    if let Some((encoding, bom_length)) = bom {
        return Sniff {
            encoding,
            confidence: Confidence::Certain,
            bom_length,
        };
    }

    let declared = if is_xml {
        xml_declaration_encoding(prefix)
    } else {
        prescan(prefix)
    };

    if let Some(encoding) = declared {
        log::debug!("document declares encoding {}", encoding.name());
        return Sniff {
            encoding,
            confidence: if is_xml {
                Confidence::Certain
            } else {
                Confidence::Tentative
            },
            bom_length: 0,
        };
    }

    Sniff {
        encoding: UTF_8,
        confidence: Confidence::Tentative,
        bom_length: 0,
    }
}

const WHITESPACE: &[u8] = b"\t\n\x0c\r ";

fn is_ws(b: u8) -> bool {
    WHITESPACE.contains(&b)
}

/// Case-insensitive search for an ASCII pattern, from `offset`.
fn find_ascii_insensitive(haystack: &[u8], pattern: &[u8], offset: usize) -> Option<usize> {
    if pattern.is_empty() || haystack.len() < pattern.len() {
        return None;
    }
    (offset..=haystack.len() - pattern.len())
        .find(|&at| haystack[at..at + pattern.len()].eq_ignore_ascii_case(pattern))
}

/// The prescan-a-byte-stream algorithm: scan up to the first kilobyte for a
/// `<meta>` tag that declares the encoding, skipping comments and other
/// tags attribute-by-attribute so that quoted `>` characters don't confuse
/// the scan.
///
/// @see https://html.spec.whatwg.org/#prescan-a-byte-stream-to-determine-its-encoding
pub(crate) fn prescan(bytes: &[u8]) -> Option<&'static Encoding> {
    let bytes = &bytes[..bytes.len().min(PRESCAN_BYTES)];
    let mut at = 0;

    while at < bytes.len() {
        let open = memchr::memchr(b'<', &bytes[at..])? + at;

        // `<!--` skips to the next `-->`.
        if bytes[open..].starts_with(b"<!--") {
            match find_ascii_insensitive(bytes, b"-->", open + 2) {
                Some(close) => {
                    at = close + 3;
                    continue;
                }
                None => return None,
            }
        }

        if bytes[open + 1..]
            .get(..4)
            .map_or(false, |next| next.eq_ignore_ascii_case(b"meta"))
            && bytes
                .get(open + 5)
                .map_or(false, |&b| is_ws(b) || b == b'/')
        {
            let (found, next) = prescan_meta(bytes, open + 5);
            if found.is_some() {
                return found;
            }
            at = next;
            continue;
        }

        // Any other tag-like construct: skip its attributes so quoted `>`
        // bytes are not mistaken for the tag end.
        match bytes[open + 1..].first() {
            Some(b'a'..=b'z' | b'A'..=b'Z' | b'/') => {
                let mut cursor = open + 1;
                while cursor < bytes.len() && !is_ws(bytes[cursor]) && bytes[cursor] != b'>' {
                    cursor += 1;
                }
                while let Some((_, _, next)) = get_attribute(bytes, cursor) {
                    cursor = next;
                }
                at = cursor + 1;
            }
            Some(b'!' | b'?') => {
                // Bogus comment or declaration: skip to `>`.
                match memchr::memchr(b'>', &bytes[open..]) {
                    Some(close) => at = open + close + 1,
                    None => return None,
                }
            }
            _ => at = open + 1,
        }
    }

    None
}

/// Processes the attributes of one `<meta>` tag found during the prescan.
/// Returns the declared encoding, if any, and the position just past the
/// tag's attributes so the outer scan can continue.
fn prescan_meta(bytes: &[u8], mut at: usize) -> (Option<&'static Encoding>, usize) {
    let mut got_pragma = false;
    let mut need_pragma: Option<bool> = None;
    let mut charset: Option<&'static Encoding> = None;
    let mut seen: Vec<Vec<u8>> = Vec::new();

    while let Some((name, value, next)) = get_attribute(bytes, at) {
        at = next;
        if seen.contains(&name) {
            continue;
        }
        seen.push(name.clone());

        match name.as_slice() {
            b"http-equiv" => {
                if value.eq_ignore_ascii_case(b"content-type") {
                    got_pragma = true;
                }
            }
            b"content" => {
                if charset.is_none() {
                    if let Some(label) = charset_from_content(&value) {
                        charset = encoding_from_meta_label(&label);
                        need_pragma = Some(true);
                    }
                }
            }
            b"charset" => {
                charset = encoding_from_meta_label(&String::from_utf8_lossy(&value));
                need_pragma = Some(false);
            }
            _ => {}
        }
    }

    let found = match need_pragma {
        None => None,
        Some(true) if !got_pragma => None,
        _ => charset,
    };
    (found, at + 1)
}

/// The prescan's get-an-attribute sub-algorithm. Returns the lowercased
/// name, the value, and the position to continue from, or `None` when the
/// tag ends before another attribute.
///
/// @see https://html.spec.whatwg.org/#concept-get-attributes-when-sniffing
fn get_attribute(bytes: &[u8], mut at: usize) -> Option<(Vec<u8>, Vec<u8>, usize)> {
    while at < bytes.len() && (is_ws(bytes[at]) || bytes[at] == b'/') {
        at += 1;
    }
    if at >= bytes.len() || bytes[at] == b'>' {
        return None;
    }

    let mut name = Vec::new();
    let mut value = Vec::new();

    loop {
        if at >= bytes.len() {
            return None;
        }
        match bytes[at] {
            b'=' if !name.is_empty() => {
                at += 1;
                break;
            }
            b if is_ws(b) => {
                while at < bytes.len() && is_ws(bytes[at]) {
                    at += 1;
                }
                if at >= bytes.len() || bytes[at] != b'=' {
                    return Some((name, value, at));
                }
                at += 1;
                break;
            }
            b'/' | b'>' => return Some((name, value, at)),
            b => {
                name.push(b.to_ascii_lowercase());
                at += 1;
            }
        }
    }

    while at < bytes.len() && is_ws(bytes[at]) {
        at += 1;
    }
    if at >= bytes.len() {
        return None;
    }

    match bytes[at] {
        quote @ (b'"' | b'\'') => {
            at += 1;
            while at < bytes.len() && bytes[at] != quote {
                value.push(bytes[at].to_ascii_lowercase());
                at += 1;
            }
            if at >= bytes.len() {
                return None;
            }
            Some((name, value, at + 1))
        }
        b'>' => Some((name, value, at)),
        _ => {
            while at < bytes.len() && !is_ws(bytes[at]) && bytes[at] != b'>' {
                value.push(bytes[at].to_ascii_lowercase());
                at += 1;
            }
            Some((name, value, at))
        }
    }
}

/// Extracts a charset label from a `content` attribute value, e.g.
/// `text/html; charset=utf-8`.
///
/// @see https://html.spec.whatwg.org/#algorithm-for-extracting-a-character-encoding-from-a-meta-element
pub(crate) fn charset_from_content(value: &[u8]) -> Option<String> {
    let mut at = 0;
    loop {
        at = find_ascii_insensitive(value, b"charset", at)?;
        at += b"charset".len();
        while at < value.len() && is_ws(value[at]) {
            at += 1;
        }
        if value.get(at) == Some(&b'=') {
            at += 1;
            break;
        }
    }
    while at < value.len() && is_ws(value[at]) {
        at += 1;
    }

    match value.get(at) {
        Some(&quote @ (b'"' | b'\'')) => {
            let rest = &value[at + 1..];
            let close = memchr::memchr(quote, rest)?;
            Some(String::from_utf8_lossy(&rest[..close]).into_owned())
        }
        Some(_) => {
            let rest = &value[at..];
            let end = rest
                .iter()
                .position(|&b| is_ws(b) || b == b';')
                .unwrap_or(rest.len());
            Some(String::from_utf8_lossy(&rest[..end]).into_owned())
        }
        None => None,
    }
}

/// Reads the `encoding` pseudo-attribute of an XML declaration, when the
/// prefix starts with one.
pub(crate) fn xml_declaration_encoding(prefix: &[u8]) -> Option<&'static Encoding> {
    if !prefix.starts_with(b"<?xml") {
        return None;
    }
    let end = memchr::memchr(b'>', prefix)?;
    let decl = &prefix[..end];

    let mut at = find_ascii_insensitive(decl, b"encoding", 5)?;
    at += b"encoding".len();
    while at < decl.len() && is_ws(decl[at]) {
        at += 1;
    }
    if decl.get(at) != Some(&b'=') {
        return None;
    }
    at += 1;
    while at < decl.len() && is_ws(decl[at]) {
        at += 1;
    }

    let quote = match decl.get(at) {
        Some(&q @ (b'"' | b'\'')) => q,
        _ => return None,
    };
    let rest = &decl[at + 1..];
    let close = memchr::memchr(quote, rest)?;
    encoding_from_label(&String::from_utf8_lossy(&rest[..close]))
}

#[cfg(test)]
mod test {
    use super::*;
    use encoding_rs::{ISO_8859_2, UTF_16LE, UTF_8, WINDOWS_1252};

    #[test]
    fn labels_resolve_through_the_names_map() {
        assert_eq!(encoding_from_label("utf8"), Some(UTF_8));
        assert_eq!(encoding_from_label(" Latin1 "), Some(WINDOWS_1252));
        assert_eq!(encoding_from_label("us-ascii"), Some(WINDOWS_1252));
        assert_eq!(encoding_from_label("iso-8859-2"), Some(ISO_8859_2));
        assert_eq!(encoding_from_label("not-a-charset"), None);
    }

    #[test]
    fn meta_labels_cannot_select_utf16() {
        assert_eq!(encoding_from_meta_label("utf-16le"), Some(UTF_8));
        assert_eq!(encoding_from_meta_label("x-user-defined"), Some(WINDOWS_1252));
    }

    #[test]
    fn bom_beats_meta() {
        let sniffed = sniff(
            b"\xFF\xFE<meta charset=\"iso-8859-2\">",
            None,
            false,
        );
        assert_eq!(sniffed.encoding, UTF_16LE);
        assert_eq!(sniffed.bom_length, 2);
        assert_eq!(sniffed.confidence, Confidence::Certain);
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let sniffed = sniff(b"\xEF\xBB\xBF<p>", None, false);
        assert_eq!(sniffed.encoding, UTF_8);
        assert_eq!(sniffed.bom_length, 3);
    }

    #[test]
    fn prescan_finds_meta_charset() {
        assert_eq!(
            prescan(b"<!DOCTYPE html><html><head><meta charset='ISO-8859-2'>"),
            Some(ISO_8859_2)
        );
    }

    #[test]
    fn prescan_finds_http_equiv_content_type() {
        assert_eq!(
            prescan(b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=windows-1252\">"),
            Some(WINDOWS_1252)
        );
        // The content attribute alone is not enough without the pragma.
        assert_eq!(
            prescan(b"<meta content=\"text/html; charset=windows-1252\">"),
            None
        );
    }

    #[test]
    fn prescan_skips_comments_and_quoted_closers() {
        assert_eq!(
            prescan(b"<!-- <meta charset='iso-8859-2'> --><p title=\"a > b\">"),
            None
        );
        assert_eq!(
            prescan(b"<p title=\"<meta charset='iso-8859-2'>\"><meta charset=latin2>"),
            Some(ISO_8859_2)
        );
    }

    #[test]
    fn prescan_stops_at_the_first_kilobyte() {
        let mut page = vec![b' '; PRESCAN_BYTES];
        page.extend_from_slice(b"<meta charset='iso-8859-2'>");
        assert_eq!(prescan(&page), None);
    }

    #[test]
    fn xml_declaration_encoding_is_read() {
        assert_eq!(
            xml_declaration_encoding(b"<?xml version=\"1.0\" encoding=\"ISO-8859-2\"?><root/>"),
            Some(ISO_8859_2)
        );
        assert_eq!(xml_declaration_encoding(b"<?xml version=\"1.0\"?>"), None);
        assert_eq!(xml_declaration_encoding(b"<root/>"), None);
    }

    #[test]
    fn charset_extraction_from_content() {
        assert_eq!(
            charset_from_content(b"text/html; charset=utf-8").as_deref(),
            Some("utf-8")
        );
        assert_eq!(
            charset_from_content(b"text/html; CHARSET = 'koi8-r' ;").as_deref(),
            Some("koi8-r")
        );
        assert_eq!(charset_from_content(b"text/html").as_deref(), None);
    }
}
