//! The byte-to-scalar boundary: a pull stream of Unicode scalar values with
//! small push-back, newline normalization, and line/column accounting.
//!
//! The input stream owns the byte source and the streaming decoder. While
//! the encoding confidence is tentative it also retains the raw bytes read
//! so far, so that a late `<meta>` declaration can force one re-decode from
//! byte zero.

use crate::encoding::{self, Confidence, PRESCAN_BYTES};
use crate::errors::{Error, Report, StreamError};
use crate::signal::Location;
use encoding_rs::{Decoder, DecoderResult, Encoding};
use std::collections::VecDeque;
use std::io::Read;

/// Retained-byte ceiling: once this much input has been seen, a meta
/// declaration can no longer change the encoding.
const RETAIN_LIMIT: usize = 64 * 1024;

/// How deep the tokenizers may push back. Sized for the longest named
/// character reference probe plus slack.
const PUSH_BACK_DEPTH: usize = 64;

pub(crate) struct InputStream<R: Read> {
    source: R,
    source_eof: bool,

    encoding: &'static Encoding,
    confidence: Confidence,
    decoder: Decoder,

    /// Bytes read but not yet decoded.
    raw: Vec<u8>,
    raw_offset: usize,

    /// Every byte consumed so far, kept only while a re-decode is possible.
    retained: Option<Vec<u8>>,
    restarted: bool,

    /// Whether non-whitespace content has been committed downstream, which
    /// closes the re-decode window. Set by the tree builder, not here.
    committed: bool,

    /// Decoded scalars awaiting newline normalization.
    decoded: VecDeque<char>,

    /// Pushed-back scalars, most recently pushed first, with the locations
    /// they were originally produced at.
    lookahead: VecDeque<(char, Location)>,

    /// Locations of recently produced scalars, consumed by `push_back`.
    recent: Vec<Location>,

    /// Location of the next scalar when `lookahead` is empty.
    pos: Location,

    /// A CR was just folded to LF; a directly following LF is dropped.
    skip_next_lf: bool,

    /// The decoder has been fed its final chunk; it must not be fed again.
    decode_finished: bool,
}

impl<R: Read> InputStream<R> {
    /// Reads the document prefix, selects the encoding, and builds the
    /// scalar stream. `caller` is the explicit override from the
    /// configuration, already resolved through the label map.
    pub fn new(
        mut source: R,
        caller: Option<&'static Encoding>,
        is_xml: bool,
    ) -> Result<Self, StreamError> {
        let mut prefix = Vec::with_capacity(PRESCAN_BYTES);
        let mut chunk = [0u8; 1024];
        let mut source_eof = false;
        while prefix.len() < PRESCAN_BYTES {
            let n = source.read(&mut chunk[..PRESCAN_BYTES - prefix.len()])?;
            if n == 0 {
                source_eof = true;
                break;
            }
            prefix.extend_from_slice(&chunk[..n]);
        }

        let sniffed = encoding::sniff(&prefix, caller, is_xml);
        log::debug!(
            "selected encoding {} ({:?})",
            sniffed.encoding.name(),
            sniffed.confidence
        );

        let retained = if sniffed.confidence == Confidence::Tentative {
            Some(prefix.clone())
        } else {
            None
        };

        Ok(Self {
            source,
            source_eof,
            encoding: sniffed.encoding,
            confidence: sniffed.confidence,
            decoder: sniffed.encoding.new_decoder_without_bom_handling(),
            raw: prefix.split_off(sniffed.bom_length),
            raw_offset: 0,
            retained,
            restarted: false,
            committed: false,
            decoded: VecDeque::new(),
            lookahead: VecDeque::new(),
            recent: Vec::new(),
            pos: Location::new(1, 1),
            skip_next_lf: false,
            decode_finished: false,
        })
    }

    /// The position of the next scalar `next` will produce.
    pub fn location(&self) -> Location {
        match self.lookahead.front() {
            Some((_, loc)) => *loc,
            None => self.pos,
        }
    }

    /// Advances one scalar. CR and CR LF are already collapsed to LF.
    pub fn next(&mut self, report: &mut Report<'_>) -> Result<Option<char>, StreamError> {
        if let Some((c, loc)) = self.lookahead.pop_front() {
            self.remember(loc);
            self.pos = loc.after(c);
            return Ok(Some(c));
        }

        loop {
            let c = match self.next_decoded(report)? {
                Some(c) => c,
                None => return Ok(None),
            };

            let c = match c {
                '\r' => {
                    self.skip_next_lf = true;
                    '\n'
                }
                '\n' if self.skip_next_lf => {
                    self.skip_next_lf = false;
                    continue;
                }
                other => {
                    self.skip_next_lf = false;
                    other
                }
            };

            let loc = self.pos;
            self.remember(loc);
            self.pos = loc.after(c);
            return Ok(Some(c));
        }
    }

    /// Re-inserts a scalar so the next `next` returns it, restoring the
    /// location it was produced at. Only scalars actually produced by this
    /// stream may be pushed back, in reverse order of production.
    pub fn push_back(&mut self, c: char) {
        let loc = self.recent.pop().unwrap_or(self.pos);
        self.pos = loc;
        self.lookahead.push_front((c, loc));
    }

    /// Marks that non-whitespace content reached the consumer, closing the
    /// re-decode window and releasing the retained bytes.
    pub fn commit(&mut self) {
        self.committed = true;
        self.retained = None;
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    /// Attempts the one-shot re-decode for a late in-document encoding
    /// declaration. On success the stream rewinds to byte zero with the new
    /// decoder and returns `true`; the caller is responsible for resetting
    /// everything it derived from the old scalars.
    pub fn try_change_encoding(&mut self, new_encoding: &'static Encoding) -> bool {
        if self.confidence != Confidence::Tentative {
            return false;
        }
        if new_encoding == self.encoding {
            self.confidence = Confidence::Certain;
            self.retained = None;
            return false;
        }
        if self.committed || self.restarted {
            return false;
        }
        let retained = match self.retained.take() {
            Some(retained) => retained,
            None => return false,
        };

        log::debug!(
            "re-decoding from byte 0: {} -> {}",
            self.encoding.name(),
            new_encoding.name()
        );

        self.encoding = new_encoding;
        self.decoder = new_encoding.new_decoder_without_bom_handling();
        self.raw = retained;
        self.raw_offset = 0;
        self.decoded.clear();
        self.lookahead.clear();
        self.recent.clear();
        self.pos = Location::new(1, 1);
        self.skip_next_lf = false;
        self.decode_finished = false;
        self.confidence = Confidence::Certain;
        self.restarted = true;
        true
    }

    fn remember(&mut self, loc: Location) {
        self.recent.push(loc);
        if self.recent.len() > PUSH_BACK_DEPTH * 2 {
            self.recent.drain(..PUSH_BACK_DEPTH);
        }
    }

    fn next_decoded(&mut self, report: &mut Report<'_>) -> Result<Option<char>, StreamError> {
        loop {
            if let Some(c) = self.decoded.pop_front() {
                return Ok(Some(c));
            }
            if !self.refill(report)? {
                return Ok(None);
            }
        }
    }

    /// Decodes another batch of scalars into `self.decoded`. Returns
    /// `false` once the source and decoder are both exhausted.
    fn refill(&mut self, report: &mut Report<'_>) -> Result<bool, StreamError> {
        if self.decode_finished {
            return Ok(false);
        }

        if self.raw_offset >= self.raw.len() && !self.source_eof {
            self.raw.clear();
            self.raw_offset = 0;
            let mut chunk = [0u8; 4096];
            let n = self.source.read(&mut chunk)?;
            if n == 0 {
                self.source_eof = true;
            } else {
                self.raw.extend_from_slice(&chunk[..n]);
                if let Some(retained) = &mut self.retained {
                    retained.extend_from_slice(&chunk[..n]);
                    if retained.len() > RETAIN_LIMIT {
                        self.retained = None;
                        self.confidence = Confidence::Certain;
                    }
                }
            }
        }

        let src = &self.raw[self.raw_offset.min(self.raw.len())..];
        let last = self.source_eof;
        if src.is_empty() && !last {
            return Ok(true);
        }

        let mut out = String::with_capacity(256);
        let (result, read) = self
            .decoder
            .decode_to_string_without_replacement(src, &mut out, last && src.is_empty());
        self.raw_offset += read;
        self.decoded.extend(out.chars());

        match result {
            DecoderResult::InputEmpty => {
                if last && src.is_empty() {
                    self.decode_finished = true;
                    return Ok(!self.decoded.is_empty());
                }
            }
            DecoderResult::OutputFull => {}
            DecoderResult::Malformed(bad, extra) => {
                let bad = bad as usize;
                let extra = extra as usize;
                let end = self.raw_offset - extra;
                let bytes: Box<[u8]> = self.raw[end.saturating_sub(bad)..end].into();
                report(self.pos, &Error::BadByteSequence(bytes)).map_err(StreamError::from)?;
                self.decoded.push_back(entities::REPLACEMENT_CHARACTER);
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::errors::silent_report;

    fn stream(bytes: &[u8]) -> InputStream<&[u8]> {
        InputStream::new(bytes, None, false).expect("in-memory sources cannot fail")
    }

    fn drain(input: &mut InputStream<&[u8]>) -> String {
        let mut out = String::new();
        while let Some(c) = input.next(&mut silent_report).unwrap() {
            out.push(c);
        }
        out
    }

    #[test]
    fn utf8_passthrough() {
        let mut input = stream("héllo".as_bytes());
        assert_eq!(drain(&mut input), "héllo");
    }

    #[test]
    fn bom_is_stripped_and_location_starts_at_one_one() {
        let mut input = stream(b"\xEF\xBB\xBF<p>");
        assert_eq!(input.location(), Location::new(1, 1));
        assert_eq!(input.next(&mut silent_report).unwrap(), Some('<'));
        assert_eq!(input.location(), Location::new(1, 2));
    }

    #[test]
    fn newlines_are_normalized() {
        let mut input = stream(b"a\r\nb\rc\nd");
        assert_eq!(drain(&mut input), "a\nb\nc\nd");
    }

    #[test]
    fn locations_track_lines_and_columns() {
        let mut input = stream(b"ab\ncd");
        let mut seen = Vec::new();
        loop {
            let loc = input.location();
            match input.next(&mut silent_report).unwrap() {
                Some(c) => seen.push((c, loc)),
                None => break,
            }
        }
        assert_eq!(
            seen,
            vec![
                ('a', Location::new(1, 1)),
                ('b', Location::new(1, 2)),
                ('\n', Location::new(1, 3)),
                ('c', Location::new(2, 1)),
                ('d', Location::new(2, 2)),
            ]
        );
    }

    #[test]
    fn push_back_restores_scalar_and_location() {
        let mut input = stream(b"xy");
        assert_eq!(input.next(&mut silent_report).unwrap(), Some('x'));
        assert_eq!(input.location(), Location::new(1, 2));
        input.push_back('x');
        assert_eq!(input.location(), Location::new(1, 1));
        assert_eq!(input.next(&mut silent_report).unwrap(), Some('x'));
        assert_eq!(input.next(&mut silent_report).unwrap(), Some('y'));
    }

    #[test]
    fn malformed_bytes_become_replacement_characters() {
        let mut reports = Vec::new();
        let mut report = |loc: Location, err: &Error| {
            reports.push((loc, err.clone()));
            Ok(())
        };
        let mut input = InputStream::new(b"a\xFFb".as_slice(), None, false).unwrap();
        let mut out = String::new();
        while let Some(c) = input.next(&mut report).unwrap() {
            out.push(c);
        }
        assert_eq!(out, "a\u{FFFD}b");
        assert_eq!(reports.len(), 1);
        assert!(matches!(reports[0].1, Error::BadByteSequence(_)));
    }

    #[test]
    fn meta_restart_re_decodes_from_byte_zero() {
        let mut input = stream(b"ab");
        assert_eq!(input.next(&mut silent_report).unwrap(), Some('a'));
        assert!(input.try_change_encoding(encoding_rs::WINDOWS_1252));
        assert_eq!(input.location(), Location::new(1, 1));
        assert_eq!(drain(&mut input), "ab");
        // Only one restart is ever allowed.
        assert!(!input.try_change_encoding(encoding_rs::UTF_8));
    }

    #[test]
    fn commit_closes_the_restart_window() {
        let mut input = stream(b"ab");
        input.commit();
        assert!(!input.try_change_encoding(encoding_rs::WINDOWS_1252));
    }

    #[test]
    fn iso_8859_decoding() {
        let mut input = InputStream::new(
            b"caf\xE9".as_slice(),
            Some(encoding_rs::WINDOWS_1252),
            false,
        )
        .unwrap();
        assert_eq!(drain(&mut input), "café");
    }
}
