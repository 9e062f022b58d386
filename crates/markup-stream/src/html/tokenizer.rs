//! The HTML5 tokenizer: a single state machine over scalar values.
//!
//! Every state named by the HTML specification's tokenization chapter is a
//! variant of [`State`], dispatched by one `match` per scalar. The tree
//! construction stage owns the content-model switches: it writes the
//! tokenizer state when it opens a `script`, `style`, `title`, `textarea`,
//! `plaintext` or similar element, and the tokenizer only reads it.
//!
//! @see https://html.spec.whatwg.org/#tokenization

use crate::errors::{Error, Report, StreamError};
use crate::input_stream::InputStream;
use crate::signal::{Attribute, Interner, Location, Name};
use std::collections::VecDeque;
use std::io::Read;
use std::rc::Rc;

use entities::REPLACEMENT_CHARACTER;

/// The tokenizer states of the HTML specification, in its order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum State {
    Data,
    Rcdata,
    Rawtext,
    ScriptData,
    Plaintext,
    TagOpen,
    EndTagOpen,
    TagName,
    RcdataLessThanSign,
    RcdataEndTagOpen,
    RcdataEndTagName,
    RawtextLessThanSign,
    RawtextEndTagOpen,
    RawtextEndTagName,
    ScriptDataLessThanSign,
    ScriptDataEndTagOpen,
    ScriptDataEndTagName,
    ScriptDataEscapeStart,
    ScriptDataEscapeStartDash,
    ScriptDataEscaped,
    ScriptDataEscapedDash,
    ScriptDataEscapedDashDash,
    ScriptDataEscapedLessThanSign,
    ScriptDataEscapedEndTagOpen,
    ScriptDataEscapedEndTagName,
    ScriptDataDoubleEscapeStart,
    ScriptDataDoubleEscaped,
    ScriptDataDoubleEscapedDash,
    ScriptDataDoubleEscapedDashDash,
    ScriptDataDoubleEscapedLessThanSign,
    ScriptDataDoubleEscapeEnd,
    BeforeAttributeName,
    AttributeName,
    AfterAttributeName,
    BeforeAttributeValue,
    AttributeValueDoubleQuoted,
    AttributeValueSingleQuoted,
    AttributeValueUnquoted,
    AfterAttributeValueQuoted,
    SelfClosingStartTag,
    BogusComment,
    MarkupDeclarationOpen,
    CommentStart,
    CommentStartDash,
    Comment,
    CommentLessThanSign,
    CommentLessThanSignBang,
    CommentLessThanSignBangDash,
    CommentLessThanSignBangDashDash,
    CommentEndDash,
    CommentEnd,
    CommentEndBang,
    Doctype,
    BeforeDoctypeName,
    DoctypeName,
    AfterDoctypeName,
    AfterDoctypePublicKeyword,
    BeforeDoctypePublicIdentifier,
    DoctypePublicIdentifierDoubleQuoted,
    DoctypePublicIdentifierSingleQuoted,
    AfterDoctypePublicIdentifier,
    BetweenDoctypePublicAndSystemIdentifiers,
    AfterDoctypeSystemKeyword,
    BeforeDoctypeSystemIdentifier,
    DoctypeSystemIdentifierDoubleQuoted,
    DoctypeSystemIdentifierSingleQuoted,
    AfterDoctypeSystemIdentifier,
    BogusDoctype,
    CdataSection,
    CdataSectionBracket,
    CdataSectionEnd,
    CharacterReference,
    NamedCharacterReference,
    NumericCharacterReference,
    HexadecimalCharacterReferenceStart,
    DecimalCharacterReferenceStart,
    HexadecimalCharacterReference,
    DecimalCharacterReference,
    NumericCharacterReferenceEnd,
}

/// A DOCTYPE token under construction or completed.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct DoctypeToken {
    pub name: Option<String>,
    pub public_identifier: Option<String>,
    pub system_identifier: Option<String>,
    pub force_quirks: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TokenData {
    Char(char),
    StartTag {
        name: Rc<str>,
        attributes: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag {
        name: Rc<str>,
    },
    Comment(Box<str>),
    Doctype(DoctypeToken),
    Eof,
}

/// A token plus the source position where it started.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Token {
    pub location: Location,
    pub data: TokenData,
}

/// A start or end tag while its pieces are still being accumulated.
#[derive(Default)]
struct TagInProgress {
    name: String,
    is_end: bool,
    self_closing: bool,
    attributes: Vec<Attribute>,
    attr_name: String,
    attr_value: String,
    start: Location,
}

pub(crate) struct Tokenizer<R: Read> {
    input: InputStream<R>,
    state: State,

    /// Where to return after a character reference is resolved.
    return_state: State,

    tag: TagInProgress,
    comment: String,
    doctype: DoctypeToken,

    /// Scratch buffer for script-data escapes, RCDATA/RAWTEXT end tag
    /// matching, and character-reference flushing.
    temp: String,
    char_ref_code: u32,

    /// Name of the last emitted start tag, for the appropriate-end-tag
    /// checks in the RCDATA, RAWTEXT, and script-data states.
    last_start_tag: Option<Rc<str>>,

    /// Whether `<![CDATA[` opens a real CDATA section. The tree builder
    /// sets this while the adjusted current node is foreign.
    cdata_allowed: bool,

    pending: VecDeque<Token>,
    token_start: Location,
    eof_emitted: bool,

    interner: Interner,
}

const WHITESPACE: [char; 4] = ['\t', '\n', '\x0C', ' '];

fn is_ws(c: char) -> bool {
    WHITESPACE.contains(&c)
}

impl<R: Read> Tokenizer<R> {
    pub fn new(input: InputStream<R>) -> Self {
        Self {
            input,
            state: State::Data,
            return_state: State::Data,
            tag: TagInProgress::default(),
            comment: String::new(),
            doctype: DoctypeToken::default(),
            temp: String::new(),
            char_ref_code: 0,
            last_start_tag: None,
            cdata_allowed: false,
            pending: VecDeque::new(),
            token_start: Location::new(1, 1),
            eof_emitted: false,
            interner: Interner::default(),
        }
    }

    /// The content-model switch written by the tree builder.
    pub fn set_state(&mut self, state: State) {
        log::trace!("tokenizer state set to {state:?}");
        self.state = state;
    }

    /// Primes the appropriate-end-tag check, used when fragment parsing
    /// starts inside an RCDATA or RAWTEXT context element.
    pub fn set_last_start_tag(&mut self, name: &str) {
        self.last_start_tag = Some(self.interner.intern(name));
    }

    pub fn set_cdata_allowed(&mut self, allowed: bool) {
        self.cdata_allowed = allowed;
    }

    pub fn intern(&mut self, s: &str) -> Rc<str> {
        self.interner.intern(s)
    }

    pub fn location(&self) -> Location {
        self.input.location()
    }

    pub fn input_mut(&mut self) -> &mut InputStream<R> {
        &mut self.input
    }

    /// Resets all tokenizer state for a re-decode restart.
    pub fn reset(&mut self) {
        self.state = State::Data;
        self.return_state = State::Data;
        self.tag = TagInProgress::default();
        self.comment.clear();
        self.doctype = DoctypeToken::default();
        self.temp.clear();
        self.char_ref_code = 0;
        self.last_start_tag = None;
        self.cdata_allowed = false;
        self.pending.clear();
        self.eof_emitted = false;
    }

    /// Advances until a token is available and returns it. After the EOF
    /// token has been produced, every further call returns EOF again.
    pub fn next_token(&mut self, report: &mut Report<'_>) -> Result<Token, StreamError> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(token);
            }
            if self.eof_emitted {
                return Ok(Token {
                    location: self.input.location(),
                    data: TokenData::Eof,
                });
            }
            self.step(report)?;
        }
    }

    fn emit(&mut self, location: Location, data: TokenData) {
        self.pending.push_back(Token { location, data });
    }

    fn emit_char(&mut self, location: Location, c: char) {
        self.emit(location, TokenData::Char(c));
    }

    fn emit_eof(&mut self, location: Location) {
        self.eof_emitted = true;
        self.emit(location, TokenData::Eof);
    }

    fn start_tag(&mut self, is_end: bool) {
        self.tag = TagInProgress {
            is_end,
            start: self.token_start,
            ..TagInProgress::default()
        };
    }

    /// Folds the attribute under construction into the tag, discarding it
    /// with a report when the name repeats an earlier attribute.
    ///
    /// > If there is already an attribute on the token with the exact same
    /// > name, then this is a duplicate-attribute parse error and the new
    /// > attribute must be removed from the token.
    fn commit_attribute(&mut self, report: &mut Report<'_>) -> Result<(), StreamError> {
        if self.tag.attr_name.is_empty() {
            self.tag.attr_value.clear();
            return Ok(());
        }
        let name = std::mem::take(&mut self.tag.attr_name);
        let value = std::mem::take(&mut self.tag.attr_value);

        if self
            .tag
            .attributes
            .iter()
            .any(|a| &*a.name.local == name.as_str())
        {
            report(
                self.input.location(),
                &Error::DuplicateAttribute(name.into()),
            )?;
            return Ok(());
        }

        let local = self.interner.intern(&name);
        self.tag.attributes.push(Attribute {
            name: Name { ns: None, local },
            value: value.into(),
        });
        Ok(())
    }

    fn emit_tag(&mut self, report: &mut Report<'_>) -> Result<(), StreamError> {
        self.commit_attribute(report)?;
        let tag = std::mem::take(&mut self.tag);
        let name = self.interner.intern(&tag.name);

        let data = if tag.is_end {
            if !tag.attributes.is_empty() || tag.self_closing {
                report(tag.start, &Error::UnexpectedCharacter('/'))?;
            }
            TokenData::EndTag { name }
        } else {
            self.last_start_tag = Some(Rc::clone(&name));
            TokenData::StartTag {
                name,
                attributes: tag.attributes,
                self_closing: tag.self_closing,
            }
        };
        self.emit(tag.start, data);
        Ok(())
    }

    fn emit_comment(&mut self) {
        let text = std::mem::take(&mut self.comment);
        self.emit(self.token_start, TokenData::Comment(text.into()));
    }

    fn emit_doctype(&mut self) {
        let doctype = std::mem::take(&mut self.doctype);
        self.emit(self.token_start, TokenData::Doctype(doctype));
    }

    /// Whether the character-reference return state is an attribute value,
    /// which changes where the replacement is flushed and enables the
    /// legacy ambiguity rule.
    fn in_attribute_value(&self) -> bool {
        matches!(
            self.return_state,
            State::AttributeValueDoubleQuoted
                | State::AttributeValueSingleQuoted
                | State::AttributeValueUnquoted
        )
    }

    /// Flush code points consumed as a character reference: the scratch
    /// buffer goes into the attribute value or out as character tokens.
    fn flush_char_ref(&mut self, location: Location) {
        if self.in_attribute_value() {
            let temp = std::mem::take(&mut self.temp);
            self.tag.attr_value.push_str(&temp);
            self.temp = temp;
        } else {
            let chars: Vec<char> = self.temp.chars().collect();
            for c in chars {
                self.emit_char(location, c);
            }
        }
        self.temp.clear();
    }

    /// Checks whether the accumulated end tag name matches the last start
    /// tag, which decides if `</script>` and friends close raw text.
    fn is_appropriate_end_tag(&self) -> bool {
        match &self.last_start_tag {
            Some(last) => self.tag.name == **last,
            None => false,
        }
    }

    fn step(&mut self, report: &mut Report<'_>) -> Result<(), StreamError> {
        let loc = self.input.location();
        let c = self.input.next(report)?;

        match self.state {
            State::Data => match c {
                Some('&') => {
                    self.return_state = State::Data;
                    self.state = State::CharacterReference;
                }
                Some('<') => {
                    self.token_start = loc;
                    self.state = State::TagOpen;
                }
                Some('\0') => {
                    report(loc, &Error::UnexpectedCharacter('\0'))?;
                    self.emit_char(loc, REPLACEMENT_CHARACTER);
                }
                Some(other) => self.emit_char(loc, other),
                None => self.emit_eof(loc),
            },

            State::Rcdata => match c {
                Some('&') => {
                    self.return_state = State::Rcdata;
                    self.state = State::CharacterReference;
                }
                Some('<') => {
                    self.token_start = loc;
                    self.state = State::RcdataLessThanSign;
                }
                Some('\0') => {
                    report(loc, &Error::UnexpectedCharacter('\0'))?;
                    self.emit_char(loc, REPLACEMENT_CHARACTER);
                }
                Some(other) => self.emit_char(loc, other),
                None => self.emit_eof(loc),
            },

            State::Rawtext => match c {
                Some('<') => {
                    self.token_start = loc;
                    self.state = State::RawtextLessThanSign;
                }
                Some('\0') => {
                    report(loc, &Error::UnexpectedCharacter('\0'))?;
                    self.emit_char(loc, REPLACEMENT_CHARACTER);
                }
                Some(other) => self.emit_char(loc, other),
                None => self.emit_eof(loc),
            },

            State::ScriptData => match c {
                Some('<') => {
                    self.token_start = loc;
                    self.state = State::ScriptDataLessThanSign;
                }
                Some('\0') => {
                    report(loc, &Error::UnexpectedCharacter('\0'))?;
                    self.emit_char(loc, REPLACEMENT_CHARACTER);
                }
                Some(other) => self.emit_char(loc, other),
                None => self.emit_eof(loc),
            },

            State::Plaintext => match c {
                Some('\0') => {
                    report(loc, &Error::UnexpectedCharacter('\0'))?;
                    self.emit_char(loc, REPLACEMENT_CHARACTER);
                }
                Some(other) => self.emit_char(loc, other),
                None => self.emit_eof(loc),
            },

            State::TagOpen => match c {
                Some('!') => self.state = State::MarkupDeclarationOpen,
                Some('/') => self.state = State::EndTagOpen,
                Some(a) if a.is_ascii_alphabetic() => {
                    self.start_tag(false);
                    self.input.push_back(a);
                    self.state = State::TagName;
                }
                Some('?') => {
                    /*
                     * > This is an unexpected-question-mark-instead-of-tag-name
                     * > parse error. Create a comment token whose data is the
                     * > empty string. Reconsume in the bogus comment state.
                     */
                    report(loc, &Error::UnexpectedCharacter('?'))?;
                    self.comment.clear();
                    self.input.push_back('?');
                    self.state = State::BogusComment;
                }
                Some(other) => {
                    // "<3" is rendered, not parsed: the "<" is plain text.
                    report(loc, &Error::UnexpectedCharacter(other))?;
                    self.emit_char(self.token_start, '<');
                    self.input.push_back(other);
                    self.state = State::Data;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("tag"))?;
                    self.emit_char(self.token_start, '<');
                    self.emit_eof(loc);
                }
            },

            State::EndTagOpen => match c {
                Some(a) if a.is_ascii_alphabetic() => {
                    self.start_tag(true);
                    self.input.push_back(a);
                    self.state = State::TagName;
                }
                Some('>') => {
                    // > This is a missing-end-tag-name parse error.
                    report(loc, &Error::UnexpectedCharacter('>'))?;
                    self.state = State::Data;
                }
                Some(other) => {
                    /*
                     * > This is an invalid-first-character-of-tag-name parse
                     * > error. Create a comment token whose data is the empty
                     * > string. Reconsume in the bogus comment state.
                     */
                    report(loc, &Error::UnexpectedCharacter(other))?;
                    self.comment.clear();
                    self.input.push_back(other);
                    self.state = State::BogusComment;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("end tag"))?;
                    self.emit_char(self.token_start, '<');
                    self.emit_char(self.token_start, '/');
                    self.emit_eof(loc);
                }
            },

            State::TagName => match c {
                Some(w) if is_ws(w) => self.state = State::BeforeAttributeName,
                Some('/') => self.state = State::SelfClosingStartTag,
                Some('>') => {
                    self.state = State::Data;
                    self.emit_tag(report)?;
                }
                Some('\0') => {
                    report(loc, &Error::UnexpectedCharacter('\0'))?;
                    self.tag.name.push(REPLACEMENT_CHARACTER);
                }
                Some(other) => self.tag.name.push(other.to_ascii_lowercase()),
                None => {
                    report(loc, &Error::UnexpectedEof("tag"))?;
                    self.emit_eof(loc);
                }
            },

            State::RcdataLessThanSign => match c {
                Some('/') => {
                    self.temp.clear();
                    self.state = State::RcdataEndTagOpen;
                }
                other => {
                    self.emit_char(self.token_start, '<');
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = State::Rcdata;
                }
            },

            State::RcdataEndTagOpen => match c {
                Some(a) if a.is_ascii_alphabetic() => {
                    self.start_tag(true);
                    self.input.push_back(a);
                    self.state = State::RcdataEndTagName;
                }
                other => {
                    self.emit_char(self.token_start, '<');
                    self.emit_char(self.token_start, '/');
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = State::Rcdata;
                }
            },

            State::RcdataEndTagName => {
                self.raw_end_tag_name(c, loc, State::Rcdata, report)?;
            }

            State::RawtextLessThanSign => match c {
                Some('/') => {
                    self.temp.clear();
                    self.state = State::RawtextEndTagOpen;
                }
                other => {
                    self.emit_char(self.token_start, '<');
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = State::Rawtext;
                }
            },

            State::RawtextEndTagOpen => match c {
                Some(a) if a.is_ascii_alphabetic() => {
                    self.start_tag(true);
                    self.input.push_back(a);
                    self.state = State::RawtextEndTagName;
                }
                other => {
                    self.emit_char(self.token_start, '<');
                    self.emit_char(self.token_start, '/');
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = State::Rawtext;
                }
            },

            State::RawtextEndTagName => {
                self.raw_end_tag_name(c, loc, State::Rawtext, report)?;
            }

            State::ScriptDataLessThanSign => match c {
                Some('/') => {
                    self.temp.clear();
                    self.state = State::ScriptDataEndTagOpen;
                }
                Some('!') => {
                    self.emit_char(self.token_start, '<');
                    self.emit_char(loc, '!');
                    self.state = State::ScriptDataEscapeStart;
                }
                other => {
                    self.emit_char(self.token_start, '<');
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = State::ScriptData;
                }
            },

            State::ScriptDataEndTagOpen => match c {
                Some(a) if a.is_ascii_alphabetic() => {
                    self.start_tag(true);
                    self.input.push_back(a);
                    self.state = State::ScriptDataEndTagName;
                }
                other => {
                    self.emit_char(self.token_start, '<');
                    self.emit_char(self.token_start, '/');
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = State::ScriptData;
                }
            },

            State::ScriptDataEndTagName => {
                self.raw_end_tag_name(c, loc, State::ScriptData, report)?;
            }

            State::ScriptDataEscapeStart => match c {
                Some('-') => {
                    self.emit_char(loc, '-');
                    self.state = State::ScriptDataEscapeStartDash;
                }
                other => {
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = State::ScriptData;
                }
            },

            State::ScriptDataEscapeStartDash => match c {
                Some('-') => {
                    self.emit_char(loc, '-');
                    self.state = State::ScriptDataEscapedDashDash;
                }
                other => {
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = State::ScriptData;
                }
            },

            State::ScriptDataEscaped => match c {
                Some('-') => {
                    self.emit_char(loc, '-');
                    self.state = State::ScriptDataEscapedDash;
                }
                Some('<') => {
                    self.token_start = loc;
                    self.state = State::ScriptDataEscapedLessThanSign;
                }
                Some('\0') => {
                    report(loc, &Error::UnexpectedCharacter('\0'))?;
                    self.emit_char(loc, REPLACEMENT_CHARACTER);
                }
                Some(other) => self.emit_char(loc, other),
                None => {
                    report(loc, &Error::UnexpectedEof("script data"))?;
                    self.emit_eof(loc);
                }
            },

            State::ScriptDataEscapedDash => match c {
                Some('-') => {
                    self.emit_char(loc, '-');
                    self.state = State::ScriptDataEscapedDashDash;
                }
                Some('<') => {
                    self.token_start = loc;
                    self.state = State::ScriptDataEscapedLessThanSign;
                }
                Some('\0') => {
                    report(loc, &Error::UnexpectedCharacter('\0'))?;
                    self.emit_char(loc, REPLACEMENT_CHARACTER);
                    self.state = State::ScriptDataEscaped;
                }
                Some(other) => {
                    self.emit_char(loc, other);
                    self.state = State::ScriptDataEscaped;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("script data"))?;
                    self.emit_eof(loc);
                }
            },

            State::ScriptDataEscapedDashDash => match c {
                Some('-') => self.emit_char(loc, '-'),
                Some('<') => {
                    self.token_start = loc;
                    self.state = State::ScriptDataEscapedLessThanSign;
                }
                Some('>') => {
                    self.emit_char(loc, '>');
                    self.state = State::ScriptData;
                }
                Some('\0') => {
                    report(loc, &Error::UnexpectedCharacter('\0'))?;
                    self.emit_char(loc, REPLACEMENT_CHARACTER);
                    self.state = State::ScriptDataEscaped;
                }
                Some(other) => {
                    self.emit_char(loc, other);
                    self.state = State::ScriptDataEscaped;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("script data"))?;
                    self.emit_eof(loc);
                }
            },

            State::ScriptDataEscapedLessThanSign => match c {
                Some('/') => {
                    self.temp.clear();
                    self.state = State::ScriptDataEscapedEndTagOpen;
                }
                Some(a) if a.is_ascii_alphabetic() => {
                    self.temp.clear();
                    self.emit_char(self.token_start, '<');
                    self.input.push_back(a);
                    self.state = State::ScriptDataDoubleEscapeStart;
                }
                other => {
                    self.emit_char(self.token_start, '<');
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = State::ScriptDataEscaped;
                }
            },

            State::ScriptDataEscapedEndTagOpen => match c {
                Some(a) if a.is_ascii_alphabetic() => {
                    self.start_tag(true);
                    self.input.push_back(a);
                    self.state = State::ScriptDataEscapedEndTagName;
                }
                other => {
                    self.emit_char(self.token_start, '<');
                    self.emit_char(self.token_start, '/');
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = State::ScriptDataEscaped;
                }
            },

            State::ScriptDataEscapedEndTagName => {
                self.raw_end_tag_name(c, loc, State::ScriptDataEscaped, report)?;
            }

            State::ScriptDataDoubleEscapeStart => match c {
                Some(t) if is_ws(t) || t == '/' || t == '>' => {
                    self.state = if self.temp == "script" {
                        State::ScriptDataDoubleEscaped
                    } else {
                        State::ScriptDataEscaped
                    };
                    self.emit_char(loc, t);
                }
                Some(a) if a.is_ascii_alphabetic() => {
                    self.temp.push(a.to_ascii_lowercase());
                    self.emit_char(loc, a);
                }
                other => {
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = State::ScriptDataEscaped;
                }
            },

            State::ScriptDataDoubleEscaped => match c {
                Some('-') => {
                    self.emit_char(loc, '-');
                    self.state = State::ScriptDataDoubleEscapedDash;
                }
                Some('<') => {
                    self.emit_char(loc, '<');
                    self.state = State::ScriptDataDoubleEscapedLessThanSign;
                }
                Some('\0') => {
                    report(loc, &Error::UnexpectedCharacter('\0'))?;
                    self.emit_char(loc, REPLACEMENT_CHARACTER);
                }
                Some(other) => self.emit_char(loc, other),
                None => {
                    report(loc, &Error::UnexpectedEof("script data"))?;
                    self.emit_eof(loc);
                }
            },

            State::ScriptDataDoubleEscapedDash => match c {
                Some('-') => {
                    self.emit_char(loc, '-');
                    self.state = State::ScriptDataDoubleEscapedDashDash;
                }
                Some('<') => {
                    self.emit_char(loc, '<');
                    self.state = State::ScriptDataDoubleEscapedLessThanSign;
                }
                Some('\0') => {
                    report(loc, &Error::UnexpectedCharacter('\0'))?;
                    self.emit_char(loc, REPLACEMENT_CHARACTER);
                    self.state = State::ScriptDataDoubleEscaped;
                }
                Some(other) => {
                    self.emit_char(loc, other);
                    self.state = State::ScriptDataDoubleEscaped;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("script data"))?;
                    self.emit_eof(loc);
                }
            },

            State::ScriptDataDoubleEscapedDashDash => match c {
                Some('-') => self.emit_char(loc, '-'),
                Some('<') => {
                    self.emit_char(loc, '<');
                    self.state = State::ScriptDataDoubleEscapedLessThanSign;
                }
                Some('>') => {
                    self.emit_char(loc, '>');
                    self.state = State::ScriptData;
                }
                Some('\0') => {
                    report(loc, &Error::UnexpectedCharacter('\0'))?;
                    self.emit_char(loc, REPLACEMENT_CHARACTER);
                    self.state = State::ScriptDataDoubleEscaped;
                }
                Some(other) => {
                    self.emit_char(loc, other);
                    self.state = State::ScriptDataDoubleEscaped;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("script data"))?;
                    self.emit_eof(loc);
                }
            },

            State::ScriptDataDoubleEscapedLessThanSign => match c {
                Some('/') => {
                    self.temp.clear();
                    self.emit_char(loc, '/');
                    self.state = State::ScriptDataDoubleEscapeEnd;
                }
                other => {
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = State::ScriptDataDoubleEscaped;
                }
            },

            State::ScriptDataDoubleEscapeEnd => match c {
                Some(t) if is_ws(t) || t == '/' || t == '>' => {
                    self.state = if self.temp == "script" {
                        State::ScriptDataEscaped
                    } else {
                        State::ScriptDataDoubleEscaped
                    };
                    self.emit_char(loc, t);
                }
                Some(a) if a.is_ascii_alphabetic() => {
                    self.temp.push(a.to_ascii_lowercase());
                    self.emit_char(loc, a);
                }
                other => {
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = State::ScriptDataDoubleEscaped;
                }
            },

            State::BeforeAttributeName => match c {
                Some(w) if is_ws(w) => {}
                Some(a @ ('/' | '>')) => {
                    self.input.push_back(a);
                    self.state = State::AfterAttributeName;
                }
                Some('=') => {
                    /*
                     * > This is an unexpected-equals-sign-before-attribute-name
                     * > parse error. Start a new attribute ... Set that
                     * > attribute's name to the current input character.
                     */
                    report(loc, &Error::UnexpectedCharacter('='))?;
                    self.commit_attribute(report)?;
                    self.tag.attr_name.push('=');
                    self.state = State::AttributeName;
                }
                Some(other) => {
                    self.commit_attribute(report)?;
                    self.input.push_back(other);
                    self.state = State::AttributeName;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("tag"))?;
                    self.emit_eof(loc);
                }
            },

            State::AttributeName => match c {
                Some(w) if is_ws(w) => self.state = State::AfterAttributeName,
                Some(a @ ('/' | '>')) => {
                    self.input.push_back(a);
                    self.state = State::AfterAttributeName;
                }
                Some('=') => self.state = State::BeforeAttributeValue,
                Some('\0') => {
                    report(loc, &Error::UnexpectedCharacter('\0'))?;
                    self.tag.attr_name.push(REPLACEMENT_CHARACTER);
                }
                Some(q @ ('"' | '\'' | '<')) => {
                    // > This is an unexpected-character-in-attribute-name
                    // > parse error. Treat it as per the "anything else"
                    // > entry below.
                    report(loc, &Error::UnexpectedCharacter(q))?;
                    self.tag.attr_name.push(q);
                }
                Some(other) => self.tag.attr_name.push(other.to_ascii_lowercase()),
                None => {
                    self.state = State::AfterAttributeName;
                    report(loc, &Error::UnexpectedEof("tag"))?;
                    self.emit_eof(loc);
                }
            },

            State::AfterAttributeName => match c {
                Some(w) if is_ws(w) => {}
                Some('/') => {
                    self.commit_attribute(report)?;
                    self.state = State::SelfClosingStartTag;
                }
                Some('=') => self.state = State::BeforeAttributeValue,
                Some('>') => {
                    self.state = State::Data;
                    self.emit_tag(report)?;
                }
                Some(other) => {
                    self.commit_attribute(report)?;
                    self.input.push_back(other);
                    self.state = State::AttributeName;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("tag"))?;
                    self.emit_eof(loc);
                }
            },

            State::BeforeAttributeValue => match c {
                Some(w) if is_ws(w) => {}
                Some('"') => self.state = State::AttributeValueDoubleQuoted,
                Some('\'') => self.state = State::AttributeValueSingleQuoted,
                Some('>') => {
                    // > This is a missing-attribute-value parse error.
                    report(loc, &Error::UnexpectedCharacter('>'))?;
                    self.state = State::Data;
                    self.emit_tag(report)?;
                }
                Some(other) => {
                    self.input.push_back(other);
                    self.state = State::AttributeValueUnquoted;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("tag"))?;
                    self.emit_eof(loc);
                }
            },

            State::AttributeValueDoubleQuoted => match c {
                Some('"') => self.state = State::AfterAttributeValueQuoted,
                Some('&') => {
                    self.return_state = State::AttributeValueDoubleQuoted;
                    self.state = State::CharacterReference;
                }
                Some('\0') => {
                    report(loc, &Error::UnexpectedCharacter('\0'))?;
                    self.tag.attr_value.push(REPLACEMENT_CHARACTER);
                }
                Some(other) => self.tag.attr_value.push(other),
                None => {
                    report(loc, &Error::UnexpectedEof("attribute value"))?;
                    self.emit_eof(loc);
                }
            },

            State::AttributeValueSingleQuoted => match c {
                Some('\'') => self.state = State::AfterAttributeValueQuoted,
                Some('&') => {
                    self.return_state = State::AttributeValueSingleQuoted;
                    self.state = State::CharacterReference;
                }
                Some('\0') => {
                    report(loc, &Error::UnexpectedCharacter('\0'))?;
                    self.tag.attr_value.push(REPLACEMENT_CHARACTER);
                }
                Some(other) => self.tag.attr_value.push(other),
                None => {
                    report(loc, &Error::UnexpectedEof("attribute value"))?;
                    self.emit_eof(loc);
                }
            },

            State::AttributeValueUnquoted => match c {
                Some(w) if is_ws(w) => self.state = State::BeforeAttributeName,
                Some('&') => {
                    self.return_state = State::AttributeValueUnquoted;
                    self.state = State::CharacterReference;
                }
                Some('>') => {
                    self.state = State::Data;
                    self.emit_tag(report)?;
                }
                Some('\0') => {
                    report(loc, &Error::UnexpectedCharacter('\0'))?;
                    self.tag.attr_value.push(REPLACEMENT_CHARACTER);
                }
                Some(q @ ('"' | '\'' | '<' | '=' | '`')) => {
                    // > This is an unexpected-character-in-unquoted-attribute-value
                    // > parse error. Treat it as per the "anything else" entry below.
                    report(loc, &Error::UnexpectedCharacter(q))?;
                    self.tag.attr_value.push(q);
                }
                Some(other) => self.tag.attr_value.push(other),
                None => {
                    report(loc, &Error::UnexpectedEof("attribute value"))?;
                    self.emit_eof(loc);
                }
            },

            State::AfterAttributeValueQuoted => match c {
                Some(w) if is_ws(w) => self.state = State::BeforeAttributeName,
                Some('/') => self.state = State::SelfClosingStartTag,
                Some('>') => {
                    self.state = State::Data;
                    self.emit_tag(report)?;
                }
                Some(other) => {
                    // > This is a missing-whitespace-between-attributes parse error.
                    report(loc, &Error::UnexpectedCharacter(other))?;
                    self.input.push_back(other);
                    self.state = State::BeforeAttributeName;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("tag"))?;
                    self.emit_eof(loc);
                }
            },

            State::SelfClosingStartTag => match c {
                Some('>') => {
                    self.tag.self_closing = true;
                    self.state = State::Data;
                    self.emit_tag(report)?;
                }
                Some(other) => {
                    // > This is an unexpected-solidus-in-tag parse error.
                    report(loc, &Error::UnexpectedCharacter('/'))?;
                    self.input.push_back(other);
                    self.state = State::BeforeAttributeName;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("tag"))?;
                    self.emit_eof(loc);
                }
            },

            State::BogusComment => match c {
                Some('>') => {
                    self.state = State::Data;
                    self.emit_comment();
                }
                Some('\0') => {
                    report(loc, &Error::UnexpectedCharacter('\0'))?;
                    self.comment.push(REPLACEMENT_CHARACTER);
                }
                Some(other) => self.comment.push(other),
                None => {
                    self.emit_comment();
                    self.emit_eof(loc);
                }
            },

            State::MarkupDeclarationOpen => {
                self.markup_declaration_open(c, loc, report)?;
            }

            State::CommentStart => match c {
                Some('-') => self.state = State::CommentStartDash,
                Some('>') => {
                    // > This is an abrupt-closing-of-empty-comment parse error.
                    report(loc, &Error::UnexpectedCharacter('>'))?;
                    self.state = State::Data;
                    self.emit_comment();
                }
                other => {
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = State::Comment;
                }
            },

            State::CommentStartDash => match c {
                Some('-') => self.state = State::CommentEnd,
                Some('>') => {
                    report(loc, &Error::UnexpectedCharacter('>'))?;
                    self.state = State::Data;
                    self.emit_comment();
                }
                Some(other) => {
                    self.comment.push('-');
                    self.input.push_back(other);
                    self.state = State::Comment;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("comment"))?;
                    self.emit_comment();
                    self.emit_eof(loc);
                }
            },

            State::Comment => match c {
                Some('<') => {
                    self.comment.push('<');
                    self.state = State::CommentLessThanSign;
                }
                Some('-') => self.state = State::CommentEndDash,
                Some('\0') => {
                    report(loc, &Error::UnexpectedCharacter('\0'))?;
                    self.comment.push(REPLACEMENT_CHARACTER);
                }
                Some(other) => self.comment.push(other),
                None => {
                    report(loc, &Error::UnexpectedEof("comment"))?;
                    self.emit_comment();
                    self.emit_eof(loc);
                }
            },

            State::CommentLessThanSign => match c {
                Some('!') => {
                    self.comment.push('!');
                    self.state = State::CommentLessThanSignBang;
                }
                Some('<') => self.comment.push('<'),
                other => {
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = State::Comment;
                }
            },

            State::CommentLessThanSignBang => match c {
                Some('-') => self.state = State::CommentLessThanSignBangDash,
                other => {
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = State::Comment;
                }
            },

            State::CommentLessThanSignBangDash => match c {
                Some('-') => self.state = State::CommentLessThanSignBangDashDash,
                other => {
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = State::CommentEndDash;
                }
            },

            State::CommentLessThanSignBangDashDash => match c {
                Some('>') | None => {
                    if let Some(other) = c {
                        self.input.push_back(other);
                    }
                    self.state = State::CommentEnd;
                }
                Some(other) => {
                    // > This is a nested-comment parse error.
                    report(loc, &Error::UnexpectedCharacter(other))?;
                    self.input.push_back(other);
                    self.state = State::CommentEnd;
                }
            },

            State::CommentEndDash => match c {
                Some('-') => self.state = State::CommentEnd,
                Some(other) => {
                    self.comment.push('-');
                    self.input.push_back(other);
                    self.state = State::Comment;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("comment"))?;
                    self.emit_comment();
                    self.emit_eof(loc);
                }
            },

            State::CommentEnd => match c {
                Some('>') => {
                    self.state = State::Data;
                    self.emit_comment();
                }
                Some('!') => self.state = State::CommentEndBang,
                Some('-') => self.comment.push('-'),
                Some(other) => {
                    self.comment.push_str("--");
                    self.input.push_back(other);
                    self.state = State::Comment;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("comment"))?;
                    self.emit_comment();
                    self.emit_eof(loc);
                }
            },

            State::CommentEndBang => match c {
                Some('-') => {
                    self.comment.push_str("--!");
                    self.state = State::CommentEndDash;
                }
                Some('>') => {
                    // > This is an incorrectly-closed-comment parse error.
                    report(loc, &Error::UnexpectedCharacter('!'))?;
                    self.state = State::Data;
                    self.emit_comment();
                }
                Some(other) => {
                    self.comment.push_str("--!");
                    self.input.push_back(other);
                    self.state = State::Comment;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("comment"))?;
                    self.emit_comment();
                    self.emit_eof(loc);
                }
            },

            State::Doctype => match c {
                Some(w) if is_ws(w) => self.state = State::BeforeDoctypeName,
                Some('>') => {
                    self.input.push_back('>');
                    self.state = State::BeforeDoctypeName;
                }
                Some(other) => {
                    report(loc, &Error::BadDoctype("missing whitespace before name".into()))?;
                    self.input.push_back(other);
                    self.state = State::BeforeDoctypeName;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("DOCTYPE"))?;
                    self.doctype.force_quirks = true;
                    self.emit_doctype();
                    self.emit_eof(loc);
                }
            },

            State::BeforeDoctypeName => match c {
                Some(w) if is_ws(w) => {}
                Some('>') => {
                    report(loc, &Error::BadDoctype("missing name".into()))?;
                    self.doctype.force_quirks = true;
                    self.state = State::Data;
                    self.emit_doctype();
                }
                Some('\0') => {
                    report(loc, &Error::UnexpectedCharacter('\0'))?;
                    self.doctype.name = Some(REPLACEMENT_CHARACTER.to_string());
                    self.state = State::DoctypeName;
                }
                Some(other) => {
                    self.doctype.name = Some(other.to_ascii_lowercase().to_string());
                    self.state = State::DoctypeName;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("DOCTYPE"))?;
                    self.doctype.force_quirks = true;
                    self.emit_doctype();
                    self.emit_eof(loc);
                }
            },

            State::DoctypeName => match c {
                Some(w) if is_ws(w) => self.state = State::AfterDoctypeName,
                Some('>') => {
                    self.state = State::Data;
                    self.emit_doctype();
                }
                Some('\0') => {
                    report(loc, &Error::UnexpectedCharacter('\0'))?;
                    if let Some(name) = &mut self.doctype.name {
                        name.push(REPLACEMENT_CHARACTER);
                    }
                }
                Some(other) => {
                    if let Some(name) = &mut self.doctype.name {
                        name.push(other.to_ascii_lowercase());
                    }
                }
                None => {
                    report(loc, &Error::UnexpectedEof("DOCTYPE"))?;
                    self.doctype.force_quirks = true;
                    self.emit_doctype();
                    self.emit_eof(loc);
                }
            },

            State::AfterDoctypeName => {
                self.after_doctype_name(c, loc, report)?;
            }

            State::AfterDoctypePublicKeyword => match c {
                Some(w) if is_ws(w) => self.state = State::BeforeDoctypePublicIdentifier,
                Some(q @ ('"' | '\'')) => {
                    report(
                        loc,
                        &Error::BadDoctype("missing whitespace after PUBLIC".into()),
                    )?;
                    self.doctype.public_identifier = Some(String::new());
                    self.state = if q == '"' {
                        State::DoctypePublicIdentifierDoubleQuoted
                    } else {
                        State::DoctypePublicIdentifierSingleQuoted
                    };
                }
                Some('>') => {
                    report(loc, &Error::BadDoctype("missing public identifier".into()))?;
                    self.doctype.force_quirks = true;
                    self.state = State::Data;
                    self.emit_doctype();
                }
                Some(other) => {
                    report(
                        loc,
                        &Error::BadDoctype("missing quote before public identifier".into()),
                    )?;
                    self.doctype.force_quirks = true;
                    self.input.push_back(other);
                    self.state = State::BogusDoctype;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("DOCTYPE"))?;
                    self.doctype.force_quirks = true;
                    self.emit_doctype();
                    self.emit_eof(loc);
                }
            },

            State::BeforeDoctypePublicIdentifier => match c {
                Some(w) if is_ws(w) => {}
                Some(q @ ('"' | '\'')) => {
                    self.doctype.public_identifier = Some(String::new());
                    self.state = if q == '"' {
                        State::DoctypePublicIdentifierDoubleQuoted
                    } else {
                        State::DoctypePublicIdentifierSingleQuoted
                    };
                }
                Some('>') => {
                    report(loc, &Error::BadDoctype("missing public identifier".into()))?;
                    self.doctype.force_quirks = true;
                    self.state = State::Data;
                    self.emit_doctype();
                }
                Some(other) => {
                    report(
                        loc,
                        &Error::BadDoctype("missing quote before public identifier".into()),
                    )?;
                    self.doctype.force_quirks = true;
                    self.input.push_back(other);
                    self.state = State::BogusDoctype;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("DOCTYPE"))?;
                    self.doctype.force_quirks = true;
                    self.emit_doctype();
                    self.emit_eof(loc);
                }
            },

            State::DoctypePublicIdentifierDoubleQuoted
            | State::DoctypePublicIdentifierSingleQuoted => {
                let quote = if self.state == State::DoctypePublicIdentifierDoubleQuoted {
                    '"'
                } else {
                    '\''
                };
                self.doctype_identifier(c, loc, quote, true, report)?;
            }

            State::AfterDoctypePublicIdentifier => match c {
                Some(w) if is_ws(w) => {
                    self.state = State::BetweenDoctypePublicAndSystemIdentifiers
                }
                Some('>') => {
                    self.state = State::Data;
                    self.emit_doctype();
                }
                Some(q @ ('"' | '\'')) => {
                    report(
                        loc,
                        &Error::BadDoctype("missing whitespace between identifiers".into()),
                    )?;
                    self.doctype.system_identifier = Some(String::new());
                    self.state = if q == '"' {
                        State::DoctypeSystemIdentifierDoubleQuoted
                    } else {
                        State::DoctypeSystemIdentifierSingleQuoted
                    };
                }
                Some(other) => {
                    report(
                        loc,
                        &Error::BadDoctype("missing quote before system identifier".into()),
                    )?;
                    self.doctype.force_quirks = true;
                    self.input.push_back(other);
                    self.state = State::BogusDoctype;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("DOCTYPE"))?;
                    self.doctype.force_quirks = true;
                    self.emit_doctype();
                    self.emit_eof(loc);
                }
            },

            State::BetweenDoctypePublicAndSystemIdentifiers => match c {
                Some(w) if is_ws(w) => {}
                Some('>') => {
                    self.state = State::Data;
                    self.emit_doctype();
                }
                Some(q @ ('"' | '\'')) => {
                    self.doctype.system_identifier = Some(String::new());
                    self.state = if q == '"' {
                        State::DoctypeSystemIdentifierDoubleQuoted
                    } else {
                        State::DoctypeSystemIdentifierSingleQuoted
                    };
                }
                Some(other) => {
                    report(
                        loc,
                        &Error::BadDoctype("missing quote before system identifier".into()),
                    )?;
                    self.doctype.force_quirks = true;
                    self.input.push_back(other);
                    self.state = State::BogusDoctype;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("DOCTYPE"))?;
                    self.doctype.force_quirks = true;
                    self.emit_doctype();
                    self.emit_eof(loc);
                }
            },

            State::AfterDoctypeSystemKeyword => match c {
                Some(w) if is_ws(w) => self.state = State::BeforeDoctypeSystemIdentifier,
                Some(q @ ('"' | '\'')) => {
                    report(
                        loc,
                        &Error::BadDoctype("missing whitespace after SYSTEM".into()),
                    )?;
                    self.doctype.system_identifier = Some(String::new());
                    self.state = if q == '"' {
                        State::DoctypeSystemIdentifierDoubleQuoted
                    } else {
                        State::DoctypeSystemIdentifierSingleQuoted
                    };
                }
                Some('>') => {
                    report(loc, &Error::BadDoctype("missing system identifier".into()))?;
                    self.doctype.force_quirks = true;
                    self.state = State::Data;
                    self.emit_doctype();
                }
                Some(other) => {
                    report(
                        loc,
                        &Error::BadDoctype("missing quote before system identifier".into()),
                    )?;
                    self.doctype.force_quirks = true;
                    self.input.push_back(other);
                    self.state = State::BogusDoctype;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("DOCTYPE"))?;
                    self.doctype.force_quirks = true;
                    self.emit_doctype();
                    self.emit_eof(loc);
                }
            },

            State::BeforeDoctypeSystemIdentifier => match c {
                Some(w) if is_ws(w) => {}
                Some(q @ ('"' | '\'')) => {
                    self.doctype.system_identifier = Some(String::new());
                    self.state = if q == '"' {
                        State::DoctypeSystemIdentifierDoubleQuoted
                    } else {
                        State::DoctypeSystemIdentifierSingleQuoted
                    };
                }
                Some('>') => {
                    report(loc, &Error::BadDoctype("missing system identifier".into()))?;
                    self.doctype.force_quirks = true;
                    self.state = State::Data;
                    self.emit_doctype();
                }
                Some(other) => {
                    report(
                        loc,
                        &Error::BadDoctype("missing quote before system identifier".into()),
                    )?;
                    self.doctype.force_quirks = true;
                    self.input.push_back(other);
                    self.state = State::BogusDoctype;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("DOCTYPE"))?;
                    self.doctype.force_quirks = true;
                    self.emit_doctype();
                    self.emit_eof(loc);
                }
            },

            State::DoctypeSystemIdentifierDoubleQuoted
            | State::DoctypeSystemIdentifierSingleQuoted => {
                let quote = if self.state == State::DoctypeSystemIdentifierDoubleQuoted {
                    '"'
                } else {
                    '\''
                };
                self.doctype_identifier(c, loc, quote, false, report)?;
            }

            State::AfterDoctypeSystemIdentifier => match c {
                Some(w) if is_ws(w) => {}
                Some('>') => {
                    self.state = State::Data;
                    self.emit_doctype();
                }
                Some(other) => {
                    /*
                     * > This is an unexpected-character-after-doctype-system-identifier
                     * > parse error. Reconsume in the bogus DOCTYPE state. (This
                     * > does not set the current DOCTYPE token's force-quirks
                     * > flag to on.)
                     */
                    report(loc, &Error::UnexpectedCharacter(other))?;
                    self.input.push_back(other);
                    self.state = State::BogusDoctype;
                }
                None => {
                    report(loc, &Error::UnexpectedEof("DOCTYPE"))?;
                    self.doctype.force_quirks = true;
                    self.emit_doctype();
                    self.emit_eof(loc);
                }
            },

            State::BogusDoctype => match c {
                Some('>') => {
                    self.state = State::Data;
                    self.emit_doctype();
                }
                Some('\0') => report(loc, &Error::UnexpectedCharacter('\0'))?,
                Some(_) => {}
                None => {
                    self.emit_doctype();
                    self.emit_eof(loc);
                }
            },

            State::CdataSection => match c {
                Some(']') => self.state = State::CdataSectionBracket,
                Some(other) => self.emit_char(loc, other),
                None => {
                    report(loc, &Error::UnexpectedEof("CDATA section"))?;
                    self.emit_eof(loc);
                }
            },

            State::CdataSectionBracket => match c {
                Some(']') => self.state = State::CdataSectionEnd,
                other => {
                    self.emit_char(loc, ']');
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = State::CdataSection;
                }
            },

            State::CdataSectionEnd => match c {
                Some('>') => self.state = State::Data,
                Some(']') => self.emit_char(loc, ']'),
                other => {
                    self.emit_char(loc, ']');
                    self.emit_char(loc, ']');
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = State::CdataSection;
                }
            },

            State::CharacterReference => {
                self.temp.clear();
                self.temp.push('&');
                match c {
                    Some(a) if a.is_ascii_alphanumeric() => {
                        self.input.push_back(a);
                        self.state = State::NamedCharacterReference;
                    }
                    Some('#') => {
                        self.temp.push('#');
                        self.state = State::NumericCharacterReference;
                    }
                    other => {
                        self.flush_char_ref(loc);
                        if let Some(other) = other {
                            self.input.push_back(other);
                        }
                        self.state = self.return_state;
                    }
                }
            }

            State::NamedCharacterReference => {
                // `c` is the first alphanumeric of the name.
                let first = match c {
                    Some(first) => first,
                    None => {
                        self.flush_char_ref(loc);
                        self.state = self.return_state;
                        return Ok(());
                    }
                };
                self.named_character_reference(first, loc, report)?;
            }

            State::NumericCharacterReference => {
                self.char_ref_code = 0;
                match c {
                    Some(x @ ('x' | 'X')) => {
                        self.temp.push(x);
                        self.state = State::HexadecimalCharacterReferenceStart;
                    }
                    other => {
                        if let Some(other) = other {
                            self.input.push_back(other);
                        }
                        self.state = State::DecimalCharacterReferenceStart;
                    }
                }
            }

            State::HexadecimalCharacterReferenceStart => match c {
                Some(h) if h.is_ascii_hexdigit() => {
                    self.input.push_back(h);
                    self.state = State::HexadecimalCharacterReference;
                }
                other => {
                    // > This is an absence-of-digits-in-numeric-character-reference
                    // > parse error.
                    report(loc, &Error::BadCharacterReference(self.temp.clone().into()))?;
                    self.flush_char_ref(loc);
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = self.return_state;
                }
            },

            State::DecimalCharacterReferenceStart => match c {
                Some(d) if d.is_ascii_digit() => {
                    self.input.push_back(d);
                    self.state = State::DecimalCharacterReference;
                }
                other => {
                    report(loc, &Error::BadCharacterReference(self.temp.clone().into()))?;
                    self.flush_char_ref(loc);
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = self.return_state;
                }
            },

            State::HexadecimalCharacterReference => match c {
                Some(h) if h.is_ascii_hexdigit() => {
                    self.char_ref_code = self
                        .char_ref_code
                        .saturating_mul(16)
                        .saturating_add(h.to_digit(16).unwrap_or(0));
                }
                Some(';') => self.state = State::NumericCharacterReferenceEnd,
                other => {
                    // > This is a missing-semicolon-after-character-reference
                    // > parse error.
                    report(loc, &Error::BadCharacterReference(self.temp.clone().into()))?;
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = State::NumericCharacterReferenceEnd;
                }
            },

            State::DecimalCharacterReference => match c {
                Some(d) if d.is_ascii_digit() => {
                    self.char_ref_code = self
                        .char_ref_code
                        .saturating_mul(10)
                        .saturating_add(d.to_digit(10).unwrap_or(0));
                }
                Some(';') => self.state = State::NumericCharacterReferenceEnd,
                other => {
                    report(loc, &Error::BadCharacterReference(self.temp.clone().into()))?;
                    if let Some(other) = other {
                        self.input.push_back(other);
                    }
                    self.state = State::NumericCharacterReferenceEnd;
                }
            },

            State::NumericCharacterReferenceEnd => {
                if let Some(other) = c {
                    self.input.push_back(other);
                }
                let (replacement, well_formed) = entities::numeric_replacement(self.char_ref_code);
                if !well_formed {
                    report(
                        self.token_start,
                        &Error::BadCharacterReference(self.temp.clone().into()),
                    )?;
                }
                self.temp.clear();
                self.temp.push(replacement);
                self.flush_char_ref(loc);
                self.state = self.return_state;
            }
        }

        Ok(())
    }

    /// The shared body of the RCDATA, RAWTEXT, script data, and script data
    /// escaped end-tag-name states: an end tag closes the raw element only
    /// when its name matches the last start tag.
    fn raw_end_tag_name(
        &mut self,
        c: Option<char>,
        loc: Location,
        fallback: State,
        report: &mut Report<'_>,
    ) -> Result<(), StreamError> {
        match c {
            Some(w) if is_ws(w) && self.is_appropriate_end_tag() => {
                self.state = State::BeforeAttributeName;
                return Ok(());
            }
            Some('/') if self.is_appropriate_end_tag() => {
                self.state = State::SelfClosingStartTag;
                return Ok(());
            }
            Some('>') if self.is_appropriate_end_tag() => {
                self.state = State::Data;
                self.emit_tag(report)?;
                return Ok(());
            }
            Some(a) if a.is_ascii_alphabetic() => {
                self.tag.name.push(a.to_ascii_lowercase());
                self.temp.push(a);
                return Ok(());
            }
            _ => {}
        }

        /*
         * > Emit a U+003C LESS-THAN SIGN character token, a U+002F SOLIDUS
         * > character token, and a character token for each of the characters
         * > in the temporary buffer. Reconsume in the [respective] state.
         */
        self.emit_char(self.token_start, '<');
        self.emit_char(self.token_start, '/');
        let buffered: Vec<char> = self.temp.chars().collect();
        for b in buffered {
            self.emit_char(self.token_start, b);
        }
        self.temp.clear();
        self.tag = TagInProgress::default();
        if let Some(other) = c {
            self.input.push_back(other);
        }
        self.state = fallback;
        Ok(())
    }

    /// Resolves `<!` by probing for `--`, `DOCTYPE`, or `[CDATA[`.
    fn markup_declaration_open(
        &mut self,
        c: Option<char>,
        loc: Location,
        report: &mut Report<'_>,
    ) -> Result<(), StreamError> {
        let first = match c {
            Some(first) => first,
            None => {
                report(loc, &Error::UnexpectedEof("markup declaration"))?;
                self.comment.clear();
                self.emit_comment();
                self.emit_eof(loc);
                return Ok(());
            }
        };

        let mut probe = String::new();
        probe.push(first);

        let target: &str = match first {
            '-' => "--",
            'd' | 'D' => "doctype",
            '[' => "[CDATA[",
            _ => "",
        };

        let mut matched = !target.is_empty();
        while matched && probe.len() < target.len() {
            match self.input.next(report)? {
                Some(next) => {
                    probe.push(next);
                    let probe_tail = probe.as_bytes()[probe.len() - 1];
                    let want = target.as_bytes()[probe.len() - 1];
                    let case_ok = if target == "doctype" {
                        probe_tail.eq_ignore_ascii_case(&want)
                    } else {
                        probe_tail == want
                    };
                    if !case_ok {
                        matched = false;
                    }
                }
                None => matched = false,
            }
        }

        if matched && target == "--" {
            self.comment.clear();
            self.state = State::CommentStart;
            return Ok(());
        }

        if matched && target == "doctype" {
            self.doctype = DoctypeToken::default();
            self.state = State::Doctype;
            return Ok(());
        }

        if matched && target == "[CDATA[" {
            if self.cdata_allowed {
                self.state = State::CdataSection;
            } else {
                /*
                 * > this is a cdata-in-html-content parse error. Create a
                 * > comment token whose data is the "[CDATA[" string.
                 */
                report(loc, &Error::UnexpectedCharacter('['))?;
                self.comment.clear();
                self.comment.push_str("[CDATA[");
                self.state = State::BogusComment;
            }
            return Ok(());
        }

        // > This is an incorrectly-opened-comment parse error.
        report(loc, &Error::UnexpectedCharacter(first))?;
        self.comment.clear();
        for unread in probe.chars().rev() {
            self.input.push_back(unread);
        }
        self.state = State::BogusComment;
        Ok(())
    }

    /// The after-DOCTYPE-name state needs to probe for the PUBLIC and
    /// SYSTEM keywords.
    fn after_doctype_name(
        &mut self,
        c: Option<char>,
        loc: Location,
        report: &mut Report<'_>,
    ) -> Result<(), StreamError> {
        match c {
            Some(w) if is_ws(w) => return Ok(()),
            Some('>') => {
                self.state = State::Data;
                self.emit_doctype();
                return Ok(());
            }
            None => {
                report(loc, &Error::UnexpectedEof("DOCTYPE"))?;
                self.doctype.force_quirks = true;
                self.emit_doctype();
                self.emit_eof(loc);
                return Ok(());
            }
            Some(first) => {
                let mut probe = String::new();
                probe.push(first);
                while probe.len() < 6 {
                    match self.input.next(report)? {
                        Some(next) => probe.push(next),
                        None => break,
                    }
                }
                if probe.eq_ignore_ascii_case("public") {
                    self.state = State::AfterDoctypePublicKeyword;
                    return Ok(());
                }
                if probe.eq_ignore_ascii_case("system") {
                    self.state = State::AfterDoctypeSystemKeyword;
                    return Ok(());
                }
                /*
                 * > This is an invalid-character-sequence-after-doctype-name
                 * > parse error. Set the current DOCTYPE token's force-quirks
                 * > flag to on. Reconsume in the bogus DOCTYPE state.
                 */
                report(
                    loc,
                    &Error::BadDoctype("expected PUBLIC or SYSTEM".into()),
                )?;
                self.doctype.force_quirks = true;
                for unread in probe.chars().rev() {
                    self.input.push_back(unread);
                }
                self.state = State::BogusDoctype;
                Ok(())
            }
        }
    }

    /// Shared body of the four quoted DOCTYPE identifier states.
    fn doctype_identifier(
        &mut self,
        c: Option<char>,
        loc: Location,
        quote: char,
        public: bool,
        report: &mut Report<'_>,
    ) -> Result<(), StreamError> {
        let field = if public {
            &mut self.doctype.public_identifier
        } else {
            &mut self.doctype.system_identifier
        };
        match c {
            Some(q) if q == quote => {
                self.state = if public {
                    State::AfterDoctypePublicIdentifier
                } else {
                    State::AfterDoctypeSystemIdentifier
                };
            }
            Some('\0') => {
                if let Some(id) = field {
                    id.push(REPLACEMENT_CHARACTER);
                }
                report(loc, &Error::UnexpectedCharacter('\0'))?;
            }
            Some('>') => {
                report(loc, &Error::BadDoctype("abruptly closed identifier".into()))?;
                self.doctype.force_quirks = true;
                self.state = State::Data;
                self.emit_doctype();
            }
            Some(other) => {
                if let Some(id) = field {
                    id.push(other);
                }
            }
            None => {
                report(loc, &Error::UnexpectedEof("DOCTYPE"))?;
                self.doctype.force_quirks = true;
                self.emit_doctype();
                self.emit_eof(loc);
            }
        }
        Ok(())
    }

    /// Longest-prefix lookup of a named character reference, with the
    /// legacy no-semicolon names and the attribute-value ambiguity rule.
    fn named_character_reference(
        &mut self,
        first: char,
        loc: Location,
        report: &mut Report<'_>,
    ) -> Result<(), StreamError> {
        let mut run = String::new();
        run.push(first);
        let cap = entities::longest_name_len() + 1;
        let mut ended_with_semicolon = false;

        while run.len() < cap {
            match self.input.next(report)? {
                Some(a) if a.is_ascii_alphanumeric() => run.push(a),
                Some(';') => {
                    run.push(';');
                    ended_with_semicolon = true;
                    break;
                }
                Some(other) => {
                    self.input.push_back(other);
                    break;
                }
                None => break,
            }
        }

        match entities::lookup_named(run.as_bytes()) {
            Some(matched) => {
                /*
                 * > If the character reference was consumed as part of an
                 * > attribute, and the last character matched is not a
                 * > U+003B SEMICOLON character (;), and the next input
                 * > character is either a U+003D EQUALS SIGN character (=)
                 * > or an ASCII alphanumeric, then, for historical reasons,
                 * > flush code points consumed as a character reference and
                 * > switch to the return state.
                 */
                if !matched.has_semicolon && self.in_attribute_value() {
                    let mut following = run[matched.len..].chars().next();
                    if following.is_none() {
                        // The run ended exactly at the match: peek ahead.
                        following = self.input.next(report)?;
                        if let Some(peeked) = following {
                            self.input.push_back(peeked);
                        }
                    }
                    if matches!(following, Some(f) if f == '=' || f.is_ascii_alphanumeric()) {
                        self.temp.push_str(&run);
                        self.flush_char_ref(loc);
                        self.state = self.return_state;
                        return Ok(());
                    }
                }

                if !matched.has_semicolon {
                    // > missing-semicolon-after-character-reference parse error
                    report(
                        self.token_start,
                        &Error::BadCharacterReference(run[..matched.len].into()),
                    )?;
                }

                // Give back everything past the matched name.
                for unread in run[matched.len..].chars().rev() {
                    self.input.push_back(unread);
                }

                self.temp.clear();
                self.temp.push_str(matched.replacement);
                self.flush_char_ref(loc);
                self.state = self.return_state;
            }
            None => {
                if ended_with_semicolon {
                    // > This is an unknown-named-character-reference parse error.
                    report(loc, &Error::BadCharacterReference(run.clone().into()))?;
                }
                self.temp.push_str(&run);
                self.flush_char_ref(loc);
                self.state = self.return_state;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::errors::silent_report;

    fn tokenizer(html: &str) -> Tokenizer<&[u8]> {
        let input = InputStream::new(html.as_bytes(), None, false).unwrap();
        Tokenizer::new(input)
    }

    fn tokens(html: &str) -> Vec<TokenData> {
        let mut t = tokenizer(html);
        let mut out = Vec::new();
        loop {
            let token = t.next_token(&mut silent_report).unwrap();
            let done = token.data == TokenData::Eof;
            out.push(token.data);
            if done {
                break;
            }
        }
        out
    }

    fn text_of(tokens: &[TokenData]) -> String {
        tokens
            .iter()
            .filter_map(|t| match t {
                TokenData::Char(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn simple_tag_and_text() {
        let toks = tokens("<p>Hi</p>");
        assert!(matches!(
            &toks[0],
            TokenData::StartTag { name, attributes, self_closing: false }
                if &**name == "p" && attributes.is_empty()
        ));
        assert_eq!(text_of(&toks), "Hi");
        assert!(matches!(&toks[3], TokenData::EndTag { name } if &**name == "p"));
    }

    #[test]
    fn tag_names_and_attribute_names_are_lowercased() {
        let toks = tokens("<DIV Class=Foo>");
        match &toks[0] {
            TokenData::StartTag { name, attributes, .. } => {
                assert_eq!(&**name, "div");
                assert_eq!(&*attributes[0].name.local, "class");
                assert_eq!(&*attributes[0].value, "Foo");
            }
            other => panic!("expected start tag, got {other:?}"),
        }
    }

    #[test]
    fn attribute_value_forms() {
        let toks = tokens(r#"<a one="1" two='2' three=3 four>"#);
        match &toks[0] {
            TokenData::StartTag { attributes, .. } => {
                let values: Vec<(&str, &str)> = attributes
                    .iter()
                    .map(|a| (&*a.name.local, &*a.value))
                    .collect();
                assert_eq!(
                    values,
                    vec![("one", "1"), ("two", "2"), ("three", "3"), ("four", "")]
                );
            }
            other => panic!("expected start tag, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_attributes_are_dropped_with_a_report() {
        let mut reports = Vec::new();
        let mut report = |loc: Location, e: &Error| {
            reports.push((loc, e.clone()));
            Ok(())
        };
        let mut t = tokenizer(r#"<a href="first" href="second">"#);
        let token = t.next_token(&mut report).unwrap();
        match token.data {
            TokenData::StartTag { attributes, .. } => {
                assert_eq!(attributes.len(), 1);
                assert_eq!(&*attributes[0].value, "first");
            }
            other => panic!("expected start tag, got {other:?}"),
        }
        assert!(matches!(&reports[0].1, Error::DuplicateAttribute(n) if &**n == "href"));
    }

    #[test]
    fn named_character_references() {
        assert_eq!(text_of(&tokens("a&amp;b")), "a&b");
        assert_eq!(text_of(&tokens("a&amp b")), "a& b");
        assert_eq!(text_of(&tokens("a&notin;b")), "a\u{2209}b");
        assert_eq!(text_of(&tokens("a&notanentity;b")), "a\u{AC}anentity;b");
        assert_eq!(text_of(&tokens("a&zzz;b")), "a&zzz;b");
    }

    #[test]
    fn numeric_character_references() {
        assert_eq!(text_of(&tokens("&#65;&#x42;&#X43;")), "ABC");
        assert_eq!(text_of(&tokens("&#x80;")), "\u{20AC}");
        assert_eq!(text_of(&tokens("&#xD800;")), "\u{FFFD}");
        assert_eq!(text_of(&tokens("&#;")), "&#;");
    }

    #[test]
    fn ambiguous_ampersand_in_attribute_value() {
        // "&not" followed by an alphanumeric keeps its literal spelling
        // inside attribute values.
        let toks = tokens(r#"<a href="?x=1&notid=2">"#);
        match &toks[0] {
            TokenData::StartTag { attributes, .. } => {
                assert_eq!(&*attributes[0].value, "?x=1&notid=2");
            }
            other => panic!("expected start tag, got {other:?}"),
        }
        // In plain text the same input decodes the legacy name.
        assert_eq!(text_of(&tokens("?x=1&notid=2")), "?x=1\u{AC}id=2");
    }

    #[test]
    fn rcdata_keeps_markup_as_text() {
        let mut t = tokenizer("<title>a<b</title>");
        let open = t.next_token(&mut silent_report).unwrap();
        assert!(matches!(open.data, TokenData::StartTag { .. }));
        t.set_state(State::Rcdata);
        let mut text = String::new();
        loop {
            let token = t.next_token(&mut silent_report).unwrap();
            match token.data {
                TokenData::Char(c) => text.push(c),
                TokenData::EndTag { name } => {
                    assert_eq!(&*name, "title");
                    break;
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(text, "a<b");
    }

    #[test]
    fn script_data_handles_less_than() {
        let mut t = tokenizer("<script>if (a<b) c</script>");
        let open = t.next_token(&mut silent_report).unwrap();
        assert!(matches!(open.data, TokenData::StartTag { .. }));
        t.set_state(State::ScriptData);
        let mut text = String::new();
        loop {
            let token = t.next_token(&mut silent_report).unwrap();
            match token.data {
                TokenData::Char(c) => text.push(c),
                TokenData::EndTag { name } => {
                    assert_eq!(&*name, "script");
                    break;
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(text, "if (a<b) c");
    }

    #[test]
    fn comments_including_unterminated() {
        let toks = tokens("<!-- ok -->");
        assert!(matches!(&toks[0], TokenData::Comment(text) if &**text == " ok "));

        let mut reports = Vec::new();
        let mut report = |loc: Location, e: &Error| {
            reports.push((loc, e.clone()));
            Ok(())
        };
        let mut t = tokenizer("<!-- runs off the end");
        let token = t.next_token(&mut report).unwrap();
        assert!(matches!(&token.data, TokenData::Comment(text) if &**text == " runs off the end"));
        assert!(reports
            .iter()
            .any(|(_, e)| matches!(e, Error::UnexpectedEof("comment"))));
    }

    #[test]
    fn bogus_comment_from_question_mark() {
        let toks = tokens("<?php echo ?>");
        assert!(matches!(&toks[0], TokenData::Comment(text) if &**text == "?php echo ?"));
    }

    #[test]
    fn doctype_with_identifiers() {
        let toks =
            tokens(r#"<!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://x/strict.dtd">"#);
        match &toks[0] {
            TokenData::Doctype(d) => {
                assert_eq!(d.name.as_deref(), Some("html"));
                assert_eq!(d.public_identifier.as_deref(), Some("-//W3C//DTD HTML 4.01//EN"));
                assert_eq!(d.system_identifier.as_deref(), Some("http://x/strict.dtd"));
                assert!(!d.force_quirks);
            }
            other => panic!("expected doctype, got {other:?}"),
        }
    }

    #[test]
    fn cdata_outside_foreign_content_is_a_bogus_comment() {
        let toks = tokens("<![CDATA[<foo>]]>");
        assert!(matches!(&toks[0], TokenData::Comment(text) if &**text == "[CDATA[<foo>]]"));
    }

    #[test]
    fn cdata_inside_foreign_content_yields_text() {
        let mut t = tokenizer("<![CDATA[<foo>]]>x");
        t.set_cdata_allowed(true);
        let mut text = String::new();
        loop {
            let token = t.next_token(&mut silent_report).unwrap();
            match token.data {
                TokenData::Char(c) => text.push(c),
                TokenData::Eof => break,
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(text, "<foo>x");
    }

    #[test]
    fn token_locations_are_tracked() {
        let mut t = tokenizer("ab\n<p>");
        let a = t.next_token(&mut silent_report).unwrap();
        assert_eq!(a.location, Location::new(1, 1));
        let b = t.next_token(&mut silent_report).unwrap();
        assert_eq!(b.location, Location::new(1, 2));
        let nl = t.next_token(&mut silent_report).unwrap();
        assert_eq!(nl.location, Location::new(1, 3));
        let p = t.next_token(&mut silent_report).unwrap();
        assert_eq!(p.location, Location::new(2, 1));
        assert!(matches!(p.data, TokenData::StartTag { .. }));
    }

    #[test]
    fn self_closing_flag() {
        let toks = tokens("<br/>");
        assert!(matches!(
            &toks[0],
            TokenData::StartTag { self_closing: true, .. }
        ));
    }
}
