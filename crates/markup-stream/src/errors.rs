use crate::signal::Location;
use std::fmt;
use std::io;

/// A named ill-formedness condition, reported through the `report` callback
/// with the location where it was detected.
///
/// Parse errors are never fatal on their own: the parser recovers and keeps
/// producing signals. The set is closed; every condition the tokenizers and
/// tree builders can detect maps onto one of these variants.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Invalid octets for the declared encoding; decoded as U+FFFD.
    BadByteSequence(Box<[u8]>),

    /// A scalar value the current state does not allow.
    UnexpectedCharacter(char),

    /// End of input inside the named construct.
    UnexpectedEof(&'static str),

    /// A start tag left open when its enclosing structure was closed.
    UnmatchedStartTag(Box<str>),

    /// An end tag with no matching open element.
    UnmatchedEndTag(Box<str>),

    /// A formatting element closed out of order; triggers the adoption
    /// agency machinery.
    MisnestedTag {
        found: Box<str>,
        while_open: Box<str>,
    },

    /// A structurally malformed DOCTYPE declaration.
    BadDoctype(Box<str>),

    /// A second attribute with the same name; the duplicate is discarded.
    DuplicateAttribute(Box<str>),

    /// An invalid or out-of-range character reference.
    BadCharacterReference(Box<str>),

    /// An undeclared namespace prefix (XML only).
    BadNamespace(Box<str>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BadByteSequence(bytes) => {
                write!(f, "bad byte sequence for the document encoding: {bytes:02x?}")
            }
            Error::UnexpectedCharacter(c) => write!(f, "unexpected character {c:?}"),
            Error::UnexpectedEof(context) => write!(f, "unexpected end of input in {context}"),
            Error::UnmatchedStartTag(name) => write!(f, "start tag <{name}> was never closed"),
            Error::UnmatchedEndTag(name) => write!(f, "end tag </{name}> matches no open element"),
            Error::MisnestedTag { found, while_open } => {
                write!(f, "misnested tag </{found}> while <{while_open}> is open")
            }
            Error::BadDoctype(detail) => write!(f, "malformed DOCTYPE: {detail}"),
            Error::DuplicateAttribute(name) => write!(f, "duplicate attribute {name:?}"),
            Error::BadCharacterReference(reference) => {
                write!(f, "bad character reference {reference:?}")
            }
            Error::BadNamespace(prefix) => write!(f, "undeclared namespace prefix {prefix:?}"),
        }
    }
}

impl std::error::Error for Error {}

/// The sentinel an error reporter returns to terminate parsing early.
///
/// It propagates out of the stream as [`StreamError::Stopped`], releasing
/// the input and all parser state on the way; nothing catches it
/// internally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stopped;

/// A condition that ends the signal stream itself, as opposed to a parse
/// error, which is reported and recovered from.
#[derive(Debug)]
pub enum StreamError {
    /// The byte source failed.
    Io(io::Error),

    /// The error reporter requested termination.
    Stopped,
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Io(e) => write!(f, "input stream failure: {e}"),
            StreamError::Stopped => f.write_str("parsing stopped by the error reporter"),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::Io(e) => Some(e),
            StreamError::Stopped => None,
        }
    }
}

impl From<io::Error> for StreamError {
    fn from(e: io::Error) -> Self {
        StreamError::Io(e)
    }
}

impl From<Stopped> for StreamError {
    fn from(_: Stopped) -> Self {
        StreamError::Stopped
    }
}

/// The reporter callback type: invoked once per parse error, in document
/// order, at the position where the error was detected.
pub type Report<'a> = dyn FnMut(Location, &Error) -> Result<(), Stopped> + 'a;

/// A reporter that ignores everything, the default.
pub(crate) fn silent_report(_: Location, _: &Error) -> Result<(), Stopped> {
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_is_stable() {
        assert_eq!(
            Error::UnmatchedEndTag("div".into()).to_string(),
            "end tag </div> matches no open element"
        );
        assert_eq!(
            Error::UnexpectedEof("comment").to_string(),
            "unexpected end of input in comment"
        );
    }

    #[test]
    fn stopped_converts_to_stream_error() {
        let err: StreamError = Stopped.into();
        assert!(matches!(err, StreamError::Stopped));
    }
}
