use crate::html::doctype::CompatMode;
use rustc_hash::FxHashSet;
use std::fmt;
use std::rc::Rc;

/// The XHTML namespace, assigned to every element the HTML parser emits.
pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// The SVG namespace.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// The MathML namespace.
pub const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";

/// The XLink namespace, for `xlink:*` attributes in foreign content.
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

/// The `xml:*` attribute namespace.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// The `xmlns` declaration namespace.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// A source position: 1-based line and column of a scalar value.
///
/// Columns reset on a line feed; a tab advances the column to the next
/// multiple of eight. Positions exist for error reporting and are attached
/// to every signal until a consumer strips them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// The position of the scalar following `c` at this position.
    pub(crate) fn after(self, c: char) -> Self {
        match c {
            '\n' => Self {
                line: self.line + 1,
                column: 1,
            },
            '\t' => Self {
                line: self.line,
                column: ((self.column - 1) / 8 + 1) * 8 + 1,
            },
            _ => Self {
                line: self.line,
                column: self.column + 1,
            },
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An expanded name: an optional namespace URI and a local name.
///
/// Local names and namespace URIs are interned `Rc<str>` values, so clones
/// are pointer copies and names produced by one parser instance share
/// storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Name {
    pub ns: Option<Rc<str>>,
    pub local: Rc<str>,
}

impl Name {
    pub fn new(ns: Option<Rc<str>>, local: Rc<str>) -> Self {
        Self { ns, local }
    }

    /// A name with no namespace, for callers assembling signals by hand.
    pub fn local(local: &str) -> Self {
        Self {
            ns: None,
            local: local.into(),
        }
    }

    /// A name in the XHTML namespace.
    pub fn html(local: &str) -> Self {
        Self {
            ns: Some(HTML_NAMESPACE.into()),
            local: local.into(),
        }
    }

    pub(crate) fn is_html(&self) -> bool {
        self.ns.as_deref() == Some(HTML_NAMESPACE)
    }

    pub(crate) fn is_svg(&self) -> bool {
        self.ns.as_deref() == Some(SVG_NAMESPACE)
    }

    pub(crate) fn is_mathml(&self) -> bool {
        self.ns.as_deref() == Some(MATHML_NAMESPACE)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.local)
    }
}

/// A parsed attribute: expanded name plus decoded value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: Name,
    pub value: Box<str>,
}

impl Attribute {
    pub fn new(name: Name, value: &str) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// A parsed DOCTYPE declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Doctype {
    pub name: Option<Box<str>>,
    pub public_identifier: Option<Box<str>>,
    pub system_identifier: Option<Box<str>>,

    /// Whether the declaration was malformed enough to force quirks mode.
    pub force_quirks: bool,

    /// The document compatibility mode this declaration indicates, from the
    /// public/system identifier tables.
    pub compatibility_mode: CompatMode,
}

/// A parsed XML declaration, `<?xml version="1.0" …?>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlDecl {
    pub version: Box<str>,
    pub encoding: Option<Box<str>>,
    pub standalone: Option<bool>,
}

/// A structural event in the parsed document.
///
/// Signals are the unit of the public stream. Element structure is strictly
/// bracketed: every `StartElement` is matched by exactly one `EndElement`
/// before the stream ends, even for ill-formed input, so `EndElement`
/// carries no name.
#[derive(Clone, Debug, PartialEq)]
pub enum Signal {
    StartElement {
        name: Name,
        attributes: Vec<Attribute>,
    },
    EndElement,

    /// A run of character data, as a list of chunks. Chunk boundaries are an
    /// artifact of buffering and carry no meaning; a run is never split
    /// across a non-text signal.
    Text(Vec<Box<str>>),

    Comment(Box<str>),
    Doctype(Doctype),
    Xml(XmlDecl),
    Pi {
        target: Box<str>,
        body: Box<str>,
    },
}

impl Signal {
    /// Concatenates the chunks of a `Text` signal for consumers that want
    /// one string and don't mind the copy.
    pub fn text(&self) -> Option<String> {
        match self {
            Signal::Text(chunks) => {
                let mut joined = String::new();
                for chunk in chunks {
                    joined.push_str(chunk);
                }
                Some(joined)
            }
            _ => None,
        }
    }
}

/// Per-parser intern pool for names and namespace URIs.
#[derive(Default)]
pub(crate) struct Interner {
    pool: FxHashSet<Rc<str>>,
}

impl Interner {
    pub fn intern(&mut self, s: &str) -> Rc<str> {
        if let Some(interned) = self.pool.get(s) {
            return Rc::clone(interned);
        }
        let interned: Rc<str> = Rc::from(s);
        self.pool.insert(Rc::clone(&interned));
        interned
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn location_advance() {
        let loc = Location::new(1, 1);
        assert_eq!(loc.after('a'), Location::new(1, 2));
        assert_eq!(loc.after('\n'), Location::new(2, 1));
        // Tabs snap to the next multiple-of-eight stop.
        assert_eq!(loc.after('\t'), Location::new(1, 9));
        assert_eq!(Location::new(1, 9).after('\t'), Location::new(1, 17));
        assert_eq!(Location::new(1, 4).after('\t'), Location::new(1, 9));
    }

    #[test]
    fn interner_shares_storage() {
        let mut interner = Interner::default();
        let a = interner.intern("div");
        let b = interner.intern("div");
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn text_signal_joins_chunks() {
        let signal = Signal::Text(vec!["Hello, ".into(), "world".into()]);
        assert_eq!(signal.text(), Some("Hello, world".to_string()));
        assert_eq!(Signal::EndElement.text(), None);
    }
}
