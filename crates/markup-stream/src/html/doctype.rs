//! DOCTYPE interpretation: which document compatibility mode a declaration
//! indicates.
//!
//! A DOCTYPE declaration may indicate its document compatibility mode,
//! which impacts the structure of the following HTML. There are three
//! possible modes:
//!
//!  - "no-quirks" and "limited-quirks" modes (also called "standards mode").
//!  - "quirks" mode.
//!
//! The visible impact on parsing is small but real: in quirks mode a
//! `<table>` start tag opens the table as a child of an open `p` element
//! instead of implicitly closing it.
//!
//! @see https://html.spec.whatwg.org/#the-initial-insertion-mode

use crate::html::tokenizer::DoctypeToken;
use crate::signal::Doctype;

/// Document compatibility mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CompatMode {
    /// > In no-quirks mode, the behavior is (hopefully) the desired behavior
    /// > described by the modern HTML and CSS specifications.
    ///
    /// @see https://developer.mozilla.org/en-US/docs/Web/HTML/Quirks_Mode_and_Standards_Mode
    #[default]
    NoQuirks,

    /// > In quirks mode, layout emulates behavior in Navigator 4 and Internet
    /// > Explorer 5. This is essential in order to support websites that were
    /// > built before the widespread adoption of web standards.
    ///
    /// @see https://developer.mozilla.org/en-US/docs/Web/HTML/Quirks_Mode_and_Standards_Mode
    Quirks,

    LimitedQuirks,
}

impl From<&CompatMode> for &'static str {
    fn from(val: &CompatMode) -> Self {
        match val {
            CompatMode::NoQuirks => "no-quirks",
            CompatMode::Quirks => "quirks",
            CompatMode::LimitedQuirks => "limited-quirks",
        }
    }
}

/// Public identifier prefixes that indicate quirks mode.
///
/// > The public identifier starts with…
static QUIRKY_PUBLIC_PREFIXES: &[&str] = &[
    "+//silmaril//dtd html pro v0r11 19970101//",
    "-//as//dtd html 3.0 aswedit + extensions//",
    "-//advasoft ltd//dtd html 3.0 aswedit + extensions//",
    "-//ietf//dtd html 2.0 level 1//",
    "-//ietf//dtd html 2.0 level 2//",
    "-//ietf//dtd html 2.0 strict level 1//",
    "-//ietf//dtd html 2.0 strict level 2//",
    "-//ietf//dtd html 2.0 strict//",
    "-//ietf//dtd html 2.0//",
    "-//ietf//dtd html 2.1e//",
    "-//ietf//dtd html 3.0//",
    "-//ietf//dtd html 3.2 final//",
    "-//ietf//dtd html 3.2//",
    "-//ietf//dtd html 3//",
    "-//ietf//dtd html level 0//",
    "-//ietf//dtd html level 1//",
    "-//ietf//dtd html level 2//",
    "-//ietf//dtd html level 3//",
    "-//ietf//dtd html strict level 0//",
    "-//ietf//dtd html strict level 1//",
    "-//ietf//dtd html strict level 2//",
    "-//ietf//dtd html strict level 3//",
    "-//ietf//dtd html strict//",
    "-//ietf//dtd html//",
    "-//metrius//dtd metrius presentational//",
    "-//microsoft//dtd internet explorer 2.0 html strict//",
    "-//microsoft//dtd internet explorer 2.0 html//",
    "-//microsoft//dtd internet explorer 2.0 tables//",
    "-//microsoft//dtd internet explorer 3.0 html strict//",
    "-//microsoft//dtd internet explorer 3.0 html//",
    "-//microsoft//dtd internet explorer 3.0 tables//",
    "-//netscape comm. corp.//dtd html//",
    "-//netscape comm. corp.//dtd strict html//",
    "-//o'reilly and associates//dtd html 2.0//",
    "-//o'reilly and associates//dtd html extended 1.0//",
    "-//o'reilly and associates//dtd html extended relaxed 1.0//",
    "-//sq//dtd html 2.0 hotmetal + extensions//",
    "-//softquad software//dtd hotmetal pro 6.0::19990601::extensions to html 4.0//",
    "-//softquad//dtd hotmetal pro 4.0::19971010::extensions to html 4.0//",
    "-//spyglass//dtd html 2.0 extended//",
    "-//sun microsystems corp.//dtd hotjava html//",
    "-//sun microsystems corp.//dtd hotjava strict html//",
    "-//w3c//dtd html 3 1995-03-24//",
    "-//w3c//dtd html 3.2 draft//",
    "-//w3c//dtd html 3.2 final//",
    "-//w3c//dtd html 3.2//",
    "-//w3c//dtd html 3.2s draft//",
    "-//w3c//dtd html 4.0 frameset//",
    "-//w3c//dtd html 4.0 transitional//",
    "-//w3c//dtd html experimental 19960712//",
    "-//w3c//dtd html experimental 970421//",
    "-//w3c//dtd w3 html//",
    "-//w3o//dtd w3 html 3.0//",
    "-//webtechs//dtd mozilla html 2.0//",
    "-//webtechs//dtd mozilla html//",
];

/// Interprets a DOCTYPE token per the rules of the "initial" insertion
/// mode, producing the public signal payload with its indicated
/// compatibility mode.
pub(crate) fn interpret(token: &DoctypeToken) -> Doctype {
    let compatibility_mode = indicated_compat_mode(token);
    Doctype {
        name: token.name.as_deref().map(Into::into),
        public_identifier: token.public_identifier.as_deref().map(Into::into),
        system_identifier: token.system_identifier.as_deref().map(Into::into),
        force_quirks: token.force_quirks,
        compatibility_mode,
    }
}

fn indicated_compat_mode(token: &DoctypeToken) -> CompatMode {
    /*
     * > If the DOCTYPE token matches one of the conditions in the following
     * > list, then set the Document to quirks mode:
     * >   The force-quirks flag is set to on.
     * >   The name is not "html".
     */
    if token.force_quirks {
        return CompatMode::Quirks;
    }

    if token.name.as_deref() != Some("html") {
        return CompatMode::Quirks;
    }

    // Normative documents are the bare `<!DOCTYPE html>`; short-circuit.
    if token.public_identifier.is_none() && token.system_identifier.is_none() {
        return CompatMode::NoQuirks;
    }

    /*
     * > The system identifier and public identifier strings must be
     * > compared… in an ASCII case-insensitive manner. A system identifier
     * > whose value is the empty string is not considered missing.
     */
    let system_missing = token.system_identifier.is_none();
    let public = token
        .public_identifier
        .as_deref()
        .unwrap_or("")
        .to_ascii_lowercase();
    let system = token
        .system_identifier
        .as_deref()
        .unwrap_or("")
        .to_ascii_lowercase();

    /*
     * > The public identifier is set to…
     */
    if public == "-//w3o//dtd w3 html strict 3.0//en//"
        || public == "-/w3c/dtd html 4.0 transitional/en"
        || public == "html"
    {
        return CompatMode::Quirks;
    }

    /*
     * > The system identifier is set to…
     */
    if system == "http://www.ibm.com/data/dtd/v11/ibmxhtml1-transitional.dtd" {
        return CompatMode::Quirks;
    }

    if QUIRKY_PUBLIC_PREFIXES
        .iter()
        .any(|prefix| public.starts_with(prefix))
    {
        return CompatMode::Quirks;
    }

    /*
     * > The system identifier is missing and the public identifier starts with…
     */
    if system_missing
        && (public.starts_with("-//w3c//dtd html 4.01 frameset//")
            || public.starts_with("-//w3c//dtd html 4.01 transitional//"))
    {
        return CompatMode::Quirks;
    }

    /*
     * > Otherwise, if the DOCTYPE token matches one of the conditions in
     * > the following list, then set the Document to limited-quirks mode.
     */
    if public.starts_with("-//w3c//dtd xhtml 1.0 frameset//")
        || public.starts_with("-//w3c//dtd xhtml 1.0 transitional//")
    {
        return CompatMode::LimitedQuirks;
    }

    if !system_missing
        && (public.starts_with("-//w3c//dtd html 4.01 frameset//")
            || public.starts_with("-//w3c//dtd html 4.01 transitional//"))
    {
        return CompatMode::LimitedQuirks;
    }

    CompatMode::NoQuirks
}

#[cfg(test)]
mod test {
    use super::*;

    fn token(
        name: Option<&str>,
        public: Option<&str>,
        system: Option<&str>,
        force_quirks: bool,
    ) -> DoctypeToken {
        DoctypeToken {
            name: name.map(Into::into),
            public_identifier: public.map(Into::into),
            system_identifier: system.map(Into::into),
            force_quirks,
        }
    }

    macro_rules! test_compat_mode {
        ($($case:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $case() {
                let (name, public, system, force_quirks, expected): (
                    Option<&str>, Option<&str>, Option<&str>, bool, CompatMode,
                ) = $value;
                let token = token(name, public, system, force_quirks);
                assert_eq!(
                    indicated_compat_mode(&token),
                    expected,
                    "wrong mode for {token:?}",
                );
            }
        )*
        }
    }

    test_compat_mode! {
        html5_doctype:            ( Some("html"), None, None, false, CompatMode::NoQuirks ),
        force_quirks_flag:        ( Some("html"), None, None, true,  CompatMode::Quirks ),
        missing_name:             ( None,         None, None, false, CompatMode::Quirks ),
        non_html_name:            ( Some("svg"),  None, None, false, CompatMode::Quirks ),
        html4_strict:             ( Some("html"), Some("-//W3C//DTD HTML 4.01//EN"), Some("http://www.w3.org/TR/html4/strict.dtd"), false, CompatMode::NoQuirks ),
        html32_is_quirky:         ( Some("html"), Some("-//W3C//DTD HTML 3.2 Final//EN"), None, false, CompatMode::Quirks ),
        ibm_system_id_is_quirky:  ( Some("html"), None, Some("http://www.ibm.com/data/dtd/v11/ibmxhtml1-transitional.dtd"), false, CompatMode::Quirks ),
        frameset_without_system:  ( Some("html"), Some("-//W3C//DTD HTML 4.01 Frameset//"), None, false, CompatMode::Quirks ),
        frameset_with_system:     ( Some("html"), Some("-//W3C//DTD HTML 4.01 Frameset//"), Some(""), false, CompatMode::LimitedQuirks ),
        xhtml_transitional:       ( Some("html"), Some("-//W3C//DTD XHTML 1.0 Transitional//EN"), Some("x"), false, CompatMode::LimitedQuirks ),
        bare_html_public_id:      ( Some("html"), Some("HTML"), None, false, CompatMode::Quirks ),
    }
}
