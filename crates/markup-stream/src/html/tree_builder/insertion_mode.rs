/// Insertion mode.
///
/// The tree construction stage is a state machine over these 23 modes; the
/// current mode decides how each token is handled, and most recovery
/// actions are mode transitions.
///
/// @see https://html.spec.whatwg.org/#the-insertion-mode
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum InsertionMode {
    /// @see https://html.spec.whatwg.org/#the-initial-insertion-mode
    Initial,

    /// @see https://html.spec.whatwg.org/#the-before-html-insertion-mode
    BeforeHtml,

    /// @see https://html.spec.whatwg.org/#parsing-main-beforehead
    BeforeHead,

    /// @see https://html.spec.whatwg.org/#parsing-main-inhead
    InHead,

    /// @see https://html.spec.whatwg.org/#parsing-main-inheadnoscript
    InHeadNoscript,

    /// @see https://html.spec.whatwg.org/#parsing-main-afterhead
    AfterHead,

    /// @see https://html.spec.whatwg.org/#parsing-main-inbody
    InBody,

    /// The mode for RCDATA and RAWTEXT element content; the original
    /// insertion mode is restored when the element closes.
    ///
    /// @see https://html.spec.whatwg.org/#parsing-main-incdata
    Text,

    /// @see https://html.spec.whatwg.org/#parsing-main-intable
    InTable,

    /// @see https://html.spec.whatwg.org/#parsing-main-intabletext
    InTableText,

    /// @see https://html.spec.whatwg.org/#parsing-main-incaption
    InCaption,

    /// @see https://html.spec.whatwg.org/#parsing-main-incolgroup
    InColumnGroup,

    /// @see https://html.spec.whatwg.org/#parsing-main-intbody
    InTableBody,

    /// @see https://html.spec.whatwg.org/#parsing-main-intr
    InRow,

    /// @see https://html.spec.whatwg.org/#parsing-main-intd
    InCell,

    /// @see https://html.spec.whatwg.org/#parsing-main-inselect
    InSelect,

    /// @see https://html.spec.whatwg.org/#parsing-main-inselectintable
    InSelectInTable,

    /// @see https://html.spec.whatwg.org/#parsing-main-intemplate
    InTemplate,

    /// @see https://html.spec.whatwg.org/#parsing-main-afterbody
    AfterBody,

    /// @see https://html.spec.whatwg.org/#parsing-main-inframeset
    InFrameset,

    /// @see https://html.spec.whatwg.org/#parsing-main-afterframeset
    AfterFrameset,

    /// @see https://html.spec.whatwg.org/#the-after-after-body-insertion-mode
    AfterAfterBody,

    /// @see https://html.spec.whatwg.org/#the-after-after-frameset-insertion-mode
    AfterAfterFrameset,
}
