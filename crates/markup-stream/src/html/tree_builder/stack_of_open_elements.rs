use crate::signal::{Attribute, Location, Name};

/// Which kind of integration point an open element is, if any.
///
/// @see https://html.spec.whatwg.org/#mathml-text-integration-point
/// @see https://html.spec.whatwg.org/#html-integration-point
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum IntegrationNodeType {
    Html,
    MathML,
}

/// An entry on the stack of open elements.
///
/// Entries carry a small identifier so the active formatting elements list
/// can refer to them without holding pointers into the stack, which the
/// adoption agency algorithm rearranges.
#[derive(Clone, Debug)]
pub(crate) struct OpenElement {
    pub id: u64,
    pub name: Name,
    pub attributes: Vec<Attribute>,

    /// Where the element's start tag appeared, for unmatched-start-tag
    /// reports when recovery closes it early.
    pub location: Location,

    /// Fragment-parsing scaffolding (the synthetic root and context
    /// elements) is on the stack for scope queries but never reaches the
    /// signal stream.
    pub emits: bool,

    pub integration: Option<IntegrationNodeType>,
}

impl OpenElement {
    pub fn is_html(&self, local: &str) -> bool {
        self.name.is_html() && &*self.name.local == local
    }
}

/// The stack of open elements. The bottom is the root element; the top is
/// the current node, which is always the insertion point for new content.
///
/// @see https://html.spec.whatwg.org/#stack-of-open-elements
pub(crate) struct StackOfOpenElements {
    pub stack: Vec<OpenElement>,
}

/// Elements that terminate the default scope.
///
/// > The stack of open elements is said to have an element target node in a
/// > specific scope consisting of a list of element types list when the
/// > following algorithm terminates in a match state…
fn is_default_scope_terminator(element: &OpenElement) -> bool {
    if element.name.is_html() {
        return matches!(
            &*element.name.local,
            "applet" | "caption" | "html" | "table" | "td" | "th" | "marquee" | "object"
                | "template"
        );
    }
    if element.name.is_mathml() {
        return matches!(
            &*element.name.local,
            "mi" | "mo" | "mn" | "ms" | "mtext" | "annotation-xml"
        );
    }
    if element.name.is_svg() {
        return matches!(&*element.name.local, "foreignObject" | "desc" | "title");
    }
    false
}

impl StackOfOpenElements {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn push(&mut self, element: OpenElement) {
        self.stack.push(element);
    }

    pub fn pop(&mut self) -> Option<OpenElement> {
        self.stack.pop()
    }

    pub fn current_node(&self) -> Option<&OpenElement> {
        self.stack.last()
    }

    pub fn count(&self) -> usize {
        self.stack.len()
    }

    pub fn get(&self, index: usize) -> Option<&OpenElement> {
        self.stack.get(index)
    }

    /// Whether an HTML element with this local name is anywhere on the stack.
    pub fn contains(&self, local: &str) -> bool {
        self.stack.iter().any(|e| e.is_html(local))
    }

    pub fn index_of_id(&self, id: u64) -> Option<usize> {
        self.stack.iter().position(|e| e.id == id)
    }

    pub fn remove_at(&mut self, index: usize) -> OpenElement {
        self.stack.remove(index)
    }

    pub fn insert_at(&mut self, index: usize, element: OpenElement) {
        self.stack.insert(index, element);
    }

    /// @see https://html.spec.whatwg.org/#has-an-element-in-scope
    pub fn has_element_in_scope(&self, local: &str) -> bool {
        self.scope_walk(local, is_default_scope_terminator)
    }

    /// @see https://html.spec.whatwg.org/#has-an-element-in-list-item-scope
    pub fn has_element_in_list_item_scope(&self, local: &str) -> bool {
        self.scope_walk(local, |e| {
            is_default_scope_terminator(e) || e.is_html("ol") || e.is_html("ul")
        })
    }

    /// @see https://html.spec.whatwg.org/#has-an-element-in-button-scope
    pub fn has_element_in_button_scope(&self, local: &str) -> bool {
        self.scope_walk(local, |e| {
            is_default_scope_terminator(e) || e.is_html("button")
        })
    }

    pub fn has_p_in_button_scope(&self) -> bool {
        self.has_element_in_button_scope("p")
    }

    /// @see https://html.spec.whatwg.org/#has-an-element-in-table-scope
    pub fn has_element_in_table_scope(&self, local: &str) -> bool {
        self.scope_walk(local, |e| {
            e.name.is_html() && matches!(&*e.name.local, "html" | "table" | "template")
        })
    }

    /// > consisting of all element types except the following:
    /// > optgroup, option
    ///
    /// @see https://html.spec.whatwg.org/#has-an-element-in-select-scope
    pub fn has_element_in_select_scope(&self, local: &str) -> bool {
        self.scope_walk(local, |e| {
            !(e.name.is_html() && matches!(&*e.name.local, "optgroup" | "option"))
        })
    }

    fn scope_walk(&self, local: &str, terminates: impl Fn(&OpenElement) -> bool) -> bool {
        for element in self.stack.iter().rev() {
            if element.is_html(local) {
                return true;
            }
            if terminates(element) {
                return false;
            }
        }
        false
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::signal::Name;

    fn element(local: &str) -> OpenElement {
        OpenElement {
            id: 0,
            name: Name::html(local),
            attributes: Vec::new(),
            location: Location::new(1, 1),
            emits: true,
            integration: None,
        }
    }

    fn stack_of(names: &[&str]) -> StackOfOpenElements {
        let mut stack = StackOfOpenElements::new();
        for (i, name) in names.iter().enumerate() {
            let mut e = element(name);
            e.id = i as u64;
            stack.push(e);
        }
        stack
    }

    #[test]
    fn scope_stops_at_table_boundaries() {
        let stack = stack_of(&["html", "body", "p", "table", "tr", "td", "b"]);
        assert!(stack.has_element_in_scope("b"));
        assert!(stack.has_element_in_scope("td"));
        // The td boundary hides the p.
        assert!(!stack.has_element_in_scope("p"));
        assert!(stack.has_element_in_table_scope("table"));
        assert!(!stack.has_element_in_table_scope("p"));
    }

    #[test]
    fn button_scope_extends_default_scope() {
        let stack = stack_of(&["html", "body", "p", "button"]);
        assert!(stack.has_element_in_scope("p"));
        assert!(!stack.has_p_in_button_scope());
    }

    #[test]
    fn list_item_scope_stops_at_lists() {
        let stack = stack_of(&["html", "body", "li", "ul"]);
        assert!(stack.has_element_in_scope("li"));
        assert!(!stack.has_element_in_list_item_scope("li"));
    }

    #[test]
    fn select_scope_is_inverted() {
        let stack = stack_of(&["html", "body", "select", "optgroup", "option"]);
        assert!(stack.has_element_in_select_scope("select"));
        let with_div = stack_of(&["html", "body", "select", "div"]);
        assert!(!with_div.has_element_in_select_scope("select"));
    }
}
