use crate::signal::{Attribute, Location, Name};

/// An entry in the list of active formatting elements: a formatting element
/// snapshot, or a marker.
///
/// Elements are identified by the id of their stack entry; the snapshot of
/// name and original attributes is what reconstruction clones from.
#[derive(Clone, Debug)]
pub(crate) enum FormattingEntry {
    Marker,
    Element {
        element_id: u64,
        name: Name,
        attributes: Vec<Attribute>,
        location: Location,
    },
}

/// The list of active formatting elements.
///
/// > It is used to handle mis-nested formatting element tags.
/// >
/// > The list contains elements in the formatting category, and markers.
/// > The markers are inserted when entering applet, object, marquee,
/// > template, td, th, and caption elements, and are used to prevent
/// > formatting from "leaking" into applet, object, marquee, template,
/// > td, th, and caption elements.
///
/// @see https://html.spec.whatwg.org/#list-of-active-formatting-elements
pub(crate) struct ActiveFormattingElements {
    pub entries: Vec<FormattingEntry>,
}

impl ActiveFormattingElements {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// @see https://html.spec.whatwg.org/#concept-parser-marker
    pub fn insert_marker(&mut self) {
        self.entries.push(FormattingEntry::Marker);
    }

    /// Pushes a formatting element, applying the Noah's Ark clause.
    ///
    /// > If there are already three elements in the list of active
    /// > formatting elements after the last marker, if any, or anywhere in
    /// > the list otherwise, that have the same tag name, namespace, and
    /// > attributes as element, then remove the earliest such element.
    pub fn push(
        &mut self,
        element_id: u64,
        name: Name,
        attributes: Vec<Attribute>,
        location: Location,
    ) {
        let mut identical: Vec<usize> = Vec::new();
        for (index, entry) in self.entries.iter().enumerate().rev() {
            match entry {
                FormattingEntry::Marker => break,
                FormattingEntry::Element {
                    name: entry_name,
                    attributes: entry_attributes,
                    ..
                } => {
                    if *entry_name == name && same_attributes(entry_attributes, &attributes) {
                        identical.push(index);
                    }
                }
            }
        }
        if identical.len() >= 3 {
            // `identical` is in reverse order; the last is the earliest.
            self.entries.remove(identical[identical.len() - 1]);
        }

        self.entries.push(FormattingEntry::Element {
            element_id,
            name,
            attributes,
            location,
        });
    }

    /// @see https://html.spec.whatwg.org/multipage/parsing.html#clear-the-list-of-active-formatting-elements-up-to-the-last-marker
    pub fn clear_up_to_last_marker(&mut self) {
        while let Some(entry) = self.entries.pop() {
            if matches!(entry, FormattingEntry::Marker) {
                break;
            }
        }
    }

    /// Finds the most recent element with this local name after the last
    /// marker, the adoption agency's "formatting element" lookup.
    pub fn find_after_last_marker(&self, local: &str) -> Option<usize> {
        for (index, entry) in self.entries.iter().enumerate().rev() {
            match entry {
                FormattingEntry::Marker => return None,
                FormattingEntry::Element { name, .. } => {
                    if name.is_html() && &*name.local == local {
                        return Some(index);
                    }
                }
            }
        }
        None
    }

    pub fn position_of_id(&self, element_id: u64) -> Option<usize> {
        self.entries.iter().position(|entry| {
            matches!(entry, FormattingEntry::Element { element_id: id, .. } if *id == element_id)
        })
    }

    pub fn remove_by_id(&mut self, element_id: u64) {
        if let Some(index) = self.position_of_id(element_id) {
            self.entries.remove(index);
        }
    }
}

/// Attribute-set equality for the Noah's Ark clause: same names with the
/// same values, order-insensitive.
fn same_attributes(a: &[Attribute], b: &[Attribute]) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|left| b.iter().any(|right| left == right))
}

#[cfg(test)]
mod test {
    use super::*;

    fn push_b(list: &mut ActiveFormattingElements, id: u64) {
        list.push(id, Name::html("b"), Vec::new(), Location::new(1, 1));
    }

    #[test]
    fn noahs_ark_keeps_at_most_three_identical_entries() {
        let mut list = ActiveFormattingElements::new();
        for id in 0..4 {
            push_b(&mut list, id);
        }
        assert_eq!(list.len(), 3);
        // The earliest entry was evicted.
        assert_eq!(list.position_of_id(0), None);
        assert!(list.position_of_id(3).is_some());
    }

    #[test]
    fn noahs_ark_resets_at_markers() {
        let mut list = ActiveFormattingElements::new();
        for id in 0..3 {
            push_b(&mut list, id);
        }
        list.insert_marker();
        push_b(&mut list, 3);
        assert_eq!(list.len(), 5);
    }

    #[test]
    fn attributes_distinguish_entries() {
        let mut list = ActiveFormattingElements::new();
        for id in 0..3 {
            push_b(&mut list, id);
        }
        list.push(
            3,
            Name::html("b"),
            vec![Attribute::new(Name::local("class"), "x")],
            Location::new(1, 1),
        );
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn clear_up_to_last_marker() {
        let mut list = ActiveFormattingElements::new();
        push_b(&mut list, 0);
        list.insert_marker();
        push_b(&mut list, 1);
        push_b(&mut list, 2);
        list.clear_up_to_last_marker();
        assert_eq!(list.len(), 1);
        assert!(list.position_of_id(0).is_some());
    }

    #[test]
    fn lookup_stops_at_markers() {
        let mut list = ActiveFormattingElements::new();
        push_b(&mut list, 0);
        list.insert_marker();
        assert_eq!(list.find_after_last_marker("b"), None);
    }
}
