//! Human-readable names for page elements.
//!
//! Candidates are tried in order and the first non-empty one wins:
//!
//! 1. `aria-labelledby` target text
//! 2. `aria-label`
//! 3. `<label for=id>` text
//! 4. wrapping `<label>` text
//! 5. nearby caption (form fields only)
//! 6. own text with icon glyphs removed
//! 7. `placeholder`
//! 8. `title`
//!
//! Every candidate is whitespace-normalized before it is considered.

use std::sync::LazyLock;

use stepcast_protocols::normalize_text;

use crate::dom::{Document, NodeId, SelectorList};

static LABEL: LazyLock<SelectorList> = LazyLock::new(|| SelectorList::fixed("label"));
static FIELD_WRAPPER: LazyLock<SelectorList> = LazyLock::new(|| {
    SelectorList::fixed(".field-input-row, .field-wrapper, .form-field, .form-row")
});
static FIELD_LABEL: LazyLock<SelectorList> = LazyLock::new(|| {
    SelectorList::fixed("label, .field-caption, .field-label, .form-label")
});
static INPUT_ROW: LazyLock<SelectorList> =
    LazyLock::new(|| SelectorList::fixed(".field-input-row, .field-wrapper"));
static FIELD_CAPTION: LazyLock<SelectorList> =
    LazyLock::new(|| SelectorList::fixed(".field-caption"));
static FIELD_CONTENT: LazyLock<SelectorList> =
    LazyLock::new(|| SelectorList::fixed(".field-content"));
static ICONS: LazyLock<SelectorList> = LazyLock::new(|| {
    SelectorList::fixed(".material-symbols-outlined, .material-icons, svg")
});

/// Resolve the label for `id`. Empty when nothing qualifies.
pub fn resolve_label(doc: &Document, id: NodeId) -> String {
    let Some(element) = doc.element(id) else {
        return String::new();
    };

    let candidates: [&dyn Fn() -> String; 8] = [
        &|| from_labelledby(doc, id),
        &|| normalize_text(element.attr("aria-label").unwrap_or_default()),
        &|| from_label_for(doc, id),
        &|| from_wrapping_label(doc, id),
        &|| {
            if element.is_form_field() {
                from_field_caption(doc, id)
            } else {
                String::new()
            }
        },
        &|| normalize_text(&doc.text_content_excluding(id, Some(&ICONS))),
        &|| normalize_text(element.attr("placeholder").unwrap_or_default()),
        &|| normalize_text(element.attr("title").unwrap_or_default()),
    ];

    candidates
        .iter()
        .map(|candidate| candidate())
        .find(|label| !label.is_empty())
        .unwrap_or_default()
}

fn text_of(doc: &Document, id: NodeId) -> String {
    normalize_text(&doc.text_content(id))
}

fn from_labelledby(doc: &Document, id: NodeId) -> String {
    doc.element(id)
        .and_then(|el| el.attr("aria-labelledby"))
        .and_then(|target| doc.get_element_by_id(target.trim()))
        .map(|target| text_of(doc, target))
        .unwrap_or_default()
}

fn from_label_for(doc: &Document, id: NodeId) -> String {
    let Some(html_id) = doc.element(id).and_then(|el| el.attr("id")) else {
        return String::new();
    };
    if html_id.is_empty() {
        return String::new();
    }
    doc.query_selector_all(doc.root(), &LABEL)
        .into_iter()
        .find(|label| doc.element(*label).and_then(|el| el.attr("for")) == Some(html_id))
        .map(|label| text_of(doc, label))
        .unwrap_or_default()
}

fn from_wrapping_label(doc: &Document, id: NodeId) -> String {
    doc.closest(id, &LABEL)
        .map(|label| text_of(doc, label))
        .unwrap_or_default()
}

fn from_field_caption(doc: &Document, id: NodeId) -> String {
    let wrapper = doc
        .closest(id, &FIELD_WRAPPER)
        .or_else(|| doc.parent(id));
    if let Some(wrapper) = wrapper {
        // Only the first match counts, even if its text is empty.
        if let Some(label) = doc.query_selector(wrapper, &FIELD_LABEL) {
            let text = text_of(doc, label);
            if !text.is_empty() {
                return text;
            }
        }
    }

    if let Some(row) = doc.closest(id, &INPUT_ROW) {
        if let Some(caption) = doc.query_selector(row, &FIELD_CAPTION) {
            let text = text_of(doc, caption);
            if !text.is_empty() {
                return text;
            }
        }
    }

    doc.closest(id, &FIELD_CONTENT)
        .and_then(|content| doc.previous_element_sibling(content))
        .filter(|prev| doc.matches(*prev, &FIELD_CAPTION))
        .map(|prev| text_of(doc, prev))
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "label_tests.rs"]
mod tests;
