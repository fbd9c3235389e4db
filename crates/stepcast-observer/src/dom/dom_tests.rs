use super::*;

const FORM: &str = r#"{
    "tag": "body",
    "children": [
        { "tag": "form", "attrs": { "id": "signup" }, "children": [
            { "tag": "label", "attrs": { "for": "email" }, "children": ["  Email\n address "] },
            { "tag": "input", "attrs": { "id": "email", "type": "email", "value": "old@x.io" } },
            { "tag": "select", "attrs": { "id": "country" }, "children": [
                { "tag": "option", "attrs": { "value": "de" }, "children": ["Germany"] },
                { "tag": "option", "attrs": { "value": "fr", "selected": "" }, "children": ["France"] }
            ]},
            { "tag": "input", "attrs": { "id": "terms", "type": "checkbox", "checked": "" } },
            { "tag": "button", "attrs": { "class": "btn primary" }, "children": [
                { "tag": "span", "attrs": { "class": "material-icons" }, "children": ["save"] },
                " Save"
            ]}
        ]}
    ]
}"#;

fn sel(s: &str) -> SelectorList {
    s.parse().unwrap()
}

#[test]
fn test_from_json_builds_tree() {
    let doc = Document::from_json(FORM).unwrap();
    assert_eq!(doc.element(doc.root()).unwrap().tag, "body");

    let email = doc.get_element_by_id("email").unwrap();
    let form = doc.get_element_by_id("signup").unwrap();
    assert_eq!(doc.parent(email), Some(form));
    assert_eq!(doc.element(email).unwrap().value, "old@x.io");
    assert_eq!(doc.element(email).unwrap().input_type(), "email");
}

#[test]
fn test_initial_live_state() {
    let doc = Document::from_json(FORM).unwrap();

    let terms = doc.get_element_by_id("terms").unwrap();
    assert!(doc.element(terms).unwrap().checked);

    let country = doc.get_element_by_id("country").unwrap();
    assert_eq!(doc.element(country).unwrap().value, "fr");
    let selected = doc.selected_option(country).unwrap();
    assert_eq!(doc.text_content(selected), "France");
}

#[test]
fn test_select_option() {
    let mut doc = Document::from_json(FORM).unwrap();
    let country = doc.get_element_by_id("country").unwrap();

    assert!(doc.select_option(country, "de"));
    assert_eq!(doc.text_content(doc.selected_option(country).unwrap()), "Germany");

    assert!(!doc.select_option(country, "xx"));
    assert_eq!(doc.element(country).unwrap().value, "de");
}

#[test]
fn test_text_content_excluding_icons() {
    let doc = Document::from_json(FORM).unwrap();
    let button = doc.find(&sel("button")).unwrap();

    assert_eq!(doc.text_content(button), "save Save");
    assert_eq!(
        doc.text_content_excluding(button, Some(&sel(".material-icons, svg"))),
        " Save"
    );
}

#[test]
fn test_closest_and_query() {
    let doc = Document::from_json(FORM).unwrap();
    let email = doc.get_element_by_id("email").unwrap();

    let form = doc.closest(email, &sel("form")).unwrap();
    assert_eq!(doc.closest(email, &sel("input")), Some(email));
    assert_eq!(doc.closest(email, &sel("table")), None);

    let label = doc.query_selector(form, &sel("label[for='email']")).unwrap();
    assert_eq!(doc.text_content(label), "  Email\n address ");
    assert_eq!(doc.query_selector_all(form, &sel("input")).len(), 2);
    // The scope itself is not part of its own query.
    assert_eq!(doc.query_selector(form, &sel("form")), None);
}

#[test]
fn test_previous_element_sibling_skips_text() {
    let mut doc = Document::new();
    let root = doc.root();
    let caption = doc.append_element(root, "div");
    doc.append_text(root, "\n   ");
    let content = doc.append_element(root, "div");

    assert_eq!(doc.previous_element_sibling(content), Some(caption));
    assert_eq!(doc.previous_element_sibling(caption), None);
}

#[test]
fn test_builder_api() {
    let mut doc = Document::new();
    let root = doc.root();
    let button = doc.append_element(root, "BUTTON");
    doc.set_attr(button, "Role", "button");
    doc.append_text(button, "Go");

    let el = doc.element(button).unwrap();
    assert!(el.is("button"));
    assert_eq!(el.attr("role"), Some("button"));
    assert_eq!(doc.text_content(root), "Go");
    assert_eq!(doc.len(), 3);
}

#[test]
fn test_invalid_snapshot() {
    assert!(Document::from_json("{\"children\": []}").is_err());
    assert!(Document::from_json("not json").is_err());
}

#[test]
fn test_set_text_replaces_children() {
    let mut doc = Document::from_json(FORM).unwrap();
    let button = doc.find(&sel("button")).unwrap();

    doc.set_text(button, "Saved");
    assert_eq!(doc.text_content(button), "Saved");
    assert_eq!(doc.children(button).len(), 1);
    assert_eq!(doc.query_selector(button, &sel(".material-icons")), None);
}
