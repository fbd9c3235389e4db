//! Compound CSS selectors: `tag`, `.class`, `#id`, `[attr]`, `[attr='v']`
//! and comma-separated lists of those. Combinators are not supported.

use std::fmt;
use std::str::FromStr;

use super::Element;
use crate::error::ObserverError;

/// One compound selector, e.g. `input[type='submit'].primary`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

impl Selector {
    pub fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if !element.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| element.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|(name, expected)| match expected {
            Some(value) => element.attr(name) == Some(value.as_str()),
            None => element.attr(name).is_some(),
        })
    }

    fn parse(input: &str) -> Result<Self, ObserverError> {
        let invalid = |reason: &str| ObserverError::Selector {
            selector: input.to_string(),
            reason: reason.to_string(),
        };

        let mut selector = Selector::default();
        let mut chars = input.chars().peekable();

        let tag = take_ident(&mut chars);
        if !tag.is_empty() && tag != "*" {
            selector.tag = Some(tag.to_ascii_lowercase());
        }

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    let class = take_ident(&mut chars);
                    if class.is_empty() {
                        return Err(invalid("empty class name"));
                    }
                    selector.classes.push(class);
                }
                '#' => {
                    let id = take_ident(&mut chars);
                    if id.is_empty() {
                        return Err(invalid("empty id"));
                    }
                    selector.id = Some(id);
                }
                '[' => {
                    let mut body = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(c) => body.push(c),
                            None => return Err(invalid("unterminated attribute selector")),
                        }
                    }
                    selector.attrs.push(parse_attr(&body).ok_or_else(|| invalid("bad attribute selector"))?);
                }
                c if c.is_whitespace() => return Err(invalid("combinators are not supported")),
                _ => return Err(invalid("unexpected character")),
            }
        }

        if selector == Selector::default() && input.trim() != "*" {
            return Err(invalid("empty selector"));
        }
        Ok(selector)
    }
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '*' {
            ident.push(c);
            chars.next();
        } else {
            break;
        }
    }
    ident
}

fn parse_attr(body: &str) -> Option<(String, Option<String>)> {
    let (name, value) = match body.split_once('=') {
        Some((name, value)) => {
            let value = value.trim();
            let unquoted = value
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
                .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
                .unwrap_or(value);
            (name.trim(), Some(unquoted.to_string()))
        }
        None => (body.trim(), None),
    };
    if name.is_empty() {
        return None;
    }
    Some((name.to_ascii_lowercase(), value))
}

/// Comma-separated selector list; matches when any member matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList(Vec<Selector>);

impl SelectorList {
    pub fn matches(&self, element: &Element) -> bool {
        self.0.iter().any(|s| s.matches(element))
    }

    /// Parse a literal list. An invalid literal yields a list that
    /// matches nothing.
    pub(crate) fn fixed(input: &'static str) -> Self {
        input.parse().unwrap_or(SelectorList(Vec::new()))
    }
}

impl FromStr for SelectorList {
    type Err = ObserverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let selectors = s
            .split(',')
            .map(|part| Selector::parse(part.trim()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SelectorList(selectors))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = &self.tag {
            write!(f, "{}", tag)?;
        }
        if let Some(id) = &self.id {
            write!(f, "#{}", id)?;
        }
        for class in &self.classes {
            write!(f, ".{}", class)?;
        }
        for (name, value) in &self.attrs {
            match value {
                Some(v) => write!(f, "[{}='{}']", name, v)?,
                None => write!(f, "[{}]", name)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(tag: &str, attrs: &[(&str, &str)]) -> Element {
        let mut el = Element::new(tag);
        for (k, v) in attrs {
            el.set_attr(k, *v);
        }
        el
    }

    #[test]
    fn test_parse_compound() {
        let list: SelectorList = "input[type='submit'].primary".parse().unwrap();
        assert!(list.matches(&element("input", &[("type", "submit"), ("class", "primary big")])));
        assert!(!list.matches(&element("input", &[("type", "submit")])));
        assert!(!list.matches(&element("button", &[("type", "submit"), ("class", "primary")])));
    }

    #[test]
    fn test_parse_list() {
        let list: SelectorList = "label, .field-caption, #main, [onclick]".parse().unwrap();
        assert!(list.matches(&element("label", &[])));
        assert!(list.matches(&element("div", &[("class", "x field-caption")])));
        assert!(list.matches(&element("div", &[("id", "main")])));
        assert!(list.matches(&element("span", &[("onclick", "go()")])));
        assert!(!list.matches(&element("div", &[("class", "field-captions")])));
    }

    #[test]
    fn test_attribute_quoting() {
        let list: SelectorList = r#"label[for="email"]"#.parse().unwrap();
        assert!(list.matches(&element("label", &[("for", "email")])));
        let list: SelectorList = "[role=button]".parse().unwrap();
        assert!(list.matches(&element("div", &[("role", "button")])));
    }

    #[test]
    fn test_tag_is_case_insensitive() {
        let list: SelectorList = "BUTTON".parse().unwrap();
        assert!(list.matches(&element("button", &[])));
    }

    #[test]
    fn test_rejects_unsupported() {
        assert!("div span".parse::<SelectorList>().is_err());
        assert!("div > span".parse::<SelectorList>().is_err());
        assert!("[unterminated".parse::<SelectorList>().is_err());
        assert!(".".parse::<SelectorList>().is_err());
        assert!("".parse::<SelectorList>().is_err());
    }

    #[test]
    fn test_display() {
        let list: SelectorList = "input#q.big[type='text']".parse().unwrap();
        assert_eq!(list.0[0].to_string(), "input#q.big[type='text']");
    }
}
