//! Selectors
//!
//! The compound-selector subset widgets use to locate their parts:
//! `tag`, `#id`, `.class`, `[attr]` and `[attr="value"]`, combined
//! within one compound and separated by commas. Combinators are rejected.

use crate::{DOMTokenList, DomError, ElementData, Result};

/// Attribute condition inside a compound selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    pub value: Option<String>,
}

/// One compound selector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttributeSelector>,
}

impl Selector {
    /// Check if an element matches every condition
    pub fn matches(&self, el: &ElementData) -> bool {
        if let Some(tag) = &self.tag {
            if *tag != el.tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.get_attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let list = DOMTokenList::from_string(el.get_attr("class").unwrap_or(""));
            if !self.classes.iter().all(|c| list.contains(c)) {
                return false;
            }
        }
        self.attributes.iter().all(|a| match (&a.value, el.get_attr(&a.name)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(expected), Some(actual)) => expected == actual,
        })
    }
}

/// Comma-separated selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList(pub Vec<Selector>);

impl SelectorList {
    /// Parse a selector list
    pub fn parse(input: &str) -> Result<Self> {
        let selectors = input
            .split(',')
            .map(|part| parse_compound(part.trim(), input))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self(selectors))
    }

    /// Check if any selector of the list matches
    pub fn matches(&self, el: &ElementData) -> bool {
        self.0.iter().any(|s| s.matches(el))
    }
}

fn invalid(input: &str) -> DomError {
    DomError::InvalidSelector(input.to_string())
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident<'a>(s: &'a str, input: &str) -> Result<(&'a str, &'a str)> {
    let end = s.find(|c: char| !is_ident_char(c)).unwrap_or(s.len());
    if end == 0 {
        return Err(invalid(input));
    }
    Ok((&s[..end], &s[end..]))
}

fn parse_compound(part: &str, input: &str) -> Result<Selector> {
    if part.is_empty() {
        return Err(invalid(input));
    }
    let mut selector = Selector::default();
    let mut rest = part;

    if let Some(r) = rest.strip_prefix('*') {
        rest = r;
    } else if rest.starts_with(is_ident_char) {
        let (tag, r) = take_ident(rest, input)?;
        selector.tag = Some(tag.to_ascii_lowercase());
        rest = r;
    }

    while let Some(c) = rest.chars().next() {
        match c {
            '#' => {
                let (id, r) = take_ident(&rest[1..], input)?;
                selector.id = Some(id.to_string());
                rest = r;
            }
            '.' => {
                let (class, r) = take_ident(&rest[1..], input)?;
                selector.classes.push(class.to_string());
                rest = r;
            }
            '[' => {
                let close = rest.find(']').ok_or_else(|| invalid(input))?;
                selector.attributes.push(parse_attribute(&rest[1..close], input)?);
                rest = &rest[close + 1..];
            }
            _ => return Err(invalid(input)),
        }
    }
    Ok(selector)
}

fn parse_attribute(body: &str, input: &str) -> Result<AttributeSelector> {
    let (name, value) = match body.split_once('=') {
        Some((name, value)) => (name.trim(), Some(value.trim())),
        None => (body.trim(), None),
    };
    let (ident, tail) = take_ident(name, input)?;
    if !tail.is_empty() {
        return Err(invalid(input));
    }
    let value = match value {
        None => None,
        Some(v) => {
            let unquoted = ['"', '\'']
                .iter()
                .find_map(|q| v.strip_prefix(*q).and_then(|s| s.strip_suffix(*q)))
                .unwrap_or(v);
            Some(unquoted.to_string())
        }
    };
    Ok(AttributeSelector {
        name: ident.to_string(),
        value,
    })
}
