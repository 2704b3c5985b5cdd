//! The XPath subset the in-memory DOM understands: absolute and relative
//! location paths over the child (`/`) and descendant (`//`) axes, name
//! tests (`div`, `*`) and predicates `[n]`, `[@attr]`, `[@attr='v']` and
//! `[text()='v']`.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    HasAttr(String),
    AttrEquals(String, String),
    TextEquals(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    name: String,
    predicates: Vec<Predicate>,
}

/// Read access to a tree of nodes for XPath evaluation
pub trait XPathTree {
    /// The document node; its only child is the root element
    fn document(&self) -> u64;
    fn children(&self, node: u64) -> Vec<u64>;
    fn tag(&self, node: u64) -> String;
    fn attribute(&self, node: u64, name: &str) -> Option<String>;
    fn text(&self, node: u64) -> String;
}

/// A parsed location path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XPath {
    steps: Vec<Step>,
}

impl XPath {
    pub fn parse(expr: &str) -> Result<Self, String> {
        let mut rest = expr.trim();
        if rest.is_empty() {
            return Err("empty XPath".to_string());
        }

        let mut steps = Vec::new();
        let mut first = true;
        while !rest.is_empty() {
            let axis = if let Some(r) = rest.strip_prefix("//") {
                rest = r;
                Axis::Descendant
            } else if let Some(r) = rest.strip_prefix('/') {
                rest = r;
                Axis::Child
            } else if first {
                // Relative path, evaluated from the document
                Axis::Child
            } else {
                return Err(format!("unexpected input at '{}'", rest));
            };
            first = false;

            let name_end = rest.find(['[', '/']).unwrap_or(rest.len());
            let name = rest[..name_end].trim();
            if name.is_empty() {
                return Err(format!("missing name test in '{}'", expr));
            }
            let name = name.to_ascii_lowercase();
            rest = &rest[name_end..];

            let mut predicates = Vec::new();
            while rest.starts_with('[') {
                let close = find_closing_bracket(rest)
                    .ok_or_else(|| format!("unterminated predicate in '{}'", expr))?;
                predicates.push(parse_predicate(&rest[1..close])?);
                rest = &rest[close + 1..];
            }

            steps.push(Step {
                axis,
                name,
                predicates,
            });
        }

        Ok(Self { steps })
    }

    /// All matching nodes in document order
    pub fn evaluate<T: XPathTree + ?Sized>(&self, tree: &T) -> Vec<u64> {
        let order = document_order(tree);
        let mut context = vec![tree.document()];

        for step in &self.steps {
            let mut next = Vec::new();
            let mut seen = HashSet::new();
            for &node in &context {
                let parents = match step.axis {
                    Axis::Child => vec![node],
                    Axis::Descendant => descendants_or_self(tree, node),
                };
                for parent in parents {
                    for matched in step.select_children(tree, parent) {
                        if seen.insert(matched) {
                            next.push(matched);
                        }
                    }
                }
            }
            next.sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));
            context = next;
        }

        context
    }

    /// First matching node in document order
    pub fn first<T: XPathTree + ?Sized>(&self, tree: &T) -> Option<u64> {
        self.evaluate(tree).into_iter().next()
    }
}

impl Step {
    fn select_children<T: XPathTree + ?Sized>(&self, tree: &T, parent: u64) -> Vec<u64> {
        let mut nodes: Vec<u64> = tree
            .children(parent)
            .into_iter()
            .filter(|&child| self.name == "*" || tree.tag(child) == self.name)
            .collect();

        for predicate in &self.predicates {
            nodes = match predicate {
                Predicate::Position(n) => nodes.get(n - 1).copied().into_iter().collect(),
                Predicate::HasAttr(name) => nodes
                    .into_iter()
                    .filter(|&id| tree.attribute(id, name).is_some())
                    .collect(),
                Predicate::AttrEquals(name, value) => nodes
                    .into_iter()
                    .filter(|&id| tree.attribute(id, name).as_deref() == Some(value.as_str()))
                    .collect(),
                Predicate::TextEquals(value) => nodes
                    .into_iter()
                    .filter(|&id| tree.text(id) == *value)
                    .collect(),
            };
        }
        nodes
    }
}

fn find_closing_bracket(input: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in input.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, ']') => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_predicate(body: &str) -> Result<Predicate, String> {
    let body = body.trim();

    if let Ok(n) = body.parse::<usize>() {
        if n == 0 {
            return Err("XPath positions start at 1".to_string());
        }
        return Ok(Predicate::Position(n));
    }

    if let Some(value) = body.strip_prefix("text()") {
        return Ok(Predicate::TextEquals(parse_equals_literal(value)?));
    }

    if let Some(attr) = body.strip_prefix('@') {
        return Ok(match attr.split_once('=') {
            Some((name, value)) => Predicate::AttrEquals(
                name.trim().to_string(),
                parse_literal(value.trim())?,
            ),
            None => Predicate::HasAttr(attr.trim().to_string()),
        });
    }

    Err(format!("unsupported predicate '[{}]'", body))
}

fn parse_equals_literal(input: &str) -> Result<String, String> {
    let value = input
        .trim()
        .strip_prefix('=')
        .ok_or_else(|| format!("expected '=' in '{}'", input))?;
    parse_literal(value.trim())
}

fn parse_literal(input: &str) -> Result<String, String> {
    let mut chars = input.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open), Some(close)) if open == close && (open == '\'' || open == '"') => {
            Ok(chars.as_str().to_string())
        }
        _ => Err(format!("expected a quoted literal, got '{}'", input)),
    }
}

fn descendants_or_self<T: XPathTree + ?Sized>(tree: &T, node: u64) -> Vec<u64> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(id) = stack.pop() {
        out.push(id);
        let mut children = tree.children(id);
        children.reverse();
        stack.extend(children);
    }
    out
}

fn document_order<T: XPathTree + ?Sized>(tree: &T) -> HashMap<u64, usize> {
    descendants_or_self(tree, tree.document())
        .into_iter()
        .enumerate()
        .map(|(pos, id)| (id, pos))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// document(0) > html(1) > body(2) > [div(3) > button#a(4), div(5) > button#b(6) "Go", span(7)]
    struct Fixture;

    impl XPathTree for Fixture {
        fn document(&self) -> u64 {
            0
        }

        fn children(&self, node: u64) -> Vec<u64> {
            match node {
                0 => vec![1],
                1 => vec![2],
                2 => vec![3, 5, 7],
                3 => vec![4],
                5 => vec![6],
                _ => vec![],
            }
        }

        fn tag(&self, node: u64) -> String {
            match node {
                1 => "html",
                2 => "body",
                3 | 5 => "div",
                4 | 6 => "button",
                7 => "span",
                _ => "#document",
            }
            .to_string()
        }

        fn attribute(&self, node: u64, name: &str) -> Option<String> {
            match (node, name) {
                (4, "id") => Some("a".to_string()),
                (6, "id") => Some("b".to_string()),
                _ => None,
            }
        }

        fn text(&self, node: u64) -> String {
            if node == 6 { "Go".to_string() } else { String::new() }
        }
    }

    fn first(expr: &str) -> Option<u64> {
        XPath::parse(expr).unwrap().first(&Fixture)
    }

    #[test]
    fn test_absolute_paths() {
        assert_eq!(first("/html/body/div[2]/button"), Some(6));
        assert_eq!(first("/html/body/div/button"), Some(4));
        assert_eq!(first("/html/body/span"), Some(7));
        assert_eq!(first("/html/body/div[3]"), None);
    }

    #[test]
    fn test_relative_path_from_document() {
        assert_eq!(first("html/body/div[1]/button"), Some(4));
    }

    #[test]
    fn test_descendant_axis_with_attribute() {
        assert_eq!(first("//button[@id='b']"), Some(6));
        assert_eq!(first("//button[@id=\"a\"]"), Some(4));
        assert_eq!(first("//button[@id='missing']"), None);
        assert_eq!(first("//*[@id]"), Some(4));
    }

    #[test]
    fn test_text_predicate() {
        assert_eq!(first("//button[text()='Go']"), Some(6));
    }

    #[test]
    fn test_evaluate_document_order() {
        let all = XPath::parse("//button").unwrap().evaluate(&Fixture);
        assert_eq!(all, vec![4, 6]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(XPath::parse("").is_err());
        assert!(XPath::parse("/html/body/div[0]").is_err());
        assert!(XPath::parse("/html/body/div[").is_err());
        assert!(XPath::parse("//button[contains(@id,'a')]").is_err());
        assert!(XPath::parse("/html//").is_err());
    }

    #[test]
    fn test_bracket_inside_literal() {
        let path = XPath::parse("//button[@id='a]b']").unwrap();
        assert_eq!(path.first(&Fixture), None);
    }
}
