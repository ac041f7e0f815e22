//! JSX structure over the tree-sitter TSX grammar.
//!
//! The syntax tree is reduced to what code edits need: byte spans for tags,
//! attributes and element children. Edits splice text at those spans, so
//! every other byte stays verbatim.
//!
//! ```text
//!   <div className="p-4" data-oid="a1">  text  <span/>  </div>
//!   ^start  ^name_end                 ^open_end      ^close_start ^end
//! ```
//!
//! Element children are only the elements written directly between the tags.
//! Elements inside `{ ... }` expression children or attribute values are
//! collected as `embedded`: they are searchable by oid but have no stable
//! sibling position.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tree_sitter::{Language, Node, Parser, Tree};
use utsushi_types::attrs;

use crate::error::DiffError;

/// Parse failure with the byte offset it was detected at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} at byte {pos}")]
pub struct ScanError {
    pub pos: usize,
    pub reason: String,
}

impl ScanError {
    fn at(pos: usize, reason: impl Into<String>) -> Self {
        Self {
            pos,
            reason: reason.into(),
        }
    }
}

impl From<ScanError> for DiffError {
    fn from(e: ScanError) -> Self {
        DiffError::syntax(e.to_string())
    }
}

type ScanResult<T> = Result<T, ScanError>;

/// Attribute value as written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrValue {
    /// `"text"` or `'text'`, unquoted.
    Literal(String),
    /// `{ expr }` (or a nested element), without the braces.
    Expression(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsxAttribute {
    /// Attribute name, or `{...}` for a spread.
    pub name: String,
    /// Name through the end of the value.
    pub span: Range<usize>,
    pub value: Option<AttrValue>,
    /// Value including its quotes or braces.
    pub value_span: Option<Range<usize>>,
}

/// One parsed element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsxElement {
    /// Empty for fragments.
    pub tag_name: String,
    pub start: usize,
    pub name_end: usize,
    pub open_end: usize,
    /// Equal to `open_end` for self-closing elements.
    pub close_start: usize,
    pub end: usize,
    pub self_closing: bool,
    pub attributes: Vec<JsxAttribute>,
    pub children: Vec<JsxElement>,
    pub embedded: Vec<JsxElement>,
}

impl JsxElement {
    pub fn attribute(&self, name: &str) -> Option<&JsxAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// The literal `data-oid` value, if any.
    pub fn oid(&self) -> Option<&str> {
        match self.attribute(attrs::DATA_ONLOOK_ID)?.value.as_ref()? {
            AttrValue::Literal(s) => Some(s.as_str()),
            AttrValue::Expression(_) => None,
        }
    }

    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Bytes between the opening and closing tags.
    pub fn inner(&self) -> Range<usize> {
        self.open_end..self.close_start
    }

    /// Where a new attribute goes: after the last attribute, or the tag name.
    pub fn attr_insert_pos(&self) -> usize {
        self.attributes
            .last()
            .map(|a| a.span.end)
            .unwrap_or(self.name_end)
    }
}

/// An element found by oid, with its direct parent when it has one.
#[derive(Clone, Copy, Debug)]
pub struct Located<'a> {
    pub element: &'a JsxElement,
    pub parent: Option<&'a JsxElement>,
    /// Position among the parent's element children.
    pub index: usize,
}

// ============================================================================
// Public entry points
// ============================================================================

/// Parse a whole file, returning the top-level JSX elements. Files with
/// syntax errors are rejected rather than half-read.
pub fn parse_document(src: &str) -> ScanResult<Vec<JsxElement>> {
    let tree = parse_tree(src)?;
    let root = tree.root_node();
    if let Some(bad) = first_error(root) {
        return Err(describe_error(bad));
    }
    let mut roots = Vec::new();
    collect(root, src, &mut roots)?;
    Ok(roots)
}

/// Whether the file parses cleanly with every element closed by its own tag.
pub fn check(src: &str) -> ScanResult<()> {
    parse_document(src).map(|_| ())
}

/// Find the element carrying `data-oid="<oid>"`.
pub fn locate<'a>(roots: &'a [JsxElement], oid: &str) -> Option<Located<'a>> {
    locate_in(roots, None, oid)
}

fn locate_in<'a>(
    elements: &'a [JsxElement],
    parent: Option<&'a JsxElement>,
    oid: &str,
) -> Option<Located<'a>> {
    for (index, element) in elements.iter().enumerate() {
        if element.oid() == Some(oid) {
            return Some(Located {
                element,
                parent,
                index,
            });
        }
        if let Some(found) = locate_in(&element.children, Some(element), oid) {
            return Some(found);
        }
        if let Some(found) = locate_in(&element.embedded, None, oid) {
            return Some(found);
        }
    }
    None
}

static OID_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"data-oid\s*=\s*["']([^"']+)["']"#).expect("oid attribute pattern")
});

/// Every `data-oid` literal in the text, without parsing structure.
pub fn scan_oids(src: &str) -> Vec<String> {
    OID_ATTR
        .captures_iter(src)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

// ============================================================================
// Tree walk
// ============================================================================

static TSX: LazyLock<Language> = LazyLock::new(|| tree_sitter_typescript::LANGUAGE_TSX.into());

fn parse_tree(src: &str) -> ScanResult<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&TSX)
        .map_err(|e| ScanError::at(0, format!("loading TSX grammar: {e}")))?;
    parser
        .parse(src, None)
        .ok_or_else(|| ScanError::at(0, "parse did not complete"))
}

/// First `ERROR` or `MISSING` node in document order.
fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find_map(first_error);
    found
}

fn describe_error(node: Node<'_>) -> ScanError {
    if node.is_missing() {
        ScanError::at(node.start_byte(), format!("missing '{}'", node.kind()))
    } else {
        ScanError::at(node.start_byte(), "unexpected syntax")
    }
}

fn is_element(node: &Node<'_>) -> bool {
    matches!(node.kind(), "jsx_element" | "jsx_self_closing_element")
}

fn text<'s>(src: &'s str, node: Node<'_>) -> &'s str {
    &src[node.byte_range()]
}

/// Push every outermost element below `node` into `sink`.
fn collect(node: Node<'_>, src: &str, sink: &mut Vec<JsxElement>) -> ScanResult<()> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if is_element(&child) {
            sink.push(element(child, src)?);
        } else if child.child_count() > 0 {
            collect(child, src, sink)?;
        }
    }
    Ok(())
}

fn child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|c| c.kind() == kind);
    found
}

fn element(node: Node<'_>, src: &str) -> ScanResult<JsxElement> {
    let self_closing = node.kind() == "jsx_self_closing_element";
    let open = if self_closing {
        node
    } else {
        child_of_kind(node, "jsx_opening_element")
            .ok_or_else(|| ScanError::at(node.start_byte(), "element without an opening tag"))?
    };
    let name = open.child_by_field_name("name");
    let tag_name = name.map(|n| text(src, n).to_string()).unwrap_or_default();

    let mut element = JsxElement {
        tag_name,
        start: node.start_byte(),
        name_end: name.map_or(open.start_byte() + 1, |n| n.end_byte()),
        open_end: open.end_byte(),
        close_start: open.end_byte(),
        end: node.end_byte(),
        self_closing,
        attributes: Vec::new(),
        children: Vec::new(),
        embedded: Vec::new(),
    };

    let mut cursor = open.walk();
    for part in open.named_children(&mut cursor) {
        if Some(part) == name {
            continue;
        }
        match part.kind() {
            "jsx_attribute" => {
                let attribute = attribute(part, src, &mut element.embedded)?;
                element.attributes.push(attribute);
            }
            // `{...rest}`
            "jsx_expression" => {
                collect(part, src, &mut element.embedded)?;
                element.attributes.push(JsxAttribute {
                    name: "{...}".to_string(),
                    span: part.byte_range(),
                    value: None,
                    value_span: None,
                });
            }
            _ => {}
        }
    }

    if self_closing {
        return Ok(element);
    }

    let close = child_of_kind(node, "jsx_closing_element")
        .ok_or_else(|| ScanError::at(node.start_byte(), format!("unclosed <{}>", element.tag_name)))?;
    let close_name = close
        .child_by_field_name("name")
        .map(|n| text(src, n))
        .unwrap_or_default();
    if close_name != element.tag_name {
        return Err(ScanError::at(
            close.start_byte(),
            format!("</{close_name}> does not close <{}>", element.tag_name),
        ));
    }
    element.close_start = close.start_byte();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child == open || child == close {
            continue;
        }
        if is_element(&child) {
            element.children.push(self::element(child, src)?);
        } else if child.kind() == "jsx_expression" {
            collect(child, src, &mut element.embedded)?;
        }
    }
    Ok(element)
}

fn attribute(node: Node<'_>, src: &str, embedded: &mut Vec<JsxElement>) -> ScanResult<JsxAttribute> {
    let mut cursor = node.walk();
    let mut parts = node.named_children(&mut cursor);
    let name = parts
        .next()
        .map(|n| text(src, n).to_string())
        .ok_or_else(|| ScanError::at(node.start_byte(), "attribute without a name"))?;
    let Some(value_node) = parts.next() else {
        return Ok(JsxAttribute {
            name,
            span: node.byte_range(),
            value: None,
            value_span: None,
        });
    };

    let raw = text(src, value_node);
    let value = match value_node.kind() {
        "string" => AttrValue::Literal(raw[1..raw.len() - 1].to_string()),
        "jsx_expression" => {
            collect(value_node, src, embedded)?;
            AttrValue::Expression(raw[1..raw.len() - 1].to_string())
        }
        _ if is_element(&value_node) => {
            embedded.push(element(value_node, src)?);
            AttrValue::Expression(raw.to_string())
        }
        _ => AttrValue::Expression(raw.to_string()),
    };
    Ok(JsxAttribute {
        name,
        span: node.byte_range(),
        value: Some(value),
        value_span: Some(value_node.byte_range()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"import { cn } from "@/lib/utils";

export default function Page<T,>({ items }: { items: T[] }) {
    const big = items.length > 3 && items.length < 10;
    // don't trip on this apostrophe
    return (
        <main className="p-4" data-oid="main">
            <h1 data-oid="title">Don't panic</h1>
            {items.map((item) => (
                <li key={String(item)} data-oid="item">{String(item)}</li>
            ))}
            <p className={cn("a", big && "b")} data-oid="para" {...rest}>
                text
            </p>
            <img src="/x.png" data-oid="img" />
        </main>
    );
}
"#;

    #[test]
    fn test_parse_finds_root_and_children() {
        let roots = parse_document(PAGE).unwrap();
        assert_eq!(roots.len(), 1);
        let main = &roots[0];
        assert_eq!(main.tag_name, "main");
        let names: Vec<_> = main.children.iter().map(|c| c.tag_name.as_str()).collect();
        assert_eq!(names, vec!["h1", "p", "img"]);
        assert_eq!(main.embedded.len(), 1);
        assert_eq!(main.embedded[0].tag_name, "li");
    }

    #[test]
    fn test_locate_by_oid_with_parent_and_index() {
        let roots = parse_document(PAGE).unwrap();
        let found = locate(&roots, "para").unwrap();
        assert_eq!(found.index, 1);
        assert_eq!(found.parent.unwrap().tag_name, "main");
        assert!(PAGE[found.element.span()].starts_with("<p className"));

        let item = locate(&roots, "item").unwrap();
        assert!(item.parent.is_none());
        assert!(locate(&roots, "nope").is_none());
    }

    #[test]
    fn test_attribute_values_and_spans() {
        let roots = parse_document(PAGE).unwrap();
        let p = locate(&roots, "para").unwrap().element;
        match &p.attribute("className").unwrap().value {
            Some(AttrValue::Expression(e)) => assert_eq!(e, r#"cn("a", big && "b")"#),
            other => panic!("unexpected {other:?}"),
        }
        assert!(p.attribute("{...}").is_some());
        let img = locate(&roots, "img").unwrap().element;
        assert!(img.self_closing);
        assert_eq!(&PAGE[img.attr_insert_pos()..img.end], " />");
    }

    #[test]
    fn test_text_apostrophes_and_comparisons() {
        let roots = parse_document(PAGE).unwrap();
        let h1 = locate(&roots, "title").unwrap().element;
        assert_eq!(&PAGE[h1.inner()], "Don't panic");
    }

    #[test]
    fn test_unclosed_and_mismatched_rejected() {
        assert!(check("const a = <div><span></div>;").is_err());
        assert!(check("const a = <div>;").is_err());
        assert!(check("function f() { return 1;").is_err());
        assert!(check("const a = (<div>ok</div>);").is_ok());
        assert!(check("const f = (a, b) => a < b ? <b/> : <i/>;").is_ok());
    }

    #[test]
    fn test_mismatched_close_tag_rejected() {
        assert!(check("const a = <div></span>;").is_err());
        assert!(check("const a = <a.b></a.c>;").is_err());
        assert!(check("const a = <a.b></a.b>;").is_ok());
    }

    #[test]
    fn test_regex_and_template_literals_are_code() {
        let src = r#"const re = /[{(]/g;
const tag = `<${name}>`;
export const Row = () => <div data-oid="row">{re.source.length > 1 ? "<" : tag}</div>;
"#;
        let roots = parse_document(src).unwrap();
        assert_eq!(roots.len(), 1);
        let row = locate(&roots, "row").unwrap().element;
        assert_eq!(row.tag_name, "div");
        assert!(row.children.is_empty());
        assert!(src[row.inner()].starts_with("{re.source"));
    }

    #[test]
    fn test_fragments() {
        let roots = parse_document("const x = <><a data-oid=\"a\"/><b/></>;").unwrap();
        assert_eq!(roots[0].tag_name, "");
        assert_eq!(roots[0].children.len(), 2);
        assert_eq!(locate(&roots, "a").unwrap().index, 0);
    }

    #[test]
    fn test_scan_oids() {
        let oids = scan_oids(PAGE);
        assert_eq!(oids, vec!["main", "title", "item", "para", "img"]);
    }
}
