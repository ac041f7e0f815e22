//! Direct-manipulation code edits.
//!
//! Each function takes one file's text, finds the JSX node(s) it concerns by
//! `data-oid`, and returns the edited text. Only the bytes the edit concerns
//! change, so applying an action and then its inverse restores the file.
//!
//! Element positions count element siblings only; text and `{expression}`
//! children are skipped, matching how the render surface counts.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use utsushi_types::{ActionElement, attrs};

use crate::error::DiffError;
use crate::jsx::{self, AttrValue, JsxAttribute, JsxElement, Located};

type EditResult<T> = Result<T, DiffError>;

/// Indentation step used when no sibling shows one.
const DEFAULT_INDENT: &str = "  ";

// ============================================================================
// Text helpers
// ============================================================================

pub(crate) fn splice(src: &str, range: Range<usize>, with: &str) -> String {
    let mut out = String::with_capacity(src.len() + with.len());
    out.push_str(&src[..range.start]);
    out.push_str(with);
    out.push_str(&src[range.end..]);
    out
}

fn line_start(src: &str, pos: usize) -> usize {
    src[..pos].rfind('\n').map(|p| p + 1).unwrap_or(0)
}

/// Offset just past the newline ending the line containing `pos`.
fn line_end(src: &str, pos: usize) -> usize {
    src[pos..]
        .find('\n')
        .map(|p| pos + p + 1)
        .unwrap_or(src.len())
}

/// Whole-line span of an element that sits alone on its lines.
pub(crate) fn own_lines(src: &str, el: &JsxElement) -> Option<Range<usize>> {
    let start = line_start(src, el.start);
    if !src[start..el.start].trim().is_empty() {
        return None;
    }
    let end = line_end(src, el.end);
    if !src[el.end..end].trim().is_empty() {
        return None;
    }
    Some(start..end)
}

fn indent_of(src: &str, pos: usize) -> &str {
    let start = line_start(src, pos);
    let line = &src[start..pos];
    &line[..line.len() - line.trim_start().len()]
}

fn trim_back_ws(src: &str, mut pos: usize) -> usize {
    let b = src.as_bytes();
    while pos > 0 && b[pos - 1].is_ascii_whitespace() {
        pos -= 1;
    }
    pos
}

fn indent_lines(text: &str, unit: &str) -> String {
    text.replace('\n', &format!("\n{unit}"))
}

fn outdent_lines(text: &str, unit: &str) -> String {
    let mut lines = text.split('\n');
    let mut out = lines.next().unwrap_or_default().to_string();
    for line in lines {
        out.push('\n');
        out.push_str(line.strip_prefix(unit).unwrap_or(line));
    }
    out
}

fn parse(src: &str) -> EditResult<Vec<JsxElement>> {
    Ok(jsx::parse_document(src)?)
}

fn find<'a>(roots: &'a [JsxElement], oid: &str) -> EditResult<Located<'a>> {
    jsx::locate(roots, oid).ok_or_else(|| DiffError::anchor(oid, "no element with this oid"))
}

fn remove_attribute(src: &str, attr: &JsxAttribute) -> String {
    let start = trim_back_ws(src, attr.span.start);
    splice(src, start..attr.span.end, "")
}

fn quote(value: &str, q: char) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace(q, &format!("\\{q}"));
    format!("{q}{escaped}{q}")
}

/// Text as JSX child content, wrapped in a string expression when it holds
/// characters JSX text cannot.
fn jsx_text(s: &str) -> String {
    if s.contains(['{', '}', '<', '>']) {
        format!("{{{}}}", quote(s, '"').replace('\n', "\\n"))
    } else {
        s.to_string()
    }
}

// ============================================================================
// className
// ============================================================================

static CLASS_HELPER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(cn|clsx|classnames|classNames|twMerge|cx)\s*\(").expect("class helper pattern")
});

fn merge_tokens<'a>(s: &'a str, removed: &[&str], added: &[&'a str]) -> String {
    let mut out: Vec<&str> = s
        .split_whitespace()
        .filter(|t| !removed.contains(t))
        .collect();
    for &token in added {
        if !out.contains(&token) {
            out.push(token);
        }
    }
    out.join(" ")
}

/// Content ranges (inside the quotes) of string literals in an expression.
fn string_literals(expr: &str) -> Vec<Range<usize>> {
    let b = expr.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < b.len() {
        let q = b[i];
        if !matches!(q, b'"' | b'\'' | b'`') {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        while j < b.len() && b[j] != q {
            j += if b[j] == b'\\' { 2 } else { 1 };
        }
        if j >= b.len() {
            break;
        }
        let body = &expr[i + 1..j];
        if q != b'`' || !body.contains("${") {
            out.push(i + 1..j);
        }
        i = j + 1;
    }
    out
}

fn remove_token_from_literals(expr: &str, token: &str) -> Option<String> {
    for lit in string_literals(expr) {
        let body = &expr[lit.clone()];
        if !body.split_whitespace().any(|t| t == token) {
            continue;
        }
        let next = merge_tokens(body, &[token], &[]);
        if !next.is_empty() {
            return Some(splice(expr, lit, &next));
        }
        // Drop the emptied literal together with one adjacent comma.
        let (open, close) = (lit.start - 1, lit.end + 1);
        let after = expr[close..].trim_start();
        if let Some(rest) = after.strip_prefix(',') {
            let end = expr.len() - rest.trim_start().len();
            return Some(splice(expr, open..end, ""));
        }
        let before = expr[..open].trim_end();
        if before.ends_with(',') {
            return Some(splice(expr, before.len() - 1..close, ""));
        }
        return Some(splice(expr, open..close, ""));
    }
    None
}

fn append_argument(expr: &str, arg: &str) -> String {
    let closer = expr.len() - 1;
    let before = expr[..closer].trim_end();
    let gap = &expr[before.len()..closer];
    let sep = if before.ends_with('(') || before.ends_with('[') {
        ""
    } else if before.ends_with(',') {
        " "
    } else {
        ", "
    };
    format!("{before}{sep}{arg}{gap}{}", &expr[closer..])
}

fn single_literal(expr: &str) -> Option<(char, &str)> {
    let q = expr.chars().next()?;
    if !matches!(q, '"' | '\'' | '`') || expr.len() < 2 || !expr.ends_with(q) {
        return None;
    }
    let body = &expr[1..expr.len() - 1];
    if body.contains(q) || (q == '`' && body.contains("${")) {
        return None;
    }
    Some((q, body))
}

/// Split `` `${expr} a b` `` into `expr` and the literal tail `" a b"`.
fn wrapped_expression(expr: &str) -> Option<(&str, &str)> {
    let body = expr.strip_prefix("`${")?.strip_suffix('`')?;
    let mut depth = 0usize;
    let close = body.char_indices().find_map(|(i, c)| match c {
        '{' => {
            depth += 1;
            None
        }
        '}' if depth == 0 => Some(i),
        '}' => {
            depth -= 1;
            None
        }
        _ => None,
    })?;
    let tail = &body[close + 1..];
    if tail.contains('`') || tail.contains("${") {
        return None;
    }
    Some((&body[..close], tail))
}

fn edit_class_expression(expr: &str, removed: &[&str], added: &[&str]) -> Option<String> {
    let trimmed = expr.trim();
    let lead = &expr[..expr.len() - expr.trim_start().len()];
    let trail = &expr[expr.trim_end().len()..];

    if let Some((q, body)) = single_literal(trimmed) {
        let next = merge_tokens(body, removed, added);
        return Some(format!("{lead}{q}{next}{q}{trail}"));
    }

    let is_call = CLASS_HELPER.is_match(trimmed) && trimmed.ends_with(')');
    let is_array = trimmed.starts_with('[') && trimmed.ends_with(']');
    if is_call || is_array {
        let mut out = trimmed.to_string();
        for token in removed {
            out = remove_token_from_literals(&out, token)?;
        }
        if !added.is_empty() {
            out = append_argument(&out, &quote(&added.join(" "), '"'));
        }
        return Some(format!("{lead}{out}{trail}"));
    }

    if let Some((inner, tail)) = wrapped_expression(trimmed) {
        let tokens: Vec<&str> = tail.split_whitespace().collect();
        if removed.iter().any(|t| !tokens.contains(t)) {
            return None;
        }
        let next = merge_tokens(tail, removed, added);
        if next.is_empty() {
            return Some(format!("{lead}{inner}{trail}"));
        }
        return Some(format!("{lead}`${{{inner}}} {next}`{trail}"));
    }

    if removed.is_empty() {
        return Some(format!("{lead}`${{{trimmed}}} {}`{trail}", added.join(" ")));
    }
    None
}

/// Apply a class list change as a token diff: only tokens removed from
/// `original` are removed and only tokens new in `new` are appended.
pub fn edit_class_name(src: &str, oid: &str, original: &str, new: &str) -> EditResult<String> {
    let before: Vec<&str> = original.split_whitespace().collect();
    let after: Vec<&str> = new.split_whitespace().collect();
    let removed: Vec<&str> = before.iter().filter(|t| !after.contains(t)).copied().collect();
    let mut added: Vec<&str> = Vec::new();
    for token in &after {
        if !before.contains(token) && !added.contains(token) {
            added.push(*token);
        }
    }
    if removed.is_empty() && added.is_empty() {
        return Ok(src.to_string());
    }

    let roots = parse(src)?;
    let el = find(&roots, oid)?.element;
    let Some(attr) = el.attribute("className") else {
        if added.is_empty() {
            return Ok(src.to_string());
        }
        let pos = el.attr_insert_pos();
        let attr = format!(" className={}", quote(&added.join(" "), '"'));
        return Ok(splice(src, pos..pos, &attr));
    };
    let (Some(value), Some(span)) = (&attr.value, &attr.value_span) else {
        return Err(DiffError::anchor(oid, "className has no value"));
    };

    match value {
        AttrValue::Literal(s) => {
            let next = merge_tokens(s, &removed, &added);
            if next.is_empty() {
                return Ok(remove_attribute(src, attr));
            }
            let q = &src[span.start..span.start + 1];
            Ok(splice(src, span.clone(), &format!("{q}{next}{q}")))
        }
        AttrValue::Expression(expr) => {
            let next = edit_class_expression(expr, &removed, &added)
                .ok_or_else(|| DiffError::anchor(oid, "className expression cannot be edited"))?;
            Ok(splice(src, span.start + 1..span.end - 1, &next))
        }
    }
}

// ============================================================================
// style={{ ... }}
// ============================================================================

struct Entry {
    span: Range<usize>,
    key: String,
    value: Range<usize>,
}

/// `background-color` → `backgroundColor`. Custom properties stay as written.
pub fn camel_case(key: &str) -> String {
    if key.starts_with("--") {
        return key.to_string();
    }
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '-' {
            upper = true;
            continue;
        }
        if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn key_literal(key: &str) -> String {
    if key.bytes().all(|c| c.is_ascii_alphanumeric() || c == b'_' || c == b'$') {
        key.to_string()
    } else {
        quote(key, '\'')
    }
}

fn trimmed(src: &str, range: Range<usize>) -> Range<usize> {
    let text = &src[range.clone()];
    let start = range.start + (text.len() - text.trim_start().len());
    let end = range.start + text.trim_end().len();
    start..end.max(start)
}

/// Top-level `key: value` entries of an object literal body.
fn object_entries(src: &str, body: Range<usize>) -> Vec<Entry> {
    let b = src.as_bytes();
    let mut segments = Vec::new();
    let mut depth = 0i32;
    let mut seg_start = body.start;
    let mut i = body.start;
    while i < body.end {
        match b[i] {
            q @ (b'"' | b'\'' | b'`') => {
                i += 1;
                while i < body.end && b[i] != q {
                    i += if b[i] == b'\\' { 2 } else { 1 };
                }
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b',' if depth == 0 => {
                segments.push(seg_start..i);
                seg_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    segments.push(seg_start..body.end);

    segments
        .into_iter()
        .map(|s| trimmed(src, s))
        .filter(|s| !s.is_empty())
        .map(|span| {
            let text = &src[span.clone()];
            match text.find(':') {
                Some(colon) => {
                    let key = text[..colon].trim().trim_matches(['"', '\'']).to_string();
                    let value = trimmed(src, span.start + colon + 1..span.end);
                    Entry { span, key, value }
                }
                None => Entry {
                    key: text.to_string(),
                    value: span.end..span.end,
                    span,
                },
            }
        })
        .collect()
}

/// Set one CSS property in the element's `style={{ }}` prop. An empty value
/// removes the property; the prop is created when absent and dropped when
/// it becomes empty.
pub fn edit_style_property(src: &str, oid: &str, css_key: &str, value: &str) -> EditResult<String> {
    let key = camel_case(css_key);
    let roots = parse(src)?;
    let el = find(&roots, oid)?.element;

    let Some(attr) = el.attribute("style") else {
        if value.is_empty() {
            return Ok(src.to_string());
        }
        let pos = el.attr_insert_pos();
        let prop = format!(" style={{{{ {}: {} }}}}", key_literal(&key), quote(value, '\''));
        return Ok(splice(src, pos..pos, &prop));
    };
    let (Some(AttrValue::Expression(expr)), Some(span)) = (&attr.value, &attr.value_span) else {
        return Err(DiffError::anchor(oid, "style is not an expression"));
    };
    let object = expr.trim();
    if !(object.starts_with('{') && object.ends_with('}')) {
        return Err(DiffError::anchor(oid, "style is not an object literal"));
    }
    let open = span.start + 1 + (expr.len() - expr.trim_start().len());
    let close = open + object.len() - 1;
    let entries = object_entries(src, open + 1..close);
    let hit = entries.iter().position(|e| e.key == key || e.key == css_key);

    match (hit, value.is_empty()) {
        (None, true) => Ok(src.to_string()),
        (Some(_), true) if entries.len() == 1 => Ok(remove_attribute(src, attr)),
        (Some(i), true) => {
            let range = if i + 1 < entries.len() {
                entries[i].span.start..entries[i + 1].span.start
            } else {
                entries[i - 1].span.end..entries[i].span.end
            };
            Ok(splice(src, range, ""))
        }
        (Some(i), false) => {
            let old = &src[entries[i].value.clone()];
            let q = if old.starts_with('"') { '"' } else { '\'' };
            Ok(splice(src, entries[i].value.clone(), &quote(value, q)))
        }
        (None, false) => {
            let entry = format!("{}: {}", key_literal(&key), quote(value, '\''));
            match entries.last() {
                Some(last) => {
                    let at = last.span.end;
                    Ok(splice(src, at..at, &format!(", {entry}")))
                }
                None => Ok(splice(src, open + 1..close, &format!(" {entry} "))),
            }
        }
    }
}

// ============================================================================
// Text
// ============================================================================

fn is_string_expression(body: &str) -> bool {
    body.strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .is_some_and(|s| single_literal(s.trim()).is_some())
}

/// Replace an element's text content, keeping surrounding whitespace.
pub fn edit_text(src: &str, oid: &str, original: &str, new: &str) -> EditResult<String> {
    let roots = parse(src)?;
    let el = find(&roots, oid)?.element;
    let text = jsx_text(new);

    if el.self_closing {
        if new.is_empty() {
            return Ok(src.to_string());
        }
        let cut = trim_back_ws(src, el.end - 2);
        return Ok(splice(src, cut..el.end, &format!(">{text}</{}>", el.tag_name)));
    }

    let inner = el.inner();
    let body = &src[inner.clone()];
    let plain = !body.contains('{') || is_string_expression(body.trim());
    if el.children.is_empty() && plain {
        let range = if body.trim().is_empty() {
            inner
        } else {
            trimmed(src, inner)
        };
        return Ok(splice(src, range, &text));
    }

    let needle = original.trim();
    if needle.is_empty() {
        return Err(DiffError::anchor(oid, "element has mixed content and no prior text"));
    }
    for (offset, _) in body.match_indices(needle) {
        let pos = inner.start + offset;
        if !el.children.iter().any(|c| c.span().contains(&pos)) {
            return Ok(splice(src, pos..pos + needle.len(), &jsx_text(new.trim())));
        }
    }
    Err(DiffError::anchor(needle, "text not found in element"))
}

// ============================================================================
// Structure
// ============================================================================

/// Move an element among its element siblings. `new_index` is its final
/// position.
pub fn move_element(src: &str, oid: &str, new_index: usize) -> EditResult<String> {
    let roots = parse(src)?;
    let found = find(&roots, oid)?;
    let parent = found
        .parent
        .ok_or_else(|| DiffError::anchor(oid, "element has no parent element in source"))?;
    let from = found.index;
    let others: Vec<&JsxElement> = parent
        .children
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != from)
        .map(|(_, c)| c)
        .collect();
    let to = new_index.min(others.len());
    if to == from || others.is_empty() {
        return Ok(src.to_string());
    }

    let el = found.element;
    let before = to < others.len();
    let anchor = if before { others[to] } else { others[others.len() - 1] };
    let (cut, block, at) = match (own_lines(src, el), own_lines(src, anchor)) {
        (Some(moving), Some(target)) => {
            let at = if before { target.start } else { target.end };
            (moving.clone(), src[moving].to_string(), at)
        }
        _ => {
            let at = if before { anchor.start } else { anchor.end };
            (el.span(), src[el.span()].to_string(), at)
        }
    };

    if at >= cut.end {
        let out = splice(src, at..at, &block);
        Ok(splice(&out, cut, ""))
    } else {
        let out = splice(src, cut, "");
        Ok(splice(&out, at..at, &block))
    }
}

/// Insert `code` as the element child at `index` (append when `None`).
pub fn insert_element(
    src: &str,
    parent_oid: &str,
    index: Option<usize>,
    code: &str,
) -> EditResult<String> {
    let roots = parse(src)?;
    let parent = find(&roots, parent_oid)?.element;
    let children = &parent.children;
    let index = index.unwrap_or(children.len()).min(children.len());

    if parent.self_closing {
        let cut = trim_back_ws(src, parent.end - 2);
        return Ok(splice(src, cut..parent.end, &format!(">{code}</{}>", parent.tag_name)));
    }

    if let Some(sibling) = children.get(index) {
        return Ok(match own_lines(src, sibling) {
            Some(lines) => {
                let indent = indent_of(src, sibling.start);
                splice(src, lines.start..lines.start, &format!("{indent}{code}\n"))
            }
            None => splice(src, sibling.start..sibling.start, code),
        });
    }
    if let Some(last) = children.last() {
        return Ok(match own_lines(src, last) {
            Some(lines) => {
                let indent = indent_of(src, last.start);
                splice(src, lines.end..lines.end, &format!("{indent}{code}\n"))
            }
            None => splice(src, last.end..last.end, code),
        });
    }

    let body = &src[parent.inner()];
    if body.trim().is_empty() && body.contains('\n') {
        let at = line_start(src, parent.close_start);
        let indent = format!("{}{DEFAULT_INDENT}", indent_of(src, parent.start));
        return Ok(splice(src, at..at, &format!("{indent}{code}\n")));
    }
    Ok(splice(src, parent.close_start..parent.close_start, code))
}

/// Exact source text of the element carrying `oid`.
pub fn element_code(src: &str, oid: &str) -> EditResult<String> {
    let roots = parse(src)?;
    let el = find(&roots, oid)?.element;
    Ok(src[el.span()].to_string())
}

/// Remove the element, returning the new text and the removed code.
pub fn remove_element(src: &str, oid: &str) -> EditResult<(String, String)> {
    let roots = parse(src)?;
    let el = find(&roots, oid)?.element;
    let code = src[el.span()].to_string();
    let cut = own_lines(src, el).unwrap_or(el.span());
    Ok((splice(src, cut, ""), code))
}

/// Wrap sibling elements in `container`, placed where the first of them was.
pub fn group_elements(src: &str, child_oids: &[&str], container: &ActionElement) -> EditResult<String> {
    let roots = parse(src)?;
    let mut found: Vec<(&JsxElement, usize, &JsxElement)> = Vec::with_capacity(child_oids.len());
    for oid in child_oids {
        let located = find(&roots, oid)?;
        let parent = located
            .parent
            .ok_or_else(|| DiffError::anchor(*oid, "element has no parent element in source"))?;
        found.push((parent, located.index, located.element));
    }
    let Some(&(parent, _, _)) = found.first() else {
        return Err(DiffError::malformed("nothing to group"));
    };
    if found.iter().any(|(p, _, _)| p.start != parent.start) {
        return Err(DiffError::anchor(child_oids.join(","), "children do not share a parent"));
    }
    found.sort_by_key(|(_, index, _)| *index);
    found.dedup_by_key(|(_, index, _)| *index);

    let open = open_tag(container, false);
    let close = format!("</{}>", container.tag_name);
    let lines: Option<Vec<Range<usize>>> = found.iter().map(|(_, _, el)| own_lines(src, el)).collect();

    let (spans, block) = match lines {
        Some(spans) => {
            let first = found[0].2;
            let indent = indent_of(src, first.start);
            let unit = indent
                .strip_prefix(indent_of(src, parent.start))
                .filter(|u| !u.is_empty())
                .unwrap_or(DEFAULT_INDENT);
            let mut block = format!("{indent}{open}\n");
            for (_, _, el) in &found {
                block.push_str(&format!("{indent}{unit}{}\n", indent_lines(&src[el.span()], unit)));
            }
            block.push_str(&format!("{indent}{close}\n"));
            (spans, block)
        }
        None => {
            let body: String = found.iter().map(|(_, _, el)| &src[el.span()]).collect();
            let spans = found.iter().map(|(_, _, el)| el.span()).collect();
            (spans, format!("{open}{body}{close}"))
        }
    };

    let at = spans[0].start;
    let mut out = src.to_string();
    for span in spans.iter().rev() {
        out = splice(&out, span.clone(), "");
    }
    Ok(splice(&out, at..at, &block))
}

/// Replace a container with its children. With `child_indices`, each child
/// (in `child_oids` order) then moves to its recorded position.
pub fn ungroup_element(
    src: &str,
    container_oid: &str,
    child_oids: &[&str],
    child_indices: Option<&[usize]>,
) -> EditResult<String> {
    let roots = parse(src)?;
    let found = find(&roots, container_oid)?;
    let el = found.element;
    let children = &el.children;

    let line_mode = !children.is_empty() && children.iter().all(|c| own_lines(src, c).is_some());
    let out = match own_lines(src, el) {
        Some(lines) if line_mode => {
            let indent = indent_of(src, el.start);
            let unit = indent_of(src, children[0].start)
                .strip_prefix(indent)
                .unwrap_or_default();
            let block: String = children
                .iter()
                .map(|c| format!("{indent}{}\n", outdent_lines(&src[c.span()], unit)))
                .collect();
            splice(src, lines, &block)
        }
        _ => {
            let block: String = children.iter().map(|c| &src[c.span()]).collect();
            splice(src, el.span(), &block)
        }
    };

    let Some(indices) = child_indices else {
        return Ok(out);
    };
    if indices.len() != child_oids.len() {
        return Err(DiffError::malformed("childIndices length does not match children"));
    }
    // Last first: each move then leaves already-placed later children in place.
    let mut out = out;
    for (k, (oid, &target)) in child_oids.iter().zip(indices).enumerate().rev() {
        if target != found.index + k {
            out = move_element(&out, oid, target)?;
        }
    }
    Ok(out)
}

// ============================================================================
// Element → JSX
// ============================================================================

const EDITOR_ONLY_ATTRS: &[&str] = &[
    attrs::DATA_ONLOOK_DOM_ID,
    attrs::DATA_ONLOOK_ID,
    attrs::DATA_ONLOOK_INSTANCE_ID,
    attrs::DATA_ONLOOK_INSERTED,
    attrs::DATA_ONLOOK_DRAGGING,
    attrs::DATA_ONLOOK_NEW_INDEX,
    attrs::DATA_ONLOOK_STUB,
    attrs::DATA_ONLOOK_EDITING_TEXT,
    "style",
];

fn open_tag(el: &ActionElement, self_closing: bool) -> String {
    let mut out = format!("<{}", el.tag_name);
    for (name, value) in &el.attributes {
        if EDITOR_ONLY_ATTRS.contains(&name.as_str()) {
            continue;
        }
        if name == "class" {
            if !value.is_empty() {
                out.push_str(&format!(" className={}", quote(value, '"')));
            }
            continue;
        }
        out.push_str(&format!(" {name}={}", quote(value, '"')));
    }
    out.push_str(&format!(" {}=\"{}\"", attrs::DATA_ONLOOK_ID, el.oid));
    if !el.styles.is_empty() {
        let entries: Vec<String> = el
            .styles
            .iter()
            .map(|(k, v)| format!("{}: {}", key_literal(&camel_case(k)), quote(v, '\'')))
            .collect();
        out.push_str(&format!(" style={{{{ {} }}}}", entries.join(", ")));
    }
    out.push_str(if self_closing { " />" } else { ">" });
    out
}

/// Render an element snapshot as JSX, carrying its `data-oid`.
pub fn element_to_jsx(el: &ActionElement) -> String {
    let text = el.text_content.as_deref().unwrap_or_default();
    if el.children.is_empty() && text.is_empty() {
        return open_tag(el, true);
    }
    let mut out = open_tag(el, false);
    out.push_str(&jsx_text(text));
    for child in &el.children {
        out.push_str(&element_to_jsx(child));
    }
    out.push_str(&format!("</{}>", el.tag_name));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = r#"export function List() {
    return (
        <ul data-oid="list">
            <li data-oid="a">A</li>
            <li data-oid="b">B</li>
            <li data-oid="c">C</li>
        </ul>
    );
}
"#;

    fn order(src: &str) -> Vec<String> {
        let roots = jsx::parse_document(src).unwrap();
        let list = jsx::locate(&roots, "list").unwrap().element;
        list.children.iter().filter_map(|c| c.oid().map(String::from)).collect()
    }

    #[test]
    fn test_class_literal_token_diff() {
        let src = r#"const x = <div className="p-4 keep" data-oid="d" />;"#;
        let out = edit_class_name(src, "d", "p-4 keep", "keep m-2").unwrap();
        assert_eq!(out, r#"const x = <div className="keep m-2" data-oid="d" />;"#);
    }

    #[test]
    fn test_class_created_and_dropped_exactly() {
        let src = r#"const x = <div data-oid="d" />;"#;
        let added = edit_class_name(src, "d", "", "flex").unwrap();
        assert_eq!(added, r#"const x = <div data-oid="d" className="flex" />;"#);
        let back = edit_class_name(&added, "d", "flex", "").unwrap();
        assert_eq!(back, src);
    }

    #[test]
    fn test_class_helper_call_keeps_unknown_classes() {
        let src = r#"const x = <p className={cn("a b", active && "on")} data-oid="p" />;"#;
        let out = edit_class_name(src, "p", "a b on", "a b on gap-2").unwrap();
        assert_eq!(
            out,
            r#"const x = <p className={cn("a b", active && "on", "gap-2")} data-oid="p" />;"#
        );
        let back = edit_class_name(&out, "p", "a b on gap-2", "a b on").unwrap();
        assert_eq!(back, src);

        let removed = edit_class_name(src, "p", "a b", "a").unwrap();
        assert!(removed.contains(r#"cn("a", active && "on")"#));
    }

    #[test]
    fn test_class_opaque_expression_rejects_removal() {
        let src = r#"const x = <p className={styles.root} data-oid="p" />;"#;
        let added = edit_class_name(src, "p", "", "m-1").unwrap();
        assert!(added.contains("className={`${styles.root} m-1`}"));
        let err = edit_class_name(src, "p", "root", "").unwrap_err();
        assert!(matches!(err, DiffError::AnchorMissing { .. }));
    }

    #[test]
    fn test_class_added_to_expression_reverts_exactly() {
        let src = r#"const x = <p className={styles.root} data-oid="p" />;"#;
        let added = edit_class_name(src, "p", "root", "root m-1 p-2").unwrap();
        assert!(added.contains("className={`${styles.root} m-1 p-2`}"));

        let fewer = edit_class_name(&added, "p", "root m-1 p-2", "root p-2").unwrap();
        assert!(fewer.contains("className={`${styles.root} p-2`}"));
        let more = edit_class_name(&fewer, "p", "root p-2", "root p-2 gap-4").unwrap();
        assert!(more.contains("className={`${styles.root} p-2 gap-4`}"));

        let back = edit_class_name(&fewer, "p", "root p-2", "root").unwrap();
        assert_eq!(back, src);
        // classes from the expression itself stay out of reach
        assert!(edit_class_name(&added, "p", "root m-1 p-2", "m-1 p-2").is_err());
    }

    #[test]
    fn test_style_prop_created_and_dropped_exactly() {
        let src = r#"const x = <div data-oid="d">hi</div>;"#;
        let set = edit_style_property(src, "d", "background-color", "red").unwrap();
        assert_eq!(set, r#"const x = <div data-oid="d" style={{ backgroundColor: 'red' }}>hi</div>;"#);
        let more = edit_style_property(&set, "d", "width", "10px").unwrap();
        assert!(more.contains("{{ backgroundColor: 'red', width: '10px' }}"));
        let less = edit_style_property(&more, "d", "width", "").unwrap();
        assert_eq!(less, set);
        let none = edit_style_property(&less, "d", "background-color", "").unwrap();
        assert_eq!(none, src);
    }

    #[test]
    fn test_style_update_keeps_quote_style() {
        let src = r#"const x = <div style={{ color: "red", margin: 0 }} data-oid="d" />;"#;
        let out = edit_style_property(src, "d", "color", "blue").unwrap();
        assert_eq!(out, r#"const x = <div style={{ color: "blue", margin: 0 }} data-oid="d" />;"#);
    }

    #[test]
    fn test_text_keeps_surrounding_whitespace() {
        let src = "const x = (\n  <h1 data-oid=\"t\">\n    Hello\n  </h1>\n);";
        let out = edit_text(src, "t", "Hello", "Goodbye").unwrap();
        assert_eq!(out, "const x = (\n  <h1 data-oid=\"t\">\n    Goodbye\n  </h1>\n);");
        let escaped = edit_text(&out, "t", "Goodbye", "a < b").unwrap();
        assert!(escaped.contains(r#"{"a < b"}"#));
        let back = edit_text(&escaped, "t", "a < b", "Goodbye").unwrap();
        assert_eq!(back, out);
    }

    #[test]
    fn test_text_in_mixed_content() {
        let src = r#"const x = <p data-oid="p">Hello <b>world</b></p>;"#;
        let out = edit_text(src, "p", "Hello", "Hi").unwrap();
        assert_eq!(out, r#"const x = <p data-oid="p">Hi <b>world</b></p>;"#);
    }

    #[test]
    fn test_move_round_trip() {
        let moved = move_element(LIST, "c", 0).unwrap();
        assert_eq!(order(&moved), vec!["c", "a", "b"]);
        let back = move_element(&moved, "c", 2).unwrap();
        assert_eq!(back, LIST);

        let mid = move_element(LIST, "a", 1).unwrap();
        assert_eq!(order(&mid), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_remove_then_insert_restores_text() {
        let (removed, code) = remove_element(LIST, "b").unwrap();
        assert_eq!(code, r#"<li data-oid="b">B</li>"#);
        assert_eq!(order(&removed), vec!["a", "c"]);
        let restored = insert_element(&removed, "list", Some(1), &code).unwrap();
        assert_eq!(restored, LIST);

        let (removed, code) = remove_element(LIST, "c").unwrap();
        assert_eq!(insert_element(&removed, "list", None, &code).unwrap(), LIST);
    }

    #[test]
    fn test_insert_generated_element() {
        let el = ActionElement::new("span")
            .with_attribute("class", "x")
            .with_style("font-size", "12px")
            .with_text("new");
        let code = element_to_jsx(&el);
        assert_eq!(
            code,
            format!(
                "<span className=\"x\" data-oid=\"{}\" style={{{{ fontSize: '12px' }}}}>new</span>",
                el.oid
            )
        );
        let out = insert_element(LIST, "list", Some(0), &code).unwrap();
        let roots = jsx::parse_document(&out).unwrap();
        let list = jsx::locate(&roots, "list").unwrap().element;
        assert_eq!(list.children.len(), 4);
        assert_eq!(list.children[0].tag_name, "span");
    }

    #[test]
    fn test_insert_into_self_closing_parent() {
        let src = r#"const x = <div data-oid="d" />;"#;
        let out = insert_element(src, "d", None, "<b />").unwrap();
        assert_eq!(out, r#"const x = <div data-oid="d"><b /></div>;"#);
    }

    #[test]
    fn test_group_ungroup_round_trip() {
        let container = ActionElement::new("div");
        let grouped = group_elements(LIST, &["a", "b"], &container).unwrap();
        let roots = jsx::parse_document(&grouped).unwrap();
        let list = jsx::locate(&roots, "list").unwrap().element;
        assert_eq!(list.children.len(), 2);
        assert_eq!(list.children[0].oid(), Some(container.oid.as_str()));
        assert_eq!(list.children[0].children.len(), 2);

        let back = ungroup_element(&grouped, container.oid.as_str(), &["a", "b"], None).unwrap();
        assert_eq!(back, LIST);
    }

    #[test]
    fn test_group_non_contiguous_restores_positions() {
        let container = ActionElement::new("div");
        let grouped = group_elements(LIST, &["c", "a"], &container).unwrap();
        let roots = jsx::parse_document(&grouped).unwrap();
        let list = jsx::locate(&roots, "list").unwrap().element;
        assert_eq!(list.children.len(), 2);
        assert_eq!(list.children[1].oid(), Some("b"));

        let back =
            ungroup_element(&grouped, container.oid.as_str(), &["a", "c"], Some(&[0, 2])).unwrap();
        assert_eq!(back, LIST);
    }

    #[test]
    fn test_missing_oid_is_anchor_error() {
        let err = move_element(LIST, "zzz", 0).unwrap_err();
        assert!(matches!(err, DiffError::AnchorMissing { .. }));
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("background-color"), "backgroundColor");
        assert_eq!(camel_case("color"), "color");
        assert_eq!(camel_case("--brand"), "--brand");
        assert_eq!(camel_case("-webkit-box"), "WebkitBox");
    }
}
