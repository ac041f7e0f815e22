//! Code Diff Applier.
//!
//! Resolves a proposed change against a file's *current* text and returns
//! the new text, or a structured failure. Three forms are accepted:
//!
//! ```text
//! full replacement        the whole proposed text, no markers
//!
//! search/replace blocks   <<<<<<< SEARCH
//!                         old lines
//!                         =======
//!                         new lines
//!                         >>>>>>> REPLACE
//!
//! oid blocks              <<<<<<< OID a1b2c3
//!                         <div data-oid="a1b2c3">replacement</div>
//!                         >>>>>>> END
//! ```
//!
//! Search blocks are located by exact unique match, then ignoring blank
//! lines, then ignoring per-line indentation (re-indenting the replacement).
//! No match, or more than one, is `AnchorMissing`: a patch never lands
//! somewhere it was not computed for. Oid blocks address the JSX node by
//! identity, so they survive offset shifts from concurrent edits.
//!
//! Every result passes the [`SyntaxCheck`] before it is returned.

use std::sync::Arc;

use crate::codegen::{self, splice};
use crate::error::DiffError;
use crate::jsx;

const SEARCH: &str = "<<<<<<< SEARCH";
const DIVIDER: &str = "=======";
const REPLACE: &str = ">>>>>>> REPLACE";
const OID_START: &str = "<<<<<<< OID";
const OID_END: &str = ">>>>>>> END";

/// Parse check run on every edited file before it is written.
pub trait SyntaxCheck: Send + Sync {
    fn check(&self, path: &str, content: &str) -> Result<(), DiffError>;
}

/// Parses script files as TSX; other files pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsxSyntaxCheck;

impl SyntaxCheck for JsxSyntaxCheck {
    fn check(&self, path: &str, content: &str) -> Result<(), DiffError> {
        if !is_script(path) {
            return Ok(());
        }
        jsx::check(content).map_err(DiffError::from)
    }
}

fn is_script(path: &str) -> bool {
    match path.rsplit_once('.') {
        Some((_, ext)) => matches!(ext, "jsx" | "tsx" | "js" | "ts" | "mjs" | "cjs"),
        None => true,
    }
}

/// One parsed search/replace block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReplace {
    pub search: String,
    pub replace: String,
}

/// One parsed oid block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidBlock {
    pub oid: String,
    pub body: String,
}

/// A proposed change, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposedChange {
    Replace(String),
    SearchReplace(Vec<SearchReplace>),
    Oid(Vec<OidBlock>),
}

impl ProposedChange {
    pub fn parse(proposed: &str) -> Result<Self, DiffError> {
        if proposed.lines().any(|l| l.trim_end() == SEARCH) {
            return parse_search_replace(proposed).map(ProposedChange::SearchReplace);
        }
        if proposed.lines().any(|l| l.starts_with(OID_START)) {
            return parse_oid_blocks(proposed).map(ProposedChange::Oid);
        }
        Ok(ProposedChange::Replace(proposed.to_string()))
    }
}

fn join_lines(lines: &[&str]) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn parse_search_replace(proposed: &str) -> Result<Vec<SearchReplace>, DiffError> {
    enum State {
        Outside,
        Search,
        Replace,
    }
    let mut blocks = Vec::new();
    let mut state = State::Outside;
    let mut search: Vec<&str> = Vec::new();
    let mut replace: Vec<&str> = Vec::new();

    for (n, line) in proposed.lines().enumerate() {
        let marker = line.trim_end();
        match state {
            State::Outside if marker == SEARCH => state = State::Search,
            State::Outside => {}
            State::Search if marker == DIVIDER => state = State::Replace,
            State::Search if marker == REPLACE || marker == SEARCH => {
                return Err(DiffError::malformed(format!("line {}: expected {DIVIDER}", n + 1)));
            }
            State::Search => search.push(line),
            State::Replace if marker == REPLACE => {
                blocks.push(SearchReplace {
                    search: join_lines(&search),
                    replace: join_lines(&replace),
                });
                search.clear();
                replace.clear();
                state = State::Outside;
            }
            State::Replace if marker == SEARCH || marker == DIVIDER => {
                return Err(DiffError::malformed(format!("line {}: expected {REPLACE}", n + 1)));
            }
            State::Replace => replace.push(line),
        }
    }
    if !matches!(state, State::Outside) {
        return Err(DiffError::malformed("unterminated search/replace block"));
    }
    Ok(blocks)
}

fn parse_oid_blocks(proposed: &str) -> Result<Vec<OidBlock>, DiffError> {
    let mut blocks = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;
    for (n, line) in proposed.lines().enumerate() {
        match current.as_mut() {
            None => {
                if let Some(rest) = line.strip_prefix(OID_START) {
                    let oid = rest.trim();
                    if oid.is_empty() {
                        return Err(DiffError::malformed(format!("line {}: missing oid", n + 1)));
                    }
                    current = Some((oid.to_string(), Vec::new()));
                }
            }
            Some(_) if line.trim_end() == OID_END => {
                if let Some((oid, body)) = current.take() {
                    blocks.push(OidBlock {
                        oid,
                        body: body.join("\n"),
                    });
                }
            }
            Some((_, body)) => body.push(line),
        }
    }
    if current.is_some() {
        return Err(DiffError::malformed("unterminated oid block"));
    }
    Ok(blocks)
}

/// Short single-line form of an anchor for error messages.
pub(crate) fn preview(anchor: &str) -> String {
    let line = anchor.lines().find(|l| !l.trim().is_empty()).unwrap_or_default().trim();
    if line.chars().count() > 60 {
        format!("{}…", line.chars().take(60).collect::<String>())
    } else {
        line.to_string()
    }
}

// ============================================================================
// Block resolution
// ============================================================================

struct Line<'a> {
    start: usize,
    text: &'a str,
    end: usize,
}

fn split_lines(text: &str) -> Vec<Line<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    for piece in text.split_inclusive('\n') {
        let end = start + piece.len();
        out.push(Line {
            start,
            text: piece.trim_end_matches(['\n', '\r']),
            end,
        });
        start = end;
    }
    out
}

/// A unique line-wise match: byte range covering whole lines, plus the index
/// of the first matched line.
fn line_match(
    text: &str,
    search: &str,
    eq: impl Fn(&str, &str) -> bool,
) -> Result<Option<(std::ops::Range<usize>, usize)>, DiffError> {
    let lines = split_lines(text);
    let needle: Vec<&str> = search.lines().filter(|l| !l.trim().is_empty()).collect();
    if needle.is_empty() {
        return Ok(None);
    }

    let mut matches = Vec::new();
    for i in 0..lines.len() {
        if lines[i].text.trim().is_empty() || !eq(lines[i].text, needle[0]) {
            continue;
        }
        let (mut k, mut j, mut last) = (1, i + 1, i);
        while k < needle.len() && j < lines.len() {
            if lines[j].text.trim().is_empty() {
                j += 1;
                continue;
            }
            if !eq(lines[j].text, needle[k]) {
                break;
            }
            last = j;
            k += 1;
            j += 1;
        }
        if k == needle.len() {
            matches.push((lines[i].start..lines[last].end, i));
        }
    }

    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        n => Err(DiffError::anchor(preview(search), format!("matched {n} times"))),
    }
}

fn leading_ws(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

fn with_line_ending(replace: &str, range_text: &str) -> String {
    if range_text.ends_with('\n') && !replace.is_empty() && !replace.ends_with('\n') {
        format!("{replace}\n")
    } else {
        replace.to_string()
    }
}

fn apply_search_replace(text: &str, block: &SearchReplace) -> Result<String, DiffError> {
    let SearchReplace { search, replace } = block;
    if search.trim().is_empty() {
        if text.trim().is_empty() {
            return Ok(replace.clone());
        }
        return Err(DiffError::anchor("", "empty search block against a non-empty file"));
    }

    // Exact, with and without the trailing newline the block format adds.
    for (needle, with) in [
        (search.as_str(), replace.as_str()),
        (search.trim_end_matches('\n'), replace.trim_end_matches('\n')),
    ] {
        match text.matches(needle).count() {
            0 => {}
            1 => return Ok(text.replacen(needle, with, 1)),
            n => return Err(DiffError::anchor(preview(search), format!("matched {n} times"))),
        }
    }

    // Blank lines ignored.
    if let Some((range, _)) = line_match(text, search, |a, b| a == b)? {
        let with = with_line_ending(replace, &text[range.clone()]);
        return Ok(splice(text, range, &with));
    }

    // Indentation ignored; the replacement is re-indented to where it lands.
    if let Some((range, first)) = line_match(text, search, |a, b| a.trim() == b.trim())? {
        let found_indent = leading_ws(split_lines(text)[first].text);
        let search_indent = search
            .lines()
            .find(|l| !l.trim().is_empty())
            .map(leading_ws)
            .unwrap_or_default();
        let reindented: Vec<String> = replace
            .lines()
            .map(|l| {
                if l.trim().is_empty() {
                    String::new()
                } else {
                    let rest = l.strip_prefix(search_indent).unwrap_or_else(|| l.trim_start());
                    format!("{found_indent}{rest}")
                }
            })
            .collect();
        let with = with_line_ending(&reindented.join("\n"), &text[range.clone()]);
        return Ok(splice(text, range, &with));
    }

    Err(DiffError::anchor(preview(search), "not found"))
}

fn apply_oid_block(text: &str, block: &OidBlock) -> Result<String, DiffError> {
    if block.body.trim().is_empty() {
        return codegen::remove_element(text, &block.oid).map(|(out, _)| out);
    }
    let roots = jsx::parse_document(text)?;
    let el = jsx::locate(&roots, &block.oid)
        .ok_or_else(|| DiffError::anchor(&block.oid, "no element with this oid"))?
        .element;
    Ok(splice(text, el.span(), block.body.trim_end_matches('\n')))
}

/// Apply a whole-file change recorded as `(original, generated)`. The file
/// must still be `original`, or contain it exactly once.
pub fn apply_code_diff(current: &str, original: &str, generated: &str) -> Result<String, DiffError> {
    if current == original {
        return Ok(generated.to_string());
    }
    if original.is_empty() {
        return Err(DiffError::anchor("", "file changed since the diff was computed"));
    }
    match current.matches(original).count() {
        1 => Ok(current.replacen(original, generated, 1)),
        0 => Err(DiffError::anchor(preview(original), "not found")),
        n => Err(DiffError::anchor(preview(original), format!("matched {n} times"))),
    }
}

// ============================================================================
// DiffApplier
// ============================================================================

/// Applies proposed changes and validates the result.
#[derive(Clone)]
pub struct DiffApplier {
    checker: Arc<dyn SyntaxCheck>,
}

impl Default for DiffApplier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DiffApplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffApplier").finish_non_exhaustive()
    }
}

impl DiffApplier {
    pub fn new() -> Self {
        Self {
            checker: Arc::new(JsxSyntaxCheck),
        }
    }

    pub fn with_syntax_check(mut self, checker: Arc<dyn SyntaxCheck>) -> Self {
        self.checker = checker;
        self
    }

    pub fn checker(&self) -> &Arc<dyn SyntaxCheck> {
        &self.checker
    }

    /// Resolve `proposed` against `current` (the file at `path`).
    pub fn apply(&self, path: &str, current: &str, proposed: &str) -> Result<String, DiffError> {
        let text = match ProposedChange::parse(proposed)? {
            ProposedChange::Replace(text) => text,
            ProposedChange::SearchReplace(blocks) => {
                if blocks.is_empty() {
                    return Err(DiffError::malformed("no search/replace blocks"));
                }
                let mut text = current.to_string();
                for block in &blocks {
                    text = apply_search_replace(&text, block)?;
                }
                text
            }
            ProposedChange::Oid(blocks) => {
                let mut text = current.to_string();
                for block in &blocks {
                    text = apply_oid_block(&text, block)?;
                }
                text
            }
        };
        self.checker.check(path, &text)?;
        Ok(text)
    }
}

/// Apply a proposed change with the default syntax check.
pub fn apply_diff(original: &str, proposed: &str) -> Result<String, DiffError> {
    DiffApplier::new().apply("", original, proposed)
}
