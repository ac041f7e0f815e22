//! SourceSync: carries actions into source files.
//!
//! ```text
//!   Action ──▶ plan ──▶ lock paths ──▶ edit in memory ──▶ syntax check ──▶ write
//!               │         (sorted)       (all files)        (all files)      │
//!               ▼                                                           ▼
//!         oid → path index  ◀──────────── rescan written files ◀────────────┘
//! ```
//!
//! Every file an action touches is edited and checked before any of them is
//! written, so a failed edit never leaves one file changed and another not.
//! If a later write fails, files already written are put back.
//!
//! The oid index is a cache: a miss rescans the project once before the
//! oid is reported missing.

use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::{debug, info, warn};
use utsushi_types::{
    Action, ActionElement, ActionTarget, EditorError, InsertLocation, InsertPosition, Oid,
};

use crate::codegen;
use crate::diff::{self, DiffApplier, SyntaxCheck};
use crate::error::{DiffError, SourceError, SourceResult};
use crate::files::SourceFiles;
use crate::jsx;
use crate::queue::WriteQueue;

/// Where an oid's JSX node lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateNode {
    pub path: String,
    pub oid: Oid,
    /// Text of the opening tag.
    pub start_tag: String,
    /// Text of the closing tag; `None` for self-closing elements.
    pub end_tag: Option<String>,
    /// Byte range of the whole element in the file.
    pub span: Range<usize>,
}

/// One edit to one file, derived from an action.
#[derive(Debug, Clone)]
enum SourceEdit {
    ClassName { oid: String, original: String, new: String },
    Style { oid: String, key: String, value: String },
    Text { oid: String, original: String, new: String },
    Move { oid: String, new_index: usize },
    Insert { parent_oid: String, index: Option<usize>, code: String },
    Remove { oid: String },
    Group { child_oids: Vec<String>, container: ActionElement },
    Ungroup { container_oid: String, child_oids: Vec<String>, child_indices: Option<Vec<usize>> },
    Replace { original: String, generated: String },
}

impl SourceEdit {
    /// Apply to one file's text. Returns the new text and, for removals,
    /// the removed code.
    fn apply(&self, src: &str) -> Result<(String, Option<String>), DiffError> {
        let text = match self {
            SourceEdit::ClassName { oid, original, new } => {
                codegen::edit_class_name(src, oid, original, new)?
            }
            SourceEdit::Style { oid, key, value } => {
                codegen::edit_style_property(src, oid, key, value)?
            }
            SourceEdit::Text { oid, original, new } => codegen::edit_text(src, oid, original, new)?,
            SourceEdit::Move { oid, new_index } => codegen::move_element(src, oid, *new_index)?,
            SourceEdit::Insert {
                parent_oid,
                index,
                code,
            } => codegen::insert_element(src, parent_oid, *index, code)?,
            SourceEdit::Remove { oid } => {
                let (text, code) = codegen::remove_element(src, oid)?;
                return Ok((text, Some(code)));
            }
            SourceEdit::Group {
                child_oids,
                container,
            } => {
                let oids: Vec<&str> = child_oids.iter().map(String::as_str).collect();
                codegen::group_elements(src, &oids, container)?
            }
            SourceEdit::Ungroup {
                container_oid,
                child_oids,
                child_indices,
            } => {
                let oids: Vec<&str> = child_oids.iter().map(String::as_str).collect();
                codegen::ungroup_element(src, container_oid, &oids, child_indices.as_deref())?
            }
            SourceEdit::Replace {
                original,
                generated,
            } => diff::apply_code_diff(src, original, generated)?,
        };
        Ok((text, None))
    }

    fn oid(&self) -> Option<&str> {
        match self {
            SourceEdit::ClassName { oid, .. }
            | SourceEdit::Style { oid, .. }
            | SourceEdit::Text { oid, .. }
            | SourceEdit::Move { oid, .. }
            | SourceEdit::Remove { oid } => Some(oid),
            SourceEdit::Insert { parent_oid, .. } => Some(parent_oid),
            SourceEdit::Ungroup { container_oid, .. } => Some(container_oid),
            SourceEdit::Group { .. } | SourceEdit::Replace { .. } => None,
        }
    }
}

/// Edits grouped by file, in first-seen order.
#[derive(Debug, Default)]
struct EditPlan {
    files: Vec<(String, Vec<SourceEdit>)>,
}

impl EditPlan {
    fn push(&mut self, path: String, edit: SourceEdit) {
        match self.files.iter_mut().find(|(p, _)| *p == path) {
            Some((_, edits)) => {
                // one source node rendered many times is edited once
                let dup = edit.oid().is_some()
                    && edits
                        .iter()
                        .any(|e| e.oid() == edit.oid() && same_variant(e, &edit));
                if !dup {
                    edits.push(edit);
                }
            }
            None => self.files.push((path, vec![edit])),
        }
    }

    fn paths(&self) -> Vec<String> {
        self.files.iter().map(|(p, _)| p.clone()).collect()
    }

    fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn same_variant(a: &SourceEdit, b: &SourceEdit) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

fn source_index(location: &InsertLocation) -> Option<usize> {
    match location.position {
        InsertPosition::Append => None,
        InsertPosition::Prepend => Some(0),
        InsertPosition::Index => usize::try_from(location.index).ok(),
    }
}

/// Maps oids to files and writes actions into them.
pub struct SourceSync {
    files: Arc<dyn SourceFiles>,
    queue: WriteQueue,
    /// oid -> path of the file containing it
    index: DashMap<Oid, String>,
    applier: DiffApplier,
}

impl std::fmt::Debug for SourceSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceSync")
            .field("indexed", &self.index.len())
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

impl SourceSync {
    pub fn new(files: Arc<dyn SourceFiles>) -> Self {
        Self {
            files,
            queue: WriteQueue::default(),
            index: DashMap::new(),
            applier: DiffApplier::new(),
        }
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.queue = WriteQueue::new(timeout);
        self
    }

    pub fn with_syntax_check(mut self, checker: Arc<dyn SyntaxCheck>) -> Self {
        self.applier = self.applier.with_syntax_check(checker);
        self
    }

    pub fn files(&self) -> &Arc<dyn SourceFiles> {
        &self.files
    }

    pub fn queue(&self) -> &WriteQueue {
        &self.queue
    }

    // ========================================================================
    // Oid index
    // ========================================================================

    /// Rescan every source file. Returns the number of oids indexed.
    pub async fn rebuild_index(&self) -> SourceResult<usize> {
        self.index.clear();
        for path in self.files.list_source_files().await? {
            if let Some(content) = self.files.get_file_content(&path).await? {
                self.index_file(&path, &content);
            }
        }
        debug!(oids = self.index.len(), "source index rebuilt");
        Ok(self.index.len())
    }

    fn index_file(&self, path: &str, content: &str) {
        self.index.retain(|_, p| p.as_str() != path);
        for oid in jsx::scan_oids(content) {
            self.index.insert(Oid::from(oid), path.to_string());
        }
    }

    /// The file containing `oid`.
    pub async fn path_for(&self, oid: &Oid) -> SourceResult<String> {
        if let Some(path) = self.index.get(oid) {
            return Ok(path.clone());
        }
        self.rebuild_index().await?;
        self.index
            .get(oid)
            .map(|p| p.clone())
            .ok_or_else(|| SourceError::oid_not_found(oid.as_str()))
    }

    /// Locate the JSX node for `oid`.
    pub async fn template_node(&self, oid: &Oid) -> SourceResult<TemplateNode> {
        let path = self.path_for(oid).await?;
        let content = self.files.read_required(&path).await?;
        let roots = jsx::parse_document(&content)
            .map_err(|e| SourceError::diff(&path, DiffError::from(e)))?;
        let el = jsx::locate(&roots, oid.as_str())
            .ok_or_else(|| SourceError::oid_not_found(oid.as_str()))?
            .element;
        Ok(TemplateNode {
            path: path.clone(),
            oid: oid.clone(),
            start_tag: content[el.start..el.open_end].to_string(),
            end_tag: (!el.self_closing).then(|| content[el.close_start..el.end].to_string()),
            span: el.span(),
        })
    }

    /// Exact source text of the node for `oid`.
    pub async fn code_block(&self, oid: &Oid) -> SourceResult<String> {
        let path = self.path_for(oid).await?;
        let content = self.files.read_required(&path).await?;
        codegen::element_code(&content, oid.as_str()).map_err(|e| SourceError::diff(&path, e))
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Run a proposed change (full text, search/replace or oid blocks)
    /// through the diff applier and write the result.
    pub async fn apply_patch(&self, path: &str, proposed: &str) -> SourceResult<String> {
        let _guard = self.queue.lock(path).await?;
        let current = self.files.get_file_content(path).await?.unwrap_or_default();
        let text = self
            .applier
            .apply(path, &current, proposed)
            .map_err(|e| SourceError::diff(path, e))?;
        if text != current {
            self.write(path, &text).await?;
            self.index_file(path, &text);
        }
        info!(path = %path, "patch applied");
        Ok(text)
    }

    async fn write(&self, path: &str, content: &str) -> SourceResult<()> {
        if self.files.write_file_content(path, content).await? {
            Ok(())
        } else {
            Err(SourceError::WriteRejected(path.to_string()))
        }
    }

    /// Write `action` into source. Returns the action with captured source
    /// state filled in (the removed code of a delete, the inserted code of
    /// an insert), which is what history should record.
    pub async fn apply(&self, action: &Action) -> Result<Action, EditorError> {
        let plan = self.plan(action).await?;
        if plan.is_empty() {
            debug!(kind = %action.kind(), "no source-backed targets");
            return Ok(action.clone());
        }

        let _guards = self.queue.lock_all(&plan.paths()).await?;

        // Edit and check everything before writing anything.
        let mut staged: Vec<(String, String, String)> = Vec::with_capacity(plan.files.len());
        let mut captured: Option<String> = None;
        for (path, edits) in &plan.files {
            let current = match self.files.get_file_content(path).await? {
                Some(content) => content,
                None if edits.iter().all(|e| matches!(e, SourceEdit::Replace { .. })) => {
                    String::new()
                }
                None => return Err(SourceError::not_found(path).into()),
            };
            let mut text = current.clone();
            for edit in edits {
                let (next, code) = edit.apply(&text).map_err(|e| e.at(path))?;
                text = next;
                if captured.is_none() {
                    captured = code;
                }
            }
            self.applier
                .checker()
                .check(path, &text)
                .map_err(|e| e.at(path))?;
            if text != current {
                staged.push((path.clone(), current, text));
            }
        }

        let mut written: Vec<(&str, &str)> = Vec::with_capacity(staged.len());
        for (path, original, text) in &staged {
            if let Err(err) = self.write(path, text).await {
                warn!(path = %path, error = %err, "source write failed, restoring");
                self.restore(&written).await;
                return Err(err.into());
            }
            written.push((path.as_str(), original.as_str()));
        }
        for (path, _, text) in &staged {
            self.index_file(path, text);
        }

        info!(kind = %action.kind(), files = staged.len(), "source updated");
        Ok(enrich(action, captured))
    }

    async fn restore(&self, written: &[(&str, &str)]) {
        for (path, original) in written.iter().rev() {
            match self.files.write_file_content(path, original).await {
                Ok(true) => {}
                Ok(false) => warn!(path = %path, "restore write rejected"),
                Err(e) => warn!(path = %path, error = %e, "restore write failed"),
            }
        }
    }

    async fn oid_path(&self, target: &ActionTarget) -> SourceResult<Option<(String, String)>> {
        let Some(oid) = &target.oid else {
            debug!(target = %target, "target has no oid, skipping source edit");
            return Ok(None);
        };
        let path = self.path_for(oid).await?;
        Ok(Some((path, oid.to_string())))
    }

    async fn plan(&self, action: &Action) -> SourceResult<EditPlan> {
        let mut plan = EditPlan::default();
        match action {
            Action::EditStyle(a) => {
                for target in &a.targets {
                    if let Some((path, oid)) = self.oid_path(target).await? {
                        let edit = if a.style_key == "className" {
                            SourceEdit::ClassName {
                                oid,
                                original: a.original_value.clone(),
                                new: a.new_value.clone(),
                            }
                        } else {
                            SourceEdit::Style {
                                oid,
                                key: a.style_key.clone(),
                                value: a.new_value.clone(),
                            }
                        };
                        plan.push(path, edit);
                    }
                }
            }
            Action::EditText(a) => {
                for target in &a.targets {
                    if let Some((path, oid)) = self.oid_path(target).await? {
                        plan.push(
                            path,
                            SourceEdit::Text {
                                oid,
                                original: a.original_content.clone(),
                                new: a.new_content.clone(),
                            },
                        );
                    }
                }
            }
            Action::MoveElement(a) => {
                if let Some((path, oid)) = self.oid_path(&a.target).await? {
                    plan.push(
                        path,
                        SourceEdit::Move {
                            oid,
                            new_index: a.new_index,
                        },
                    );
                }
            }
            Action::InsertElement(a) => {
                let code = a
                    .code_block
                    .clone()
                    .unwrap_or_else(|| codegen::element_to_jsx(&a.element));
                for target in &a.targets {
                    if let Some((path, parent_oid)) = self.oid_path(target).await? {
                        plan.push(
                            path,
                            SourceEdit::Insert {
                                parent_oid,
                                index: source_index(&a.location),
                                code: code.clone(),
                            },
                        );
                    }
                }
            }
            Action::DeleteElement(a) => {
                let oid = &a.removed_element.oid;
                if oid.is_empty() {
                    debug!("removed element has no oid, skipping source edit");
                } else {
                    let path = self.path_for(oid).await?;
                    plan.push(path, SourceEdit::Remove { oid: oid.to_string() });
                }
            }
            Action::GroupElements(a) => {
                let oids: Option<Vec<Oid>> = a.children.iter().map(|c| c.oid.clone()).collect();
                match oids {
                    Some(oids) if !oids.is_empty() => {
                        let path = self.path_for(&oids[0]).await?;
                        plan.push(
                            path,
                            SourceEdit::Group {
                                child_oids: oids.iter().map(Oid::to_string).collect(),
                                container: a.container.clone(),
                            },
                        );
                    }
                    _ => debug!("group children not all source-backed, skipping source edit"),
                }
            }
            Action::UngroupElements(a) => {
                let container_oid = &a.container.oid;
                if container_oid.is_empty() {
                    debug!("container has no oid, skipping source edit");
                } else {
                    let path = self.path_for(container_oid).await?;
                    let child_oids: Option<Vec<String>> = a
                        .children
                        .iter()
                        .map(|c| c.oid.as_ref().map(Oid::to_string))
                        .collect();
                    let (child_oids, child_indices) = match child_oids {
                        Some(oids) => (oids, a.child_indices.clone()),
                        None => (Vec::new(), None),
                    };
                    plan.push(
                        path,
                        SourceEdit::Ungroup {
                            container_oid: container_oid.to_string(),
                            child_oids,
                            child_indices,
                        },
                    );
                }
            }
            Action::WriteCode(a) => {
                for d in &a.diffs {
                    plan.push(
                        d.path.clone(),
                        SourceEdit::Replace {
                            original: d.original.clone(),
                            generated: d.generated.clone(),
                        },
                    );
                }
            }
        }
        Ok(plan)
    }
}

/// Fill captured source state into the action that will be recorded.
fn enrich(action: &Action, captured: Option<String>) -> Action {
    let mut action = action.clone();
    match &mut action {
        Action::DeleteElement(a) if captured.is_some() => a.code_block = captured,
        Action::InsertElement(a) if a.code_block.is_none() => {
            a.code_block = Some(codegen::element_to_jsx(&a.element));
        }
        _ => {}
    }
    action
}
