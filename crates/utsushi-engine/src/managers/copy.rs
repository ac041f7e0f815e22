//! Copy, paste, cut, duplicate and delete.
//!
//! Pasted elements are re-minted: every node gets a fresh dom id and oid and
//! is marked as inserted, so a paste never collides with what was copied.

use parking_lot::Mutex;
use tracing::debug;
use utsushi_types::{
    Action, ActionElement, DeleteElementAction, EditorError, InsertElementAction,
    InsertLocation, LiveElement, Result,
};

use crate::runner::ActionRunner;
use crate::selection::Selection;

#[derive(Debug)]
pub struct CopyManager {
    runner: ActionRunner,
    clipboard: Mutex<Vec<ActionElement>>,
}

impl CopyManager {
    pub fn new(runner: ActionRunner) -> Self {
        Self {
            runner,
            clipboard: Mutex::new(Vec::new()),
        }
    }

    /// What a paste would insert.
    pub fn clipboard(&self) -> Vec<ActionElement> {
        self.clipboard.lock().clone()
    }

    async fn snapshot(&self, selection: &Selection) -> Result<Vec<ActionElement>> {
        let Some(frame) = selection.frame_id()? else {
            return Ok(Vec::new());
        };
        let adapter = self.runner.session().adapter(&frame)?;
        let mut out = Vec::with_capacity(selection.len());
        for el in selection.elements() {
            out.push(adapter.snapshot(&el.to_target()).await?);
        }
        Ok(out)
    }

    /// Put snapshots of the selection on the clipboard. Returns how many.
    pub async fn copy(&self, selection: &Selection) -> Result<usize> {
        let copied = self.snapshot(selection).await?;
        let n = copied.len();
        *self.clipboard.lock() = copied;
        debug!(elements = n, "copied");
        Ok(n)
    }

    /// Insert the clipboard after each selected element, as one undo step.
    pub async fn paste(&self, selection: &Selection) -> Result<Vec<Action>> {
        let clipboard = self.clipboard();
        if clipboard.is_empty() {
            return Ok(Vec::new());
        }
        let placements = selection
            .elements()
            .iter()
            .map(|el| (el, clipboard.clone()))
            .collect();
        self.paste_after(selection, placements).await
    }

    /// Insert each element group right after its anchor.
    ///
    /// Anchors are re-resolved and handled from the highest sibling index
    /// down, so an insert never shifts an anchor still waiting its turn.
    async fn paste_after(
        &self,
        selection: &Selection,
        placements: Vec<(&LiveElement, Vec<ActionElement>)>,
    ) -> Result<Vec<Action>> {
        if placements.is_empty() {
            return Err(EditorError::invalid_action("select where to paste"));
        }
        let Some(frame) = selection.frame_id()? else {
            return Ok(Vec::new());
        };
        let adapter = self.runner.session().adapter(&frame)?;

        let mut anchored = Vec::with_capacity(placements.len());
        for (el, elements) in placements {
            anchored.push((adapter.resolve(&el.to_target()).await?, elements));
        }
        anchored.sort_by_key(|(anchor, _)| std::cmp::Reverse(anchor.index));

        let mut actions = Vec::new();
        for (anchor, elements) in &anchored {
            for (k, copied) in elements.iter().enumerate() {
                let (parent, location) = match &anchor.parent {
                    Some(parent) => (
                        parent.clone(),
                        InsertLocation::at(&parent.dom_id, anchor.index + 1 + k),
                    ),
                    // pasting onto the root appends inside it
                    None => {
                        let root = anchor.to_target();
                        let location = InsertLocation::append(&root.dom_id);
                        (root, location)
                    }
                };
                actions.push(Action::InsertElement(InsertElementAction {
                    targets: vec![parent],
                    element: copied.remint(),
                    location,
                    code_block: None,
                }));
            }
        }
        debug!(anchors = anchored.len(), inserts = actions.len(), "pasting");
        self.runner.run_all(actions).await
    }

    /// Copy, then delete.
    pub async fn cut(&self, selection: &Selection) -> Result<Vec<Action>> {
        self.copy(selection).await?;
        self.delete(selection).await
    }

    /// Paste a copy of each selected element right after it. The clipboard
    /// is untouched.
    pub async fn duplicate(&self, selection: &Selection) -> Result<Vec<Action>> {
        if selection.is_empty() {
            return Ok(Vec::new());
        }
        let copies = self.snapshot(selection).await?;
        let placements = selection
            .elements()
            .iter()
            .zip(copies)
            .map(|(el, copy)| (el, vec![copy]))
            .collect();
        self.paste_after(selection, placements).await
    }

    /// Remove the selection, as one undo step. The source text of each
    /// removed element is captured so undo restores it verbatim.
    pub async fn delete(&self, selection: &Selection) -> Result<Vec<Action>> {
        let snapshots = self.snapshot(selection).await?;
        let actions = selection
            .elements()
            .iter()
            .zip(snapshots)
            .map(|(el, removed)| delete_action(el, removed))
            .collect::<Result<Vec<_>>>()?;
        self.runner.run_all(actions).await
    }
}

fn delete_action(el: &LiveElement, removed: ActionElement) -> Result<Action> {
    let parent = el
        .parent
        .clone()
        .ok_or_else(|| EditorError::invalid_action("the root element cannot be deleted"))?;
    Ok(Action::DeleteElement(DeleteElementAction {
        location: InsertLocation::at(&parent.dom_id, el.index),
        targets: vec![parent],
        removed_element: removed,
        code_block: None,
    }))
}
