//! Undo/redo history with transactions.
//!
//! ```text
//!   idle ──start_transaction──▶ open ──commit_transaction──▶ idle
//!                               │  ▲
//!                               └──┘ push: coalesce into the newest
//!                                    compatible action, else append
//! ```
//!
//! An entry is one undo step and may hold several actions: a transaction
//! whose actions did not coalesce, or a multi-target edit split per target.
//! Undo runs the inverses in reverse order; redo runs the actions forward.
//!
//! Entries whose rollback failed are marked inconsistent and leave both
//! stacks for good.

use std::collections::VecDeque;

use strum::Display;
use tracing::{debug, warn};
use utsushi_types::{Action, EditorError, Result};
use uuid::Uuid;

/// Where an entry stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum EntryStatus {
    Applied,
    Reverted,
    /// Surface and source may have diverged; never replayed.
    Inconsistent,
}

/// One undo step.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub actions: Vec<Action>,
    pub status: EntryStatus,
}

impl HistoryEntry {
    pub fn new(actions: Vec<Action>) -> Self {
        Self {
            id: Uuid::now_v7(),
            actions,
            status: EntryStatus::Applied,
        }
    }

    /// The actions that undo this entry, in the order to run them.
    pub fn inverse(&self) -> Vec<Action> {
        self.actions.iter().rev().map(Action::inverse).collect()
    }
}

/// Linear undo/redo log.
#[derive(Debug)]
pub struct HistoryManager {
    undo: VecDeque<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    inconsistent: Vec<HistoryEntry>,
    open: Vec<Action>,
    depth: usize,
    limit: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(100)
    }
}

impl HistoryManager {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            inconsistent: Vec::new(),
            open: Vec::new(),
            depth: 0,
            limit: limit.max(1),
        }
    }

    pub fn is_transaction_open(&self) -> bool {
        self.depth > 0
    }

    /// Begin coalescing. Transactions nest; only the outermost commit closes.
    pub fn start_transaction(&mut self) {
        self.depth += 1;
        debug!(depth = self.depth, "transaction started");
    }

    /// Close one level. Returns the finished actions when the outermost
    /// transaction closes; they are not recorded until [`record`](Self::record).
    pub fn commit_transaction(&mut self) -> Result<Option<Vec<Action>>> {
        if self.depth == 0 {
            return Err(EditorError::invalid_action("no transaction is open"));
        }
        self.depth -= 1;
        if self.depth > 0 {
            return Ok(None);
        }
        Ok(Some(std::mem::take(&mut self.open)))
    }

    /// Drop the open transaction entirely, returning what it held.
    pub fn abort_transaction(&mut self) -> Vec<Action> {
        self.depth = 0;
        std::mem::take(&mut self.open)
    }

    /// Actions gathered by the open transaction so far.
    pub fn pending(&self) -> &[Action] {
        &self.open
    }

    /// Add an applied action: folded into the open transaction, or recorded
    /// as its own entry.
    pub fn push(&mut self, action: Action) {
        if self.is_transaction_open() {
            // fold into the newest compatible action, unless an incompatible
            // action on the same elements came after it
            let slot = self
                .open
                .iter_mut()
                .rev()
                .find(|a| a.can_coalesce(&action) || shares_target(a, &action));
            let folded = match slot {
                Some(earlier) => earlier.coalesce(&action),
                None => false,
            };
            if !folded {
                self.open.push(action);
            }
            return;
        }
        self.record(vec![action]);
    }

    /// Record one undo step. Clears redo. Steps that change nothing are skipped.
    pub fn record(&mut self, actions: Vec<Action>) {
        let actions: Vec<Action> = actions.into_iter().filter(|a| !a.is_noop()).collect();
        if actions.is_empty() {
            return;
        }
        self.redo.clear();
        self.undo.push_back(HistoryEntry::new(actions));
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
    }

    /// Record a step whose rollback failed.
    pub fn record_inconsistent(&mut self, actions: Vec<Action>) {
        let mut entry = HistoryEntry::new(actions);
        entry.status = EntryStatus::Inconsistent;
        warn!(entry = %entry.id, "history entry marked inconsistent");
        self.inconsistent.push(entry);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Newest entry on the undo stack.
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.undo.back()
    }

    pub fn inconsistent(&self) -> &[HistoryEntry] {
        &self.inconsistent
    }

    pub fn pop_undo(&mut self) -> Option<HistoryEntry> {
        self.undo.pop_back()
    }

    pub fn pop_redo(&mut self) -> Option<HistoryEntry> {
        self.redo.pop()
    }

    /// Put an entry back after it was undone.
    pub fn push_redo(&mut self, mut entry: HistoryEntry) {
        entry.status = EntryStatus::Reverted;
        self.redo.push(entry);
    }

    /// Put an entry back after it was redone, or after a failed undo left it
    /// applied. Keeps the redo stack.
    pub fn push_undo(&mut self, mut entry: HistoryEntry) {
        entry.status = EntryStatus::Applied;
        self.undo.push_back(entry);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
    }

    /// Take an entry out of circulation.
    pub fn mark_inconsistent(&mut self, mut entry: HistoryEntry) {
        entry.status = EntryStatus::Inconsistent;
        warn!(entry = %entry.id, "history entry marked inconsistent");
        self.inconsistent.push(entry);
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.open.clear();
        self.depth = 0;
    }
}

fn shares_target(a: &Action, b: &Action) -> bool {
    let theirs = b.targets();
    a.targets().iter().any(|t| theirs.contains(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use utsushi_types::{ActionTarget, DomId, EditStyleAction, FrameId, MoveElementAction, Oid};

    fn target(dom: &str) -> ActionTarget {
        ActionTarget::new(FrameId::from("f1"), DomId::from(dom), Some(Oid::from(dom)))
    }

    fn style(dom: &str, from: &str, to: &str) -> Action {
        Action::EditStyle(EditStyleAction {
            targets: vec![target(dom)],
            style_key: "width".into(),
            original_value: from.into(),
            new_value: to.into(),
        })
    }

    fn moved(from: usize, to: usize) -> Action {
        Action::MoveElement(MoveElementAction {
            target: target("m"),
            original_index: from,
            new_index: to,
        })
    }

    #[test]
    fn test_transaction_coalesces_to_one_entry() {
        let mut history = HistoryManager::default();
        history.start_transaction();
        for (from, to) in [("", "10px"), ("10px", "11px"), ("11px", "12px")] {
            history.push(style("a", from, to));
        }
        let actions = history.commit_transaction().unwrap().unwrap();
        history.record(actions);

        assert_eq!(history.undo_len(), 1);
        let entry = history.last().unwrap();
        assert_eq!(entry.actions, vec![style("a", "", "12px")]);
    }

    #[test]
    fn test_incompatible_actions_share_one_entry() {
        let mut history = HistoryManager::default();
        history.start_transaction();
        history.push(style("a", "1px", "2px"));
        history.push(style("b", "5px", "6px"));
        history.push(style("b", "6px", "7px"));
        let actions = history.commit_transaction().unwrap().unwrap();
        history.record(actions);

        let entry = history.last().unwrap();
        assert_eq!(entry.actions.len(), 2);
        assert_eq!(
            entry.inverse(),
            vec![style("b", "7px", "5px"), style("a", "2px", "1px")]
        );
    }

    #[test]
    fn test_interleaved_streams_fold_per_target() {
        let mut history = HistoryManager::default();
        history.start_transaction();
        for i in 1..=3 {
            history.push(style("a", &format!("{}px", i - 1), &format!("{i}px")));
            history.push(style("b", &format!("{}px", i + 9), &format!("{}px", i + 10)));
        }
        let actions = history.commit_transaction().unwrap().unwrap();
        assert_eq!(actions, vec![style("a", "0px", "3px"), style("b", "10px", "13px")]);
    }

    #[test]
    fn test_fold_stops_at_conflicting_action() {
        let mut history = HistoryManager::default();
        history.start_transaction();
        history.push(moved(0, 1));
        history.push(Action::EditStyle(EditStyleAction {
            targets: vec![target("m")],
            style_key: "width".into(),
            original_value: "1px".into(),
            new_value: "2px".into(),
        }));
        history.push(moved(1, 2));
        let actions = history.commit_transaction().unwrap().unwrap();
        assert_eq!(actions.len(), 3);
    }

    #[test]
    fn test_nested_transactions() {
        let mut history = HistoryManager::default();
        history.start_transaction();
        history.start_transaction();
        history.push(moved(0, 1));
        assert_eq!(history.commit_transaction().unwrap(), None);
        assert!(history.is_transaction_open());
        history.push(moved(1, 2));
        let actions = history.commit_transaction().unwrap().unwrap();
        assert_eq!(actions, vec![moved(0, 2)]);
        assert!(history.commit_transaction().is_err());
    }

    #[test]
    fn test_new_action_clears_redo() {
        let mut history = HistoryManager::default();
        history.push(moved(0, 1));
        history.push(moved(1, 2));
        let entry = history.pop_undo().unwrap();
        history.push_redo(entry);
        assert!(history.can_redo());

        history.push(moved(5, 6));
        assert!(!history.can_redo());
        assert_eq!(history.undo_len(), 2);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = HistoryManager::new(2);
        for i in 0..4 {
            history.push(moved(i, i + 1));
        }
        assert_eq!(history.undo_len(), 2);
        assert_eq!(history.pop_undo().unwrap().actions, vec![moved(3, 4)]);
        assert_eq!(history.pop_undo().unwrap().actions, vec![moved(2, 3)]);
    }

    #[test]
    fn test_noop_steps_are_skipped() {
        let mut history = HistoryManager::default();
        history.start_transaction();
        history.push(style("a", "1px", "2px"));
        history.push(style("a", "2px", "1px"));
        let actions = history.commit_transaction().unwrap().unwrap();
        history.record(actions);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_inconsistent_entries_leave_the_stacks() {
        let mut history = HistoryManager::default();
        history.push(moved(0, 1));
        let entry = history.pop_undo().unwrap();
        history.mark_inconsistent(entry);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.inconsistent()[0].status, EntryStatus::Inconsistent);
    }
}
