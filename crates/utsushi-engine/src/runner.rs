//! Action Runner: one path for forward actions, undo and redo.
//!
//! ```text
//!   run(action)
//!     validate ─▶ surface (locked per frame) ─▶ source ─▶ history
//!                      ▲                          │ fails
//!                      └──── inverse on surface ◀─┘
//!                            (fails too: RollbackFailed, entry inconsistent)
//! ```
//!
//! Inside a transaction the surface is updated per action but source
//! writes wait for the commit, which writes the coalesced actions once.
//! Undo and redo replay inverses (or originals) through the same path.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use utsushi_types::{Action, EditorError, ErrorKind, Result};

use crate::history::HistoryEntry;
use crate::session::EditorSession;

/// Applies actions to surfaces and sources, keeping them consistent.
#[derive(Debug, Clone)]
pub struct ActionRunner {
    session: Arc<EditorSession>,
}

impl ActionRunner {
    pub fn new(session: Arc<EditorSession>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<EditorSession> {
        &self.session
    }

    // ========================================================================
    // Forward
    // ========================================================================

    /// Apply `action` and record it. Returns the action as recorded.
    pub async fn run(&self, action: Action) -> Result<Action> {
        action.validate()?;
        if action.is_noop() {
            debug!(kind = %action.kind(), "no-op action dropped");
            return Ok(action);
        }

        let deferred = self.session.history().is_transaction_open();
        let recorded = if deferred {
            self.apply_surface(&action).await?
        } else {
            match self.apply(&action).await {
                Ok(recorded) => recorded,
                Err(e) => {
                    if e.kind() == ErrorKind::RollbackFailed {
                        self.session.history().record_inconsistent(vec![action]);
                    }
                    return Err(e);
                }
            }
        };

        self.session.history().push(recorded.clone());
        info!(kind = %recorded.kind(), deferred, "action applied");
        Ok(recorded)
    }

    /// Run several actions as one undo step. A failure aborts the
    /// transaction, including any outer one it was nested in.
    pub async fn run_all(&self, actions: Vec<Action>) -> Result<Vec<Action>> {
        if actions.len() == 1 {
            let mut actions = actions;
            return Ok(vec![self.run(actions.remove(0)).await?]);
        }
        self.start_transaction();
        let mut recorded = Vec::with_capacity(actions.len());
        for action in actions {
            match self.run(action).await {
                Ok(done) => recorded.push(done),
                Err(e) => {
                    if let Err(abort) = self.abort_transaction().await {
                        warn!(error = %abort, "aborting the batch left the surface changed");
                    }
                    return Err(e);
                }
            }
        }
        self.commit_transaction().await?;
        Ok(recorded)
    }

    /// Surface, then source; the surface is compensated if the source fails.
    async fn apply(&self, action: &Action) -> Result<Action> {
        let applied = self.apply_surface(action).await?;
        match self.session.source().apply(&applied).await {
            Ok(recorded) => Ok(recorded),
            Err(e) => Err(self.compensate(std::slice::from_ref(&applied), e).await),
        }
    }

    async fn apply_surface(&self, action: &Action) -> Result<Action> {
        let Some(frame) = action.frame_id()? else {
            return Ok(action.clone());
        };
        let adapter = self.session.adapter(&frame)?;
        let _guard = self.session.lock_frame(&frame).await?;
        adapter.apply(action).await
    }

    /// Put the surface back from `applied` (oldest first) after `cause`.
    /// Returns the error to report.
    async fn compensate(&self, applied: &[Action], cause: EditorError) -> EditorError {
        warn!(error = %cause, actions = applied.len(), "rolling back surface");
        for action in applied.iter().rev() {
            if let Err(e) = self.apply_surface(&action.inverse()).await {
                error!(error = %e, cause = %cause, "rollback failed, surface and source may have diverged");
                return cause.rollback_failed(e.to_string());
            }
        }
        cause
    }

    /// Apply several actions in order through the full path. If one fails,
    /// the ones before it are undone.
    async fn apply_all(&self, actions: &[Action]) -> Result<Vec<Action>> {
        let mut done: Vec<Action> = Vec::with_capacity(actions.len());
        for action in actions {
            match self.apply(action).await {
                Ok(recorded) => done.push(recorded),
                Err(e) if e.kind() == ErrorKind::RollbackFailed => return Err(e),
                Err(e) => {
                    for earlier in done.iter().rev() {
                        if let Err(undo) = self.apply(&earlier.inverse()).await {
                            error!(error = %undo, "unwinding a partial replay failed");
                            return Err(e.rollback_failed(undo.to_string()));
                        }
                    }
                    return Err(e);
                }
            }
        }
        Ok(done)
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Start coalescing actions into one undo step.
    pub fn start_transaction(&self) {
        self.session.history().start_transaction();
    }

    pub fn is_transaction_open(&self) -> bool {
        self.session.history().is_transaction_open()
    }

    /// Close the transaction: write the coalesced actions to source and
    /// record them as one step. If a write fails, the writes before it are
    /// reverted and the surface is put back.
    pub async fn commit_transaction(&self) -> Result<()> {
        let finished = self.session.history().commit_transaction()?;
        let Some(actions) = finished else {
            return Ok(());
        };

        let mut written: Vec<Action> = Vec::with_capacity(actions.len());
        for action in &actions {
            match self.session.source().apply(action).await {
                Ok(recorded) => written.push(recorded),
                Err(e) => {
                    let e = self.unwind_commit(&written, &actions, e).await;
                    if e.kind() == ErrorKind::RollbackFailed {
                        self.session.history().record_inconsistent(actions);
                    }
                    return Err(e);
                }
            }
        }
        info!(actions = written.len(), "transaction committed");
        self.session.history().record(written);
        Ok(())
    }

    async fn unwind_commit(
        &self,
        written: &[Action],
        applied: &[Action],
        cause: EditorError,
    ) -> EditorError {
        for action in written.iter().rev() {
            if let Err(e) = self.session.source().apply(&action.inverse()).await {
                error!(error = %e, "reverting a committed source write failed");
                return cause.rollback_failed(e.to_string());
            }
        }
        self.compensate(applied, cause).await
    }

    /// Drop the open transaction and put the surface back.
    pub async fn abort_transaction(&self) -> Result<()> {
        let actions = self.session.history().abort_transaction();
        if actions.is_empty() {
            return Ok(());
        }
        for action in actions.iter().rev() {
            self.apply_surface(&action.inverse()).await?;
        }
        debug!(actions = actions.len(), "transaction aborted");
        Ok(())
    }

    // ========================================================================
    // Undo / redo
    // ========================================================================

    fn ensure_idle(&self) -> Result<()> {
        if self.is_transaction_open() {
            return Err(EditorError::invalid_action(
                "commit the open transaction before undo or redo",
            ));
        }
        Ok(())
    }

    /// Undo the newest step. Returns it, or `None` when there is nothing to undo.
    pub async fn undo(&self) -> Result<Option<HistoryEntry>> {
        self.ensure_idle()?;
        let popped = self.session.history().pop_undo();
        let Some(entry) = popped else {
            return Ok(None);
        };
        match self.apply_all(&entry.inverse()).await {
            Ok(_) => {
                info!(entry = %entry.id, "undone");
                self.session.history().push_redo(entry.clone());
                Ok(Some(entry))
            }
            Err(e) => {
                self.settle_failed(entry, &e, true);
                Err(e)
            }
        }
    }

    /// Redo the newest undone step.
    pub async fn redo(&self) -> Result<Option<HistoryEntry>> {
        self.ensure_idle()?;
        let popped = self.session.history().pop_redo();
        let Some(entry) = popped else {
            return Ok(None);
        };
        match self.apply_all(&entry.actions).await {
            Ok(_) => {
                info!(entry = %entry.id, "redone");
                self.session.history().push_undo(entry.clone());
                Ok(Some(entry))
            }
            Err(e) => {
                self.settle_failed(entry, &e, false);
                Err(e)
            }
        }
    }

    /// A failed replay leaves the entry where it was, unless the rollback
    /// failed too.
    fn settle_failed(&self, entry: HistoryEntry, e: &EditorError, was_undo: bool) {
        let mut history = self.session.history();
        if e.kind() == ErrorKind::RollbackFailed {
            history.mark_inconsistent(entry);
        } else if was_undo {
            history.push_undo(entry);
        } else {
            history.push_redo(entry);
        }
    }
}
