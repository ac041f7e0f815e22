//! Everything a front end needs, built from one session.

use std::sync::Arc;

use crate::managers::{
    CopyManager, DragManager, GroupManager, InsertManager, StyleManager, TextManager,
};
use crate::runner::ActionRunner;
use crate::session::EditorSession;

/// The runner and every manager over one [`EditorSession`].
#[derive(Debug)]
pub struct Editor {
    pub runner: ActionRunner,
    pub group: GroupManager,
    pub copy: CopyManager,
    pub insert: InsertManager,
    pub drag: DragManager,
    pub text: TextManager,
    pub style: StyleManager,
}

impl Editor {
    pub fn new(session: Arc<EditorSession>) -> Self {
        let runner = ActionRunner::new(session);
        Self {
            group: GroupManager::new(runner.clone()),
            copy: CopyManager::new(runner.clone()),
            insert: InsertManager::new(runner.clone()),
            drag: DragManager::new(runner.clone()),
            text: TextManager::new(runner.clone()),
            style: StyleManager::new(runner.clone()),
            runner,
        }
    }

    pub fn session(&self) -> &Arc<EditorSession> {
        self.runner.session()
    }
}
