//! Style edits and style streams.
//!
//! A stream (slider drags, color pickers) wraps many updates in one
//! transaction: the surface follows every update, the source is written
//! once at the end, and history keeps one step from the first original to
//! the last value.

use tracing::debug;
use utsushi_types::{Action, EditStyleAction, EditorError, LiveElement, Result};

use crate::runner::ActionRunner;
use crate::selection::Selection;

/// The value an element currently has for `key`. `className` reads the
/// `class` attribute.
pub fn current_value(el: &LiveElement, key: &str) -> String {
    let value = if key == "className" {
        el.attributes.get("class")
    } else {
        el.styles.get(key)
    };
    value.cloned().unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct StyleManager {
    runner: ActionRunner,
}

impl StyleManager {
    pub fn new(runner: ActionRunner) -> Self {
        Self { runner }
    }

    /// Set `key` to `value` on every selected element.
    ///
    /// Elements that share an original value go in one action; differing
    /// originals give one action per element, still one undo step.
    pub async fn update(&self, selection: &Selection, key: &str, value: &str) -> Result<Vec<Action>> {
        let frame = selection.require_frame()?;
        let adapter = self.runner.session().adapter(&frame)?;

        let mut current = Vec::with_capacity(selection.len());
        for el in selection.elements() {
            let live = adapter.resolve(&el.to_target()).await?;
            current.push((live.to_target(), current_value(&live, key)));
        }
        let Some((_, first)) = current.first() else {
            return Err(EditorError::invalid_action("nothing is selected"));
        };

        let actions: Vec<Action> = if current.iter().all(|(_, v)| v == first) {
            let original_value = first.clone();
            vec![Action::EditStyle(EditStyleAction {
                targets: current.into_iter().map(|(t, _)| t).collect(),
                style_key: key.to_string(),
                original_value,
                new_value: value.to_string(),
            })]
        } else {
            current
                .into_iter()
                .map(|(target, original_value)| {
                    Action::EditStyle(EditStyleAction {
                        targets: vec![target],
                        style_key: key.to_string(),
                        original_value,
                        new_value: value.to_string(),
                    })
                })
                .collect()
        };
        debug!(key, actions = actions.len(), "style update");
        self.runner.run_all(actions).await
    }

    pub fn begin_stream(&self) {
        self.runner.start_transaction();
    }

    /// Write the stream to source as one step.
    pub async fn end_stream(&self) -> Result<()> {
        self.runner.commit_transaction().await
    }

    /// Drop the stream and put the surface back.
    pub async fn cancel_stream(&self) -> Result<()> {
        self.runner.abort_transaction().await
    }
}
