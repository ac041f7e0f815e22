//! Insert new elements.

use utsushi_types::{
    Action, ActionElement, InsertElementAction, InsertLocation, LiveElement, Result, attrs,
};

use crate::runner::ActionRunner;

#[derive(Debug, Clone)]
pub struct InsertManager {
    runner: ActionRunner,
}

impl InsertManager {
    pub fn new(runner: ActionRunner) -> Self {
        Self { runner }
    }

    /// A fresh, empty element marked as inserted. Defaults to the
    /// configured block tag.
    pub fn new_element(&self, tag: Option<&str>) -> ActionElement {
        let tag = tag.unwrap_or(self.runner.session().config().default_container_tag.as_str());
        ActionElement::new(tag).with_attribute(attrs::DATA_ONLOOK_INSERTED, "true")
    }

    /// Insert a new `tag` element into `parent` at `index`, or last.
    pub async fn insert(
        &self,
        parent: &LiveElement,
        tag: Option<&str>,
        index: Option<usize>,
    ) -> Result<Action> {
        let element = self.new_element(tag);
        self.insert_element(parent, element, index).await
    }

    /// Insert a prepared element.
    pub async fn insert_element(
        &self,
        parent: &LiveElement,
        element: ActionElement,
        index: Option<usize>,
    ) -> Result<Action> {
        let location = match index {
            Some(index) => InsertLocation::at(parent.dom_id(), index),
            None => InsertLocation::append(parent.dom_id()),
        };
        self.runner
            .run(Action::InsertElement(InsertElementAction {
                targets: vec![parent.to_target()],
                element,
                location,
                code_block: None,
            }))
            .await
    }
}
