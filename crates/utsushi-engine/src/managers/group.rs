//! Group and ungroup.

use tracing::debug;
use utsushi_types::{
    Action, ActionElement, EditorError, GroupElementsAction, LiveElement, Result,
    UngroupElementsAction,
};

use crate::runner::ActionRunner;
use crate::selection::Selection;

/// Why `elements` cannot be grouped, if they cannot.
///
/// Grouping needs at least one element, one surface, and one shared parent.
/// A single element is fine: it gets wrapped.
pub fn check_group(elements: &[LiveElement]) -> Result<()> {
    let Some(first) = elements.first() else {
        return Err(EditorError::invalid_group("nothing is selected"));
    };
    let Some(parent) = &first.parent else {
        return Err(EditorError::invalid_group("the root element cannot be grouped"));
    };
    for (i, el) in elements.iter().enumerate() {
        if el.frame_id() != first.frame_id() {
            return Err(EditorError::invalid_group("selection spans surfaces"));
        }
        if el.parent.as_ref().map(|p| &p.dom_id) != Some(&parent.dom_id) {
            return Err(EditorError::invalid_group(
                "selected elements do not share a parent",
            ));
        }
        if elements[..i].iter().any(|e| e.dom_id() == el.dom_id()) {
            return Err(EditorError::invalid_group(format!(
                "{} is selected twice",
                el.dom_id()
            )));
        }
    }
    Ok(())
}

pub fn can_group(elements: &[LiveElement]) -> bool {
    check_group(elements).is_ok()
}

/// Exactly one non-root element with children.
pub fn can_ungroup(elements: &[LiveElement]) -> bool {
    matches!(elements, [one] if one.parent.is_some() && one.child_count > 0)
}

/// Wraps selections in containers and unwraps them again.
#[derive(Debug, Clone)]
pub struct GroupManager {
    runner: ActionRunner,
}

impl GroupManager {
    pub fn new(runner: ActionRunner) -> Self {
        Self { runner }
    }

    /// Wrap the selection in a new container that copies the parent's
    /// layout properties.
    pub async fn group(&self, selection: &Selection) -> Result<Action> {
        check_group(selection.elements())?;
        let frame = selection.require_frame()?;
        let parent = selection
            .first()
            .and_then(|el| el.parent.clone())
            .ok_or_else(|| EditorError::invalid_group("the root element cannot be grouped"))?;

        let session = self.runner.session();
        let config = session.config();
        let parent_live = session.adapter(&frame)?.resolve(&parent).await?;
        let mut container = ActionElement::new(config.default_container_tag.as_str());
        for key in &config.layout_properties {
            if let Some(value) = parent_live.style(key) {
                container = container.with_style(key.as_str(), value);
            }
        }
        debug!(parent = %parent, children = selection.len(), container = %container.dom_id, "grouping");

        self.runner
            .run(Action::GroupElements(GroupElementsAction {
                parent,
                children: selection.targets(),
                container,
                child_indices: None,
            }))
            .await
    }

    /// Spread the selected container's children into its parent.
    pub async fn ungroup(&self, selection: &Selection) -> Result<Action> {
        if !can_ungroup(selection.elements()) {
            return Err(EditorError::invalid_group(
                "select exactly one container to ungroup",
            ));
        }
        let frame = selection.require_frame()?;
        let el = selection
            .first()
            .ok_or_else(|| EditorError::invalid_group("nothing is selected"))?;
        let parent = el
            .parent
            .clone()
            .ok_or_else(|| EditorError::invalid_group("the root element cannot be ungrouped"))?;
        let container = self
            .runner
            .session()
            .adapter(&frame)?
            .snapshot(&el.to_target())
            .await?;

        self.runner
            .run(Action::UngroupElements(UngroupElementsAction {
                parent,
                container,
                children: Vec::new(),
                child_indices: None,
            }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utsushi_types::{ActionTarget, DomId, ElementIdentity, FrameId, Rect};

    fn live(frame: &str, dom: &str, parent: Option<&str>) -> LiveElement {
        LiveElement {
            identity: ElementIdentity {
                dom_id: DomId::from(dom),
                oid: None,
                instance_id: None,
                frame_id: FrameId::from(frame),
            },
            tag_name: "div".into(),
            parent: parent.map(|p| ActionTarget::new(FrameId::from(frame), DomId::from(p), None)),
            index: 0,
            attributes: Default::default(),
            styles: Default::default(),
            text_content: None,
            rect: Rect::default(),
            child_count: 2,
        }
    }

    #[test]
    fn test_can_group() {
        let a = live("f1", "a", Some("p"));
        let b = live("f1", "b", Some("p"));
        assert!(can_group(&[a.clone()]));
        assert!(can_group(&[a.clone(), b.clone()]));
        assert!(!can_group(&[]));
        assert!(!can_group(&[a.clone(), live("f1", "c", Some("q"))]));
        assert!(!can_group(&[a.clone(), live("f2", "c", Some("p"))]));
        assert!(!can_group(&[a.clone(), a.clone()]));
        assert!(!can_group(&[live("f1", "root", None)]));
    }

    #[test]
    fn test_can_ungroup() {
        let a = live("f1", "a", Some("p"));
        assert!(can_ungroup(&[a.clone()]));
        assert!(!can_ungroup(&[a.clone(), live("f1", "b", Some("p"))]));
        assert!(!can_ungroup(&[live("f1", "root", None)]));
        let mut leaf = a;
        leaf.child_count = 0;
        assert!(!can_ungroup(&[leaf]));
    }
}
