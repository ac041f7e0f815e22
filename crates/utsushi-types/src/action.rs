//! Actions: structured, reversible descriptions of one user-intended edit.
//!
//! Every action carries enough original state to build its inverse without
//! re-querying the surface, so undo is just "run the inverse". Actions are
//! JSON-serializable with a `type` discriminant for logging and replay:
//!
//! ```json
//! { "type": "edit-style", "targets": [...], "styleKey": "color",
//!   "originalValue": "red", "newValue": "blue" }
//! ```
//!
//! # Invariants
//!
//! - `inverse(inverse(a)) == a` for every action.
//! - `group-elements` and `ungroup-elements` are exact inverses given the same
//!   container and child ordering.
//! - All targets of one action live on one surface ([`Action::frame_id`]).

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::element::{ActionElement, ActionTarget, InsertLocation};
use crate::error::{EditorError, Result};
use crate::ids::FrameId;

/// Discriminant of an [`Action`], for logs and coalescing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ActionKind {
    InsertElement,
    GroupElements,
    UngroupElements,
    MoveElement,
    EditText,
    EditStyle,
    DeleteElement,
    WriteCode,
}

/// Insert `element` into each target parent at `location`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertElementAction {
    pub targets: Vec<ActionTarget>,
    pub element: ActionElement,
    pub location: InsertLocation,
    /// Verbatim source for the element; generated from `element` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_block: Option<String>,
}

/// Remove `removed_element` from each target parent at `location`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteElementAction {
    pub targets: Vec<ActionTarget>,
    pub removed_element: ActionElement,
    pub location: InsertLocation,
    /// Exact source text of the removed node, captured so undo restores it verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_block: Option<String>,
}

/// Wrap `children` of `parent` in a new `container`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupElementsAction {
    pub parent: ActionTarget,
    pub children: Vec<ActionTarget>,
    pub container: ActionElement,
    /// Sibling indices the children occupied before grouping, in `children` order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_indices: Option<Vec<usize>>,
}

/// Spread `container`'s children into `parent` and remove the container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UngroupElementsAction {
    pub parent: ActionTarget,
    pub container: ActionElement,
    pub children: Vec<ActionTarget>,
    /// Where each child lands in `parent`; contiguous at the container's index when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_indices: Option<Vec<usize>>,
}

/// Reorder `target` among its siblings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveElementAction {
    pub target: ActionTarget,
    pub original_index: usize,
    pub new_index: usize,
}

/// Replace the text content of each target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditTextAction {
    pub targets: Vec<ActionTarget>,
    pub original_content: String,
    pub new_content: String,
}

/// Set one style property on each target. An empty value removes the property.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditStyleAction {
    pub targets: Vec<ActionTarget>,
    pub style_key: String,
    pub original_value: String,
    pub new_value: String,
}

/// One whole-file change authored outside direct manipulation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeDiff {
    pub path: String,
    pub original: String,
    pub generated: String,
}

/// Apply file-level diffs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteCodeAction {
    pub diffs: Vec<CodeDiff>,
}

/// A structured, reversible edit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Action {
    InsertElement(InsertElementAction),
    GroupElements(GroupElementsAction),
    UngroupElements(UngroupElementsAction),
    MoveElement(MoveElementAction),
    EditText(EditTextAction),
    EditStyle(EditStyleAction),
    DeleteElement(DeleteElementAction),
    WriteCode(WriteCodeAction),
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::InsertElement(_) => ActionKind::InsertElement,
            Action::GroupElements(_) => ActionKind::GroupElements,
            Action::UngroupElements(_) => ActionKind::UngroupElements,
            Action::MoveElement(_) => ActionKind::MoveElement,
            Action::EditText(_) => ActionKind::EditText,
            Action::EditStyle(_) => ActionKind::EditStyle,
            Action::DeleteElement(_) => ActionKind::DeleteElement,
            Action::WriteCode(_) => ActionKind::WriteCode,
        }
    }

    /// Every element reference carried by this action.
    pub fn targets(&self) -> Vec<&ActionTarget> {
        match self {
            Action::InsertElement(a) => a.targets.iter().collect(),
            Action::DeleteElement(a) => a.targets.iter().collect(),
            Action::GroupElements(a) => std::iter::once(&a.parent).chain(&a.children).collect(),
            Action::UngroupElements(a) => std::iter::once(&a.parent).chain(&a.children).collect(),
            Action::MoveElement(a) => vec![&a.target],
            Action::EditText(a) => a.targets.iter().collect(),
            Action::EditStyle(a) => a.targets.iter().collect(),
            Action::WriteCode(_) => Vec::new(),
        }
    }

    /// The single surface this action addresses, or `None` for source-only actions.
    ///
    /// Fails with `CrossSurfaceTarget` when targets disagree.
    pub fn frame_id(&self) -> Result<Option<FrameId>> {
        let mut frame: Option<&FrameId> = None;
        for target in self.targets() {
            match frame {
                None => frame = Some(&target.frame_id),
                Some(expected) if *expected != target.frame_id => {
                    return Err(EditorError::CrossSurfaceTarget {
                        expected: expected.clone(),
                        found: target.frame_id.clone(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(frame.cloned())
    }

    /// Structural sanity checks that need no surface access.
    pub fn validate(&self) -> Result<()> {
        self.frame_id()?;
        match self {
            Action::InsertElement(a) if a.targets.is_empty() => {
                Err(EditorError::invalid_action("insert-element without targets"))
            }
            Action::DeleteElement(a) if a.targets.is_empty() => {
                Err(EditorError::invalid_action("delete-element without targets"))
            }
            Action::EditText(a) if a.targets.is_empty() => {
                Err(EditorError::invalid_action("edit-text without targets"))
            }
            Action::EditStyle(a) if a.targets.is_empty() || a.style_key.is_empty() => Err(
                EditorError::invalid_action("edit-style needs targets and a style key"),
            ),
            Action::GroupElements(a) if a.children.is_empty() => {
                Err(EditorError::invalid_group("nothing to group"))
            }
            Action::GroupElements(GroupElementsAction {
                children,
                child_indices: Some(indices),
                ..
            })
            | Action::UngroupElements(UngroupElementsAction {
                children,
                child_indices: Some(indices),
                ..
            }) if indices.len() != children.len() => Err(EditorError::invalid_action(
                "childIndices length does not match children",
            )),
            Action::GroupElements(GroupElementsAction {
                child_indices: Some(indices),
                ..
            })
            | Action::UngroupElements(UngroupElementsAction {
                child_indices: Some(indices),
                ..
            }) if indices.windows(2).any(|w| w[0] >= w[1]) => Err(
                EditorError::invalid_action("childIndices must be strictly ascending"),
            ),
            Action::WriteCode(a) if a.diffs.is_empty() => {
                Err(EditorError::invalid_action("write-code without diffs"))
            }
            _ => Ok(()),
        }
    }

    /// Build the action that undoes this one.
    pub fn inverse(&self) -> Action {
        match self {
            Action::InsertElement(a) => Action::DeleteElement(DeleteElementAction {
                targets: a.targets.clone(),
                removed_element: a.element.clone(),
                location: a.location.clone(),
                code_block: a.code_block.clone(),
            }),
            Action::DeleteElement(a) => Action::InsertElement(InsertElementAction {
                targets: a.targets.clone(),
                element: a.removed_element.clone(),
                location: a.location.clone(),
                code_block: a.code_block.clone(),
            }),
            Action::GroupElements(a) => Action::UngroupElements(UngroupElementsAction {
                parent: a.parent.clone(),
                container: a.container.clone(),
                children: a.children.clone(),
                child_indices: a.child_indices.clone(),
            }),
            Action::UngroupElements(a) => Action::GroupElements(GroupElementsAction {
                parent: a.parent.clone(),
                children: a.children.clone(),
                container: a.container.clone(),
                child_indices: a.child_indices.clone(),
            }),
            Action::MoveElement(a) => Action::MoveElement(MoveElementAction {
                target: a.target.clone(),
                original_index: a.new_index,
                new_index: a.original_index,
            }),
            Action::EditText(a) => Action::EditText(EditTextAction {
                targets: a.targets.clone(),
                original_content: a.new_content.clone(),
                new_content: a.original_content.clone(),
            }),
            Action::EditStyle(a) => Action::EditStyle(EditStyleAction {
                targets: a.targets.clone(),
                style_key: a.style_key.clone(),
                original_value: a.new_value.clone(),
                new_value: a.original_value.clone(),
            }),
            Action::WriteCode(a) => Action::WriteCode(WriteCodeAction {
                diffs: a
                    .diffs
                    .iter()
                    .map(|d| CodeDiff {
                        path: d.path.clone(),
                        original: d.generated.clone(),
                        generated: d.original.clone(),
                    })
                    .collect(),
            }),
        }
    }

    /// Whether applying this action changes nothing.
    pub fn is_noop(&self) -> bool {
        match self {
            Action::MoveElement(a) => a.original_index == a.new_index,
            Action::EditText(a) => a.original_content == a.new_content,
            Action::EditStyle(a) => a.original_value == a.new_value,
            Action::WriteCode(a) => a.diffs.iter().all(|d| d.original == d.generated),
            _ => false,
        }
    }

    /// Whether `newer` can be folded into this action as one history step.
    ///
    /// Only fine-grained value edits on identical targets coalesce.
    pub fn can_coalesce(&self, newer: &Action) -> bool {
        match (self, newer) {
            (Action::EditStyle(a), Action::EditStyle(b)) => {
                a.style_key == b.style_key && a.targets == b.targets
            }
            (Action::EditText(a), Action::EditText(b)) => a.targets == b.targets,
            (Action::MoveElement(a), Action::MoveElement(b)) => a.target == b.target,
            (Action::WriteCode(a), Action::WriteCode(b)) => {
                a.diffs.len() == b.diffs.len()
                    && a.diffs.iter().zip(&b.diffs).all(|(x, y)| x.path == y.path)
            }
            _ => false,
        }
    }

    /// Fold `newer` into this action, keeping the first original value and the
    /// latest new value. Returns `false` (and changes nothing) when incompatible.
    pub fn coalesce(&mut self, newer: &Action) -> bool {
        if !self.can_coalesce(newer) {
            return false;
        }
        match (self, newer) {
            (Action::EditStyle(a), Action::EditStyle(b)) => a.new_value = b.new_value.clone(),
            (Action::EditText(a), Action::EditText(b)) => a.new_content = b.new_content.clone(),
            (Action::MoveElement(a), Action::MoveElement(b)) => a.new_index = b.new_index,
            (Action::WriteCode(a), Action::WriteCode(b)) => {
                for (x, y) in a.diffs.iter_mut().zip(&b.diffs) {
                    x.generated = y.generated.clone();
                }
            }
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::InsertLocation;
    use crate::ids::{DomId, Oid};

    fn target(frame: &str, dom: &str) -> ActionTarget {
        ActionTarget::new(
            FrameId::from(frame),
            DomId::from(dom),
            Some(Oid::from(format!("oid-{dom}"))),
        )
    }

    fn style(original: &str, new: &str) -> Action {
        Action::EditStyle(EditStyleAction {
            targets: vec![target("f1", "a")],
            style_key: "color".into(),
            original_value: original.into(),
            new_value: new.into(),
        })
    }

    #[test]
    fn test_inverse_is_involutive() {
        let parent = target("f1", "p");
        let actions = vec![
            style("red", "blue"),
            Action::MoveElement(MoveElementAction {
                target: target("f1", "a"),
                original_index: 2,
                new_index: 0,
            }),
            Action::InsertElement(InsertElementAction {
                targets: vec![parent.clone()],
                element: ActionElement::new("div"),
                location: InsertLocation::at(&parent.dom_id, 1),
                code_block: Some("<div />".into()),
            }),
            Action::GroupElements(GroupElementsAction {
                parent: parent.clone(),
                children: vec![target("f1", "a"), target("f1", "b")],
                container: ActionElement::new("div"),
                child_indices: Some(vec![0, 2]),
            }),
            Action::WriteCode(WriteCodeAction {
                diffs: vec![CodeDiff {
                    path: "a.tsx".into(),
                    original: "x".into(),
                    generated: "y".into(),
                }],
            }),
        ];
        for action in actions {
            assert_eq!(action.inverse().inverse(), action);
        }
    }

    #[test]
    fn test_group_inverse_is_ungroup_with_same_payload() {
        let container = ActionElement::new("div");
        let group = Action::GroupElements(GroupElementsAction {
            parent: target("f1", "p"),
            children: vec![target("f1", "a"), target("f1", "b")],
            container: container.clone(),
            child_indices: None,
        });
        match group.inverse() {
            Action::UngroupElements(u) => {
                assert_eq!(u.container, container);
                assert_eq!(u.children.len(), 2);
                assert_eq!(u.children[0].dom_id, DomId::from("a"));
            }
            other => panic!("expected ungroup, got {other:?}"),
        }
    }

    #[test]
    fn test_cross_surface_targets_rejected() {
        let action = Action::EditText(EditTextAction {
            targets: vec![target("f1", "a"), target("f2", "b")],
            original_content: "x".into(),
            new_content: "y".into(),
        });
        let err = action.validate().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::CrossSurfaceTarget);
    }

    #[test]
    fn test_coalesce_keeps_first_original_and_latest_new() {
        let mut first = style("red", "orange");
        assert!(first.coalesce(&style("orange", "yellow")));
        assert!(first.coalesce(&style("yellow", "green")));
        match first {
            Action::EditStyle(a) => {
                assert_eq!(a.original_value, "red");
                assert_eq!(a.new_value, "green");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_coalesce_rejects_other_keys() {
        let mut first = style("red", "blue");
        let other = Action::EditStyle(EditStyleAction {
            targets: vec![target("f1", "a")],
            style_key: "width".into(),
            original_value: "1px".into(),
            new_value: "2px".into(),
        });
        assert!(!first.coalesce(&other));
        assert_eq!(first, style("red", "blue"));
    }

    #[test]
    fn test_json_discriminant() {
        let json = serde_json::to_value(style("red", "blue")).unwrap();
        assert_eq!(json["type"], "edit-style");
        assert_eq!(json["styleKey"], "color");
        assert_eq!(json["originalValue"], "red");
        let back: Action = serde_json::from_value(json).unwrap();
        assert_eq!(back, style("red", "blue"));
        assert_eq!(back.kind().to_string(), "edit-style");
    }

    #[test]
    fn test_child_indices_length_checked() {
        let action = Action::UngroupElements(UngroupElementsAction {
            parent: target("f1", "p"),
            container: ActionElement::new("div"),
            children: vec![target("f1", "a")],
            child_indices: Some(vec![0, 1]),
        });
        assert_eq!(action.validate().unwrap_err().kind(), crate::ErrorKind::InvalidAction);

        let action = Action::GroupElements(GroupElementsAction {
            parent: target("f1", "p"),
            children: vec![target("f1", "a"), target("f1", "b")],
            container: ActionElement::new("div"),
            child_indices: Some(vec![3, 1]),
        });
        assert_eq!(action.validate().unwrap_err().kind(), crate::ErrorKind::InvalidAction);
    }
}
