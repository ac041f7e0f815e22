//! The selected elements, passed explicitly to every manager.

use utsushi_types::{ActionTarget, EditorError, FrameId, LiveElement, Result};

/// Elements the user has selected, in selection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    elements: Vec<LiveElement>,
}

impl Selection {
    pub fn new(elements: Vec<LiveElement>) -> Self {
        Self { elements }
    }

    pub fn single(element: LiveElement) -> Self {
        Self {
            elements: vec![element],
        }
    }

    pub fn elements(&self) -> &[LiveElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn first(&self) -> Option<&LiveElement> {
        self.elements.first()
    }

    pub fn targets(&self) -> Vec<ActionTarget> {
        self.elements.iter().map(LiveElement::to_target).collect()
    }

    /// The one surface every selected element lives on.
    pub fn frame_id(&self) -> Result<Option<FrameId>> {
        let mut frames = self.elements.iter().map(LiveElement::frame_id);
        let Some(first) = frames.next() else {
            return Ok(None);
        };
        match frames.find(|f| *f != first) {
            Some(other) => Err(EditorError::CrossSurfaceTarget {
                expected: first.clone(),
                found: other.clone(),
            }),
            None => Ok(Some(first.clone())),
        }
    }

    /// The surface of a non-empty selection.
    pub fn require_frame(&self) -> Result<FrameId> {
        self.frame_id()?
            .ok_or_else(|| EditorError::invalid_action("nothing is selected"))
    }
}

impl From<Vec<LiveElement>> for Selection {
    fn from(elements: Vec<LiveElement>) -> Self {
        Self::new(elements)
    }
}
