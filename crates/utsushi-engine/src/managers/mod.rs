//! UI-facing managers. Each takes the [`Selection`](crate::Selection) or
//! targets it works on explicitly and goes through the
//! [`ActionRunner`](crate::ActionRunner); none reads another's state.

pub mod copy;
pub mod drag;
pub mod group;
pub mod insert;
pub mod style;
pub mod text;

pub use copy::CopyManager;
pub use drag::{Direction, DragManager};
pub use group::{GroupManager, can_group, can_ungroup, check_group};
pub use insert::InsertManager;
pub use style::{StyleManager, current_value};
pub use text::TextManager;
