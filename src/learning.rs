pub mod grounding;
pub mod learner;
pub mod literal;
pub mod projection;
pub mod state;

use thiserror::Error;

pub use grounding::{compatible_objects, ground_action_space, ground_literal_space, initial_state};
pub use learner::{ActionModel, Learner};
pub use literal::GroundedPredicate;
pub use projection::{filter, project, Combine, Pairing};
pub use state::State;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LearningError {
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    #[error("action `{action}` takes {expected} parameters, got {found}")]
    ArityMismatch { action: String, expected: usize, found: usize },
    #[error("object `{object}` is bound to more than one parameter of `{action}`")]
    AmbiguousBinding { action: String, object: String },
}
