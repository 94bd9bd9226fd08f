//! Core domain: user entity, state tags, and the transition table

pub mod state;
pub mod user;

pub use state::{StateResolutionError, UserEvent, UserState, transition_target};
pub use user::{StickfixUser, TransitionResult};
