//! User state tags and the transition table
//!
//! States form a closed set and carry only their tag; the tag name is what
//! gets persisted. The transition table is a single two-dimensional dispatch
//! from `(state, event)` to the target state, with every unlisted cell
//! defaulting to failure.

use crate::database::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Current position of a user in the bot's conversation flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum UserState {
    /// No interaction in progress
    Idle,
    /// Registration prompt sent, awaiting consent
    Start,
    /// Consent given, registration being applied
    StartConfirmation,
    /// Consent denied, registration being discarded
    StartRejection,
    /// Revocation prompt sent, awaiting confirmation
    Revoke,
    /// Private-mode prompt sent, awaiting enable/disable choice
    PrivateMode,
    /// Shuffle prompt sent, awaiting enable/disable choice
    Shuffle,
}

/// Raised when a persisted state tag does not name any known state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot resolve user state name: {name}")]
pub struct StateResolutionError {
    /// The unrecognized tag name
    pub name: String,
}

impl From<StateResolutionError> for StoreError {
    fn from(error: StateResolutionError) -> Self {
        Self::StateResolution { name: error.name }
    }
}

impl UserState {
    /// All states, in declaration order
    pub const ALL: [Self; 7] = [
        Self::Idle,
        Self::Start,
        Self::StartConfirmation,
        Self::StartRejection,
        Self::Revoke,
        Self::PrivateMode,
        Self::Shuffle,
    ];

    /// The tag name persisted in the `state` column
    #[must_use]
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Start => "Start",
            Self::StartConfirmation => "StartConfirmation",
            Self::StartRejection => "StartRejection",
            Self::Revoke => "Revoke",
            Self::PrivateMode => "PrivateMode",
            Self::Shuffle => "Shuffle",
        }
    }

    /// Resolves a persisted tag name, matching case-insensitively
    ///
    /// # Errors
    ///
    /// Returns a [`StateResolutionError`] when the name matches no state.
    pub fn resolve(name: &str) -> Result<Self, StateResolutionError> {
        Self::ALL
            .into_iter()
            .find(|state| state.canonical_name().eq_ignore_ascii_case(name))
            .ok_or_else(|| StateResolutionError {
                name: name.to_string(),
            })
    }

    /// Checks whether the event is allowed from this state
    #[must_use]
    pub fn permits(&self, event: UserEvent) -> bool {
        transition_target(*self, event).is_some()
    }
}

impl fmt::Display for UserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Events that drive the per-user state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserEvent {
    /// Return to idle
    Idle,
    /// Registration requested
    Start,
    /// Revocation requested
    Revoke,
    /// Private-mode toggle requested
    PrivateMode,
    /// Shuffle toggle requested
    Shuffle,
    /// Registration consent given
    StartConfirmation,
    /// Registration consent denied
    StartRejection,
    /// Revocation confirmed
    RevokeConfirmation,
    /// Revocation aborted
    RevokeRejection,
    /// Private mode switched on
    PrivateModeEnabled,
    /// Private mode switched off
    PrivateModeDisabled,
    /// Shuffle switched on
    ShuffleEnabled,
    /// Shuffle switched off
    ShuffleDisabled,
}

impl fmt::Display for UserEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Start => "start",
            Self::Revoke => "revoke",
            Self::PrivateMode => "private_mode",
            Self::Shuffle => "shuffle",
            Self::StartConfirmation => "start_confirmation",
            Self::StartRejection => "start_rejection",
            Self::RevokeConfirmation => "revoke_confirmation",
            Self::RevokeRejection => "revoke_rejection",
            Self::PrivateModeEnabled => "private_mode_enabled",
            Self::PrivateModeDisabled => "private_mode_disabled",
            Self::ShuffleEnabled => "shuffle_enabled",
            Self::ShuffleDisabled => "shuffle_disabled",
        };
        f.write_str(name)
    }
}

/// The transition table: `(state, event)` to target state
///
/// Every cell not listed here is a failed transition.
#[must_use]
pub fn transition_target(state: UserState, event: UserEvent) -> Option<UserState> {
    use UserEvent as E;
    use UserState as S;

    match (state, event) {
        (S::Idle, E::Start) => Some(S::Start),
        (S::Idle, E::Revoke) => Some(S::Revoke),
        (S::Idle, E::PrivateMode) => Some(S::PrivateMode),
        (S::Idle, E::Shuffle) => Some(S::Shuffle),
        (S::Start, E::StartConfirmation | E::StartRejection)
        | (S::Revoke, E::RevokeConfirmation | E::RevokeRejection)
        | (S::PrivateMode, E::PrivateModeEnabled | E::PrivateModeDisabled)
        | (S::Shuffle, E::ShuffleEnabled | E::ShuffleDisabled) => Some(S::Idle),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_should_round_trip_every_state_when_resolving_canonical_name() {
        for state in UserState::ALL {
            let resolved = UserState::resolve(state.canonical_name()).unwrap();
            assert_eq!(resolved, state);
        }
    }

    #[test]
    fn test_should_match_case_insensitively_when_resolving() {
        assert_eq!(
            UserState::resolve("privatemode").unwrap(),
            UserState::PrivateMode
        );
        assert_eq!(
            UserState::resolve("STARTCONFIRMATION").unwrap(),
            UserState::StartConfirmation
        );
        assert_eq!(UserState::resolve("idle").unwrap(), UserState::Idle);
    }

    #[test]
    fn test_should_fail_with_distinct_error_when_name_is_unknown() {
        let error = UserState::resolve("Bogus").unwrap_err();
        assert_eq!(error.name, "Bogus");
        let store_error: StoreError = error.into();
        assert!(store_error.is_fatal());
    }

    #[test]
    fn test_should_allow_exactly_the_specified_transitions_from_idle() {
        assert_eq!(
            transition_target(UserState::Idle, UserEvent::Start),
            Some(UserState::Start)
        );
        assert_eq!(
            transition_target(UserState::Idle, UserEvent::Revoke),
            Some(UserState::Revoke)
        );
        assert_eq!(
            transition_target(UserState::Idle, UserEvent::PrivateMode),
            Some(UserState::PrivateMode)
        );
        assert_eq!(
            transition_target(UserState::Idle, UserEvent::Shuffle),
            Some(UserState::Shuffle)
        );
        assert_eq!(transition_target(UserState::Idle, UserEvent::Idle), None);
        assert_eq!(
            transition_target(UserState::Idle, UserEvent::StartConfirmation),
            None
        );
    }

    #[test]
    fn test_should_return_to_idle_when_confirmation_events_fire() {
        let cells = [
            (UserState::Start, UserEvent::StartConfirmation),
            (UserState::Start, UserEvent::StartRejection),
            (UserState::Revoke, UserEvent::RevokeConfirmation),
            (UserState::Revoke, UserEvent::RevokeRejection),
            (UserState::PrivateMode, UserEvent::PrivateModeEnabled),
            (UserState::PrivateMode, UserEvent::PrivateModeDisabled),
            (UserState::Shuffle, UserEvent::ShuffleEnabled),
            (UserState::Shuffle, UserEvent::ShuffleDisabled),
        ];
        for (state, event) in cells {
            assert_eq!(transition_target(state, event), Some(UserState::Idle));
        }
    }

    #[test]
    fn test_should_deny_cross_flow_events_when_prompt_pending() {
        assert!(!UserState::Start.permits(UserEvent::RevokeConfirmation));
        assert!(!UserState::Revoke.permits(UserEvent::StartConfirmation));
        assert!(!UserState::PrivateMode.permits(UserEvent::ShuffleEnabled));
        assert!(!UserState::Shuffle.permits(UserEvent::PrivateModeEnabled));
    }

    proptest! {
        #[test]
        fn prop_resolution_survives_random_casing(index in 0usize..7, flips in any::<u64>()) {
            let state = UserState::ALL[index];
            let mangled: String = state
                .canonical_name()
                .chars()
                .enumerate()
                .map(|(i, c)| {
                    if flips & (1 << (i % 64)) != 0 {
                        c.to_ascii_uppercase()
                    } else {
                        c.to_ascii_lowercase()
                    }
                })
                .collect();
            prop_assert_eq!(UserState::resolve(&mangled).unwrap(), state);
        }
    }
}
