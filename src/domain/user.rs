//! The user entity and its state-machine transition methods
//!
//! A [`StickfixUser`] is a transient value copy of a store row: handlers
//! reload it on every dispatch and drop it afterwards. Transition methods
//! consult the transition table, run the required store side effects, and
//! only then move the in-memory state; a store failure leaves the state
//! unchanged and is logged, never raised.

use crate::domain::state::{UserEvent, UserState, transition_target};
use crate::domain_types::{ChatId, Username};
use crate::storage::{EphemeralStore, UserStore};
use crate::database::StoreResult;
use tracing::{debug, warn};

/// Outcome of a state transition attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    /// The transition was allowed and its side effects were applied
    Success {
        /// State before the transition
        from: UserState,
        /// State after the transition
        to: UserState,
    },
    /// The transition was denied or its side effects failed
    Failure {
        /// The unchanged current state
        current: UserState,
    },
}

impl TransitionResult {
    /// Checks whether the transition was applied
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// A bot user: identity plus current state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StickfixUser {
    /// Platform-assigned identity
    pub chat_id: ChatId,
    /// Username as reported by the platform, possibly empty
    pub username: Username,
    /// Current state tag
    pub state: UserState,
}

impl StickfixUser {
    /// Creates a user in the `Idle` state
    #[must_use]
    pub fn new(chat_id: ChatId, username: Username) -> Self {
        Self::with_state(chat_id, username, UserState::Idle)
    }

    /// Creates a user in a specific state, as loaded from a store row
    #[must_use]
    pub fn with_state(chat_id: ChatId, username: Username, state: UserState) -> Self {
        Self {
            chat_id,
            username,
            state,
        }
    }

    /// Drives one event through the state machine.
    ///
    /// Any `(state, event)` pair outside the transition table fails with a
    /// logged diagnostic; so does any store failure inside the side
    /// effects. In both cases the in-memory state is unchanged.
    pub async fn apply(
        &mut self,
        event: UserEvent,
        persistent: &UserStore,
        ephemeral: &EphemeralStore,
    ) -> TransitionResult {
        let Some(target) = transition_target(self.state, event) else {
            warn!(
                user = %self.chat_id,
                state = %self.state,
                %event,
                "transition not allowed"
            );
            return TransitionResult::Failure {
                current: self.state,
            };
        };

        if let Err(error) = self.run_side_effects(event, persistent, ephemeral).await {
            warn!(
                user = %self.chat_id,
                state = %self.state,
                %event,
                %error,
                "transition side effects failed"
            );
            return TransitionResult::Failure {
                current: self.state,
            };
        }

        let from = self.state;
        self.state = target;
        debug!(user = %self.chat_id, %from, to = %target, "state transition");
        TransitionResult::Success { from, to: target }
    }

    async fn run_side_effects(
        &self,
        event: UserEvent,
        persistent: &UserStore,
        ephemeral: &EphemeralStore,
    ) -> StoreResult<()> {
        use UserEvent as E;

        match event {
            E::Start => {
                ephemeral.add_user(self).await?;
                ephemeral.set_user_state(self.chat_id, UserState::Start).await?;
            }
            E::Revoke => {
                persistent.set_user_state(self.chat_id, UserState::Revoke).await?;
            }
            E::PrivateMode => {
                persistent
                    .set_user_state(self.chat_id, UserState::PrivateMode)
                    .await?;
            }
            E::Shuffle => {
                persistent
                    .set_user_state(self.chat_id, UserState::Shuffle)
                    .await?;
            }
            E::StartConfirmation => {
                persistent.add_user(self).await?;
                ephemeral.delete_user(self.chat_id).await?;
                persistent.set_user_state(self.chat_id, UserState::Idle).await?;
            }
            E::StartRejection => {
                ephemeral.delete_user(self.chat_id).await?;
            }
            E::RevokeConfirmation => {
                persistent.delete_user(self.chat_id).await?;
            }
            E::RevokeRejection => {
                persistent.set_user_state(self.chat_id, UserState::Idle).await?;
            }
            E::PrivateModeEnabled => {
                persistent.set_private_mode(self.chat_id, true).await?;
                persistent.set_user_state(self.chat_id, UserState::Idle).await?;
            }
            E::PrivateModeDisabled => {
                persistent.set_private_mode(self.chat_id, false).await?;
                persistent.set_user_state(self.chat_id, UserState::Idle).await?;
            }
            E::ShuffleEnabled => {
                persistent.set_shuffle_mode(self.chat_id, true).await?;
                persistent.set_user_state(self.chat_id, UserState::Idle).await?;
            }
            E::ShuffleDisabled => {
                persistent.set_shuffle_mode(self.chat_id, false).await?;
                persistent.set_user_state(self.chat_id, UserState::Idle).await?;
            }
            // No cell in the transition table admits this event.
            E::Idle => {}
        }
        Ok(())
    }

    /// Registration requested
    pub async fn on_start(
        &mut self,
        persistent: &UserStore,
        ephemeral: &EphemeralStore,
    ) -> TransitionResult {
        self.apply(UserEvent::Start, persistent, ephemeral).await
    }

    /// Return to idle
    pub async fn on_idle(
        &mut self,
        persistent: &UserStore,
        ephemeral: &EphemeralStore,
    ) -> TransitionResult {
        self.apply(UserEvent::Idle, persistent, ephemeral).await
    }

    /// Revocation requested
    pub async fn on_revoke(
        &mut self,
        persistent: &UserStore,
        ephemeral: &EphemeralStore,
    ) -> TransitionResult {
        self.apply(UserEvent::Revoke, persistent, ephemeral).await
    }

    /// Private-mode toggle requested
    pub async fn on_private_mode(
        &mut self,
        persistent: &UserStore,
        ephemeral: &EphemeralStore,
    ) -> TransitionResult {
        self.apply(UserEvent::PrivateMode, persistent, ephemeral).await
    }

    /// Shuffle toggle requested
    pub async fn on_shuffle(
        &mut self,
        persistent: &UserStore,
        ephemeral: &EphemeralStore,
    ) -> TransitionResult {
        self.apply(UserEvent::Shuffle, persistent, ephemeral).await
    }

    /// Registration consent given
    pub async fn on_start_confirmation(
        &mut self,
        persistent: &UserStore,
        ephemeral: &EphemeralStore,
    ) -> TransitionResult {
        self.apply(UserEvent::StartConfirmation, persistent, ephemeral)
            .await
    }

    /// Registration consent denied
    pub async fn on_start_rejection(
        &mut self,
        persistent: &UserStore,
        ephemeral: &EphemeralStore,
    ) -> TransitionResult {
        self.apply(UserEvent::StartRejection, persistent, ephemeral)
            .await
    }

    /// Revocation confirmed
    pub async fn on_revoke_confirmation(
        &mut self,
        persistent: &UserStore,
        ephemeral: &EphemeralStore,
    ) -> TransitionResult {
        self.apply(UserEvent::RevokeConfirmation, persistent, ephemeral)
            .await
    }

    /// Revocation aborted
    pub async fn on_revoke_rejection(
        &mut self,
        persistent: &UserStore,
        ephemeral: &EphemeralStore,
    ) -> TransitionResult {
        self.apply(UserEvent::RevokeRejection, persistent, ephemeral)
            .await
    }

    /// Private mode switched on
    pub async fn on_private_mode_enabled(
        &mut self,
        persistent: &UserStore,
        ephemeral: &EphemeralStore,
    ) -> TransitionResult {
        self.apply(UserEvent::PrivateModeEnabled, persistent, ephemeral)
            .await
    }

    /// Private mode switched off
    pub async fn on_private_mode_disabled(
        &mut self,
        persistent: &UserStore,
        ephemeral: &EphemeralStore,
    ) -> TransitionResult {
        self.apply(UserEvent::PrivateModeDisabled, persistent, ephemeral)
            .await
    }

    /// Shuffle switched on
    pub async fn on_shuffle_enabled(
        &mut self,
        persistent: &UserStore,
        ephemeral: &EphemeralStore,
    ) -> TransitionResult {
        self.apply(UserEvent::ShuffleEnabled, persistent, ephemeral)
            .await
    }

    /// Shuffle switched off
    pub async fn on_shuffle_disabled(
        &mut self,
        persistent: &UserStore,
        ephemeral: &EphemeralStore,
    ) -> TransitionResult {
        self.apply(UserEvent::ShuffleDisabled, persistent, ephemeral)
            .await
    }
}
