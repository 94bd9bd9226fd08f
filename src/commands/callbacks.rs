//! Inline-keyboard callback handlers
//!
//! One handler per callback name. Start-confirmation callbacks resolve the
//! pending user from the ephemeral store, because at that point the user is
//! not yet persistent; every other callback requires a registered user.

use crate::commands::{CallbackHandler, CallbackResult, load_registered};
use crate::context::StickfixContext;
use crate::database::StoreError;
use crate::domain::state::UserEvent;
use crate::domain::user::{StickfixUser, TransitionResult};
use crate::error::StickfixError;
use crate::storage::UserRecord;
use crate::transport::CallbackName;
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Generic confirmation-button handler, specialized per callback name
pub struct ConfirmationCallback {
    name: CallbackName,
}

impl ConfirmationCallback {
    /// Creates the handler for one callback name
    #[must_use]
    pub fn new(name: CallbackName) -> Self {
        Self { name }
    }

    /// Handlers for all eight callbacks
    #[must_use]
    pub fn all() -> Vec<Self> {
        CallbackName::ALL.into_iter().map(Self::new).collect()
    }

    fn event(&self) -> UserEvent {
        match self.name {
            CallbackName::StartConfirmationYes => UserEvent::StartConfirmation,
            CallbackName::StartConfirmationNo => UserEvent::StartRejection,
            CallbackName::RevokeConfirmationYes => UserEvent::RevokeConfirmation,
            CallbackName::RevokeConfirmationNo => UserEvent::RevokeRejection,
            CallbackName::PrivateModeEnabled => UserEvent::PrivateModeEnabled,
            CallbackName::PrivateModeDisabled => UserEvent::PrivateModeDisabled,
            CallbackName::ShuffleEnabled => UserEvent::ShuffleEnabled,
            CallbackName::ShuffleDisabled => UserEvent::ShuffleDisabled,
        }
    }

    fn confirmation_text(&self) -> &'static str {
        match self.name {
            CallbackName::StartConfirmationYes => {
                "You have been registered. Welcome to StickFix!"
            }
            CallbackName::StartConfirmationNo => "Registration cancelled.",
            CallbackName::RevokeConfirmationYes => "Your registration has been revoked.",
            CallbackName::RevokeConfirmationNo => "Revocation cancelled.",
            CallbackName::PrivateModeEnabled => "Private mode enabled.",
            CallbackName::PrivateModeDisabled => "Private mode disabled.",
            CallbackName::ShuffleEnabled => "Shuffle mode enabled.",
            CallbackName::ShuffleDisabled => "Shuffle mode disabled.",
        }
    }

    fn not_registered_text(&self) -> &'static str {
        match self.name {
            CallbackName::StartConfirmationYes | CallbackName::StartConfirmationNo => {
                "You have no registration in progress."
            }
            CallbackName::RevokeConfirmationYes | CallbackName::RevokeConfirmationNo => {
                "You are not registered in the database, cannot revoke registration"
            }
            CallbackName::PrivateModeEnabled => {
                "You are not registered in the database, cannot enable private mode"
            }
            CallbackName::PrivateModeDisabled => {
                "You are not registered in the database, cannot disable private mode"
            }
            CallbackName::ShuffleEnabled => {
                "You are not registered in the database, cannot enable shuffle mode"
            }
            CallbackName::ShuffleDisabled => {
                "You are not registered in the database, cannot disable shuffle mode"
            }
        }
    }

    /// Start confirmations act on the in-flight registrant, not on a
    /// persistent row.
    fn resolves_from_ephemeral(&self) -> bool {
        matches!(
            self.name,
            CallbackName::StartConfirmationYes | CallbackName::StartConfirmationNo
        )
    }

    async fn load_pending(
        &self,
        ctx: &StickfixContext,
        user: &StickfixUser,
    ) -> Result<Option<UserRecord>, StickfixError> {
        match ctx.ephemeral.get_user(user.chat_id).await {
            Ok(record) => Ok(Some(record)),
            Err(StoreError::StateResolution { name }) => {
                Err(StickfixError::StateResolution { name })
            }
            Err(error) => {
                debug!(user = %user.chat_id, %error, "no pending registration found");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl CallbackHandler for ConfirmationCallback {
    fn name(&self) -> CallbackName {
        self.name
    }

    async fn execute(
        &self,
        ctx: &StickfixContext,
        user: StickfixUser,
    ) -> Result<CallbackResult, StickfixError> {
        let record = if self.resolves_from_ephemeral() {
            self.load_pending(ctx, &user).await?
        } else {
            load_registered(ctx, user.chat_id).await?
        };

        let Some(record) = record else {
            if let Err(error) = ctx
                .transport
                .send_message(user.chat_id, self.not_registered_text())
                .await
            {
                warn!(user = %user.chat_id, %error, "not-registered notice send failed");
            }
            return Ok(CallbackResult::Failure {
                user: user.chat_id,
                message: "not registered".to_string(),
            });
        };

        let mut loaded = record.to_user();
        match loaded.apply(self.event(), &ctx.users, &ctx.ephemeral).await {
            TransitionResult::Success { to, .. } => {
                if let Err(error) = ctx
                    .transport
                    .send_message(user.chat_id, self.confirmation_text())
                    .await
                {
                    warn!(user = %user.chat_id, %error, "confirmation send failed");
                    return Ok(CallbackResult::Failure {
                        user: user.chat_id,
                        message: "confirmation send failed".to_string(),
                    });
                }
                info!(user = %user.chat_id, callback = %self.name, state = %to, "callback applied");
                Ok(CallbackResult::Success {
                    user: user.chat_id,
                    message: format!("{} applied", self.name),
                })
            }
            TransitionResult::Failure { current } => Ok(CallbackResult::Failure {
                user: user.chat_id,
                message: format!("{} denied from state {current}", self.name),
            }),
        }
    }
}
