//! Dispatcher binding between the transport and the handlers
//!
//! The only place where inbound transport payloads are adapted into domain
//! values. Each command and callback name is registered in a lookup table;
//! inbound events without a sender are logged and dropped, everything else
//! is routed to its handler and the result logged.

use crate::commands::{
    AddCommand, CallbackHandler, CommandHandler, ConfirmationCallback, HelpCommand,
    PrivateCommand, RevokeCommand, ShuffleCommand, StartCommand,
};
use crate::context::StickfixContext;
use crate::domain::user::StickfixUser;
use crate::domain_types::Username;
use crate::error::StickfixError;
use crate::transport::{IncomingCallback, IncomingCommand, Sender, TransportEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Routes inbound transport events to command and callback handlers
pub struct Dispatcher {
    context: StickfixContext,
    commands: HashMap<&'static str, Arc<dyn CommandHandler>>,
    callbacks: HashMap<&'static str, Arc<dyn CallbackHandler>>,
}

impl Dispatcher {
    /// Creates an empty dispatcher
    #[must_use]
    pub fn new(context: StickfixContext) -> Self {
        Self {
            context,
            commands: HashMap::new(),
            callbacks: HashMap::new(),
        }
    }

    /// Creates a dispatcher with every command and callback registered
    #[must_use]
    pub fn with_default_handlers(context: StickfixContext) -> Self {
        let mut dispatcher = Self::new(context);
        dispatcher.register_command(Arc::new(StartCommand));
        dispatcher.register_command(Arc::new(RevokeCommand));
        dispatcher.register_command(Arc::new(PrivateCommand));
        dispatcher.register_command(Arc::new(ShuffleCommand));
        dispatcher.register_command(Arc::new(AddCommand));
        dispatcher.register_command(Arc::new(HelpCommand));
        for callback in ConfirmationCallback::all() {
            dispatcher.register_callback(Arc::new(callback));
        }
        dispatcher
    }

    /// Registers a command handler under its name
    pub fn register_command(&mut self, handler: Arc<dyn CommandHandler>) {
        self.commands.insert(handler.name(), handler);
    }

    /// Registers a callback handler under its wire string
    pub fn register_callback(&mut self, handler: Arc<dyn CallbackHandler>) {
        self.callbacks.insert(handler.name().as_str(), handler);
    }

    fn user_from_sender(sender: &Sender) -> StickfixUser {
        let username = Username::from_transport(sender.username.as_deref().unwrap_or("unknown"));
        StickfixUser::new(sender.id, username)
    }

    /// Routes one inbound event.
    ///
    /// # Errors
    ///
    /// Returns a [`StickfixError`] only for fatal conditions surfaced by a
    /// handler; everything else is logged here.
    pub async fn dispatch(&self, event: TransportEvent) -> Result<(), StickfixError> {
        match event {
            TransportEvent::Command(command) => self.dispatch_command(command).await,
            TransportEvent::Callback(callback) => self.dispatch_callback(callback).await,
        }
    }

    async fn dispatch_command(&self, command: IncomingCommand) -> Result<(), StickfixError> {
        let Some(sender) = &command.sender else {
            warn!(command = %command.name, "command without sender dropped");
            return Ok(());
        };
        let user = Self::user_from_sender(sender);
        info!(command = %command.name, user = %user.chat_id, "received command");

        let Some(handler) = self.commands.get(command.name.as_str()) else {
            debug!(command = %command.name, "unknown command dropped");
            return Ok(());
        };

        let result = handler.execute(&self.context, user, &command).await?;
        if result.is_success() {
            info!(command = %command.name, outcome = result.message(), "command handled");
        } else {
            warn!(command = %command.name, outcome = result.message(), "command failed");
        }
        Ok(())
    }

    async fn dispatch_callback(&self, callback: IncomingCallback) -> Result<(), StickfixError> {
        let Some(sender) = &callback.sender else {
            warn!(callback = %callback.name, "callback without sender dropped");
            return Ok(());
        };
        let user = Self::user_from_sender(sender);
        info!(callback = %callback.name, user = %user.chat_id, "received callback");

        let Some(handler) = self.callbacks.get(callback.name.as_str()) else {
            debug!(callback = %callback.name, "unknown callback dropped");
            return Ok(());
        };

        let result = handler.execute(&self.context, user).await?;
        match result {
            crate::commands::CallbackResult::Success { message, .. } => {
                info!(callback = %callback.name, outcome = %message, "callback handled");
            }
            crate::commands::CallbackResult::Failure { message, .. } => {
                warn!(callback = %callback.name, outcome = %message, "callback failed");
            }
        }
        Ok(())
    }

    /// Consumes the transport event channel until it closes, handling each
    /// event on its own task. Handlers are safe to run concurrently; the
    /// store serializes conflicting writes.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<TransportEvent>) {
        while let Some(event) = events.recv().await {
            let dispatcher = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(fatal) = dispatcher.dispatch(event).await {
                    error!(error = %fatal, "fatal error while dispatching event");
                }
            });
        }
        info!("transport event channel closed, dispatcher stopping");
    }
}
