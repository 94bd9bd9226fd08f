//! # StickFix - Sticker Collection Bot
//!
//! StickFix is a chat-bot backend that lets users register with the
//! service, toggle per-user behavioral modes (private visibility, shuffled
//! ordering), revoke their registration, and file stickers under tagged
//! collections.
//!
//! ## Architecture
//!
//! The crate is a leaf-to-root layering. The persistent and ephemeral
//! stores sit at the bottom ([`storage`], over [`database`]); the user
//! entity and its state machine sit above them ([`domain`]); commands and
//! callbacks drive the state machine ([`commands`]); and the dispatcher
//! binds handler names to the chat transport ([`dispatcher`],
//! [`transport`], [`telegram`]).
//!
//! Data flows upward (transport → dispatcher → command → state machine →
//! store) and status flows downward (store result → transition result →
//! command result → outbound message).

pub mod commands;
pub mod config;
pub mod context;
pub mod database;
pub mod dispatcher;
pub mod domain;
pub mod domain_types;
pub mod error;
pub mod storage;
pub mod telegram;
pub mod time_provider;
pub mod transport;

pub use crate::config::StickfixConfig;
pub use crate::context::StickfixContext;
pub use crate::database::{
    DatabaseConfig, DatabaseConnection, DatabaseLocation, DatabasePath, SchemaError, StoreError,
    StoreResult,
};
pub use crate::dispatcher::Dispatcher;
pub use crate::domain::{StickfixUser, TransitionResult, UserEvent, UserState};
pub use crate::error::StickfixError;
pub use crate::storage::{EphemeralStore, MetaStore, StickerStore, UserRecord, UserStore};
pub use crate::time_provider::{
    MockTimeProvider, RealTimeProvider, SharedTimeProvider, TimeProvider,
    production_time_provider,
};
pub use crate::transport::{
    CallbackName, ChatTransport, IncomingCallback, IncomingCommand, InlineKeyboardButton,
    InlineKeyboardMarkup, RecordingTransport, SendError, Sender, TransportEvent,
};
