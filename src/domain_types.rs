//! Domain types for the StickFix bot
//!
//! This module defines strongly-typed domain values to prevent primitive
//! obsession and improve type safety throughout the codebase. Column widths
//! mirror the relational schema (`VARCHAR(50)` bounds).

use nutype::nutype;
use std::time::Duration;

/// Chat-platform-assigned identifier of a user or chat.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    TryFrom,
    Into
))]
pub struct ChatId(i64);

impl ChatId {
    /// The reserved id of the synthetic default/public user.
    pub const DEFAULT_USER: i64 = 0;

    /// Returns the id of the default/public user that owns public stickers.
    #[must_use]
    pub fn default_user() -> Self {
        Self::new(Self::DEFAULT_USER)
    }

    /// Checks whether this id addresses the protected default user.
    #[must_use]
    pub fn is_default_user(&self) -> bool {
        self.into_inner() == Self::DEFAULT_USER
    }

    /// Gets the value as i64
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.into_inner()
    }
}

/// Username of a chat-platform user
///
/// Empty usernames are allowed; the platform does not require one.
#[nutype(
    validate(len_char_max = 50),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize,
        Display,
        TryFrom,
        Into
    )
)]
pub struct Username(String);

impl Username {
    /// Builds a username from an untrusted transport value, truncating to
    /// the column width.
    #[must_use]
    pub fn from_transport(raw: &str) -> Self {
        let truncated: String = raw.chars().take(50).collect();
        Self::try_new(truncated).expect("truncated username fits the column width")
    }

    /// The empty username.
    ///
    /// # Panics
    ///
    /// This function panics if the empty string is not a valid username,
    /// which should never happen.
    #[must_use]
    pub fn empty() -> Self {
        Self::try_new(String::new()).expect("empty username should always be valid")
    }
}

/// Tag under which a sticker is filed
#[nutype(
    validate(len_char_min = 1, len_char_max = 50),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        PartialOrd,
        Ord,
        Serialize,
        Deserialize,
        Display,
        TryFrom,
        Into
    )
)]
pub struct StickerTag(String);

/// Opaque chat-platform handle of a sticker
#[nutype(
    validate(len_char_min = 1, len_char_max = 50),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize,
        Display,
        TryFrom,
        Into
    )
)]
pub struct StickerFileId(String);

/// Chat-platform credential read from the `meta` table at startup
#[nutype(
    validate(len_char_min = 1),
    derive(Clone, PartialEq, Eq, Serialize, Deserialize, TryFrom, Into)
)]
pub struct ApiKey(String);

impl ApiKey {
    /// Exposes the raw credential for the transport adapter.
    #[must_use]
    pub fn reveal(&self) -> String {
        self.clone().into_inner()
    }
}

// The credential must never leak through logs.
impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Size of a database connection pool
#[nutype(
    validate(greater_or_equal = 1, less_or_equal = 100),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Serialize,
        Deserialize,
        Display,
        Default,
        TryFrom,
        Into
    ),
    default = 10
)]
pub struct ConnectionPoolSize(u32);

impl ConnectionPoolSize {
    /// Gets the value as u32
    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.into_inner()
    }
}

/// Sleep interval of the ephemeral-store eviction task, in seconds
#[nutype(
    validate(greater_or_equal = 1, less_or_equal = 86_400),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Serialize,
        Deserialize,
        Display,
        Default,
        TryFrom,
        Into
    ),
    default = 900
)]
pub struct EvictionIntervalSecs(u64);

impl EvictionIntervalSecs {
    /// Converts the interval to a [`Duration`].
    #[must_use]
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.into_inner())
    }
}

/// Age past which an in-flight registration is evicted, in seconds
#[nutype(
    validate(greater_or_equal = 1, less_or_equal = 31_536_000),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Serialize,
        Deserialize,
        Display,
        Default,
        TryFrom,
        Into
    ),
    default = 3600
)]
pub struct EvictionThresholdSecs(u64);

impl EvictionThresholdSecs {
    /// Converts the threshold to a [`Duration`].
    #[must_use]
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.into_inner())
    }
}
