//! Snowflake identifiers for guilds, users and channels

use super::error::{DomainError, ValidationError};
use serde::{Deserialize, Serialize};

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Create an identifier, rejecting zero
            pub fn new(value: u64) -> Result<Self, DomainError> {
                if value == 0 {
                    return Err(ValidationError::InvalidId {
                        kind: $kind,
                        value,
                    }
                    .into());
                }
                Ok(Self(value))
            }

            pub fn get(&self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<u64> for $name {
            type Error = DomainError;

            fn try_from(value: u64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

snowflake!(
    /// Guild (server) identity; one playback session per guild
    GuildId,
    "guild"
);
snowflake!(
    /// Member identity, used for requesters and voters
    UserId,
    "user"
);
snowflake!(
    /// Voice channel identity
    ChannelId,
    "channel"
);
