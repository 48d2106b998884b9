//! Opaque identifiers used across the crate's wire contracts.
//!
//! Every id is a thin wrapper over a [`uuid::Uuid`] so that equality/hashing
//! is by identity rather than by any positional or structural field, and so
//! that (de)serialization matches the JSON contracts verbatim (a bare UUID
//! string, not a nested object).

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(AgentId);
uuid_id!(MatchId);
uuid_id!(RequestId);
