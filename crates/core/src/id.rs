// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes.
//!
//! Thread, worker, and task IDs are minted outside the control plane and
//! treated as opaque strings. Session IDs are minted here as time-ordered
//! UUIDs (v7) so lexicographic order equals creation order — event replay
//! across a thread relies on that property.

/// Define a string-backed newtype ID.
///
/// Generates `new()`, `as_str()`, `is_empty()`, `Display`, `From<&str>`,
/// `From<String>`, `PartialEq<str>`, `PartialEq<&str>`, and `Borrow<str>`
/// implementations.
macro_rules! string_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create an ID from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Unique identifier for a session.
    ///
    /// Generated as a UUIDv7 so that sorting session IDs sorts sessions by
    /// creation time.
    pub struct SessionId;
}

impl SessionId {
    /// Mint a new time-ordered session ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }
}

string_id! {
    /// Identifier of the conversational thread that owns a session.
    pub struct ThreadId;
}

string_id! {
    /// Identifier of a registered worker process.
    pub struct WorkerId;
}

string_id! {
    /// Identifier of the task a session may be attached to.
    pub struct TaskId;
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
