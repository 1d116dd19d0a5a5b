// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Integer id newtypes used on the wire

/// Define a `u64` newtype id carried in protocol frames.
///
/// Generates `new()`, `value()`, `Display`, `From<u64>`, `From<Self> for u64`
/// and transparent serde so the id serializes as a bare JSON integer.
macro_rules! define_wire_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn value(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                id.0
            }
        }
    };
}

define_wire_id! {
    /// Identifier of a peer session.
    ///
    /// Stable across event hops: an event created for a session can still be
    /// resolved against the session table while it is in flight.
    pub struct SessionId;
}

define_wire_id! {
    /// Handle for a registered procedure, unique within a runtime.
    ///
    /// Assigned monotonically by the registry; `0` is never issued.
    pub struct RegistrationId;
}

define_wire_id! {
    /// Per-session integer correlating a request with its reply.
    pub struct RequestId;
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
