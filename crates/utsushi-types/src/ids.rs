//! Typed identifiers for render surfaces, live elements and source nodes.
//!
//! All ID types are opaque strings on the wire (they travel through the render
//! sandbox as DOM attribute values), but are distinct types in Rust so a `DomId`
//! can never be passed where an `Oid` is expected.
//!
//! Freshly minted IDs derive from UUIDv7 (time-ordered, globally unique). The
//! `short()` form is for logs and human-facing UI only, never a lookup key.
//!
//! | Type         | Scope                                    | Minted as       |
//! |--------------|------------------------------------------|-----------------|
//! | [`FrameId`]  | one render surface (webview/iframe)      | `frame-<hex>`   |
//! | [`DomId`]    | one live element, unique per surface     | `odid-<hex>`    |
//! | [`Oid`]      | one JSX node in source, shared by renders| `<hex>`         |
//! | [`InstanceId`]| one rendered instance of a component    | `<hex>`         |

use std::fmt;

use serde::{Deserialize, Serialize};

/// Render surface identifier.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(String);

/// Per-surface live element identifier (the `data-onlook-dom-id` stamp).
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomId(String);

/// Origin identifier linking a live element to a JSX node in source.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Oid(String);

/// Identifier of a rendered component instance.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

// ── Shared behavior ─────────────────────────────────────────────────────────

macro_rules! impl_string_id {
    ($T:ident, $name:literal, $prefix:literal) => {
        impl $T {
            /// Mint a new globally unique ID.
            pub fn new() -> Self {
                Self(format!("{}{}", $prefix, uuid::Uuid::now_v7().as_simple()))
            }

            /// Wrap an existing wire value.
            pub fn from_raw(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// The wire value.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Last 8 characters, for human display only.
            ///
            /// UUIDv7 front-loads the timestamp, so the tail is the part that
            /// differs between IDs minted in the same millisecond.
            pub fn short(&self) -> &str {
                let start = self.0.len().saturating_sub(8);
                self.0.get(start..).unwrap_or(&self.0)
            }

            /// Check if this ID is empty (never minted, e.g. a default snapshot).
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl Default for $T {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<&str> for $T {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $T {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $T {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl fmt::Debug for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $name, self.short())
            }
        }
    };
}

impl_string_id!(FrameId, "FrameId", "frame-");
impl_string_id!(DomId, "DomId", "odid-");
impl_string_id!(Oid, "Oid", "");
impl_string_id!(InstanceId, "InstanceId", "");
