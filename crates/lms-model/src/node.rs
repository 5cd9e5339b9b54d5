//! Node identity
//!
//! Every level of the course tree is addressed by an optional numeric
//! identifier. The editor hands us `id: Option<u64>`; at the boundary we turn
//! that into a [`NodeKey`], so the rest of the workspace branches on a tagged
//! variant instead of re-checking field presence.
//!
//! Convention: an absent id, `null`, and the `0` sentinel all mean "new".

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw numeric value
            #[inline]
            #[must_use]
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Server-assigned course identifier
    CourseId
);
define_id!(
    /// Server-assigned chapter identifier
    ChapterId
);
define_id!(
    /// Server-assigned lecture identifier
    LectureId
);

/// Result of classifying a raw identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// Not persisted yet; must be created
    New,
    /// Already persisted; must be updated
    Existing,
}

/// Classify a raw identifier as new or existing.
///
/// Total and pure. `None` and `Some(0)` are new, every other value is
/// existing.
#[inline]
#[must_use]
pub fn classify(raw: Option<u64>) -> NodeStatus {
    match raw {
        None | Some(0) => NodeStatus::New,
        Some(_) => NodeStatus::Existing,
    }
}

/// Tagged identity of a node in the edit tree
///
/// Serialized as the plain optional id the backend and editor speak
/// (`null` for [`NodeKey::New`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKey<I> {
    /// Node has never been persisted
    New,
    /// Node is persisted under this identifier
    Existing(I),
}

impl<I> Default for NodeKey<I> {
    fn default() -> Self {
        Self::New
    }
}

impl<I: Copy + From<u64>> NodeKey<I> {
    /// Build a key from the raw optional id, applying [`classify`].
    #[must_use]
    pub fn from_raw(raw: Option<u64>) -> Self {
        match (classify(raw), raw) {
            (NodeStatus::Existing, Some(id)) => Self::Existing(I::from(id)),
            _ => Self::New,
        }
    }
}

impl<I: Copy> NodeKey<I> {
    /// Create or update branch for this node
    #[inline]
    #[must_use]
    pub fn status(&self) -> NodeStatus {
        match self {
            Self::New => NodeStatus::New,
            Self::Existing(_) => NodeStatus::Existing,
        }
    }

    /// Persisted identifier, if any
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<I> {
        match self {
            Self::New => None,
            Self::Existing(id) => Some(*id),
        }
    }

    /// Whether the node still has to be created
    #[inline]
    #[must_use]
    pub fn is_new(&self) -> bool {
        matches!(self, Self::New)
    }
}

impl<I: Copy + Into<u64>> Serialize for NodeKey<I> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::New => serializer.serialize_none(),
            Self::Existing(id) => {
                let raw: u64 = (*id).into();
                serializer.serialize_some(&raw)
            }
        }
    }
}

impl<'de, I: Copy + From<u64>> Deserialize<'de> for NodeKey<I> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<u64>::deserialize(deserializer)?;
        Ok(Self::from_raw(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn absent_and_zero_are_new() {
        assert_eq!(classify(None), NodeStatus::New);
        assert_eq!(classify(Some(0)), NodeStatus::New);
        assert_eq!(classify(Some(7)), NodeStatus::Existing);
    }

    #[test]
    fn key_round_trips_through_optional_id() {
        let key: NodeKey<ChapterId> = serde_json::from_str("10").unwrap();
        assert_eq!(key, NodeKey::Existing(ChapterId(10)));
        assert_eq!(serde_json::to_string(&key).unwrap(), "10");

        let key: NodeKey<ChapterId> = serde_json::from_str("null").unwrap();
        assert!(key.is_new());
        assert_eq!(serde_json::to_string(&key).unwrap(), "null");
    }

    #[test]
    fn zero_sentinel_deserializes_as_new() {
        let key: NodeKey<LectureId> = serde_json::from_str("0").unwrap();
        assert_eq!(key, NodeKey::New);
        assert_eq!(key.id(), None);
    }

    proptest! {
        #[test]
        fn existing_iff_positive(raw in proptest::option::of(any::<u64>())) {
            let status = classify(raw);
            let positive = matches!(raw, Some(id) if id > 0);
            prop_assert_eq!(status == NodeStatus::Existing, positive);

            let key = NodeKey::<CourseId>::from_raw(raw);
            prop_assert_eq!(key.status(), status);
        }
    }
}
