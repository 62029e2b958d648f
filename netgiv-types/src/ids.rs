//! Identity type for stored objects.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned identifier of a stored object.
///
/// Ids start at 1 and are never reused. The value 0 is reserved: in a
/// ReceiveRequest or BurnRequest it means "the most recently stored object".
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(u32);

impl ObjectId {
    /// The reserved "most recent" selector.
    pub const LATEST: ObjectId = ObjectId(0);

    /// Create an ObjectId from a raw value.
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Whether this is the reserved "most recent" selector.
    pub const fn is_latest(&self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for ObjectId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_latest() {
            write!(f, "ObjectId(latest)")
        } else {
            write!(f, "ObjectId({})", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_latest() {
        assert!(ObjectId::LATEST.is_latest());
        assert!(ObjectId::default().is_latest());
        assert!(!ObjectId::new(1).is_latest());
    }

    #[test]
    fn debug_names_latest() {
        assert_eq!(format!("{:?}", ObjectId::LATEST), "ObjectId(latest)");
        assert_eq!(format!("{:?}", ObjectId::new(7)), "ObjectId(7)");
    }

    #[test]
    fn serializes_as_plain_integer() {
        let bytes = rmp_serde::to_vec(&ObjectId::new(42)).unwrap();
        let value: u32 = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(value, 42);
    }
}
