//! Key identifying one deduplicated vertex of the source mesh.

use crate::float_types::INVALID_INDEX;
use std::fmt;

/// An `(original vertex, duplicate)` pair.
///
/// Every original vertex can be split into several duplicates when the faces sharing it
/// disagree on some attribute (a UV seam, a hard normal edge, ...). Duplicate numbers are
/// dense per original vertex, starting at zero, in the order they were first seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexLookup {
    pub org_vertex: usize,
    pub dupe: usize,
}

impl VertexLookup {
    /// The "not found" lookup.
    pub const INVALID: VertexLookup = VertexLookup {
        org_vertex: INVALID_INDEX,
        dupe: INVALID_INDEX,
    };

    pub const fn new(org_vertex: usize, dupe: usize) -> Self {
        Self { org_vertex, dupe }
    }

    pub const fn is_valid(&self) -> bool {
        self.org_vertex != INVALID_INDEX && self.dupe != INVALID_INDEX
    }
}

impl Default for VertexLookup {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for VertexLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}:{}", self.org_vertex, self.dupe)
        } else {
            write!(f, "invalid")
        }
    }
}
