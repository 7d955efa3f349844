//! Graph models representing extracted code structure

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Entities
// ============================================================================

/// Kind of a declared program element; doubles as the Neo4j node label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Function,
    Method,
    Class,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Function => "Function",
            Self::Method => "Method",
            Self::Class => "Class",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Function" => Some(Self::Function),
            "Method" => Some(Self::Method),
            "Class" => Some(Self::Class),
            _ => None,
        }
    }

    /// Lookup preference when several kinds share one name (lower wins)
    pub fn lookup_rank(&self) -> u8 {
        match self {
            Self::Function => 0,
            Self::Method => 1,
            Self::Class => 2,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A function, method or class declaration.
///
/// `name` is the identity key: the bare name for functions and classes,
/// `Class.method` for methods (prefixed by the module path in qualified mode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
    pub filepath: String,
    pub line: u32,
}

// ============================================================================
// Relations
// ============================================================================

/// Relationship type between two entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    Calls,
    Inherits,
    BelongsTo,
}

impl RelationKind {
    /// Neo4j relationship type
    pub fn rel_type(&self) -> &'static str {
        match self {
            Self::Calls => "CALLS",
            Self::Inherits => "INHERITS",
            Self::BelongsTo => "BELONGS_TO",
        }
    }

    pub fn from_rel_type(rel_type: &str) -> Option<Self> {
        match rel_type {
            "CALLS" => Some(Self::Calls),
            "INHERITS" => Some(Self::Inherits),
            "BELONGS_TO" => Some(Self::BelongsTo),
            _ => None,
        }
    }

    pub fn all() -> &'static [Self] {
        &[Self::Calls, Self::Inherits, Self::BelongsTo]
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rel_type())
    }
}

/// A directed edge between two entity names. `dst` may name nothing that was
/// ever declared (library calls, unresolved attributes).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub src: String,
    pub dst: String,
    pub kind: RelationKind,
}

impl Relation {
    pub fn new(src: impl Into<String>, dst: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
            kind,
        }
    }
}

// ============================================================================
// Store results
// ============================================================================

/// Outcome of a relation upsert: edges written (or already present) vs
/// edges dropped because an endpoint does not exist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelationWriteSummary {
    pub linked: usize,
    pub dropped: usize,
}

impl std::ops::AddAssign for RelationWriteSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.linked += rhs.linked;
        self.dropped += rhs.dropped;
    }
}

/// Node and edge counts currently held by the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub entities: usize,
    pub calls: usize,
    pub inherits: usize,
    pub belongs_to: usize,
}

impl GraphStats {
    pub fn relations(&self) -> usize {
        self.calls + self.inherits + self.belongs_to
    }

    pub(crate) fn add_relations(&mut self, kind: RelationKind, count: usize) {
        match kind {
            RelationKind::Calls => self.calls += count,
            RelationKind::Inherits => self.inherits += count,
            RelationKind::BelongsTo => self.belongs_to += count,
        }
    }
}
