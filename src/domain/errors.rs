// Domain-level errors for terrain edits, snapshots and map documents.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerrainError {
    /// A received tree breaks a structural invariant; the reason names which one.
    MalformedTree(&'static str),
    /// A map document or bitmap cannot describe a valid terrain.
    InvalidMap(&'static str),
    /// Explosion input with a non-finite centre or a non-positive radius.
    DegenerateGeometry,
}

impl fmt::Display for TerrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerrainError::MalformedTree(reason) => write!(f, "malformed terrain tree: {reason}"),
            TerrainError::InvalidMap(reason) => write!(f, "invalid map: {reason}"),
            TerrainError::DegenerateGeometry => write!(f, "degenerate explosion geometry"),
        }
    }
}

impl std::error::Error for TerrainError {}
