//! Error types for the arena.

/// Errors raised while building an arena.
///
/// Player input never produces one of these: stale ids and lost races are
/// silent no-ops, malformed payloads are rejected before they reach the
/// arena.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// The room options cannot produce a working arena
    /// (no colors, a field too small to place anything, no spawn points).
    #[error("invalid arena config: {0}")]
    InvalidConfig(String),
}
