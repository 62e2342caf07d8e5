use crate::error::ServerError;
use shared::{DEFAULT_PEBBLES, DEFAULT_PITS, MAX_NAME};

/// Board and protocol parameters fixed for the lifetime of one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    /// Regular pits per player; the store sits at this index.
    pub pits: usize,
    /// Tokens per pit for a player joining an empty registry
    pub pebbles: u32,
    /// Longest accepted name in bytes, terminator excluded
    pub max_name: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            pits: DEFAULT_PITS,
            pebbles: DEFAULT_PEBBLES,
            max_name: MAX_NAME,
        }
    }
}

impl GameConfig {
    pub fn validate(self) -> Result<Self, ServerError> {
        if self.pits == 0 {
            return Err(ServerError::Config("a board needs at least one pit".into()));
        }
        if self.pebbles == 0 {
            return Err(ServerError::Config("pits must start with at least one token".into()));
        }
        if self.max_name == 0 {
            return Err(ServerError::Config("maximum name length must be positive".into()));
        }
        Ok(self)
    }
}
