//! Turn authority: which single player may move next.

use crate::error::GameError;
use crate::player::ClientId;
use crate::registry::Registry;
use log::debug;

/// Holds the turn token. At most one player owns it; nobody owns it before
/// the first registration or after the last registered player has left.
#[derive(Debug, Default)]
pub struct TurnAuthority {
    holder: Option<ClientId>,
}

impl TurnAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holder(&self) -> Option<ClientId> {
        self.holder
    }

    pub fn is_holder(&self, id: ClientId) -> bool {
        self.holder == Some(id)
    }

    /// Hands the token to `id`. Any previous holder must already be cleared.
    pub fn grant(&mut self, id: ClientId) {
        debug_assert!(self.holder.is_none(), "turn granted while held");
        debug!("Turn granted to client {}", id);
        self.holder = Some(id);
    }

    pub fn clear(&mut self) {
        self.holder = None;
    }

    /// Moves the token to the next registered player after the current
    /// holder and returns that player.
    pub fn advance(&mut self, registry: &Registry) -> Result<ClientId, GameError> {
        let current = self.holder.ok_or(GameError::NoTurnHolder)?;
        let next = registry.next(current)?;
        debug!("Turn passes from client {} to client {}", current, next);
        self.holder = Some(next);
        Ok(next)
    }
}
