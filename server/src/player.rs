//! Per-connection player state
//!
//! A `Player` exists from the moment its connection is accepted until it
//! disconnects or the game ends. Until a name is registered the player is
//! invisible to the ring: it neither receives broadcasts nor takes part in
//! turn rotation or sowing.

use crate::notify::Outbox;

/// Opaque connection handle assigned by the server, unique while connected
pub type ClientId = u32;

#[derive(Debug)]
pub struct Player {
    /// Connection handle this player is bound to
    pub id: ClientId,
    /// Display name, unset until registration completes
    pub name: Option<String>,
    /// Regular pits `0..pits` followed by the store at index `pits`
    pub slots: Vec<u32>,
    /// Inbound bytes not yet terminated by a newline
    pub buffer: Vec<u8>,
    /// Outbound line queue to this player's connection
    pub outbox: Outbox,
}

impl Player {
    /// Creates an unnamed player with `tokens` in each regular pit and an
    /// empty store.
    pub fn new(id: ClientId, pits: usize, tokens: u32, outbox: Outbox) -> Self {
        let mut slots = vec![tokens; pits + 1];
        slots[pits] = 0;
        Self {
            id,
            name: None,
            slots,
            buffer: Vec::new(),
            outbox,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.name.is_some()
    }

    /// Regular pits only, store excluded
    pub fn pits(&self) -> &[u32] {
        &self.slots[..self.slots.len() - 1]
    }

    pub fn store(&self) -> u32 {
        self.slots[self.slots.len() - 1]
    }

    /// Sum of every slot including the store; the player's final score.
    pub fn total(&self) -> u32 {
        self.slots.iter().sum()
    }

    pub fn has_empty_side(&self) -> bool {
        self.pits().iter().all(|&count| count == 0)
    }

    pub fn take_line(&mut self) -> Option<Vec<u8>> {
        shared::take_line(&mut self.buffer)
    }
}
