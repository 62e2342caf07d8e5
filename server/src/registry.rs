//! Session registry and ring navigation
//!
//! The registry owns every connected player in ring order. New players are
//! inserted at the front, so ring order is the reverse of arrival order.
//! Adjacency is always re-derived from the current order; nothing caches a
//! "next" pointer across insertions or removals.

use crate::error::GameError;
use crate::notify::Outbox;
use crate::player::{ClientId, Player};
use log::debug;
use std::collections::VecDeque;

#[derive(Debug)]
pub struct Registry {
    players: VecDeque<Player>,
    pits: usize,
}

impl Registry {
    pub fn new(pits: usize) -> Self {
        Self {
            players: VecDeque::new(),
            pits,
        }
    }

    /// Number of regular pits per player
    pub fn pits(&self) -> usize {
        self.pits
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Tokens per pit for a newcomer: the average over every pit of every
    /// current player, rounded up. An empty registry yields `default`.
    pub fn initial_tokens(&self, default: u32) -> u32 {
        if self.players.is_empty() {
            return default;
        }

        let total: u64 = self
            .players
            .iter()
            .flat_map(|player| player.pits())
            .map(|&count| u64::from(count))
            .sum();
        let pit_count = (self.players.len() * self.pits) as u64;
        total.div_ceil(pit_count) as u32
    }

    /// Adds a fresh unnamed player at the front of the ring.
    pub fn insert(&mut self, id: ClientId, tokens: u32, outbox: Outbox) -> &mut Player {
        debug!("Inserting client {} with {} tokens per pit", id, tokens);
        self.players
            .push_front(Player::new(id, self.pits, tokens, outbox));
        &mut self.players[0]
    }

    /// Removes a player, returning it so the caller can inspect its final state.
    /// Its tokens leave the game with it.
    pub fn remove(&mut self, id: ClientId) -> Option<Player> {
        let position = self.position(id)?;
        self.players.remove(position)
    }

    pub fn get(&self, id: ClientId) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    pub fn get_mut(&mut self, id: ClientId) -> Option<&mut Player> {
        self.players.iter_mut().find(|player| player.id == id)
    }

    pub fn name_of(&self, id: ClientId) -> Option<&str> {
        self.get(id).and_then(|player| player.name.as_deref())
    }

    /// Exact, case-sensitive match against every other connection's name.
    pub fn is_name_taken(&self, name: &str, excluding: ClientId) -> bool {
        self.players
            .iter()
            .filter(|player| player.id != excluding)
            .any(|player| player.name.as_deref() == Some(name))
    }

    /// Every connected player in ring order, registered or not.
    pub fn all(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// Fully registered players in ring order.
    pub fn registered(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|player| player.is_registered())
    }

    /// Sum of every slot, store included, over every connected player.
    pub fn total_tokens(&self) -> u64 {
        self.players
            .iter()
            .map(|player| u64::from(player.total()))
            .sum()
    }

    /// The registered player following `id` in ring order, wrapping from the
    /// tail to the head and skipping players that have not registered yet.
    ///
    /// When `id` is the only registered player the ring wraps back to `id`.
    pub fn next(&self, id: ClientId) -> Result<ClientId, GameError> {
        let position = self.position(id).ok_or(GameError::UnknownClient(id))?;
        let len = self.players.len();

        (1..=len)
            .map(|step| &self.players[(position + step) % len])
            .find(|player| player.is_registered())
            .map(|player| player.id)
            .ok_or(GameError::RingEmpty)
    }

    fn position(&self, id: ClientId) -> Option<usize> {
        self.players.iter().position(|player| player.id == id)
    }
}
