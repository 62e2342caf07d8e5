//! Authoritative game state and per-connection dispatch
//!
//! `GameState` is driven by three events coming from the network layer:
//! a new connection, a chunk of bytes from a connection, and a connection
//! going away. Each event is handled to completion, including every
//! resulting notification, before the next one is looked at. Connections
//! move through `Registering` (no name yet) to `Active` and are removed from
//! the registry when closed.

use crate::config::GameConfig;
use crate::engine;
use crate::error::{GameError, NameError};
use crate::notify::Outbox;
use crate::player::ClientId;
use crate::registry::Registry;
use crate::turn::TurnAuthority;
use log::{debug, error, info, warn};
use shared::{
    END_PIT_MESSAGE, GAME_OVER_MESSAGE, INVALID_MOVE_MESSAGE, NAME_REJECTED_MESSAGE,
    REQUEST_MESSAGE, WAIT_MESSAGE, WELCOME_MESSAGE,
};

/// Where a connection stands in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Registering,
    Active,
    Closed,
}

#[derive(Debug)]
pub struct GameState {
    config: GameConfig,
    registry: Registry,
    turn: TurnAuthority,
    /// Final `(name, total)` per registered player once the game is over
    scores: Option<Vec<(String, u32)>>,
    /// Connections found dead while sending, removed after the current event
    dropped: Vec<ClientId>,
}

impl GameState {
    pub fn new(config: GameConfig) -> Self {
        Self {
            registry: Registry::new(config.pits),
            turn: TurnAuthority::new(),
            scores: None,
            dropped: Vec::new(),
            config,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn turn_holder(&self) -> Option<ClientId> {
        self.turn.holder()
    }

    pub fn is_over(&self) -> bool {
        self.scores.is_some()
    }

    pub fn scores(&self) -> Option<&[(String, u32)]> {
        self.scores.as_deref()
    }

    pub fn phase(&self, id: ClientId) -> ConnectionPhase {
        match self.registry.get(id) {
            Some(player) if player.is_registered() => ConnectionPhase::Active,
            Some(_) => ConnectionPhase::Registering,
            None => ConnectionPhase::Closed,
        }
    }

    /// Accepts a new connection: seeds its board and asks for a name.
    pub fn connect(&mut self, id: ClientId, outbox: Outbox) {
        if self.is_over() {
            return;
        }

        let tokens = self.registry.initial_tokens(self.config.pebbles);
        self.registry.insert(id, tokens, outbox);
        info!("Accepted connection from client {}", id);
        self.unicast(id, WELCOME_MESSAGE);
        self.flush_dropped();
    }

    /// Handles bytes read from a connection.
    pub fn receive(&mut self, id: ClientId, bytes: &[u8]) {
        if self.is_over() {
            return;
        }
        let Some(player) = self.registry.get_mut(id) else {
            debug!("Ignoring {} bytes from closed client {}", bytes.len(), id);
            return;
        };
        player.buffer.extend_from_slice(bytes);

        if self.phase(id) == ConnectionPhase::Registering {
            self.register(id);
        }
        if self.phase(id) == ConnectionPhase::Active {
            self.play(id);
        }
        self.flush_dropped();
    }

    /// Handles end-of-stream or a failed write on a connection.
    pub fn disconnect(&mut self, id: ClientId) {
        self.depart(id);
        self.flush_dropped();
    }

    /// Closes every connection, flushing queued lines through the writers.
    pub fn close_all(&mut self) {
        let ids: Vec<ClientId> = self.registry.all().map(|player| player.id).collect();
        for id in ids {
            self.registry.remove(id);
        }
        self.turn.clear();
    }

    fn register(&mut self, id: ClientId) {
        match self.take_name(id) {
            Ok(None) => {}
            Ok(Some(name)) => self.activate(id, name),
            Err(e) => {
                info!("Rejecting client {}: {}", id, e);
                self.unicast(id, NAME_REJECTED_MESSAGE);
                self.registry.remove(id);
            }
        }
    }

    /// Pulls a complete name out of the registration buffer, if one arrived.
    fn take_name(&mut self, id: ClientId) -> Result<Option<String>, NameError> {
        let max = self.config.max_name;
        let Some(player) = self.registry.get_mut(id) else {
            return Ok(None);
        };

        let Some(line) = player.take_line() else {
            // Room for the name plus a pending carriage return
            if player.buffer.len() > max + 1 {
                return Err(NameError::TooLong { max });
            }
            return Ok(None);
        };

        let name = String::from_utf8(line).map_err(|_| NameError::InvalidUtf8)?;
        if name.is_empty() {
            return Err(NameError::Empty);
        }
        if name.len() > max {
            return Err(NameError::TooLong { max });
        }
        if self.registry.is_name_taken(&name, id) {
            return Err(NameError::Taken(name));
        }
        Ok(Some(name))
    }

    fn activate(&mut self, id: ClientId, name: String) {
        info!("Client {} is now {}", id, name);
        let joined = shared::joined(&name);
        if let Some(player) = self.registry.get_mut(id) {
            player.name = Some(name);
        }

        if self.turn.holder().is_none() {
            self.turn.grant(id);
        }
        self.broadcast(&joined);
        self.alert_all();

        // A newcomer seeded from empty boards may already end the game
        self.check_game_over();
        if self.turn.is_holder(id) {
            self.unicast(id, REQUEST_MESSAGE);
        }
    }

    /// Processes every complete line buffered for an active player.
    fn play(&mut self, id: ClientId) {
        let max_line = self.config.max_name;
        while !self.is_over() {
            let Some(player) = self.registry.get_mut(id) else {
                return;
            };
            let line = match player.take_line() {
                Some(line) => line,
                None if player.buffer.len() > max_line => std::mem::take(&mut player.buffer),
                None => return,
            };
            self.handle_line(id, &String::from_utf8_lossy(&line));
        }
    }

    fn handle_line(&mut self, id: ClientId, line: &str) {
        if !self.turn.is_holder(id) {
            self.unicast(id, WAIT_MESSAGE);
            return;
        }
        let Some(player) = self.registry.get(id) else {
            return;
        };
        let name = player.name.clone().unwrap_or_default();

        let pit = match engine::validate(player, line) {
            Ok(pit) => pit,
            Err(e) => {
                debug!("Invalid move from {}: {}", name, e);
                self.unicast(id, INVALID_MOVE_MESSAGE);
                return;
            }
        };

        let outcome = match engine::apply(&mut self.registry, id, pit) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Move by {} could not be applied: {}", name, e);
                return;
            }
        };
        info!("{} moved {} tokens from pit {}", name, outcome.sown, pit);

        self.alert_all();
        self.broadcast(&shared::moved_from(&name, pit));

        if outcome.extra_turn {
            info!("{} ended last move in end pit", name);
            self.broadcast(&shared::ended_in_end_pit(&name));
            self.unicast(id, END_PIT_MESSAGE);
        } else {
            match self.next_name(id) {
                Ok(next) => self.broadcast(&shared::turn_of(&next)),
                Err(e) => error!("No next player after {}: {}", name, e),
            }
            self.advance_turn();
        }

        self.check_game_over();
    }

    /// Passes the turn token along the ring and prompts the new holder.
    fn advance_turn(&mut self) {
        match self.turn.advance(&self.registry) {
            Ok(next) => self.unicast(next, REQUEST_MESSAGE),
            Err(e) => error!("Cannot advance turn: {}", e),
        }
    }

    fn next_name(&self, id: ClientId) -> Result<String, GameError> {
        let next = self.registry.next(id)?;
        self.registry
            .name_of(next)
            .map(str::to_string)
            .ok_or(GameError::UnknownClient(next))
    }

    fn depart(&mut self, id: ClientId) {
        let Some(player) = self.registry.get(id) else {
            return;
        };
        let Some(name) = player.name.clone() else {
            debug!("Client {} disconnected before registering", id);
            self.registry.remove(id);
            return;
        };
        if self.is_over() {
            self.registry.remove(id);
            return;
        }

        let mut next_turn = None;
        if self.turn.is_holder(id) {
            match self.registry.next(id) {
                Ok(next) if next != id => {
                    next_turn = self.registry.name_of(next).map(str::to_string);
                    self.advance_turn();
                }
                _ => self.turn.clear(),
            }
        }

        if let Some(player) = self.registry.remove(id) {
            info!("{} disconnected taking {} tokens", name, player.total());
        }
        if let Some(next) = next_turn {
            self.broadcast(&shared::turn_of(&next));
        }
        self.broadcast(&shared::left(&name));
        self.alert_all();
        self.check_game_over();
    }

    /// Ends the game once any registered player's regular pits are all empty.
    fn check_game_over(&mut self) {
        if self.is_over() || !self.registry.registered().any(|p| p.has_empty_side()) {
            return;
        }

        info!("Game over!");
        self.broadcast(GAME_OVER_MESSAGE);

        let scores: Vec<(String, u32)> = self
            .registry
            .registered()
            .map(|player| (player.name.clone().unwrap_or_default(), player.total()))
            .collect();
        for (name, total) in &scores {
            info!("{} has {} points", name, total);
            self.broadcast(&shared::points(name, *total));
        }
        self.turn.clear();
        self.scores = Some(scores);
    }

    fn unicast(&mut self, id: ClientId, line: &str) {
        if let Err(e) = self.registry.unicast(id, line) {
            warn!("{}", e);
            self.dropped.push(id);
        }
    }

    fn broadcast(&mut self, line: &str) {
        let failed = self.registry.broadcast(line);
        self.dropped.extend(failed);
    }

    fn alert_all(&mut self) {
        let failed = self.registry.alert_all();
        self.dropped.extend(failed);
    }

    /// Treats every connection whose queue closed as disconnected.
    fn flush_dropped(&mut self) {
        while let Some(id) = self.dropped.pop() {
            self.depart(id);
        }
    }
}
