//! Broadcast and notification
//!
//! All outbound text goes through a player's [`Outbox`]: an unbounded queue
//! drained by that connection's writer task. The control loop is the only
//! producer, so every peer sees lines in the order the game emitted them.
//! A closed queue surfaces as a [`SendError`] and the caller drops the peer.

use crate::error::SendError;
use crate::player::ClientId;
use crate::registry::Registry;
use log::warn;
use shared::{board_line, BOARD_TITLE};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// Outbound half of one connection.
///
/// Dropping the outbox closes the queue, which lets the writer flush what is
/// left and shut the socket, and stops the connection's reader task.
#[derive(Debug)]
pub struct Outbox {
    id: ClientId,
    sender: mpsc::UnboundedSender<String>,
    reader: Option<AbortHandle>,
}

impl Outbox {
    pub fn new(id: ClientId, sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id,
            sender,
            reader: None,
        }
    }

    /// Ties the connection's reader task to this outbox's lifetime.
    pub fn with_reader(mut self, reader: AbortHandle) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Queues one line; the writer appends the terminator.
    pub fn send(&self, line: &str) -> Result<(), SendError> {
        self.sender
            .send(line.to_string())
            .map_err(|_| SendError(self.id))
    }
}

impl Drop for Outbox {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

impl Registry {
    /// Sends one line to a single connection, registered or not.
    pub fn unicast(&self, id: ClientId, line: &str) -> Result<(), SendError> {
        let player = self.get(id).ok_or(SendError(id))?;
        player.outbox.send(line)
    }

    /// Sends one line to every registered player in ring order.
    ///
    /// Returns the players whose queues were closed.
    pub fn broadcast(&self, line: &str) -> Vec<ClientId> {
        self.registered()
            .filter_map(|player| player.outbox.send(line).err())
            .map(|SendError(id)| {
                warn!("Dropping broadcast to closed connection {}", id);
                id
            })
            .collect()
    }

    /// The board as seen by every client: a title line followed by one row
    /// per registered player in ring order.
    pub fn snapshot(&self) -> Vec<String> {
        let rows = self
            .registered()
            .map(|player| board_line(player.name.as_deref().unwrap_or_default(), &player.slots));
        std::iter::once(BOARD_TITLE.to_string()).chain(rows).collect()
    }

    /// Sends the board snapshot to one connection.
    pub fn send_snapshot(&self, id: ClientId) -> Result<(), SendError> {
        self.snapshot()
            .iter()
            .try_for_each(|line| self.unicast(id, line))
    }

    /// Sends the board snapshot to every connection, including players
    /// still registering, so all clients converge on the same view.
    ///
    /// Returns the players whose queues were closed.
    pub fn alert_all(&self) -> Vec<ClientId> {
        let snapshot = self.snapshot();
        self.all()
            .filter_map(|player| {
                snapshot
                    .iter()
                    .try_for_each(|line| player.outbox.send(line))
                    .err()
            })
            .map(|SendError(id)| id)
            .collect()
    }
}
