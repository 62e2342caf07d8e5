//! Move validation and sowing
//!
//! A move empties one of the mover's regular pits and sows its tokens one at
//! a time into the following slots: first the mover's own later pits and
//! store, then the regular pits of each registered player around the ring.
//! Only the mover's own store ever receives tokens; other stores are skipped.

use crate::error::{GameError, MoveError};
use crate::player::{ClientId, Player};
use crate::registry::Registry;

/// Result of a sowing move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Pit the tokens were taken from
    pub pit: usize,
    /// Tokens in that pit when the move was selected
    pub sown: u32,
    /// The mover keeps the turn
    pub extra_turn: bool,
}

/// Parses a client line into a pit index and checks it against the mover's
/// board. Does not mutate anything.
pub fn validate(player: &Player, line: &str) -> Result<usize, MoveError> {
    let trimmed = line.trim();
    let requested: i64 = trimmed
        .parse()
        .map_err(|_| MoveError::NotANumber(trimmed.to_string()))?;

    let pits = player.pits();
    let pit = usize::try_from(requested)
        .ok()
        .filter(|&pit| pit < pits.len())
        .ok_or(MoveError::OutOfRange {
            pit: requested,
            pits: pits.len(),
        })?;

    if pits[pit] == 0 {
        return Err(MoveError::EmptyPit(pit));
    }
    Ok(pit)
}

/// Empties `pit` of the mover and sows its tokens around the ring.
///
/// The extra-turn flag uses the count captured at selection time: the mover
/// keeps the turn when `pit + sown` equals the store index.
pub fn apply(
    registry: &mut Registry,
    mover: ClientId,
    pit: usize,
) -> Result<MoveOutcome, GameError> {
    let pits = registry.pits();
    let player = registry
        .get_mut(mover)
        .ok_or(GameError::UnknownClient(mover))?;

    let sown = std::mem::take(&mut player.slots[pit]);
    let mut remaining = sow(&mut player.slots[pit + 1..], sown);

    let mut current = mover;
    while remaining > 0 {
        current = registry.next(current)?;
        let reach = if current == mover { pits + 1 } else { pits };
        let target = registry
            .get_mut(current)
            .ok_or(GameError::UnknownClient(current))?;
        remaining = sow(&mut target.slots[..reach], remaining);
    }

    Ok(MoveOutcome {
        pit,
        sown,
        extra_turn: pit as u64 + u64::from(sown) == pits as u64,
    })
}

/// Drops one token into each slot in order until tokens run out.
/// Returns the tokens left over.
fn sow(slots: &mut [u32], mut tokens: u32) -> u32 {
    for slot in slots.iter_mut() {
        if tokens == 0 {
            break;
        }
        *slot += 1;
        tokens -= 1;
    }
    tokens
}
