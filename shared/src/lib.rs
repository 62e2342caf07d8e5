//! Text protocol shared between the Mancala server and its terminal client.
//!
//! Every message is a single line. The constants and helpers here return the
//! line body only; the transport appends [`LINE_TERMINATOR`] when writing.

pub const DEFAULT_PORT: u16 = 52381;
pub const DEFAULT_PITS: usize = 6;
pub const DEFAULT_PEBBLES: u32 = 4;
pub const MAX_NAME: usize = 80;
pub const LINE_TERMINATOR: &str = "\r\n";

pub const WELCOME_MESSAGE: &str = "Welcome to Mancala. What is your name?";
pub const REQUEST_MESSAGE: &str = "Your move?";
pub const WAIT_MESSAGE: &str = "It is not your move. Please wait!";
pub const INVALID_MOVE_MESSAGE: &str = "This is not a valid move";
pub const END_PIT_MESSAGE: &str = "Last move ended in end pit, your move again";
pub const NAME_REJECTED_MESSAGE: &str = "Name already taken or invalid, try again!";
pub const BOARD_TITLE: &str = "Current Playing Status";
pub const GAME_OVER_MESSAGE: &str = "Game over!";

pub fn joined(name: &str) -> String {
    format!("{} has joined the game", name)
}

pub fn left(name: &str) -> String {
    format!("{} has left the game", name)
}

pub fn moved_from(name: &str, pit: usize) -> String {
    format!("{} moved from pit {}", name, pit)
}

pub fn ended_in_end_pit(name: &str) -> String {
    format!("{} ended last move in endpit", name)
}

pub fn turn_of(name: &str) -> String {
    format!("It is {}'s turn", name)
}

pub fn points(name: &str, total: u32) -> String {
    format!("{} has {} points", name, total)
}

/// Formats one board row: the regular pits by index, then the end pit.
///
/// `slots` holds the regular pits followed by the store as its last element.
pub fn board_line(name: &str, slots: &[u32]) -> String {
    let mut line = format!("{}:", name);
    if let Some((store, pits)) = slots.split_last() {
        for (index, count) in pits.iter().enumerate() {
            line.push_str(&format!(" [{}]{}", index, count));
        }
        line.push_str(&format!("  [end pit]{}", store));
    }
    line
}

/// Removes one complete line from the front of `buffer`.
///
/// Returns the line without its `\n` or `\r\n` terminator, or `None` while no
/// terminator has arrived yet.
pub fn take_line(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let end = buffer.iter().position(|&b| b == b'\n')?;
    let mut line: Vec<u8> = buffer.drain(..=end).collect();
    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Some(line)
}
