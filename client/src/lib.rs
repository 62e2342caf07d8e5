//! # Mancala Terminal Client
//!
//! A thin line relay for the Mancala server. The server does all the game
//! logic and formats every message as text, so the client only forwards
//! what the player types and prints what the server sends.
//!
//! Any line-based tool such as `telnet` or `nc` can stand in for it; this
//! client exists so the game can be played without one.

pub mod network;
