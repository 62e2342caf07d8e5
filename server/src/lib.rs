//! # Mancala Game Server Library
//!
//! This library provides the authoritative server for a multi-player,
//! turn-based Mancala variant played over plain TCP text lines. Any number of
//! players sit around a ring; each owns a row of pits plus a store, and a
//! move sows tokens through the mover's own row and on around the ring.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative State
//! Clients are dumb terminals that send a pit number and print whatever the
//! server sends back. All validation, sowing and turn decisions happen here.
//!
//! ### Session Lifecycle
//! A connection is welcomed, registers a unique name, plays while it holds
//! the turn, and leaves by closing its socket. A departing turn holder
//! passes the turn on before it is removed.
//!
//! ### Synchronized Views
//! After every state change the full board is sent to every connection, so
//! all clients converge on the same picture.
//!
//! ## Architecture Design
//!
//! ### Single Owner Event Loop
//! One task owns the whole game. Per-connection reader tasks forward raw
//! bytes over a channel and per-connection writer tasks drain an outbound
//! line queue. Because only the owner mutates state and enqueues output,
//! every player observes events in the same order without any locking.
//!
//! ### Failure Isolation
//! A peer that cannot be written to is treated exactly like one that
//! disconnected. Only transport setup failures end the process.
//!
//! ## Module Organization
//!
//! - `config`: board size, initial tokens and name limits
//! - `error`: protocol, invariant and transport error types
//! - `player`: per-connection state and line buffering
//! - `registry`: the ring of connected players and ring navigation
//! - `turn`: the single turn token and its rotation
//! - `engine`: move validation and sowing
//! - `notify`: outbound queues, broadcasts and board snapshots
//! - `game`: the per-connection state machine tying it all together
//! - `network`: TCP listener, connection tasks and the control loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::GameConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::new("0.0.0.0:52381", GameConfig::default()).await?;
//!
//!     // Serves one game until some player's pits are all empty
//!     let scores = server.run().await?;
//!     for (name, total) in scores {
//!         println!("{} has {} points", name, total);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod network;
pub mod notify;
pub mod player;
pub mod registry;
pub mod turn;
