//! Server network layer handling TCP connections and the game control loop

use crate::config::GameConfig;
use crate::error::ServerError;
use crate::game::GameState;
use crate::notify::Outbox;
use crate::player::ClientId;
use log::{debug, error, info, warn};
use shared::LINE_TERMINATOR;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Largest chunk handed to the game from a single read
pub const READ_CHUNK: usize = 1024;

/// How long queued lines may take to flush once the game is over
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Messages sent from connection tasks to the control loop
#[derive(Debug)]
pub enum ServerMessage {
    BytesReceived { client_id: ClientId, bytes: Vec<u8> },
    Disconnected { client_id: ClientId },
    WriteFailed { client_id: ClientId },
}

/// Owns the listener and the game; the only task that touches game state
pub struct Server {
    listener: TcpListener,
    game_state: GameState,
    next_client_id: ClientId,
    writers: JoinSet<()>,

    // Communication channel from connection tasks
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn new(addr: &str, config: GameConfig) -> Result<Self, ServerError> {
        let config = config.validate()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        info!("Server listening on {}", listener.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            game_state: GameState::new(config),
            next_client_id: 1,
            writers: JoinSet::new(),
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Splits a fresh connection into reader and writer tasks and hands it
    /// to the game.
    fn accept_connection(&mut self, stream: TcpStream, addr: SocketAddr) {
        let client_id = self.allocate_client_id();
        info!("Client {} connected from {}", client_id, addr);

        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not disable Nagle for client {}: {}", client_id, e);
        }
        let (reader, writer) = stream.into_split();
        let (line_tx, line_rx) = mpsc::unbounded_channel();

        let reader_task = tokio::spawn(read_chunks(reader, client_id, self.server_tx.clone()));
        self.writers.spawn(write_lines(
            writer,
            line_rx,
            client_id,
            self.server_tx.clone(),
        ));

        let outbox = Outbox::new(client_id, line_tx).with_reader(reader_task.abort_handle());
        self.game_state.connect(client_id, outbox);
    }

    /// Hands out the next id, wrapping around and skipping ids that are
    /// still connected.
    fn allocate_client_id(&mut self) -> ClientId {
        loop {
            let client_id = self.next_client_id;
            self.next_client_id = self.next_client_id.wrapping_add(1);
            if self.game_state.registry().get(client_id).is_none() {
                return client_id;
            }
        }
    }

    fn handle_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::BytesReceived { client_id, bytes } => {
                self.game_state.receive(client_id, &bytes);
            }
            ServerMessage::Disconnected { client_id } => {
                info!("Client {} closed the connection", client_id);
                self.game_state.disconnect(client_id);
            }
            ServerMessage::WriteFailed { client_id } => {
                warn!("Dropping client {} after a failed write", client_id);
                self.game_state.disconnect(client_id);
            }
        }
    }

    /// Main server loop: runs until the game is over.
    ///
    /// Returns the final `(name, total)` scores. Bind, accept and other
    /// transport failures end the loop with an error.
    pub async fn run(mut self) -> Result<Vec<(String, u32)>, ServerError> {
        info!("Server started successfully");

        while !self.game_state.is_over() {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, addr) = accepted.map_err(ServerError::Accept)?;
                    self.accept_connection(stream, addr);
                },

                message = self.server_rx.recv() => {
                    match message {
                        Some(message) => self.handle_message(message),
                        None => break,
                    }
                },

                // Reap writers of connections that are already gone
                Some(_) = self.writers.join_next(), if !self.writers.is_empty() => {},
            }

            // Everything already queued is ready; handle it before waiting again
            while !self.game_state.is_over() {
                match self.server_rx.try_recv() {
                    Ok(message) => self.handle_message(message),
                    Err(_) => break,
                }
            }
        }

        let scores = self.game_state.scores().map(<[_]>::to_vec).unwrap_or_default();
        self.shutdown().await;
        Ok(scores)
    }

    /// Closes every connection and gives the writers a bounded window to
    /// flush what the game queued last.
    async fn shutdown(&mut self) {
        self.game_state.close_all();

        let drain = async {
            while self.writers.join_next().await.is_some() {}
        };
        if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
            warn!("Some clients did not receive the final results in time");
            self.writers.abort_all();
        }
        info!("Server shut down");
    }
}

/// Forwards raw chunks from one connection until end-of-stream.
async fn read_chunks(
    mut reader: OwnedReadHalf,
    client_id: ClientId,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
) {
    let mut buffer = [0u8; READ_CHUNK];

    loop {
        let message = match reader.read(&mut buffer).await {
            Ok(0) => ServerMessage::Disconnected { client_id },
            Ok(len) => ServerMessage::BytesReceived {
                client_id,
                bytes: buffer[..len].to_vec(),
            },
            Err(e) => {
                warn!("Error reading from client {}: {}", client_id, e);
                ServerMessage::Disconnected { client_id }
            }
        };
        let done = matches!(message, ServerMessage::Disconnected { .. });

        if let Err(e) = server_tx.send(message) {
            error!("Failed to send to control loop: {}", e);
            break;
        }
        if done {
            break;
        }
    }
}

/// Writes queued lines to one connection, terminating each with CRLF.
/// Shuts the socket down once the queue is closed and drained.
async fn write_lines(
    mut writer: OwnedWriteHalf,
    mut line_rx: mpsc::UnboundedReceiver<String>,
    client_id: ClientId,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
) {
    while let Some(line) = line_rx.recv().await {
        let data = format!("{}{}", line, LINE_TERMINATOR);
        if let Err(e) = writer.write_all(data.as_bytes()).await {
            warn!("Error writing to client {}: {}", client_id, e);
            let _ = server_tx.send(ServerMessage::WriteFailed { client_id });
            return;
        }
    }

    if let Err(e) = writer.shutdown().await {
        debug!("Error shutting down client {}: {}", client_id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ConnectionPhase;
    use tokio::io::{AsyncBufReadExt, BufReader};

    async fn test_server() -> Server {
        Server::new("127.0.0.1:0", GameConfig::default())
            .await
            .expect("bind test server")
    }

    #[tokio::test]
    async fn test_bind_reports_address() {
        let server = test_server().await;
        let addr = server.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let first = test_server().await;
        let addr = first.local_addr().unwrap().to_string();

        let second = Server::new(&addr, GameConfig::default()).await;
        assert!(matches!(second, Err(ServerError::Bind { .. })));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = GameConfig {
            pits: 0,
            ..GameConfig::default()
        };
        let result = Server::new("127.0.0.1:0", config).await;
        assert!(matches!(result, Err(ServerError::Config(_))));
    }

    #[tokio::test]
    async fn test_writer_terminates_lines_and_shuts_down() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server_side, _) = listener.accept().await.unwrap();

        let (_reader, writer) = server_side.into_split();
        let (line_tx, line_rx) = mpsc::unbounded_channel();
        let (server_tx, _server_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(write_lines(writer, line_rx, 1, server_tx));

        line_tx.send("Your move?".to_string()).unwrap();
        line_tx.send("Game over!".to_string()).unwrap();
        drop(line_tx);
        task.await.unwrap();

        let mut received = String::new();
        BufReader::new(client)
            .read_to_string(&mut received)
            .await
            .unwrap();
        assert_eq!(received, "Your move?\r\nGame over!\r\n");
    }

    #[tokio::test]
    async fn test_reader_forwards_chunks_then_eof() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let mut client = TcpStream::connect(addr).await.unwrap();
        let (server_side, _) = listener.accept().await.unwrap();

        let (reader, _writer) = server_side.into_split();
        let (server_tx, mut server_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(read_chunks(reader, 7, server_tx));

        client.write_all(b"Alice\r\n").await.unwrap();
        client.shutdown().await.unwrap();
        drop(client);
        task.await.unwrap();

        let mut bytes = Vec::new();
        let mut closed = false;
        while let Ok(message) = server_rx.try_recv() {
            match message {
                ServerMessage::BytesReceived { client_id, bytes: chunk } => {
                    assert_eq!(client_id, 7);
                    bytes.extend(chunk);
                }
                ServerMessage::Disconnected { client_id } => {
                    assert_eq!(client_id, 7);
                    closed = true;
                }
                other => panic!("Unexpected message {:?}", other),
            }
        }
        assert_eq!(bytes, b"Alice\r\n".to_vec());
        assert!(closed);
    }

    #[tokio::test]
    async fn test_welcome_sent_on_accept() {
        let server = test_server().await;
        let addr = server.local_addr().unwrap();
        let handle = tokio::spawn(server.run());

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut lines = BufReader::new(stream).lines();
        let first = lines.next_line().await.unwrap();
        assert_eq!(first.as_deref(), Some(shared::WELCOME_MESSAGE));

        handle.abort();
    }

    #[tokio::test]
    async fn test_write_failure_departs_player() {
        let mut server = test_server().await;
        let (alice_tx, _alice_rx) = mpsc::unbounded_channel();
        let (bob_tx, mut bob_rx) = mpsc::unbounded_channel();
        server.game_state.connect(1, Outbox::new(1, alice_tx));
        server.game_state.receive(1, b"Alice\r\n");
        server.game_state.connect(2, Outbox::new(2, bob_tx));
        server.game_state.receive(2, b"Bob\r\n");
        while bob_rx.try_recv().is_ok() {}

        server.handle_message(ServerMessage::WriteFailed { client_id: 1 });

        assert_eq!(server.game_state.phase(1), ConnectionPhase::Closed);
        assert_eq!(server.game_state.turn_holder(), Some(2));
        let mut bob = Vec::new();
        while let Ok(line) = bob_rx.try_recv() {
            bob.push(line);
        }
        assert_eq!(bob[0], shared::REQUEST_MESSAGE);
        assert!(bob.contains(&"Alice has left the game".to_string()));
    }

    #[tokio::test]
    async fn test_client_ids_wrap_and_skip_live_connections() {
        let mut server = test_server().await;
        let (tx, _rx) = mpsc::unbounded_channel();
        server.game_state.connect(0, Outbox::new(0, tx));
        server.next_client_id = ClientId::MAX;

        assert_eq!(server.allocate_client_id(), ClientId::MAX);
        assert_eq!(server.allocate_client_id(), 1);
        assert_eq!(server.allocate_client_id(), 2);
    }

    #[tokio::test]
    async fn test_closed_connection_writer_completes() {
        let server = test_server().await;
        let addr = server.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut server = server;
            let (stream, peer) = server.listener.accept().await.unwrap();
            server.accept_connection(stream, peer);
            server.game_state.disconnect(1);

            let reaped = tokio::time::timeout(Duration::from_secs(5), server.writers.join_next());
            assert!(reaped.await.unwrap().is_some());
            assert!(server.writers.is_empty());
        });

        let _client = TcpStream::connect(addr).await.unwrap();
        handle.await.unwrap();
    }
}
