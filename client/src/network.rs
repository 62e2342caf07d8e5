//! Line relay between a terminal and the game server

use log::{debug, info};
use shared::LINE_TERMINATOR;
use tokio::io::{
    self, AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader,
};

/// Relays lines in both directions until the server closes the connection.
///
/// Server lines are written to `output` with a plain `\n`. Input lines are
/// sent to the server terminated by CRLF. When `input` runs dry the relay
/// keeps printing server output, so a scripted session sees the game through.
pub async fn relay<S, I, O>(server: S, input: I, output: &mut O) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let (server_read, mut server_write) = io::split(server);
    let mut server_lines = BufReader::new(server_read).lines();
    let mut input_lines = input.lines();
    let mut input_open = true;

    loop {
        tokio::select! {
            line = server_lines.next_line() => {
                match line? {
                    Some(line) => {
                        output.write_all(line.trim_end_matches('\r').as_bytes()).await?;
                        output.write_all(b"\n").await?;
                        output.flush().await?;
                    }
                    None => {
                        info!("Server closed the connection");
                        return Ok(());
                    }
                }
            },

            line = input_lines.next_line(), if input_open => {
                match line? {
                    Some(line) => {
                        let data = format!("{}{}", line.trim_end_matches('\r'), LINE_TERMINATOR);
                        server_write.write_all(data.as_bytes()).await?;
                        server_write.flush().await?;
                    }
                    None => {
                        debug!("Input closed; still listening to the server");
                        input_open = false;
                    }
                }
            },
        }
    }
}
