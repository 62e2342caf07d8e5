use clap::Parser;
use log::{error, info};
use server::config::GameConfig;
use server::network::Server;
use shared::{DEFAULT_PEBBLES, DEFAULT_PITS, DEFAULT_PORT, MAX_NAME};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Multi-player Mancala server", long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Regular pits per player
    #[arg(long, default_value_t = DEFAULT_PITS)]
    pits: usize,

    /// Tokens per pit for the first player to join
    #[arg(long, default_value_t = DEFAULT_PEBBLES)]
    pebbles: u32,

    /// Longest accepted player name in bytes
    #[arg(long, default_value_t = MAX_NAME)]
    max_name: usize,
}

/// Main-method of the application.
/// Parses command-line arguments, then serves a single game to completion.
#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = GameConfig {
        pits: args.pits,
        pebbles: args.pebbles,
        max_name: args.max_name,
    };
    let address = format!("{}:{}", args.host, args.port);

    let result = match Server::new(&address, config).await {
        Ok(server) => server.run().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(scores) => info!("Game finished with {} players", scores.len()),
        Err(e) => {
            error!("Server error: {}", e);
            std::process::exit(1);
        }
    }
}
