use clap::Parser;
use client::network;
use log::info;
use shared::DEFAULT_PORT;
use tokio::io::BufReader;
use tokio::net::TcpStream;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value_t = format!("127.0.0.1:{}", DEFAULT_PORT))]
    server: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    info!("Connecting to: {}", args.server);
    let stream = TcpStream::connect(&args.server).await?;

    let input = BufReader::new(tokio::io::stdin());
    let mut output = tokio::io::stdout();
    network::relay(stream, input, &mut output).await?;

    Ok(())
}
