use clap::Parser;
use log::info;
use server::config::ServerConfig;
use server::layout::MapLayout;
use server::network::Server;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Town layout file (JSON object list)
    #[arg(short, long)]
    map: Option<PathBuf>,

    /// Maximum number of connected clients
    #[arg(long, default_value = "32")]
    max_clients: usize,

    /// Seconds of silence before a client is dropped
    #[arg(long, default_value = "5")]
    client_timeout: u64,

    /// Spawn point for new players
    #[arg(long, default_value = "0")]
    spawn_x: f32,

    #[arg(long, default_value = "0")]
    spawn_y: f32,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            bind_addr: format!("{}:{}", args.host, args.port),
            max_clients: args.max_clients,
            client_timeout: Duration::from_secs(args.client_timeout),
            map_path: args.map,
            spawn: (args.spawn_x, args.spawn_y),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let config = ServerConfig::from(Args::parse());

    let layout = match &config.map_path {
        Some(path) => {
            info!("Loading town layout from {}", path.display());
            MapLayout::load(path)?
        }
        None => {
            info!("No layout given, starting a town without areas");
            MapLayout::default()
        }
    };

    let mut server = Server::new(&config, &layout).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
