//! Bootstrap connection binary.

mod cli;

use ant_client::Client;
use clap::Parser;
use eyre::WrapErr;
use tracing::info;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    ant_observability::init_logging(&cli.logs).wrap_err("initializing logging")?;

    let config = cli.client_config()?;
    let client = Client::connect_with_config(&config, &cli.peers)
        .await
        .wrap_err("connecting to bootstrap peers")?;

    for peer in client.connected_peers() {
        println!("{} {} {:?}", peer.identity, peer.endpoint, peer.latency);
    }
    for failure in client.bootstrap_failures() {
        println!("failed {failure}");
    }

    info!(peers = client.peer_count(), "Holding connections, press Ctrl-C to exit");
    tokio::signal::ctrl_c()
        .await
        .wrap_err("waiting for Ctrl-C")?;

    client.close();
    info!("Shut down");
    Ok(())
}
