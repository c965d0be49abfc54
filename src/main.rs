// Node binary: spin up the peers and drive them from the console

use clap::Parser;
use std::sync::Arc;
use tinycoin::{Console, Node};

#[derive(Parser)]
#[command(name = "tinycoin")]
#[command(about = "Educational UTXO blockchain with in-process peers", long_about = None)]
struct Cli {
    /// Number of peers in the cluster (clamped to 3..=26)
    #[arg(short, long, default_value_t = 3)]
    peers: usize,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let count = cli.peers.clamp(3, 26);
    let names: Vec<String> = ('a'..='z').take(count).map(String::from).collect();

    let mut node = match Node::new(&names) {
        Ok(node) => node,
        Err(err) => {
            eprintln!("Error initializing: {err}");
            std::process::exit(1);
        }
    };
    node.start();

    let console = Console::new(Arc::new(node));
    tokio::select! {
        _ = console.run() => {}
        _ = tokio::signal::ctrl_c() => {}
    }
}
