// Interactive operator console

use crate::network::Node;
use std::io::Write as _;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

const OPERATIONS: [&str; 7] = [
    "Transfer coins 'a' -> 'b'",
    "Transfer coins 'b' -> 'c'",
    "Transfer coins 'c' -> 'a'",
    "Print-block Chain",
    "Print-balance for all peers",
    "Print-block Chain length",
    "Print-current block",
];

/// Reads numbered operations from stdin and drives the node. Any error
/// coming back from a transfer is printed and the loop continues.
pub struct Console {
    node: Arc<Node>,
}

impl Console {
    pub fn new(node: Arc<Node>) -> Console {
        Console { node }
    }

    /// Run until stdin is closed
    pub async fn run(&self) {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            println!("-----------Enter operation type----------------:");
            for (i, operation) in OPERATIONS.iter().enumerate() {
                println!("{} for {:?}", i + 1, operation);
            }
            let Some(input) = prompt(&mut lines, "Operation: ").await else {
                return;
            };
            if input.parse::<f64>().is_err() {
                println!("Invalid number");
                continue;
            }
            match input.as_str() {
                "1" => self.transfer("a", "b", "a", &mut lines).await,
                "2" => self.transfer("b", "c", "a", &mut lines).await,
                "3" => self.transfer("c", "a", "a", &mut lines).await,
                "4" => self.print_chain(&mut lines).await,
                "5" => self.print_balances().await,
                "6" => self.print_chain_lengths().await,
                "7" => self.print_current_block().await,
                _ => {}
            }
        }
    }

    async fn transfer(&self, from: &str, to: &str, miner: &str, lines: &mut ConsoleInput) {
        let Some(input) = prompt(lines, "Enter the amount you want to transfer: ").await else {
            return;
        };
        let Ok(amount) = input.parse::<i64>() else {
            println!("Invalid number");
            return;
        };
        if let Err(err) = self.node.transfer(from, to, miner, amount).await {
            println!("{err}");
        }
    }

    async fn print_chain(&self, lines: &mut ConsoleInput) {
        let Some(name) = prompt(lines, "Enter the name of the peer to show its chain: ").await
        else {
            return;
        };
        match self.node.peer(&name) {
            Ok(peer) => println!("{}", peer.chain_string().await),
            Err(err) => println!("{err}"),
        }
    }

    async fn print_balances(&self) {
        for peer in self.node.peers() {
            println!("Peer: '{}'. Balance: {}", peer.name(), peer.balance().await);
        }
    }

    async fn print_chain_lengths(&self) {
        for peer in self.node.peers() {
            println!(
                "Peer: '{}', Blockchain length: {}",
                peer.name(),
                peer.chain_len().await
            );
        }
    }

    async fn print_current_block(&self) {
        match self.node.peer("a") {
            Ok(peer) => println!("{}", peer.tip_detail().await),
            Err(err) => println!("{err}"),
        }
    }
}

type ConsoleInput = Lines<BufReader<Stdin>>;

/// Print `label`, then read one trimmed line. `None` on closed stdin.
async fn prompt(lines: &mut ConsoleInput, label: &str) -> Option<String> {
    print!("{label}");
    std::io::stdout().flush().ok();
    match lines.next_line().await {
        Ok(Some(line)) => Some(line.trim().to_string()),
        _ => None,
    }
}
