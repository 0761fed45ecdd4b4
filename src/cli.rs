use clap::Parser;
use std::{path::PathBuf, str::FromStr};

use crate::{config::Network, greenfield::AccountState};

/// Sign a Greenfield transaction with EIP-712 and print the signature.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON file holding `messages`, `fee` and optional `broadcast_options`.
    #[arg(long)]
    pub tx: PathBuf,

    #[arg(long, value_parser = parse_network, default_value = "testnet")]
    pub network: Network,

    /// Overrides the chain id of the selected network.
    #[arg(long)]
    pub chain_id: Option<u64>,

    #[arg(long, requires = "sequence")]
    pub account_number: Option<u64>,

    #[arg(long, requires = "account_number")]
    pub sequence: Option<u64>,

    /// Query account number and sequence from the chain before signing.
    #[arg(long, conflicts_with_all = ["account_number", "sequence"])]
    pub fetch_account: bool,

    /// Also print the full typed data payload.
    #[arg(long)]
    pub print_typed_data: bool,
}

impl Args {
    pub fn account_state(&self) -> Option<AccountState> {
        match (self.account_number, self.sequence) {
            (Some(account_number), Some(next_sequence)) => Some(AccountState {
                account_number,
                next_sequence,
            }),
            _ => None,
        }
    }
}

pub fn parse_network(s: &str) -> Result<Network, String> {
    Network::from_str(s).map_err(|e| e.to_string())
}
