use std::{env, fs};

use anyhow::{bail, Context, Result};
use clap::Parser;
use ethers::types::{Signature, H256};
use log::info;

use greenfield_sdk::{
    cli::Args,
    config::NetworkConfig,
    greenfield::{build_typed_data, get_signature, AccountClient, KeyManager, NormalizeContext, UnsignedTx},
    helpers::encode_hex,
};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = NetworkConfig::from_env(args.network)?;
    if let Some(chain_id) = args.chain_id {
        config.chain_id = chain_id;
    }

    let private_key = env::var("PRIVATE_KEY").context("PRIVATE_KEY is not set")?;
    let mut key_manager = KeyManager::from_private_key(&private_key)?;

    let raw = fs::read_to_string(&args.tx)
        .with_context(|| format!("reading {}", args.tx.display()))?;
    let tx: UnsignedTx = serde_json::from_str(&raw).context("parsing transaction")?;

    match args.account_state() {
        Some(account) => key_manager.set_account(account),
        None if args.fetch_account => {
            let client = AccountClient::new(None, Some(config.rest_url.clone()));
            let account = client.fetch_account(key_manager.address()).await?;
            info!("fetched account state {account:?} from {}", config.rest_url);
            key_manager.set_account(account);
        }
        None => bail!("pass --account-number and --sequence, or --fetch-account"),
    }

    if args.print_typed_data {
        let ctx = NormalizeContext::new(tx.broadcast_options.as_ref());
        let typed_data = build_typed_data(&tx, config.chain_id, key_manager.account()?, &ctx)?;
        println!("{}", serde_json::to_string_pretty(&typed_data.to_json())?);
    }

    let signed = get_signature(&key_manager, &tx, config.chain_id)?;
    let signer = Signature::try_from(signed.signature.as_slice())?.recover(H256::from(signed.digest))?;

    println!("chain id:  {}", config.chain_id);
    println!("digest:    {}", encode_hex(&signed.digest));
    println!("signature: {}", encode_hex(&signed.signature));
    println!("signer:    {signer:?}");
    Ok(())
}
