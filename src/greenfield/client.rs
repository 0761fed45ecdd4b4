use ethers::types::Address;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    config::Network,
    greenfield::{
        account::AccountState,
        errors::{Error, Result},
    },
};

#[derive(Debug, Clone)]
struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    async fn get(&self, path: &str) -> Result<String> {
        let url = format!("{}{path}", self.base_url);
        debug!("GET {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::Http(format!("{url} returned {status}: {body}")));
        }
        Ok(body)
    }
}

#[derive(Deserialize, Debug)]
struct AccountResponse {
    account: BaseAccount,
}

#[derive(Deserialize, Debug)]
struct BaseAccount {
    #[serde(default)]
    account_number: String,
    #[serde(default)]
    sequence: String,
}

/// Reads account state over the chain's REST gateway.
#[derive(Debug, Clone)]
pub struct AccountClient {
    http_client: HttpClient,
}

impl AccountClient {
    pub fn new(client: Option<Client>, base_url: Option<String>) -> Self {
        let client = client.unwrap_or_default();
        let base_url = base_url
            .unwrap_or_else(|| Network::Testnet.get_url())
            .trim_end_matches('/')
            .to_string();
        Self {
            http_client: HttpClient { client, base_url },
        }
    }

    pub async fn fetch_account(&self, address: Address) -> Result<AccountState> {
        let body = self
            .http_client
            .get(&format!("/cosmos/auth/v1beta1/accounts/{address:?}"))
            .await?;
        parse_account(&body)
    }
}

fn parse_account(body: &str) -> Result<AccountState> {
    let response: AccountResponse =
        serde_json::from_str(body).map_err(|e| Error::JsonParse(e.to_string()))?;
    let parse = |field: &str, value: &str| {
        if value.is_empty() {
            return Ok(0);
        }
        value
            .parse::<u64>()
            .map_err(|e| Error::AccountState(format!("{field} {value}: {e}")))
    };
    Ok(AccountState {
        account_number: parse("account_number", &response.account.account_number)?,
        next_sequence: parse("sequence", &response.account.sequence)?,
    })
}
