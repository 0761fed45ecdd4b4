use std::fmt;

use ethers::{
    signers::{LocalWallet, Signer},
    types::Address,
};
use serde::{Deserialize, Serialize};

use crate::{
    greenfield::errors::{Error, Result},
    helpers::decode_hex,
};

const KEY_LENGTH: usize = 32;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccountState {
    pub account_number: u64,
    pub next_sequence: u64,
}

/// Signing key plus the on-chain account state the next transaction is signed against.
pub struct KeyManager {
    wallet: LocalWallet,
    account: Option<AccountState>,
}

impl KeyManager {
    /// Hex encoded secp256k1 key, with or without `0x`.
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let bytes = decode_hex(private_key).map_err(|e| Error::InvalidKey(e.to_string()))?;
        if bytes.len() != KEY_LENGTH {
            return Err(Error::InvalidKey(format!(
                "expected {KEY_LENGTH} key bytes, got {}",
                bytes.len()
            )));
        }
        let wallet =
            LocalWallet::from_bytes(&bytes).map_err(|e| Error::InvalidKey(e.to_string()))?;
        Ok(Self {
            wallet,
            account: None,
        })
    }

    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Errors until the account state has been set or fetched.
    pub fn account(&self) -> Result<AccountState> {
        self.account.ok_or_else(|| {
            Error::AccountState(format!(
                "account state of {:?} is not loaded",
                self.address()
            ))
        })
    }

    pub fn set_account(&mut self, account: AccountState) {
        self.account = Some(account);
    }

    pub fn increase_sequence(&mut self) -> Result<()> {
        let account = self
            .account
            .as_mut()
            .ok_or_else(|| Error::AccountState("account state is not loaded".to_string()))?;
        account.next_sequence += 1;
        Ok(())
    }
}

impl fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyManager")
            .field("address", &self.address())
            .field("account", &self.account)
            .finish()
    }
}
