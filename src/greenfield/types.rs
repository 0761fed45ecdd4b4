use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Fee {
    #[serde(default)]
    pub amount: Vec<Coin>,
    #[serde(default)]
    pub gas_limit: u64,
    #[serde(default)]
    pub payer: String,
    #[serde(default)]
    pub granter: String,
}

/// A decoded chain message in its snake_case JSON form, tagged with its wire type URL.
///
/// Enum fields may hold either their integer value or their symbolic name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChainMessage {
    pub type_url: String,
    pub value: serde_json::Value,
}

impl ChainMessage {
    pub fn new(type_url: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            type_url: type_url.into(),
            value,
        }
    }
}

/// Storage provider output gathered before signing a bucket or object creation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct BroadcastOptions {
    /// Base64 approval signature issued by the primary storage provider.
    #[serde(default)]
    pub sp_signature: Option<String>,
    #[serde(default)]
    pub checksums: Vec<String>,
}

/// Transaction body handed to the signer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UnsignedTx {
    pub messages: Vec<ChainMessage>,
    #[serde(default)]
    pub fee: Fee,
    #[serde(default)]
    pub broadcast_options: Option<BroadcastOptions>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: String,
    pub salt: String,
}

impl Domain {
    pub fn greenfield(chain_id: u64) -> Self {
        Self {
            name: "Greenfield Tx".to_string(),
            version: "1.0.0".to_string(),
            chain_id,
            verifying_contract: "greenfield".to_string(),
            salt: "0".to_string(),
        }
    }
}

/// Output of one signing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    /// 65 bytes, `r || s || v`.
    pub signature: Vec<u8>,
    pub digest: [u8; 32],
}
