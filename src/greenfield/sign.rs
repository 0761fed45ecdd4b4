use ethers::{
    signers::LocalWallet,
    types::{Signature, H256},
    utils::keccak256,
};
use log::{debug, info};

use crate::greenfield::{
    account::{AccountState, KeyManager},
    eip712::{encode_type, hash_struct, StructValue, TypeField, TypeRegistry},
    errors::{Error, Result},
    normalize::{normalize, NormalizeContext, NormalizedMessage},
    registry::{base_types, DOMAIN_TYPE, MESSAGE_TYPE, PRIMARY_TYPE},
    types::{Domain, Fee, SignedPayload, UnsignedTx},
};

/// Everything hashed for one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedData {
    pub types: TypeRegistry,
    pub primary_type: String,
    pub domain: Domain,
    pub message: StructValue,
}

impl TypedData {
    pub fn domain_value(&self) -> StructValue {
        domain_value(&self.domain)
    }

    pub fn domain_separator(&self) -> Result<[u8; 32]> {
        hash_struct(DOMAIN_TYPE, &self.domain_value(), &self.types)
    }

    /// `keccak256(0x1901 || domainSeparator || hashStruct(message))`
    pub fn encode_hash(&self) -> Result<[u8; 32]> {
        let mut digest_input = Vec::with_capacity(66);
        digest_input.extend_from_slice(&[0x19, 0x01]);
        digest_input.extend_from_slice(&self.domain_separator()?);
        digest_input.extend_from_slice(&hash_struct(
            &self.primary_type,
            &self.message,
            &self.types,
        )?);
        Ok(keccak256(digest_input))
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "types": serde_json::to_value(&self.types).unwrap_or_default(),
            "primaryType": self.primary_type,
            "domain": self.domain_value().to_json(),
            "message": self.message.to_json(),
        })
    }
}

fn domain_value(domain: &Domain) -> StructValue {
    let mut value = StructValue::empty_struct();
    if let StructValue::Struct(fields) = &mut value {
        fields.insert("chainId".to_string(), StructValue::from(domain.chain_id));
        fields.insert("name".to_string(), StructValue::from(domain.name.as_str()));
        fields.insert("salt".to_string(), StructValue::from(domain.salt.as_str()));
        fields.insert(
            "verifyingContract".to_string(),
            StructValue::from(domain.verifying_contract.as_str()),
        );
        fields.insert(
            "version".to_string(),
            StructValue::from(domain.version.as_str()),
        );
    }
    value
}

fn fee_value(fee: &Fee) -> Result<StructValue> {
    let amounts = fee
        .amount
        .iter()
        .map(|coin| -> Result<StructValue> {
            let mut entry = StructValue::empty_struct();
            entry.insert("amount", StructValue::from(coin.amount.as_str()))?;
            entry.insert("denom", StructValue::from(coin.denom.as_str()))?;
            Ok(entry)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut value = StructValue::empty_struct();
    value.insert("amount", StructValue::List(amounts))?;
    value.insert("gas_limit", StructValue::from(fee.gas_limit))?;
    value.insert("granter", StructValue::from(fee.granter.as_str()))?;
    value.insert("payer", StructValue::from(fee.payer.as_str()))?;
    Ok(value)
}

/// Moves every `Msg1` type of a single-message registry into the `Msg{index}` namespace.
pub fn rename_message_types(types: TypeRegistry, index: usize) -> TypeRegistry {
    if index == 1 {
        return types;
    }
    let target = format!("Msg{index}");
    let mut renamed = TypeRegistry::new();
    for (name, fields) in types.iter() {
        renamed.insert(
            name.replace(MESSAGE_TYPE, &target),
            fields
                .iter()
                .map(|f| TypeField::new(f.name.clone(), f.type_string.replace(MESSAGE_TYPE, &target)))
                .collect(),
        );
    }
    renamed
}

/// Assembles the typed data of `tx` without signing it.
pub fn build_typed_data(
    tx: &UnsignedTx,
    chain_id: u64,
    account: AccountState,
    ctx: &NormalizeContext<'_>,
) -> Result<TypedData> {
    if tx.messages.is_empty() {
        return Err(Error::Schema("transaction carries no messages".to_string()));
    }

    let mut types = base_types();
    let mut message = StructValue::empty_struct();
    message.insert("account_number", StructValue::from(account.account_number))?;
    message.insert("chain_id", StructValue::from(chain_id.to_string()))?;
    message.insert("fee", fee_value(&tx.fee)?)?;
    message.insert("memo", StructValue::from(""))?;
    message.insert("sequence", StructValue::from(account.next_sequence))?;
    message.insert("timeout_height", StructValue::from("0"))?;

    for (i, chain_message) in tx.messages.iter().enumerate() {
        let index = i + 1;
        let NormalizedMessage {
            value, types: msg_types, ..
        } = normalize(chain_message, ctx)?;
        types.merge(rename_message_types(msg_types, index))?;
        types
            .get_mut(PRIMARY_TYPE)
            .ok_or_else(|| Error::Schema(format!("type {PRIMARY_TYPE} is not registered")))?
            .push(TypeField::new(format!("msg{index}"), format!("Msg{index}")));
        message.insert(format!("msg{index}"), value)?;
    }
    types.canonicalize();

    debug!("encoded type: {}", encode_type(PRIMARY_TYPE, &types)?);
    Ok(TypedData {
        types,
        primary_type: PRIMARY_TYPE.to_string(),
        domain: Domain::greenfield(chain_id),
        message,
    })
}

/// Signs `tx` with the key and the current account state held by `key_manager`.
///
/// The sequence used is the one held at call time. Callers serialize sequence allocation
/// and call [`KeyManager::increase_sequence`] after a successful broadcast.
pub fn get_signature(
    key_manager: &KeyManager,
    tx: &UnsignedTx,
    chain_id: u64,
) -> Result<SignedPayload> {
    let ctx = NormalizeContext::new(tx.broadcast_options.as_ref());
    get_signature_with(key_manager, tx, chain_id, &ctx)
}

pub fn get_signature_with(
    key_manager: &KeyManager,
    tx: &UnsignedTx,
    chain_id: u64,
    ctx: &NormalizeContext<'_>,
) -> Result<SignedPayload> {
    let account = key_manager.account()?;
    let typed_data = build_typed_data(tx, chain_id, account, ctx)?;
    let digest = typed_data.encode_hash()?;
    debug!("eip712 digest: 0x{}", ethers::utils::hex::encode(digest));

    let signature = sign_hash(H256::from(digest), key_manager.wallet())?;
    info!(
        "signed {} message(s) for {:?} at sequence {}",
        tx.messages.len(),
        key_manager.address(),
        account.next_sequence
    );
    Ok(SignedPayload {
        signature: signature.to_vec(),
        digest,
    })
}

fn sign_hash(hash: H256, wallet: &LocalWallet) -> Result<Signature> {
    wallet
        .sign_hash(hash)
        .map_err(|e| Error::SignatureFailure(e.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use ethers::utils::hex;

    use super::*;
    use crate::greenfield::{
        registry,
        types::{ChainMessage, Coin},
    };

    const TEST_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const FROM: &str = "0x0000000000000000000000000000000000000001";
    const TO: &str = "0x0000000000000000000000000000000000000002";

    fn ctx() -> NormalizeContext<'static> {
        let now = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        NormalizeContext::at(None, now)
    }

    fn send(amount: &str) -> ChainMessage {
        ChainMessage::new(
            registry::MSG_SEND,
            serde_json::json!({
                "from_address": FROM,
                "to_address": TO,
                "amount": [{"denom": "BNB", "amount": amount}],
            }),
        )
    }

    fn send_tx(messages: Vec<ChainMessage>) -> UnsignedTx {
        UnsignedTx {
            messages,
            fee: Fee {
                amount: vec![Coin::new("BNB", "6000000000000")],
                gas_limit: 1200,
                payer: FROM.to_string(),
                granter: String::new(),
            },
            broadcast_options: None,
        }
    }

    fn key_manager(account_number: u64, next_sequence: u64) -> KeyManager {
        let mut km = KeyManager::from_private_key(TEST_KEY).unwrap();
        km.set_account(AccountState {
            account_number,
            next_sequence,
        });
        km
    }

    #[test]
    fn test_domain_separator_golden() {
        let typed = TypedData {
            types: base_types(),
            primary_type: PRIMARY_TYPE.to_string(),
            domain: Domain::greenfield(5600),
            message: StructValue::empty_struct(),
        };
        assert_eq!(
            hex::encode(typed.domain_separator().unwrap()),
            "af415613702189c52c2d91875089d82e2dacb207c04dfd210072b73f0ed78b7a"
        );
    }

    #[test]
    fn test_send_type_string() {
        let typed = build_typed_data(
            &send_tx(vec![send("1")]),
            5600,
            AccountState::default(),
            &ctx(),
        )
        .unwrap();
        assert_eq!(
            encode_type(PRIMARY_TYPE, &typed.types).unwrap(),
            "Tx(uint256 account_number,uint256 chain_id,Fee fee,string memo,Msg1 msg1,uint256 sequence,uint256 timeout_height)\
             Coin(uint256 amount,string denom)\
             Fee(Coin[] amount,uint256 gas_limit,string granter,string payer)\
             Msg1(TypeMsg1Amount[] amount,string from_address,string to_address,string type)\
             TypeMsg1Amount(string amount,string denom)"
        );
    }

    #[test]
    fn test_send_digest_golden() {
        let typed = build_typed_data(
            &send_tx(vec![send("1")]),
            5600,
            AccountState {
                account_number: 7,
                next_sequence: 3,
            },
            &ctx(),
        )
        .unwrap();
        assert_eq!(
            hex::encode(typed.encode_hash().unwrap()),
            "489694010e2198d3a8c583ac2e92d914b84ce22bffcb4403b3086c5e7d016d1f"
        );
    }

    #[test]
    fn test_signature_recovers_signer() {
        let km = key_manager(0, 0);
        let signed = get_signature_with(&km, &send_tx(vec![send("1")]), 5600, &ctx()).unwrap();
        assert_eq!(signed.signature.len(), 65);
        assert!(matches!(signed.signature[64], 27 | 28));

        let signature = Signature::try_from(signed.signature.as_slice()).unwrap();
        let recovered = signature.recover(H256::from(signed.digest)).unwrap();
        assert_eq!(recovered, km.address());
    }

    #[test]
    fn test_sequence_changes_digest() {
        let tx = send_tx(vec![send("1")]);
        let first = get_signature_with(&key_manager(0, 0), &tx, 5600, &ctx()).unwrap();
        let second = get_signature_with(&key_manager(0, 1), &tx, 5600, &ctx()).unwrap();
        assert_ne!(first.digest, second.digest);

        let other_chain = get_signature_with(&key_manager(0, 0), &tx, 9000, &ctx()).unwrap();
        assert_ne!(first.digest, other_chain.digest);
    }

    #[test]
    fn test_two_messages_use_separate_namespaces() {
        let typed = build_typed_data(
            &send_tx(vec![send("1"), send("2")]),
            5600,
            AccountState::default(),
            &ctx(),
        )
        .unwrap();

        for name in ["Msg1", "Msg2", "TypeMsg1Amount", "TypeMsg2Amount"] {
            assert!(typed.types.contains(name), "missing {name}");
        }
        let msg_fields: Vec<_> = typed
            .types
            .get(PRIMARY_TYPE)
            .unwrap()
            .iter()
            .filter(|f| f.name.starts_with("msg"))
            .map(|f| (f.name.as_str(), f.type_string.as_str()))
            .collect();
        assert_eq!(msg_fields, vec![("msg1", "Msg1"), ("msg2", "Msg2")]);
        assert_eq!(
            typed.types.get("Msg2").unwrap()[0].type_string,
            "TypeMsg2Amount[]"
        );
        assert!(typed.encode_hash().is_ok());
    }

    #[test]
    fn test_shared_types_merge_across_messages() {
        let authorization = serde_json::json!({"type_url": "/greenfield.sp.DepositAuthorization", "value": {"sp_address": "0x3"}});
        let grant = |grantee: &str| {
            ChainMessage::new(
                registry::MSG_GRANT,
                serde_json::json!({
                    "granter": FROM,
                    "grantee": grantee,
                    "grant": {"authorization": authorization.clone(), "expiration": null},
                }),
            )
        };
        let typed = build_typed_data(
            &send_tx(vec![grant(TO), grant(FROM)]),
            5600,
            AccountState::default(),
            &ctx(),
        )
        .unwrap();
        assert!(typed.types.contains("TypeAny"));
        assert!(typed.types.contains("TypeMsg2Grant"));
        assert!(typed.encode_hash().is_ok());
    }

    #[test]
    fn test_missing_account_state() {
        let km = KeyManager::from_private_key(TEST_KEY).unwrap();
        let err = get_signature_with(&km, &send_tx(vec![send("1")]), 5600, &ctx()).unwrap_err();
        assert!(matches!(err, Error::AccountState(_)));
    }

    #[test]
    fn test_unsupported_message_and_empty_tx() {
        let km = key_manager(0, 0);
        let unknown = ChainMessage::new("/greenfield.virtualgroup.MsgSettle", serde_json::json!({}));
        assert!(matches!(
            get_signature_with(&km, &send_tx(vec![unknown]), 5600, &ctx()),
            Err(Error::Schema(_))
        ));
        assert!(matches!(
            get_signature_with(&km, &send_tx(vec![]), 5600, &ctx()),
            Err(Error::Schema(_))
        ));
    }

    #[test]
    fn test_missing_message_field_is_encoding_error() {
        let km = key_manager(0, 0);
        let message = ChainMessage::new(
            registry::MSG_SEND,
            serde_json::json!({"from_address": FROM, "amount": []}),
        );
        let err = get_signature_with(&km, &send_tx(vec![message]), 5600, &ctx()).unwrap_err();
        assert_eq!(
            err,
            Error::Encoding("missing value for field to_address".to_string())
        );
    }

    #[test]
    fn test_caller_message_is_untouched() {
        let tx = send_tx(vec![ChainMessage::new(
            registry::MSG_CREATE_GROUP,
            serde_json::json!({"creator": FROM, "group_name": "g", "members": [], "extra": ""}),
        )]);
        let before = tx.clone();
        let typed = build_typed_data(&tx, 5600, AccountState::default(), &ctx()).unwrap();
        assert_eq!(tx, before);
        assert!(typed
            .types
            .get("Msg1")
            .unwrap()
            .iter()
            .all(|f| f.name != "members"));
    }
}
