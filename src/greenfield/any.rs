//! Encoding of protobuf `Any` values nested inside chain messages.
//!
//! The verifier sees an `Any` as `{type, value}` where `value` is the JSON of the embedded
//! message with an `@type` key added, compact with sorted keys, and usually base64 wrapped.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use lazy_static::lazy_static;
use log::debug;
use serde_json::{Map, Value};

use crate::{
    greenfield::{
        eip712::{base_type, StructValue},
        errors::{Error, Result},
        registry::{self, MessageSchema, ANY_TYPE},
    },
    helpers::{pad_decimal, unscale_decimal, unscale_decimal_lossy},
};

pub const BASIC_ALLOWANCE: &str = "/cosmos.feegrant.v1beta1.BasicAllowance";
pub const PERIODIC_ALLOWANCE: &str = "/cosmos.feegrant.v1beta1.PeriodicAllowance";
pub const ALLOWED_MSG_ALLOWANCE: &str = "/cosmos.feegrant.v1beta1.AllowedMsgAllowance";
pub const CREATE_STORAGE_PROVIDER: &str = "/greenfield.sp.MsgCreateStorageProvider";
pub const DEPOSIT_AUTHORIZATION: &str = "/greenfield.sp.DepositAuthorization";
pub const STAKE_AUTHORIZATION: &str = "/cosmos.staking.v1beta1.StakeAuthorization";
pub const GENERIC_AUTHORIZATION: &str = "/cosmos.authz.v1beta1.GenericAuthorization";
pub const SEND_AUTHORIZATION: &str = "/cosmos.bank.v1beta1.SendAuthorization";
pub const ED25519_PUBKEY: &str = "/cosmos.crypto.ed25519.PubKey";

const AUTHORIZATION_TYPES: &[(i64, &str)] = &[
    (0, "AUTHORIZATION_TYPE_UNSPECIFIED"),
    (1, "AUTHORIZATION_TYPE_DELEGATE"),
    (2, "AUTHORIZATION_TYPE_UNDELEGATE"),
    (3, "AUTHORIZATION_TYPE_REDELEGATE"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Embedded {
    Plain,
    /// Serialized without default values.
    StakeAuthorization,
    /// Prices unscaled, JSON kept unwrapped.
    CreateStorageProvider,
    /// Commission rates rewritten, pubkey flattened, JSON kept unwrapped.
    CreateValidator,
}

lazy_static! {
    static ref EMBEDDED_TYPES: HashMap<&'static str, Embedded> = HashMap::from([
        (BASIC_ALLOWANCE, Embedded::Plain),
        (PERIODIC_ALLOWANCE, Embedded::Plain),
        (ALLOWED_MSG_ALLOWANCE, Embedded::Plain),
        (DEPOSIT_AUTHORIZATION, Embedded::Plain),
        (GENERIC_AUTHORIZATION, Embedded::Plain),
        (SEND_AUTHORIZATION, Embedded::Plain),
        (ED25519_PUBKEY, Embedded::Plain),
        (STAKE_AUTHORIZATION, Embedded::StakeAuthorization),
        (CREATE_STORAGE_PROVIDER, Embedded::CreateStorageProvider),
        (registry::MSG_CREATE_VALIDATOR, Embedded::CreateValidator),
    ]);
}

pub fn is_known_embedded(type_url: &str) -> bool {
    EMBEDDED_TYPES.contains_key(type_url)
}

/// Replaces every `TypeAny` field reachable from `type_name` with its `{type, value: bytes}`
/// form.
pub fn encode_any_fields(
    schema: &MessageSchema,
    type_name: &str,
    value: &mut StructValue,
) -> Result<()> {
    let Some(fields) = schema.fields(type_name) else {
        return Ok(());
    };
    for field in fields {
        let child_type = base_type(field.type_string);
        let Some(child) = value.get_mut(field.name) else {
            continue;
        };
        let items: Vec<&mut StructValue> = match child {
            StructValue::List(items) => items.iter_mut().collect(),
            StructValue::Null => vec![],
            other => vec![other],
        };
        for item in items {
            if child_type == ANY_TYPE {
                *item = encode_any(item)?;
            } else if schema.declares(child_type) {
                encode_any_fields(schema, child_type, item)?;
            }
        }
    }
    Ok(())
}

pub fn encode_any(value: &StructValue) -> Result<StructValue> {
    let (type_url, body) = split_any(value.to_json())?;
    let kind = EMBEDDED_TYPES
        .get(type_url.as_str())
        .copied()
        .ok_or_else(|| Error::UnknownType(type_url.clone()))?;
    if let Value::String(encoded) = &body {
        // Already in its final byte form, hex rendered.
        return any_value(&type_url, StructValue::String(encoded.clone()));
    }
    let Value::Object(mut body) = body else {
        return Err(Error::Encoding(format!(
            "embedded {type_url} must be given as a JSON object"
        )));
    };

    match kind {
        Embedded::Plain => {}
        Embedded::StakeAuthorization => {
            strip_defaults(&mut body);
            name_authorization_type(&mut body)?;
        }
        Embedded::CreateStorageProvider => {
            rewrite_string(&mut body, "read_price", unscale_decimal)?;
            rewrite_string(&mut body, "store_price", unscale_decimal)?;
        }
        Embedded::CreateValidator => rewrite_create_validator(&mut body)?,
    }
    body.insert("@type".to_string(), Value::String(type_url.clone()));

    let json = serde_json::to_string(&sort_keys(Value::Object(body)))
        .map_err(|e| Error::JsonParse(e.to_string()))?;
    debug!("embedded {type_url}: {json}");
    let bytes = match kind {
        Embedded::CreateStorageProvider | Embedded::CreateValidator => json.into_bytes(),
        Embedded::Plain | Embedded::StakeAuthorization => BASE64.encode(json).into_bytes(),
    };
    any_value(&type_url, StructValue::Bytes(bytes))
}

/// Key order of `Map` depends on serde_json's `preserve_order` feature, so order explicitly.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

fn any_value(type_url: &str, value: StructValue) -> Result<StructValue> {
    let mut any = StructValue::empty_struct();
    any.insert("type", StructValue::from(type_url))?;
    any.insert("value", value)?;
    Ok(any)
}

/// Accepts `{type | type_url, value}` as well as the canonical `{"@type", ...fields}`.
fn split_any(json: Value) -> Result<(String, Value)> {
    let Value::Object(mut fields) = json else {
        return Err(Error::Encoding("Any value must be a JSON object".to_string()));
    };
    if let Some(Value::String(type_url)) = fields.remove("@type") {
        return Ok((type_url, Value::Object(fields)));
    }
    let type_url = match fields.remove("type").or_else(|| fields.remove("type_url")) {
        Some(Value::String(type_url)) => type_url,
        _ => return Err(Error::Encoding("Any value without a type url".to_string())),
    };
    let body = fields.remove("value").unwrap_or(Value::Object(Map::new()));
    Ok((type_url, body))
}

fn rewrite_string(
    body: &mut Map<String, Value>,
    field: &str,
    rewrite: impl Fn(&str) -> Result<String>,
) -> Result<()> {
    if let Some(slot) = body.get_mut(field) {
        let text = match slot {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return Ok(()),
        };
        *slot = Value::String(rewrite(&text)?);
    }
    Ok(())
}

fn rewrite_create_validator(body: &mut Map<String, Value>) -> Result<()> {
    if let Some(Value::Object(commission)) = body.get_mut("commission") {
        rewrite_string(commission, "max_rate", unscale_decimal_lossy)?;
        rewrite_string(commission, "max_change_rate", unscale_decimal)?;
        // `rate` is padded, not divided. Signatures only verify against the chain this way.
        rewrite_string(commission, "rate", pad_decimal)?;
    }
    if let Some(pubkey) = body.get_mut("pubkey") {
        *pubkey = flatten_pubkey(pubkey.take())?;
    }
    Ok(())
}

/// `{type_url, value}` or `{"@type", key}` to `{"@type", key}`. A `value` holding the
/// protobuf encoding of the key (`0x0a 0x20` prefix) is reduced to the raw key.
fn flatten_pubkey(pubkey: Value) -> Result<Value> {
    let Value::Object(mut fields) = pubkey else {
        return Err(Error::Encoding("validator pubkey must be an object".to_string()));
    };
    let type_url = fields
        .remove("@type")
        .or_else(|| fields.remove("type_url"))
        .or_else(|| fields.remove("type"))
        .unwrap_or_else(|| Value::String(ED25519_PUBKEY.to_string()));
    let key = match fields.remove("key") {
        Some(key) => key,
        None => match fields.remove("value") {
            Some(Value::String(encoded)) => Value::String(strip_key_prefix(&encoded)?),
            Some(other) => other,
            None => return Err(Error::Encoding("validator pubkey without a key".to_string())),
        },
    };
    let mut flat = Map::new();
    flat.insert("@type".to_string(), type_url);
    flat.insert("key".to_string(), key);
    Ok(Value::Object(flat))
}

fn strip_key_prefix(encoded: &str) -> Result<String> {
    let raw = BASE64
        .decode(encoded)
        .map_err(|e| Error::Encoding(format!("validator pubkey is not base64: {e}")))?;
    Ok(match raw.as_slice() {
        [0x0a, 0x20, key @ ..] if key.len() == 32 => BASE64.encode(key),
        _ => encoded.to_string(),
    })
}

/// Enum by name. The unspecified value is a default and is dropped.
fn name_authorization_type(body: &mut Map<String, Value>) -> Result<()> {
    let Some(slot) = body.get_mut("authorization_type") else {
        return Ok(());
    };
    if let Some(number) = slot.as_i64() {
        let name = AUTHORIZATION_TYPES
            .iter()
            .find(|(value, _)| *value == number)
            .map(|(_, name)| *name)
            .ok_or_else(|| Error::Encoding(format!("unknown authorization_type value {number}")))?;
        *slot = Value::String(name.to_string());
    }
    if slot.as_str() == Some(AUTHORIZATION_TYPES[0].1) {
        body.remove("authorization_type");
    }
    Ok(())
}

fn strip_defaults(body: &mut Map<String, Value>) {
    body.retain(|_, v| {
        if let Value::Object(nested) = v {
            strip_defaults(nested);
        }
        !is_default(v)
    });
}

fn is_default(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(json: Value) -> StructValue {
        StructValue::try_from(json).unwrap()
    }

    fn bytes_of(any: &StructValue) -> Vec<u8> {
        match any.get("value") {
            Some(StructValue::Bytes(bytes)) => bytes.clone(),
            other => panic!("unexpected Any value {other:?}"),
        }
    }

    #[test]
    fn test_plain_embedded_is_base64_sorted_json() {
        let any = encode_any(&value(serde_json::json!({
            "type": DEPOSIT_AUTHORIZATION,
            "value": {"sp_address": "0x3", "max_deposit": {"denom": "BNB", "amount": "1"}},
        })))
        .unwrap();
        assert_eq!(any.get("type").unwrap().as_str(), Some(DEPOSIT_AUTHORIZATION));
        let decoded = BASE64.decode(bytes_of(&any)).unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            r#"{"@type":"/greenfield.sp.DepositAuthorization","max_deposit":{"amount":"1","denom":"BNB"},"sp_address":"0x3"}"#
        );
    }

    #[test]
    fn test_canonical_any_form() {
        let any = encode_any(&value(serde_json::json!({
            "@type": BASIC_ALLOWANCE,
            "spend_limit": [],
        })))
        .unwrap();
        let decoded = BASE64.decode(bytes_of(&any)).unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            r#"{"@type":"/cosmos.feegrant.v1beta1.BasicAllowance","spend_limit":[]}"#
        );
    }

    #[test]
    fn test_unknown_embedded_type() {
        let err = encode_any(&value(serde_json::json!({
            "type": "/cosmos.nft.v1beta1.MsgSend",
            "value": {},
        })))
        .unwrap_err();
        assert_eq!(err, Error::UnknownType("/cosmos.nft.v1beta1.MsgSend".to_string()));
    }

    #[test]
    fn test_encoded_value_of_unknown_type_is_rejected() {
        let err = encode_any(&value(serde_json::json!({
            "type": "/cosmos.nft.v1beta1.MsgSend",
            "value": "0x00",
        })))
        .unwrap_err();
        assert_eq!(err, Error::UnknownType("/cosmos.nft.v1beta1.MsgSend".to_string()));

        let known = encode_any(&value(serde_json::json!({
            "type": BASIC_ALLOWANCE,
            "value": "0x00",
        })))
        .unwrap();
        assert_eq!(known.get("value").unwrap().as_str(), Some("0x00"));
    }

    #[test]
    fn test_stake_authorization_drops_defaults() {
        let any = encode_any(&value(serde_json::json!({
            "type": STAKE_AUTHORIZATION,
            "value": {
                "max_tokens": null,
                "allow_list": {"address": ["0xa"]},
                "deny_list": {"address": []},
                "authorization_type": 1,
            },
        })))
        .unwrap();
        let decoded = BASE64.decode(bytes_of(&any)).unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            r#"{"@type":"/cosmos.staking.v1beta1.StakeAuthorization","allow_list":{"address":["0xa"]},"authorization_type":"AUTHORIZATION_TYPE_DELEGATE"}"#
        );
    }

    #[test]
    fn test_stake_authorization_type_names() {
        let encode = |authorization_type: Value| {
            encode_any(&value(serde_json::json!({
                "type": STAKE_AUTHORIZATION,
                "value": {"authorization_type": authorization_type},
            })))
        };
        for unspecified in [serde_json::json!(0), serde_json::json!("AUTHORIZATION_TYPE_UNSPECIFIED")] {
            let decoded = BASE64.decode(bytes_of(&encode(unspecified).unwrap())).unwrap();
            assert_eq!(
                String::from_utf8(decoded).unwrap(),
                r#"{"@type":"/cosmos.staking.v1beta1.StakeAuthorization"}"#
            );
        }
        let named = encode(serde_json::json!("AUTHORIZATION_TYPE_REDELEGATE")).unwrap();
        let json: Value = serde_json::from_slice(&BASE64.decode(bytes_of(&named)).unwrap()).unwrap();
        assert_eq!(json["authorization_type"], "AUTHORIZATION_TYPE_REDELEGATE");
        assert!(matches!(encode(serde_json::json!(7)), Err(Error::Encoding(_))));
    }

    #[test]
    fn test_create_storage_provider_is_plain_json() {
        let any = encode_any(&value(serde_json::json!({
            "type": CREATE_STORAGE_PROVIDER,
            "value": {"creator": "0x1", "read_price": "100000000000000000", "store_price": "0.5"},
        })))
        .unwrap();
        assert_eq!(
            String::from_utf8(bytes_of(&any)).unwrap(),
            r#"{"@type":"/greenfield.sp.MsgCreateStorageProvider","creator":"0x1","read_price":"0.100000000000000000","store_price":"0.5"}"#
        );
    }

    #[test]
    fn test_non_ascii_is_written_unescaped() {
        let any = encode_any(&value(serde_json::json!({
            "type": CREATE_STORAGE_PROVIDER,
            "value": {"creator": "0x1", "description": {"moniker": "노드 ü"}},
        })))
        .unwrap();
        let json = String::from_utf8(bytes_of(&any)).unwrap();
        assert!(json.contains(r#""moniker":"노드 ü""#));
        assert!(!json.contains("\\u"));
    }

    #[test]
    fn test_create_validator_rates_and_pubkey() {
        let key = BASE64.encode([1u8; 32]);
        let mut wrapped = vec![0x0a, 0x20];
        wrapped.extend_from_slice(&[1u8; 32]);
        let any = encode_any(&value(serde_json::json!({
            "type": registry::MSG_CREATE_VALIDATOR,
            "value": {
                "commission": {
                    "max_rate": "1000000000000000000",
                    "max_change_rate": "10000000000000000",
                    "rate": "0.07",
                },
                "pubkey": {"type_url": ED25519_PUBKEY, "value": BASE64.encode(&wrapped)},
            },
        })))
        .unwrap();
        let json: Value = serde_json::from_slice(&bytes_of(&any)).unwrap();
        assert_eq!(json["commission"]["max_rate"], "1.000000000000000000");
        assert_eq!(json["commission"]["max_change_rate"], "0.010000000000000000");
        assert_eq!(json["commission"]["rate"], "0.070000000000000000");
        assert_eq!(json["pubkey"], serde_json::json!({"@type": ED25519_PUBKEY, "key": key}));
    }

    #[test]
    fn test_nested_any_fields_follow_schema() {
        let schema = registry::schema_for(registry::MSG_SUBMIT_PROPOSAL).unwrap();
        let mut message = value(serde_json::json!({
            "messages": [
                {"type": BASIC_ALLOWANCE, "value": {}},
                {"type": SEND_AUTHORIZATION, "value": {"spend_limit": []}},
            ],
            "initial_deposit": [{"denom": "BNB", "amount": "1"}],
        }));
        encode_any_fields(schema, registry::MESSAGE_TYPE, &mut message).unwrap();
        let messages = message.get("messages").unwrap().as_list().unwrap();
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0].get("value"), Some(StructValue::Bytes(_))));
        assert_eq!(
            message.get("initial_deposit").unwrap().as_list().unwrap()[0]
                .get("denom")
                .unwrap()
                .as_str(),
            Some("BNB")
        );
    }
}
