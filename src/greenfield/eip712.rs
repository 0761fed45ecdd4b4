//! EIP-712 structured data hashing over a dynamic type registry.
//!
//! Greenfield messages are not known at compile time, so instead of deriving `Eip712` per
//! struct the schema lives in a [`TypeRegistry`] and the values in a [`StructValue`] tree.

use std::collections::BTreeMap;

use ethers::{
    abi::{encode, Token},
    types::{Address, I256, U256},
    utils::{hex, keccak256},
};
use serde::{Deserialize, Serialize};

use crate::greenfield::errors::{Error, Result};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TypeField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_string: String,
}

impl TypeField {
    pub fn new(name: impl Into<String>, type_string: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_string: type_string.into(),
        }
    }
}

/// Struct name to ordered field list.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct TypeRegistry {
    types: BTreeMap<String, Vec<TypeField>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, fields: Vec<TypeField>) {
        self.types.insert(name.into(), fields);
    }

    pub fn get(&self, name: &str) -> Option<&[TypeField]> {
        self.types.get(name).map(Vec::as_slice)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Vec<TypeField>> {
        self.types.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[TypeField])> {
        self.types
            .iter()
            .map(|(name, fields)| (name.as_str(), fields.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Adds every type of `other`. A name defined on both sides must describe the same
    /// field set, otherwise the merged registry would hash differently depending on order.
    pub fn merge(&mut self, other: TypeRegistry) -> Result<()> {
        for (name, fields) in other.types {
            match self.types.get(&name) {
                Some(existing) if !same_field_set(existing, &fields) => {
                    return Err(Error::Schema(format!(
                        "conflicting definitions for type {name}"
                    )));
                }
                Some(_) => {}
                None => {
                    self.types.insert(name, fields);
                }
            }
        }
        Ok(())
    }

    /// Sorts the fields of every type by name, the layout the chain verifier derives from
    /// its sorted JSON view of the transaction.
    pub fn canonicalize(&mut self) {
        for fields in self.types.values_mut() {
            fields.sort_by(|a, b| a.name.cmp(&b.name));
        }
    }
}

fn same_field_set(a: &[TypeField], b: &[TypeField]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_by(|x, y| x.name.cmp(&y.name));
    b.sort_by(|x, y| x.name.cmp(&y.name));
    a == b
}

/// Runtime value tree hashed against a [`TypeRegistry`].
///
/// `Struct` keeps its keys in a `BTreeMap`, so every struct is deep-sorted by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructValue {
    Null,
    Bool(bool),
    Number(i128),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<StructValue>),
    Struct(BTreeMap<String, StructValue>),
}

impl StructValue {
    pub fn empty_struct() -> Self {
        StructValue::Struct(BTreeMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&StructValue> {
        match self {
            StructValue::Struct(map) => map.get(key),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut StructValue> {
        match self {
            StructValue::Struct(map) => map.get_mut(key),
            _ => None,
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: StructValue) -> Result<()> {
        match self {
            StructValue::Struct(map) => {
                map.insert(key.into(), value);
                Ok(())
            }
            other => Err(Error::Encoding(format!(
                "cannot set a field on non-struct value {other:?}"
            ))),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<StructValue> {
        match self {
            StructValue::Struct(map) => map.remove(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StructValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[StructValue]> {
        match self {
            StructValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<StructValue>> {
        match self {
            StructValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StructValue::Null)
    }

    /// JSON view used for logging and the CLI. Bytes render as `0x` hex.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            StructValue::Null => serde_json::Value::Null,
            StructValue::Bool(b) => serde_json::Value::Bool(*b),
            StructValue::Number(n) => i64::try_from(*n)
                .map(serde_json::Value::from)
                .or_else(|_| u64::try_from(*n).map(serde_json::Value::from))
                .unwrap_or_else(|_| serde_json::Value::String(n.to_string())),
            StructValue::String(s) => serde_json::Value::String(s.clone()),
            StructValue::Bytes(b) => serde_json::Value::String(format!("0x{}", hex::encode(b))),
            StructValue::List(items) => {
                serde_json::Value::Array(items.iter().map(StructValue::to_json).collect())
            }
            StructValue::Struct(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl TryFrom<serde_json::Value> for StructValue {
    type Error = Error;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        Ok(match value {
            serde_json::Value::Null => StructValue::Null,
            serde_json::Value::Bool(b) => StructValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    StructValue::Number(i.into())
                } else if let Some(u) = n.as_u64() {
                    StructValue::Number(u.into())
                } else {
                    return Err(Error::Encoding(format!(
                        "floating point value {n} cannot be encoded"
                    )));
                }
            }
            serde_json::Value::String(s) => StructValue::String(s),
            serde_json::Value::Array(items) => StructValue::List(
                items
                    .into_iter()
                    .map(StructValue::try_from)
                    .collect::<Result<_>>()?,
            ),
            serde_json::Value::Object(map) => StructValue::Struct(
                map.into_iter()
                    .map(|(k, v)| StructValue::try_from(v).map(|v| (k, v)))
                    .collect::<Result<_>>()?,
            ),
        })
    }
}

impl From<&str> for StructValue {
    fn from(value: &str) -> Self {
        StructValue::String(value.to_string())
    }
}

impl From<String> for StructValue {
    fn from(value: String) -> Self {
        StructValue::String(value)
    }
}

impl From<u64> for StructValue {
    fn from(value: u64) -> Self {
        StructValue::Number(value.into())
    }
}

impl From<bool> for StructValue {
    fn from(value: bool) -> Self {
        StructValue::Bool(value)
    }
}

/// `"Coin[]"` -> `"Coin"`, `"uint256[2][]"` -> `"uint256"`.
pub fn base_type(type_string: &str) -> &str {
    match type_string.find('[') {
        Some(i) => &type_string[..i],
        None => type_string,
    }
}

fn array_element_type(type_string: &str) -> Option<&str> {
    if type_string.ends_with(']') {
        type_string.rfind('[').map(|i| &type_string[..i])
    } else {
        None
    }
}

/// Struct types reachable from `type_name`, in first-discovered (depth-first) order.
/// The root itself is not part of the result; primitives resolve to an empty list.
pub fn resolve_dependencies(type_name: &str, registry: &TypeRegistry) -> Result<Vec<String>> {
    let root = base_type(type_name);
    let mut found = Vec::new();
    let mut path = vec![root.to_string()];
    if let Some(fields) = registry.get(root) {
        for field in fields {
            collect_dependencies(base_type(&field.type_string), registry, &mut found, &mut path)?;
        }
    }
    Ok(found)
}

fn collect_dependencies(
    type_name: &str,
    registry: &TypeRegistry,
    found: &mut Vec<String>,
    path: &mut Vec<String>,
) -> Result<()> {
    let Some(fields) = registry.get(type_name) else {
        return Ok(());
    };
    if path.iter().any(|t| t == type_name) {
        return Err(Error::Schema(format!(
            "type cycle detected: {} -> {type_name}",
            path.join(" -> ")
        )));
    }
    if found.iter().any(|t| t == type_name) {
        return Ok(());
    }
    found.push(type_name.to_string());
    path.push(type_name.to_string());
    for field in fields {
        collect_dependencies(base_type(&field.type_string), registry, found, path)?;
    }
    path.pop();
    Ok(())
}

/// `Primary(...)Dep1(...)Dep2(...)` with the dependencies sorted alphabetically.
pub fn encode_type(primary_type: &str, registry: &TypeRegistry) -> Result<String> {
    let primary = base_type(primary_type);
    let mut deps = resolve_dependencies(primary, registry)?;
    deps.retain(|d| d != primary);
    deps.sort();

    let mut encoded = String::new();
    for type_name in std::iter::once(primary.to_string()).chain(deps) {
        let fields = registry
            .get(&type_name)
            .filter(|fields| !fields.is_empty())
            .ok_or_else(|| {
                Error::Schema(format!("no type definition specified for {type_name}"))
            })?;
        let members: Vec<String> = fields
            .iter()
            .map(|f| format!("{} {}", f.type_string, f.name))
            .collect();
        encoded.push_str(&type_name);
        encoded.push('(');
        encoded.push_str(&members.join(","));
        encoded.push(')');
    }
    Ok(encoded)
}

pub fn hash_type(primary_type: &str, registry: &TypeRegistry) -> Result<[u8; 32]> {
    Ok(keccak256(encode_type(primary_type, registry)?.as_bytes()))
}

pub fn hash_struct(
    primary_type: &str,
    value: &StructValue,
    registry: &TypeRegistry,
) -> Result<[u8; 32]> {
    Ok(keccak256(encode_data(primary_type, value, registry)?))
}

/// ABI encoding of `typeHash || field slots`, the pre-image of [`hash_struct`].
pub fn encode_data(
    primary_type: &str,
    value: &StructValue,
    registry: &TypeRegistry,
) -> Result<Vec<u8>> {
    let fields = registry
        .get(primary_type)
        .ok_or_else(|| Error::Schema(format!("type {primary_type} is not registered")))?;
    let StructValue::Struct(entries) = value else {
        return Err(Error::Encoding(format!(
            "expected a struct value for type {primary_type}"
        )));
    };

    let mut tokens = Vec::with_capacity(fields.len() + 1);
    tokens.push(Token::FixedBytes(hash_type(primary_type, registry)?.to_vec()));
    for field in fields {
        tokens.push(encode_field(
            &field.name,
            &field.type_string,
            entries.get(&field.name),
            registry,
        )?);
    }
    Ok(encode(&tokens))
}

fn encode_field(
    name: &str,
    type_string: &str,
    value: Option<&StructValue>,
    registry: &TypeRegistry,
) -> Result<Token> {
    if registry.contains(type_string) {
        return Ok(match value {
            None | Some(StructValue::Null) => Token::FixedBytes(vec![0u8; 32]),
            Some(nested) => Token::FixedBytes(hash_struct(type_string, nested, registry)?.to_vec()),
        });
    }

    let value = match value {
        None | Some(StructValue::Null) => {
            return Err(Error::Encoding(format!("missing value for field {name}")))
        }
        Some(value) => value,
    };

    if type_string == "bytes" {
        let raw = bytes_value(name, value)?;
        return Ok(Token::FixedBytes(keccak256(raw).to_vec()));
    }

    if type_string == "string" {
        let StructValue::String(s) = value else {
            return Err(Error::Encoding(format!(
                "field {name} of type string holds {value:?}"
            )));
        };
        return Ok(Token::FixedBytes(keccak256(s.as_bytes()).to_vec()));
    }

    if let Some(element_type) = array_element_type(type_string) {
        let StructValue::List(items) = value else {
            return Err(Error::Encoding(format!(
                "field {name} of type {type_string} holds {value:?}"
            )));
        };
        let encoded = items
            .iter()
            .map(|item| encode_field(name, element_type, Some(item), registry))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Token::FixedBytes(keccak256(encode(&encoded)).to_vec()));
    }

    encode_atomic(name, type_string, value)
}

fn encode_atomic(name: &str, type_string: &str, value: &StructValue) -> Result<Token> {
    match type_string {
        "bool" => match value {
            StructValue::Bool(b) => Ok(Token::Bool(*b)),
            other => Err(Error::Encoding(format!(
                "field {name} of type bool holds {other:?}"
            ))),
        },
        "address" => {
            let raw = bytes_value(name, value)?;
            if raw.len() != 20 {
                return Err(Error::Encoding(format!(
                    "field {name} is not a 20-byte address"
                )));
            }
            Ok(Token::Address(Address::from_slice(&raw)))
        }
        t if t.starts_with("uint") => {
            let bits = type_width(name, t, "uint")?;
            let n = uint_value(name, value)?;
            if n.bits() > bits {
                return Err(Error::Encoding(format!(
                    "value of field {name} overflows {t}"
                )));
            }
            Ok(Token::Uint(n))
        }
        t if t.starts_with("int") => {
            let bits = type_width(name, t, "int")?;
            let n = int_value(name, value)?;
            let limit = I256::from_raw(U256::one() << (bits - 1));
            if bits < 256 && (n >= limit || n < -limit) {
                return Err(Error::Encoding(format!(
                    "value of field {name} overflows {t}"
                )));
            }
            Ok(Token::Int(n.into_raw()))
        }
        t if t.starts_with("bytes") => {
            let size = type_width(name, t, "bytes")?;
            let raw = bytes_value(name, value)?;
            if size == 0 || size > 32 || raw.len() > size {
                return Err(Error::Encoding(format!(
                    "field {name} does not fit {t}"
                )));
            }
            let mut fixed = raw;
            fixed.resize(size, 0);
            Ok(Token::FixedBytes(fixed))
        }
        other => Err(Error::Encoding(format!(
            "unsupported type {other} for field {name}"
        ))),
    }
}

fn type_width(name: &str, type_string: &str, prefix: &str) -> Result<usize> {
    let digits = &type_string[prefix.len()..];
    if digits.is_empty() {
        return Ok(if prefix == "bytes" { 0 } else { 256 });
    }
    digits
        .parse::<usize>()
        .ok()
        .filter(|w| prefix == "bytes" || (*w > 0 && *w <= 256 && w % 8 == 0))
        .ok_or_else(|| Error::Encoding(format!("invalid type {type_string} for field {name}")))
}

fn bytes_value(name: &str, value: &StructValue) -> Result<Vec<u8>> {
    match value {
        StructValue::Bytes(raw) => Ok(raw.clone()),
        StructValue::String(s) => {
            let digits = s.strip_prefix("0x").unwrap_or(s);
            hex::decode(digits)
                .map_err(|e| Error::Encoding(format!("field {name} is not valid hex: {e}")))
        }
        other => Err(Error::Encoding(format!(
            "field {name} of type bytes holds {other:?}"
        ))),
    }
}

fn uint_value(name: &str, value: &StructValue) -> Result<U256> {
    match value {
        StructValue::Number(n) if *n >= 0 => Ok(U256::from(*n as u128)),
        StructValue::String(s) => U256::from_dec_str(s.trim())
            .map_err(|e| Error::Encoding(format!("field {name} is not an unsigned integer: {e}"))),
        other => Err(Error::Encoding(format!(
            "field {name} of unsigned integer type holds {other:?}"
        ))),
    }
}

fn int_value(name: &str, value: &StructValue) -> Result<I256> {
    match value {
        StructValue::Number(n) => Ok(I256::from_dec_str(&n.to_string())
            .map_err(|e| Error::Encoding(format!("field {name}: {e}")))?),
        StructValue::String(s) => I256::from_dec_str(s.trim())
            .map_err(|e| Error::Encoding(format!("field {name} is not an integer: {e}"))),
        other => Err(Error::Encoding(format!(
            "field {name} of integer type holds {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Vec<TypeField> {
        pairs.iter().map(|(n, t)| TypeField::new(*n, *t)).collect()
    }

    fn tx_registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.insert(
            "Tx",
            fields(&[
                ("account_number", "uint256"),
                ("fee", "Fee"),
                ("msg1", "Msg1"),
            ]),
        );
        registry.insert(
            "Fee",
            fields(&[("amount", "Coin[]"), ("gas_limit", "uint256")]),
        );
        registry.insert("Coin", fields(&[("amount", "uint256"), ("denom", "string")]));
        registry.insert("Msg1", fields(&[("type", "string")]));
        registry
    }

    fn value(json: serde_json::Value) -> StructValue {
        StructValue::try_from(json).unwrap()
    }

    fn word(token: Token) -> Vec<u8> {
        encode(&[token])
    }

    #[test]
    fn test_dependencies_in_discovery_order() {
        let deps = resolve_dependencies("Tx", &tx_registry()).unwrap();
        assert_eq!(deps, vec!["Fee", "Coin", "Msg1"]);
    }

    #[test]
    fn test_dependencies_of_primitive_are_empty() {
        assert!(resolve_dependencies("uint256", &tx_registry())
            .unwrap()
            .is_empty());
        assert_eq!(
            resolve_dependencies("Fee[]", &tx_registry()).unwrap(),
            vec!["Coin"]
        );
    }

    #[test]
    fn test_shared_dependency_is_not_a_cycle() {
        let mut registry = TypeRegistry::new();
        registry.insert("A", fields(&[("b", "B"), ("c", "C")]));
        registry.insert("B", fields(&[("d", "D")]));
        registry.insert("C", fields(&[("d", "D[]")]));
        registry.insert("D", fields(&[("x", "string")]));
        assert_eq!(
            resolve_dependencies("A", &registry).unwrap(),
            vec!["B", "D", "C"]
        );
    }

    #[test]
    fn test_cycle_is_schema_error() {
        let mut registry = TypeRegistry::new();
        registry.insert("A", fields(&[("b", "B")]));
        registry.insert("B", fields(&[("a", "A[]")]));
        assert!(matches!(
            resolve_dependencies("A", &registry),
            Err(Error::Schema(_))
        ));
    }

    #[test]
    fn test_encode_type_sorts_dependencies_after_primary() {
        let encoded = encode_type("Tx", &tx_registry()).unwrap();
        assert_eq!(
            encoded,
            "Tx(uint256 account_number,Fee fee,Msg1 msg1)\
             Coin(uint256 amount,string denom)\
             Fee(Coin[] amount,uint256 gas_limit)\
             Msg1(string type)"
        );
        assert_eq!(encoded, encode_type("Tx", &tx_registry()).unwrap());
    }

    #[test]
    fn test_primary_is_not_sorted_into_dependencies() {
        let mut registry = TypeRegistry::new();
        registry.insert("Zed", fields(&[("a", "Alpha")]));
        registry.insert("Alpha", fields(&[("x", "bool")]));
        assert_eq!(
            encode_type("Zed", &registry).unwrap(),
            "Zed(Alpha a)Alpha(bool x)"
        );
    }

    #[test]
    fn test_empty_type_definition_is_schema_error() {
        let mut registry = tx_registry();
        registry.insert("Msg1", vec![]);
        assert!(matches!(
            encode_type("Tx", &registry),
            Err(Error::Schema(_))
        ));
    }

    #[test]
    fn test_encode_data_starts_with_type_hash() {
        let registry = tx_registry();
        let encoded = encode_data("Coin", &value(serde_json::json!({"amount": "5", "denom": "BNB"})), &registry).unwrap();
        assert_eq!(encoded.len(), 96);
        assert_eq!(&encoded[..32], &hash_type("Coin", &registry).unwrap());
        assert_eq!(&encoded[32..64], word(Token::Uint(U256::from(5))).as_slice());
        assert_eq!(&encoded[64..], &keccak256(b"BNB"));
    }

    #[test]
    fn test_string_array_hash() {
        let mut registry = TypeRegistry::new();
        registry.insert("List", fields(&[("items", "string[]")]));

        let encoded = encode_data("List", &value(serde_json::json!({"items": ["a", "b"]})), &registry).unwrap();
        let mut concat = keccak256(b"a").to_vec();
        concat.extend_from_slice(&keccak256(b"b"));
        assert_eq!(&encoded[32..], &keccak256(&concat));

        let empty = encode_data("List", &value(serde_json::json!({"items": []})), &registry).unwrap();
        assert_eq!(&empty[32..], &keccak256(b""));
    }

    #[test]
    fn test_absent_nested_struct_is_zero_slot() {
        let registry = tx_registry();
        let encoded = encode_data(
            "Tx",
            &value(serde_json::json!({"account_number": 1, "fee": null, "msg1": {"type": "x"}})),
            &registry,
        )
        .unwrap();
        assert_eq!(&encoded[64..96], &[0u8; 32]);
    }

    #[test]
    fn test_missing_primitive_is_encoding_error() {
        let registry = tx_registry();
        let err = encode_data("Coin", &value(serde_json::json!({"denom": "BNB"})), &registry).unwrap_err();
        assert_eq!(err, Error::Encoding("missing value for field amount".to_string()));
    }

    #[test]
    fn test_bytes_accepts_hex_and_raw() {
        let mut registry = TypeRegistry::new();
        registry.insert("Blob", fields(&[("data", "bytes")]));
        let from_hex = encode_data("Blob", &value(serde_json::json!({"data": "0x0102"})), &registry).unwrap();
        let mut raw = BTreeMap::new();
        raw.insert("data".to_string(), StructValue::Bytes(vec![1, 2]));
        let from_raw = encode_data("Blob", &StructValue::Struct(raw), &registry).unwrap();
        assert_eq!(from_hex, from_raw);
        assert_eq!(&from_hex[32..], &keccak256([1u8, 2]));
    }

    #[test]
    fn test_integer_strings_and_signed_values() {
        let mut registry = TypeRegistry::new();
        registry.insert("Nums", fields(&[("a", "uint64"), ("b", "int64")]));
        let encoded = encode_data("Nums", &value(serde_json::json!({"a": "42", "b": -1})), &registry).unwrap();
        assert_eq!(&encoded[32..64], word(Token::Uint(U256::from(42))).as_slice());
        assert_eq!(&encoded[64..], &[0xffu8; 32]);

        let overflow = encode_data("Nums", &value(serde_json::json!({"a": "18446744073709551616", "b": 0})), &registry);
        assert!(matches!(overflow, Err(Error::Encoding(_))));
    }

    #[test]
    fn test_merge_rejects_conflicting_definitions() {
        let mut registry = tx_registry();
        let mut other = TypeRegistry::new();
        other.insert("Coin", fields(&[("denom", "string"), ("amount", "uint256")]));
        registry.merge(other).unwrap();

        let mut conflicting = TypeRegistry::new();
        conflicting.insert("Coin", fields(&[("amount", "string"), ("denom", "string")]));
        assert!(matches!(
            registry.merge(conflicting),
            Err(Error::Schema(_))
        ));
    }

    #[test]
    fn test_float_is_rejected() {
        assert!(StructValue::try_from(serde_json::json!({"x": 1.5})).is_err());
    }
}
