//! Per-message adjustments between the protobuf JSON shape of a chain message and the JSON
//! the chain's EIP-712 verifier rebuilds from it.
//!
//! [`normalize`] is pure: the caller's [`ChainMessage`] is never touched, and the returned
//! registry is built fresh from the static schema on every call.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{Duration, Local, NaiveDateTime, Timelike};
use log::{debug, warn};
use serde_json::Value;

use crate::{
    greenfield::{
        any::encode_any_fields,
        eip712::{base_type, StructValue, TypeRegistry},
        errors::{Error, Result},
        registry::{self, MessageSchema, ANY_TYPE, MESSAGE_TYPE},
        types::{BroadcastOptions, ChainMessage},
    },
    helpers::{
        decode_hex, parse_timestamp, unix_epoch, unscale_decimal, GRANT_TIME_FORMAT, MEMBER_TIME_FORMAT,
    },
};

const VISIBILITY_TYPES: &[(i64, &str)] = &[
    (0, "VISIBILITY_TYPE_UNSPECIFIED"),
    (1, "VISIBILITY_TYPE_PUBLIC_READ"),
    (2, "VISIBILITY_TYPE_PRIVATE"),
    (3, "VISIBILITY_TYPE_INHERIT"),
];

const REDUNDANCY_TYPES: &[(i64, &str)] = &[(0, "REDUNDANCY_EC_TYPE"), (1, "REDUNDANCY_REPLICA_TYPE")];

const ACTION_TYPES: &[(i64, &str)] = &[
    (0, "ACTION_UNSPECIFIED"),
    (1, "ACTION_UPDATE_BUCKET_INFO"),
    (2, "ACTION_DELETE_BUCKET"),
    (3, "ACTION_CREATE_OBJECT"),
    (4, "ACTION_DELETE_OBJECT"),
    (5, "ACTION_COPY_OBJECT"),
    (6, "ACTION_GET_OBJECT"),
    (7, "ACTION_EXECUTE_OBJECT"),
    (8, "ACTION_LIST_OBJECT"),
    (9, "ACTION_UPDATE_GROUP_MEMBER"),
    (10, "ACTION_DELETE_GROUP"),
    (11, "ACTION_UPDATE_OBJECT_INFO"),
    (12, "ACTION_UPDATE_GROUP_EXTRA"),
    (13, "ACTION_UPDATE_GROUP_INFO"),
    (14, "ACTION_UPDATE_OBJECT_CONTENT"),
    (99, "ACTION_TYPE_ALL"),
];

const EFFECTS: &[(i64, &str)] = &[
    (0, "EFFECT_UNSPECIFIED"),
    (1, "EFFECT_ALLOW"),
    (2, "EFFECT_DENY"),
];

const PRINCIPAL_TYPES: &[(i64, &str)] = &[
    (0, "PRINCIPAL_TYPE_UNSPECIFIED"),
    (1, "PRINCIPAL_TYPE_GNFD_ACCOUNT"),
    (2, "PRINCIPAL_TYPE_GNFD_GROUP"),
];

const VOTE_OPTIONS: &[(i64, &str)] = &[
    (0, "VOTE_OPTION_UNSPECIFIED"),
    (1, "VOTE_OPTION_YES"),
    (2, "VOTE_OPTION_ABSTAIN"),
    (3, "VOTE_OPTION_NO"),
    (4, "VOTE_OPTION_NO_WITH_VETO"),
];

const SP_STATUSES: &[(i64, &str)] = &[
    (0, "STATUS_IN_SERVICE"),
    (1, "STATUS_IN_JAILED"),
    (2, "STATUS_GRACEFUL_EXITING"),
    (3, "STATUS_IN_MAINTENANCE"),
    (4, "STATUS_FORCED_EXITING"),
];

/// Offset the chain applies to some expirations before verifying them.
const EXPIRATION_SHIFT_HOURS: i64 = 9;

/// 2000-12-31T23:59:59Z, the last instant not treated as a real grant expiration.
const YEAR_2000_END: i64 = 978_307_199;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    PutPolicy,
    DeletePolicy,
    CreateBucket,
    CreateObject,
    MigrateBucket,
    Vote,
    UpdateSpStatus,
    Grant,
    UpdateSpStoragePrice,
    EditValidator,
    UpdateGroupMember,
    RenewGroupMember,
    Generic,
}

impl MessageKind {
    pub fn from_type_url(type_url: &str) -> Self {
        match type_url {
            registry::MSG_PUT_POLICY => MessageKind::PutPolicy,
            registry::MSG_DELETE_POLICY => MessageKind::DeletePolicy,
            registry::MSG_CREATE_BUCKET => MessageKind::CreateBucket,
            registry::MSG_CREATE_OBJECT => MessageKind::CreateObject,
            registry::MSG_MIGRATE_BUCKET => MessageKind::MigrateBucket,
            registry::MSG_VOTE => MessageKind::Vote,
            registry::MSG_UPDATE_SP_STATUS => MessageKind::UpdateSpStatus,
            registry::MSG_GRANT => MessageKind::Grant,
            registry::MSG_UPDATE_SP_STORAGE_PRICE => MessageKind::UpdateSpStoragePrice,
            registry::MSG_EDIT_VALIDATOR => MessageKind::EditValidator,
            registry::MSG_UPDATE_GROUP_MEMBER => MessageKind::UpdateGroupMember,
            registry::MSG_RENEW_GROUP_MEMBER => MessageKind::RenewGroupMember,
            _ => MessageKind::Generic,
        }
    }

    /// Field holding the storage provider approval whose `sig` is injected before signing.
    fn approval_field(self) -> Option<&'static str> {
        match self {
            MessageKind::CreateBucket | MessageKind::CreateObject => Some("primary_sp_approval"),
            MessageKind::MigrateBucket => Some("dst_primary_sp_approval"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NormalizeContext<'a> {
    pub broadcast_options: Option<&'a BroadcastOptions>,
    /// Local wall clock time at signing.
    pub now: NaiveDateTime,
}

impl<'a> NormalizeContext<'a> {
    pub fn new(broadcast_options: Option<&'a BroadcastOptions>) -> Self {
        Self {
            broadcast_options,
            now: Local::now().naive_local(),
        }
    }

    pub fn at(broadcast_options: Option<&'a BroadcastOptions>, now: NaiveDateTime) -> Self {
        Self {
            broadcast_options,
            now,
        }
    }
}

/// A message ready for hashing: its `Msg1` value and the registry describing exactly that
/// value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMessage {
    pub type_url: String,
    pub value: StructValue,
    pub types: TypeRegistry,
}

pub fn normalize(message: &ChainMessage, ctx: &NormalizeContext<'_>) -> Result<NormalizedMessage> {
    let schema = registry::schema_for(&message.type_url)?;
    let kind = MessageKind::from_type_url(&message.type_url);

    let mut json = message.value.clone();
    if !json.is_object() {
        return Err(Error::Encoding(format!(
            "message {} must be a JSON object",
            message.type_url
        )));
    }
    swap_type_url_keys(schema, MESSAGE_TYPE, &mut json);
    normalize_json(kind, &mut json, ctx)?;

    let mut value = StructValue::try_from(json)?;
    inject_bytes(kind, &message.type_url, &mut value, ctx)?;
    encode_any_fields(schema, MESSAGE_TYPE, &mut value)?;
    value.insert("type", StructValue::from(message.type_url.as_str()))?;

    let types = schema.resolve(&mut value)?;
    debug!(
        "normalized {}: {}",
        message.type_url,
        value.to_json()
    );
    Ok(NormalizedMessage {
        type_url: message.type_url.clone(),
        value,
        types,
    })
}

fn normalize_json(kind: MessageKind, json: &mut Value, ctx: &NormalizeContext<'_>) -> Result<()> {
    convert_enum(json.get_mut("visibility"), VISIBILITY_TYPES, "visibility")?;
    convert_enum(json.get_mut("redundancy_type"), REDUNDANCY_TYPES, "redundancy_type")?;

    match kind {
        MessageKind::PutPolicy => normalize_put_policy(json)?,
        MessageKind::DeletePolicy => {
            convert_enum(
                json.pointer_mut("/principal/type"),
                PRINCIPAL_TYPES,
                "principal.type",
            )?;
        }
        MessageKind::Vote => convert_enum(json.get_mut("option"), VOTE_OPTIONS, "option")?,
        MessageKind::UpdateSpStatus => {
            convert_enum(json.get_mut("status"), SP_STATUSES, "status")?;
            if let Some(duration) = json.get_mut("duration") {
                if let Some(n) = duration.as_i64() {
                    *duration = Value::String(n.to_string());
                }
            }
        }
        MessageKind::Grant => shift_current_hour_expiration(json, ctx)?,
        MessageKind::UpdateSpStoragePrice => {
            unscale_field(json, "read_price")?;
            unscale_field(json, "store_price")?;
        }
        MessageKind::EditValidator => unscale_field(json, "commission_rate")?,
        MessageKind::UpdateGroupMember => format_member_expirations(json, "members_to_add")?,
        MessageKind::RenewGroupMember => format_member_expirations(json, "members")?,
        MessageKind::CreateBucket
        | MessageKind::CreateObject
        | MessageKind::MigrateBucket
        | MessageKind::Generic => {}
    }

    format_grant_expiration(json)
}

fn convert_enum(slot: Option<&mut Value>, names: &[(i64, &str)], field: &str) -> Result<()> {
    let Some(slot) = slot else {
        return Ok(());
    };
    let Some(number) = slot.as_i64() else {
        return Ok(());
    };
    let name = names
        .iter()
        .find(|(value, _)| *value == number)
        .map(|(_, name)| *name)
        .ok_or_else(|| Error::Encoding(format!("unknown {field} value {number}")))?;
    *slot = Value::String(name.to_string());
    Ok(())
}

fn normalize_put_policy(json: &mut Value) -> Result<()> {
    convert_enum(
        json.pointer_mut("/principal/type"),
        PRINCIPAL_TYPES,
        "principal.type",
    )?;

    // Actions still in integer form mark a message straight from the wire, whose
    // expiration also still needs the chain's offset.
    let actions_are_numeric = json
        .pointer("/statements/0/actions/0")
        .is_some_and(Value::is_number);

    if let Some(statements) = json.get_mut("statements").and_then(Value::as_array_mut) {
        for statement in statements.iter_mut() {
            if let Some(actions) = statement.get_mut("actions").and_then(Value::as_array_mut) {
                for action in actions.iter_mut() {
                    convert_enum(Some(action), ACTION_TYPES, "action")?;
                }
            }
            convert_enum(statement.get_mut("effect"), EFFECTS, "effect")?;
            if let Some(fields) = statement.as_object_mut() {
                fields.remove("limit_size");
                fields.insert("expiration_time".to_string(), Value::String(String::new()));
            }
        }
    }

    let expiration = match json.get("expiration_time") {
        Some(raw) => parse_timestamp(raw)?,
        None => None,
    };
    let rendered = match expiration {
        Some(t) => {
            let t = if actions_are_numeric {
                t - Duration::hours(EXPIRATION_SHIFT_HOURS)
            } else {
                t
            };
            if t <= unix_epoch() {
                String::new()
            } else {
                t.format(GRANT_TIME_FORMAT).to_string()
            }
        }
        None => String::new(),
    };
    set_field(json, "expiration_time", Value::String(rendered))
}

fn shift_current_hour_expiration(json: &mut Value, ctx: &NormalizeContext<'_>) -> Result<()> {
    let Some(raw) = json.pointer_mut("/grant/expiration") else {
        return Ok(());
    };
    let Some(expiration) = parse_timestamp(raw)? else {
        return Ok(());
    };
    if expiration.hour() == ctx.now.hour() {
        let shifted = expiration - Duration::hours(EXPIRATION_SHIFT_HOURS);
        // The chain-side reason for this offset is unconfirmed; signatures only verify with it.
        warn!(
            "grant expiration {expiration} falls in the signing hour, shifting it back {EXPIRATION_SHIFT_HOURS}h to {shifted}"
        );
        *raw = Value::String(shifted.and_utc().to_rfc3339());
    }
    Ok(())
}

fn format_grant_expiration(json: &mut Value) -> Result<()> {
    let Some(raw) = json.pointer_mut("/grant/expiration") else {
        return Ok(());
    };
    let rendered = match parse_timestamp(raw)? {
        Some(t) if t.and_utc().timestamp() > YEAR_2000_END => t.format(GRANT_TIME_FORMAT).to_string(),
        _ => String::new(),
    };
    *raw = Value::String(rendered);
    Ok(())
}

fn format_member_expirations(json: &mut Value, field: &str) -> Result<()> {
    let Some(members) = json.get_mut(field).and_then(Value::as_array_mut) else {
        return Ok(());
    };
    for member in members.iter_mut() {
        let expiration = match member.get("expiration_time") {
            Some(raw) => parse_timestamp(raw)?,
            None => None,
        }
        .unwrap_or_else(unix_epoch);
        set_field(
            member,
            "expiration_time",
            Value::String(expiration.format(MEMBER_TIME_FORMAT).to_string()),
        )?;
    }
    Ok(())
}

fn unscale_field(json: &mut Value, field: &str) -> Result<()> {
    if let Some(slot) = json.get_mut(field) {
        if let Some(text) = slot.as_str().filter(|s| !s.is_empty()) {
            *slot = Value::String(unscale_decimal(text)?);
        }
    }
    Ok(())
}

fn set_field(json: &mut Value, field: &str, value: Value) -> Result<()> {
    json.as_object_mut()
        .map(|fields| {
            fields.insert(field.to_string(), value);
        })
        .ok_or_else(|| Error::Encoding(format!("cannot set {field} on a non-object value")))
}

/// Renames `type_url` to `type` along the schema. The payload of a `TypeAny` is left as is.
fn swap_type_url_keys(schema: &MessageSchema, type_name: &str, json: &mut Value) {
    match json {
        Value::Object(fields) => {
            if let Some(type_url) = fields.remove("type_url") {
                fields.insert("type".to_string(), type_url);
            }
            if type_name == ANY_TYPE {
                return;
            }
            for entry in schema.fields(type_name).unwrap_or_default() {
                if let Some(child) = fields.get_mut(entry.name) {
                    swap_type_url_keys(schema, base_type(entry.type_string), child);
                }
            }
        }
        Value::Array(items) => items
            .iter_mut()
            .for_each(|item| swap_type_url_keys(schema, type_name, item)),
        _ => {}
    }
}

fn inject_bytes(
    kind: MessageKind,
    type_url: &str,
    value: &mut StructValue,
    ctx: &NormalizeContext<'_>,
) -> Result<()> {
    if let Some(field) = kind.approval_field() {
        let signature = ctx
            .broadcast_options
            .and_then(|options| options.sp_signature.as_deref())
            .ok_or_else(|| {
                Error::Encoding(format!(
                    "{type_url} needs the storage provider approval signature"
                ))
            })?;
        let sig = BASE64
            .decode(signature.trim())
            .map_err(|e| Error::Encoding(format!("approval signature is not base64: {e}")))?;
        if !matches!(value.get(field), Some(StructValue::Struct(_))) {
            value.insert(field, StructValue::empty_struct())?;
        }
        if let Some(approval) = value.get_mut(field) {
            approval.insert("sig", StructValue::Bytes(sig))?;
        }
    }

    if kind == MessageKind::CreateObject {
        let supplied = ctx
            .broadcast_options
            .map(|options| options.checksums.as_slice())
            .filter(|checksums| !checksums.is_empty());
        let checksums = match supplied {
            Some(checksums) => checksums
                .iter()
                .map(|c| StructValue::Bytes(c.as_bytes().to_vec()))
                .collect(),
            None => value
                .get("expect_checksums")
                .and_then(StructValue::as_list)
                .unwrap_or_default()
                .iter()
                .map(checksum_bytes)
                .collect::<Result<Vec<_>>>()?,
        };
        value.insert("expect_checksums", StructValue::List(checksums))?;
    }
    Ok(())
}

/// A message's own checksum as bytes. `0x` hex is the rendering of bytes already converted.
fn checksum_bytes(checksum: &StructValue) -> Result<StructValue> {
    match checksum {
        StructValue::Bytes(_) => Ok(checksum.clone()),
        StructValue::String(text) => {
            let hex = text.starts_with("0x").then(|| decode_hex(text).ok()).flatten();
            Ok(StructValue::Bytes(
                hex.unwrap_or_else(|| text.as_bytes().to_vec()),
            ))
        }
        other => Err(Error::Encoding(format!(
            "checksum {other:?} is neither text nor bytes"
        ))),
    }
}
