//! EIP-712 schemas of every Greenfield message the SDK can sign.
//!
//! Tables are static and never mutated. Fields whose presence depends on the message value
//! are annotated with [`Presence::IfNonEmpty`] and resolved per call by
//! [`MessageSchema::resolve`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use lazy_static::lazy_static;

use crate::greenfield::{
    eip712::{base_type, StructValue, TypeField, TypeRegistry},
    errors::{Error, Result},
};

pub const PRIMARY_TYPE: &str = "Tx";
pub const DOMAIN_TYPE: &str = "EIP712Domain";
pub const MESSAGE_TYPE: &str = "Msg1";
pub const ANY_TYPE: &str = "TypeAny";

pub const MSG_SEND: &str = "/cosmos.bank.v1beta1.MsgSend";
pub const MSG_MULTI_SEND: &str = "/cosmos.bank.v1beta1.MsgMultiSend";

pub const MSG_SET_WITHDRAW_ADDRESS: &str = "/cosmos.distribution.v1beta1.MsgSetWithdrawAddress";
pub const MSG_WITHDRAW_VALIDATOR_COMMISSION: &str =
    "/cosmos.distribution.v1beta1.MsgWithdrawValidatorCommission";
pub const MSG_WITHDRAW_DELEGATOR_REWARD: &str =
    "/cosmos.distribution.v1beta1.MsgWithdrawDelegatorReward";
pub const MSG_FUND_COMMUNITY_POOL: &str = "/cosmos.distribution.v1beta1.MsgFundCommunityPool";

pub const MSG_GRANT_ALLOWANCE: &str = "/cosmos.feegrant.v1beta1.MsgGrantAllowance";
pub const MSG_REVOKE_ALLOWANCE: &str = "/cosmos.feegrant.v1beta1.MsgRevokeAllowance";

pub const MSG_SUBMIT_PROPOSAL: &str = "/cosmos.gov.v1.MsgSubmitProposal";
pub const MSG_VOTE: &str = "/cosmos.gov.v1.MsgVote";
pub const MSG_DEPOSIT: &str = "/cosmos.gov.v1.MsgDeposit";

pub const MSG_CREATE_VALIDATOR: &str = "/cosmos.staking.v1beta1.MsgCreateValidator";
pub const MSG_EDIT_VALIDATOR: &str = "/cosmos.staking.v1beta1.MsgEditValidator";
pub const MSG_DELEGATE: &str = "/cosmos.staking.v1beta1.MsgDelegate";
pub const MSG_UNDELEGATE: &str = "/cosmos.staking.v1beta1.MsgUndelegate";
pub const MSG_BEGIN_REDELEGATE: &str = "/cosmos.staking.v1beta1.MsgBeginRedelegate";
pub const MSG_CANCEL_UNBONDING_DELEGATION: &str =
    "/cosmos.staking.v1beta1.MsgCancelUnbondingDelegation";

pub const MSG_UNJAIL: &str = "/cosmos.slashing.v1beta1.MsgUnjail";
pub const MSG_GRANT: &str = "/cosmos.authz.v1beta1.MsgGrant";
pub const MSG_TRANSFER_OUT: &str = "/greenfield.bridge.MsgTransferOut";
pub const MSG_SUBMIT_CHALLENGE: &str = "/greenfield.challenge.MsgSubmit";

pub const MSG_CREATE_PAYMENT_ACCOUNT: &str = "/greenfield.payment.MsgCreatePaymentAccount";
pub const MSG_PAYMENT_DEPOSIT: &str = "/greenfield.payment.MsgDeposit";
pub const MSG_PAYMENT_WITHDRAW: &str = "/greenfield.payment.MsgWithdraw";
pub const MSG_DISABLE_REFUND: &str = "/greenfield.payment.MsgDisableRefund";

pub const MSG_CREATE_BUCKET: &str = "/greenfield.storage.MsgCreateBucket";
pub const MSG_DELETE_BUCKET: &str = "/greenfield.storage.MsgDeleteBucket";
pub const MSG_UPDATE_BUCKET_INFO: &str = "/greenfield.storage.MsgUpdateBucketInfo";
pub const MSG_MIGRATE_BUCKET: &str = "/greenfield.storage.MsgMigrateBucket";
pub const MSG_MIRROR_BUCKET: &str = "/greenfield.storage.MsgMirrorBucket";
pub const MSG_CREATE_OBJECT: &str = "/greenfield.storage.MsgCreateObject";
pub const MSG_DELETE_OBJECT: &str = "/greenfield.storage.MsgDeleteObject";
pub const MSG_CANCEL_CREATE_OBJECT: &str = "/greenfield.storage.MsgCancelCreateObject";
pub const MSG_UPDATE_OBJECT_INFO: &str = "/greenfield.storage.MsgUpdateObjectInfo";
pub const MSG_MIRROR_OBJECT: &str = "/greenfield.storage.MsgMirrorObject";
pub const MSG_CREATE_GROUP: &str = "/greenfield.storage.MsgCreateGroup";
pub const MSG_DELETE_GROUP: &str = "/greenfield.storage.MsgDeleteGroup";
pub const MSG_LEAVE_GROUP: &str = "/greenfield.storage.MsgLeaveGroup";
pub const MSG_UPDATE_GROUP_MEMBER: &str = "/greenfield.storage.MsgUpdateGroupMember";
pub const MSG_RENEW_GROUP_MEMBER: &str = "/greenfield.storage.MsgRenewGroupMember";
pub const MSG_UPDATE_GROUP_EXTRA: &str = "/greenfield.storage.MsgUpdateGroupExtra";
pub const MSG_MIRROR_GROUP: &str = "/greenfield.storage.MsgMirrorGroup";
pub const MSG_PUT_POLICY: &str = "/greenfield.storage.MsgPutPolicy";
pub const MSG_DELETE_POLICY: &str = "/greenfield.storage.MsgDeletePolicy";
pub const MSG_SET_TAG: &str = "/greenfield.storage.MsgSetTag";

pub const MSG_UPDATE_SP_STORAGE_PRICE: &str = "/greenfield.sp.MsgUpdateSpStoragePrice";
pub const MSG_UPDATE_SP_STATUS: &str = "/greenfield.sp.MsgUpdateStorageProviderStatus";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Always,
    /// Dropped from both the type and the value when every occurrence is an empty list.
    IfNonEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub type_string: &'static str,
    pub presence: Presence,
}

fn field(name: &'static str, type_string: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        type_string,
        presence: Presence::Always,
    }
}

fn optional(name: &'static str, type_string: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        type_string,
        presence: Presence::IfNonEmpty,
    }
}

#[derive(Debug, Clone)]
pub struct MessageSchema {
    types: BTreeMap<&'static str, Vec<FieldSpec>>,
}

impl MessageSchema {
    fn new(types: Vec<(&'static str, Vec<FieldSpec>)>) -> Self {
        Self {
            types: types.into_iter().collect(),
        }
    }

    pub fn fields(&self, type_name: &str) -> Option<&[FieldSpec]> {
        self.types.get(type_name).map(Vec::as_slice)
    }

    pub fn declares(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Builds the concrete registry for `message` (the `Msg1` value), removing conditional
    /// fields that are empty everywhere from both the registry and the value.
    pub fn resolve(&self, message: &mut StructValue) -> Result<TypeRegistry> {
        let mut present = BTreeSet::new();
        self.collect_present(MESSAGE_TYPE, message, &mut present);
        self.prune(MESSAGE_TYPE, message, &present);

        let mut registry = TypeRegistry::new();
        for (name, specs) in &self.types {
            let fields = specs
                .iter()
                .filter(|entry| {
                    entry.presence == Presence::Always || present.contains(&(*name, entry.name))
                })
                .map(|entry| TypeField::new(entry.name, entry.type_string))
                .collect::<Vec<_>>();
            if fields.is_empty() {
                return Err(Error::Schema(format!("type {name} has no fields left")));
            }
            registry.insert(*name, fields);
        }
        Ok(registry)
    }

    fn collect_present(
        &self,
        type_name: &str,
        value: &StructValue,
        present: &mut BTreeSet<(&'static str, &'static str)>,
    ) {
        let Some((&name, specs)) = self.types.get_key_value(type_name) else {
            return;
        };
        for entry in specs {
            let Some(child) = value.get(entry.name) else {
                continue;
            };
            if entry.presence == Presence::IfNonEmpty
                && child.as_list().is_some_and(|items| !items.is_empty())
            {
                present.insert((name, entry.name));
            }
            let child_type = base_type(entry.type_string);
            match child {
                StructValue::List(items) => {
                    for item in items {
                        self.collect_present(child_type, item, present);
                    }
                }
                StructValue::Struct(_) => self.collect_present(child_type, child, present),
                _ => {}
            }
        }
    }

    fn prune(
        &self,
        type_name: &str,
        value: &mut StructValue,
        present: &BTreeSet<(&'static str, &'static str)>,
    ) {
        let Some((&name, specs)) = self.types.get_key_value(type_name) else {
            return;
        };
        for entry in specs {
            if entry.presence == Presence::IfNonEmpty && !present.contains(&(name, entry.name)) {
                value.remove(entry.name);
                continue;
            }
            let child_type = base_type(entry.type_string);
            match value.get_mut(entry.name) {
                Some(StructValue::List(items)) => {
                    for item in items {
                        self.prune(child_type, item, present);
                    }
                }
                Some(child) if matches!(child, StructValue::Struct(_)) => {
                    self.prune(child_type, child, present)
                }
                _ => {}
            }
        }
    }
}

/// `Coin`, `EIP712Domain`, `Fee` and the message-less `Tx`.
pub fn base_types() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.insert(
        "Coin",
        vec![
            TypeField::new("amount", "uint256"),
            TypeField::new("denom", "string"),
        ],
    );
    registry.insert(
        DOMAIN_TYPE,
        vec![
            TypeField::new("chainId", "uint256"),
            TypeField::new("name", "string"),
            TypeField::new("salt", "string"),
            TypeField::new("verifyingContract", "string"),
            TypeField::new("version", "string"),
        ],
    );
    registry.insert(
        "Fee",
        vec![
            TypeField::new("amount", "Coin[]"),
            TypeField::new("gas_limit", "uint256"),
            TypeField::new("granter", "string"),
            TypeField::new("payer", "string"),
        ],
    );
    registry.insert(
        PRIMARY_TYPE,
        vec![
            TypeField::new("account_number", "uint256"),
            TypeField::new("chain_id", "uint256"),
            TypeField::new("fee", "Fee"),
            TypeField::new("memo", "string"),
            TypeField::new("sequence", "uint256"),
            TypeField::new("timeout_height", "uint256"),
        ],
    );
    registry
}

pub fn schema_for(type_url: &str) -> Result<&'static MessageSchema> {
    MESSAGE_SCHEMAS.get(type_url).ok_or_else(|| {
        Error::Schema(format!("no EIP-712 schema registered for {type_url}"))
    })
}

pub fn supported_type_urls() -> impl Iterator<Item = &'static str> {
    MESSAGE_SCHEMAS.keys().copied()
}

fn any_type() -> (&'static str, Vec<FieldSpec>) {
    (ANY_TYPE, vec![field("type", "string"), field("value", "bytes")])
}

fn amount_type() -> (&'static str, Vec<FieldSpec>) {
    (
        "TypeMsg1Amount",
        vec![field("amount", "string"), field("denom", "string")],
    )
}

fn approval_type(name: &'static str) -> (&'static str, Vec<FieldSpec>) {
    (
        name,
        vec![
            field("expired_height", "uint64"),
            field("global_virtual_group_family_id", "uint32"),
            field("sig", "bytes"),
        ],
    )
}

fn description_type() -> (&'static str, Vec<FieldSpec>) {
    (
        "TypeMsg1Description",
        vec![
            field("details", "string"),
            field("identity", "string"),
            field("moniker", "string"),
            field("security_contact", "string"),
            field("website", "string"),
        ],
    )
}

fn principal_type() -> (&'static str, Vec<FieldSpec>) {
    (
        "TypeMsg1Principal",
        vec![field("type", "string"), field("value", "string")],
    )
}

fn grant_type() -> (&'static str, Vec<FieldSpec>) {
    (
        "TypeMsg1Grant",
        vec![field("authorization", ANY_TYPE), field("expiration", "string")],
    )
}

fn msg(fields: Vec<FieldSpec>) -> (&'static str, Vec<FieldSpec>) {
    let mut fields = fields;
    fields.push(field("type", "string"));
    (MESSAGE_TYPE, fields)
}

fn submit_proposal() -> MessageSchema {
    MessageSchema::new(vec![
        msg(vec![
            field("initial_deposit", "TypeMsg1InitialDeposit[]"),
            field("messages", "TypeAny[]"),
            field("metadata", "string"),
            field("proposer", "string"),
            field("summary", "string"),
            field("title", "string"),
        ]),
        any_type(),
        (
            "TypeMsg1InitialDeposit",
            vec![field("amount", "string"), field("denom", "string")],
        ),
    ])
}

fn mirror(name_fields: Vec<FieldSpec>) -> MessageSchema {
    let mut fields = vec![
        field("dest_chain_id", "uint32"),
        field("id", "string"),
        field("operator", "string"),
    ];
    fields.extend(name_fields);
    MessageSchema::new(vec![msg(fields)])
}

lazy_static! {
    static ref MESSAGE_SCHEMAS: HashMap<&'static str, MessageSchema> = {
        let mut m = HashMap::new();

        m.insert(MSG_SEND, MessageSchema::new(vec![
            msg(vec![
                field("amount", "TypeMsg1Amount[]"),
                field("from_address", "string"),
                field("to_address", "string"),
            ]),
            amount_type(),
        ]));
        m.insert(MSG_MULTI_SEND, MessageSchema::new(vec![
            msg(vec![
                field("inputs", "TypeMsg1Inputs[]"),
                field("outputs", "TypeMsg1Outputs[]"),
            ]),
            ("TypeMsg1Inputs", vec![field("address", "string"), field("coins", "TypeMsg1InputsCoins[]")]),
            ("TypeMsg1InputsCoins", vec![field("amount", "string"), field("denom", "string")]),
            ("TypeMsg1Outputs", vec![field("address", "string"), field("coins", "TypeMsg1OutputsCoins[]")]),
            ("TypeMsg1OutputsCoins", vec![field("amount", "string"), field("denom", "string")]),
        ]));

        m.insert(MSG_SET_WITHDRAW_ADDRESS, MessageSchema::new(vec![msg(vec![
            field("delegator_address", "string"),
            field("withdraw_address", "string"),
        ])]));
        m.insert(MSG_WITHDRAW_VALIDATOR_COMMISSION, MessageSchema::new(vec![msg(vec![
            field("validator_address", "string"),
        ])]));
        m.insert(MSG_WITHDRAW_DELEGATOR_REWARD, MessageSchema::new(vec![msg(vec![
            field("delegator_address", "string"),
            field("validator_address", "string"),
        ])]));
        m.insert(MSG_FUND_COMMUNITY_POOL, MessageSchema::new(vec![
            msg(vec![field("amount", "Coin[]"), field("depositor", "string")]),
            ("Coin", vec![field("amount", "uint256"), field("denom", "string")]),
        ]));

        m.insert(MSG_GRANT_ALLOWANCE, MessageSchema::new(vec![
            msg(vec![
                field("allowance", ANY_TYPE),
                field("grantee", "string"),
                field("granter", "string"),
            ]),
            any_type(),
        ]));
        m.insert(MSG_REVOKE_ALLOWANCE, MessageSchema::new(vec![msg(vec![
            field("grantee", "string"),
            field("granter", "string"),
        ])]));

        m.insert(MSG_SUBMIT_PROPOSAL, submit_proposal());
        m.insert(MSG_VOTE, MessageSchema::new(vec![msg(vec![
            field("metadata", "string"),
            field("option", "string"),
            field("proposal_id", "uint64"),
            field("voter", "string"),
        ])]));
        m.insert(MSG_DEPOSIT, MessageSchema::new(vec![
            msg(vec![
                field("amount", "TypeMsg1Amount[]"),
                field("depositor", "string"),
                field("proposal_id", "uint64"),
            ]),
            amount_type(),
        ]));

        m.insert(MSG_CREATE_VALIDATOR, MessageSchema::new(vec![
            msg(vec![
                field("bls_key", "string"),
                field("challenger_address", "string"),
                field("commission", "TypeMsg1CommissionRates"),
                field("delegator_address", "string"),
                field("description", "TypeMsg1Description"),
                field("from", "string"),
                field("min_self_delegation", "string"),
                field("pubkey", ANY_TYPE),
                field("relayer_address", "string"),
                field("validator_address", "string"),
                field("value", "TypeMsg1Amount"),
            ]),
            description_type(),
            (
                "TypeMsg1CommissionRates",
                vec![
                    field("max_change_rate", "string"),
                    field("max_rate", "string"),
                    field("rate", "string"),
                ],
            ),
            any_type(),
            amount_type(),
        ]));
        m.insert(MSG_EDIT_VALIDATOR, MessageSchema::new(vec![
            msg(vec![
                field("bls_key", "string"),
                field("challenger_address", "string"),
                field("commission_rate", "string"),
                field("description", "TypeMsg1Description"),
                field("min_self_delegation", "string"),
                field("relayer_address", "string"),
                field("validator_address", "string"),
            ]),
            description_type(),
        ]));
        m.insert(MSG_DELEGATE, MessageSchema::new(vec![
            msg(vec![
                field("amount", "TypeMsg1Amount"),
                field("delegator_address", "string"),
                field("validator_address", "string"),
            ]),
            amount_type(),
        ]));
        m.insert(MSG_UNDELEGATE, MessageSchema::new(vec![
            msg(vec![
                field("amount", "TypeMsg1Amount"),
                field("delegator_address", "string"),
                field("validator_address", "string"),
            ]),
            amount_type(),
        ]));
        m.insert(MSG_BEGIN_REDELEGATE, MessageSchema::new(vec![
            msg(vec![
                field("amount", "TypeMsg1Amount"),
                field("delegator_address", "string"),
                field("validator_dst_address", "string"),
                field("validator_src_address", "string"),
            ]),
            amount_type(),
        ]));
        m.insert(MSG_CANCEL_UNBONDING_DELEGATION, MessageSchema::new(vec![
            msg(vec![
                field("amount", "TypeMsg1Amount"),
                field("creation_height", "int64"),
                field("delegator_address", "string"),
                field("validator_address", "string"),
            ]),
            amount_type(),
        ]));

        m.insert(MSG_UNJAIL, MessageSchema::new(vec![msg(vec![
            field("validator_addr", "string"),
        ])]));
        m.insert(MSG_GRANT, MessageSchema::new(vec![
            msg(vec![
                field("grant", "TypeMsg1Grant"),
                field("grantee", "string"),
                field("granter", "string"),
            ]),
            grant_type(),
            any_type(),
        ]));
        m.insert(MSG_TRANSFER_OUT, MessageSchema::new(vec![
            msg(vec![
                field("amount", "TypeMsg1Amount"),
                field("from", "string"),
                field("to", "string"),
            ]),
            amount_type(),
        ]));
        m.insert(MSG_SUBMIT_CHALLENGE, MessageSchema::new(vec![msg(vec![
            field("bucket_name", "string"),
            field("challenger", "string"),
            field("object_name", "string"),
            field("random_index", "bool"),
            field("segment_index", "uint32"),
            field("sp_operator_address", "string"),
        ])]));

        m.insert(MSG_CREATE_PAYMENT_ACCOUNT, MessageSchema::new(vec![msg(vec![
            field("creator", "string"),
        ])]));
        m.insert(MSG_PAYMENT_DEPOSIT, MessageSchema::new(vec![msg(vec![
            field("amount", "string"),
            field("creator", "string"),
            field("to", "string"),
        ])]));
        m.insert(MSG_PAYMENT_WITHDRAW, MessageSchema::new(vec![msg(vec![
            field("amount", "string"),
            field("creator", "string"),
            field("from", "string"),
        ])]));
        m.insert(MSG_DISABLE_REFUND, MessageSchema::new(vec![msg(vec![
            field("addr", "string"),
            field("owner", "string"),
        ])]));

        m.insert(MSG_CREATE_BUCKET, MessageSchema::new(vec![
            msg(vec![
                field("bucket_name", "string"),
                field("charged_read_quota", "uint64"),
                field("creator", "string"),
                field("payment_address", "string"),
                field("primary_sp_address", "string"),
                field("primary_sp_approval", "TypeMsg1PrimarySpApproval"),
                field("visibility", "string"),
            ]),
            approval_type("TypeMsg1PrimarySpApproval"),
        ]));
        m.insert(MSG_DELETE_BUCKET, MessageSchema::new(vec![msg(vec![
            field("bucket_name", "string"),
            field("operator", "string"),
        ])]));
        m.insert(MSG_UPDATE_BUCKET_INFO, MessageSchema::new(vec![
            msg(vec![
                field("bucket_name", "string"),
                field("charged_read_quota", "TypeMsg1ChargedReadQuota"),
                field("operator", "string"),
                field("payment_address", "string"),
                field("visibility", "string"),
            ]),
            ("TypeMsg1ChargedReadQuota", vec![field("value", "uint64")]),
        ]));
        m.insert(MSG_MIGRATE_BUCKET, MessageSchema::new(vec![
            msg(vec![
                field("bucket_name", "string"),
                field("dst_primary_sp_approval", "TypeMsg1DstPrimarySpApproval"),
                field("dst_primary_sp_id", "uint32"),
                field("operator", "string"),
            ]),
            approval_type("TypeMsg1DstPrimarySpApproval"),
        ]));
        m.insert(MSG_MIRROR_BUCKET, mirror(vec![field("bucket_name", "string")]));

        m.insert(MSG_CREATE_OBJECT, MessageSchema::new(vec![
            msg(vec![
                field("bucket_name", "string"),
                field("content_type", "string"),
                field("creator", "string"),
                field("expect_checksums", "bytes[]"),
                field("object_name", "string"),
                field("payload_size", "uint64"),
                field("primary_sp_approval", "TypeMsg1PrimarySpApproval"),
                field("redundancy_type", "string"),
                field("visibility", "string"),
            ]),
            approval_type("TypeMsg1PrimarySpApproval"),
        ]));
        m.insert(MSG_DELETE_OBJECT, MessageSchema::new(vec![msg(vec![
            field("bucket_name", "string"),
            field("object_name", "string"),
            field("operator", "string"),
        ])]));
        m.insert(MSG_CANCEL_CREATE_OBJECT, MessageSchema::new(vec![msg(vec![
            field("bucket_name", "string"),
            field("object_name", "string"),
            field("operator", "string"),
        ])]));
        m.insert(MSG_UPDATE_OBJECT_INFO, MessageSchema::new(vec![msg(vec![
            field("bucket_name", "string"),
            field("object_name", "string"),
            field("operator", "string"),
            field("visibility", "string"),
        ])]));
        m.insert(MSG_MIRROR_OBJECT, mirror(vec![
            field("bucket_name", "string"),
            field("object_name", "string"),
        ]));

        m.insert(MSG_CREATE_GROUP, MessageSchema::new(vec![msg(vec![
            field("creator", "string"),
            field("extra", "string"),
            field("group_name", "string"),
            optional("members", "string[]"),
        ])]));
        m.insert(MSG_DELETE_GROUP, MessageSchema::new(vec![msg(vec![
            field("group_name", "string"),
            field("operator", "string"),
        ])]));
        m.insert(MSG_LEAVE_GROUP, MessageSchema::new(vec![msg(vec![
            field("group_name", "string"),
            field("group_owner", "string"),
            field("member", "string"),
        ])]));
        m.insert(MSG_UPDATE_GROUP_MEMBER, MessageSchema::new(vec![
            msg(vec![
                field("group_name", "string"),
                field("group_owner", "string"),
                optional("members_to_add", "TypeMsg1MembersToAdd[]"),
                optional("members_to_delete", "string[]"),
                field("operator", "string"),
            ]),
            (
                "TypeMsg1MembersToAdd",
                vec![field("expiration_time", "string"), field("member", "string")],
            ),
        ]));
        m.insert(MSG_RENEW_GROUP_MEMBER, MessageSchema::new(vec![
            msg(vec![
                field("group_name", "string"),
                field("group_owner", "string"),
                field("members", "TypeMsg1Members[]"),
                field("operator", "string"),
            ]),
            (
                "TypeMsg1Members",
                vec![field("expiration_time", "string"), field("member", "string")],
            ),
        ]));
        m.insert(MSG_UPDATE_GROUP_EXTRA, MessageSchema::new(vec![msg(vec![
            field("extra", "string"),
            field("group_name", "string"),
            field("group_owner", "string"),
            field("operator", "string"),
        ])]));
        m.insert(MSG_MIRROR_GROUP, mirror(vec![field("group_name", "string")]));

        m.insert(MSG_PUT_POLICY, MessageSchema::new(vec![
            msg(vec![
                field("expiration_time", "string"),
                field("operator", "string"),
                field("principal", "TypeMsg1Principal"),
                field("resource", "string"),
                field("statements", "TypeMsg1Statements[]"),
            ]),
            principal_type(),
            (
                "TypeMsg1Statements",
                vec![
                    field("actions", "string[]"),
                    field("effect", "string"),
                    field("expiration_time", "string"),
                    optional("resources", "string[]"),
                ],
            ),
        ]));
        m.insert(MSG_DELETE_POLICY, MessageSchema::new(vec![
            msg(vec![
                field("operator", "string"),
                field("principal", "TypeMsg1Principal"),
                field("resource", "string"),
            ]),
            principal_type(),
        ]));
        m.insert(MSG_SET_TAG, MessageSchema::new(vec![
            msg(vec![
                field("operator", "string"),
                field("resource", "string"),
                field("tags", "TypeMsg1Tags"),
            ]),
            ("TypeMsg1Tags", vec![field("tags", "TypeMsg1TagsTags[]")]),
            ("TypeMsg1TagsTags", vec![field("key", "string"), field("value", "string")]),
        ]));

        m.insert(MSG_UPDATE_SP_STORAGE_PRICE, MessageSchema::new(vec![msg(vec![
            field("free_read_quota", "uint64"),
            field("read_price", "string"),
            field("sp_address", "string"),
            field("store_price", "string"),
        ])]));
        m.insert(MSG_UPDATE_SP_STATUS, MessageSchema::new(vec![msg(vec![
            field("duration", "int64"),
            field("sp_address", "string"),
            field("status", "string"),
        ])]));

        m
    };
}
