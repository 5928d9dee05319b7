//! Declarative record validation
//!
//! Schemas are lists of rules evaluated over the JSON rendering of a record.
//! Each violation carries a data path (`.fee`, `.asset.votes[1]`,
//! `.transactions[3].senderPublicKey`) and a message. Vendor field limits
//! come from the milestone at the record's height.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::types::TransactionTypeRegistry;
use crate::config::{ExceptionRegistry, MilestoneProvider};
use crate::crypto::{address_to_bytes, PUBLIC_KEY_SIZE};
use crate::multisig::{MultiSignatureAsset, ENTRY_SIZE, MAX_PARTICIPANTS, MIN_PARTICIPANTS};

/// Longest DER-encoded secp256k1 signature
const MAX_DER_SIGNATURE_SIZE: usize = 72;

/// Shortest DER-encoded secp256k1 signature
const MIN_DER_SIGNATURE_SIZE: usize = 8;

/// Schema id of blocks
pub const BLOCK_SCHEMA: &str = "block";

/// A single rule violation
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaError {
    pub data_path: String,
    pub message: String,
    /// The offending value (null when absent)
    pub data: Value,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.data_path, self.message)
    }
}

/// Record-aware check: `(field value, whole record) -> violation`
pub type CheckFn = fn(Option<&Value>, &Value) -> Option<String>;

/// Per-item check of an array field
pub type ItemCheckFn = fn(&Value, &Value) -> Option<String>;

#[derive(Clone, Copy)]
pub enum Rule {
    /// Field must be present and non-null
    Required(&'static str),
    /// Hex string decoding to `min..=max` bytes
    Hex {
        field: &'static str,
        min: usize,
        max: usize,
    },
    /// Unsigned integer within `min..=max`
    Range {
        field: &'static str,
        min: u64,
        max: u64,
    },
    /// Unsigned integer of at least `min`, waived for genesis transactions
    Minimum { field: &'static str, min: u64 },
    /// Unsigned integer from a fixed set
    OneOf {
        field: &'static str,
        values: &'static [u64],
    },
    /// UTF-8 string no longer than the milestone vendor field length
    VendorField(&'static str),
    /// Array with `min..=max` items, each passing `item`
    Items {
        field: &'static str,
        min: usize,
        max: usize,
        item: Option<ItemCheckFn>,
    },
    /// Arbitrary check, run whether or not the field is present
    Check {
        field: &'static str,
        check: CheckFn,
    },
}

/// A named rule set
#[derive(Clone)]
pub struct Schema {
    pub id: String,
    pub rules: Vec<Rule>,
    /// Top-level properties allowed in strict mode; `None` allows anything
    pub properties: Option<Vec<&'static str>>,
}

/// Evaluates schemas with milestone-dependent limits
#[derive(Clone)]
pub struct SchemaValidator {
    schemas: HashMap<String, Schema>,
    milestones: Arc<dyn MilestoneProvider>,
    exceptions: Arc<ExceptionRegistry>,
    types: Arc<TransactionTypeRegistry>,
}

/// Per-record inputs to rule evaluation
struct RuleScope {
    vendor_field_length: usize,
    genesis: bool,
}

impl SchemaValidator {
    /// Validator with the block schema and both variants of every core
    /// transaction schema
    pub fn new(
        milestones: Arc<dyn MilestoneProvider>,
        exceptions: Arc<ExceptionRegistry>,
        types: Arc<TransactionTypeRegistry>,
    ) -> Self {
        let mut validator = Self {
            schemas: HashMap::new(),
            milestones,
            exceptions,
            types,
        };
        validator.register(block_schema());
        for (id, rules, properties) in core_transaction_schemas() {
            let mut all_rules = common_transaction_rules();
            all_rules.extend(rules);

            let mut strict_properties = COMMON_PROPERTIES.to_vec();
            strict_properties.extend_from_slice(properties);

            validator.register(Schema {
                id: id.to_string(),
                rules: all_rules.clone(),
                properties: None,
            });
            validator.register(Schema {
                id: format!("{}Strict", id),
                rules: all_rules,
                properties: Some(strict_properties),
            });
        }
        validator
    }

    /// Add or replace a schema
    pub fn register(&mut self, schema: Schema) {
        self.schemas.insert(schema.id.clone(), schema);
    }

    pub fn has_schema(&self, id: &str) -> bool {
        self.schemas.contains_key(id)
    }

    /// Validate a record against a schema, using the active milestone for
    /// height-dependent limits (blocks use their own height)
    pub fn validate(&self, schema_id: &str, value: &Value) -> Vec<SchemaError> {
        let height = if schema_id == BLOCK_SCHEMA {
            value
                .get("height")
                .and_then(Value::as_u64)
                .and_then(|h| u32::try_from(h).ok())
        } else {
            None
        };
        self.validate_at(schema_id, value, height)
    }

    /// Validate a record with limits taken from the milestone at `height`
    pub fn validate_at(&self, schema_id: &str, value: &Value, height: Option<u32>) -> Vec<SchemaError> {
        let Some(schema) = self.schemas.get(schema_id) else {
            return vec![SchemaError {
                data_path: String::new(),
                message: format!("no schema with id '{}'", schema_id),
                data: Value::Null,
            }];
        };

        let vendor_field_length = match height {
            Some(height) => self.milestones.milestone(height).vendor_field_length,
            None => self.milestones.active().vendor_field_length,
        };
        let genesis = value
            .get("id")
            .and_then(Value::as_str)
            .is_some_and(|id| self.exceptions.is_genesis_transaction(id));
        let scope = RuleScope {
            vendor_field_length,
            genesis,
        };

        let mut errors = Vec::new();
        if !value.is_object() {
            errors.push(SchemaError {
                data_path: String::new(),
                message: "should be object".to_string(),
                data: value.clone(),
            });
            return errors;
        }

        for rule in &schema.rules {
            apply_rule(rule, value, &scope, &mut errors);
        }

        if let (Some(allowed), Some(object)) = (&schema.properties, value.as_object()) {
            for (key, data) in object {
                if !allowed.contains(&key.as_str()) {
                    errors.push(SchemaError {
                        data_path: format!(".{}", key),
                        message: "should NOT have additional properties".to_string(),
                        data: data.clone(),
                    });
                }
            }
        }

        if schema_id == BLOCK_SCHEMA {
            self.validate_block_transactions(value, height, &mut errors);
        }

        errors
    }

    fn validate_block_transactions(
        &self,
        block: &Value,
        height: Option<u32>,
        errors: &mut Vec<SchemaError>,
    ) {
        let Some(transactions) = block.get("transactions").and_then(Value::as_array) else {
            return;
        };

        for (i, transaction) in transactions.iter().enumerate() {
            let prefix = format!(".transactions[{}]", i);
            let type_id = field_u64(transaction, "type").and_then(|t| u16::try_from(t).ok());
            let version = field_u64(transaction, "version").and_then(|v| u8::try_from(v).ok());
            let type_group = match version {
                Some(v) if v > 1 => field_u64(transaction, "typeGroup")
                    .and_then(|g| u32::try_from(g).ok())
                    .unwrap_or(1),
                _ => 1,
            };

            let handler = match (type_id, version) {
                (Some(type_id), Some(version)) => self.types.get(type_id, type_group, version),
                _ => None,
            };
            let Some(handler) = handler else {
                errors.push(SchemaError {
                    data_path: format!("{}.type", prefix),
                    message: "unknown transaction type".to_string(),
                    data: transaction.get("type").cloned().unwrap_or(Value::Null),
                });
                continue;
            };

            for mut error in self.validate_at(handler.schema_id, transaction, height) {
                error.data_path = format!("{}{}", prefix, error.data_path);
                errors.push(error);
            }
        }
    }
}

// =============================================================================
// Rule evaluation
// =============================================================================

fn lookup<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.')
        .try_fold(value, |current, key| current.get(key))
        .filter(|v| !v.is_null())
}

fn field_u64(value: &Value, field: &str) -> Option<u64> {
    lookup(value, field).and_then(Value::as_u64)
}

fn push(errors: &mut Vec<SchemaError>, path: String, message: String, data: Option<&Value>) {
    errors.push(SchemaError {
        data_path: path,
        message,
        data: data.cloned().unwrap_or(Value::Null),
    });
}

fn check_hex(value: &Value, min: usize, max: usize) -> Option<String> {
    let Some(s) = value.as_str() else {
        return Some("should be string".to_string());
    };
    if s.len() % 2 != 0 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Some("should be hex".to_string());
    }
    let bytes = s.len() / 2;
    if bytes < min || bytes > max {
        if min == max {
            return Some(format!("should be {} bytes", min));
        }
        return Some(format!("should be {} to {} bytes", min, max));
    }
    None
}

fn apply_rule(rule: &Rule, record: &Value, scope: &RuleScope, errors: &mut Vec<SchemaError>) {
    match *rule {
        Rule::Required(field) => {
            if lookup(record, field).is_none() {
                push(
                    errors,
                    format!(".{}", field),
                    "is a required property".to_string(),
                    None,
                );
            }
        }
        Rule::Hex { field, min, max } => {
            if let Some(value) = lookup(record, field) {
                if let Some(message) = check_hex(value, min, max) {
                    push(errors, format!(".{}", field), message, Some(value));
                }
            }
        }
        Rule::Range { field, min, max } => {
            if let Some(value) = lookup(record, field) {
                match value.as_u64() {
                    Some(n) if n >= min && n <= max => {}
                    Some(_) => push(
                        errors,
                        format!(".{}", field),
                        format!("should be between {} and {}", min, max),
                        Some(value),
                    ),
                    None => push(
                        errors,
                        format!(".{}", field),
                        "should be integer".to_string(),
                        Some(value),
                    ),
                }
            }
        }
        Rule::Minimum { field, min } => {
            if let Some(value) = lookup(record, field) {
                match value.as_u64() {
                    Some(n) if n >= min || scope.genesis => {}
                    Some(_) => push(
                        errors,
                        format!(".{}", field),
                        format!("should be >= {}", min),
                        Some(value),
                    ),
                    None => push(
                        errors,
                        format!(".{}", field),
                        "should be integer".to_string(),
                        Some(value),
                    ),
                }
            }
        }
        Rule::OneOf { field, values } => {
            if let Some(value) = lookup(record, field) {
                if !value.as_u64().is_some_and(|n| values.contains(&n)) {
                    push(
                        errors,
                        format!(".{}", field),
                        format!("should be equal to one of the allowed values {:?}", values),
                        Some(value),
                    );
                }
            }
        }
        Rule::VendorField(field) => {
            if let Some(value) = lookup(record, field) {
                match value.as_str() {
                    Some(s) if s.len() <= scope.vendor_field_length => {}
                    Some(_) => push(
                        errors,
                        format!(".{}", field),
                        format!("should NOT be longer than {} bytes", scope.vendor_field_length),
                        Some(value),
                    ),
                    None => push(
                        errors,
                        format!(".{}", field),
                        "should be string".to_string(),
                        Some(value),
                    ),
                }
            }
        }
        Rule::Items {
            field,
            min,
            max,
            item,
        } => {
            let Some(value) = lookup(record, field) else {
                return;
            };
            let Some(items) = value.as_array() else {
                push(errors, format!(".{}", field), "should be array".to_string(), Some(value));
                return;
            };
            if items.len() < min {
                push(
                    errors,
                    format!(".{}", field),
                    format!("should NOT have fewer than {} items", min),
                    Some(value),
                );
            }
            if items.len() > max {
                push(
                    errors,
                    format!(".{}", field),
                    format!("should NOT have more than {} items", max),
                    Some(value),
                );
            }
            if let Some(check) = item {
                for (i, element) in items.iter().enumerate() {
                    if let Some(message) = check(element, record) {
                        push(errors, format!(".{}[{}]", field, i), message, Some(element));
                    }
                }
            }
        }
        Rule::Check { field, check } => {
            let value = lookup(record, field);
            if let Some(message) = check(value, record) {
                push(errors, format!(".{}", field), message, value);
            }
        }
    }
}

// =============================================================================
// Block schema
// =============================================================================

fn block_schema() -> Schema {
    Schema {
        id: BLOCK_SCHEMA.to_string(),
        rules: vec![
            Rule::Required("version"),
            Rule::Required("timestamp"),
            Rule::Required("height"),
            Rule::Required("numberOfTransactions"),
            Rule::Required("totalAmount"),
            Rule::Required("totalFee"),
            Rule::Required("reward"),
            Rule::Required("payloadLength"),
            Rule::Required("payloadHash"),
            Rule::Required("generatorPublicKey"),
            Rule::Required("blockSignature"),
            Rule::OneOf {
                field: "version",
                values: &[0, 1],
            },
            Rule::Range {
                field: "timestamp",
                min: 0,
                max: u32::MAX as u64,
            },
            Rule::Range {
                field: "height",
                min: 1,
                max: u32::MAX as u64,
            },
            Rule::Check {
                field: "previousBlock",
                check: check_previous_block,
            },
            Rule::Check {
                field: "numberOfTransactions",
                check: check_transaction_count,
            },
            Rule::Hex {
                field: "payloadHash",
                min: 32,
                max: 32,
            },
            Rule::Hex {
                field: "generatorPublicKey",
                min: PUBLIC_KEY_SIZE,
                max: PUBLIC_KEY_SIZE,
            },
            Rule::Hex {
                field: "blockSignature",
                min: MIN_DER_SIGNATURE_SIZE,
                max: MAX_DER_SIGNATURE_SIZE,
            },
            Rule::Items {
                field: "transactions",
                min: 0,
                max: u32::MAX as usize,
                item: None,
            },
        ],
        properties: None,
    }
}

fn is_block_id(id: &str) -> bool {
    (id.len() == 64 && id.bytes().all(|b| b.is_ascii_hexdigit()))
        || (!id.is_empty() && id.len() <= 20 && id.parse::<u64>().is_ok())
}

fn check_previous_block(value: Option<&Value>, record: &Value) -> Option<String> {
    let height = field_u64(record, "height").unwrap_or(0);
    match value.and_then(Value::as_str) {
        Some(id) if is_block_id(id) => None,
        Some("") | None if height <= 1 => None,
        Some(_) => Some("should be a block id".to_string()),
        None => Some("is a required property".to_string()),
    }
}

fn check_transaction_count(value: Option<&Value>, record: &Value) -> Option<String> {
    let declared = value.and_then(Value::as_u64)?;
    let actual = record.get("transactions").and_then(Value::as_array)?.len() as u64;
    if declared != actual {
        return Some(format!("should be equal to the transaction count {}", actual));
    }
    None
}

// =============================================================================
// Transaction schemas
// =============================================================================

const COMMON_PROPERTIES: &[&str] = &[
    "id",
    "version",
    "network",
    "typeGroup",
    "type",
    "timestamp",
    "nonce",
    "senderPublicKey",
    "fee",
    "amount",
    "signature",
    "secondSignature",
    "signSignature",
    "signatures",
];

fn common_transaction_rules() -> Vec<Rule> {
    vec![
        Rule::Required("type"),
        Rule::Required("senderPublicKey"),
        Rule::Required("fee"),
        Rule::Required("amount"),
        Rule::OneOf {
            field: "version",
            values: &[1, 2],
        },
        Rule::Range {
            field: "network",
            min: 0,
            max: u8::MAX as u64,
        },
        Rule::Range {
            field: "typeGroup",
            min: 0,
            max: u32::MAX as u64,
        },
        Rule::Check {
            field: "nonce",
            check: check_replay_protection,
        },
        Rule::Hex {
            field: "id",
            min: 32,
            max: 32,
        },
        Rule::Hex {
            field: "senderPublicKey",
            min: PUBLIC_KEY_SIZE,
            max: PUBLIC_KEY_SIZE,
        },
        Rule::Minimum {
            field: "fee",
            min: 1,
        },
        Rule::Check {
            field: "signature",
            check: check_signature,
        },
        Rule::Check {
            field: "secondSignature",
            check: check_signature,
        },
        Rule::Check {
            field: "signSignature",
            check: check_signature,
        },
        Rule::Items {
            field: "signatures",
            min: 1,
            max: MAX_PARTICIPANTS,
            item: Some(check_signature_entry),
        },
    ]
}

type TransactionSchemaParts = (&'static str, Vec<Rule>, &'static [&'static str]);

fn core_transaction_schemas() -> Vec<TransactionSchemaParts> {
    vec![
        (
            "transfer",
            vec![
                Rule::OneOf {
                    field: "type",
                    values: &[0],
                },
                Rule::Required("recipientId"),
                Rule::Minimum {
                    field: "amount",
                    min: 1,
                },
                Rule::Range {
                    field: "expiration",
                    min: 0,
                    max: u32::MAX as u64,
                },
                Rule::Check {
                    field: "recipientId",
                    check: check_address,
                },
                Rule::VendorField("vendorField"),
            ],
            &["recipientId", "expiration", "vendorField"],
        ),
        (
            "secondSignature",
            vec![
                Rule::OneOf {
                    field: "type",
                    values: &[1],
                },
                Rule::OneOf {
                    field: "amount",
                    values: &[0],
                },
                Rule::Required("asset.signature.publicKey"),
                Rule::Hex {
                    field: "asset.signature.publicKey",
                    min: PUBLIC_KEY_SIZE,
                    max: PUBLIC_KEY_SIZE,
                },
            ],
            &["asset"],
        ),
        (
            "delegateRegistration",
            vec![
                Rule::OneOf {
                    field: "type",
                    values: &[2],
                },
                Rule::OneOf {
                    field: "amount",
                    values: &[0],
                },
                Rule::Required("asset.delegate.username"),
                Rule::Check {
                    field: "asset.delegate.username",
                    check: check_username,
                },
            ],
            &["asset"],
        ),
        (
            "vote",
            vec![
                Rule::OneOf {
                    field: "type",
                    values: &[3],
                },
                Rule::OneOf {
                    field: "amount",
                    values: &[0],
                },
                Rule::Required("asset.votes"),
                Rule::Items {
                    field: "asset.votes",
                    min: 1,
                    max: 2,
                    item: Some(check_vote),
                },
                Rule::Check {
                    field: "recipientId",
                    check: check_address,
                },
            ],
            &["asset", "recipientId"],
        ),
        (
            "multiSignature",
            vec![
                Rule::OneOf {
                    field: "type",
                    values: &[4],
                },
                Rule::OneOf {
                    field: "amount",
                    values: &[0],
                },
                Rule::Required("asset.multiSignature.min"),
                Rule::Required("asset.multiSignature.publicKeys"),
                Rule::Items {
                    field: "asset.multiSignature.publicKeys",
                    min: MIN_PARTICIPANTS,
                    max: MAX_PARTICIPANTS,
                    item: Some(check_public_key),
                },
                Rule::Check {
                    field: "asset.multiSignature",
                    check: check_quorum,
                },
                Rule::Required("signatures"),
            ],
            &["asset"],
        ),
        (
            "multiSignatureLegacy",
            vec![
                Rule::OneOf {
                    field: "type",
                    values: &[4],
                },
                Rule::OneOf {
                    field: "amount",
                    values: &[0],
                },
                Rule::Required("asset.multiSignatureLegacy.min"),
                Rule::Range {
                    field: "asset.multiSignatureLegacy.min",
                    min: 1,
                    max: MAX_PARTICIPANTS as u64,
                },
                Rule::Range {
                    field: "asset.multiSignatureLegacy.lifetime",
                    min: 1,
                    max: 72,
                },
                Rule::Items {
                    field: "asset.multiSignatureLegacy.keysgroup",
                    min: 1,
                    max: MAX_PARTICIPANTS,
                    item: Some(check_keysgroup_member),
                },
            ],
            &["asset"],
        ),
    ]
}

fn check_replay_protection(nonce: Option<&Value>, record: &Value) -> Option<String> {
    let version = field_u64(record, "version").unwrap_or(1);
    if version >= 2 {
        match nonce {
            Some(value) if value.is_u64() => None,
            Some(_) => Some("should be integer".to_string()),
            None => Some("is a required property".to_string()),
        }
    } else if lookup(record, "timestamp").is_none() {
        Some("timestamp is a required property".to_string())
    } else {
        None
    }
}

fn check_signature(value: Option<&Value>, _record: &Value) -> Option<String> {
    // Schnorr signatures (64 bytes) fall inside the DER size range
    check_hex(value?, MIN_DER_SIGNATURE_SIZE, MAX_DER_SIGNATURE_SIZE)
        .map(|_| "should be a Schnorr or DER signature".to_string())
}

fn check_signature_entry(value: &Value, record: &Value) -> Option<String> {
    // v1 carries one opaque legacy blob
    if field_u64(record, "version").unwrap_or(1) <= 1 {
        return check_hex(value, 1, usize::MAX);
    }
    check_hex(value, ENTRY_SIZE, ENTRY_SIZE)
}

fn check_public_key(value: &Value, _record: &Value) -> Option<String> {
    check_hex(value, PUBLIC_KEY_SIZE, PUBLIC_KEY_SIZE)
}

fn check_prefixed_key(value: &Value, prefixes: &[char]) -> Option<String> {
    let Some(s) = value.as_str() else {
        return Some("should be string".to_string());
    };
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if prefixes.contains(&c) => {
            check_hex(&Value::String(chars.as_str().to_string()), PUBLIC_KEY_SIZE, PUBLIC_KEY_SIZE)
        }
        _ => Some(format!("should start with one of {:?}", prefixes)),
    }
}

fn check_vote(value: &Value, _record: &Value) -> Option<String> {
    check_prefixed_key(value, &['+', '-'])
}

fn check_keysgroup_member(value: &Value, _record: &Value) -> Option<String> {
    check_prefixed_key(value, &['+'])
}

fn check_address(value: Option<&Value>, record: &Value) -> Option<String> {
    let value = value?;
    let Some(address) = value.as_str() else {
        return Some("should be string".to_string());
    };
    match address_to_bytes(address) {
        Ok(bytes) => match field_u64(record, "network") {
            Some(network) if network != bytes[0] as u64 => {
                Some(format!("address network {} does not match {}", bytes[0], network))
            }
            _ => None,
        },
        Err(e) => Some(e.to_string()),
    }
}

fn check_username(value: Option<&Value>, _record: &Value) -> Option<String> {
    let username = value?.as_str()?;
    let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || "!@$&_.".contains(c);
    if username.is_empty() || username.len() > 20 || !username.chars().all(allowed) {
        return Some("should be 1 to 20 characters of a-z, 0-9 or !@$&_.".to_string());
    }
    None
}

fn check_quorum(value: Option<&Value>, _record: &Value) -> Option<String> {
    let asset: MultiSignatureAsset = serde_json::from_value(value?.clone()).ok()?;
    asset.validate().err().map(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Milestone, MilestoneSchedule};
    use crate::crypto::KeyPair;
    use serde_json::json;

    fn validator(vendor_field_length: usize) -> SchemaValidator {
        let schedule = MilestoneSchedule::single(Milestone {
            vendor_field_length,
            ..Default::default()
        });
        SchemaValidator::new(
            Arc::new(schedule),
            Arc::new(ExceptionRegistry::empty(30)),
            Arc::new(TransactionTypeRegistry::with_core_types()),
        )
    }

    fn transfer_json() -> Value {
        json!({
            "version": 2,
            "network": 30,
            "typeGroup": 1,
            "type": 0,
            "nonce": 1,
            "senderPublicKey": KeyPair::generate().public_key_hex(),
            "fee": 10000000,
            "amount": 1,
            "recipientId": KeyPair::generate().address(30),
            "signature": "ab".repeat(64),
        })
    }

    #[test]
    fn test_valid_transfer() {
        let validator = validator(64);
        assert!(validator.validate("transfer", &transfer_json()).is_empty());
        assert!(validator.validate("transferStrict", &transfer_json()).is_empty());
    }

    #[test]
    fn test_strict_rejects_unknown_properties() {
        let validator = validator(64);
        let mut tx = transfer_json();
        tx["surprise"] = json!(true);

        assert!(validator.validate("transfer", &tx).is_empty());
        let errors = validator.validate("transferStrict", &tx);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].data_path, ".surprise");
    }

    #[test]
    fn test_vendor_field_limit_follows_milestone() {
        let mut tx = transfer_json();
        tx["vendorField"] = json!("x".repeat(100));

        assert!(validator(255).validate("transfer", &tx).is_empty());
        let errors = validator(64).validate("transfer", &tx);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].data_path, ".vendorField");
    }

    #[test]
    fn test_field_errors() {
        let validator = validator(64);
        let mut tx = transfer_json();
        tx["fee"] = json!(0);
        tx["senderPublicKey"] = json!("zz");
        tx.as_object_mut().unwrap().remove("nonce");

        let paths: Vec<String> = validator
            .validate("transfer", &tx)
            .into_iter()
            .map(|e| e.data_path)
            .collect();
        assert!(paths.contains(&".fee".to_string()));
        assert!(paths.contains(&".senderPublicKey".to_string()));
        assert!(paths.contains(&".nonce".to_string()));
    }

    #[test]
    fn test_genesis_transactions_skip_minimums() {
        let id = "ef".repeat(32);
        let mut tx = transfer_json();
        tx["id"] = json!(id);
        tx["fee"] = json!(0);
        tx["amount"] = json!(0);

        let errors = validator(64).validate("transfer", &tx);
        let paths: Vec<&str> = errors.iter().map(|e| e.data_path.as_str()).collect();
        assert_eq!(paths, vec![".fee", ".amount"]);
        assert_eq!(errors[0].message, "should be >= 1");

        let genesis = SchemaValidator::new(
            Arc::new(MilestoneSchedule::single(Milestone::default())),
            Arc::new(ExceptionRegistry::new(30, Default::default(), vec![id])),
            Arc::new(TransactionTypeRegistry::with_core_types()),
        );
        assert!(genesis.validate("transfer", &tx).is_empty());

        // Other rules still apply to genesis transactions
        tx["senderPublicKey"] = json!("zz");
        assert_eq!(genesis.validate("transfer", &tx).len(), 1);
    }

    #[test]
    fn test_vote_items() {
        let validator = validator(64);
        let key = KeyPair::generate().public_key_hex();
        let mut vote = transfer_json();
        let object = vote.as_object_mut().unwrap();
        object.remove("recipientId");
        object.insert("type".to_string(), json!(3));
        object.insert("amount".to_string(), json!(0));
        object.insert("asset".to_string(), json!({ "votes": [format!("+{}", key), key] }));

        let errors = validator.validate("vote", &vote);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].data_path, ".asset.votes[1]");
    }

    #[test]
    fn test_quorum_check() {
        let validator = validator(64);
        let keys: Vec<String> = (0..2).map(|_| KeyPair::generate().public_key_hex()).collect();
        let mut tx = transfer_json();
        let object = tx.as_object_mut().unwrap();
        object.remove("recipientId");
        object.insert("type".to_string(), json!(4));
        object.insert("amount".to_string(), json!(0));
        object.insert("signatures".to_string(), json!(["cd".repeat(65)]));
        object.insert(
            "asset".to_string(),
            json!({ "multiSignature": { "min": 3, "publicKeys": keys } }),
        );

        let errors = validator.validate("multiSignature", &tx);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].data_path, ".asset.multiSignature");
    }

    #[test]
    fn test_block_nested_transaction_paths() {
        let validator = validator(64);
        let mut bad = transfer_json();
        bad["fee"] = json!(0);
        let block = json!({
            "version": 0,
            "timestamp": 100,
            "height": 2,
            "previousBlock": "12345",
            "numberOfTransactions": 2,
            "totalAmount": 0,
            "totalFee": 0,
            "reward": 0,
            "payloadLength": 0,
            "payloadHash": "00".repeat(32),
            "generatorPublicKey": KeyPair::generate().public_key_hex(),
            "blockSignature": "30".repeat(70),
            "transactions": [transfer_json(), bad],
        });

        let errors = validator.validate(BLOCK_SCHEMA, &block);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].data_path, ".transactions[1].fee");
    }

    #[test]
    fn test_block_previous_id_and_count() {
        let validator = validator(64);
        let mut block = json!({
            "version": 0,
            "timestamp": 100,
            "height": 1,
            "previousBlock": "",
            "numberOfTransactions": 1,
            "totalAmount": 0,
            "totalFee": 0,
            "reward": 0,
            "payloadLength": 0,
            "payloadHash": "00".repeat(32),
            "generatorPublicKey": KeyPair::generate().public_key_hex(),
            "blockSignature": "30".repeat(70),
            "transactions": [],
        });

        let paths: Vec<String> = validator
            .validate(BLOCK_SCHEMA, &block)
            .into_iter()
            .map(|e| e.data_path)
            .collect();
        assert_eq!(paths, vec![".numberOfTransactions".to_string()]);

        block["height"] = json!(2);
        block["numberOfTransactions"] = json!(0);
        let paths: Vec<String> = validator
            .validate(BLOCK_SCHEMA, &block)
            .into_iter()
            .map(|e| e.data_path)
            .collect();
        assert_eq!(paths, vec![".previousBlock".to_string()]);
    }

    #[test]
    fn test_unknown_schema() {
        let errors = validator(64).validate("nope", &json!({}));
        assert_eq!(errors.len(), 1);
    }
}
