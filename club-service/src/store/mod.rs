//! Single-table storage abstraction.
//!
//! All entities share one keyspace addressed by composite (pk, sk) pairs that
//! encode entity type and relationship. Invariant-establishing writes (name
//! uniqueness guards, pending-invitation guards, participant slots) go
//! through [`TableStore::transact_write`], which applies every operation or
//! none: a failed condition cancels the whole transaction and surfaces as a
//! retryable conflict.
//!
//! Items are decoded into typed structs at this boundary; a shape mismatch is
//! an immediate error rather than a `None` that leaks into business logic.

pub mod cursor;
pub mod memory;

pub use cursor::Cursor;
pub use memory::InMemoryTable;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A condition failed; no operation in the transaction was applied.
    /// Callers should treat this as a conflict and retry or surface it.
    #[error("transaction cancelled: {reason}")]
    TransactionCancelled { reason: String },

    #[error("failed to encode item: {0}")]
    Encode(serde_json::Error),

    #[error("failed to decode item at ({pk}, {sk}): {source}")]
    Decode {
        pk: String,
        sk: String,
        source: serde_json::Error,
    },

    #[error("invalid pagination cursor")]
    InvalidCursor,
}

/// One row of the shared table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub pk: String,
    pub sk: String,
    pub body: serde_json::Value,
}

impl Item {
    pub fn encode<T: Serialize>(
        pk: impl Into<String>,
        sk: impl Into<String>,
        entity: &T,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            pk: pk.into(),
            sk: sk.into(),
            body: serde_json::to_value(entity).map_err(StoreError::Encode)?,
        })
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(self.body.clone()).map_err(|source| StoreError::Decode {
            pk: self.pk.clone(),
            sk: self.sk.clone(),
            source,
        })
    }
}

/// Write-time condition evaluated against the current row, if any.
#[derive(Debug, Clone)]
pub enum Condition {
    None,
    /// The key must not exist (uniqueness guards, create-once semantics).
    NotExists,
    /// The key must exist.
    Exists,
    /// The key must exist and its body's top-level `field` must equal
    /// `value` (optimistic state checks, e.g. status == "pending").
    FieldEquals {
        field: &'static str,
        value: serde_json::Value,
    },
    /// The key must exist and every listed top-level field must equal its
    /// expected value. Used where a write guards more than one piece of
    /// state, e.g. a ride's status and its participant count.
    FieldsEqual {
        fields: Vec<(&'static str, serde_json::Value)>,
    },
}

#[derive(Debug, Clone)]
pub enum TransactOp {
    Put { item: Item, condition: Condition },
    Delete {
        pk: String,
        sk: String,
        condition: Condition,
    },
}

impl TransactOp {
    pub fn put(item: Item) -> Self {
        TransactOp::Put {
            item,
            condition: Condition::None,
        }
    }

    pub fn put_if_absent(item: Item) -> Self {
        TransactOp::Put {
            item,
            condition: Condition::NotExists,
        }
    }

    pub fn put_if_exists(item: Item) -> Self {
        TransactOp::Put {
            item,
            condition: Condition::Exists,
        }
    }

    pub fn put_if_field(item: Item, field: &'static str, value: serde_json::Value) -> Self {
        TransactOp::Put {
            item,
            condition: Condition::FieldEquals { field, value },
        }
    }

    pub fn put_if_fields(item: Item, fields: Vec<(&'static str, serde_json::Value)>) -> Self {
        TransactOp::Put {
            item,
            condition: Condition::FieldsEqual { fields },
        }
    }

    pub fn delete(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        TransactOp::Delete {
            pk: pk.into(),
            sk: sk.into(),
            condition: Condition::None,
        }
    }

    pub fn delete_if_exists(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        TransactOp::Delete {
            pk: pk.into(),
            sk: sk.into(),
            condition: Condition::Exists,
        }
    }

    pub fn delete_if_field(
        pk: impl Into<String>,
        sk: impl Into<String>,
        field: &'static str,
        value: serde_json::Value,
    ) -> Self {
        TransactOp::Delete {
            pk: pk.into(),
            sk: sk.into(),
            condition: Condition::FieldEquals { field, value },
        }
    }

    pub fn key(&self) -> (&str, &str) {
        match self {
            TransactOp::Put { item, .. } => (&item.pk, &item.sk),
            TransactOp::Delete { pk, sk, .. } => (pk, sk),
        }
    }
}

/// Pagination input: page size plus the exclusive sort-key position to
/// resume after.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub limit: usize,
    pub start_after: Option<String>,
}

/// One page of query results. The store fetches `limit + 1` rows internally
/// so `has_more` needs no separate count query.
#[derive(Debug)]
pub struct QueryOutput {
    pub items: Vec<Item>,
    pub has_more: bool,
    pub next_cursor: Option<Cursor>,
}

#[service_core::async_trait::async_trait]
pub trait TableStore: Send + Sync {
    async fn get(&self, pk: &str, sk: &str) -> Result<Option<Item>, StoreError>;

    /// Range scan over one partition, restricted to sort keys with the given
    /// prefix, in ascending sort-key order.
    async fn query(&self, pk: &str, sk_prefix: &str, page: &Page)
        -> Result<QueryOutput, StoreError>;

    /// Unconditional single-item write.
    async fn put(&self, item: Item) -> Result<(), StoreError>;

    /// All-or-nothing multi-item write. Conditions are evaluated against a
    /// consistent snapshot; any failure cancels every operation.
    async fn transact_write(&self, ops: Vec<TransactOp>) -> Result<(), StoreError>;
}
