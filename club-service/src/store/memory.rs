//! In-memory single-table engine.
//!
//! Backs local development and the test suite. Rows live in an ordered map
//! keyed by (pk, sk) so partition range scans come out in sort-key order, the
//! same contract a hosted single-table backend provides. `transact_write`
//! evaluates all conditions under one write lock, so a transaction observes a
//! consistent snapshot and either fully applies or fully cancels.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;

use super::{Condition, Cursor, Item, Page, QueryOutput, StoreError, TableStore, TransactOp};

#[derive(Default)]
pub struct InMemoryTable {
    // Lock is held only for short, non-awaiting critical sections.
    rows: RwLock<BTreeMap<(String, String), serde_json::Value>>,
}

impl InMemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.read().expect("table lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(
        rows: &BTreeMap<(String, String), serde_json::Value>,
        pk: &str,
        sk: &str,
        condition: &Condition,
    ) -> Result<(), String> {
        let current = rows.get(&(pk.to_string(), sk.to_string()));
        match condition {
            Condition::None => Ok(()),
            Condition::NotExists => match current {
                None => Ok(()),
                Some(_) => Err(format!("item already exists at ({pk}, {sk})")),
            },
            Condition::Exists => match current {
                Some(_) => Ok(()),
                None => Err(format!("item missing at ({pk}, {sk})")),
            },
            Condition::FieldEquals { field, value } => match current {
                Some(body) if body.get(*field) == Some(value) => Ok(()),
                Some(_) => Err(format!("field {field} mismatch at ({pk}, {sk})")),
                None => Err(format!("item missing at ({pk}, {sk})")),
            },
            Condition::FieldsEqual { fields } => match current {
                Some(body) => fields
                    .iter()
                    .find(|(field, value)| body.get(*field) != Some(value))
                    .map_or(Ok(()), |(field, _)| {
                        Err(format!("field {field} mismatch at ({pk}, {sk})"))
                    }),
                None => Err(format!("item missing at ({pk}, {sk})")),
            },
        }
    }
}

#[service_core::async_trait::async_trait]
impl TableStore for InMemoryTable {
    async fn get(&self, pk: &str, sk: &str) -> Result<Option<Item>, StoreError> {
        let rows = self.rows.read().expect("table lock poisoned");
        Ok(rows
            .get(&(pk.to_string(), sk.to_string()))
            .map(|body| Item {
                pk: pk.to_string(),
                sk: sk.to_string(),
                body: body.clone(),
            }))
    }

    async fn query(
        &self,
        pk: &str,
        sk_prefix: &str,
        page: &Page,
    ) -> Result<QueryOutput, StoreError> {
        let rows = self.rows.read().expect("table lock poisoned");

        let lower = match &page.start_after {
            Some(sk) => Bound::Excluded((pk.to_string(), sk.clone())),
            None => Bound::Included((pk.to_string(), sk_prefix.to_string())),
        };
        let upper = Bound::Excluded((format!("{pk}\u{0}"), String::new()));

        // Fetch one past the page size to learn has_more without a count.
        let mut items: Vec<Item> = rows
            .range((lower, upper))
            .filter(|((row_pk, row_sk), _)| row_pk == pk && row_sk.starts_with(sk_prefix))
            .take(page.limit + 1)
            .map(|((row_pk, row_sk), body)| Item {
                pk: row_pk.clone(),
                sk: row_sk.clone(),
                body: body.clone(),
            })
            .collect();

        let has_more = items.len() > page.limit;
        if has_more {
            items.truncate(page.limit);
        }

        let next_cursor = if has_more {
            items.last().map(|item| Cursor::new(&item.pk, &item.sk))
        } else {
            None
        };

        Ok(QueryOutput {
            items,
            has_more,
            next_cursor,
        })
    }

    async fn put(&self, item: Item) -> Result<(), StoreError> {
        let mut rows = self.rows.write().expect("table lock poisoned");
        rows.insert((item.pk, item.sk), item.body);
        Ok(())
    }

    async fn transact_write(&self, ops: Vec<TransactOp>) -> Result<(), StoreError> {
        let mut rows = self.rows.write().expect("table lock poisoned");

        // A transaction may touch each key at most once.
        for (i, op) in ops.iter().enumerate() {
            let key = op.key();
            if ops.iter().skip(i + 1).any(|other| other.key() == key) {
                return Err(StoreError::TransactionCancelled {
                    reason: format!("duplicate key in transaction: ({}, {})", key.0, key.1),
                });
            }
        }

        for op in &ops {
            let (pk, sk) = op.key();
            let condition = match op {
                TransactOp::Put { condition, .. } => condition,
                TransactOp::Delete { condition, .. } => condition,
            };
            Self::check(&rows, pk, sk, condition)
                .map_err(|reason| StoreError::TransactionCancelled { reason })?;
        }

        for op in ops {
            match op {
                TransactOp::Put { item, .. } => {
                    rows.insert((item.pk, item.sk), item.body);
                }
                TransactOp::Delete { pk, sk, .. } => {
                    rows.remove(&(pk, sk));
                }
            }
        }

        Ok(())
    }
}
