//! Presence verifiers backed by real storage.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use tradeerp_core::TenantId;
use tradeerp_schema::SchemaCatalog;
use tradeerp_validation::presence::{loosely_equal, scalar_text};
use tradeerp_validation::{PresenceError, PresenceVerifier};

use crate::store::TableStore;

fn require_column(catalog: &SchemaCatalog, table: &str, column: &str) -> Result<(), PresenceError> {
    match catalog.table(table) {
        Some(t) if t.has_column(column) => Ok(()),
        _ => Err(PresenceError::UnknownColumn {
            table: table.to_owned(),
            column: column.to_owned(),
        }),
    }
}

/// Looks rows up in one tenant's slice of a [`TableStore`].
pub struct StorePresenceVerifier {
    store: Arc<dyn TableStore>,
    tenant_id: TenantId,
    catalog: Arc<SchemaCatalog>,
}

impl StorePresenceVerifier {
    pub fn new(store: Arc<dyn TableStore>, tenant_id: TenantId, catalog: Arc<SchemaCatalog>) -> Self {
        Self {
            store,
            tenant_id,
            catalog,
        }
    }
}

#[async_trait]
impl PresenceVerifier for StorePresenceVerifier {
    async fn count(
        &self,
        table: &str,
        column: &str,
        value: &Value,
        ignore_id: Option<i64>,
    ) -> Result<u64, PresenceError> {
        require_column(&self.catalog, table, column)?;
        let rows = self
            .store
            .rows(self.tenant_id, table)
            .map_err(|e| PresenceError::Backend(e.to_string()))?;
        let n = rows
            .iter()
            .filter(|(id, _)| Some(*id) != ignore_id)
            .filter(|(_, row)| row.get(column).is_some_and(|stored| loosely_equal(stored, value)))
            .count();
        Ok(n as u64)
    }
}

/// Counts rows in Postgres.
///
/// Table and column names are interpolated into the query, so both must be
/// known to the migrated schema catalog first.
#[derive(Clone)]
pub struct PgPresenceVerifier {
    pool: PgPool,
    catalog: Arc<SchemaCatalog>,
}

impl PgPresenceVerifier {
    pub fn new(pool: PgPool, catalog: Arc<SchemaCatalog>) -> Self {
        Self { pool, catalog }
    }
}

#[async_trait]
impl PresenceVerifier for PgPresenceVerifier {
    #[tracing::instrument(skip(self, value), err)]
    async fn count(
        &self,
        table: &str,
        column: &str,
        value: &Value,
        ignore_id: Option<i64>,
    ) -> Result<u64, PresenceError> {
        require_column(&self.catalog, table, column)?;
        let Some(text) = scalar_text(value) else {
            return Ok(0);
        };
        let sql = format!(
            "select count(*) from \"{table}\" where \"{column}\"::text = $1 and ($2::bigint is null or \"id\" <> $2)"
        );
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(text)
            .bind(ignore_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PresenceError::Backend(e.to_string()))?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::migrate::migrated_catalog;
    use crate::store::InMemoryTableStore;

    #[tokio::test]
    async fn counts_within_the_tenant_only() {
        let store: Arc<dyn TableStore> = Arc::new(InMemoryTableStore::new());
        let catalog = Arc::new(migrated_catalog().unwrap());
        let (mine, theirs) = (TenantId::new(), TenantId::new());
        store.put(mine, "providers", 1, json!({"email": "a@x.io"})).unwrap();
        store.put(theirs, "providers", 1, json!({"email": "b@x.io"})).unwrap();

        let v = StorePresenceVerifier::new(store, mine, catalog);
        assert_eq!(v.count("providers", "email", &json!("a@x.io"), None).await.unwrap(), 1);
        assert_eq!(v.count("providers", "email", &json!("a@x.io"), Some(1)).await.unwrap(), 0);
        assert_eq!(v.count("providers", "email", &json!("b@x.io"), None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_columns_are_refused() {
        let store: Arc<dyn TableStore> = Arc::new(InMemoryTableStore::new());
        let v = StorePresenceVerifier::new(store, TenantId::new(), Arc::new(migrated_catalog().unwrap()));

        let err = v.count("providers", "email; drop table x", &json!("a"), None).await.unwrap_err();
        assert!(matches!(err, PresenceError::UnknownColumn { .. }));
    }

    #[tokio::test]
    async fn postgres_identifiers_are_checked_before_querying() {
        // Never connects: both lookups fail before a connection is needed.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://tradeerp@127.0.0.1:1/tradeerp")
            .unwrap();
        let v = PgPresenceVerifier::new(pool, Arc::new(migrated_catalog().unwrap()));

        let err = v.count("providers", "email\" or 1=1 --", &json!("a"), None).await.unwrap_err();
        assert!(matches!(err, PresenceError::UnknownColumn { .. }));
        assert_eq!(v.count("providers", "email", &Value::Null, None).await.unwrap(), 0);
    }
}
