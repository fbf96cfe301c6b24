//! Tenant-isolated row storage.
//!
//! Rows are JSON objects keyed by table and a store-assigned `id`. Typed
//! access goes through [`Repository`].

use std::collections::{BTreeMap, HashMap};
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use tradeerp_core::TenantId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("row {table}#{id} could not be decoded: {message}")]
    Decode { table: String, id: i64, message: String },

    #[error("record could not be encoded: {0}")]
    Encode(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub trait TableStore: Send + Sync {
    /// Next free id for `table` within the tenant.
    fn next_id(&self, tenant_id: TenantId, table: &str) -> Result<i64, StoreError>;

    fn get(&self, tenant_id: TenantId, table: &str, id: i64) -> Result<Option<Value>, StoreError>;

    /// Insert or replace row `id`. The row's `id` field is set to match.
    fn put(&self, tenant_id: TenantId, table: &str, id: i64, row: Value) -> Result<(), StoreError>;

    fn delete(&self, tenant_id: TenantId, table: &str, id: i64) -> Result<bool, StoreError>;

    /// Rows of `table` ordered by id.
    fn rows(&self, tenant_id: TenantId, table: &str) -> Result<Vec<(i64, Value)>, StoreError>;

    /// Drop every row the tenant owns.
    fn clear_tenant(&self, tenant_id: TenantId) -> Result<(), StoreError>;
}

impl<S> TableStore for Arc<S>
where
    S: TableStore + ?Sized,
{
    fn next_id(&self, tenant_id: TenantId, table: &str) -> Result<i64, StoreError> {
        (**self).next_id(tenant_id, table)
    }

    fn get(&self, tenant_id: TenantId, table: &str, id: i64) -> Result<Option<Value>, StoreError> {
        (**self).get(tenant_id, table, id)
    }

    fn put(&self, tenant_id: TenantId, table: &str, id: i64, row: Value) -> Result<(), StoreError> {
        (**self).put(tenant_id, table, id, row)
    }

    fn delete(&self, tenant_id: TenantId, table: &str, id: i64) -> Result<bool, StoreError> {
        (**self).delete(tenant_id, table, id)
    }

    fn rows(&self, tenant_id: TenantId, table: &str) -> Result<Vec<(i64, Value)>, StoreError> {
        (**self).rows(tenant_id, table)
    }

    fn clear_tenant(&self, tenant_id: TenantId) -> Result<(), StoreError> {
        (**self).clear_tenant(tenant_id)
    }
}

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i64, Value>,
    /// Ids are never reused, even after a delete.
    last_id: i64,
}

/// In-memory store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryTableStore {
    inner: RwLock<HashMap<(TenantId, String), Table>>,
}

impl InMemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("lock poisoned".into())
}

impl TableStore for InMemoryTableStore {
    fn next_id(&self, tenant_id: TenantId, table: &str) -> Result<i64, StoreError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        let t = map.entry((tenant_id, table.to_owned())).or_default();
        t.last_id += 1;
        Ok(t.last_id)
    }

    fn get(&self, tenant_id: TenantId, table: &str, id: i64) -> Result<Option<Value>, StoreError> {
        let map = self.inner.read().map_err(poisoned)?;
        Ok(map
            .get(&(tenant_id, table.to_owned()))
            .and_then(|t| t.rows.get(&id))
            .cloned())
    }

    fn put(&self, tenant_id: TenantId, table: &str, id: i64, mut row: Value) -> Result<(), StoreError> {
        if let Value::Object(fields) = &mut row {
            fields.insert("id".into(), Value::from(id));
        }
        let mut map = self.inner.write().map_err(poisoned)?;
        let t = map.entry((tenant_id, table.to_owned())).or_default();
        t.last_id = t.last_id.max(id);
        t.rows.insert(id, row);
        Ok(())
    }

    fn delete(&self, tenant_id: TenantId, table: &str, id: i64) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        Ok(map
            .get_mut(&(tenant_id, table.to_owned()))
            .is_some_and(|t| t.rows.remove(&id).is_some()))
    }

    fn rows(&self, tenant_id: TenantId, table: &str) -> Result<Vec<(i64, Value)>, StoreError> {
        let map = self.inner.read().map_err(poisoned)?;
        Ok(map
            .get(&(tenant_id, table.to_owned()))
            .map(|t| t.rows.iter().map(|(id, row)| (*id, row.clone())).collect())
            .unwrap_or_default())
    }

    fn clear_tenant(&self, tenant_id: TenantId) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(poisoned)?;
        map.retain(|(t, _), _| *t != tenant_id);
        Ok(())
    }
}

/// Typed view of one table.
pub struct Repository<T> {
    store: Arc<dyn TableStore>,
    table: &'static str,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            table: self.table,
            _record: PhantomData,
        }
    }
}

impl<T> Repository<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn TableStore>, table: &'static str) -> Self {
        Self {
            store,
            table,
            _record: PhantomData,
        }
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    fn decode(&self, id: i64, row: Value) -> Result<T, StoreError> {
        serde_json::from_value(row).map_err(|e| StoreError::Decode {
            table: self.table.to_owned(),
            id,
            message: e.to_string(),
        })
    }

    /// Reserve an id for a record that is built and saved later.
    pub fn next_id(&self, tenant_id: TenantId) -> Result<i64, StoreError> {
        self.store.next_id(tenant_id, self.table)
    }

    /// Build a record around a freshly assigned id and store it.
    pub fn create(&self, tenant_id: TenantId, build: impl FnOnce(i64) -> T) -> Result<T, StoreError> {
        let id = self.store.next_id(tenant_id, self.table)?;
        let record = build(id);
        self.save(tenant_id, id, &record)?;
        Ok(record)
    }

    pub fn find(&self, tenant_id: TenantId, id: i64) -> Result<Option<T>, StoreError> {
        self.store
            .get(tenant_id, self.table, id)?
            .map(|row| self.decode(id, row))
            .transpose()
    }

    pub fn save(&self, tenant_id: TenantId, id: i64, record: &T) -> Result<(), StoreError> {
        let row = serde_json::to_value(record).map_err(|e| StoreError::Encode(e.to_string()))?;
        self.store.put(tenant_id, self.table, id, row)
    }

    pub fn delete(&self, tenant_id: TenantId, id: i64) -> Result<bool, StoreError> {
        self.store.delete(tenant_id, self.table, id)
    }

    pub fn all(&self, tenant_id: TenantId) -> Result<Vec<T>, StoreError> {
        self.store
            .rows(tenant_id, self.table)?
            .into_iter()
            .map(|(id, row)| self.decode(id, row))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;
    use tradeerp_hr::{Employee, EmployeeId, EmployeeStatus, EmploymentType, NewEmployee};

    fn new_employee(email: &str) -> NewEmployee {
        NewEmployee {
            user_id: None,
            employee_number: "EMP-1".into(),
            first_name: "Dana".into(),
            last_name: "Reyes".into(),
            email: email.into(),
            phone: None,
            date_of_birth: None,
            department: "Ops".into(),
            position: "Buyer".into(),
            manager_id: None,
            employment_type: EmploymentType::FullTime,
            status: EmployeeStatus::Active,
            hire_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            salary: 50_000.0,
        }
    }

    #[test]
    fn tenants_do_not_see_each_other() {
        let store = InMemoryTableStore::new();
        let (a, b) = (TenantId::new(), TenantId::new());

        store.put(a, "brands", 1, json!({"name": "Acme"})).unwrap();
        assert_eq!(store.get(a, "brands", 1).unwrap().unwrap()["id"], 1);
        assert!(store.get(b, "brands", 1).unwrap().is_none());
        assert!(store.rows(b, "brands").unwrap().is_empty());

        store.clear_tenant(a).unwrap();
        assert!(store.rows(a, "brands").unwrap().is_empty());
    }

    #[test]
    fn repository_round_trips_records() {
        let store: Arc<dyn TableStore> = Arc::new(InMemoryTableStore::new());
        let employees = Repository::<Employee>::new(store, "employees");
        let tenant = TenantId::new();

        let created = employees
            .create(tenant, |id| Employee::create(EmployeeId(id), new_employee("d@x.io"), Utc::now()))
            .unwrap();
        assert_eq!(created.id, EmployeeId(1));
        assert_eq!(employees.find(tenant, 1).unwrap(), Some(created));
        assert!(employees.delete(tenant, 1).unwrap());
        assert_eq!(employees.find(tenant, 1).unwrap(), None);
    }

    #[test]
    fn undecodable_rows_name_their_table() {
        let store: Arc<dyn TableStore> = Arc::new(InMemoryTableStore::new());
        let tenant = TenantId::new();
        store.put(tenant, "employees", 4, json!({"first_name": 3})).unwrap();

        let err = Repository::<Employee>::new(store, "employees").find(tenant, 4).unwrap_err();
        assert!(matches!(err, StoreError::Decode { id: 4, .. }));
    }

    proptest! {
        #[test]
        fn ids_are_never_reused(deletes in proptest::collection::vec(any::<bool>(), 1..20)) {
            let store = InMemoryTableStore::new();
            let tenant = TenantId::new();
            let mut seen = Vec::new();
            for delete in deletes {
                let id = store.next_id(tenant, "orders").unwrap();
                prop_assert!(!seen.contains(&id));
                store.put(tenant, "orders", id, json!({})).unwrap();
                if delete {
                    store.delete(tenant, "orders", id).unwrap();
                }
                seen.push(id);
            }
        }
    }
}
