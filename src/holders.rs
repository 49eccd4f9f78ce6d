// Account holders: the natural persons owning bank accounts.
// Pure CRUD, no business rules.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::store::{get_record, put_record, scan_records, KvStore};

const KEY_PREFIX: &str = "holder:";

fn holder_key(id: &str) -> String {
    format!("{}{}", KEY_PREFIX, id)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountHolder {
    /// Server-generated UUID, never changes.
    pub id: String,
    pub full_name: String,
    pub national_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountHolder {
    pub full_name: String,
    pub national_id: String,
}

/// Partial update: absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountHolder {
    pub full_name: Option<String>,
    pub national_id: Option<String>,
}

#[derive(Clone)]
pub struct AccountHolderService {
    store: Arc<dyn KvStore>,
}

impl AccountHolderService {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn create(&self, data: CreateAccountHolder) -> Result<AccountHolder, ApiError> {
        let holder = AccountHolder {
            id: uuid::Uuid::new_v4().to_string(),
            full_name: data.full_name,
            national_id: data.national_id,
        };

        put_record(self.store.as_ref(), &holder_key(&holder.id), &holder)?;
        tracing::info!(holder_id = %holder.id, "account holder created");
        Ok(holder)
    }

    pub fn get(&self, id: &str) -> Result<AccountHolder, ApiError> {
        get_record(self.store.as_ref(), &holder_key(id))?
            .ok_or_else(|| ApiError::HolderNotFound(id.to_string()))
    }

    pub fn list(&self) -> Result<Vec<AccountHolder>, ApiError> {
        Ok(scan_records(self.store.as_ref(), KEY_PREFIX)?)
    }

    pub fn update(
        &self,
        id: &str,
        data: UpdateAccountHolder,
    ) -> Result<AccountHolder, ApiError> {
        let mut holder = self.get(id)?;

        if let Some(full_name) = data.full_name {
            holder.full_name = full_name;
        }
        if let Some(national_id) = data.national_id {
            holder.national_id = national_id;
        }

        put_record(self.store.as_ref(), &holder_key(id), &holder)?;
        Ok(holder)
    }

    /// Delete the holder record. Bank accounts referencing it are left
    /// untouched; the reference is not enforced anywhere.
    pub fn delete(&self, id: &str) -> Result<(), ApiError> {
        if !self.store.delete(&holder_key(id))? {
            return Err(ApiError::HolderNotFound(id.to_string()));
        }
        tracing::info!(holder_id = %id, "account holder deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> AccountHolderService {
        AccountHolderService::new(Arc::new(MemoryStore::new()))
    }

    fn sample() -> CreateAccountHolder {
        CreateAccountHolder {
            full_name: "Maria Silva".to_string(),
            national_id: "123.456.789-00".to_string(),
        }
    }

    #[test]
    fn test_create_then_get_roundtrip() {
        let service = service();
        let created = service.create(sample()).unwrap();

        assert!(!created.id.is_empty());
        assert_eq!(created.full_name, "Maria Silva");

        let loaded = service.get(&created.id).unwrap();
        assert_eq!(loaded, created);
    }

    #[test]
    fn test_get_unknown_is_not_found() {
        let service = service();
        let err = service.get("no-such-id").unwrap_err();
        assert!(matches!(err, ApiError::HolderNotFound(_)));
    }

    #[test]
    fn test_list_returns_all_holders() {
        let service = service();
        service.create(sample()).unwrap();
        service
            .create(CreateAccountHolder {
                full_name: "Joao Souza".to_string(),
                national_id: "987.654.321-00".to_string(),
            })
            .unwrap();

        let holders = service.list().unwrap();
        assert_eq!(holders.len(), 2);
    }

    #[test]
    fn test_update_merges_partial_fields() {
        let service = service();
        let created = service.create(sample()).unwrap();

        let updated = service
            .update(
                &created.id,
                UpdateAccountHolder {
                    full_name: Some("Maria Silva Santos".to_string()),
                    national_id: None,
                },
            )
            .unwrap();

        assert_eq!(updated.full_name, "Maria Silva Santos");
        // Untouched field survives the merge
        assert_eq!(updated.national_id, created.national_id);
        assert_eq!(updated.id, created.id);
    }

    #[test]
    fn test_update_unknown_is_not_found() {
        let service = service();
        let err = service
            .update("no-such-id", UpdateAccountHolder::default())
            .unwrap_err();
        assert!(matches!(err, ApiError::HolderNotFound(_)));
    }

    #[test]
    fn test_delete_then_get_is_not_found() {
        let service = service();
        let created = service.create(sample()).unwrap();

        service.delete(&created.id).unwrap();

        let err = service.get(&created.id).unwrap_err();
        assert!(matches!(err, ApiError::HolderNotFound(_)));
    }

    #[test]
    fn test_delete_unknown_is_not_found() {
        let service = service();
        let err = service.delete("no-such-id").unwrap_err();
        assert!(matches!(err, ApiError::HolderNotFound(_)));
    }
}
