//! Row-level access to one attribute table plus find-or-initialize.

use crate::core::{AttributeRow, NewAttributeRow, Result, RowId, SubjectId};
use crate::model::{AttributeModel, AttributeOptions, AttributeRecord};
use crate::resolver::{AttributeResolver, SubjectQuery};
use crate::storage::AttributeStorage;
use crate::subject::SubjectLookup;
use std::sync::Arc;

/// What to do when no row exists for the requested key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// Build a new, unsaved record seeded from the options.
    Initialize,
    /// Report "not found" as `None`.
    ReturnNone,
}

/// Handle on one attribute table: its storage engine, the subject lookup
/// used by existence checks, and the table description.
///
/// Cloning is cheap; clones share the same storage.
#[derive(Clone)]
pub struct AttributeStore {
    storage: Arc<dyn AttributeStorage>,
    subjects: Arc<dyn SubjectLookup>,
    model: Arc<AttributeModel>,
}

impl AttributeStore {
    pub fn new(
        storage: Arc<dyn AttributeStorage>,
        subjects: Arc<dyn SubjectLookup>,
        model: AttributeModel,
    ) -> Result<Self> {
        model.validate()?;
        Ok(Self {
            storage,
            subjects,
            model: Arc::new(model),
        })
    }

    pub fn model(&self) -> &AttributeModel {
        &self.model
    }

    pub fn storage(&self) -> &dyn AttributeStorage {
        self.storage.as_ref()
    }

    pub async fn find(&self, subject_id: SubjectId, key: &str) -> Result<Option<AttributeRow>> {
        self.storage.find(&self.model.table, subject_id, key).await
    }

    pub async fn insert(&self, row: NewAttributeRow) -> Result<RowId> {
        self.storage.insert(&self.model.table, row).await
    }

    pub async fn update(&self, id: RowId, value: Option<String>) -> Result<bool> {
        self.storage.update(&self.model.table, id, value).await
    }

    pub async fn delete(&self, id: RowId) -> Result<bool> {
        self.storage.delete(&self.model.table, id).await
    }

    pub async fn subject_exists(&self, subject_id: SubjectId) -> Result<bool> {
        self.subjects.subject_exists(subject_id).await
    }

    /// Loads the record for `(subject_id, key)` or builds a new one.
    ///
    /// An existing record receives every option except the default value.
    /// A new record is seeded with the key, the subject and all options,
    /// default value included. Behaviors are attached last, in both cases.
    pub async fn get_or_init(
        &self,
        key: &str,
        subject_id: Option<SubjectId>,
        options: &AttributeOptions,
        missing: Missing,
    ) -> Result<Option<AttributeRecord>> {
        let foreign_key_field = self.model.foreign_key_field();
        let existing = match subject_id {
            Some(subject_id) => self.find(subject_id, key).await?,
            None => None,
        };

        let mut record = match existing {
            Some(row) => {
                let mut record = AttributeRecord::from_row(&foreign_key_field, row);
                record.configure(options, false);
                record
            }
            None if missing == Missing::ReturnNone => return Ok(None),
            None => {
                let mut record = AttributeRecord::new(&foreign_key_field, subject_id, key);
                record.configure(options, true);
                record
            }
        };

        for attached in &options.behaviors {
            record.attach_behavior(&attached.name, Arc::clone(&attached.behavior));
        }
        Ok(Some(record))
    }

    /// [`Self::get_or_init`] that always yields a record.
    pub async fn get_or_create(
        &self,
        key: &str,
        subject_id: Option<SubjectId>,
        options: &AttributeOptions,
    ) -> Result<AttributeRecord> {
        let record = self
            .get_or_init(key, subject_id, options, Missing::Initialize)
            .await?;
        Ok(record.unwrap_or_else(|| {
            AttributeRecord::new(&self.model.foreign_key_field(), subject_id, key)
        }))
    }

    /// Read session for one subject with its own cache.
    pub fn resolver(&self, subject_id: Option<SubjectId>) -> AttributeResolver {
        AttributeResolver::new(self.clone(), subject_id)
    }

    pub fn query(&self) -> SubjectQuery {
        SubjectQuery::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{AttributeStore, Missing};
    use crate::core::{NewAttributeRow, SubjectId};
    use crate::model::{AttributeModel, AttributeOptions, TrimValue};
    use crate::storage::InMemoryStorage;
    use crate::subject::{DocumentSubject, InMemorySubjectStore};
    use std::sync::Arc;

    async fn store_with_row() -> AttributeStore {
        let storage = Arc::new(InMemoryStorage::with_tables(["user_meta"]).unwrap());
        let subjects = Arc::new(InMemorySubjectStore::<DocumentSubject>::new("user"));
        let store =
            AttributeStore::new(storage, subjects, AttributeModel::new("user_meta", "user")).unwrap();
        store
            .insert(NewAttributeRow {
                subject_id: SubjectId(1),
                key: "bio".into(),
                value: Some("stored".into()),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn existing_record_keeps_stored_value() {
        let store = store_with_row().await;
        let options = AttributeOptions::new().label("Bio").default_value("default");
        let record = store
            .get_or_init("bio", Some(SubjectId(1)), &options, Missing::Initialize)
            .await
            .unwrap()
            .unwrap();
        assert!(!record.is_new_record());
        assert_eq!(record.value.as_deref(), Some("stored"));
        assert_eq!(record.label, "Bio");
    }

    #[tokio::test]
    async fn missing_record_is_seeded_or_reported() {
        let store = store_with_row().await;
        let options = AttributeOptions::new().default_value("default");

        let none = store
            .get_or_init("nickname", Some(SubjectId(1)), &options, Missing::ReturnNone)
            .await
            .unwrap();
        assert!(none.is_none());

        let record = store
            .get_or_create("nickname", Some(SubjectId(1)), &options)
            .await
            .unwrap();
        assert!(record.is_new_record());
        assert_eq!(record.value.as_deref(), Some("default"));
        assert_eq!(record.subject_id, Some(SubjectId(1)));
        assert_eq!(record.key, "nickname");
    }

    #[tokio::test]
    async fn behaviors_are_attached_after_construction() {
        let store = store_with_row().await;
        let options = AttributeOptions::new().behavior("trim", TrimValue);
        let record = store.get_or_create("bio", Some(SubjectId(1)), &options).await.unwrap();
        assert!(record.has_behavior("trim"));
    }

    #[test]
    fn invalid_model_is_rejected_at_setup() {
        let storage = Arc::new(InMemoryStorage::new());
        let subjects = Arc::new(InMemorySubjectStore::<DocumentSubject>::new("user"));
        assert!(AttributeStore::new(storage, subjects, AttributeModel::new("", "user")).is_err());
    }
}
