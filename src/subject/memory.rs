use super::{Subject, SubjectLookup, SubjectStore};
use crate::core::{Result, SubjectId};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

struct Rows<S> {
    rows: BTreeMap<SubjectId, S>,
    next_id: u64,
}

/// In-memory subject table.
pub struct InMemorySubjectStore<S> {
    table: String,
    inner: RwLock<Rows<S>>,
}

impl<S: Subject> InMemorySubjectStore<S> {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            inner: RwLock::new(Rows {
                rows: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Stores `subject` under an explicit id, bypassing validation.
    pub async fn insert_with_id(&self, id: SubjectId, mut subject: S) {
        subject.set_id(id);
        let mut inner = self.inner.write().await;
        inner.next_id = inner.next_id.max(id.0 + 1);
        inner.rows.insert(id, subject);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl<S: Subject> SubjectLookup for InMemorySubjectStore<S> {
    fn table_name(&self) -> &str {
        &self.table
    }

    async fn subject_exists(&self, id: SubjectId) -> Result<bool> {
        Ok(self.inner.read().await.rows.contains_key(&id))
    }
}

#[async_trait]
impl<S: Subject> SubjectStore<S> for InMemorySubjectStore<S> {
    async fn find_by_id(&self, id: SubjectId) -> Result<Option<S>> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn save(&self, subject: &mut S) -> Result<()> {
        let mut inner = self.inner.write().await;
        let id = match subject.id() {
            Some(id) => id,
            None => {
                let id = SubjectId(inner.next_id);
                inner.next_id += 1;
                subject.set_id(id);
                id
            }
        };
        inner.rows.insert(id, subject.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::InMemorySubjectStore;
    use crate::core::SubjectId;
    use crate::subject::{DocumentSubject, Subject, SubjectLookup, SubjectStore};

    #[tokio::test]
    async fn save_assigns_ids_after_seeded_rows() {
        let store = InMemorySubjectStore::new("user");
        store
            .insert_with_id(SubjectId(42), DocumentSubject::new())
            .await;

        let mut subject = DocumentSubject::new().with("name", "Ada");
        store.save(&mut subject).await.unwrap();
        assert_eq!(subject.id(), Some(SubjectId(43)));
        assert!(store.subject_exists(SubjectId(43)).await.unwrap());
        assert_eq!(store.len().await, 2);

        let found = store.find_by_id(SubjectId(43)).await.unwrap().unwrap();
        assert_eq!(found.get("name").and_then(|v| v.as_str()), Some("Ada"));
        assert!(store.find_by_id(SubjectId(7)).await.unwrap().is_none());
    }
}
